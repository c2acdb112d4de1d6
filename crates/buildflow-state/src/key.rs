//! フェーズ間で受け渡す値のキー

/// 保存名の名前空間
pub const KEY_PREFIX: &str = "BUILDFLOW_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateKey {
    /// main が作成した一時ディレクトリ
    TmpDir,
    /// `builder/node/ref`
    BuildRef,
    /// post でサマリを生成できるか
    SummarySupported,
    /// サマリに載せる入力（JSON）
    SummaryInputs,
}

impl StateKey {
    pub const ALL: [StateKey; 4] = [
        StateKey::TmpDir,
        StateKey::BuildRef,
        StateKey::SummarySupported,
        StateKey::SummaryInputs,
    ];

    /// 保存時の名前（例: `BUILDFLOW_TMP_DIR`）
    pub fn name(self) -> &'static str {
        match self {
            StateKey::TmpDir => "BUILDFLOW_TMP_DIR",
            StateKey::BuildRef => "BUILDFLOW_BUILD_REF",
            StateKey::SummarySupported => "BUILDFLOW_SUMMARY_SUPPORTED",
            StateKey::SummaryInputs => "BUILDFLOW_SUMMARY_INPUTS",
        }
    }

    /// post フェーズでランナーが公開する環境変数名
    pub fn env_name(self) -> String {
        format!("STATE_{}", self.name())
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
