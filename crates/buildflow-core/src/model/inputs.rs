//! 検証済みビルド入力

use super::context::{BuildContext, NamedBuildContext};
use super::secret::Secret;

/// `call` 入力の評価モード
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CallMode {
    /// 通常のビルド（デフォルト）
    #[default]
    Build,
    /// Dockerfile のチェックのみ。失敗内容は stdout に出る
    Check,
    /// ビルド引数・シークレットなどの一覧
    Outline,
    /// ターゲット一覧
    Targets,
}

impl CallMode {
    /// 文字列からパース
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "build" => Some(Self::Build),
            "check" => Some(Self::Check),
            "outline" => Some(Self::Outline),
            "targets" => Some(Self::Targets),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Check => "check",
            Self::Outline => "outline",
            Self::Targets => "targets",
        }
    }
}

/// `provenance` / `sbom` 入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttestationInput {
    /// `true`: 既定の属性で有効化
    Enabled,
    /// `false`: 明示的に無効化
    Disabled,
    /// `mode=max` のような属性指定
    Attrs(String),
}

impl AttestationInput {
    /// 文字列からパース（真偽値以外は属性指定として扱う）
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "true" | "True" | "TRUE" => Self::Enabled,
            "false" | "False" | "FALSE" => Self::Disabled,
            attrs => Self::Attrs(attrs.to_string()),
        }
    }
}

/// `--call` に渡す値（`check,format=json` のようなオプション付きを許容）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub mode: CallMode,
    pub value: String,
}

/// 検証済みの入力一式
///
/// 引数コンパイラへの唯一の入力です。ここから先で生の文字列を再解釈することはありません。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInputs {
    pub context: BuildContext,
    pub add_hosts: Vec<String>,
    pub allow: Vec<String>,
    pub annotations: Vec<String>,
    pub attests: Vec<String>,
    pub build_args: Vec<String>,
    pub build_contexts: Vec<NamedBuildContext>,
    pub builder: Option<String>,
    pub cache_from: Vec<String>,
    pub cache_to: Vec<String>,
    pub call: Option<CallRequest>,
    pub cgroup_parent: Option<String>,
    pub file: Option<String>,
    pub labels: Vec<String>,
    pub load: bool,
    pub network: Option<String>,
    pub no_cache: bool,
    pub no_cache_filters: Vec<String>,
    pub outputs: Vec<String>,
    pub platforms: Vec<String>,
    pub provenance: Option<AttestationInput>,
    pub pull: bool,
    pub push: bool,
    pub sbom: Option<AttestationInput>,
    pub secrets: Vec<Secret>,
    pub shm_size: Option<String>,
    pub ssh: Vec<String>,
    pub tags: Vec<String>,
    pub target: Option<String>,
    pub ulimits: Vec<String>,
}

impl BuildInputs {
    /// 指定コンテキストで、他は全て未指定の入力を作成
    pub fn new(context: BuildContext) -> Self {
        Self {
            context,
            add_hosts: Vec::new(),
            allow: Vec::new(),
            annotations: Vec::new(),
            attests: Vec::new(),
            build_args: Vec::new(),
            build_contexts: Vec::new(),
            builder: None,
            cache_from: Vec::new(),
            cache_to: Vec::new(),
            call: None,
            cgroup_parent: None,
            file: None,
            labels: Vec::new(),
            load: false,
            network: None,
            no_cache: false,
            no_cache_filters: Vec::new(),
            outputs: Vec::new(),
            platforms: Vec::new(),
            provenance: None,
            pull: false,
            push: false,
            sbom: None,
            secrets: Vec::new(),
            shm_size: None,
            ssh: Vec::new(),
            tags: Vec::new(),
            target: None,
            ulimits: Vec::new(),
        }
    }

    pub fn call_mode(&self) -> CallMode {
        self.call.as_ref().map(|c| c.mode).unwrap_or_default()
    }

    /// 出力先に指定の exporter タイプが含まれるか
    ///
    /// `type=` を持たない単一値（`--output=./dist`）は local exporter 扱い
    pub fn has_exporter(&self, name: &str) -> bool {
        for output in &self.outputs {
            let fields: Vec<&str> = output.split(',').map(str::trim).collect();
            if fields.len() == 1 && !fields[0].starts_with("type=") {
                return name == "local";
            }
            let matched = fields.iter().any(|field| {
                field
                    .split_once('=')
                    .is_some_and(|(k, v)| k.trim() == "type" && v.trim() == name)
            });
            if matched {
                return true;
            }
        }
        false
    }

    /// イメージIDファイルが生成されない出力先か
    pub fn exports_to_filesystem(&self) -> bool {
        self.has_exporter("local") || self.has_exporter("tar")
    }

    /// Docker のイメージストアに読み込むビルドか
    pub fn exports_to_docker(&self) -> bool {
        self.load || self.has_exporter("docker")
    }
}
