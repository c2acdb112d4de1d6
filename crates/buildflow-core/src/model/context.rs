//! ビルドコンテキスト定義

use std::path::PathBuf;

/// ビルドエンジンに渡すビルドコンテキスト
///
/// Git コンテキストはローカルファイルシステムに依存しません。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildContext {
    /// リモートリポジトリ（URL + `#ref[:subdir]`）
    Git { url: String },
    /// ローカルディレクトリ。`-` は標準入力
    Path { path: PathBuf },
}

impl BuildContext {
    /// 展開済みの文字列から種別を判定
    ///
    /// buildx と同じく、URL 形式または `.git` を含むものを Git とみなします。
    pub fn classify(value: &str) -> Self {
        if is_git_url(value) {
            BuildContext::Git {
                url: value.to_string(),
            }
        } else {
            BuildContext::Path {
                path: PathBuf::from(value),
            }
        }
    }

    pub fn is_git(&self) -> bool {
        matches!(self, BuildContext::Git { .. })
    }

    /// コマンドラインの位置引数としての表現
    pub fn as_arg(&self) -> String {
        match self {
            BuildContext::Git { url } => url.clone(),
            BuildContext::Path { path } => path.display().to_string(),
        }
    }
}

impl std::fmt::Display for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_arg())
    }
}

fn is_git_url(value: &str) -> bool {
    const PREFIXES: &[&str] = &["https://", "http://", "git://", "git@", "ssh://", "github.com/"];

    if PREFIXES.iter().any(|p| value.starts_with(p)) {
        return true;
    }

    // `repo.git` / `repo.git#ref:subdir`
    let repo = value.split('#').next().unwrap_or_default();
    repo.ends_with(".git") && !repo.starts_with('.') && !repo.starts_with('/')
}

/// `build-contexts` の1エントリ（`name=value`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedBuildContext {
    pub name: String,
    pub value: String,
}

impl NamedBuildContext {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn as_arg(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}
