//! ビルドシークレット定義

use std::path::PathBuf;

/// シークレットIDのうち Git 認証トークンを示すプレフィックス
pub const GIT_AUTH_TOKEN: &str = "GIT_AUTH_TOKEN";

/// シークレットの供給元
#[derive(Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// 環境変数名（`secret-envs`）
    Env(String),
    /// 値そのもの（`secrets`）。ビルド前に一時ファイルへ書き出す
    Value(String),
    /// ファイルパス（`secret-files`）
    File(PathBuf),
}

// 値はログに出さない
impl std::fmt::Debug for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::Env(name) => f.debug_tuple("Env").field(name).finish(),
            SecretSource::Value(_) => f.debug_tuple("Value").field(&"***").finish(),
            SecretSource::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

/// ビルドシークレット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    pub id: String,
    pub source: SecretSource,
}

impl Secret {
    pub fn env(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: SecretSource::Env(name.into()),
        }
    }

    pub fn value(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: SecretSource::Value(value.into()),
        }
    }

    pub fn file(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            source: SecretSource::File(path.into()),
        }
    }

    pub fn is_git_auth_token(&self) -> bool {
        self.id.starts_with(GIT_AUTH_TOKEN)
    }

    pub fn is_env(&self) -> bool {
        matches!(self.source, SecretSource::Env(_))
    }
}
