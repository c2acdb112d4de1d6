//! 状態ストアのエラー型

use buildflow_config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("状態ファイルのバージョン {found} は未対応です（対応: {supported}）")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("状態の書き込み先がありません: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StateError>;
