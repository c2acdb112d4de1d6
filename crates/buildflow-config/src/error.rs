use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("状態ディレクトリが見つかりません")]
    StateDirNotFound,

    #[error("環境変数 {name} が不正です: {reason}")]
    InvalidEnv { name: String, reason: String },

    #[error(
        "コマンドファイルに書き込めません: {path}\n理由: キー '{key}' の値に区切り文字が含まれています"
    )]
    DelimiterCollision { path: PathBuf, key: String },

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
