use buildflow_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("buildx のバージョン取得に失敗しました: {0}")]
    CapabilityQuery(String),

    #[error("buildx を起動できません ({program}): {source}")]
    EngineSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("buildx コマンドが失敗しました (exit {exit_code}): {summary}")]
    EngineFailed { summary: String, exit_code: i32 },

    #[error("ファイル操作に失敗しました: {path}\n理由: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("メタデータの解析に失敗しました: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::File {
            path: path.into(),
            source,
        }
    }

    /// ワークフローのエラー行として出す1行サマリ
    pub fn user_message(&self) -> String {
        match self {
            BuildError::CapabilityQuery(msg) => {
                format!("Unable to determine the buildx version: {}", msg)
            }
            BuildError::EngineSpawn { program, source } => {
                format!(
                    "Unable to run '{}': {}. Is Docker with buildx installed on the runner?",
                    program, source
                )
            }
            BuildError::EngineFailed { summary, .. } => {
                format!("buildx failed with: {}", summary)
            }
            BuildError::File { path, source } => {
                format!("{}: {}", path.display(), source)
            }
            BuildError::Core(err) => err.user_message(),
            _ => format!("{}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
