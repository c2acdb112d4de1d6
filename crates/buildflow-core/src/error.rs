use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("無効な入力 '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("未解決のコンテキスト参照: {{{{{name}}}}}")]
    UnresolvedReference { name: String },

    #[error("バージョン範囲が不正です: {range}\n理由: {message}")]
    InvalidVersionRange { range: String, message: String },
}

impl CoreError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// ワークフローのエラー行として出す1行サマリ
    pub fn user_message(&self) -> String {
        match self {
            CoreError::InvalidInput { field, reason } => {
                format!("Invalid input '{}': {}", field, reason)
            }
            CoreError::UnresolvedReference { name } => {
                format!(
                    "Unresolved build context reference '{{{{{}}}}}'; define it in build-contexts",
                    name
                )
            }
            CoreError::InvalidVersionRange { range, .. } => {
                format!("Invalid version range: {}", range)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
