//! ランナーのコマンドファイル（GITHUB_OUTPUT / GITHUB_STATE）への書き込み
//!
//! 複数行の値も扱えるよう、次のヒアドキュメント形式で追記します。
//!
//! ```text
//! name<<ghadelimiter_<uuid>
//! value
//! ghadelimiter_<uuid>
//! ```

use crate::error::{ConfigError, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

const DELIMITER_PREFIX: &str = "ghadelimiter_";

#[derive(Debug, Clone)]
pub struct CommandFile {
    path: PathBuf,
}

impl CommandFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// キーと値を1件追記
    pub fn append(&self, key: &str, value: &str) -> Result<()> {
        let record = format_record(key, value).ok_or_else(|| ConfigError::DelimiterCollision {
            path: self.path.clone(),
            key: key.to_string(),
        })?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ConfigError::IoError {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
        file.write_all(record.as_bytes())?;

        tracing::debug!(key = %key, path = %self.path.display(), "Appended command file record");
        Ok(())
    }
}

fn format_record(key: &str, value: &str) -> Option<String> {
    let delimiter = format!("{}{}", DELIMITER_PREFIX, uuid::Uuid::new_v4());
    if key.contains(&delimiter) || value.contains(&delimiter) {
        return None;
    }
    Some(format!("{key}<<{delimiter}\n{value}\n{delimiter}\n"))
}

/// ヒアドキュメント形式のファイルを読み戻す（テスト・ローカル実行用）
pub fn parse_records(content: &str) -> Vec<(String, String)> {
    let mut records = Vec::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        if let Some((key, delimiter)) = line.split_once("<<") {
            let mut value_lines = Vec::new();
            for value_line in lines.by_ref() {
                if value_line == delimiter {
                    break;
                }
                value_lines.push(value_line);
            }
            records.push((key.to_string(), value_lines.join("\n")));
        } else if let Some((key, value)) = line.split_once('=') {
            records.push((key.to_string(), value.to_string()));
        }
    }

    records
}
