//! JSON ファイルを使うストア
//!
//! ランナー外（ローカル実行・テスト）で main と post をつなぐために使います。
//! `<dir>/state.json` を一時ファイル経由の rename で置き換えます。

use crate::error::{Result, StateError};
use crate::key::StateKey;
use crate::store::StateStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

const STATE_VERSION: u32 = 1;
const STATE_FILE: &str = "state.json";
const STATE_TMP: &str = "state.json.tmp";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateDocument {
    version: u32,
    updated_at: DateTime<Utc>,
    values: BTreeMap<String, String>,
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            values: BTreeMap::new(),
        }
    }
}

pub struct FileStateStore {
    dir: PathBuf,
    // 読み込み→更新→書き込みを直列化
    write_lock: Mutex<()>,
}

impl FileStateStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    fn tmp_path(&self) -> PathBuf {
        self.dir.join(STATE_TMP)
    }

    async fn load(&self) -> Result<StateDocument> {
        let path = self.state_path();
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("State file not found, returning empty state");
                return Ok(StateDocument::default());
            }
            Err(e) => return Err(e.into()),
        };

        let doc: StateDocument = serde_json::from_str(&content)?;
        if doc.version > STATE_VERSION {
            return Err(StateError::UnsupportedVersion {
                found: doc.version,
                supported: STATE_VERSION,
            });
        }
        Ok(doc)
    }

    async fn save(&self, doc: &StateDocument) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let tmp = self.tmp_path();
        let content = serde_json::to_string_pretty(doc)?;
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, self.state_path()).await?;

        tracing::debug!("Saved state with {} values", doc.values.len());
        Ok(())
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    fn kind(&self) -> &'static str {
        "file"
    }

    async fn set(&self, key: StateKey, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        doc.values.insert(key.name().to_string(), value.to_string());
        doc.updated_at = Utc::now();
        self.save(&doc).await
    }

    async fn get(&self, key: StateKey) -> Result<Option<String>> {
        let doc = self.load().await?;
        Ok(doc.values.get(key.name()).cloned())
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(self.state_path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
