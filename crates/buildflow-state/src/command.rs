//! ランナーの状態コマンドファイル（`GITHUB_STATE`）を使うストア
//!
//! main では `GITHUB_STATE` に追記し、post ではランナーが展開した
//! `STATE_<NAME>` 環境変数から読み込みます。

use crate::error::{Result, StateError};
use crate::key::StateKey;
use crate::store::StateStore;
use async_trait::async_trait;
use buildflow_config::CommandFile;
use std::collections::HashMap;
use std::path::PathBuf;

pub struct CommandFileStateStore {
    file: Option<CommandFile>,
    env: HashMap<String, String>,
}

impl CommandFileStateStore {
    /// 現在のプロセス環境の `STATE_*` を読み込んで作成
    pub fn from_env(state_file: Option<PathBuf>) -> Self {
        Self::with_env(
            state_file,
            std::env::vars().filter(|(name, _)| name.starts_with("STATE_")),
        )
    }

    pub fn with_env<I>(state_file: Option<PathBuf>, env: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            file: state_file.map(CommandFile::new),
            env: env.into_iter().collect(),
        }
    }
}

#[async_trait]
impl StateStore for CommandFileStateStore {
    fn kind(&self) -> &'static str {
        "command-file"
    }

    async fn set(&self, key: StateKey, value: &str) -> Result<()> {
        let file = self
            .file
            .as_ref()
            .ok_or_else(|| StateError::Unavailable("GITHUB_STATE is not set".to_string()))?;
        file.append(key.name(), value)?;
        tracing::debug!(%key, "Saved state");
        Ok(())
    }

    async fn get(&self, key: StateKey) -> Result<Option<String>> {
        Ok(self
            .env
            .get(&key.env_name())
            .filter(|v| !v.is_empty())
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildflow_config::command_file::parse_records;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_set_appends_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state");
        let store = CommandFileStateStore::with_env(Some(path.clone()), Vec::new());

        store.set(StateKey::TmpDir, "/tmp/buildflow-1").await.unwrap();
        store.set(StateKey::BuildRef, "b/b0/r1").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            parse_records(&content),
            vec![
                (
                    "BUILDFLOW_TMP_DIR".to_string(),
                    "/tmp/buildflow-1".to_string()
                ),
                ("BUILDFLOW_BUILD_REF".to_string(), "b/b0/r1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_get_reads_state_env() {
        let store = CommandFileStateStore::with_env(
            None,
            vec![
                (
                    "STATE_BUILDFLOW_TMP_DIR".to_string(),
                    "/tmp/buildflow-1".to_string(),
                ),
                ("STATE_BUILDFLOW_BUILD_REF".to_string(), String::new()),
            ],
        );

        assert_eq!(
            store.get(StateKey::TmpDir).await.unwrap().as_deref(),
            Some("/tmp/buildflow-1")
        );
        assert_eq!(store.get(StateKey::BuildRef).await.unwrap(), None);
        assert!(!store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_env_is_empty_store() {
        let store = CommandFileStateStore::with_env(None, Vec::new());
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn test_from_env_collects_state_vars() {
        let store = temp_env::with_vars(
            [
                ("STATE_BUILDFLOW_BUILD_REF", Some("b/b0/r9")),
                ("BUILDFLOW_BUILD_REF", Some("ignored")),
            ],
            || CommandFileStateStore::from_env(None),
        );

        assert_eq!(
            store.get(StateKey::BuildRef).await.unwrap().as_deref(),
            Some("b/b0/r9")
        );
        assert_eq!(store.kind(), "command-file");
    }

    #[tokio::test]
    async fn test_set_without_state_file() {
        let store = CommandFileStateStore::with_env(None, Vec::new());
        assert!(matches!(
            store.set(StateKey::TmpDir, "/tmp/x").await,
            Err(StateError::Unavailable(_))
        ));
    }
}
