//! ランナー（CI ホスト）の実行環境

use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};

const DEFAULT_SERVER_URL: &str = "https://github.com";

/// ランナーが公開する環境変数のスナップショット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerEnv {
    pub server_url: String,
    /// `owner/repo`
    pub repository: Option<String>,
    pub git_ref: Option<String>,
    pub sha: Option<String>,
    pub run_id: Option<String>,
    pub run_attempt: Option<String>,
    pub runner_temp: PathBuf,
    /// イベントペイロードの `repository.private`
    pub repository_private: bool,
    /// `DOCKER_BUILD_SUMMARY`（デフォルト true）
    pub build_summary: bool,
    /// `DOCKER_BUILD_RECORD_UPLOAD`（デフォルト true）
    pub record_upload: bool,
}

impl RunnerEnv {
    /// 現在のプロセス環境から読み込む
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の参照関数から読み込む
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let repository_private = match get("GITHUB_EVENT_PATH") {
            Some(path) => read_repository_private(Path::new(&path)),
            None => false,
        };

        Ok(Self {
            server_url: get("GITHUB_SERVER_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            repository: get("GITHUB_REPOSITORY"),
            git_ref: get("GITHUB_REF"),
            sha: get("GITHUB_SHA"),
            run_id: get("GITHUB_RUN_ID"),
            run_attempt: get("GITHUB_RUN_ATTEMPT"),
            runner_temp: get("RUNNER_TEMP")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            repository_private,
            build_summary: env_bool("DOCKER_BUILD_SUMMARY", get("DOCKER_BUILD_SUMMARY"), true)?,
            record_upload: env_bool(
                "DOCKER_BUILD_RECORD_UPLOAD",
                get("DOCKER_BUILD_RECORD_UPLOAD"),
                true,
            )?,
        })
    }

    /// Git コンテキストで使う ref
    ///
    /// コミットSHAが分かる場合はSHAを優先。ただしプルリクエストの ref はそのまま使う
    pub fn git_ref(&self) -> String {
        let mut git_ref = self.git_ref.clone().unwrap_or_default();

        if self.sha.is_some() && !git_ref.is_empty() && !git_ref.starts_with("refs/") {
            git_ref = format!("refs/heads/{}", git_ref);
        }
        if let Some(sha) = &self.sha
            && !git_ref.starts_with("refs/pull/")
        {
            git_ref = sha.clone();
        }

        git_ref
    }

    /// ワークフロー自身のリポジトリを指す Git コンテキスト
    pub fn git_context(&self) -> String {
        let repository = self.repository.as_deref().unwrap_or_default();
        let git_ref = self.git_ref();
        if git_ref.is_empty() {
            format!("{}/{}.git", self.server_url, repository)
        } else {
            format!("{}/{}.git#{}", self.server_url, repository, git_ref)
        }
    }

    /// サーバーURLのホスト部分（例: `github.com`）
    pub fn git_host(&self) -> String {
        let without_scheme = self
            .server_url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.server_url);
        without_scheme
            .split('/')
            .next()
            .unwrap_or(without_scheme)
            .to_string()
    }

    /// ワークフロー実行のURL（provenance の builder-id に使う）
    pub fn workflow_run_url(&self) -> Option<String> {
        let repository = self.repository.as_deref()?;
        let run_id = self.run_id.as_deref()?;
        let mut url = format!("{}/{}/actions/runs/{}", self.server_url, repository, run_id);
        if let Some(attempt) = &self.run_attempt {
            url.push_str(&format!("/attempts/{}", attempt));
        }
        Some(url)
    }
}

fn env_bool(name: &str, value: Option<String>, default: bool) -> Result<bool> {
    match value.as_deref().map(str::trim) {
        None => Ok(default),
        Some("true" | "True" | "TRUE" | "1") => Ok(true),
        Some("false" | "False" | "FALSE" | "0") => Ok(false),
        Some(other) => Err(ConfigError::InvalidEnv {
            name: name.to_string(),
            reason: format!("'{}' is not a boolean", other),
        }),
    }
}

fn read_repository_private(path: &Path) -> bool {
    let Ok(content) = std::fs::read_to_string(path) else {
        tracing::debug!("Event payload not readable: {}", path.display());
        return false;
    };
    serde_json::from_str::<serde_json::Value>(&content)
        .ok()
        .and_then(|payload| payload.pointer("/repository/private")?.as_bool())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn runner(pairs: &[(&str, &str)]) -> RunnerEnv {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RunnerEnv::from_lookup(|name| map.get(name).cloned()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let env = runner(&[]);
        assert_eq!(env.server_url, "https://github.com");
        assert!(env.build_summary);
        assert!(env.record_upload);
        assert!(!env.repository_private);
        assert_eq!(env.workflow_run_url(), None);
    }

    #[test]
    fn test_git_context_prefers_sha() {
        let env = runner(&[
            ("GITHUB_REPOSITORY", "octo/app"),
            ("GITHUB_REF", "refs/heads/main"),
            ("GITHUB_SHA", "0123abcd"),
        ]);
        assert_eq!(env.git_context(), "https://github.com/octo/app.git#0123abcd");
    }

    #[test]
    fn test_git_context_keeps_pull_request_ref() {
        let env = runner(&[
            ("GITHUB_REPOSITORY", "octo/app"),
            ("GITHUB_REF", "refs/pull/42/merge"),
            ("GITHUB_SHA", "0123abcd"),
        ]);
        assert_eq!(
            env.git_context(),
            "https://github.com/octo/app.git#refs/pull/42/merge"
        );
    }

    #[test]
    fn test_git_context_without_sha() {
        let env = runner(&[
            ("GITHUB_SERVER_URL", "https://ghe.example.com/"),
            ("GITHUB_REPOSITORY", "octo/app"),
            ("GITHUB_REF", "refs/tags/v1.0.0"),
        ]);
        assert_eq!(
            env.git_context(),
            "https://ghe.example.com/octo/app.git#refs/tags/v1.0.0"
        );
        assert_eq!(env.git_host(), "ghe.example.com");
    }

    #[test]
    fn test_workflow_run_url() {
        let env = runner(&[
            ("GITHUB_REPOSITORY", "octo/app"),
            ("GITHUB_RUN_ID", "123"),
            ("GITHUB_RUN_ATTEMPT", "2"),
        ]);
        assert_eq!(
            env.workflow_run_url().as_deref(),
            Some("https://github.com/octo/app/actions/runs/123/attempts/2")
        );
    }

    #[test]
    fn test_summary_toggles() {
        let env = runner(&[
            ("DOCKER_BUILD_SUMMARY", "false"),
            ("DOCKER_BUILD_RECORD_UPLOAD", "0"),
        ]);
        assert!(!env.build_summary);
        assert!(!env.record_upload);
    }

    #[test]
    fn test_invalid_toggle() {
        let result = RunnerEnv::from_lookup(|name| {
            (name == "DOCKER_BUILD_SUMMARY").then(|| "maybe".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidEnv { .. })));
    }

    #[test]
    fn test_private_repository_from_event_payload() {
        let dir = tempdir().unwrap();
        let event = dir.path().join("event.json");
        std::fs::write(&event, r#"{"repository": {"private": true}}"#).unwrap();

        let env = runner(&[("GITHUB_EVENT_PATH", event.to_str().unwrap())]);
        assert!(env.repository_private);
    }
}
