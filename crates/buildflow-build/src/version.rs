//! エンジンのバージョン取得
//!
//! buildx のバージョンはプロセス内で一度だけ問い合わせ、以降はキャッシュを返します。

use crate::engine::BuildEngine;
use crate::error::{BuildError, Result};
use buildflow_core::{Capabilities, parse_version};
use regex::Regex;
use semver::Version;
use std::sync::{Arc, LazyLock};
use tokio::sync::OnceCell;

/// `buildx inspect` の `BuildKit version: v0.12.5` 行（古い buildx は `Buildkit:`）
static BUILDKIT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^\s*buildkit(?: version)?:\s*(\S+)").expect("valid regex")
});

pub struct CapabilityNegotiator {
    engine: Arc<dyn BuildEngine>,
    builder: Option<String>,
    capabilities: OnceCell<Capabilities>,
}

impl CapabilityNegotiator {
    pub fn new(engine: Arc<dyn BuildEngine>) -> Self {
        Self {
            engine,
            builder: None,
            capabilities: OnceCell::new(),
        }
    }

    /// BuildKit のバージョンを調べるビルダー名
    pub fn with_builder(mut self, builder: Option<String>) -> Self {
        self.builder = builder.filter(|b| !b.trim().is_empty());
        self
    }

    /// バージョン情報を取得（初回のみエンジンに問い合わせる）
    ///
    /// 同時に呼ばれても問い合わせは1回です。失敗はキャッシュされません。
    pub async fn query(&self) -> Result<&Capabilities> {
        self.capabilities
            .get_or_try_init(|| async {
                let raw = self.engine.version().await.map_err(|e| match e {
                    BuildError::CapabilityQuery(_) => e,
                    other => BuildError::CapabilityQuery(other.to_string()),
                })?;
                let buildx = parse_buildx_version(&raw).ok_or_else(|| {
                    BuildError::CapabilityQuery(format!(
                        "unrecognized output of buildx version: {}",
                        raw.trim()
                    ))
                })?;

                let buildkit = match self.engine.inspect(self.builder.as_deref()).await {
                    Ok(Some(output)) => parse_buildkit_version(&output),
                    Ok(None) => None,
                    Err(e) => {
                        tracing::debug!("BuildKit version unavailable: {}", e);
                        None
                    }
                };

                tracing::info!(
                    buildx = %buildx,
                    buildkit = ?buildkit.as_ref().map(ToString::to_string),
                    "Negotiated engine capabilities"
                );

                Ok::<_, BuildError>(Capabilities::new(buildx).with_buildkit(buildkit))
            })
            .await
    }
}

/// `github.com/docker/buildx v0.12.1 30feaa1a...` からバージョンを取り出す
pub fn parse_buildx_version(output: &str) -> Option<Version> {
    let line = output.lines().find(|l| !l.trim().is_empty())?;
    line.split_whitespace().skip(1).find_map(parse_version)
}

pub fn parse_buildkit_version(output: &str) -> Option<Version> {
    BUILDKIT_LINE
        .captures_iter(output)
        .find_map(|caps| parse_version(&caps[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOutput;
    use async_trait::async_trait;
    use futures_util::future::join_all;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEngine {
        version: std::result::Result<&'static str, &'static str>,
        inspect: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl CountingEngine {
        fn new(version: &'static str, inspect: Option<&'static str>) -> Self {
            Self {
                version: Ok(version),
                inspect,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BuildEngine for CountingEngine {
        async fn version(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.version
                .map(str::to_string)
                .map_err(|e| BuildError::CapabilityQuery(e.to_string()))
        }

        async fn inspect(&self, _builder: Option<&str>) -> Result<Option<String>> {
            Ok(self.inspect.map(str::to_string))
        }

        async fn run(&self, _: &[String], _: &[(String, String)]) -> Result<EngineOutput> {
            unreachable!()
        }

        async fn export_record(&self, _: &str, _: &Path) -> Result<()> {
            unreachable!()
        }
    }

    #[test]
    fn test_parse_buildx_version() {
        assert_eq!(
            parse_buildx_version("github.com/docker/buildx v0.12.1 30feaa1a\n"),
            Some(Version::new(0, 12, 1))
        );
        assert_eq!(
            parse_buildx_version("github.com/docker/buildx 0.11.2-desktop.5 f0b8e8a"),
            Some(Version::new(0, 11, 2))
        );
        assert_eq!(parse_buildx_version("buildx dev"), None);
        assert_eq!(parse_buildx_version(""), None);
    }

    #[test]
    fn test_parse_buildkit_version() {
        let inspect = "Name:          builder\n\
                       Driver:        docker-container\n\
                       \n\
                       Nodes:\n\
                       Name:             builder0\n\
                       Status:           running\n\
                       BuildKit version: v0.12.5\n";
        assert_eq!(
            parse_buildkit_version(inspect),
            Some(Version::new(0, 12, 5))
        );

        let legacy = "Nodes:\nName: default\nBuildkit: v0.10.6\n";
        assert_eq!(
            parse_buildkit_version(legacy),
            Some(Version::new(0, 10, 6))
        );

        assert_eq!(parse_buildkit_version("Nodes:\nName: default\n"), None);
    }

    #[tokio::test]
    async fn test_query_runs_once_for_concurrent_callers() {
        let engine = Arc::new(CountingEngine::new(
            "github.com/docker/buildx v0.12.1 abc",
            Some("BuildKit version: v0.12.5"),
        ));
        let negotiator = CapabilityNegotiator::new(engine.clone());

        let results = join_all((0..5).map(|_| negotiator.query())).await;
        for caps in results {
            let caps = caps.unwrap();
            assert_eq!(caps.buildx_version(), &Version::new(0, 12, 1));
            assert_eq!(caps.buildkit_version(), Some(&Version::new(0, 12, 5)));
        }

        negotiator.query().await.unwrap();
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_query_without_buildkit() {
        let engine = Arc::new(CountingEngine::new("github.com/docker/buildx v0.11.0 abc", None));
        let negotiator = CapabilityNegotiator::new(engine);

        let caps = negotiator.query().await.unwrap();
        assert_eq!(caps.buildkit_version(), None);
    }

    #[tokio::test]
    async fn test_query_failure_is_reported_and_not_cached() {
        let engine = Arc::new(CountingEngine {
            version: Err("docker: 'buildx' is not a docker command"),
            inspect: None,
            calls: AtomicUsize::new(0),
        });
        let negotiator = CapabilityNegotiator::new(engine.clone());

        assert!(matches!(
            negotiator.query().await,
            Err(BuildError::CapabilityQuery(_))
        ));
        assert!(negotiator.query().await.is_err());
        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unrecognized_version_output() {
        let engine = Arc::new(CountingEngine::new("buildx dev", None));
        let negotiator = CapabilityNegotiator::new(engine);

        let err = negotiator.query().await.unwrap_err();
        assert!(err.to_string().contains("buildx dev"));
    }
}
