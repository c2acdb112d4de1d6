//! buildx の実行と結果の分類

use crate::args::{BuildPaths, CompiledArgs};
use crate::engine::{BuildEngine, EngineOutput};
use crate::error::{BuildError, Result};
use crate::record::BuildRecord;
use buildflow_core::{Capabilities, CallMode, Feature};
use std::sync::Arc;

const UNKNOWN_ERROR: &str = "unknown error";

/// 実行結果
///
/// 失敗時でも読み取れたビルド結果は保持し、出力の公開に使います。
#[derive(Debug)]
pub struct BuildOutcome {
    pub output: EngineOutput,
    pub record: BuildRecord,
    pub failure: Option<BuildError>,
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// 失敗していればエラーを取り出す
    pub fn into_result(self) -> Result<BuildRecord> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self.record),
        }
    }
}

pub struct InvocationRunner {
    engine: Arc<dyn BuildEngine>,
}

impl InvocationRunner {
    pub fn new(engine: Arc<dyn BuildEngine>) -> Self {
        Self { engine }
    }

    /// 引数列でビルドを実行
    ///
    /// プロセスを起動できなかった場合のみ `Err`。非ゼロ終了は [`BuildOutcome::failure`] に入る
    pub async fn run(
        &self,
        compiled: &CompiledArgs,
        call_mode: CallMode,
        caps: &Capabilities,
        paths: &BuildPaths,
    ) -> Result<BuildOutcome> {
        let mut envs = Vec::new();
        if caps.satisfies(Feature::MetadataWarnings) {
            envs.push(("BUILDX_METADATA_WARNINGS".to_string(), "true".to_string()));
        }

        let output = self.engine.run(compiled.args(), &envs).await?;

        let mut failure = classify_failure(call_mode, &output).map(|summary| {
            BuildError::EngineFailed {
                summary,
                exit_code: output.exit_code,
            }
        });

        let record = match BuildRecord::read(paths).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Unable to read build result: {}", e);
                if failure.is_none() {
                    failure = Some(e);
                }
                BuildRecord::default()
            }
        };

        if failure.is_none() {
            tracing::info!(
                image_id = ?record.image_id,
                digest = ?record.digest,
                "Build completed"
            );
        }

        Ok(BuildOutcome {
            output,
            record,
            failure,
        })
    }
}

/// 非ゼロ終了のエラー要約を決定
///
/// - `check` モード: stdout の先頭行
/// - それ以外: stderr の最後の空でない行
pub fn classify_failure(call_mode: CallMode, output: &EngineOutput) -> Option<String> {
    if output.success() {
        return None;
    }

    let summary = match call_mode {
        CallMode::Check => output.stdout.lines().next().map(str::trim),
        _ => output
            .stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty()),
    };

    Some(
        summary
            .filter(|line| !line.is_empty())
            .unwrap_or(UNKNOWN_ERROR)
            .to_string(),
    )
}
