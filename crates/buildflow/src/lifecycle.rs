//! main / post フェーズの実行
//!
//! main: 入力の読み込み → バージョン取得 → 検証 → 引数組み立て → 実行 → 出力・状態の保存
//! post: 状態の読み込み → サマリ生成 → 一時ディレクトリの削除

use crate::outputs::OutputWriter;
use crate::summary::{self, SummaryInputs};
use anyhow::Context;
use buildflow_build::{
    BuildEngine, BuildPaths, CapabilityNegotiator, CompileOptions, InvocationRunner, compile,
    materialize_secrets,
};
use buildflow_config::{RunnerEnv, workflow};
use buildflow_core::{
    BuildInputs, CallMode, Capabilities, Feature, ParseContext, RawInputs, parse_inputs,
};
use buildflow_state::{StateKey, StateStore};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const TMP_DIR_PREFIX: &str = "buildflow-";
const RECORDS_DIR: &str = "buildflow-records";

pub struct Lifecycle {
    engine: Arc<dyn BuildEngine>,
    store: Arc<dyn StateStore>,
    runner: RunnerEnv,
    outputs: OutputWriter,
    summary_file: Option<PathBuf>,
}

impl Lifecycle {
    pub fn new(
        engine: Arc<dyn BuildEngine>,
        store: Arc<dyn StateStore>,
        runner: RunnerEnv,
        outputs: OutputWriter,
        summary_file: Option<PathBuf>,
    ) -> Self {
        Self {
            engine,
            store,
            runner,
            outputs,
            summary_file,
        }
    }

    /// main フェーズ
    ///
    /// 状態ストアは最初に空にする。ビルドが失敗した場合も、出力と状態を書いてからエラーを返す
    pub async fn main(&self, raw: &RawInputs) -> anyhow::Result<()> {
        tracing::info!(inputs = raw.len(), store = self.store.kind(), "Starting main phase");

        // 前回の post が走らなかった場合の残りを、この実行の状態と混同しない
        self.store.clear().await?;

        let negotiator = CapabilityNegotiator::new(self.engine.clone())
            .with_builder(Some(raw.get("builder").trim().to_string()));
        let caps = negotiator.query().await?;

        workflow::group("Docker info");
        println!("Buildx version: {}", caps.buildx_version());
        match caps.buildkit_version() {
            Some(version) => println!("BuildKit version: {}", version),
            None => println!("BuildKit version: unknown"),
        }
        workflow::end_group();

        let ctx = ParseContext {
            default_context: self.runner.git_context(),
            git_host: self.runner.git_host(),
            capabilities: caps,
        };
        let parsed = parse_inputs(raw, &ctx)?;
        for warning in &parsed.warnings {
            workflow::warning(warning);
        }
        let inputs = parsed.inputs;
        workflow::debug(&format!("Build context: {}", inputs.context));

        let tmp_dir = create_tmp_dir(&self.runner.runner_temp)?;
        self.store
            .set(StateKey::TmpDir, &tmp_dir.display().to_string())
            .await?;
        let paths = BuildPaths::new(&tmp_dir);

        materialize_secrets(&inputs.secrets, &paths).await?;

        let options = CompileOptions {
            paths: paths.clone(),
            builder_id: self.runner.workflow_run_url(),
            private_repository: self.runner.repository_private,
        };
        let compiled = compile(&inputs, caps, &options);
        for advisory in compiled.advisories() {
            workflow::warning(&advisory.message);
        }

        let outcome = InvocationRunner::new(self.engine.clone())
            .run(&compiled, inputs.call_mode(), caps, &paths)
            .await?;

        self.outputs
            .publish(&outcome.record)
            .context("出力の書き込みに失敗しました")?;

        if let Some(build_ref) = &outcome.record.build_ref {
            self.store.set(StateKey::BuildRef, build_ref).await?;
        }
        let summary_supported = self.summary_supported(&inputs, caps);
        self.store
            .set(StateKey::SummarySupported, &summary_supported.to_string())
            .await?;
        if summary_supported {
            let summary_inputs = SummaryInputs::new(&inputs, outcome.is_success());
            self.store
                .set(
                    StateKey::SummaryInputs,
                    &serde_json::to_string(&summary_inputs)?,
                )
                .await?;
        }

        let record = outcome.into_result()?;
        match &record.image_id {
            Some(id) => println!("{} {}", "✓ Build completed:".green().bold(), id),
            None => println!("{}", "✓ Build completed".green().bold()),
        }
        Ok(())
    }

    /// post フェーズ
    ///
    /// main の状態が無ければ何もしない。サマリ・削除の失敗は警告のみ
    pub async fn post(&self) -> anyhow::Result<()> {
        if self.store.is_empty().await? {
            tracing::info!("No state from the main phase; nothing to do");
            return Ok(());
        }

        let tmp_dir = self.store.get(StateKey::TmpDir).await?.map(PathBuf::from);
        let build_ref = self.store.get(StateKey::BuildRef).await?;
        let summary_supported =
            self.store.get(StateKey::SummarySupported).await?.as_deref() == Some("true");

        if summary_supported && let Some(build_ref) = &build_ref {
            if let Err(e) = self.write_summary(build_ref).await {
                workflow::warning(&format!("Failed to generate build summary: {:#}", e));
            }
        }

        if let Some(dir) = &tmp_dir {
            match tokio::fs::remove_dir_all(dir).await {
                Ok(()) => tracing::info!("Removed temp folder {}", dir.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => workflow::warning(&format!(
                    "Failed to remove temp folder {}: {}",
                    dir.display(),
                    e
                )),
            }
        }

        if let Err(e) = self.store.clear().await {
            workflow::warning(&format!("Failed to clear state: {}", e));
        }
        Ok(())
    }

    fn summary_supported(&self, inputs: &BuildInputs, caps: &Capabilities) -> bool {
        if !self.runner.build_summary {
            tracing::info!("Build summary disabled");
            return false;
        }
        if inputs.call_mode() != CallMode::Build {
            tracing::debug!(call = inputs.call_mode().as_str(), "Build summary skipped");
            return false;
        }
        if !caps.satisfies(Feature::BuildHistory) {
            workflow::warning(&format!(
                "Build summary requires Buildx {} but {} is installed",
                Feature::BuildHistory.requirement(),
                caps.buildx_version()
            ));
            return false;
        }
        true
    }

    async fn write_summary(&self, build_ref: &str) -> anyhow::Result<()> {
        let inputs: SummaryInputs = match self.store.get(StateKey::SummaryInputs).await? {
            Some(json) => serde_json::from_str(&json).context("サマリ情報が不正です")?,
            None => anyhow::bail!("サマリ情報が保存されていません"),
        };

        let caps = CapabilityNegotiator::new(self.engine.clone())
            .query()
            .await?
            .clone();

        let record_file = if !self.runner.record_upload {
            tracing::info!("Build record export disabled");
            None
        } else if !caps.satisfies(Feature::HistoryExport) {
            tracing::debug!(
                "Build record export requires Buildx {}",
                Feature::HistoryExport.requirement()
            );
            None
        } else {
            self.export_record(build_ref).await
        };

        let markdown = summary::render(build_ref, &inputs, record_file.as_deref());
        match &self.summary_file {
            Some(path) => summary::append(path, &markdown)?,
            None => tracing::info!("Step summary file not set; summary:\n{}", markdown),
        }
        Ok(())
    }

    async fn export_record(&self, build_ref: &str) -> Option<PathBuf> {
        let id = build_ref.rsplit('/').next().unwrap_or(build_ref);
        let dir = self.runner.runner_temp.join(RECORDS_DIR);
        let dest = dir.join(format!("{}.dockerbuild", id));

        let result = match tokio::fs::create_dir_all(&dir).await {
            Ok(()) => self.engine.export_record(build_ref, &dest).await,
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(()) => {
                tracing::info!("Exported build record to {}", dest.display());
                Some(dest)
            }
            Err(e) => {
                workflow::warning(&format!("Failed to export build record: {}", e));
                None
            }
        }
    }
}

/// ランナーの一時ディレクトリ配下に作業ディレクトリを作成（post で削除する）
fn create_tmp_dir(base: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(base)
        .with_context(|| format!("一時ディレクトリを作成できません: {}", base.display()))?;
    let dir = tempfile::Builder::new()
        .prefix(TMP_DIR_PREFIX)
        .tempdir_in(base)
        .with_context(|| format!("一時ディレクトリを作成できません: {}", base.display()))?
        .keep();
    tracing::debug!("Created temp folder {}", dir.display());
    Ok(dir)
}
