mod lifecycle;
mod outputs;
mod summary;

use buildflow_build::{BuildError, DockerBuildx};
use buildflow_config::{CommandFile, ConfigError, RunnerEnv, find_state_dir, read_inputs, workflow};
use buildflow_core::CoreError;
use buildflow_state::{CommandFileStateStore, FileStateStore, StateError, StateStore};
use clap::{Args, Parser, Subcommand};
use lifecycle::Lifecycle;
use outputs::OutputWriter;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "buildflow")]
#[command(about = "CI ステップから docker buildx でイメージをビルド", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args)]
struct GlobalArgs {
    /// 状態コマンドファイル（main で追記）
    #[arg(long, env = "GITHUB_STATE", global = true)]
    state_file: Option<PathBuf>,

    /// 出力コマンドファイル
    #[arg(long, env = "GITHUB_OUTPUT", global = true)]
    output_file: Option<PathBuf>,

    /// ステップサマリファイル
    #[arg(long, env = "GITHUB_STEP_SUMMARY", global = true)]
    summary_file: Option<PathBuf>,

    /// 状態を JSON ファイルで受け渡すディレクトリ（ローカル実行用）
    #[arg(long, env = "BUILDFLOW_STATE_DIR", global = true)]
    state_dir: Option<PathBuf>,

    /// `docker buildx` ではなく単体の `buildx` を使う
    #[arg(long, env = "BUILDX_STANDALONE", global = true)]
    standalone: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// ビルドを実行（main フェーズ）
    Main,
    /// サマリ生成と後片付け（post フェーズ）
    Post,
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // stdout はワークフローコマンドとビルド出力に使うので、ログは stderr へ
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(cli).await {
        workflow::error(&error_message(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let lifecycle = match cli.command {
        Commands::Version => {
            println!("buildflow {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => build_lifecycle(&cli.global)?,
    };

    match cli.command {
        Commands::Main => lifecycle.main(&read_inputs()).await,
        Commands::Post => lifecycle.post().await,
        Commands::Version => Ok(()),
    }
}

fn build_lifecycle(args: &GlobalArgs) -> anyhow::Result<Lifecycle> {
    let runner = RunnerEnv::from_env()?;
    let engine = Arc::new(DockerBuildx::new(args.standalone));
    let store = open_store(args)?;
    tracing::debug!(store = store.kind(), "Opened state store");

    Ok(Lifecycle::new(
        engine,
        store,
        runner,
        OutputWriter::new(args.output_file.clone().map(CommandFile::new)),
        args.summary_file.clone(),
    ))
}

/// 状態ストアを選ぶ
///
/// 1. --state-dir / BUILDFLOW_STATE_DIR → JSON ファイル
/// 2. GITHUB_STATE があればランナーのコマンドファイル
/// 3. それ以外はユーザーのキャッシュディレクトリに JSON ファイル
fn open_store(args: &GlobalArgs) -> anyhow::Result<Arc<dyn StateStore>> {
    if let Some(dir) = &args.state_dir {
        return Ok(Arc::new(FileStateStore::new(dir)));
    }
    if args.state_file.is_some() {
        return Ok(Arc::new(CommandFileStateStore::from_env(
            args.state_file.clone(),
        )));
    }
    Ok(Arc::new(FileStateStore::new(find_state_dir()?)))
}

/// `::error::` に出す1行メッセージ
fn error_message(err: &anyhow::Error) -> String {
    if let Some(e) = err.downcast_ref::<BuildError>() {
        return e.user_message();
    }
    if let Some(e) = err.downcast_ref::<CoreError>() {
        return e.user_message();
    }
    if let Some(e) = err.downcast_ref::<StateError>() {
        return e.to_string();
    }
    if let Some(e) = err.downcast_ref::<ConfigError>() {
        return e.to_string();
    }
    format!("{:#}", err)
}
