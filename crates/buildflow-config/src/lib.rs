//! buildflow の実行環境設定
//!
//! ランナーが渡す環境変数・入力・コマンドファイルを扱います。

pub mod command_file;
pub mod error;
pub mod inputs;
pub mod runner;
pub mod workflow;

pub use command_file::CommandFile;
pub use error::*;
pub use inputs::read_inputs;
pub use runner::RunnerEnv;

use std::path::PathBuf;

/// 状態ストア（ファイル版）の保存先を探す
///
/// 以下の優先順位で決定:
/// 1. 環境変数 BUILDFLOW_STATE_DIR (直接パス指定)
/// 2. $RUNNER_TEMP/buildflow-state
/// 3. ~/.cache/buildflow/state
pub fn find_state_dir() -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(dir) = std::env::var("BUILDFLOW_STATE_DIR")
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }

    // 2. ランナーの一時ディレクトリ
    if let Ok(temp) = std::env::var("RUNNER_TEMP")
        && !temp.trim().is_empty()
    {
        return Ok(PathBuf::from(temp).join("buildflow-state"));
    }

    // 3. ユーザーキャッシュディレクトリ
    dirs::cache_dir()
        .map(|dir| dir.join("buildflow").join("state"))
        .ok_or(ConfigError::StateDirNotFound)
}
