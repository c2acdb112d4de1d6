//! buildflow のビルド実行
//!
//! buildx のバージョン取得、コマンドライン引数の組み立て、
//! 実行と結果の読み取りを提供します。

pub mod args;
pub mod engine;
pub mod error;
pub mod record;
pub mod runner;
pub mod secrets;
pub mod version;

pub use args::{Advisory, BuildPaths, CompileOptions, CompiledArgs, compile};
pub use engine::{BuildEngine, DockerBuildx, EngineOutput};
pub use error::{BuildError, Result};
pub use record::BuildRecord;
pub use runner::{BuildOutcome, InvocationRunner, classify_failure};
pub use secrets::materialize_secrets;
pub use version::{CapabilityNegotiator, parse_buildkit_version, parse_buildx_version};
