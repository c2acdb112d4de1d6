//! buildflow のコア機能
//!
//! ワークフローから渡された入力をパース・検証し、
//! ビルドエンジンに渡せる型付きの設定に変換します。

pub mod capability;
pub mod error;
pub mod model;
pub mod parser;
pub mod template;

pub use capability::{Capabilities, Component, Feature, parse_version};
pub use error::{CoreError, Result};
pub use model::*;
pub use parser::{ParseContext, ParsedInputs, parse_inputs};
pub use template::{DEFAULT_CONTEXT, NamedContexts, expand};
