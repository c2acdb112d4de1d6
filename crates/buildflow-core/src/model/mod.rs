//! モデル定義
//!
//! 検証済みのビルド入力と、それを構成する値型を定義します。

mod context;
mod inputs;
mod raw;
mod secret;

// Re-exports
pub use context::*;
pub use inputs::*;
pub use raw::*;
pub use secret::*;
