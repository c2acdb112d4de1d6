//! buildflow のフェーズ間状態
//!
//! main フェーズで保存した値を post フェーズで読み戻すためのストアです。
//!
//! ```text
//! main ──set──▶ StateStore ──get──▶ post
//!               ├─ CommandFileStateStore (GITHUB_STATE / STATE_*)
//!               ├─ FileStateStore        (<dir>/state.json)
//!               └─ MemoryStateStore      (テスト用)
//! ```

pub mod command;
pub mod error;
pub mod file;
pub mod key;
pub mod memory;
pub mod store;

// Re-exports
pub use command::CommandFileStateStore;
pub use error::{Result, StateError};
pub use file::FileStateStore;
pub use key::{KEY_PREFIX, StateKey};
pub use memory::MemoryStateStore;
pub use store::StateStore;
