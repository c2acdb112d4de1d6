//! 状態ストアのトレイト

use crate::error::Result;
use crate::key::StateKey;
use async_trait::async_trait;

/// main から post へ値を受け渡すストア
///
/// 未設定のキーはエラーではなく `None` を返します。
#[async_trait]
pub trait StateStore: Send + Sync {
    /// ストアの種類（ログ用）
    fn kind(&self) -> &'static str;

    async fn set(&self, key: StateKey, value: &str) -> Result<()>;

    async fn get(&self, key: StateKey) -> Result<Option<String>>;

    /// post の終了時に呼ばれる。既定では何もしない
    async fn clear(&self) -> Result<()> {
        Ok(())
    }

    /// いずれかのキーが保存されているか
    async fn is_empty(&self) -> Result<bool> {
        for key in StateKey::ALL {
            if self.get(key).await?.is_some() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
