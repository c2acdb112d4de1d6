//! ビルド結果（iidfile / metadata-file）の読み込み

use crate::args::BuildPaths;
use crate::error::{BuildError, Result};
use serde_json::Value;
use std::path::Path;

const DIGEST_KEY: &str = "containerimage.digest";
const BUILD_REF_KEY: &str = "buildx.build.ref";

/// エンジンが書き出したビルド結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildRecord {
    pub image_id: Option<String>,
    pub digest: Option<String>,
    pub metadata: Option<Value>,
    /// `builder/node/ref`
    pub build_ref: Option<String>,
}

impl BuildRecord {
    /// 一時ディレクトリから読み込む。存在しないファイルは未設定扱い
    pub async fn read(paths: &BuildPaths) -> Result<Self> {
        let image_id = read_optional(&paths.iid_file())
            .await?
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        let metadata = match read_optional(&paths.metadata_file()).await? {
            Some(content) if !content.trim().is_empty() && content.trim() != "null" => {
                Some(serde_json::from_str::<Value>(&content)?)
            }
            _ => None,
        };

        Ok(Self::from_parts(image_id, metadata))
    }

    pub fn from_parts(image_id: Option<String>, metadata: Option<Value>) -> Self {
        let field = |key: &str| {
            metadata
                .as_ref()
                .and_then(|m| m.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Self {
            digest: field(DIGEST_KEY),
            build_ref: field(BUILD_REF_KEY),
            image_id,
            metadata,
        }
    }

    /// `metadata` 出力用の整形済みJSON
    pub fn metadata_json(&self) -> Option<String> {
        self.metadata
            .as_ref()
            .and_then(|m| serde_json::to_string_pretty(m).ok())
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BuildError::file(path, e)),
    }
}
