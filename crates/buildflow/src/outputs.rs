//! ステップ出力（imageid / digest / metadata）の公開

use buildflow_build::BuildRecord;
use buildflow_config::CommandFile;

pub const IMAGE_ID: &str = "imageid";
pub const DIGEST: &str = "digest";
pub const METADATA: &str = "metadata";

/// `GITHUB_OUTPUT` への書き込み
///
/// 出力ファイルが無い場合（ローカル実行）はログに出すだけ
pub struct OutputWriter {
    file: Option<CommandFile>,
}

impl OutputWriter {
    pub fn new(file: Option<CommandFile>) -> Self {
        Self { file }
    }

    pub fn set(&self, name: &str, value: &str) -> anyhow::Result<()> {
        match &self.file {
            Some(file) => file.append(name, value)?,
            None => tracing::info!("Output {}: {}", name, value),
        }
        Ok(())
    }

    /// ビルド結果から出力を設定。値の無い出力は書かない
    pub fn publish(&self, record: &BuildRecord) -> anyhow::Result<usize> {
        let mut published = 0;
        let outputs = [
            (IMAGE_ID, record.image_id.clone()),
            (DIGEST, record.digest.clone()),
            (METADATA, record.metadata_json()),
        ];
        for (name, value) in outputs {
            if let Some(value) = value {
                self.set(name, &value)?;
                published += 1;
            }
        }
        Ok(published)
    }
}
