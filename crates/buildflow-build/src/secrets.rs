//! 値で渡されたシークレットの書き出し

use crate::args::BuildPaths;
use crate::error::{BuildError, Result};
use buildflow_core::{Secret, SecretSource};

/// `SecretSource::Value` を一時ディレクトリに書き出し、書いた数を返す
///
/// ファイルは所有者のみ読み書き可能（Unix）
pub async fn materialize_secrets(secrets: &[Secret], paths: &BuildPaths) -> Result<usize> {
    let mut written = 0;

    for secret in secrets {
        let SecretSource::Value(value) = &secret.source else {
            continue;
        };

        if written == 0 {
            let dir = paths.secrets_dir();
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| BuildError::file(&dir, e))?;
        }

        let path = paths.secret_file(&secret.id);
        tokio::fs::write(&path, value)
            .await
            .map_err(|e| BuildError::file(&path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| BuildError::file(&path, e))?;
        }

        tracing::debug!(id = %secret.id, "Wrote secret file");
        written += 1;
    }

    Ok(written)
}
