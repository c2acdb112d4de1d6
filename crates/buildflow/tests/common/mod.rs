use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// `docker buildx` の代わりに PATH に置くスクリプト
///
/// - `FAKE_BUILDX_VERSION`: `buildx version` が返すバージョン（デフォルト v0.13.0）
/// - `FAKE_BUILD_FAIL`: 設定されていれば build を失敗させる
const FAKE_DOCKER: &str = r##"#!/bin/sh
[ "$1" = "buildx" ] && shift
case "$1" in
  version)
    echo "github.com/docker/buildx ${FAKE_BUILDX_VERSION:-v0.13.0} abcdef0"
    ;;
  inspect)
    echo "Name: default"
    echo "BuildKit version: v0.13.2"
    ;;
  build)
    echo "$@" > "$FAKE_ARGS_FILE"
    while [ $# -gt 0 ]; do
      case "$1" in
        --iidfile) printf 'sha256:abc' > "$2"; shift ;;
        --metadata-file) printf '{"buildx.build.ref":"default/default/r1","containerimage.digest":"sha256:def"}' > "$2"; shift ;;
      esac
      shift
    done
    echo "#1 building"
    if [ -n "$FAKE_BUILD_FAIL" ]; then
      echo "ERROR: failed to solve: boom" >&2
      exit 1
    fi
    ;;
  history)
    exit 1
    ;;
esac
"##;

/// ランナー環境を模したテスト用ディレクトリ
pub struct TestRunner {
    pub root: TempDir,
}

impl TestRunner {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("bin")).unwrap();
        fs::create_dir_all(root.path().join("runner")).unwrap();
        Self { root }
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    pub fn runner_temp(&self) -> PathBuf {
        self.path().join("runner")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.path().join("state")
    }

    pub fn output_file(&self) -> PathBuf {
        self.path().join("output")
    }

    pub fn summary_file(&self) -> PathBuf {
        self.path().join("summary.md")
    }

    pub fn args_file(&self) -> PathBuf {
        self.path().join("buildx-args")
    }

    #[cfg(unix)]
    #[allow(dead_code)]
    pub fn install_fake_docker(&self) {
        use std::os::unix::fs::PermissionsExt;

        let path = self.path().join("bin").join("docker");
        fs::write(&path, FAKE_DOCKER).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[allow(dead_code)]
    pub fn read_output(&self) -> String {
        fs::read_to_string(self.output_file()).unwrap_or_default()
    }

    /// ランナー変数のみを持つ環境で `buildflow` を起動するコマンド
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("buildflow").unwrap();
        cmd.env_clear()
            .env("PATH", format!("{}:/usr/bin:/bin", self.path().join("bin").display()))
            .env("RUNNER_TEMP", self.runner_temp())
            .env("GITHUB_REPOSITORY", "octo/app")
            .env("GITHUB_SHA", "0123abcd")
            .env("GITHUB_OUTPUT", self.output_file())
            .env("GITHUB_STEP_SUMMARY", self.summary_file())
            .env("BUILDFLOW_STATE_DIR", self.state_dir())
            .env("FAKE_ARGS_FILE", self.args_file());
        cmd
    }
}
