//! buildx CLI の呼び出し
//!
//! [`BuildEngine`] は外部プロセスとの境界です。テストではスクリプト化した
//! 偽エンジンに差し替えます。

use crate::error::{BuildError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// プロセスの終了結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl EngineOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[async_trait]
pub trait BuildEngine: Send + Sync {
    /// `buildx version` の生出力
    async fn version(&self) -> Result<String>;

    /// `buildx inspect` の生出力（ビルダーが応答しない場合は None）
    async fn inspect(&self, builder: Option<&str>) -> Result<Option<String>>;

    /// buildx をサブコマンド付きで実行し、出力をコンソールに流しながら全て捕捉する
    async fn run(&self, args: &[String], envs: &[(String, String)]) -> Result<EngineOutput>;

    /// ビルドレコードを `dest` ファイルに書き出す
    async fn export_record(&self, build_ref: &str, dest: &Path) -> Result<()>;
}

/// `docker buildx`（または単体の `buildx`）
#[derive(Debug, Clone, Default)]
pub struct DockerBuildx {
    standalone: bool,
}

impl DockerBuildx {
    pub fn new(standalone: bool) -> Self {
        Self { standalone }
    }

    pub fn program(&self) -> &'static str {
        if self.standalone { "buildx" } else { "docker" }
    }

    /// ログ表示用のコマンドライン
    pub fn command_line(&self, args: &[String]) -> String {
        let mut parts: Vec<&str> = vec![self.program()];
        if !self.standalone {
            parts.push("buildx");
        }
        parts.extend(args.iter().map(String::as_str));
        parts.join(" ")
    }

    fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = Command::new(self.program());
        if !self.standalone {
            cmd.arg("buildx");
        }
        cmd.args(args);
        cmd
    }

    /// 出力を捕捉するだけの短いコマンド
    async fn capture(&self, args: &[&str]) -> Result<EngineOutput> {
        let mut cmd = self.command(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: {}", self.command_line(&to_owned(args)));

        let output = cmd.output().await.map_err(|source| BuildError::EngineSpawn {
            program: self.program().to_string(),
            source,
        })?;

        Ok(EngineOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[async_trait]
impl BuildEngine for DockerBuildx {
    async fn version(&self) -> Result<String> {
        let output = self.capture(&["version"]).await?;
        if !output.success() {
            return Err(BuildError::CapabilityQuery(last_line(&output.stderr)));
        }
        Ok(output.stdout)
    }

    async fn inspect(&self, builder: Option<&str>) -> Result<Option<String>> {
        let mut args = vec!["inspect"];
        if let Some(name) = builder {
            args.push(name);
        }
        let output = self.capture(&args).await?;
        if !output.success() {
            tracing::debug!("buildx inspect failed: {}", last_line(&output.stderr));
            return Ok(None);
        }
        Ok(Some(output.stdout))
    }

    async fn run(&self, args: &[String], envs: &[(String, String)]) -> Result<EngineOutput> {
        let mut cmd = self.command(args);
        cmd.envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::info!("Running: {}", self.command_line(args));

        let mut child = cmd.spawn().map_err(|source| BuildError::EngineSpawn {
            program: self.program().to_string(),
            source,
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (stdout, stderr, status) = tokio::join!(
            tee(stdout, Console::Stdout),
            tee(stderr, Console::Stderr),
            child.wait()
        );

        Ok(EngineOutput {
            exit_code: status?.code().unwrap_or(-1),
            stdout: stdout?,
            stderr: stderr?,
        })
    }

    async fn export_record(&self, build_ref: &str, dest: &Path) -> Result<()> {
        let (builder, id) = match build_ref.split('/').collect::<Vec<_>>().as_slice() {
            [builder, _node, id] => (Some(*builder), *id),
            _ => (None, build_ref),
        };
        let dest = dest.to_string_lossy();

        let mut args = vec!["history", "export"];
        if let Some(builder) = builder {
            args.extend(["--builder", builder]);
        }
        args.extend([id, "--output", &*dest]);

        let output = self.capture(&args).await?;
        if !output.success() {
            return Err(BuildError::EngineFailed {
                summary: last_line(&output.stderr),
                exit_code: output.exit_code,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Console {
    Stdout,
    Stderr,
}

/// パイプを1行ずつコンソールに流しつつ全体を捕捉
async fn tee<R>(reader: Option<R>, console: Console) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(String::new());
    };

    // ビルドログには UTF-8 でないバイトが混ざることがある
    let mut captured = String::new();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&buf);
        let line = text.trim_end_matches(['\n', '\r']);
        match console {
            Console::Stdout => println!("{}", line),
            Console::Stderr => eprintln!("{}", line),
        }
        captured.push_str(line);
        captured.push('\n');
    }
    Ok(captured)
}

fn last_line(text: &str) -> String {
    text.lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("unknown error")
        .to_string()
}

fn to_owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}
