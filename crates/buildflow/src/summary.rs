//! ステップサマリ（Markdown）の生成

use anyhow::Context;
use buildflow_core::BuildInputs;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// main から post に渡すサマリ用の情報
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryInputs {
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub load: bool,
    pub succeeded: bool,
}

impl SummaryInputs {
    pub fn new(inputs: &BuildInputs, succeeded: bool) -> Self {
        Self {
            context: inputs.context.as_arg(),
            file: inputs.file.clone(),
            target: inputs.target.clone(),
            platforms: inputs.platforms.clone(),
            tags: inputs.tags.clone(),
            push: inputs.push,
            load: inputs.load,
            succeeded,
        }
    }
}

/// サマリの Markdown
pub fn render(build_ref: &str, inputs: &SummaryInputs, record_dir: Option<&Path>) -> String {
    let mut md = String::new();
    md.push_str("### Docker Build summary\n\n");

    let status = if inputs.succeeded {
        ":white_check_mark: completed"
    } else {
        ":x: failed"
    };
    let id = build_ref.rsplit('/').next().unwrap_or(build_ref);

    md.push_str("| Field | Value |\n|---|---|\n");
    row(&mut md, "ID", &code(id));
    row(&mut md, "Build ref", &code(build_ref));
    row(&mut md, "Status", status);
    row(&mut md, "Context", &code(&inputs.context));
    if let Some(file) = &inputs.file {
        row(&mut md, "File", &code(file));
    }
    if let Some(target) = &inputs.target {
        row(&mut md, "Target", &code(target));
    }
    if !inputs.platforms.is_empty() {
        row(&mut md, "Platforms", &list(&inputs.platforms));
    }
    if !inputs.tags.is_empty() {
        row(&mut md, "Tags", &list(&inputs.tags));
    }
    row(&mut md, "Push", &inputs.push.to_string());
    row(&mut md, "Load", &inputs.load.to_string());
    md.push('\n');

    if let Some(dir) = record_dir {
        md.push_str(&format!(
            "Build record exported to {}\n\n",
            code(&dir.display().to_string())
        ));
    }

    md.push_str(&format!(
        "<sub>Generated by buildflow {} at {}</sub>\n",
        env!("CARGO_PKG_VERSION"),
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md
}

/// `GITHUB_STEP_SUMMARY` に追記
pub fn append(path: &Path, markdown: &str) -> anyhow::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("サマリファイルを開けません: {}", path.display()))?;
    file.write_all(markdown.as_bytes())?;
    Ok(())
}

fn row(md: &mut String, field: &str, value: &str) {
    md.push_str(&format!("| {} | {} |\n", field, value.replace('|', "\\|")));
}

fn code(value: &str) -> String {
    format!("`{}`", value)
}

fn list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| code(v))
        .collect::<Vec<_>>()
        .join("<br>")
}
