//! buildx コマンドライン引数の組み立て
//!
//! 検証済みの [`BuildInputs`] とネゴシエーション済みの [`Capabilities`] から
//! 引数列を決定的に生成します。I/O は一切行いません。

use buildflow_core::{AttestationInput, BuildInputs, Capabilities, Feature, Secret, SecretSource};
use std::path::{Path, PathBuf};

/// 一時ディレクトリ内のファイル配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
    tmp_dir: PathBuf,
}

impl BuildPaths {
    pub fn new(tmp_dir: impl Into<PathBuf>) -> Self {
        Self {
            tmp_dir: tmp_dir.into(),
        }
    }

    pub fn tmp_dir(&self) -> &Path {
        &self.tmp_dir
    }

    pub fn iid_file(&self) -> PathBuf {
        self.tmp_dir.join("iidfile")
    }

    pub fn metadata_file(&self) -> PathBuf {
        self.tmp_dir.join("metadata-file")
    }

    pub fn secrets_dir(&self) -> PathBuf {
        self.tmp_dir.join("secrets")
    }

    /// 値で渡されたシークレットの書き出し先
    ///
    /// ID ごとに別のファイル名になるよう、使えない文字と先頭の `.` は `%XX` にエスケープします。
    pub fn secret_file(&self, id: &str) -> PathBuf {
        let mut name = String::with_capacity(id.len());
        for (i, byte) in id.bytes().enumerate() {
            let plain = byte.is_ascii_alphanumeric()
                || matches!(byte, b'-' | b'_')
                || (byte == b'.' && i > 0);
            if plain {
                name.push(byte as char);
            } else {
                name.push_str(&format!("%{:02X}", byte));
            }
        }
        self.secrets_dir().join(name)
    }
}

/// 引数の組み立てに必要な、入力以外の情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub paths: BuildPaths,
    /// provenance の `builder-id`（ワークフロー実行URL）
    pub builder_id: Option<String>,
    /// 非公開リポジトリでは既定の provenance を最小構成にする
    pub private_repository: bool,
}

impl CompileOptions {
    pub fn new(paths: BuildPaths) -> Self {
        Self {
            paths,
            builder_id: None,
            private_repository: false,
        }
    }
}

/// 要求されたがバージョン不足で省いた機能
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    pub feature: Feature,
    pub message: String,
}

impl Advisory {
    fn unsupported(feature: Feature, caps: &Capabilities) -> Self {
        Self {
            feature,
            message: format!(
                "{} requires Buildx {} but {} is installed; ignoring {}",
                feature.input_names(),
                feature.requirement(),
                caps.buildx_version(),
                feature.input_names()
            ),
        }
    }
}

/// 組み立て結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArgs {
    args: Vec<String>,
    advisories: Vec<Advisory>,
}

impl CompiledArgs {
    /// `build` から始まる引数列（`docker buildx` の後ろに続く）
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    /// 指定フラグの値を出現順に取得
    pub fn values_of(&self, flag: &str) -> Vec<&str> {
        self.args
            .windows(2)
            .filter(|pair| pair[0] == flag)
            .map(|pair| pair[1].as_str())
            .collect()
    }

    pub fn contains_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|arg| arg == flag)
    }
}

/// 引数列を組み立てる
pub fn compile(inputs: &BuildInputs, caps: &Capabilities, options: &CompileOptions) -> CompiledArgs {
    let paths = &options.paths;
    let mut c = Compiler::new(caps);

    c.repeat("--add-host", &inputs.add_hosts);
    c.repeat("--allow", &inputs.allow);
    if c.gated(Feature::Annotations, !inputs.annotations.is_empty()) {
        c.repeat("--annotation", &inputs.annotations);
    }
    c.repeat("--build-arg", &inputs.build_args);
    if c.gated(Feature::BuildContexts, !inputs.build_contexts.is_empty()) {
        for context in &inputs.build_contexts {
            c.flag("--build-context", context.as_arg());
        }
    }
    c.repeat("--cache-from", &inputs.cache_from);
    c.repeat("--cache-to", &inputs.cache_to);
    if let Some(call) = &inputs.call
        && c.gated(Feature::Call, true)
    {
        c.flag("--call", &call.value);
    }
    c.optional("--cgroup-parent", &inputs.cgroup_parent);
    for secret in inputs.secrets.iter().filter(|s| s.is_env()) {
        c.flag("--secret", secret_arg(secret, paths));
    }
    c.optional("--file", &inputs.file);
    if !inputs.exports_to_filesystem()
        && (inputs.platforms.is_empty() || caps.satisfies(Feature::IidFile))
    {
        c.flag("--iidfile", paths.iid_file().display().to_string());
    }
    c.repeat("--label", &inputs.labels);
    c.repeat("--no-cache-filter", &inputs.no_cache_filters);
    c.repeat("--output", &inputs.outputs);
    c.repeat("--platform", &inputs.platforms);

    let attest_requested =
        !inputs.attests.is_empty() || inputs.provenance.is_some() || inputs.sbom.is_some();
    if c.gated(Feature::Attestations, attest_requested) || caps.satisfies(Feature::Attestations)
    {
        for attest in attestation_args(inputs, caps, options) {
            c.flag("--attest", attest);
        }
    }

    for secret in inputs.secrets.iter().filter(|s| !s.is_env()) {
        c.flag("--secret", secret_arg(secret, paths));
    }
    c.optional("--shm-size", &inputs.shm_size);
    c.repeat("--ssh", &inputs.ssh);
    c.repeat("--tag", &inputs.tags);
    c.optional("--target", &inputs.target);
    c.repeat("--ulimit", &inputs.ulimits);

    // 共通オプション
    c.optional("--builder", &inputs.builder);
    c.switch("--load", inputs.load);
    if caps.satisfies(Feature::MetadataFile) {
        c.flag("--metadata-file", paths.metadata_file().display().to_string());
    }
    c.optional("--network", &inputs.network);
    c.switch("--no-cache", inputs.no_cache);
    c.switch("--pull", inputs.pull);
    c.switch("--push", inputs.push);

    c.args.push(inputs.context.as_arg());

    tracing::debug!(
        args = c.args.len(),
        advisories = c.advisories.len(),
        "Compiled buildx arguments"
    );

    CompiledArgs {
        args: c.args,
        advisories: c.advisories,
    }
}

struct Compiler<'a> {
    caps: &'a Capabilities,
    args: Vec<String>,
    advisories: Vec<Advisory>,
}

impl<'a> Compiler<'a> {
    fn new(caps: &'a Capabilities) -> Self {
        Self {
            caps,
            args: vec!["build".to_string()],
            advisories: Vec::new(),
        }
    }

    /// 機能が使えるか判定し、要求されていたのに使えない場合は記録する
    fn gated(&mut self, feature: Feature, requested: bool) -> bool {
        if !requested {
            return false;
        }
        if self.caps.satisfies(feature) {
            return true;
        }
        tracing::debug!(?feature, "Feature not supported by installed buildx");
        self.advisories
            .push(Advisory::unsupported(feature, self.caps));
        false
    }

    fn flag(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            return;
        }
        self.args.push(name.to_string());
        self.args.push(value);
    }

    fn repeat(&mut self, name: &str, values: &[String]) {
        for value in values {
            self.flag(name, value.as_str());
        }
    }

    fn optional(&mut self, name: &str, value: &Option<String>) {
        if let Some(value) = value {
            self.flag(name, value.as_str());
        }
    }

    fn switch(&mut self, name: &str, enabled: bool) {
        if enabled {
            self.args.push(name.to_string());
        }
    }
}

fn secret_arg(secret: &Secret, paths: &BuildPaths) -> String {
    match &secret.source {
        SecretSource::Env(name) => format!("id={},env={}", secret.id, name),
        SecretSource::Value(_) => format!(
            "id={},src={}",
            secret.id,
            paths.secret_file(&secret.id).display()
        ),
        SecretSource::File(path) => format!("id={},src={}", secret.id, path.display()),
    }
}

fn attestation_args(
    inputs: &BuildInputs,
    caps: &Capabilities,
    options: &CompileOptions,
) -> Vec<String> {
    let mut args = Vec::new();
    let builder_id = options.builder_id.as_deref();

    match &inputs.provenance {
        Some(provenance) => args.push(provenance_attrs(provenance, builder_id)),
        None => {
            let explicit = inputs
                .attests
                .iter()
                .any(|a| has_attestation_type(a, "provenance"));
            if !explicit
                && caps.satisfies(Feature::DefaultProvenance)
                && !inputs.exports_to_docker()
            {
                let mode = if options.private_repository {
                    "mode=min,inline-only=true"
                } else {
                    "mode=max"
                };
                args.push(with_builder_id(
                    format!("type=provenance,{}", mode),
                    builder_id,
                ));
            }
        }
    }

    if let Some(sbom) = &inputs.sbom {
        args.push(match sbom {
            AttestationInput::Enabled => "type=sbom".to_string(),
            AttestationInput::Disabled => "type=sbom,disabled=true".to_string(),
            AttestationInput::Attrs(attrs) => format!("type=sbom,{}", attrs),
        });
    }

    for attest in &inputs.attests {
        let covered = (inputs.provenance.is_some() && has_attestation_type(attest, "provenance"))
            || (inputs.sbom.is_some() && has_attestation_type(attest, "sbom"));
        if !covered {
            args.push(attest.clone());
        }
    }

    args
}

fn provenance_attrs(provenance: &AttestationInput, builder_id: Option<&str>) -> String {
    match provenance {
        AttestationInput::Enabled => with_builder_id("type=provenance".to_string(), builder_id),
        AttestationInput::Disabled => "type=provenance,disabled=true".to_string(),
        AttestationInput::Attrs(attrs) => {
            let attest = format!("type=provenance,{}", attrs);
            if attrs.contains("builder-id=") || attrs.contains("disabled=true") {
                attest
            } else {
                with_builder_id(attest, builder_id)
            }
        }
    }
}

fn with_builder_id(attest: String, builder_id: Option<&str>) -> String {
    match builder_id {
        Some(id) => format!("{},builder-id={}", attest, id),
        None => attest,
    }
}

fn has_attestation_type(attest: &str, kind: &str) -> bool {
    attest.split(',').any(|field| {
        field
            .split_once('=')
            .is_some_and(|(k, v)| k.trim() == "type" && v.trim() == kind)
    })
}
