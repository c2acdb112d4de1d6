//! 入力パーサー
//!
//! 未加工の入力を次の順で処理し、[`BuildInputs`] を生成します。
//!
//! 1. 型変換（スカラー・リスト・真偽値・key=value）
//! 2. テンプレート展開（`context` と `build-contexts` の値）
//! 3. フィールド間の検証

mod list;

pub use list::{parse_bool, parse_scalar, split_key_value, split_list};

use crate::capability::{Capabilities, Feature};
use crate::error::{CoreError, Result};
use crate::model::{
    AttestationInput, BuildContext, BuildInputs, CallMode, CallRequest, NamedBuildContext,
    RawInputs, Secret,
};
use crate::template::{self, DEFAULT_CONTEXT, NamedContexts};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

static SHM_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[bkmgBKMG]?$").expect("valid shm-size pattern"));

static ULIMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]+=-?\d+(:-?\d+)?$").expect("valid ulimit pattern")
});

/// パースに必要な実行環境の情報
#[derive(Debug, Clone)]
pub struct ParseContext<'a> {
    /// `{{defaultContext}}` の展開先（ワークフローの Git コンテキスト）
    pub default_context: String,
    /// Git 認証トークンのシークレットIDに付けるホスト名
    pub git_host: String,
    /// 条件付き検証に使うネゴシエーション済みバージョン
    pub capabilities: &'a Capabilities,
}

/// パース結果（警告は致命的でない診断）
#[derive(Debug, Clone)]
pub struct ParsedInputs {
    pub inputs: BuildInputs,
    pub warnings: Vec<String>,
}

/// 型変換だけを済ませた中間表現
#[derive(Debug, Default)]
struct Coerced {
    context: String,
    add_hosts: Vec<String>,
    allow: Vec<String>,
    annotations: Vec<String>,
    attests: Vec<String>,
    build_args: Vec<String>,
    build_contexts: Vec<NamedBuildContext>,
    builder: Option<String>,
    cache_from: Vec<String>,
    cache_to: Vec<String>,
    call: Option<String>,
    cgroup_parent: Option<String>,
    file: Option<String>,
    labels: Vec<String>,
    load: bool,
    network: Option<String>,
    no_cache: bool,
    no_cache_filters: Vec<String>,
    outputs: Vec<String>,
    platforms: Vec<String>,
    provenance: Option<String>,
    pull: bool,
    push: bool,
    sbom: Option<String>,
    secrets: Vec<String>,
    secret_envs: Vec<String>,
    secret_files: Vec<String>,
    shm_size: Option<String>,
    ssh: Vec<String>,
    tags: Vec<String>,
    target: Option<String>,
    ulimits: Vec<String>,
    github_token: Option<String>,
}

/// 入力をパースして検証
pub fn parse_inputs(raw: &RawInputs, ctx: &ParseContext<'_>) -> Result<ParsedInputs> {
    let mut coerced = coerce(raw)?;
    let named = expand_templates(&mut coerced, ctx)?;
    let parsed = validate(coerced, &named, ctx)?;

    debug!(
        context = %parsed.inputs.context,
        warnings = parsed.warnings.len(),
        "Parsed build inputs"
    );
    Ok(parsed)
}

fn coerce(raw: &RawInputs) -> Result<Coerced> {
    let list = |name: &str| split_list(name, raw.get(name), true);
    let lines = |name: &str| split_list(name, raw.get(name), false);
    let scalar = |name: &str| parse_scalar(raw.get(name));

    let mut build_contexts = Vec::new();
    for entry in lines("build-contexts")? {
        let (name, value) = split_key_value(&entry).ok_or_else(|| {
            CoreError::invalid_input(
                "build-contexts",
                format!("'{}' must be in name=value form", entry),
            )
        })?;
        build_contexts.push(NamedBuildContext::new(name, value));
    }

    Ok(Coerced {
        context: scalar("context").unwrap_or_else(|| format!("{{{{{}}}}}", DEFAULT_CONTEXT)),
        add_hosts: list("add-hosts")?,
        allow: list("allow")?,
        annotations: lines("annotations")?,
        attests: lines("attests")?,
        build_args: lines("build-args")?,
        build_contexts,
        builder: scalar("builder"),
        cache_from: lines("cache-from")?,
        cache_to: lines("cache-to")?,
        call: scalar("call"),
        cgroup_parent: scalar("cgroup-parent"),
        file: scalar("file"),
        labels: lines("labels")?,
        load: parse_bool("load", raw.get("load"), false)?,
        network: scalar("network"),
        no_cache: parse_bool("no-cache", raw.get("no-cache"), false)?,
        no_cache_filters: list("no-cache-filters")?,
        outputs: lines("outputs")?,
        platforms: list("platforms")?,
        provenance: scalar("provenance"),
        pull: parse_bool("pull", raw.get("pull"), false)?,
        push: parse_bool("push", raw.get("push"), false)?,
        sbom: scalar("sbom"),
        secrets: lines("secrets")?,
        secret_envs: list("secret-envs")?,
        secret_files: lines("secret-files")?,
        shm_size: scalar("shm-size"),
        ssh: lines("ssh")?,
        tags: list("tags")?,
        target: scalar("target"),
        ulimits: lines("ulimit")?,
        github_token: scalar("github-token"),
    })
}

/// テンプレート対象のフィールドを展開し、解決テーブルを返す
///
/// `build-contexts` の値は `defaultContext` のみで展開し、
/// その後に名前として登録してから `context` を展開します。
fn expand_templates(coerced: &mut Coerced, ctx: &ParseContext<'_>) -> Result<NamedContexts> {
    let base = NamedContexts::new(ctx.default_context.clone());
    let mut named = base.clone();
    let mut seen = HashSet::new();

    for entry in &mut coerced.build_contexts {
        if !seen.insert(entry.name.clone()) || entry.name == DEFAULT_CONTEXT {
            return Err(CoreError::invalid_input(
                "build-contexts",
                format!("duplicate build context name '{}'", entry.name),
            ));
        }
        entry.value = template::expand(&entry.value, &base)?;
        named.insert(entry.name.clone(), entry.value.clone());
    }

    if template::has_placeholder(&coerced.context) {
        coerced.context = template::expand(&coerced.context, &named)?;
        debug!(context = %coerced.context, "Expanded build context");
    }
    Ok(named)
}

fn validate(c: Coerced, named: &NamedContexts, ctx: &ParseContext<'_>) -> Result<ParsedInputs> {
    let mut warnings = Vec::new();

    let call = c
        .call
        .as_deref()
        .map(|value| parse_call(value, ctx.capabilities))
        .transpose()?;

    if let Some(size) = &c.shm_size
        && !SHM_SIZE.is_match(size)
    {
        return Err(CoreError::invalid_input(
            "shm-size",
            format!("'{}' is not a size (e.g. 2g, 512m)", size),
        ));
    }

    for ulimit in &c.ulimits {
        if !ULIMIT.is_match(ulimit) {
            return Err(CoreError::invalid_input(
                "ulimit",
                format!("'{}' must be in type=soft[:hard] form", ulimit),
            ));
        }
    }

    for arg in &c.build_args {
        if let Some(warning) = sensitive_build_arg(arg) {
            warnings.push(warning);
        }
    }

    let context = BuildContext::classify(&c.context);

    let mut secrets = Vec::new();
    collect_secrets(
        "secret-envs",
        &c.secret_envs,
        |id: &str, name: &str| Secret::env(id, name),
        &mut secrets,
        &mut warnings,
    );
    collect_secrets(
        "secrets",
        &c.secrets,
        |id: &str, value: &str| Secret::value(id, value),
        &mut secrets,
        &mut warnings,
    );
    collect_secrets(
        "secret-files",
        &c.secret_files,
        |id: &str, path: &str| Secret::file(id, path),
        &mut secrets,
        &mut warnings,
    );

    if let Some(token) = &c.github_token {
        let is_own_repo = named
            .default_context()
            .is_some_and(|default| context.is_git() && context.as_arg().starts_with(default));
        let has_token_secret = secrets.iter().any(Secret::is_git_auth_token);

        if is_own_repo && !has_token_secret {
            debug!(host = %ctx.git_host, "Adding git auth token secret");
            secrets.push(Secret::value(
                format!("GIT_AUTH_TOKEN.{}", ctx.git_host),
                token.clone(),
            ));
        }
    }

    let inputs = BuildInputs {
        context,
        add_hosts: c.add_hosts,
        allow: c.allow,
        annotations: c.annotations,
        attests: c.attests,
        build_args: c.build_args,
        build_contexts: c.build_contexts,
        builder: c.builder,
        cache_from: c.cache_from,
        cache_to: c.cache_to,
        call,
        cgroup_parent: c.cgroup_parent,
        file: c.file,
        labels: c.labels,
        load: c.load,
        network: c.network,
        no_cache: c.no_cache,
        no_cache_filters: c.no_cache_filters,
        outputs: c.outputs,
        platforms: c.platforms,
        provenance: c.provenance.as_deref().map(AttestationInput::parse),
        pull: c.pull,
        push: c.push,
        sbom: c.sbom.as_deref().map(AttestationInput::parse),
        secrets,
        shm_size: c.shm_size,
        ssh: c.ssh,
        tags: c.tags,
        target: c.target,
        ulimits: c.ulimits,
    };

    Ok(ParsedInputs { inputs, warnings })
}

fn parse_call(value: &str, capabilities: &Capabilities) -> Result<CallRequest> {
    let mode_str = value.split(',').next().unwrap_or_default();
    let mode = CallMode::parse(mode_str).ok_or_else(|| {
        CoreError::invalid_input(
            "call",
            format!(
                "unknown call method '{}' (expected build, check, outline or targets)",
                mode_str.trim()
            ),
        )
    })?;

    if !capabilities.satisfies(Feature::Call) {
        return Err(CoreError::invalid_input(
            "call",
            format!(
                "Buildx {} is required to use the call input (found {})",
                Feature::Call.requirement(),
                capabilities.buildx_version()
            ),
        ));
    }

    Ok(CallRequest {
        mode,
        value: value.to_string(),
    })
}

/// `id=value` 形式のシークレットを収集。形式不正は警告にして読み飛ばす
fn collect_secrets<F>(
    field: &str,
    entries: &[String],
    make: F,
    secrets: &mut Vec<Secret>,
    warnings: &mut Vec<String>,
) where
    F: Fn(&str, &str) -> Secret,
{
    for (i, entry) in entries.iter().enumerate() {
        match split_key_value(entry) {
            Some((id, value)) => secrets.push(make(id, value)),
            // 値そのものが秘密の可能性があるので内容は出さない
            None => warnings.push(format!(
                "{}: entry #{} is not in id=value form and is ignored",
                field,
                i + 1
            )),
        }
    }
}

/// ビルド引数の検証（機密情報の警告）
fn sensitive_build_arg(arg: &str) -> Option<String> {
    const SENSITIVE_PATTERNS: &[&str] = &["password", "token", "secret", "api_key", "private_key"];

    let key = arg.split('=').next().unwrap_or_default().to_lowercase();
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key.contains(pattern))
        .then(|| {
            format!(
                "build-args: '{}' looks sensitive; build args are recorded in the image history, use secrets instead",
                arg.split('=').next().unwrap_or_default()
            )
        })
}

#[cfg(test)]
mod tests;
