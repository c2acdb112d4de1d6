use super::*;
use crate::model::SecretSource;
use semver::Version;
use std::path::PathBuf;

const DEFAULT: &str = "https://github.com/octo/app.git#0123abcd";

fn caps(minor: u64) -> Capabilities {
    Capabilities::new(Version::new(0, minor, 0))
}

fn parse_with(raw: RawInputs, capabilities: &Capabilities) -> Result<ParsedInputs> {
    let ctx = ParseContext {
        default_context: DEFAULT.to_string(),
        git_host: "github.com".to_string(),
        capabilities,
    };
    parse_inputs(&raw, &ctx)
}

fn parse(raw: RawInputs) -> Result<ParsedInputs> {
    parse_with(raw, &caps(20))
}

#[test]
fn test_parse_empty_inputs_uses_git_default_context() {
    let parsed = parse(RawInputs::new()).unwrap();
    let inputs = parsed.inputs;

    assert_eq!(
        inputs.context,
        BuildContext::Git {
            url: DEFAULT.to_string()
        }
    );
    assert!(inputs.tags.is_empty());
    assert!(inputs.platforms.is_empty());
    assert!(!inputs.push);
    assert!(!inputs.load);
    assert!(inputs.call.is_none());
    assert!(parsed.warnings.is_empty());
}

#[test]
fn test_parse_context_with_subdir() {
    let raw = RawInputs::new().with("context", "{{defaultContext}}:mysubdir");
    let inputs = parse(raw).unwrap().inputs;

    assert_eq!(inputs.context.as_arg(), format!("{}:mysubdir", DEFAULT));
    assert!(inputs.context.is_git());
}

#[test]
fn test_parse_path_context() {
    let raw = RawInputs::new().with("context", "./app");
    let inputs = parse(raw).unwrap().inputs;

    assert_eq!(
        inputs.context,
        BuildContext::Path {
            path: PathBuf::from("./app")
        }
    );
}

#[test]
fn test_parse_unresolved_context_reference() {
    let raw = RawInputs::new().with("context", "{{nope}}");
    let err = parse(raw).unwrap_err();
    assert!(matches!(err, CoreError::UnresolvedReference { name } if name == "nope"));
}

#[test]
fn test_parse_build_contexts_expand_default_context() {
    let raw = RawInputs::new().with(
        "build-contexts",
        "src={{defaultContext}}:src\nalpine=docker-image://alpine:3.20",
    );
    let inputs = parse(raw).unwrap().inputs;

    assert_eq!(
        inputs.build_contexts,
        vec![
            NamedBuildContext::new("src", format!("{}:src", DEFAULT)),
            NamedBuildContext::new("alpine", "docker-image://alpine:3.20"),
        ]
    );
}

#[test]
fn test_parse_context_can_reference_named_context() {
    let raw = RawInputs::new()
        .with("build-contexts", "app=./services/app")
        .with("context", "{{ app }}");
    let inputs = parse(raw).unwrap().inputs;

    assert_eq!(inputs.context.as_arg(), "./services/app");
    assert!(!inputs.context.is_git());
}

#[test]
fn test_parse_build_contexts_rejects_duplicates() {
    let raw = RawInputs::new().with("build-contexts", "a=./x\na=./y");
    let err = parse(raw).unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput { field, .. } if field == "build-contexts"));
}

#[test]
fn test_parse_build_contexts_rejects_malformed_entry() {
    let raw = RawInputs::new().with("build-contexts", "just-a-name");
    assert!(parse(raw).is_err());
}

#[test]
fn test_parse_booleans() {
    let raw = RawInputs::new()
        .with("push", "true")
        .with("load", "False")
        .with("no-cache", "TRUE")
        .with("pull", "");
    let inputs = parse(raw).unwrap().inputs;

    assert!(inputs.push);
    assert!(!inputs.load);
    assert!(inputs.no_cache);
    assert!(!inputs.pull);
}

#[test]
fn test_parse_invalid_boolean() {
    let raw = RawInputs::new().with("push", "yes");
    let err = parse(raw).unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput { field, .. } if field == "push"));
}

#[test]
fn test_parse_platforms_in_input_order() {
    let raw = RawInputs::new().with("platforms", "linux/amd64,linux/arm64");
    let inputs = parse(raw).unwrap().inputs;
    assert_eq!(inputs.platforms, vec!["linux/amd64", "linux/arm64"]);
}

#[test]
fn test_parse_newline_lists_keep_commas() {
    let raw = RawInputs::new()
        .with("cache-from", "type=registry,ref=user/app:cache\ntype=gha")
        .with("build-args", "A=1,2\nB=3");
    let inputs = parse(raw).unwrap().inputs;

    assert_eq!(
        inputs.cache_from,
        vec!["type=registry,ref=user/app:cache", "type=gha"]
    );
    assert_eq!(inputs.build_args, vec!["A=1,2", "B=3"]);
}

#[test]
fn test_parse_call_check() {
    let raw = RawInputs::new().with("call", "check");
    let inputs = parse_with(raw, &caps(15)).unwrap().inputs;

    let call = inputs.call.unwrap();
    assert_eq!(call.mode, CallMode::Check);
    assert_eq!(call.value, "check");
}

#[test]
fn test_parse_call_with_options() {
    let raw = RawInputs::new().with("call", "check,format=json");
    let inputs = parse(raw).unwrap().inputs;

    assert_eq!(inputs.call_mode(), CallMode::Check);
    assert_eq!(inputs.call.unwrap().value, "check,format=json");
}

#[test]
fn test_parse_call_requires_buildx_0_15() {
    let raw = RawInputs::new().with("call", "check");
    let err = parse_with(raw, &caps(14)).unwrap_err();

    match err {
        CoreError::InvalidInput { field, reason } => {
            assert_eq!(field, "call");
            assert!(reason.contains(">=0.15.0"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_parse_call_unknown_method() {
    let raw = RawInputs::new().with("call", "lint");
    assert!(parse(raw).is_err());
}

#[test]
fn test_parse_shm_size() {
    let ok = RawInputs::new().with("shm-size", "2g");
    assert_eq!(parse(ok).unwrap().inputs.shm_size.as_deref(), Some("2g"));

    let bad = RawInputs::new().with("shm-size", "two gigs");
    assert!(matches!(
        parse(bad).unwrap_err(),
        CoreError::InvalidInput { field, .. } if field == "shm-size"
    ));
}

#[test]
fn test_parse_ulimit() {
    let ok = RawInputs::new().with("ulimit", "nofile=1024:1024\nnproc=-1");
    assert_eq!(parse(ok).unwrap().inputs.ulimits.len(), 2);

    let bad = RawInputs::new().with("ulimit", "nofile");
    assert!(parse(bad).is_err());
}

#[test]
fn test_parse_secrets() {
    let raw = RawInputs::new()
        .with("secrets", "npm=abc123")
        .with("secret-envs", "aws=AWS_TOKEN,gh=GH_TOKEN")
        .with("secret-files", "cert=./certs/ca.pem");
    let inputs = parse(raw).unwrap().inputs;

    assert_eq!(
        inputs.secrets,
        vec![
            Secret::env("aws", "AWS_TOKEN"),
            Secret::env("gh", "GH_TOKEN"),
            Secret::value("npm", "abc123"),
            Secret::file("cert", "./certs/ca.pem"),
        ]
    );
}

#[test]
fn test_parse_quoted_multiline_secret_and_build_arg() {
    let raw = RawInputs::new()
        .with("secrets", "\"MYSECRET=aaaa\nbbbb\ncccc\"")
        .with("build-args", "\"FOO=a,b\"");
    let parsed = parse(raw).unwrap();

    assert!(parsed.warnings.is_empty());
    assert_eq!(
        parsed.inputs.secrets,
        vec![Secret::value("MYSECRET", "aaaa\nbbbb\ncccc")]
    );
    assert_eq!(parsed.inputs.build_args, vec!["FOO=a,b"]);
}

#[test]
fn test_parse_malformed_secret_is_warning() {
    let raw = RawInputs::new().with("secrets", "plainvalue\nok=1");
    let parsed = parse(raw).unwrap();

    assert_eq!(parsed.inputs.secrets, vec![Secret::value("ok", "1")]);
    assert_eq!(parsed.warnings.len(), 1);
    assert!(!parsed.warnings[0].contains("plainvalue"));
}

#[test]
fn test_parse_github_token_added_for_own_repository() {
    let raw = RawInputs::new().with("github-token", "ghs_xxx");
    let inputs = parse(raw).unwrap().inputs;

    assert_eq!(inputs.secrets.len(), 1);
    assert_eq!(inputs.secrets[0].id, "GIT_AUTH_TOKEN.github.com");
    assert_eq!(
        inputs.secrets[0].source,
        SecretSource::Value("ghs_xxx".to_string())
    );
}

#[test]
fn test_parse_github_token_skipped_for_path_context() {
    let raw = RawInputs::new()
        .with("github-token", "ghs_xxx")
        .with("context", ".");
    let inputs = parse(raw).unwrap().inputs;
    assert!(inputs.secrets.is_empty());
}

#[test]
fn test_parse_github_token_skipped_for_other_repository() {
    let raw = RawInputs::new()
        .with("github-token", "ghs_xxx")
        .with("context", "https://github.com/other/repo.git#main");
    let inputs = parse(raw).unwrap().inputs;
    assert!(inputs.secrets.is_empty());
}

#[test]
fn test_parse_github_token_not_duplicated() {
    let raw = RawInputs::new()
        .with("github-token", "ghs_xxx")
        .with("secrets", "GIT_AUTH_TOKEN=mine");
    let inputs = parse(raw).unwrap().inputs;

    assert_eq!(inputs.secrets, vec![Secret::value("GIT_AUTH_TOKEN", "mine")]);
}

#[test]
fn test_parse_attestation_inputs() {
    let raw = RawInputs::new()
        .with("provenance", "mode=max")
        .with("sbom", "false");
    let inputs = parse(raw).unwrap().inputs;

    assert_eq!(
        inputs.provenance,
        Some(AttestationInput::Attrs("mode=max".to_string()))
    );
    assert_eq!(inputs.sbom, Some(AttestationInput::Disabled));
}

#[test]
fn test_parse_sensitive_build_arg_warning() {
    let raw = RawInputs::new().with("build-args", "API_TOKEN=abc\nNODE_VERSION=20");
    let parsed = parse(raw).unwrap();

    assert_eq!(parsed.warnings.len(), 1);
    assert!(parsed.warnings[0].contains("API_TOKEN"));
    assert!(!parsed.warnings[0].contains("abc"));
}
