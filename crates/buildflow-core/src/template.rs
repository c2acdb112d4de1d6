//! ビルドコンテキスト参照のテンプレート展開
//!
//! `context` や `build-contexts` の値に含まれる `{{ name }}` を、
//! 名前付きコンテキストの値で置換します。`defaultContext` は
//! 実行中ワークフローのGitコンテキストを指す予約名です。

use crate::error::{CoreError, Result};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// ワークフロー自身のGitコンテキストを指す予約名
pub const DEFAULT_CONTEXT: &str = "defaultContext";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*\}\}").expect("valid placeholder pattern")
});

/// 名前付きコンテキストの解決テーブル
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedContexts {
    entries: BTreeMap<String, String>,
}

impl NamedContexts {
    /// `defaultContext` だけを持つテーブルを作成
    pub fn new(default_context: impl Into<String>) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(DEFAULT_CONTEXT.to_string(), default_context.into());
        Self { entries }
    }

    /// 名前を登録する。既に同じ名前があれば false を返し、上書きしない
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return false;
        }
        self.entries.insert(name, value.into());
        true
    }

    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn default_context(&self) -> Option<&str> {
        self.resolve(DEFAULT_CONTEXT)
    }
}

/// 文字列内のプレースホルダーを全て展開
///
/// プレースホルダー以外の部分（`:subdir` などのサフィックス）はそのまま残ります。
/// 解決できない名前が1つでもあれば `UnresolvedReference` を返します。
pub fn expand(template: &str, contexts: &NamedContexts) -> Result<String> {
    let mut missing: Option<String> = None;

    let expanded = PLACEHOLDER.replace_all(template, |caps: &Captures| {
        let name = &caps[1];
        match contexts.resolve(name) {
            Some(value) => value.to_string(),
            None => {
                if missing.is_none() {
                    missing = Some(name.to_string());
                }
                caps[0].to_string()
            }
        }
    });

    if let Some(name) = missing {
        return Err(CoreError::UnresolvedReference { name });
    }

    Ok(expanded.into_owned())
}

/// プレースホルダーを含むかどうか
pub fn has_placeholder(value: &str) -> bool {
    PLACEHOLDER.is_match(value)
}
