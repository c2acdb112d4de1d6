//! ワークフローから受け取った未加工の入力

use std::collections::BTreeMap;

/// 入力名 → 生の文字列値
///
/// リストや真偽値もこの時点では文字列のまま保持し、
/// 型変換は [`crate::parser`] で行います。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInputs {
    values: BTreeMap<String, String>,
}

impl RawInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// 入力名は小文字に正規化して保持
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.values
            .insert(name.as_ref().to_lowercase(), value.into());
    }

    pub fn with(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// 未指定の入力は空文字列
    pub fn get(&self, name: &str) -> &str {
        self.values
            .get(&name.to_lowercase())
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn is_set(&self, name: &str) -> bool {
        !self.get(name).trim().is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for RawInputs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut inputs = RawInputs::new();
        for (k, v) in iter {
            inputs.insert(k, v);
        }
        inputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_is_empty() {
        let inputs = RawInputs::new();
        assert_eq!(inputs.get("tags"), "");
        assert!(!inputs.is_set("tags"));
    }

    #[test]
    fn test_names_are_case_insensitive() {
        let inputs: RawInputs = [("BUILD-ARGS", "A=1")].into_iter().collect();
        assert_eq!(inputs.get("build-args"), "A=1");
        assert!(inputs.is_set("Build-Args"));
    }
}
