//! 入力値の型変換ヘルパー

use crate::error::{CoreError, Result};

/// 入力のリストを CSV として分割
///
/// - ダブルクォートで囲んだ値はカンマや改行を含められる
/// - `#` で始まる行はコメント
/// - `split_comma` が false の場合、1行のフィールドを `,` で連結し直して1要素にする
/// - 各要素は前後の空白を除去し、空要素は捨てる
pub fn split_list(field: &str, raw: &str, split_comma: bool) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(raw.as_bytes());

    let mut items = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|e| CoreError::invalid_input(field, format!("malformed list: {}", e)))?;
        if split_comma {
            for value in record.iter() {
                push_trimmed(&mut items, value);
            }
        } else {
            let joined = record.iter().collect::<Vec<_>>().join(",");
            push_trimmed(&mut items, &joined);
        }
    }

    Ok(items)
}

fn push_trimmed(items: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        items.push(value.to_string());
    }
}

/// 真偽値入力をパース（空文字列はデフォルト値）
///
/// YAML 1.2 Core Schema と同じく `true | True | TRUE | false | False | FALSE` のみ受け付けます。
pub fn parse_bool(field: &str, raw: &str, default: bool) -> Result<bool> {
    match raw.trim() {
        "" => Ok(default),
        "true" | "True" | "TRUE" => Ok(true),
        "false" | "False" | "FALSE" => Ok(false),
        other => Err(CoreError::invalid_input(
            field,
            format!(
                "'{}' is not a boolean (expected one of: true | True | TRUE | false | False | FALSE)",
                other
            ),
        )),
    }
}

/// スカラー入力（空なら None）
pub fn parse_scalar(raw: &str) -> Option<String> {
    let value = raw.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// `key=value` を最初の `=` で分割（キー・値とも空は不可）
pub fn split_key_value(entry: &str) -> Option<(&str, &str)> {
    let (key, value) = entry.split_once('=')?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}
