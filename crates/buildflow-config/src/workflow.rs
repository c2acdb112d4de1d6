//! ワークフローコマンド（`::warning::` など）の出力
//!
//! stdout に1行で出力し、ランナーがアノテーションとして解釈します。

/// `%` と改行をエスケープ
pub fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

pub fn format_command(command: &str, message: &str) -> String {
    format!("::{}::{}", command, escape_data(message))
}

pub fn warning(message: &str) {
    println!("{}", format_command("warning", message));
}

pub fn error(message: &str) {
    println!("{}", format_command("error", message));
}

pub fn debug(message: &str) {
    println!("{}", format_command("debug", message));
}

/// 折りたたみグループの開始
pub fn group(title: &str) {
    println!("{}", format_command("group", title));
}

pub fn end_group() {
    println!("::endgroup::");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_data() {
        assert_eq!(escape_data("50% done\nnext"), "50%25 done%0Anext");
    }

    #[test]
    fn test_format_command() {
        assert_eq!(
            format_command("warning", "Annotations ignored"),
            "::warning::Annotations ignored"
        );
    }
}
