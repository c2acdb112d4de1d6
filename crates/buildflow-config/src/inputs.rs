//! ランナーから渡される入力（`INPUT_<NAME>` 環境変数）の読み込み

use buildflow_core::RawInputs;

const INPUT_PREFIX: &str = "INPUT_";

/// 現在のプロセス環境から入力を読み込む
pub fn read_inputs() -> RawInputs {
    inputs_from_vars(std::env::vars())
}

/// `INPUT_BUILD-ARGS` → `build-args` のように変換して収集
///
/// ランナーは入力名のスペースを `_` に置換し大文字化するので、その逆を行います。
pub fn inputs_from_vars<I>(vars: I) -> RawInputs
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut inputs = RawInputs::new();
    let mut count = 0;

    for (key, value) in vars {
        if let Some(name) = key.strip_prefix(INPUT_PREFIX)
            && !name.is_empty()
        {
            inputs.insert(name.replace('_', " ").to_lowercase(), value);
            count += 1;
        }
    }

    tracing::debug!(input_count = count, "Read action inputs");
    inputs
}
