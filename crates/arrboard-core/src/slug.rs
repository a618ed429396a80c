//! 機関名のURL-safeな識別子への変換

use std::sync::LazyLock;

use regex::Regex;

static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("invalid NON_ALNUM_RE pattern"));

/// 機関名をURL-safeなIDへ変換する。
///
/// 小文字化した上でASCII英数字以外の連続を1つの `-` に潰し、
/// 先頭と末尾の `-` を除去する。表記揺れ（大文字小文字・句読点・
/// 空白の違い）だけの機関名は同じIDに落ちる。
pub fn institution_slug(name: &str) -> String {
    let lowered = name.to_lowercase();
    let hyphened = NON_ALNUM_RE.replace_all(&lowered, "-");
    hyphened.trim_matches('-').to_string()
}
