//! 多段キーによる決定的ソートの部品
//!
//! ランキングはすべて「主要キー降順、最後に名前の昇順」で全順序に
//! なるよう組み立てる。同点の並びが実行ごとに変わらないことが
//! 出力アーティファクトの再現性の前提になる。

use std::cmp::Ordering;

/// u32 の降順比較
pub fn desc_u32(a: u32, b: u32) -> Ordering {
    b.cmp(&a)
}

/// f64 の降順比較（NaN同士・NaN対数値は等値扱い）
pub fn desc_f64(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// 名前の最終タイブレーク。大文字小文字を無視した昇順
pub fn name_asc(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// 表示用の認定率。reviewed が 0 のときは 0 を返す
pub fn display_rate(recognized: u32, reviewed: u32) -> f64 {
    if reviewed > 0 {
        f64::from(recognized) / f64::from(reviewed)
    } else {
        0.0
    }
}

/// タイブレーク用の認定率。分母0は1に切り上げて除算する
pub fn clipped_rate(recognized: u32, reviewed: u32) -> f64 {
    f64::from(recognized) / f64::from(reviewed.max(1))
}
