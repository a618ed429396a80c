//! 生レコードの型と正規化
//!
//! 入力JSONは手作業由来の揺れがあり、数値フィールドが文字列で
//! 入っていることがある。ここで型を確定させ、以降のモジュールは
//! 正規化済みの [`RawRecord`] だけを扱う。

use serde::Deserialize;

use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// 正規化済みレコード
// ---------------------------------------------------------------------------

/// 1サイクル分のファイルに含まれる1行（正規化済み）
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub name: String,
    pub institution: String,
    pub reviewed: u32,
    pub recognized: u32,
    pub percentage: f64,
    /// レコードが属するサイクル（ファイル名stem由来、例: `2023_01`）
    pub cycle: String,
}

// ---------------------------------------------------------------------------
// 入力JSONのデシリアライズ型
// ---------------------------------------------------------------------------

/// 入力JSONの1行。数値フィールドは数値・文字列の両方を受ける
#[derive(Debug, Deserialize)]
pub struct RecordDe {
    name: Option<String>,
    institution: Option<String>,
    reviewed: Option<Count>,
    recognized: Option<Count>,
    percentage: Option<Percent>,
}

/// 整数カウント（`3` / `"3"` の両対応）
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Count {
    Num(u64),
    Text(String),
}

impl Count {
    fn to_u32(&self, field: &'static str, file: &str) -> Result<u32> {
        match self {
            Count::Num(n) => u32::try_from(*n).map_err(|_| DataError::InvalidField {
                field,
                value: n.to_string(),
                file: file.to_string(),
            }),
            Count::Text(s) => s.trim().parse::<u32>().map_err(|_| DataError::InvalidField {
                field,
                value: s.clone(),
                file: file.to_string(),
            }),
        }
    }
}

/// 百分率（`33.5` / `"33.5"` の両対応）
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Percent {
    Num(f64),
    Text(String),
}

impl Percent {
    fn to_f64(&self, field: &'static str, file: &str) -> Result<f64> {
        let x = match self {
            Percent::Num(x) => *x,
            Percent::Text(s) => s.trim().parse::<f64>().map_err(|_| DataError::InvalidField {
                field,
                value: s.clone(),
                file: file.to_string(),
            })?,
        };
        // 文字列経由では "NaN" / "inf" もパースに成功するため、
        // 非有限値はここで不正として弾く
        if !x.is_finite() {
            return Err(DataError::InvalidField {
                field,
                value: x.to_string(),
                file: file.to_string(),
            });
        }
        Ok(x)
    }
}

// ---------------------------------------------------------------------------
// 正規化
// ---------------------------------------------------------------------------

impl RecordDe {
    /// フィールドの存在と型を検証し、正規化済みレコードへ変換する。
    ///
    /// `recognized > reviewed` は上流データの既知の揺れなので、
    /// 警告を出した上でそのまま通す。
    pub fn validate(self, cycle: &str, file: &str) -> Result<RawRecord> {
        let missing = |field: &'static str| DataError::MissingField {
            field,
            file: file.to_string(),
        };
        let name = self.name.ok_or_else(|| missing("name"))?;
        let institution = self.institution.ok_or_else(|| missing("institution"))?;
        let reviewed = self
            .reviewed
            .ok_or_else(|| missing("reviewed"))?
            .to_u32("reviewed", file)?;
        let recognized = self
            .recognized
            .ok_or_else(|| missing("recognized"))?
            .to_u32("recognized", file)?;
        let percentage = self
            .percentage
            .ok_or_else(|| missing("percentage"))?
            .to_f64("percentage", file)?;

        if recognized > reviewed {
            log::warn!(
                "{file}: recognized ({recognized}) exceeds reviewed ({reviewed}) for {name}"
            );
        }

        Ok(RawRecord {
            name,
            institution,
            reviewed,
            recognized,
            percentage,
            cycle: cycle.to_string(),
        })
    }
}
