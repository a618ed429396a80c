//! 集中度指標とサイクル推移
//!
//! Gini係数とHerfindahl指数はどちらも未定義ケース（空列・合計0）で
//! NaN を返す。JSONには NaN を書けないので、出力用の
//! [`MiscInsights`] では None（null）に落とす。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::RawRecord;

/// Gini係数。空列は NaN。負値があれば最小値を引いて非負化し、
/// ゼロ割り防止に 1e-6 を全要素へ足してから計算する
pub fn gini(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut arr: Vec<f64> = values.to_vec();
    let min = arr.iter().copied().fold(f64::INFINITY, f64::min);
    if min < 0.0 {
        for v in &mut arr {
            *v -= min;
        }
    }
    for v in &mut arr {
        *v += 1e-6;
    }
    arr.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = arr.len() as f64;
    let total: f64 = arr.iter().sum();
    let weighted: f64 = arr
        .iter()
        .enumerate()
        .map(|(i, v)| (2.0 * (i as f64 + 1.0) - n - 1.0) * v)
        .sum();
    weighted / (n * total)
}

/// 機関別認定数のHerfindahl指数。認定の合計が0なら NaN。
/// グループ化は生の機関名で行う（表記揺れは潰さない）
pub fn herfindahl_institutions(records: &[RawRecord]) -> f64 {
    let mut by_inst: BTreeMap<&str, u64> = BTreeMap::new();
    for rec in records {
        *by_inst.entry(rec.institution.as_str()).or_default() += u64::from(rec.recognized);
    }
    let total: u64 = by_inst.values().sum();
    if total == 0 {
        return f64::NAN;
    }
    let sq_sum: f64 = by_inst.values().map(|&v| (v as f64) * (v as f64)).sum();
    sq_sum / ((total as f64) * (total as f64))
}

/// サイクルごとの総担当数・総認定数。出力の鍵名は歴史的事情で
/// `iteration`（フロントエンドがこの名前で読む）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleTotals {
    #[serde(rename = "iteration")]
    pub cycle: String,
    pub reviewed: u64,
    pub recognized: u64,
}

/// サイクル昇順の推移行を作る
pub fn cycle_totals(records: &[RawRecord]) -> Vec<CycleTotals> {
    let mut by_cycle: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for rec in records {
        let entry = by_cycle.entry(rec.cycle.clone()).or_default();
        entry.0 += u64::from(rec.reviewed);
        entry.1 += u64::from(rec.recognized);
    }
    by_cycle
        .into_iter()
        .map(|(cycle, (reviewed, recognized))| CycleTotals {
            cycle,
            reviewed,
            recognized,
        })
        .collect()
}

/// `misc_insights.json` の中身。未定義の指標は null
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiscInsights {
    pub gini_recognized: Option<f64>,
    pub herfindahl_institutions: Option<f64>,
}

/// 全レコードから集中度指標をまとめる
pub fn misc_insights(records: &[RawRecord]) -> MiscInsights {
    let recognized: Vec<f64> = records.iter().map(|r| f64::from(r.recognized)).collect();
    MiscInsights {
        gini_recognized: nan_to_none(gini(&recognized)),
        herfindahl_institutions: nan_to_none(herfindahl_institutions(records)),
    }
}

fn nan_to_none(x: f64) -> Option<f64> {
    if x.is_nan() { None } else { Some(x) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, inst: &str, reviewed: u32, recognized: u32, cycle: &str) -> RawRecord {
        RawRecord {
            name: name.to_string(),
            institution: inst.to_string(),
            reviewed,
            recognized,
            percentage: 0.0,
            cycle: cycle.to_string(),
        }
    }

    #[test]
    fn gini_of_empty_input_is_nan() {
        assert!(gini(&[]).is_nan());
    }

    #[test]
    fn gini_of_uniform_values_is_near_zero() {
        let g = gini(&[5.0, 5.0, 5.0, 5.0]);
        assert!(g.abs() < 1e-9, "gini was {g}");
    }

    #[test]
    fn gini_of_concentrated_values_approaches_max() {
        // n=4 の理論上の最大は (n-1)/n = 0.75
        let g = gini(&[0.0, 0.0, 0.0, 100.0]);
        assert!((g - 0.75).abs() < 1e-5, "gini was {g}");
    }

    #[test]
    fn gini_shifts_negative_input_before_computing() {
        let g = gini(&[-1.0, 1.0]);
        assert!((g - 0.5).abs() < 1e-5, "gini was {g}");
    }

    #[test]
    fn gini_of_single_value_is_zero() {
        let g = gini(&[42.0]);
        assert!(g.abs() < 1e-9, "gini was {g}");
    }

    #[test]
    fn herfindahl_matches_hand_computed_value() {
        // A: 3, B: 1 -> (9 + 1) / 16
        let records = vec![
            rec("x", "A", 1, 1, "c1"),
            rec("y", "A", 1, 2, "c1"),
            rec("z", "B", 1, 1, "c1"),
        ];
        let h = herfindahl_institutions(&records);
        assert!((h - 0.625).abs() < 1e-12, "herfindahl was {h}");
    }

    #[test]
    fn herfindahl_with_no_recognitions_is_nan() {
        let records = vec![rec("x", "A", 3, 0, "c1")];
        assert!(herfindahl_institutions(&records).is_nan());
    }

    #[test]
    fn single_institution_has_maximal_concentration() {
        let records = vec![rec("x", "A", 2, 1, "c1"), rec("y", "A", 2, 2, "c1")];
        let h = herfindahl_institutions(&records);
        assert!((h - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cycle_totals_sum_per_cycle_in_order() {
        let records = vec![
            rec("x", "A", 3, 1, "2023_03"),
            rec("y", "B", 2, 2, "2023_01"),
            rec("z", "C", 5, 0, "2023_03"),
        ];
        let totals = cycle_totals(&records);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].cycle, "2023_01");
        assert_eq!(totals[0].reviewed, 2);
        assert_eq!(totals[1].cycle, "2023_03");
        assert_eq!(totals[1].reviewed, 8);
        assert_eq!(totals[1].recognized, 1);
    }

    #[test]
    fn cycle_totals_serialize_with_iteration_key() {
        let totals = cycle_totals(&[rec("x", "A", 1, 1, "2023_01")]);
        let json = serde_json::to_string(&totals).unwrap();
        assert!(json.contains(r#""iteration":"2023_01""#));
        assert!(!json.contains(r#""cycle""#));
    }

    #[test]
    fn undefined_insights_become_null() {
        let records = vec![rec("x", "A", 3, 0, "c1")];
        let insights = misc_insights(&records);
        // 全要素0でも gini 自体は定義される（一様分布）
        assert!(insights.gini_recognized.is_some());
        assert!(insights.herfindahl_institutions.is_none());
        let json = serde_json::to_string(&insights).unwrap();
        assert!(json.contains(r#""herfindahl_institutions":null"#));
    }
}
