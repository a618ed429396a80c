//! サイト向けメトリクス行の生成
//!
//! フラットなランキング行（個人・機関）とサイクル別スナップショットを
//! 作る。ここでは機関は生の機関名文字列でグループ化する。表記揺れの
//! 統合は institution モジュール側の仕事で、ここでは行わない。

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::identity::Resolver;
use crate::rank;
use crate::record::RawRecord;

// ---------------------------------------------------------------------------
// 個人ランキング行
// ---------------------------------------------------------------------------

/// 個人ランキングの1行。recognition_rate はタイブレークと同じ
/// クリップ付きの率（reviewed 0 は 1 に切り上げ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRow {
    pub name: String,
    pub institution: String,
    pub recognized: u32,
    pub reviewed: u32,
    pub percentage: f64,
    pub recognition_rate: f64,
}

/// レコードを正準ID単位に畳み込み、個人ランキングの行を作る。
/// 未解決のレコードは含めない。percentage は出現行の単純平均
pub fn consolidate_people(records: &[RawRecord], resolver: &Resolver) -> Vec<PersonRow> {
    struct Acc {
        name: String,
        institution: String,
        recognized: u32,
        reviewed: u32,
        pct_sum: f64,
        rows: u32,
    }
    let mut by_id: BTreeMap<String, Acc> = BTreeMap::new();
    for rec in records {
        let Some((id, _)) = resolver.resolve(&rec.name, &rec.institution) else {
            continue;
        };
        let acc = by_id.entry(id.to_string()).or_insert_with(|| Acc {
            name: rec.name.clone(),
            institution: rec.institution.clone(),
            recognized: 0,
            reviewed: 0,
            pct_sum: 0.0,
            rows: 0,
        });
        acc.name = rec.name.clone();
        acc.institution = rec.institution.clone();
        acc.recognized += rec.recognized;
        acc.reviewed += rec.reviewed;
        acc.pct_sum += rec.percentage;
        acc.rows += 1;
    }
    by_id
        .into_values()
        .map(|acc| PersonRow {
            recognition_rate: rank::clipped_rate(acc.recognized, acc.reviewed),
            percentage: acc.pct_sum / f64::from(acc.rows),
            name: acc.name,
            institution: acc.institution,
            recognized: acc.recognized,
            reviewed: acc.reviewed,
        })
        .collect()
}

/// 絶対数ランキング: 認定数 → 認定率 → 担当数の降順、名前昇順
pub fn cmp_people_absolute(a: &PersonRow, b: &PersonRow) -> Ordering {
    rank::desc_u32(a.recognized, b.recognized)
        .then_with(|| rank::desc_f64(a.recognition_rate, b.recognition_rate))
        .then_with(|| rank::desc_u32(a.reviewed, b.reviewed))
        .then_with(|| rank::name_asc(&a.name, &b.name))
}

/// 率ランキング: percentage → 認定数 → 担当数の降順、名前昇順
pub fn cmp_people_percentage(a: &PersonRow, b: &PersonRow) -> Ordering {
    rank::desc_f64(a.percentage, b.percentage)
        .then_with(|| rank::desc_u32(a.recognized, b.recognized))
        .then_with(|| rank::desc_u32(a.reviewed, b.reviewed))
        .then_with(|| rank::name_asc(&a.name, &b.name))
}

// ---------------------------------------------------------------------------
// 機関（生の機関名単位）の集計
// ---------------------------------------------------------------------------

/// 生の機関名1つ分の集計。機関DBのグループ化の素材にもなる
#[derive(Debug, Clone)]
pub struct InstitutionAgg {
    pub institution: String,
    pub recognized: u32,
    pub reviewed: u32,
    /// 異なり名数（同名レビュアーは1と数える）
    pub reviewer_count: u32,
    /// reviewed を重みとした percentage の加重平均。重み合計0なら0
    pub weighted_percentage: f64,
}

/// レコードを生の機関名でグループ化して集計する。機関名の昇順
pub fn aggregate_institutions(records: &[RawRecord]) -> Vec<InstitutionAgg> {
    struct Acc {
        recognized: u32,
        reviewed: u32,
        names: BTreeSet<String>,
        pct_weighted: f64,
    }
    let mut by_inst: BTreeMap<String, Acc> = BTreeMap::new();
    for rec in records {
        let acc = by_inst
            .entry(rec.institution.clone())
            .or_insert_with(|| Acc {
                recognized: 0,
                reviewed: 0,
                names: BTreeSet::new(),
                pct_weighted: 0.0,
            });
        acc.recognized += rec.recognized;
        acc.reviewed += rec.reviewed;
        acc.names.insert(rec.name.clone());
        acc.pct_weighted += rec.percentage * f64::from(rec.reviewed);
    }
    by_inst
        .into_iter()
        .map(|(institution, acc)| InstitutionAgg {
            institution,
            recognized: acc.recognized,
            reviewed: acc.reviewed,
            reviewer_count: acc.names.len() as u32,
            weighted_percentage: if acc.reviewed > 0 {
                acc.pct_weighted / f64::from(acc.reviewed)
            } else {
                0.0
            },
        })
        .collect()
}

/// 機関の絶対数ランキング行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstitutionAbsRow {
    pub institution: String,
    pub recognized: u32,
    pub reviewed: u32,
    pub reviewer_count: u32,
    pub recognition_rate: f64,
}

/// 機関の率ランキング行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstitutionPctRow {
    pub institution: String,
    pub percentage: f64,
    pub recognized: u32,
    pub reviewed: u32,
}

/// 絶対数ランキング（認定数 → クリップ率 → 担当数の降順、機関名昇順）
pub fn institution_abs_rows(aggs: &[InstitutionAgg]) -> Vec<InstitutionAbsRow> {
    let mut rows: Vec<InstitutionAbsRow> = aggs
        .iter()
        .map(|a| InstitutionAbsRow {
            institution: a.institution.clone(),
            recognized: a.recognized,
            reviewed: a.reviewed,
            reviewer_count: a.reviewer_count,
            recognition_rate: rank::clipped_rate(a.recognized, a.reviewed),
        })
        .collect();
    rows.sort_by(|a, b| {
        rank::desc_u32(a.recognized, b.recognized)
            .then_with(|| rank::desc_f64(a.recognition_rate, b.recognition_rate))
            .then_with(|| rank::desc_u32(a.reviewed, b.reviewed))
            .then_with(|| rank::name_asc(&a.institution, &b.institution))
    });
    rows
}

/// 加重率ランキング（加重平均率 → 認定数 → 担当数の降順、機関名昇順）
pub fn institution_pct_rows(aggs: &[InstitutionAgg]) -> Vec<InstitutionPctRow> {
    let mut rows: Vec<InstitutionPctRow> = aggs
        .iter()
        .map(|a| InstitutionPctRow {
            institution: a.institution.clone(),
            percentage: a.weighted_percentage,
            recognized: a.recognized,
            reviewed: a.reviewed,
        })
        .collect();
    rows.sort_by(|a, b| {
        rank::desc_f64(a.percentage, b.percentage)
            .then_with(|| rank::desc_u32(a.recognized, b.recognized))
            .then_with(|| rank::desc_u32(a.reviewed, b.reviewed))
            .then_with(|| rank::name_asc(&a.institution, &b.institution))
    });
    rows
}

// ---------------------------------------------------------------------------
// サイクル別スナップショット（個人）
// ---------------------------------------------------------------------------

/// サイクル別スナップショットの1行。統合前の生の行をそのまま使う
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReviewerRow {
    pub name: String,
    pub institution: String,
    pub reviewed: u32,
    pub recognized: u32,
    pub percentage: f64,
}

/// 出現するサイクル名の集合（昇順）
pub fn cycle_names(records: &[RawRecord]) -> BTreeSet<String> {
    records.iter().map(|r| r.cycle.clone()).collect()
}

/// 指定サイクルの生レコードをランキング順に並べた行。順位の列は
/// 持たせない（並び順が順位）
pub fn cycle_reviewer_rows(records: &[RawRecord], cycle: &str) -> Vec<CycleReviewerRow> {
    let mut rows: Vec<CycleReviewerRow> = records
        .iter()
        .filter(|r| r.cycle == cycle)
        .map(|r| CycleReviewerRow {
            name: r.name.clone(),
            institution: r.institution.clone(),
            reviewed: r.reviewed,
            recognized: r.recognized,
            percentage: r.percentage,
        })
        .collect();
    rows.sort_by(|a, b| {
        rank::desc_u32(a.recognized, b.recognized)
            .then_with(|| rank::desc_f64(snapshot_tie_rate(a), snapshot_tie_rate(b)))
            .then_with(|| rank::desc_u32(a.reviewed, b.reviewed))
            .then_with(|| rank::name_asc(&a.name, &b.name))
    });
    rows
}

/// スナップショットのタイブレーク率。percentage 由来で、
/// reviewed 0 のときは 0
fn snapshot_tie_rate(row: &CycleReviewerRow) -> f64 {
    if row.reviewed > 0 {
        row.percentage / 100.0
    } else {
        0.0
    }
}
