//! 機関実体の統合とバッジ付与
//!
//! 生の機関名集計（metrics モジュール）を slug で束ね、表記揺れを
//! 1実体に統合する。実体はサイクル別の内訳と所属レビュアーを持つ。
//! メンバー判定は「slugが同じ」こと。レビュアーDB側の表示機関も
//! 生レコード由来なので、この判定で過不足なく拾える。

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::badge::{Badge, BadgeScope, BadgeSubject, badge_for};
use crate::metrics::InstitutionAgg;
use crate::rank;
use crate::record::RawRecord;
use crate::reviewer::Reviewer;
use crate::slug::institution_slug;

// ---------------------------------------------------------------------------
// 実体の型
// ---------------------------------------------------------------------------

/// サイクル内訳に載せるレビュアー1行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReviewer {
    pub name: String,
    pub recognized: u32,
    pub reviewed: u32,
    pub percentage: f64,
}

/// 機関の1サイクル分の内訳。活動のあったサイクルしか作らない
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstitutionCycle {
    pub recognized: u32,
    pub reviewed: u32,
    /// そのサイクルの所属レコード数（行数。名寄せはしない）
    pub reviewer_count: u32,
    pub reviewers: Vec<CycleReviewer>,
    pub recognition_rate: f64,
}

/// 統合済み機関。フィールド順は出力JSONの鍵順そのまま
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Institution {
    /// 代表名。グループ内で認定数が最大の表記
    pub name: String,
    pub url_safe_id: String,
    pub total_recognized: u32,
    pub total_reviewed: u32,
    /// 表記ごとの異なり名数の和（表記をまたぐ同名は重複して数える）
    pub total_reviewers: u32,
    pub recognition_rate: f64,
    pub top_reviewers: Vec<Reviewer>,
    pub cycles: BTreeMap<String, InstitutionCycle>,
    pub achievements: Vec<Badge>,
    pub name_variations: Vec<String>,
}

// ---------------------------------------------------------------------------
// 統合
// ---------------------------------------------------------------------------

/// 生の機関名集計を slug でグループ化し、機関DBを作る。キーは slug
pub fn build_institution_database(
    records: &[RawRecord],
    aggs: &[InstitutionAgg],
    reviewer_db: &BTreeMap<String, Reviewer>,
) -> BTreeMap<String, Institution> {
    // slug → そのグループのサイクル別内訳（1パスで集める）
    struct CycleAcc {
        recognized: u32,
        reviewed: u32,
        count: u32,
        reviewers: Vec<CycleReviewer>,
    }
    let mut cycle_accs: BTreeMap<String, BTreeMap<String, CycleAcc>> = BTreeMap::new();
    for rec in records {
        let acc = cycle_accs
            .entry(institution_slug(&rec.institution))
            .or_default()
            .entry(rec.cycle.clone())
            .or_insert_with(|| CycleAcc {
                recognized: 0,
                reviewed: 0,
                count: 0,
                reviewers: Vec::new(),
            });
        acc.recognized += rec.recognized;
        acc.reviewed += rec.reviewed;
        acc.count += 1;
        acc.reviewers.push(CycleReviewer {
            name: rec.name.clone(),
            recognized: rec.recognized,
            reviewed: rec.reviewed,
            percentage: rec.percentage,
        });
    }

    let mut groups: BTreeMap<String, Vec<&InstitutionAgg>> = BTreeMap::new();
    for agg in aggs {
        groups
            .entry(institution_slug(&agg.institution))
            .or_default()
            .push(agg);
    }

    let mut db: BTreeMap<String, Institution> = BTreeMap::new();
    for (slug, members) in groups {
        let total_recognized: u32 = members.iter().map(|m| m.recognized).sum();
        let total_reviewed: u32 = members.iter().map(|m| m.reviewed).sum();
        let total_reviewers: u32 = members.iter().map(|m| m.reviewer_count).sum();

        // 代表名は認定数が最大の表記。同数なら先に現れた方（名前昇順側）
        let mut primary = members[0];
        for &m in &members[1..] {
            if m.recognized > primary.recognized {
                primary = m;
            }
        }
        let name_variations: Vec<String> =
            members.iter().map(|m| m.institution.clone()).collect();

        let mut top_reviewers: Vec<Reviewer> = reviewer_db
            .values()
            .filter(|r| institution_slug(&r.institution) == slug)
            .cloned()
            .collect();
        top_reviewers.sort_by(|a, b| {
            rank::desc_u32(a.total_recognized, b.total_recognized)
                .then_with(|| rank::desc_f64(a.recognition_rate, b.recognition_rate))
                .then_with(|| rank::name_asc(&a.name, &b.name))
        });

        let mut cycles: BTreeMap<String, InstitutionCycle> = BTreeMap::new();
        if let Some(accs) = cycle_accs.remove(&slug) {
            for (cycle, acc) in accs {
                let mut reviewers = acc.reviewers;
                reviewers.sort_by(|a, b| {
                    rank::desc_u32(a.recognized, b.recognized)
                        .then_with(|| rank::desc_f64(a.percentage, b.percentage))
                        .then_with(|| rank::name_asc(&a.name, &b.name))
                });
                cycles.insert(
                    cycle,
                    InstitutionCycle {
                        recognized: acc.recognized,
                        reviewed: acc.reviewed,
                        reviewer_count: acc.count,
                        reviewers,
                        recognition_rate: rank::display_rate(acc.recognized, acc.reviewed),
                    },
                );
            }
        }

        db.insert(
            slug.clone(),
            Institution {
                name: primary.institution.clone(),
                url_safe_id: slug,
                total_recognized,
                total_reviewed,
                total_reviewers,
                recognition_rate: rank::display_rate(total_recognized, total_reviewed),
                top_reviewers,
                cycles,
                achievements: Vec::new(),
                name_variations,
            },
        );
    }
    db
}

/// 生の機関名 → slug の対応表（昇順）
pub fn institution_mappings(aggs: &[InstitutionAgg]) -> BTreeMap<String, String> {
    aggs.iter()
        .map(|a| (a.institution.clone(), institution_slug(&a.institution)))
        .collect()
}

// ---------------------------------------------------------------------------
// ランキングとバッジ
// ---------------------------------------------------------------------------

/// 通算ランキングの比較。認定数 → 認定率 → 担当数の降順、
/// 最後に代表名の昇順
pub fn cmp_institutions_overall(a: &Institution, b: &Institution) -> Ordering {
    rank::desc_u32(a.total_recognized, b.total_recognized)
        .then_with(|| rank::desc_f64(a.recognition_rate, b.recognition_rate))
        .then_with(|| rank::desc_u32(a.total_reviewed, b.total_reviewed))
        .then_with(|| rank::name_asc(&a.name, &b.name))
}

/// 通算・サイクル別ランキングに基づいて機関バッジを付与する
pub fn assign_institution_badges(db: &mut BTreeMap<String, Institution>) {
    let mut overall: Vec<(String, Institution)> =
        db.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    overall.sort_by(|a, b| cmp_institutions_overall(&a.1, &b.1));
    for (i, (slug, _)) in overall.iter().enumerate() {
        let pos = (i + 1) as u32;
        let Some(badge) = badge_for(pos, BadgeScope::Overall, BadgeSubject::Institutions) else {
            break;
        };
        if let Some(inst) = db.get_mut(slug) {
            inst.achievements.push(badge);
        }
    }

    let cycles: BTreeSet<String> = db
        .values()
        .flat_map(|i| i.cycles.keys().cloned())
        .collect();
    for cycle in &cycles {
        let mut in_cycle: Vec<(String, String, InstitutionCycle)> = db
            .iter()
            .filter_map(|(slug, inst)| {
                inst.cycles
                    .get(cycle)
                    .map(|c| (slug.clone(), inst.name.clone(), c.clone()))
            })
            .collect();
        in_cycle.sort_by(|a, b| {
            rank::desc_u32(a.2.recognized, b.2.recognized)
                .then_with(|| {
                    rank::desc_f64(
                        rank::clipped_rate(a.2.recognized, a.2.reviewed),
                        rank::clipped_rate(b.2.recognized, b.2.reviewed),
                    )
                })
                .then_with(|| rank::desc_u32(a.2.reviewed, b.2.reviewed))
                .then_with(|| rank::name_asc(&a.1, &b.1))
        });
        for (i, (slug, _, _)) in in_cycle.iter().enumerate() {
            let pos = (i + 1) as u32;
            let Some(badge) = badge_for(pos, BadgeScope::Cycle(cycle), BadgeSubject::Institutions)
            else {
                break;
            };
            if let Some(inst) = db.get_mut(slug) {
                inst.achievements.push(badge);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// サイクル別スナップショット（機関）
// ---------------------------------------------------------------------------

/// 機関のサイクル別スナップショット1行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleInstitutionRow {
    pub institution: String,
    pub reviewer_count: u32,
    pub reviewed: u32,
    pub recognized: u32,
    pub recognition_rate: f64,
    pub percentage: f64,
}

/// 指定サイクルに活動のあった機関をランキング順に並べた行。
/// percentage は認定率の百分率表記
pub fn cycle_institution_rows(
    db: &BTreeMap<String, Institution>,
    cycle: &str,
) -> Vec<CycleInstitutionRow> {
    let mut rows: Vec<CycleInstitutionRow> = db
        .values()
        .filter_map(|inst| {
            inst.cycles.get(cycle).map(|c| CycleInstitutionRow {
                institution: inst.name.clone(),
                reviewer_count: c.reviewer_count,
                reviewed: c.reviewed,
                recognized: c.recognized,
                recognition_rate: c.recognition_rate,
                percentage: c.recognition_rate * 100.0,
            })
        })
        .collect();
    // タイブレークはバッジ付与側のサイクル内順位と同じクリップ率。
    // 表示列の recognition_rate（分母0は0）とは使い分ける
    rows.sort_by(|a, b| {
        rank::desc_u32(a.recognized, b.recognized)
            .then_with(|| {
                rank::desc_f64(
                    rank::clipped_rate(a.recognized, a.reviewed),
                    rank::clipped_rate(b.recognized, b.reviewed),
                )
            })
            .then_with(|| rank::desc_u32(a.reviewed, b.reviewed))
            .then_with(|| rank::name_asc(&a.institution, &b.institution))
    });
    rows
}
