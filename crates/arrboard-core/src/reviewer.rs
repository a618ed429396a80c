//! レビュアー実体の統合とバッジ付与
//!
//! 解決器で正準IDに落ちたレコードをID単位に畳み込み、サイクル別
//! 実績と通算実績を持つ [`Reviewer`] を作る。通算値は必ずサイクル別
//! 実績の和として再計算する（別経路で加算しない）。

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::badge::{Badge, BadgeScope, BadgeSubject, badge_for};
use crate::identity::{ResolutionTier, Resolver};
use crate::rank;
use crate::record::RawRecord;

// ---------------------------------------------------------------------------
// 実体の型
// ---------------------------------------------------------------------------

/// 1サイクル分の実績
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleStat {
    pub recognized: u32,
    pub reviewed: u32,
    pub percentage: f64,
}

/// 統合済みレビュアー。フィールド順は出力JSONの鍵順そのまま
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reviewer {
    /// 表示名。最後に出現したサイクルの表記
    pub name: String,
    /// 表示機関。最後に出現したサイクルの表記
    pub institution: String,
    pub openreview_id: String,
    pub unique_id: String,
    pub total_recognized: u32,
    pub total_reviewed: u32,
    pub recognition_rate: f64,
    pub cycles: BTreeMap<String, CycleStat>,
    pub achievements: Vec<Badge>,
}

// ---------------------------------------------------------------------------
// 統合
// ---------------------------------------------------------------------------

/// レコード列をID単位に統合する。未解決のレコードは落とす
/// （機関側の集計はレコード直接なので影響しない）。
///
/// `records` はサイクル昇順であること（loaderが保証する）。同じIDが
/// 同一サイクルに複数回現れた場合、件数は加算、percentage は後勝ち。
pub fn build_reviewer_database(
    records: &[RawRecord],
    resolver: &Resolver,
) -> BTreeMap<String, Reviewer> {
    let mut db: BTreeMap<String, Reviewer> = BTreeMap::new();
    let mut ambiguous: BTreeSet<String> = BTreeSet::new();
    let mut unresolved = 0usize;

    for rec in records {
        let Some((id, tier)) = resolver.resolve(&rec.name, &rec.institution) else {
            unresolved += 1;
            continue;
        };
        if tier == ResolutionTier::FirstOfMultiple {
            let key = format!("{}|{}", rec.name, rec.institution);
            if ambiguous.insert(key) {
                log::warn!(
                    "ambiguous profile match for {}|{}: using first candidate {}",
                    rec.name,
                    rec.institution,
                    id
                );
            }
        }

        let entry = db.entry(id.to_string()).or_insert_with(|| Reviewer {
            name: rec.name.clone(),
            institution: rec.institution.clone(),
            openreview_id: id.to_string(),
            unique_id: id.to_string(),
            total_recognized: 0,
            total_reviewed: 0,
            recognition_rate: 0.0,
            cycles: BTreeMap::new(),
            achievements: Vec::new(),
        });
        // 後のサイクルの表記で表示名を上書き
        entry.name = rec.name.clone();
        entry.institution = rec.institution.clone();
        let stat = entry.cycles.entry(rec.cycle.clone()).or_default();
        stat.recognized += rec.recognized;
        stat.reviewed += rec.reviewed;
        stat.percentage = rec.percentage;
    }

    if unresolved > 0 {
        log::warn!("{unresolved} records without a canonical ID were left out of the reviewer database");
    }

    for reviewer in db.values_mut() {
        let total_recognized: u32 = reviewer.cycles.values().map(|c| c.recognized).sum();
        let total_reviewed: u32 = reviewer.cycles.values().map(|c| c.reviewed).sum();
        reviewer.total_recognized = total_recognized;
        reviewer.total_reviewed = total_reviewed;
        reviewer.recognition_rate = rank::display_rate(total_recognized, total_reviewed);
    }
    db
}

// ---------------------------------------------------------------------------
// ランキングとバッジ
// ---------------------------------------------------------------------------

/// 通算ランキングの比較。認定数 → 認定率 → 担当数の降順、
/// 最後に名前の昇順
pub fn cmp_reviewers_overall(a: &Reviewer, b: &Reviewer) -> Ordering {
    rank::desc_u32(a.total_recognized, b.total_recognized)
        .then_with(|| rank::desc_f64(a.recognition_rate, b.recognition_rate))
        .then_with(|| rank::desc_u32(a.total_reviewed, b.total_reviewed))
        .then_with(|| rank::name_asc(&a.name, &b.name))
}

/// 通算ランキングとサイクル別ランキングに基づいてバッジを付与する。
/// 通算バッジが先、サイクル別はサイクル名の昇順で後ろに続く
pub fn assign_reviewer_badges(db: &mut BTreeMap<String, Reviewer>) {
    let mut overall: Vec<Reviewer> = db.values().cloned().collect();
    overall.sort_by(cmp_reviewers_overall);
    for (i, entity) in overall.iter().enumerate() {
        let pos = (i + 1) as u32;
        let Some(badge) = badge_for(pos, BadgeScope::Overall, BadgeSubject::Reviewers) else {
            break;
        };
        if let Some(reviewer) = db.get_mut(&entity.unique_id) {
            reviewer.achievements.push(badge);
        }
    }

    let cycles: BTreeSet<String> = db
        .values()
        .flat_map(|r| r.cycles.keys().cloned())
        .collect();
    for cycle in &cycles {
        // そのサイクルに実績がある実体だけを順位付けする
        let mut in_cycle: Vec<(String, String, CycleStat)> = db
            .values()
            .filter_map(|r| {
                r.cycles
                    .get(cycle)
                    .map(|c| (r.unique_id.clone(), r.name.clone(), c.clone()))
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
        for (i, (id, _, _)) in in_cycle.iter().enumerate() {
            let pos = (i + 1) as u32;
            let Some(badge) = badge_for(pos, BadgeScope::Cycle(cycle), BadgeSubject::Reviewers)
            else {
                break;
            };
            if let Some(reviewer) = db.get_mut(id) {
                reviewer.achievements.push(badge);
            }
        }
    }

    let badged = db.values().filter(|r| !r.achievements.is_empty()).count();
    log::info!("assigned badges to {badged} of {} reviewers", db.len());
}
