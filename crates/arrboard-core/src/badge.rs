//! ランク帯バッジ（achievements）の定義と付与判定

use serde::{Deserialize, Serialize};

/// バッジ段位。小さい方から順に試し、最初に `rank <= 段位` を
/// 満たした段位のバッジを1つだけ出す
const TIERS: [u32; 8] = [1, 2, 3, 5, 10, 20, 50, 100];

/// ランキング順位に対して授与されるバッジ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    pub rank: u32,
    /// サイクル別バッジのみ Some。全体バッジでは出力にも現れない
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<String>,
}

/// バッジ文言の対象（レビュアー / 機関）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeSubject {
    Reviewers,
    Institutions,
}

/// バッジの対象ランキング
#[derive(Debug, Clone, Copy)]
pub enum BadgeScope<'a> {
    Overall,
    Cycle(&'a str),
}

/// 1始まりの順位に対応するバッジを返す。段位圏外なら None
pub fn badge_for(rank: u32, scope: BadgeScope<'_>, subject: BadgeSubject) -> Option<Badge> {
    let tier = TIERS.iter().copied().find(|&t| rank <= t)?;
    let badge = match scope {
        BadgeScope::Overall => {
            let (title, noun) = match subject {
                BadgeSubject::Reviewers => (format!("Top {tier} Overall"), "reviewers"),
                BadgeSubject::Institutions => (format!("Top {tier} Institution"), "institutions"),
            };
            Badge {
                kind: format!("overall_top_{tier}"),
                title,
                description: format!("Ranked #{rank} among all {noun}"),
                rank,
                cycle: None,
            }
        }
        BadgeScope::Cycle(cycle) => Badge {
            kind: format!("cycle_top_{tier}_{cycle}"),
            title: format!("Top {tier} in {cycle}"),
            description: format!("Ranked #{rank} in {cycle} cycle"),
            rank,
            cycle: Some(cycle.to_string()),
        },
    };
    Some(badge)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_one_gets_top_one() {
        let badge = badge_for(1, BadgeScope::Overall, BadgeSubject::Reviewers).unwrap();
        assert_eq!(badge.kind, "overall_top_1");
        assert_eq!(badge.title, "Top 1 Overall");
        assert_eq!(badge.description, "Ranked #1 among all reviewers");
        assert_eq!(badge.rank, 1);
        assert!(badge.cycle.is_none());
    }

    #[test]
    fn rank_four_falls_into_top_five() {
        let badge = badge_for(4, BadgeScope::Overall, BadgeSubject::Reviewers).unwrap();
        assert_eq!(badge.kind, "overall_top_5");
        assert_eq!(badge.rank, 4);
    }

    #[test]
    fn boundary_ranks_match_their_own_tier() {
        for tier in [1u32, 2, 3, 5, 10, 20, 50, 100] {
            let badge = badge_for(tier, BadgeScope::Overall, BadgeSubject::Reviewers).unwrap();
            assert_eq!(badge.kind, format!("overall_top_{tier}"));
        }
    }

    #[test]
    fn rank_beyond_hundred_gets_nothing() {
        assert!(badge_for(101, BadgeScope::Overall, BadgeSubject::Reviewers).is_none());
    }

    #[test]
    fn institution_overall_wording_differs() {
        let badge = badge_for(2, BadgeScope::Overall, BadgeSubject::Institutions).unwrap();
        assert_eq!(badge.title, "Top 2 Institution");
        assert_eq!(badge.description, "Ranked #2 among all institutions");
    }

    #[test]
    fn cycle_badge_embeds_cycle_in_kind_and_wording() {
        let badge = badge_for(7, BadgeScope::Cycle("2023_01"), BadgeSubject::Reviewers).unwrap();
        assert_eq!(badge.kind, "cycle_top_10_2023_01");
        assert_eq!(badge.title, "Top 10 in 2023_01");
        assert_eq!(badge.description, "Ranked #7 in 2023_01 cycle");
        assert_eq!(badge.cycle.as_deref(), Some("2023_01"));
    }

    #[test]
    fn cycle_wording_is_shared_between_subjects() {
        let r = badge_for(3, BadgeScope::Cycle("2024_06"), BadgeSubject::Reviewers).unwrap();
        let i = badge_for(3, BadgeScope::Cycle("2024_06"), BadgeSubject::Institutions).unwrap();
        assert_eq!(r.title, i.title);
        assert_eq!(r.description, i.description);
    }

    #[test]
    fn overall_badge_serializes_without_cycle_field() {
        let badge = badge_for(1, BadgeScope::Overall, BadgeSubject::Reviewers).unwrap();
        let json = serde_json::to_string(&badge).unwrap();
        assert!(json.contains(r#""type":"overall_top_1""#));
        assert!(!json.contains("cycle"));
    }
}
