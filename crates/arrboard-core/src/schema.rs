//! 出力アーティファクトのスキーママニフェスト
//!
//! フロントエンドが期待する鍵名の一覧を機械可読な形で書き出す。
//! 列の増減はここに現れるので、出力契約の変更検知に使える。

use std::collections::BTreeMap;

use serde::Serialize;

/// 出力契約のバージョン。列の追加・削除・改名時にインクリメントする
pub const SCHEMA_VERSION: u32 = 1;

/// `schema.json` の中身
#[derive(Debug, Serialize)]
pub struct SchemaManifest {
    pub schema_version: u32,
    /// 生成時刻（RFC 3339）
    pub generated_at: String,
    /// アーティファクト名 → 鍵名リスト
    pub artifacts: BTreeMap<&'static str, Vec<&'static str>>,
}

/// 現在の出力契約のマニフェストを作る
pub fn manifest() -> SchemaManifest {
    let mut artifacts: BTreeMap<&'static str, Vec<&'static str>> = BTreeMap::new();
    artifacts.insert(
        "top_people_absolute",
        vec!["name", "institution", "recognized", "reviewed", "percentage", "recognition_rate"],
    );
    artifacts.insert(
        "top_people_percentage",
        vec!["name", "institution", "recognized", "reviewed", "percentage", "recognition_rate"],
    );
    artifacts.insert(
        "top_institutions_absolute",
        vec!["institution", "recognized", "reviewed", "reviewer_count", "recognition_rate"],
    );
    artifacts.insert(
        "top_institutions_percentage",
        vec!["institution", "percentage", "recognized", "reviewed"],
    );
    artifacts.insert("monthly_snapshots", vec!["iteration", "reviewed", "recognized"]);
    artifacts.insert(
        "misc_insights",
        vec!["gini_recognized", "herfindahl_institutions"],
    );
    artifacts.insert(
        "reviewers_database",
        vec![
            "name",
            "institution",
            "openreview_id",
            "unique_id",
            "total_recognized",
            "total_reviewed",
            "recognition_rate",
            "cycles",
            "achievements",
        ],
    );
    artifacts.insert(
        "institutions_database",
        vec![
            "name",
            "url_safe_id",
            "total_recognized",
            "total_reviewed",
            "total_reviewers",
            "recognition_rate",
            "top_reviewers",
            "cycles",
            "achievements",
            "name_variations",
        ],
    );
    artifacts.insert("institution_mappings", vec!["institution", "url_safe_id"]);
    artifacts.insert(
        "reviewers_by_cycle",
        vec!["name", "institution", "reviewed", "recognized", "percentage"],
    );
    artifacts.insert(
        "institutions_by_cycle",
        vec![
            "institution",
            "reviewer_count",
            "reviewed",
            "recognized",
            "recognition_rate",
            "percentage",
        ],
    );
    SchemaManifest {
        schema_version: SCHEMA_VERSION,
        generated_at: chrono::Local::now().to_rfc3339(),
        artifacts,
    }
}
