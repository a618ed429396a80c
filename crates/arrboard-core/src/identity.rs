//! OpenReview ID の解決
//!
//! 上流のプロファイル照合が出力する対応表と、手動上書きのTOMLから
//! `name|institution` キーで正準IDを引く。解決の優先順位は
//! 手動上書き → 一意マッチ → 複数候補の先頭、の3段階。

use std::collections::BTreeMap;
use std::fs;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::error::{DataError, Result};

// ---------------------------------------------------------------------------
// 対応表のデシリアライズ型
// ---------------------------------------------------------------------------

/// 照合結果1件分。候補プロファイルIDの列だけを使う
#[derive(Debug, Clone, Deserialize)]
pub struct MappingEntry {
    pub openreview_profiles: Vec<String>,
}

/// 照合処理のサマリ（ログ用）
#[derive(Debug, Clone, Deserialize)]
pub struct MappingMetadata {
    pub total_processed: u32,
    pub single_matches: u32,
    pub multiple_matches: u32,
    pub no_matches: u32,
}

/// `openreview_profile_mapping.json` の全体
#[derive(Debug, Default, Deserialize)]
pub struct ProfileMapping {
    #[serde(default)]
    pub metadata: Option<MappingMetadata>,
    #[serde(default)]
    pub single_matches: BTreeMap<String, MappingEntry>,
    #[serde(default)]
    pub multiple_matches: BTreeMap<String, MappingEntry>,
}

/// `manual_openreview_mappings.toml` の `[mappings]` テーブル
#[derive(Debug, Default, Deserialize)]
struct ManualOverrides {
    #[serde(default)]
    mappings: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// 解決器
// ---------------------------------------------------------------------------

/// どの段階で解決されたか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    /// 手動上書きTOMLによる解決
    Manual,
    /// 一意マッチによる解決
    Single,
    /// 複数候補の先頭を採用した解決（要注意ケース）
    FirstOfMultiple,
}

/// `name|institution` から正準IDを引く解決器
#[derive(Debug, Default)]
pub struct Resolver {
    manual: BTreeMap<String, String>,
    mapping: ProfileMapping,
}

impl Resolver {
    pub fn new(mapping: ProfileMapping, manual: BTreeMap<String, String>) -> Self {
        Resolver { manual, mapping }
    }

    /// 対応表JSONと手動上書きTOMLから解決器を作る。
    /// どちらのファイルも、存在しなければ空として扱う（警告のみ）。
    pub fn from_files(mapping_path: &Path, overrides_path: &Path) -> Result<Self> {
        let mapping = if mapping_path.exists() {
            let file = fs::File::open(mapping_path).map_err(|e| DataError::Io {
                path: mapping_path.to_path_buf(),
                source: e,
            })?;
            serde_json::from_reader(BufReader::new(file)).map_err(|e| DataError::Json {
                path: mapping_path.to_path_buf(),
                source: e,
            })?
        } else {
            log::warn!(
                "profile mapping {} not found, continuing without automatic matches",
                mapping_path.display()
            );
            ProfileMapping::default()
        };
        if let Some(meta) = &mapping.metadata {
            log::info!(
                "profile mapping: {} names processed ({} single, {} multiple, {} unmatched)",
                meta.total_processed,
                meta.single_matches,
                meta.multiple_matches,
                meta.no_matches
            );
        }

        let manual = if overrides_path.exists() {
            let text = fs::read_to_string(overrides_path).map_err(|e| DataError::Io {
                path: overrides_path.to_path_buf(),
                source: e,
            })?;
            let overrides: ManualOverrides =
                toml::from_str(&text).map_err(|e| DataError::Toml {
                    path: overrides_path.to_path_buf(),
                    source: e,
                })?;
            overrides.mappings
        } else {
            log::warn!(
                "manual overrides {} not found, continuing without overrides",
                overrides_path.display()
            );
            BTreeMap::new()
        };

        Ok(Resolver::new(mapping, manual))
    }

    /// `name|institution` の組に対する正準IDを返す。
    ///
    /// 一意マッチ・複数候補のエントリに候補が1つも無い場合は、
    /// 次の段階へは進まず未解決として扱う。
    pub fn resolve(&self, name: &str, institution: &str) -> Option<(&str, ResolutionTier)> {
        let key = format!("{name}|{institution}");
        if let Some(id) = self.manual.get(&key) {
            return Some((id.as_str(), ResolutionTier::Manual));
        }
        if let Some(entry) = self.mapping.single_matches.get(&key) {
            return entry
                .openreview_profiles
                .first()
                .map(|id| (id.as_str(), ResolutionTier::Single));
        }
        if let Some(entry) = self.mapping.multiple_matches.get(&key) {
            return entry
                .openreview_profiles
                .first()
                .map(|id| (id.as_str(), ResolutionTier::FirstOfMultiple));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ids: &[&str]) -> MappingEntry {
        MappingEntry {
            openreview_profiles: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn resolver() -> Resolver {
        let mut mapping = ProfileMapping::default();
        mapping
            .single_matches
            .insert("Alice|MIT".to_string(), entry(&["~Alice1"]));
        mapping
            .multiple_matches
            .insert("Bob|CMU".to_string(), entry(&["~Bob1", "~Bob2"]));
        mapping
            .single_matches
            .insert("Carol|ETH".to_string(), entry(&[]));
        let mut manual = BTreeMap::new();
        manual.insert("Alice|MIT".to_string(), "~AliceManual1".to_string());
        Resolver::new(mapping, manual)
    }

    #[test]
    fn manual_override_wins_over_single_match() {
        let r = resolver();
        let (id, tier) = r.resolve("Alice", "MIT").unwrap();
        assert_eq!(id, "~AliceManual1");
        assert_eq!(tier, ResolutionTier::Manual);
    }

    #[test]
    fn multiple_match_takes_first_candidate() {
        let r = resolver();
        let (id, tier) = r.resolve("Bob", "CMU").unwrap();
        assert_eq!(id, "~Bob1");
        assert_eq!(tier, ResolutionTier::FirstOfMultiple);
    }

    #[test]
    fn empty_candidate_list_is_unresolved() {
        let r = resolver();
        assert!(r.resolve("Carol", "ETH").is_none());
    }

    #[test]
    fn unknown_pair_is_unresolved() {
        let r = resolver();
        assert!(r.resolve("Dave", "Nowhere").is_none());
    }

    #[test]
    fn same_name_different_institution_is_a_different_key() {
        let r = resolver();
        assert!(r.resolve("Alice", "Stanford").is_none());
    }

    #[test]
    fn missing_files_yield_empty_resolver() {
        let dir = tempfile::tempdir().unwrap();
        let r = Resolver::from_files(
            &dir.path().join("no_mapping.json"),
            &dir.path().join("no_overrides.toml"),
        )
        .unwrap();
        assert!(r.resolve("Alice", "MIT").is_none());
    }

    #[test]
    fn from_files_reads_both_sources() {
        let dir = tempfile::tempdir().unwrap();
        let mapping_path = dir.path().join("mapping.json");
        let overrides_path = dir.path().join("overrides.toml");
        std::fs::write(
            &mapping_path,
            r#"{
                "metadata": {"total_processed": 2, "single_matches": 1, "multiple_matches": 1, "no_matches": 0},
                "single_matches": {"Alice|MIT": {"name": "Alice", "institution": "MIT", "openreview_profiles": ["~Alice1"], "match_count": 1}},
                "multiple_matches": {"Bob|CMU": {"name": "Bob", "institution": "CMU", "openreview_profiles": ["~Bob1", "~Bob2"], "match_count": 2}}
            }"#,
        )
        .unwrap();
        std::fs::write(
            &overrides_path,
            "[mappings]\n\"Bob|CMU\" = \"~BobManual1\"\n",
        )
        .unwrap();

        let r = Resolver::from_files(&mapping_path, &overrides_path).unwrap();
        assert_eq!(r.resolve("Alice", "MIT").unwrap().0, "~Alice1");
        let (id, tier) = r.resolve("Bob", "CMU").unwrap();
        assert_eq!(id, "~BobManual1");
        assert_eq!(tier, ResolutionTier::Manual);
    }

    #[test]
    fn malformed_mapping_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mapping_path = dir.path().join("mapping.json");
        std::fs::write(&mapping_path, "{not json").unwrap();
        let err =
            Resolver::from_files(&mapping_path, &dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, DataError::Json { .. }));
    }
}
