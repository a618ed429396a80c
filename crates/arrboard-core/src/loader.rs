//! サイクル別レコードファイルの読み込み
//!
//! `<data_dir>/raw/` 直下の `*.json` / `*.json.gz` を1ファイル=1サイクル
//! として読む。サイクル名はファイル名のstem（例: `2023_01.json` →
//! `2023_01`）。ファイル名の昇順で読むので、同一レビュアーの表示名は
//! 最後のサイクルの表記が勝つ、という下流の規約が成り立つ。

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::error::{DataError, Result};
use crate::record::{RawRecord, RecordDe};

const RAW_SUBDIR: &str = "raw";

/// `data_dir/raw/` のサイクルファイルをすべて読み、サイクル昇順の
/// 正規化済みレコード列を返す。ファイルが1つも無ければ
/// [`DataError::EmptyInput`]。
pub fn load_cycles(data_dir: &Path) -> Result<Vec<RawRecord>> {
    let raw_dir = data_dir.join(RAW_SUBDIR);
    let entries = match std::fs::read_dir(&raw_dir) {
        Ok(entries) => entries,
        // ディレクトリ未作成は「データなし」と同じ扱い
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DataError::EmptyInput { dir: raw_dir });
        }
        Err(e) => {
            return Err(DataError::Io {
                path: raw_dir,
                source: e,
            });
        }
    };

    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DataError::Io {
            path: raw_dir.clone(),
            source: e,
        })?;
        let path = entry.path();
        if let Some(cycle) = cycle_stem(&path) {
            files.push((cycle, path));
        }
    }
    if files.is_empty() {
        return Err(DataError::EmptyInput { dir: raw_dir });
    }
    files.sort();

    let mut records = Vec::new();
    for (cycle, path) in &files {
        read_into(path, cycle, &mut records)?;
    }
    log::info!(
        "loaded {} records from {} cycle files in {}",
        records.len(),
        files.len(),
        raw_dir.display()
    );
    Ok(records)
}

/// 単一のサイクルファイルを読む。サイクル名はstemから取る。
/// レポート系ツールがファイル指定で使う入口
pub fn load_cycle_file(path: &Path) -> Result<Vec<RawRecord>> {
    let cycle = cycle_stem(path).ok_or_else(|| DataError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "expected a .json or .json.gz file",
        ),
    })?;
    let mut records = Vec::new();
    read_into(path, &cycle, &mut records)?;
    Ok(records)
}

/// `.json` / `.json.gz` からサイクル名を取り出す。対象外の拡張子は None
fn cycle_stem(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stem = name
        .strip_suffix(".json.gz")
        .or_else(|| name.strip_suffix(".json"))?;
    if stem.is_empty() {
        return None;
    }
    Some(stem.to_string())
}

fn read_into(path: &Path, cycle: &str, out: &mut Vec<RawRecord>) -> Result<()> {
    let file = File::open(path).map_err(|e| DataError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let rows: Vec<RecordDe> = if ext == "gz" {
        serde_json::from_reader(BufReader::new(GzDecoder::new(file)))
    } else {
        serde_json::from_reader(BufReader::new(file))
    }
    .map_err(|e| DataError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;

    let file_label = path.display().to_string();
    out.reserve(rows.len());
    for row in rows {
        out.push(row.validate(cycle, &file_label)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cycle_stem_handles_both_extensions() {
        assert_eq!(cycle_stem(Path::new("raw/2023_01.json")).as_deref(), Some("2023_01"));
        assert_eq!(
            cycle_stem(Path::new("raw/2024_06.json.gz")).as_deref(),
            Some("2024_06")
        );
        assert_eq!(cycle_stem(Path::new("raw/notes.txt")), None);
        assert_eq!(cycle_stem(Path::new("raw/.json")), None);
    }

    #[test]
    fn load_cycles_reads_files_in_cycle_order() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw");
        std::fs::create_dir(&raw).unwrap();
        std::fs::write(
            raw.join("2023_03.json"),
            r#"[{"name":"B","institution":"X","reviewed":1,"recognized":1,"percentage":100.0}]"#,
        )
        .unwrap();
        std::fs::write(
            raw.join("2023_01.json"),
            r#"[{"name":"A","institution":"X","reviewed":2,"recognized":0,"percentage":0.0}]"#,
        )
        .unwrap();

        let records = load_cycles(dir.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].cycle, "2023_01");
        assert_eq!(records[0].name, "A");
        assert_eq!(records[1].cycle, "2023_03");
        assert_eq!(records[1].name, "B");
    }

    #[test]
    fn gzip_files_are_transparently_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw");
        std::fs::create_dir(&raw).unwrap();
        let body =
            r#"[{"name":"A","institution":"X","reviewed":4,"recognized":2,"percentage":50.0}]"#;
        let file = File::create(raw.join("2024_06.json.gz")).unwrap();
        let mut enc =
            flate2::write::GzEncoder::new(file, flate2::Compression::default());
        enc.write_all(body.as_bytes()).unwrap();
        enc.finish().unwrap();

        let records = load_cycles(dir.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cycle, "2024_06");
        assert_eq!(records[0].reviewed, 4);
    }

    #[test]
    fn missing_raw_dir_is_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_cycles(dir.path()).unwrap_err();
        assert!(matches!(err, DataError::EmptyInput { .. }));
    }

    #[test]
    fn dir_without_cycle_files_is_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw");
        std::fs::create_dir(&raw).unwrap();
        std::fs::write(raw.join("README.txt"), "not data").unwrap();
        let err = load_cycles(dir.path()).unwrap_err();
        assert!(matches!(err, DataError::EmptyInput { .. }));
    }

    #[test]
    fn malformed_json_reports_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw");
        std::fs::create_dir(&raw).unwrap();
        std::fs::write(raw.join("2023_01.json"), "{broken").unwrap();
        let err = load_cycles(dir.path()).unwrap_err();
        match err {
            DataError::Json { path, .. } => {
                assert!(path.to_string_lossy().ends_with("2023_01.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_cycle_file_takes_cycle_from_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2025_02.json");
        std::fs::write(
            &path,
            r#"[{"name":"A","institution":"X","reviewed":1,"recognized":0,"percentage":0.0}]"#,
        )
        .unwrap();
        let records = load_cycle_file(&path).unwrap();
        assert_eq!(records[0].cycle, "2025_02");
    }
}
