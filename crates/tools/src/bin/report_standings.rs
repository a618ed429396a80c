//! レビュー実績レコードの概況レポートツール
//!
//! サイクル別ファイルを直接読み、サイクルごとの概況と上位レビュアーを
//! 表示する。正準IDによる名寄せは行わず、name と institution の組を
//! そのまま1人として数える簡易集計。
//!
//! 使い方:
//!   cargo run --bin report_standings -- data/raw/2023_01.json
//!   cargo run --bin report_standings -- --top 5 data/raw/*.json
//!   cargo run --bin report_standings -- --json data/raw/*.json.gz

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use serde::Serialize;

use arrboard_core::loader::load_cycle_file;
use arrboard_core::rank;
use arrboard_core::record::RawRecord;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(about = "サイクル別レコードの概況レポート")]
struct Cli {
    /// 入力ファイル（.json / .json.gz、複数指定可）
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// 上位レビュアーを何名まで表示するか
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// JSON形式で出力する
    #[arg(long)]
    json: bool,
}

// ---------------------------------------------------------------------------
// 集計用の構造体
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct CycleSummary {
    cycle: String,
    records: usize,
    reviewed: u64,
    recognized: u64,
    recognition_rate: f64,
}

#[derive(Debug, Serialize)]
struct TopReviewer {
    name: String,
    institution: String,
    recognized: u32,
    reviewed: u32,
    recognition_rate: f64,
}

#[derive(Debug, Serialize)]
struct Totals {
    files: usize,
    records: usize,
    reviewed: u64,
    recognized: u64,
    recognition_rate: f64,
}

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    cycles: &'a [CycleSummary],
    totals: &'a Totals,
    top_reviewers: &'a [TopReviewer],
}

// ---------------------------------------------------------------------------
// 集計
// ---------------------------------------------------------------------------

fn rate64(recognized: u64, reviewed: u64) -> f64 {
    if reviewed > 0 {
        recognized as f64 / reviewed as f64
    } else {
        0.0
    }
}

fn summarize_cycles(records: &[RawRecord]) -> Vec<CycleSummary> {
    let mut by_cycle: BTreeMap<String, (usize, u64, u64)> = BTreeMap::new();
    for rec in records {
        let entry = by_cycle.entry(rec.cycle.clone()).or_default();
        entry.0 += 1;
        entry.1 += u64::from(rec.reviewed);
        entry.2 += u64::from(rec.recognized);
    }
    by_cycle
        .into_iter()
        .map(|(cycle, (records, reviewed, recognized))| CycleSummary {
            cycle,
            records,
            reviewed,
            recognized,
            recognition_rate: rate64(recognized, reviewed),
        })
        .collect()
}

fn summarize_totals(files: usize, records: &[RawRecord]) -> Totals {
    let reviewed: u64 = records.iter().map(|r| u64::from(r.reviewed)).sum();
    let recognized: u64 = records.iter().map(|r| u64::from(r.recognized)).sum();
    Totals {
        files,
        records: records.len(),
        reviewed,
        recognized,
        recognition_rate: rate64(recognized, reviewed),
    }
}

/// name と institution の組単位で全ファイルを合算し、認定数順の
/// 上位 `limit` 名を返す
fn top_reviewers(records: &[RawRecord], limit: usize) -> Vec<TopReviewer> {
    let mut by_person: BTreeMap<(String, String), (u32, u32)> = BTreeMap::new();
    for rec in records {
        let entry = by_person
            .entry((rec.name.clone(), rec.institution.clone()))
            .or_default();
        entry.0 += rec.recognized;
        entry.1 += rec.reviewed;
    }
    let mut rows: Vec<TopReviewer> = by_person
        .into_iter()
        .map(|((name, institution), (recognized, reviewed))| TopReviewer {
            name,
            institution,
            recognized,
            reviewed,
            recognition_rate: rank::clipped_rate(recognized, reviewed),
        })
        .collect();
    rows.sort_by(|a, b| {
        rank::desc_u32(a.recognized, b.recognized)
            .then_with(|| rank::desc_f64(a.recognition_rate, b.recognition_rate))
            .then_with(|| rank::desc_u32(a.reviewed, b.reviewed))
            .then_with(|| rank::name_asc(&a.name, &b.name))
    });
    rows.truncate(limit);
    rows
}

// ---------------------------------------------------------------------------
// メイン処理
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
    let cli = Cli::parse();

    let mut records: Vec<RawRecord> = Vec::new();
    let mut read_files = 0usize;
    for path in &cli.files {
        match load_cycle_file(path) {
            Ok(mut rows) => {
                records.append(&mut rows);
                read_files += 1;
            }
            Err(e) => eprintln!("警告: {}: {e}", path.display()),
        }
    }
    if records.is_empty() {
        bail!("有効なレコードがありません");
    }

    let cycles = summarize_cycles(&records);
    let totals = summarize_totals(read_files, &records);
    let top = top_reviewers(&records, cli.top);

    if cli.json {
        print_json(&cycles, &totals, &top)?;
    } else {
        print_text(&cycles, &totals, &top);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// テキスト出力
// ---------------------------------------------------------------------------

fn print_text(cycles: &[CycleSummary], totals: &Totals, top: &[TopReviewer]) {
    println!("{}", "=".repeat(72));
    println!("サイクル別概況");
    println!("{}", "=".repeat(72));
    println!(
        "{:<12} {:>8} {:>10} {:>10} {:>8}",
        "サイクル", "行数", "担当数", "認定数", "認定率"
    );
    for c in cycles {
        println!(
            "{:<12} {:>8} {:>10} {:>10} {:>7.1}%",
            c.cycle,
            c.records,
            c.reviewed,
            c.recognized,
            c.recognition_rate * 100.0
        );
    }
    println!();
    println!(
        "合計: {}ファイル {}行 / 担当{} 認定{} (認定率 {:.1}%)",
        totals.files,
        totals.records,
        totals.reviewed,
        totals.recognized,
        totals.recognition_rate * 100.0
    );

    println!();
    println!("{}", "=".repeat(72));
    println!("上位レビュアー（認定数順）");
    println!("{}", "=".repeat(72));
    for (i, r) in top.iter().enumerate() {
        println!(
            "{:>3}. {} ({}) 認定{} / 担当{} ({:.1}%)",
            i + 1,
            r.name,
            r.institution,
            r.recognized,
            r.reviewed,
            r.recognition_rate * 100.0
        );
    }
}

// ---------------------------------------------------------------------------
// JSON出力
// ---------------------------------------------------------------------------

fn print_json(cycles: &[CycleSummary], totals: &Totals, top: &[TopReviewer]) -> Result<()> {
    let output = JsonOutput {
        cycles,
        totals,
        top_reviewers: top,
    };
    let json = serde_json::to_string_pretty(&output)?;
    println!("{json}");
    Ok(())
}
