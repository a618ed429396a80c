//! レビュー実績集計パイプライン
//!
//! `<data_dir>/raw/` のサイクル別レコードから、レビュアーDB・機関DB・
//! 各種ランキング・サイクル別スナップショット・スキーママニフェスト
//! までの全アーティファクトを生成する。
//!
//! 使い方:
//!   cargo run --bin build_rankings
//!   cargo run --bin build_rankings -- --data-dir data --out-dir data
//!   cargo run --bin build_rankings -- --schema-out static/schema.json

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use arrboard_core::error::DataError;
use arrboard_core::identity::Resolver;
use arrboard_core::insights::{cycle_totals, misc_insights};
use arrboard_core::institution::{
    assign_institution_badges, build_institution_database, cycle_institution_rows,
    institution_mappings,
};
use arrboard_core::loader::load_cycles;
use arrboard_core::metrics::{
    aggregate_institutions, cmp_people_absolute, cmp_people_percentage, consolidate_people,
    cycle_names, cycle_reviewer_rows, institution_abs_rows, institution_pct_rows,
};
use arrboard_core::reviewer::{assign_reviewer_badges, build_reviewer_database};
use arrboard_core::schema;
use tools::common::io::write_json_pretty;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(about = "レビュー実績の集計と全アーティファクト生成")]
struct Cli {
    /// データディレクトリ（<data_dir>/raw/*.json[.gz] を読む）
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// OpenReviewプロファイル対応表のパス
    #[arg(long, default_value = "data/openreview_profile_mapping.json")]
    mapping: PathBuf,

    /// 手動上書きTOMLのパス
    #[arg(long, default_value = "config/manual_openreview_mappings.toml")]
    overrides: PathBuf,

    /// 出力先ディレクトリ（省略時は data_dir と同じ）
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// スキーママニフェストの出力先
    #[arg(long, default_value = "static/schema.json")]
    schema_out: PathBuf,
}

// ---------------------------------------------------------------------------
// メイン処理
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
    let cli = Cli::parse();

    let records = match load_cycles(&cli.data_dir) {
        Ok(records) => records,
        // データ未取得は正常終了扱い
        Err(DataError::EmptyInput { dir }) => {
            log::info!("no data available in {}, nothing to do", dir.display());
            return Ok(());
        }
        Err(e) => return Err(e).context("failed to load raw records"),
    };
    let resolver = Resolver::from_files(&cli.mapping, &cli.overrides)?;

    let out_dir = cli.out_dir.unwrap_or_else(|| cli.data_dir.clone());
    let metrics_dir = out_dir.join("metrics");

    // 個人ランキング（絶対数・率の2通り）
    let people = consolidate_people(&records, &resolver);
    let mut people_abs = people.clone();
    people_abs.sort_by(cmp_people_absolute);
    write_json_pretty(&metrics_dir.join("top_people_absolute.json"), &people_abs)?;
    let mut people_pct = people;
    people_pct.sort_by(cmp_people_percentage);
    write_json_pretty(&metrics_dir.join("top_people_percentage.json"), &people_pct)?;

    // 機関ランキング（生の機関名単位）
    let aggs = aggregate_institutions(&records);
    write_json_pretty(
        &metrics_dir.join("top_institutions_absolute.json"),
        &institution_abs_rows(&aggs),
    )?;
    write_json_pretty(
        &metrics_dir.join("top_institutions_percentage.json"),
        &institution_pct_rows(&aggs),
    )?;

    // 推移と集中度指標
    write_json_pretty(&metrics_dir.join("monthly_snapshots.json"), &cycle_totals(&records))?;
    write_json_pretty(&metrics_dir.join("misc_insights.json"), &misc_insights(&records))?;

    // レビュアーDB。機関DBへバッジ込みで埋め込むので先に確定させる
    let mut reviewer_db = build_reviewer_database(&records, &resolver);
    assign_reviewer_badges(&mut reviewer_db);
    write_json_pretty(&out_dir.join("reviewers_database.json"), &reviewer_db)?;

    // 機関DB（slugで表記揺れを統合）
    let mut institution_db = build_institution_database(&records, &aggs, &reviewer_db);
    assign_institution_badges(&mut institution_db);
    write_json_pretty(&out_dir.join("institutions_database.json"), &institution_db)?;
    write_json_pretty(
        &out_dir.join("institution_mappings.json"),
        &institution_mappings(&aggs),
    )?;

    // サイクル別スナップショット
    let cycles = cycle_names(&records);
    for cycle in &cycles {
        write_json_pretty(
            &metrics_dir.join(format!("reviewers_{cycle}.json")),
            &cycle_reviewer_rows(&records, cycle),
        )?;
        write_json_pretty(
            &metrics_dir.join(format!("institutions_{cycle}.json")),
            &cycle_institution_rows(&institution_db, cycle),
        )?;
    }

    // 出力契約のマニフェスト
    write_json_pretty(&cli.schema_out, &schema::manifest())?;

    log::info!(
        "wrote {} reviewers, {} institutions, {} cycle snapshots into {}",
        reviewer_db.len(),
        institution_db.len(),
        cycles.len(),
        out_dir.display()
    );
    Ok(())
}
