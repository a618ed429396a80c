//! ARRレビュアー認定データの統合・ランキングエンジン
//!
//! サイクル別の生レコードを読み込み、正準IDによる名寄せ、機関の
//! 表記揺れ統合、決定的な多段キーランキング、バッジ付与、
//! サイト向けJSONアーティファクトの生成までを担う。
//!
//! 処理の流れ:
//! 1. [`loader`] が `raw/` のサイクルファイルを正規化して読む
//! 2. [`identity`] が `name|institution` を正準IDへ解決する
//! 3. [`reviewer`] / [`institution`] が実体を統合しバッジを付ける
//! 4. [`metrics`] / [`insights`] がランキング行と指標を作る
//! 5. [`schema`] が出力契約のマニフェストを書く

pub mod badge;
pub mod error;
pub mod identity;
pub mod insights;
pub mod institution;
pub mod loader;
pub mod metrics;
pub mod rank;
pub mod record;
pub mod reviewer;
pub mod schema;
pub mod slug;

pub use badge::{Badge, BadgeScope, BadgeSubject};
pub use error::{DataError, Result};
pub use identity::{ResolutionTier, Resolver};
pub use institution::Institution;
pub use loader::{load_cycle_file, load_cycles};
pub use record::RawRecord;
pub use reviewer::Reviewer;
pub use slug::institution_slug;
