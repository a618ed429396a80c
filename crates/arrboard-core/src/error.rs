//! arrboard-core 共通のエラー型

use std::path::PathBuf;

use thiserror::Error;

/// arrboard-core 全体で使う Result 型
pub type Result<T> = std::result::Result<T, DataError>;

/// データ読み込み・検証のエラー
#[derive(Debug, Error)]
pub enum DataError {
    /// 生レコードに必須フィールドが無い
    #[error("missing required field `{field}` in {file}")]
    MissingField { field: &'static str, file: String },

    /// フィールドの値が数値として解釈できない
    #[error("invalid `{field}` value `{value}` in {file}")]
    InvalidField {
        field: &'static str,
        value: String,
        file: String,
    },

    /// 入力ディレクトリにサイクルファイルが1つも無い
    #[error("no cycle files found in {}", .dir.display())]
    EmptyInput { dir: PathBuf },

    /// ファイルI/Oエラー
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSONのパースエラー
    #[error("failed to parse {}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// TOMLのパースエラー
    #[error("failed to parse {}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
