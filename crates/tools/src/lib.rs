//! arrboard のビルド・レポートツール共通部

pub mod common;
