//! rsvae-core のコマンドラインツール群
//!
//! - `config`: パイプライン構成ファイル（TOML）
//! - `weights`: GRU 重みの読み込み（JSON）と乱数生成
//! - `common::io`: gzip 対応の入出力と CSV

pub mod common;
pub mod config;
pub mod weights;

/// ツール共通のロガー初期化（既定レベル info、出力先 stderr）
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
}
