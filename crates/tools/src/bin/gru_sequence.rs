//! GRU / 双方向 GRU の系列処理ツール
//!
//! `T x n_in` の CSV を読み、構成ファイルの `[gru]` または `[bidirectional]`
//! セクションで系列を処理して、出力される隠れ状態を 1 行 1 フレームで書く。
//! 重みは JSON で与えるか、省略時はシード付き乱数で生成する。
//!
//! # 使用例
//!
//! ```shell
//! cargo run -p tools --release --bin gru_sequence -- \
//!   --config pipeline.toml --layer bidirectional \
//!   --input sequence.csv --weights bigru.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use log::{info, warn};

use rsvae_core::aliases::{DefaultBidirectional, DefaultGru, DefaultT};
use rsvae_core::FixedPoint;
use tools::common::io::{open_reader, open_writer, read_sequence_csv, write_csv_row};
use tools::config::PipelineFile;
use tools::weights;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Layer {
    Gru,
    Bidirectional,
}

#[derive(Parser, Debug)]
#[command(name = "gru_sequence")]
#[command(about = "固定小数点 GRU で系列を処理し、隠れ状態を出力する")]
struct Cli {
    /// パイプライン構成ファイル（TOML）
    #[arg(long)]
    config: PathBuf,

    /// 使う層
    #[arg(long, value_enum, default_value_t = Layer::Gru)]
    layer: Layer,

    /// 入力系列 CSV（.gz 対応、- で標準入力）
    #[arg(short, long)]
    input: PathBuf,

    /// 重み JSON（省略時は乱数）
    #[arg(long)]
    weights: Option<PathBuf>,

    /// 乱数重みのシード
    #[arg(long, default_value_t = 1)]
    weight_seed: u64,

    /// 乱数重みの範囲 [-scale, scale)
    #[arg(long, default_value_t = 0.5)]
    weight_scale: f64,

    /// 出力先（.gz 対応）
    #[arg(short, long, default_value = "-")]
    output: PathBuf,
}

/// CSV の値を入力型に量子化する
fn quantize_inputs(values: &[f64], n_in: usize, n_sequence: usize) -> Result<Vec<DefaultT>> {
    let expected = n_in * n_sequence;
    if values.len() != expected {
        bail!(
            "input has {} rows but the configuration expects n_sequence = {n_sequence}",
            values.len() / n_in
        );
    }
    Ok(values.iter().map(|&v| DefaultT::from_f64(v)).collect())
}

fn main() -> Result<()> {
    tools::init_logger();
    let cli = Cli::parse();
    let pipeline = PipelineFile::load(&cli.config)?;

    let (rows, width) = match cli.layer {
        Layer::Gru => {
            let Some(config) = pipeline.gru else {
                bail!("{} has no [gru] section", cli.config.display());
            };
            let w = match &cli.weights {
                Some(path) => weights::load_gru(path, config.n_in, config.n_state)?,
                None => {
                    warn!("no weights given; using random weights (seed {})", cli.weight_seed);
                    weights::random_gru(config.n_in, config.n_state, cli.weight_seed, cli.weight_scale)
                }
            };
            let raw = read_sequence_csv(open_reader(&cli.input)?, config.n_in)
                .with_context(|| format!("failed to read {}", cli.input.display()))?;
            let inputs = quantize_inputs(&raw, config.n_in, config.n_sequence)?;

            let n_state = config.n_state;
            let stack = DefaultGru::new(config, w)?;
            (stack.run(&inputs, None), n_state)
        }
        Layer::Bidirectional => {
            let Some(config) = pipeline.bidirectional else {
                bail!("{} has no [bidirectional] section", cli.config.display());
            };
            let w = match &cli.weights {
                Some(path) => weights::load_bidirectional(path, config.n_in, config.n_state)?,
                None => {
                    warn!("no weights given; using random weights (seed {})", cli.weight_seed);
                    weights::random_bidirectional(config.n_in, config.n_state, cli.weight_seed, cli.weight_scale)
                }
            };
            let raw = read_sequence_csv(open_reader(&cli.input)?, config.n_in)
                .with_context(|| format!("failed to read {}", cli.input.display()))?;
            let inputs = quantize_inputs(&raw, config.n_in, config.n_sequence)?;

            let n_out = config.n_out();
            let bi = DefaultBidirectional::new(config, w.forward, w.backward)?;
            (bi.run(&inputs), n_out)
        }
    };

    info!("{:?}: {} output frame(s) of width {width}", cli.layer, rows.len() / width);

    let mut out = open_writer(&cli.output).context("failed to open output")?;
    let mut row = vec![0.0; width];
    for frame in rows.chunks_exact(width) {
        for (dst, v) in row.iter_mut().zip(frame) {
            *dst = v.to_f64();
        }
        write_csv_row(&mut out, &row)?;
    }
    out.close().context("failed to finalize output")?;
    Ok(())
}
