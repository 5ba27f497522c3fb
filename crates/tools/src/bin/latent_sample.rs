//! リパラメータ化サンプラーの動作確認ツール
//!
//! 一定の平均・対数分散を全チャネルに与えて `--cycles` 回サンプリングし、
//! チャネル群ごとの経験平均・標準偏差を期待値と並べてログに出す。
//!
//! # 使用例
//!
//! ```shell
//! cargo run -p tools --release --bin latent_sample -- \
//!   --cycles 100000 --mean 0.5 --logvar -1.0 --output samples.csv.gz
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use rsvae_core::aliases::{DefaultSampler, DefaultT};
use rsvae_core::explogvar::exp_half;
use rsvae_core::{FixedPoint, SamplerConfig, channel_bank, read_frame, write_frame};
use tools::common::io::{open_writer, write_csv_row};
use tools::config::PipelineFile;

#[derive(Parser, Debug)]
#[command(name = "latent_sample")]
#[command(about = "mean + N(0,1) * exp(0.5 * logvar) を固定小数点でサンプリングする")]
struct Cli {
    /// パイプライン構成ファイル（[sampler] セクションを使う）
    #[arg(long)]
    config: Option<PathBuf>,

    /// チャネル数（構成ファイルより優先）
    #[arg(long)]
    n_elem: Option<usize>,
    /// 1 サンプルあたりの一様乱数の数（構成ファイルより優先、既定の NoiseT では 5 以下）
    /// 1 サンプルあたりの一様乱数の数（構成ファイルより優先）
    #[arg(long)]
    n_samples: Option<usize>,

    /// シード（構成ファイルより優先）
    #[arg(long)]
    seed: Option<u32>,

    /// サンプリング回数
    #[arg(long, default_value_t = 10_000)]
    cycles: usize,

    /// 全チャネル共通の平均
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    mean: f64,

    /// 全チャネル共通の対数分散
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    logvar: f64,

    /// 統計をまとめるチャネル数
    #[arg(long, default_value_t = 8)]
    group: usize,

    /// サンプルの CSV 出力先（.gz 対応、- で標準出力）
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn sampler_config(cli: &Cli) -> Result<SamplerConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineFile::load(path)?.sampler.unwrap_or_default(),
        None => SamplerConfig::default(),
    };
    if let Some(n) = cli.n_elem {
        config.n_elem = n;
    }
    if let Some(k) = cli.n_samples {
        config.n_samples = k;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    config.validate().context("sampler configuration")?;
    Ok(config)
}

/// チャネルごとの和と二乗和
struct Moments {
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
    n: usize,
}

impl Moments {
    fn new(width: usize) -> Self {
        Self {
            sum: vec![0.0; width],
            sum_sq: vec![0.0; width],
            n: 0,
        }
    }

    fn push(&mut self, frame: &[f64]) {
        for (j, &v) in frame.iter().enumerate() {
            self.sum[j] += v;
            self.sum_sq[j] += v * v;
        }
        self.n += 1;
    }

    /// `range` のチャネルをまとめた平均と標準偏差
    fn group(&self, range: std::ops::Range<usize>) -> (f64, f64) {
        let count = (range.len() * self.n) as f64;
        let sum: f64 = self.sum[range.clone()].iter().sum();
        let sum_sq: f64 = self.sum_sq[range].iter().sum();
        let mean = sum / count;
        let var = (sum_sq / count - mean * mean).max(0.0);
        (mean, var.sqrt())
    }
}

fn main() -> Result<()> {
    tools::init_logger();
    let cli = Cli::parse();
    let config = sampler_config(&cli)?;
    let n = config.n_elem;

    let mut sampler = DefaultSampler::new(&config)?;
    let mean_q = DefaultT::from_f64(cli.mean);
    let logvar_q = DefaultT::from_f64(cli.logvar);
    let table_std = sampler.table().lookup(logvar_q).to_f64();

    info!(
        "sampling {} cycles: n_elem={}, K={}, seed={}, mean={}, logvar={}",
        cli.cycles, n, config.n_samples, config.seed, mean_q, logvar_q
    );

    let mut writer = cli.output.as_ref().map(open_writer).transpose().context("failed to open output")?;

    let mut mean_s = channel_bank::<DefaultT>(n);
    let mut logvar_s = channel_bank::<DefaultT>(n);
    let mut res = channel_bank::<DefaultT>(n);
    let mut moments = Moments::new(n);
    let mut row = vec![0.0; n];

    for _ in 0..cli.cycles {
        write_frame(&mut mean_s, &vec![mean_q; n]);
        write_frame(&mut logvar_s, &vec![logvar_q; n]);
        sampler.sample(&mut mean_s, &mut logvar_s, &mut res);

        for (dst, v) in row.iter_mut().zip(read_frame(&mut res)) {
            *dst = v.to_f64();
        }
        moments.push(&row);
        if let Some(w) = writer.as_mut() {
            write_csv_row(w, &row)?;
        }
    }

    if let Some(w) = writer {
        w.close().context("failed to finalize output")?;
    }

    if cli.cycles == 0 {
        return Ok(());
    }

    info!(
        "expected: mean={:.4}, std={:.4} (table {:.4})",
        mean_q.to_f64(),
        exp_half(logvar_q.to_f64()),
        table_std
    );
    let group = cli.group.max(1);
    for start in (0..n).step_by(group) {
        let range = start..(start + group).min(n);
        let label = format!("ch {:>3}..{:<3}", range.start, range.end);
        let (m, s) = moments.group(range);
        info!("{label} mean={m:+.4} std={s:.4}");
    }
    let (m, s) = moments.group(0..n);
    info!("all        mean={m:+.4} std={s:.4}");

    Ok(())
}
