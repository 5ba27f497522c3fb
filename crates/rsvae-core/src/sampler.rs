//! リパラメータ化サンプラー
//!
//! M チャネルの平均 `mean` と対数分散 `logvar` から
//! `z = mean + rnd * exp(0.5 * logvar)` を 1 フレームずつ生成する。
//!
//! 1 回の呼び出しで全チャネルをまとめて処理する。入力がそろっていなければ
//! 何も消費せずに panic し、一部のチャネルだけを出力することはない。
//! 乱数生成器はサンプラーが所有し、呼び出しごとに 1 ステップ進む。

use crate::config::SamplerConfig;
use crate::error::{ConfigResult, ensure_nonzero, ensure_width};
use crate::explogvar::ExpHalfTable;
use crate::fixed::{FixedPoint, mul_add};
use crate::gaussian::GaussianArray;
use crate::stream::{ChannelStream, assert_bank_width, assert_frame_ready, read_frame};

/// リパラメータ化サンプラー
///
/// - `L`: 対数分散の型（exp テーブルの定義域）
/// - `E`: exp テーブル値（標準偏差）の型
/// - `N`: 正規乱数の型
#[derive(Debug, Clone)]
pub struct ReparamSampler<L, E, N> {
    n_elem: usize,
    table: ExpHalfTable<L, E>,
    gaussian: GaussianArray<N>,
    rnd: Vec<N>,
}

impl<L: FixedPoint, E: FixedPoint, N: FixedPoint> ReparamSampler<L, E, N> {
    /// 構成のシードから乱数生成器も作る
    pub fn new(config: &SamplerConfig) -> ConfigResult<Self> {
        config.validate()?;
        let gaussian = GaussianArray::new(config.seed, config.n_elem, config.n_samples)?;
        Self::with_generator(config, gaussian)
    }

    /// 外部で作った乱数生成器を使う
    ///
    /// 生成器の幅が `n_elem` と異なる場合は `ChannelMismatch`。
    pub fn with_generator(config: &SamplerConfig, gaussian: GaussianArray<N>) -> ConfigResult<Self> {
        config.validate()?;
        ensure_width("gaussian generator", config.n_elem, gaussian.width())?;
        let table = ExpHalfTable::from_config(&config.exp_half())?;
        log::debug!(
            "reparam sampler: {} channels, K={}, table={} entries",
            config.n_elem,
            gaussian.n_samples(),
            table.len()
        );
        Ok(Self {
            n_elem: config.n_elem,
            table,
            gaussian,
            rnd: vec![N::default(); config.n_elem],
        })
    }

    /// 1 フレームの要素数 M
    pub fn n_elem(&self) -> usize {
        self.n_elem
    }

    /// `exp(0.5 * logvar)` の参照テーブル
    pub fn table(&self) -> &ExpHalfTable<L, E> {
        &self.table
    }

    /// 内部の正規乱数生成器（状態は呼び出しをまたいで保持される）
    pub fn generator(&self) -> &GaussianArray<N> {
        &self.gaussian
    }

    /// 直前の呼び出しで使った正規乱数
    pub fn last_noise(&self) -> &[N] {
        &self.rnd
    }

    /// スライス版: 1 フレーム分の `mean + rnd * exp(0.5 * logvar)` を `out` に書く
    ///
    /// # Panics
    ///
    /// いずれかのスライス長が `n_elem` と異なる場合。
    #[track_caller]
    pub fn sample_frame<Mn: FixedPoint, R: FixedPoint>(&mut self, mean: &[Mn], logvar: &[L], out: &mut [R]) {
        assert_eq!(mean.len(), self.n_elem, "mean frame width");
        assert_eq!(logvar.len(), self.n_elem, "logvar frame width");
        assert_eq!(out.len(), self.n_elem, "output frame width");

        self.gaussian.next(&mut self.rnd);
        for j in 0..self.n_elem {
            let std = self.table.lookup(logvar[j]);
            out[j] = mul_add(mean[j], self.rnd[j], std);
        }
    }

    /// ストリーム版: 平均・対数分散から 1 フレームずつ読み、結果を 1 フレーム書く
    #[track_caller]
    pub fn sample<Mn: FixedPoint, R: FixedPoint>(
        &mut self,
        mean: &mut [ChannelStream<Mn>],
        logvar: &mut [ChannelStream<L>],
        res: &mut [ChannelStream<R>],
    ) {
        assert_bank_width(mean, self.n_elem, "sampler mean");
        assert_bank_width(logvar, self.n_elem, "sampler logvar");
        assert_bank_width(res, self.n_elem, "sampler output");
        assert_frame_ready(mean);
        assert_frame_ready(logvar);

        let m = read_frame(mean);
        let lv = read_frame(logvar);
        let mut out = vec![R::default(); self.n_elem];
        self.sample_frame(&m, &lv, &mut out);
        for (s, v) in res.iter_mut().zip(out) {
            s.write(v);
        }
    }
}

/// 正規乱数だけを出力する段
///
/// 入力フレームは 1 個消費するが値は使わない（生成のタイミングだけを決める）。
#[derive(Debug, Clone)]
pub struct GaussianNoise<N> {
    gaussian: GaussianArray<N>,
}

impl<N: FixedPoint> GaussianNoise<N> {
    /// シード、チャネル数 M、和のサンプル数 K から生成
    ///
    /// 制約は [`GaussianArray::new`] と同じ。
    pub fn new(seed: u32, n_elem: usize, n_samples: usize) -> ConfigResult<Self> {
        ensure_nonzero(n_elem, "noise channel count")?;
        Ok(Self {
            gaussian: GaussianArray::new(seed, n_elem, n_samples)?,
        })
    }

    /// サンプラと同じ設定から生成（同じシードなら同じ乱数列になる）
    pub fn from_config(config: &SamplerConfig) -> ConfigResult<Self> {
        Self::new(config.seed, config.n_elem, config.n_samples)
    }

    /// チャネル数 M
    pub fn n_elem(&self) -> usize {
        self.gaussian.width()
    }

    /// 入力から 1 フレーム読み捨て、正規乱数を 1 フレーム書く
    ///
    /// # Panics
    ///
    /// バンク幅が M と異なる場合、または入力フレームがまだ揃っていない場合。
    #[track_caller]
    pub fn process<D>(&mut self, data: &mut [ChannelStream<D>], res: &mut [ChannelStream<N>]) {
        let n = self.gaussian.width();
        assert_bank_width(data, n, "noise input");
        assert_bank_width(res, n, "noise output");

        read_frame(data);
        for (s, v) in res.iter_mut().zip(self.gaussian.next_vec()) {
            s.write(v);
        }
    }
}
