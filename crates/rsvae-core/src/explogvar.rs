//! exp(0.5 * x) ルックアップテーブル
//!
//! 対数分散 `logvar` を標準偏差 `exp(0.5 * logvar)` に変換する。
//!
//! テーブルのインデックスは入力値の上位 `N = log2(table_size)` bit そのもの。
//! エントリ `i` は「上位 N bit が `i`、下位 bit がすべて 0」の値に対する
//! `exp(0.5 * x)` を保持する。上位 bit の切り出しは切り捨てなので、
//! 参照結果はバケットの下端に偏る（誤差はインデックス量子化のみ）。
//!
//! テーブルは構築時に 1 回だけ計算し、以後は読み取り専用で値として保持する。

use std::marker::PhantomData;

use crate::config::ExpHalfConfig;
use crate::error::{ConfigError, ConfigResult, ensure_nonzero};
use crate::fixed::{FixedPoint, Overflow, Rounding};
use crate::stream::{ChannelStream, assert_bank_width, read_frame};

/// 浮動小数点での `exp(0.5 * x)`
#[inline]
pub fn exp_half(x: f64) -> f64 {
    (0.5 * x).exp()
}

/// `table_size` 個のエントリを指すのに必要なインデックスビット数
pub const fn index_bits_for(table_size: usize) -> u32 {
    if table_size <= 1 {
        0
    } else {
        usize::BITS - (table_size - 1).leading_zeros()
    }
}

/// `exp(0.5 * x)` テーブル
///
/// - `D`: 定義域（インデックスの元になる入力）の型
/// - `E`: テーブル値の型
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpHalfTable<D, E> {
    table: Box<[E]>,
    index_bits: u32,
    _marker: PhantomData<D>,
}

impl<D: FixedPoint, E: FixedPoint> ExpHalfTable<D, E> {
    /// テーブルを構築（値は最近接丸め + 飽和で格納）
    pub fn new(table_size: usize) -> ConfigResult<Self> {
        Self::with_quantization(table_size, Rounding::Convergent, Overflow::Saturate)
    }

    /// 設定から構築
    pub fn from_config(config: &ExpHalfConfig) -> ConfigResult<Self> {
        Self::with_quantization(config.table_size, config.rounding, config.overflow)
    }

    /// 格納時の量子化モードを指定して構築
    pub fn with_quantization(
        table_size: usize,
        rounding: Rounding,
        overflow: Overflow,
    ) -> ConfigResult<Self> {
        if table_size < 2 || !table_size.is_power_of_two() {
            return Err(ConfigError::TableSizeNotPowerOfTwo(table_size));
        }
        let index_bits = index_bits_for(table_size);
        if index_bits > D::WIDTH {
            return Err(ConfigError::TableIndexTooWide {
                index_bits,
                domain_bits: D::WIDTH,
            });
        }

        let mut this = Self {
            table: vec![E::default(); table_size].into_boxed_slice(),
            index_bits,
            _marker: PhantomData,
        };
        for i in 0..table_size {
            let x = this.value_from_index(i);
            this.table[i] = E::from_f64_with(exp_half(x), rounding, overflow);
        }

        log::debug!(
            "exp-half table built: {table_size} entries, {index_bits} index bits over a {}-bit domain",
            D::WIDTH
        );
        Ok(this)
    }

    /// インデックスのビット数 N
    #[inline]
    pub fn index_bits(&self) -> u32 {
        self.index_bits
    }

    /// エントリ数
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// 常に false（エントリ数は 2 以上）
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// 全エントリ
    pub fn entries(&self) -> &[E] {
        &self.table
    }

    /// インデックス `i` が表す代表値（上位 N bit が `i`、残りは 0）
    #[inline]
    pub fn value_from_index(&self, i: usize) -> f64 {
        let shift = D::WIDTH - self.index_bits;
        D::from_raw((i as i64) << shift).to_f64()
    }

    /// 入力の上位 N bit を符号なしインデックスとして取り出す（切り捨て）
    #[inline]
    pub fn index_from_value(&self, x: D) -> usize {
        let shift = D::WIDTH - self.index_bits;
        ((x.raw() as u64) >> shift) as usize & (self.table.len() - 1)
    }

    /// `exp(0.5 * x)` を参照
    #[inline]
    pub fn lookup(&self, x: D) -> E {
        self.table[self.index_from_value(x)]
    }
}

/// 対数分散ストリームを標準偏差ストリームに変換する段
#[derive(Debug, Clone)]
pub struct ExpLogVar<D, E> {
    n_elem: usize,
    table: ExpHalfTable<D, E>,
}

impl<D: FixedPoint, E: FixedPoint> ExpLogVar<D, E> {
    /// 設定から構築
    pub fn new(config: &ExpHalfConfig) -> ConfigResult<Self> {
        config.validate()?;
        ensure_nonzero(config.n_elem, "exp-half channel count")?;
        Ok(Self {
            n_elem: config.n_elem,
            table: ExpHalfTable::from_config(config)?,
        })
    }

    /// チャネル数
    pub fn n_elem(&self) -> usize {
        self.n_elem
    }

    /// テーブル
    pub fn table(&self) -> &ExpHalfTable<D, E> {
        &self.table
    }

    /// 全チャネルから 1 要素ずつ読み、`exp(0.5 * x)` を書き出す
    pub fn process(&self, data: &mut [ChannelStream<D>], res: &mut [ChannelStream<E>]) {
        assert_bank_width(data, self.n_elem, "exp-half input");
        assert_bank_width(res, self.n_elem, "exp-half output");

        let frame = read_frame(data);
        for (x, out) in frame.into_iter().zip(res.iter_mut()) {
            out.write(self.table.lookup(x));
        }
    }
}
