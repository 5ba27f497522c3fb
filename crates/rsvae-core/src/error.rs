//! 構築時エラー
//!
//! 静的に構成されるパイプラインなので、失敗はすべて構築時に検出する。
//! ストリーム枯渇のような実行時の前提違反はここには含めず panic で扱う。

/// 構成エラー
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// シードが 0（xorshift の吸収不動点）
    #[error("seed must be non-zero (0 is a fixed point of xorshift)")]
    ZeroSeed,

    /// 幅・要素数が 0
    #[error("{what} must be at least 1")]
    ZeroWidth { what: &'static str },

    /// 系列長が 0
    #[error("sequence length must be at least 1")]
    ZeroSequence,

    /// チャネル幅の不一致
    #[error("{what} width mismatch: expected {expected}, got {actual}")]
    ChannelMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// テーブルサイズが 2 のべき乗でない
    #[error("table size must be a power of two >= 2, got {0}")]
    TableSizeNotPowerOfTwo(usize),

    /// テーブルのインデックスビット数が定義域の型幅を超える
    #[error("table index needs {index_bits} bits but the domain type has only {domain_bits}")]
    TableIndexTooWide { index_bits: u32, domain_bits: u32 },

    /// 一様乱数の和を保持するアキュムレータが 64 bit に収まらない
    #[error("accumulator for {n_samples} samples needs {required_bits} bits (max 64)")]
    AccumulatorTooNarrow { n_samples: usize, required_bits: u32 },

    /// 正規乱数の値域 ±sqrt(3K) が出力型の整数部に収まらない
    #[error("sum of {n_samples} samples reaches ±sqrt(3 * {n_samples}), beyond a noise type with {int_bits} integer bits")]
    NoiseRangeTooNarrow { n_samples: usize, int_bits: u32 },

    /// 重み配列の形状不一致
    #[error("weight `{name}` has {actual} elements, expected {expected}")]
    WeightShape {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    /// reuse factor が範囲外
    #[error("reuse factor {reuse_factor} out of range 1..={max}")]
    InvalidReuseFactor { reuse_factor: usize, max: usize },
}

/// 構築処理の Result 型
pub type ConfigResult<T> = Result<T, ConfigError>;

/// 0 でないことを確認する
pub(crate) fn ensure_nonzero(value: usize, what: &'static str) -> ConfigResult<()> {
    if value == 0 {
        Err(ConfigError::ZeroWidth { what })
    } else {
        Ok(())
    }
}

/// 幅が一致することを確認する
pub(crate) fn ensure_width(what: &'static str, expected: usize, actual: usize) -> ConfigResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ConfigError::ChannelMismatch {
            what,
            expected,
            actual,
        })
    }
}
