//! 構成パラメータ
//!
//! 幅・系列長・シードなどの静的な構成値。TOML / JSON から読めるよう
//! serde に対応し、構築前に `validate()` で検査する。
//! 型（ビット幅）に依存する検査は各構築関数側で行う。

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult, ensure_nonzero};
use crate::fixed::{Overflow, Rounding};
use crate::gaussian::check_samples;
use crate::recurrent::{ActivationKind, DenseStrategy};

fn default_n_elem() -> usize {
    64
}

fn default_n_samples() -> usize {
    4
}

fn default_seed() -> u32 {
    42
}

fn default_table_size() -> usize {
    1024
}

fn default_table_rounding() -> Rounding {
    Rounding::Convergent
}

fn default_table_overflow() -> Overflow {
    Overflow::Saturate
}

fn default_activation() -> ActivationKind {
    ActivationKind::Tanh
}

fn default_recurrent_activation() -> ActivationKind {
    ActivationKind::Sigmoid
}

/// テーブルサイズの検査（2 のべき乗かつ 2 以上）
fn check_table_size(table_size: usize) -> ConfigResult<()> {
    if table_size < 2 || !table_size.is_power_of_two() {
        return Err(ConfigError::TableSizeNotPowerOfTwo(table_size));
    }
    Ok(())
}

// =============================================================================
// exp-half テーブル
// =============================================================================

/// `exp(0.5 * x)` テーブル段の構成
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpHalfConfig {
    /// チャネル数
    #[serde(default = "default_n_elem")]
    pub n_elem: usize,
    /// エントリ数（2 のべき乗）
    #[serde(default = "default_table_size")]
    pub table_size: usize,
    /// 格納時の丸め
    #[serde(default = "default_table_rounding")]
    pub rounding: Rounding,
    /// 格納時のあふれ処理
    #[serde(default = "default_table_overflow")]
    pub overflow: Overflow,
}

impl Default for ExpHalfConfig {
    fn default() -> Self {
        Self {
            n_elem: default_n_elem(),
            table_size: default_table_size(),
            rounding: default_table_rounding(),
            overflow: default_table_overflow(),
        }
    }
}

impl ExpHalfConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        ensure_nonzero(self.n_elem, "exp-half channel count")?;
        check_table_size(self.table_size)
    }
}

// =============================================================================
// サンプラー
// =============================================================================

/// リパラメータ化サンプラーの構成
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerConfig {
    /// 潜在次元（チャネル数 M）
    #[serde(default = "default_n_elem")]
    pub n_elem: usize,
    /// 1 個の正規乱数に使う一様乱数の数 K
    #[serde(default = "default_n_samples")]
    pub n_samples: usize,
    /// トップレベルシード（0 不可）
    #[serde(default = "default_seed")]
    pub seed: u32,
    /// exp テーブルのエントリ数
    #[serde(default = "default_table_size")]
    pub table_size: usize,
    #[serde(default = "default_table_rounding")]
    pub table_rounding: Rounding,
    #[serde(default = "default_table_overflow")]
    pub table_overflow: Overflow,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            n_elem: default_n_elem(),
            n_samples: default_n_samples(),
            seed: default_seed(),
            table_size: default_table_size(),
            table_rounding: default_table_rounding(),
            table_overflow: default_table_overflow(),
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.seed == 0 {
            return Err(ConfigError::ZeroSeed);
        }
        ensure_nonzero(self.n_elem, "sampler channel count")?;
        check_samples(self.n_samples)?;
        check_table_size(self.table_size)
    }

    /// 内部で使う exp テーブルの構成
    pub fn exp_half(&self) -> ExpHalfConfig {
        ExpHalfConfig {
            n_elem: self.n_elem,
            table_size: self.table_size,
            rounding: self.table_rounding,
            overflow: self.table_overflow,
        }
    }
}

// =============================================================================
// GRU
// =============================================================================

/// GRU スタックの構成
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GruConfig {
    /// 入力チャネル数
    pub n_in: usize,
    /// 隠れ状態の次元
    pub n_state: usize,
    /// 系列長 T
    pub n_sequence: usize,
    /// true なら毎ステップの隠れ状態を出力、false なら最終状態のみ
    #[serde(default)]
    pub return_sequences: bool,
    /// 初期状態ストリームを受け取るか
    #[serde(default)]
    pub use_initial_state: bool,
    #[serde(default = "default_activation")]
    pub activation: ActivationKind,
    #[serde(default = "default_recurrent_activation")]
    pub recurrent_activation: ActivationKind,
    /// 全結合の計算方式
    #[serde(default)]
    pub strategy: DenseStrategy,
}

impl GruConfig {
    /// 既定のアクティベーションで構成を作る
    pub fn new(n_in: usize, n_state: usize, n_sequence: usize) -> Self {
        Self {
            n_in,
            n_state,
            n_sequence,
            return_sequences: false,
            use_initial_state: false,
            activation: default_activation(),
            recurrent_activation: default_recurrent_activation(),
            strategy: DenseStrategy::default(),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        ensure_nonzero(self.n_in, "gru input width")?;
        ensure_nonzero(self.n_state, "gru state width")?;
        if self.n_sequence == 0 {
            return Err(ConfigError::ZeroSequence);
        }
        // 入力側・再帰側の両方の全結合で範囲内であること
        self.strategy.validate(self.n_in, 3 * self.n_state)?;
        self.strategy.validate(self.n_state, 3 * self.n_state)
    }

    /// 出力フレーム数（`return_sequences` なら T、そうでなければ 1）
    pub fn n_sequence_out(&self) -> usize {
        if self.return_sequences { self.n_sequence } else { 1 }
    }
}

// =============================================================================
// 双方向 GRU
// =============================================================================

/// 双方向 GRU の構成（順方向・逆方向で共通）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BidirectionalConfig {
    pub n_in: usize,
    /// 片方向あたりの隠れ状態の次元（出力は 2 倍）
    pub n_state: usize,
    pub n_sequence: usize,
    #[serde(default = "default_activation")]
    pub activation: ActivationKind,
    #[serde(default = "default_recurrent_activation")]
    pub recurrent_activation: ActivationKind,
    #[serde(default)]
    pub strategy: DenseStrategy,
    /// 順方向と逆方向で異なる reuse factor を使う場合の逆方向側
    #[serde(default)]
    pub backward_strategy: Option<DenseStrategy>,
}

impl BidirectionalConfig {
    pub fn new(n_in: usize, n_state: usize, n_sequence: usize) -> Self {
        Self {
            n_in,
            n_state,
            n_sequence,
            activation: default_activation(),
            recurrent_activation: default_recurrent_activation(),
            strategy: DenseStrategy::default(),
            backward_strategy: None,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.forward().validate()?;
        self.backward().validate()
    }

    /// 出力チャネル数 `2 * n_state`
    pub fn n_out(&self) -> usize {
        2 * self.n_state
    }

    /// 順方向スタックの構成
    pub fn forward(&self) -> GruConfig {
        GruConfig {
            activation: self.activation,
            recurrent_activation: self.recurrent_activation,
            strategy: self.strategy,
            ..GruConfig::new(self.n_in, self.n_state, self.n_sequence)
        }
    }

    /// 逆方向スタックの構成
    pub fn backward(&self) -> GruConfig {
        GruConfig {
            strategy: self.backward_strategy.unwrap_or(self.strategy),
            ..self.forward()
        }
    }
}
