//! GRU セル（1 ステップ分の状態更新）
//!
//! ゲート順は z（更新）, r（リセット）, h（候補）。再帰側のバイアスは
//! リセットゲートを掛ける前に加える（reset-after 形式）。
//!
//! ```text
//! Wx = W·x + b,  Uh = U·h + b_r
//! z  = ra(Wx_z + Uh_z)
//! r  = ra(Wx_r + Uh_r)
//! h~ = a(Wx_h + r * Uh_h)
//! h' = (1 - z) * h~ + z * h
//! ```

use serde::{Deserialize, Serialize};

use crate::config::GruConfig;
use crate::error::{ConfigError, ConfigResult, ensure_width};

use super::activation::ActivationKind;
use super::dense::DenseKernel;

/// GRU の重み
///
/// 行列は行優先で、入力 `i` から出力 `j`（`0..3 * n_state`）への重みが
/// `[i * 3 * n_state + j]` にある。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GruWeights {
    pub n_in: usize,
    pub n_state: usize,
    /// `n_in x 3n`
    pub kernel: Vec<f64>,
    /// `n_state x 3n`
    pub recurrent_kernel: Vec<f64>,
    /// `3n`
    pub bias: Vec<f64>,
    /// `3n`
    pub recurrent_bias: Vec<f64>,
}

impl GruWeights {
    /// すべて 0 の重み
    pub fn zeros(n_in: usize, n_state: usize) -> Self {
        let n3 = 3 * n_state;
        Self {
            n_in,
            n_state,
            kernel: vec![0.0; n_in * n3],
            recurrent_kernel: vec![0.0; n_state * n3],
            bias: vec![0.0; n3],
            recurrent_bias: vec![0.0; n3],
        }
    }

    /// 各配列の要素数を検査
    pub fn validate(&self) -> ConfigResult<()> {
        let n3 = 3 * self.n_state;
        let shapes = [
            ("kernel", self.n_in * n3, self.kernel.len()),
            ("recurrent_kernel", self.n_state * n3, self.recurrent_kernel.len()),
            ("bias", n3, self.bias.len()),
            ("recurrent_bias", n3, self.recurrent_bias.len()),
        ];
        for (name, expected, actual) in shapes {
            if expected != actual {
                return Err(ConfigError::WeightShape {
                    name,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}

/// GRU セル
#[derive(Debug)]
pub struct GruCell {
    weights: GruWeights,
    activation: ActivationKind,
    recurrent_activation: ActivationKind,
    input_dense: Box<dyn DenseKernel>,
    recurrent_dense: Box<dyn DenseKernel>,
}

impl GruCell {
    /// 構成と重みから生成（次元が一致しない場合はエラー）
    pub fn new(config: &GruConfig, weights: GruWeights) -> ConfigResult<Self> {
        config.validate()?;
        ensure_width("gru weight input", config.n_in, weights.n_in)?;
        ensure_width("gru weight state", config.n_state, weights.n_state)?;
        weights.validate()?;

        let n3 = 3 * config.n_state;
        Ok(Self {
            input_dense: config.strategy.build(config.n_in, n3)?,
            recurrent_dense: config.strategy.build(config.n_state, n3)?,
            weights,
            activation: config.activation,
            recurrent_activation: config.recurrent_activation,
        })
    }

    pub fn n_in(&self) -> usize {
        self.weights.n_in
    }

    pub fn n_state(&self) -> usize {
        self.weights.n_state
    }

    pub fn weights(&self) -> &GruWeights {
        &self.weights
    }

    /// 入力 `x` で隠れ状態 `h` を 1 ステップ更新する
    pub fn step(&self, x: &[f64], h: &mut [f64]) {
        let n = self.weights.n_state;
        debug_assert_eq!(x.len(), self.weights.n_in);
        debug_assert_eq!(h.len(), n);

        let mut wx = vec![0.0; 3 * n];
        let mut uh = vec![0.0; 3 * n];
        self.input_dense
            .apply(x, &self.weights.kernel, &self.weights.bias, &mut wx);
        self.recurrent_dense
            .apply(h, &self.weights.recurrent_kernel, &self.weights.recurrent_bias, &mut uh);

        for j in 0..n {
            let z = self.recurrent_activation.apply(wx[j] + uh[j]);
            let r = self.recurrent_activation.apply(wx[n + j] + uh[n + j]);
            let cand = self.activation.apply(wx[2 * n + j] + r * uh[2 * n + j]);
            h[j] = (1.0 - z) * cand + z * h[j];
        }
    }
}
