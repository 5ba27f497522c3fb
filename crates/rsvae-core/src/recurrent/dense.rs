//! 全結合（dense）カーネル
//!
//! `output[j] = biases[j] + Σ_i input[i] * weights[i * n_out + j]`
//!
//! 計算方式は 2 種類。結果は数学的に同じで、加算順序だけが異なる。
//!
//! | 方式 | 累積順 |
//! |------|-------|
//! | `LatencyDense` | 出力ごとに全入力を足し込む |
//! | `ResourceDense` | 重みインデックスを `reuse_factor` 刻みで走査する |

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult, ensure_nonzero, ensure_width};
use crate::fixed::FixedPoint;
use crate::stream::{ChannelStream, assert_bank_width, read_frame};

/// 全結合カーネルのインターフェース
///
/// `weights.len() == input.len() * output.len()`、
/// `biases.len() == output.len()` を呼び出し側が保証する。
pub trait DenseKernel: fmt::Debug + Send + Sync {
    fn apply(&self, input: &[f64], weights: &[f64], biases: &[f64], output: &mut [f64]);
}

// =============================================================================
// Latency
// =============================================================================

/// 出力ごとに累積する方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencyDense;

impl DenseKernel for LatencyDense {
    #[inline]
    fn apply(&self, input: &[f64], weights: &[f64], biases: &[f64], output: &mut [f64]) {
        let n_out = output.len();
        debug_assert_eq!(weights.len(), input.len() * n_out);
        debug_assert_eq!(biases.len(), n_out);

        for (j, out) in output.iter_mut().enumerate() {
            let mut acc = biases[j];
            for (i, &x) in input.iter().enumerate() {
                acc += x * weights[i * n_out + j];
            }
            *out = acc;
        }
    }
}

// =============================================================================
// Resource
// =============================================================================

/// 重みを `reuse_factor` 本のストライド列に分けて累積する方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDense {
    reuse_factor: usize,
}

impl ResourceDense {
    /// `1 <= reuse_factor <= n_in * n_out` であること
    pub fn new(reuse_factor: usize, n_in: usize, n_out: usize) -> ConfigResult<Self> {
        let max = n_in * n_out;
        if reuse_factor == 0 || reuse_factor > max {
            return Err(ConfigError::InvalidReuseFactor { reuse_factor, max });
        }
        Ok(Self { reuse_factor })
    }

    pub fn reuse_factor(&self) -> usize {
        self.reuse_factor
    }
}

impl DenseKernel for ResourceDense {
    fn apply(&self, input: &[f64], weights: &[f64], biases: &[f64], output: &mut [f64]) {
        let n_out = output.len();
        debug_assert_eq!(weights.len(), input.len() * n_out);
        debug_assert_eq!(biases.len(), n_out);

        output.copy_from_slice(biases);
        for ir in 0..self.reuse_factor {
            for w in (ir..weights.len()).step_by(self.reuse_factor) {
                output[w % n_out] += input[w / n_out] * weights[w];
            }
        }
    }
}

// =============================================================================
// 方式の選択
// =============================================================================

/// 構成ファイルで指定する計算方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DenseStrategy {
    #[default]
    Latency,
    Resource { reuse_factor: usize },
}

impl DenseStrategy {
    /// `n_in` x `n_out` の全結合に使えるか検査
    pub fn validate(&self, n_in: usize, n_out: usize) -> ConfigResult<()> {
        match *self {
            Self::Latency => Ok(()),
            Self::Resource { reuse_factor } => ResourceDense::new(reuse_factor, n_in, n_out).map(|_| ()),
        }
    }

    /// カーネルを生成
    pub fn build(&self, n_in: usize, n_out: usize) -> ConfigResult<Box<dyn DenseKernel>> {
        Ok(match *self {
            Self::Latency => Box::new(LatencyDense),
            Self::Resource { reuse_factor } => Box::new(ResourceDense::new(reuse_factor, n_in, n_out)?),
        })
    }
}

// =============================================================================
// ストリーム段
// =============================================================================

/// 全結合のストリーム段（1 呼び出しで 1 フレーム）
#[derive(Debug)]
pub struct Dense<D, R> {
    n_in: usize,
    n_out: usize,
    weights: Vec<f64>,
    biases: Vec<f64>,
    kernel: Box<dyn DenseKernel>,
    _marker: PhantomData<(D, R)>,
}

impl<D: FixedPoint, R: FixedPoint> Dense<D, R> {
    pub fn new(
        n_in: usize,
        n_out: usize,
        weights: Vec<f64>,
        biases: Vec<f64>,
        strategy: DenseStrategy,
    ) -> ConfigResult<Self> {
        ensure_nonzero(n_in, "dense input width")?;
        ensure_nonzero(n_out, "dense output width")?;
        if weights.len() != n_in * n_out {
            return Err(ConfigError::WeightShape {
                name: "dense weights",
                expected: n_in * n_out,
                actual: weights.len(),
            });
        }
        ensure_width("dense bias", n_out, biases.len())?;
        let kernel = strategy.build(n_in, n_out)?;
        Ok(Self {
            n_in,
            n_out,
            weights,
            biases,
            kernel,
            _marker: PhantomData,
        })
    }

    /// 1 フレーム読み、全結合の結果を書き出す
    pub fn process(&self, data: &mut [ChannelStream<D>], res: &mut [ChannelStream<R>]) {
        assert_bank_width(data, self.n_in, "dense input");
        assert_bank_width(res, self.n_out, "dense output");

        let input: Vec<f64> = read_frame(data).into_iter().map(FixedPoint::to_f64).collect();
        let mut output = vec![0.0; self.n_out];
        self.kernel.apply(&input, &self.weights, &self.biases, &mut output);
        for (y, out) in output.into_iter().zip(res.iter_mut()) {
            out.write(R::from_f64(y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fixed;
    use crate::stream::{channel_bank, write_frame};
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn random_layer(rng: &mut Xoshiro256PlusPlus, n_in: usize, n_out: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let input = (0..n_in).map(|_| rng.random_range(-1.0..1.0)).collect();
        let weights = (0..n_in * n_out).map(|_| rng.random_range(-1.0..1.0)).collect();
        let biases = (0..n_out).map(|_| rng.random_range(-1.0..1.0)).collect();
        (input, weights, biases)
    }

    #[test]
    fn test_latency_small_example() {
        // 2 入力 x 3 出力
        let input = [1.0, 2.0];
        let weights = [1.0, 0.0, -1.0, 0.5, 1.0, 2.0];
        let biases = [0.0, 1.0, 0.5];
        let mut out = [0.0; 3];
        LatencyDense.apply(&input, &weights, &biases, &mut out);
        assert_eq!(out, [2.0, 3.0, 3.5]);
    }

    #[test]
    fn test_resource_matches_latency() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let (n_in, n_out) = (5, 6);
        let (input, weights, biases) = random_layer(&mut rng, n_in, n_out);

        let mut expected = vec![0.0; n_out];
        LatencyDense.apply(&input, &weights, &biases, &mut expected);

        for rf in [1, 2, 3, 7, n_in * n_out] {
            let kernel = ResourceDense::new(rf, n_in, n_out).unwrap();
            let mut got = vec![0.0; n_out];
            kernel.apply(&input, &weights, &biases, &mut got);
            for (g, e) in got.iter().zip(&expected) {
                assert!((g - e).abs() < 1e-12, "reuse_factor={rf}");
            }
        }
    }

    #[test]
    fn test_invalid_reuse_factor() {
        assert_eq!(
            ResourceDense::new(0, 2, 3).unwrap_err(),
            ConfigError::InvalidReuseFactor { reuse_factor: 0, max: 6 }
        );
        assert!(ResourceDense::new(7, 2, 3).is_err());
        assert!(DenseStrategy::Resource { reuse_factor: 7 }.build(2, 3).is_err());
        assert!(DenseStrategy::Latency.validate(2, 3).is_ok());
    }

    #[test]
    fn test_strategy_serde() {
        let s: DenseStrategy = serde_json::from_str(r#"{"kind": "resource", "reuse_factor": 4}"#).unwrap();
        assert_eq!(s, DenseStrategy::Resource { reuse_factor: 4 });
        let l: DenseStrategy = serde_json::from_str(r#"{"kind": "latency"}"#).unwrap();
        assert_eq!(l, DenseStrategy::Latency);
    }

    #[test]
    fn test_dense_stage() {
        type Q = Fixed<16, 6>;
        let stage = Dense::<Q, Q>::new(
            2,
            3,
            vec![1.0, 0.0, -1.0, 0.5, 1.0, 2.0],
            vec![0.0, 1.0, 0.5],
            DenseStrategy::Resource { reuse_factor: 2 },
        )
        .unwrap();
        let mut input = channel_bank(2);
        let mut output = channel_bank(3);
        write_frame(&mut input, &[Q::from_f64(1.0), Q::from_f64(2.0)]);
        stage.process(&mut input, &mut output);
        let got: Vec<f64> = output.iter_mut().map(|s| s.read().to_f64()).collect();
        assert_eq!(got, vec![2.0, 3.0, 3.5]);
    }

    #[test]
    fn test_dense_stage_shape_errors() {
        type Q = Fixed<16, 6>;
        let err = Dense::<Q, Q>::new(2, 3, vec![0.0; 5], vec![0.0; 3], DenseStrategy::Latency).unwrap_err();
        assert!(matches!(err, ConfigError::WeightShape { expected: 6, actual: 5, .. }));
        assert!(Dense::<Q, Q>::new(2, 3, vec![0.0; 6], vec![0.0; 2], DenseStrategy::Latency).is_err());
    }
}
