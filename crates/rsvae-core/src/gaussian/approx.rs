//! 単一チャネルのガウス近似器

use std::marker::PhantomData;

use crate::error::{ConfigError, ConfigResult, ensure_nonzero};
use crate::fixed::FixedPoint;
use crate::rng::UniformArray;

/// 2^64
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// 一様な符号付き 32bit 整数 1 個の分散（2^64 / 12 = 2^62 / 3）
pub const UNIFORM_I32_VARIANCE: f64 = TWO_POW_64 / 12.0;

/// K 個の和を保持するのに必要なアキュムレータ幅 `32 + ceil(log2 K)`
pub const fn accumulator_bits(n_samples: usize) -> u32 {
    let n = n_samples as u64;
    let ceil_log2 = if n <= 1 { 0 } else { 64 - (n - 1).leading_zeros() };
    32 + ceil_log2
}

/// 和のスケーリング定数 `1 / sqrt(K * 2^62 / 3)`
///
/// 小数部 64bit の符号なし固定小数点（整数部なし）で保持する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleConstant {
    raw: u64,
}

impl ScaleConstant {
    /// 小数部のビット数
    pub const FRAC_BITS: u32 = 64;

    /// K 個の和に対する定数を計算
    pub fn new(n_samples: usize) -> Self {
        let scale = 1.0 / (n_samples as f64 * UNIFORM_I32_VARIANCE).sqrt();
        // 代入時は切り捨て
        Self {
            raw: (scale * TWO_POW_64) as u64,
        }
    }

    /// 生の値
    #[inline]
    pub fn raw(&self) -> u64 {
        self.raw
    }

    /// 実数値
    pub fn to_f64(&self) -> f64 {
        self.raw as f64 / TWO_POW_64
    }

    /// 和にスケールを掛けて `T` に量子化
    #[inline]
    pub fn apply<T: FixedPoint>(&self, sum: i64) -> T {
        T::from_scaled(i128::from(sum) * i128::from(self.raw), Self::FRAC_BITS)
    }
}

/// ガウス近似器（K レーンの一様乱数配列を 1 個所有）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaussianApprox<T> {
    uniform: UniformArray,
    samples: Box<[i32]>,
    scale: ScaleConstant,
    _marker: PhantomData<T>,
}

impl<T: FixedPoint> GaussianApprox<T> {
    /// シードとサンプル数 K から生成
    pub fn new(seed: u32, n_samples: usize) -> ConfigResult<Self> {
        if seed == 0 {
            return Err(ConfigError::ZeroSeed);
        }
        check_samples(n_samples)?;
        check_noise_range::<T>(n_samples)?;
        Ok(Self::chained(seed, n_samples, ScaleConstant::new(n_samples)).0)
    }

    /// 連鎖状態から生成し、次の連鎖状態を返す
    pub(crate) fn chained(chain: u32, n_samples: usize, scale: ScaleConstant) -> (Self, u32) {
        let (uniform, next) = UniformArray::chained(chain, n_samples);
        let g = Self {
            uniform,
            samples: vec![0i32; n_samples].into_boxed_slice(),
            scale,
            _marker: PhantomData,
        };
        (g, next)
    }

    /// 全レーンを再導出し、連鎖状態を返す（シード 0 は `new` と同じく拒否）
    pub fn set_seed(&mut self, seed: u32) -> ConfigResult<u32> {
        self.uniform.set_seed(seed)
    }

    /// サンプル数 K
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// スケーリング定数
    pub fn scale(&self) -> ScaleConstant {
        self.scale
    }

    /// K 個の一様乱数の和（スケーリング前）
    ///
    /// 絶対値は常に `K * 2^31` 以下。
    #[inline]
    pub fn next_sum(&mut self) -> i64 {
        self.uniform.next(&mut self.samples);
        self.samples.iter().map(|&v| i64::from(v)).sum()
    }

    /// 近似正規乱数を 1 個生成
    #[inline]
    pub fn next(&mut self) -> T {
        let sum = self.next_sum();
        self.scale.apply(sum)
    }
}

/// K の範囲検査
pub(crate) fn check_samples(n_samples: usize) -> ConfigResult<()> {
    ensure_nonzero(n_samples, "gaussian sample count")?;
    let required_bits = accumulator_bits(n_samples);
    if required_bits > 64 {
        return Err(ConfigError::AccumulatorTooNarrow {
            n_samples,
            required_bits,
        });
    }
    Ok(())
}

/// 出力型 `T` が値域 ±sqrt(3K) を表現できるか検査
///
/// 収まらない値は折り返して符号が反転するので、構築時に拒否する。
pub(crate) fn check_noise_range<T: FixedPoint>(n_samples: usize) -> ConfigResult<()> {
    let bound = (3.0 * n_samples as f64).sqrt();
    let limit = 2f64.powi(T::INT_BITS as i32 - 1);
    if bound >= limit {
        return Err(ConfigError::NoiseRangeTooNarrow {
            n_samples,
            int_bits: T::INT_BITS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fixed;

    type Noise = Fixed<16, 4>;

    #[test]
    fn test_accumulator_bits() {
        assert_eq!(accumulator_bits(1), 32);
        assert_eq!(accumulator_bits(2), 33);
        assert_eq!(accumulator_bits(4), 34);
        assert_eq!(accumulator_bits(5), 35);
        assert_eq!(accumulator_bits(1024), 42);
    }

    #[test]
    fn test_scale_constant_value() {
        let s = ScaleConstant::new(4);
        let expected = 1.0 / (4.0 * UNIFORM_I32_VARIANCE).sqrt();
        assert!((s.to_f64() - expected).abs() < 1e-18);
        // 2^64/12 = 2^62/3
        assert_eq!(UNIFORM_I32_VARIANCE, (1u64 << 62) as f64 / 3.0);
    }

    #[test]
    fn test_zero_arguments_rejected() {
        assert_eq!(
            GaussianApprox::<Noise>::new(0, 4).unwrap_err(),
            ConfigError::ZeroSeed
        );
        assert!(matches!(
            GaussianApprox::<Noise>::new(1, 0),
            Err(ConfigError::ZeroWidth { .. })
        ));
    }

    #[test]
    fn test_noise_type_must_cover_sqrt_3k() {
        type Narrow = Fixed<8, 3>;
        // sqrt(3 * 5) = 3.87 < 4, sqrt(3 * 6) = 4.24 >= 4
        assert!(GaussianApprox::<Narrow>::new(1, 5).is_ok());
        assert_eq!(
            GaussianApprox::<Narrow>::new(1, 6).unwrap_err(),
            ConfigError::NoiseRangeTooNarrow {
                n_samples: 6,
                int_bits: 3
            }
        );
        assert!(GaussianApprox::<Noise>::new(1, 16).is_ok());
    }

    #[test]
    fn test_set_seed_rejects_zero() {
        let mut g = GaussianApprox::<Noise>::new(3, 4).unwrap();
        let fresh = GaussianApprox::<Noise>::new(11, 4).unwrap();
        assert_eq!(g.set_seed(0), Err(ConfigError::ZeroSeed));
        g.set_seed(11).unwrap();
        assert_eq!(g, fresh);
    }

    #[test]
    fn test_sum_is_bounded() {
        let k = 8usize;
        let bound = (k as i64) << 31;
        let mut g = GaussianApprox::<Noise>::new(42, k).unwrap();
        for _ in 0..10_000 {
            assert!(g.next_sum().abs() <= bound);
        }
    }

    #[test]
    fn test_next_is_scaled_sum() {
        let mut a = GaussianApprox::<Noise>::new(77, 4).unwrap();
        let mut b = a.clone();
        for _ in 0..100 {
            let sum = a.next_sum();
            let expected: Noise = a.scale().apply(sum);
            assert_eq!(b.next(), expected);
        }
    }

    #[test]
    fn test_matches_uniform_array_lanes() {
        let mut g = GaussianApprox::<Noise>::new(5, 4).unwrap();
        let mut u = UniformArray::new(5, 4).unwrap();
        for _ in 0..100 {
            let lanes: i64 = u.next_vec().iter().map(|&v| i64::from(v)).sum();
            assert_eq!(g.next_sum(), lanes);
        }
    }
}
