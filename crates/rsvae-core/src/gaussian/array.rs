//! チャネル配列のガウス乱数生成器
//!
//! M 個の独立なガウス近似器（各 K レーン）を保持し、1 サイクルで
//! 全チャネル分の正規乱数を生成する。各近似器のシードは 1 個の
//! トップレベルシードから SplitMix の連鎖で順に導出するので、
//! 同じ中間シードから 2 個の近似器が作られることはない。
//!
//! 生成器の状態は呼び出しをまたいで保持され、1 回の呼び出しで 1 ステップ進む。

use crate::error::{ConfigError, ConfigResult, ensure_nonzero};
use crate::fixed::FixedPoint;

use super::approx::{GaussianApprox, ScaleConstant, check_noise_range, check_samples};

/// M チャネルのガウス乱数生成器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaussianArray<T> {
    channels: Box<[GaussianApprox<T>]>,
    seed: u32,
}

impl<T: FixedPoint> GaussianArray<T> {
    /// トップレベルシード、チャネル数 M、サンプル数 K から生成
    pub fn new(seed: u32, n_elem: usize, n_samples: usize) -> ConfigResult<Self> {
        if seed == 0 {
            return Err(ConfigError::ZeroSeed);
        }
        ensure_nonzero(n_elem, "gaussian array width")?;
        check_samples(n_samples)?;
        check_noise_range::<T>(n_samples)?;

        let scale = ScaleConstant::new(n_samples);
        let mut chain = seed;
        let channels = (0..n_elem)
            .map(|_| {
                let (g, next) = GaussianApprox::chained(chain, n_samples, scale);
                chain = next;
                g
            })
            .collect();

        log::debug!(
            "gaussian array: {n_elem} channels x {n_samples} lanes, seed={seed:#010x}, scale={:.6e}",
            scale.to_f64()
        );
        Ok(Self { channels, seed })
    }

    /// チャネル数 M
    #[inline]
    pub fn width(&self) -> usize {
        self.channels.len()
    }

    /// チャネルあたりのサンプル数 K
    pub fn n_samples(&self) -> usize {
        self.channels[0].n_samples()
    }

    /// 構築時のシード
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// 全チャネルを 1 ステップ進めて正規乱数を書き出す
    ///
    /// # Panics
    ///
    /// `out.len()` がチャネル数と異なる場合。
    #[inline]
    pub fn next(&mut self, out: &mut [T]) {
        assert_eq!(out.len(), self.channels.len(), "gaussian array output width");
        for (g, o) in self.channels.iter_mut().zip(out.iter_mut()) {
            *o = g.next();
        }
    }

    /// 全チャネルを 1 ステップ進めた結果を新しい Vec で返す
    pub fn next_vec(&mut self) -> Vec<T> {
        let mut out = vec![T::default(); self.channels.len()];
        self.next(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fixed;
    use crate::rng::UniformArray;

    type Noise = Fixed<16, 4>;

    #[test]
    fn test_invalid_construction() {
        assert_eq!(
            GaussianArray::<Noise>::new(0, 4, 4).unwrap_err(),
            ConfigError::ZeroSeed
        );
        assert!(GaussianArray::<Noise>::new(1, 0, 4).is_err());
        assert!(GaussianArray::<Noise>::new(1, 4, 0).is_err());
    }

    #[test]
    fn test_narrow_noise_type_rejected() {
        // Fixed<8, 3> は [-4, 4) なので K = 16（±6.93）は折り返してしまう
        assert!(matches!(
            GaussianArray::<Fixed<8, 3>>::new(42, 64, 16),
            Err(ConfigError::NoiseRangeTooNarrow { n_samples: 16, int_bits: 3 })
        ));
        assert!(GaussianArray::<Fixed<8, 3>>::new(42, 64, 4).is_ok());
    }

    #[test]
    fn test_channels_use_consecutive_lane_groups() {
        // M x K の連鎖導出は、幅 M*K の一様乱数配列と同じレーン列になる
        let (m, k) = (3usize, 4usize);
        let mut arr = GaussianArray::<Noise>::new(42, m, k).unwrap();
        let mut lanes = UniformArray::new(42, m * k).unwrap();
        let scale = ScaleConstant::new(k);

        for _ in 0..50 {
            let uniforms = lanes.next_vec();
            let expected: Vec<Noise> = uniforms
                .chunks(k)
                .map(|c| scale.apply(c.iter().map(|&v| i64::from(v)).sum()))
                .collect();
            assert_eq!(arr.next_vec(), expected);
        }
    }

    #[test]
    fn test_channels_are_not_identical() {
        let mut arr = GaussianArray::<Noise>::new(9, 4, 4).unwrap();
        let draws: Vec<Vec<Noise>> = (0..64).map(|_| arr.next_vec()).collect();
        for a in 0..4 {
            for b in (a + 1)..4 {
                let same = draws.iter().filter(|d| d[a] == d[b]).count();
                assert!(same < 16, "channels {a} and {b} look correlated");
            }
        }
    }

    #[test]
    fn test_clone_replays_sequence() {
        let mut a = GaussianArray::<Noise>::new(1234, 8, 4).unwrap();
        a.next_vec();
        let mut b = a.clone();
        for _ in 0..100 {
            assert_eq!(a.next_vec(), b.next_vec());
        }
    }
}
