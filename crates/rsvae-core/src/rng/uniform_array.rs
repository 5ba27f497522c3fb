//! 並列一様乱数配列
//!
//! N 本の独立な xorshift32 レーンを保持し、1 サイクルで全レーンを
//! 1 ステップずつ進めて N 個の一様乱数を返す。
//! レーン同士は状態を共有せず、あるレーンの更新が他のレーンから見えることもない。

use super::seed::derive_seeds;
use super::xorshift::Xorshift32;
use crate::error::{ConfigError, ConfigResult, ensure_nonzero};

/// N レーンの一様乱数配列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformArray {
    lanes: Box<[Xorshift32]>,
}

impl UniformArray {
    /// シードと幅から生成
    ///
    /// シード 0 と幅 0 は構成エラー。
    pub fn new(seed: u32, width: usize) -> ConfigResult<Self> {
        if seed == 0 {
            return Err(ConfigError::ZeroSeed);
        }
        ensure_nonzero(width, "uniform array width")?;
        Ok(Self::chained(seed, width).0)
    }

    /// 連鎖状態から生成し、次の連鎖状態を返す
    ///
    /// 連鎖状態は SplitMix の内部状態なので 0 でもよい。
    pub(crate) fn chained(chain: u32, width: usize) -> (Self, u32) {
        let mut seeds = vec![0u32; width];
        let next = derive_seeds(chain, &mut seeds);
        let lanes = seeds.into_iter().map(Xorshift32::from_derived).collect();
        (Self { lanes }, next)
    }

    /// 全レーンを再導出し、連鎖状態を返す
    ///
    /// `new` と同じくシード 0 は拒否し、その場合レーンは変更しない。
    pub fn set_seed(&mut self, seed: u32) -> ConfigResult<u32> {
        if seed == 0 {
            return Err(ConfigError::ZeroSeed);
        }
        let (fresh, next) = Self::chained(seed, self.lanes.len());
        *self = fresh;
        Ok(next)
    }

    /// レーン数
    #[inline]
    pub fn width(&self) -> usize {
        self.lanes.len()
    }

    /// 全レーンを 1 ステップ進め、符号付き 32bit として書き出す
    ///
    /// # Panics
    ///
    /// `out.len()` がレーン数と異なる場合。
    #[inline]
    pub fn next(&mut self, out: &mut [i32]) {
        assert_eq!(out.len(), self.lanes.len(), "uniform array output width");
        for (lane, o) in self.lanes.iter_mut().zip(out.iter_mut()) {
            *o = lane.next_u32() as i32;
        }
    }

    /// 全レーンを 1 ステップ進めた結果を新しい Vec で返す
    pub fn next_vec(&mut self) -> Vec<i32> {
        let mut out = vec![0i32; self.lanes.len()];
        self.next(&mut out);
        out
    }

    /// 各レーンの現在の状態
    pub fn lane_states(&self) -> Vec<u32> {
        self.lanes.iter().map(Xorshift32::state).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::xorshift::step;

    #[test]
    fn test_invalid_construction() {
        assert_eq!(UniformArray::new(0, 4), Err(ConfigError::ZeroSeed));
        assert!(matches!(
            UniformArray::new(1, 0),
            Err(ConfigError::ZeroWidth { .. })
        ));
    }

    #[test]
    fn test_lanes_advance_in_lockstep() {
        let mut arr = UniformArray::new(42, 4).unwrap();
        let before = arr.lane_states();
        let out = arr.next_vec();
        for (i, &s) in before.iter().enumerate() {
            assert_eq!(out[i], step(s) as i32);
        }
        assert_eq!(arr.lane_states(), out.iter().map(|&v| v as u32).collect::<Vec<_>>());
    }

    #[test]
    fn test_set_seed_matches_fresh_construction() {
        let mut arr = UniformArray::new(1, 8).unwrap();
        arr.next_vec();
        let chain = arr.set_seed(99).unwrap();
        let fresh = UniformArray::new(99, 8).unwrap();
        assert_eq!(arr, fresh);
        assert_eq!(chain, 99u32.wrapping_add(crate::rng::GOLDEN_GAMMA.wrapping_mul(8)));
    }

    #[test]
    fn test_set_seed_zero_rejected_and_state_kept() {
        let mut arr = UniformArray::new(7, 4).unwrap();
        arr.next_vec();
        let before = arr.clone();
        assert_eq!(arr.set_seed(0), Err(ConfigError::ZeroSeed));
        assert_eq!(arr, before);
    }

    #[test]
    fn test_determinism() {
        let mut a = UniformArray::new(12345, 16).unwrap();
        let mut b = UniformArray::new(12345, 16).unwrap();
        for _ in 0..1000 {
            assert_eq!(a.next_vec(), b.next_vec());
        }
    }

    #[test]
    fn test_different_seeds_give_different_first_vectors() {
        let mut seen = std::collections::HashSet::new();
        for seed in 1..=5000u32 {
            let mut arr = UniformArray::new(seed, 4).unwrap();
            assert!(seen.insert(arr.next_vec()), "duplicate first vector for seed {seed}");
        }
    }

    #[test]
    #[should_panic(expected = "uniform array output width")]
    fn test_output_width_mismatch() {
        let mut arr = UniformArray::new(3, 4).unwrap();
        let mut out = [0i32; 3];
        arr.next(&mut out);
    }
}
