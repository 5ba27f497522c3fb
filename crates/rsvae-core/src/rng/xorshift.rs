//! xorshift32 生成器（1 レーン）

use crate::error::{ConfigError, ConfigResult};

/// xorshift32 の 1 ステップ
///
/// 0 以外の入力に対して 0 以外を返す全単射。0 は不動点。
#[inline]
pub(crate) const fn step(mut x: u32) -> u32 {
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    x
}

/// 1 レーン分の一様乱数生成器
///
/// 状態は常に 0 以外。`next_u32` は読み出しと更新を伴うため、
/// 同じインスタンスを複数の所有者から同時に進めてはならない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Xorshift32 {
    state: u32,
}

impl Xorshift32 {
    /// シードから生成（0 は拒否）
    pub fn new(seed: u32) -> ConfigResult<Self> {
        if seed == 0 {
            return Err(ConfigError::ZeroSeed);
        }
        Ok(Self { state: seed })
    }

    /// シード導出済みの 0 でない値から生成
    #[inline]
    pub(crate) fn from_derived(seed: u32) -> Self {
        debug_assert_ne!(seed, 0, "derived lane seed must be non-zero");
        Self { state: seed }
    }

    /// 状態を 1 ステップ進めて新しい値を返す
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.state = step(self.state);
        self.state
    }

    /// 現在の状態
    #[inline]
    pub fn state(&self) -> u32 {
        self.state
    }
}
