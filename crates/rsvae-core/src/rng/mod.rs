//! 決定的な一様乱数エンジン
//!
//! - `Xorshift32`: 1 レーン分の xorshift32 生成器
//! - `SplitMix32`: シード導出（レーンごとの独立な初期状態）
//! - `UniformArray`: N レーンを同時に 1 ステップ進める一様乱数配列
//!
//! 暗号用途には使えない。相関の小さいサンプリング用。

mod seed;
mod uniform_array;
mod xorshift;

pub use seed::{GOLDEN_GAMMA, SplitMix32, derive_seeds, mix32};
pub use uniform_array::UniformArray;
pub use xorshift::Xorshift32;
