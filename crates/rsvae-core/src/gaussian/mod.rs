//! ガウス乱数エンジン（Irwin–Hall 近似）
//!
//! K 個の一様な符号付き 32bit 整数の和を、和の標準偏差で割って
//! 標準正規分布を近似する。K を大きくするほど近似は良くなるが、
//! 1 サイクルあたりの一様乱数の消費も増える。

mod approx;
mod array;

pub use approx::{GaussianApprox, ScaleConstant, UNIFORM_I32_VARIANCE, accumulator_bits};
pub use array::GaussianArray;

pub(crate) use approx::check_samples;
