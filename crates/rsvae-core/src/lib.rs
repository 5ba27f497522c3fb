//! rsvae-core: 固定小数点ストリーム推論のコア
//!
//! 潜在変数のリパラメータ化に使う決定的なガウス乱数エンジンと、
//! 固定小数点チャネルストリームを入出力とする双方向 GRU 系列処理器を提供する。
//!
//! - `rng`: xorshift32 レーン、SplitMix32 シード導出、並列一様乱数配列
//! - `gaussian`: Irwin–Hall 近似による正規乱数（単体 / チャネル配列）
//! - `explogvar`: `exp(0.5 * x)` のルックアップテーブル
//! - `sampler`: `mean + rnd * exp(0.5 * logvar)` のサンプリング段
//! - `recurrent`: GRU セル、系列スタック、双方向合成
//!
//! 幅や系列長はすべて構築時に固定され、構築時検証に失敗した場合は
//! [`ConfigError`] を返す。実行時のストリーム枯渇はプログラミングエラーとして panic する。

pub mod aliases;
pub mod config;
pub mod error;
pub mod explogvar;
pub mod fixed;
pub mod gaussian;
pub mod recurrent;
pub mod rng;
pub mod sampler;
pub mod stream;

pub use config::{BidirectionalConfig, ExpHalfConfig, GruConfig, SamplerConfig};
pub use error::{ConfigError, ConfigResult};
pub use explogvar::{ExpHalfTable, ExpLogVar};
pub use fixed::{Fixed, FixedPoint, Overflow, Rounding, mul_add};
pub use gaussian::{GaussianApprox, GaussianArray, ScaleConstant};
pub use recurrent::{
    Activation, ActivationKind, Bidirectional, Dense, DenseKernel, DenseStrategy, GruCell, GruStack,
    GruWeights, LatencyDense, ResourceDense,
};
pub use rng::{SplitMix32, UniformArray, Xorshift32, derive_seeds};
pub use sampler::{GaussianNoise, ReparamSampler};
pub use stream::{ChannelStream, channel_bank, read_frame, write_frame};
