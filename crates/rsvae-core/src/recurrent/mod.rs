//! 再帰層
//!
//! - `dense`: 全結合カーネル（latency / resource）
//! - `activation`: ゲート・候補状態の活性化関数
//! - `cell`: GRU の 1 ステップ更新
//! - `stack`: 固定長系列を処理する GRU スタック
//! - `bidirectional`: 順方向・逆方向スタックの合成
//!
//! 重みと内部計算は f64、入出力と隠れ状態は固定小数点型。

mod activation;
mod bidirectional;
mod cell;
mod dense;
mod stack;

pub use activation::{Activation, ActivationKind};
pub use bidirectional::{Bidirectional, reverse_time};
pub use cell::{GruCell, GruWeights};
pub use dense::{Dense, DenseKernel, DenseStrategy, LatencyDense, ResourceDense};
pub use stack::GruStack;
