//! 活性化関数
//!
//! | 名前 | 数式 | 主な用途 |
//! |------|------|---------|
//! | Sigmoid | `1 / (1 + e^-x)` | GRU ゲート（既定） |
//! | HardSigmoid | `clamp(0.2x + 0.5, 0, 1)` | 量子化モデルのゲート |
//! | Tanh | `tanh(x)` | GRU 候補状態（既定） |
//! | Relu | `max(x, 0)` | |
//! | Linear | `x` | 恒等写像 |

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigResult, ensure_nonzero};
use crate::fixed::FixedPoint;
use crate::stream::{ChannelStream, assert_bank_width, read_frame};

/// 活性化関数の種類
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationKind {
    Sigmoid,
    HardSigmoid,
    Tanh,
    Relu,
    #[default]
    Linear,
}

impl ActivationKind {
    /// 1 要素に適用
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Self::HardSigmoid => (0.2 * x + 0.5).clamp(0.0, 1.0),
            Self::Tanh => x.tanh(),
            Self::Relu => x.max(0.0),
            Self::Linear => x,
        }
    }

    /// 表示名
    pub fn name(self) -> &'static str {
        match self {
            Self::Sigmoid => "sigmoid",
            Self::HardSigmoid => "hard_sigmoid",
            Self::Tanh => "tanh",
            Self::Relu => "relu",
            Self::Linear => "linear",
        }
    }
}

/// 要素ごとの活性化段（`n_chan` チャネル、1 呼び出しで 1 フレーム）
#[derive(Debug, Clone)]
pub struct Activation<D, R> {
    kind: ActivationKind,
    n_chan: usize,
    _marker: PhantomData<(D, R)>,
}

impl<D: FixedPoint, R: FixedPoint> Activation<D, R> {
    pub fn new(kind: ActivationKind, n_chan: usize) -> ConfigResult<Self> {
        ensure_nonzero(n_chan, "activation channel count")?;
        Ok(Self {
            kind,
            n_chan,
            _marker: PhantomData,
        })
    }

    pub fn kind(&self) -> ActivationKind {
        self.kind
    }

    /// 1 フレーム読み、活性化して `R` に量子化して書き出す
    pub fn process(&self, data: &mut [ChannelStream<D>], res: &mut [ChannelStream<R>]) {
        assert_bank_width(data, self.n_chan, "activation input");
        assert_bank_width(res, self.n_chan, "activation output");
        for (x, out) in read_frame(data).into_iter().zip(res.iter_mut()) {
            out.write(R::from_f64(self.kind.apply(x.to_f64())));
        }
    }
}
