//! 双方向 GRU
//!
//! 同じ入力系列を順方向と逆方向（時刻 `t` を `T - 1 - t` へ）の 2 本の
//! スタックで処理し、最終状態をチャネル方向に連結する。
//! 出力チャネル `[0, n_state)` が順方向、`[n_state, 2 * n_state)` が逆方向。
//!
//! 逆方向は系列全体がそろうまで始められないので、ストリーム版も
//! 入力を T フレームすべて読み切ってから両スタックを走らせる。

use crate::config::BidirectionalConfig;
use crate::error::ConfigResult;
use crate::fixed::FixedPoint;
use crate::stream::{ChannelStream, assert_bank_width, read_frame, write_frame};

use super::cell::GruWeights;
use super::stack::GruStack;

/// 系列を時間方向に反転する（各時刻のベクトル内の順序は保つ）
pub fn reverse_time<T: Copy>(inputs: &[T], n_in: usize) -> Vec<T> {
    inputs.rchunks_exact(n_in).flatten().copied().collect()
}

#[derive(Debug)]
pub struct Bidirectional<D, R> {
    config: BidirectionalConfig,
    forward: GruStack<D, R>,
    backward: GruStack<D, R>,
}

impl<D: FixedPoint, R: FixedPoint> Bidirectional<D, R> {
    pub fn new(
        config: BidirectionalConfig,
        forward_weights: GruWeights,
        backward_weights: GruWeights,
    ) -> ConfigResult<Self> {
        config.validate()?;
        let forward = GruStack::new(config.forward(), forward_weights)?;
        let backward = GruStack::new(config.backward(), backward_weights)?;
        log::debug!(
            "bidirectional gru: n_in={}, n_state={}x2, T={}",
            config.n_in,
            config.n_state,
            config.n_sequence
        );
        Ok(Self {
            config,
            forward,
            backward,
        })
    }

    pub fn config(&self) -> &BidirectionalConfig {
        &self.config
    }

    pub fn forward(&self) -> &GruStack<D, R> {
        &self.forward
    }

    pub fn backward(&self) -> &GruStack<D, R> {
        &self.backward
    }

    /// 出力チャネル数 `2 * n_state`
    pub fn n_out(&self) -> usize {
        self.config.n_out()
    }

    /// `T * n_in` 要素の入力から `2 * n_state` 要素の出力を返す
    ///
    /// # Panics
    ///
    /// 入力長が `T * n_in` でない場合。
    #[track_caller]
    pub fn run(&self, inputs: &[D]) -> Vec<R> {
        let reversed = reverse_time(inputs, self.config.n_in);
        let mut out = self.forward.run(inputs, None);
        out.extend(self.backward.run(&reversed, None));
        out
    }

    /// ストリーム版（T フレーム読み、1 フレーム書く）
    #[track_caller]
    pub fn process(&self, data: &mut [ChannelStream<D>], res: &mut [ChannelStream<R>]) {
        assert_bank_width(data, self.config.n_in, "bidirectional input");
        assert_bank_width(res, self.n_out(), "bidirectional output");

        let mut inputs = Vec::with_capacity(self.config.n_sequence * self.config.n_in);
        for _ in 0..self.config.n_sequence {
            inputs.extend(read_frame(data));
        }
        write_frame(res, &self.run(&inputs));
    }
}
