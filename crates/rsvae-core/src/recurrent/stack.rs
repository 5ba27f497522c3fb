//! GRU 系列処理器
//!
//! 固定長 T の系列に対する状態機械。
//!
//! 1. 初期状態: 構成で指定されていれば外部から与えられた状態、なければ 0
//! 2. T 回繰り返し: 入力ベクトルを 1 個読み、セルで隠れ状態を更新する。
//!    `return_sequences` なら更新後の状態を毎回出力する
//! 3. 終了: `return_sequences` でなければ最終状態を 1 回だけ出力する
//!
//! 隠れ状態は毎ステップ出力型 `R` に量子化してから次のステップに渡す。

use std::marker::PhantomData;

use crate::config::GruConfig;
use crate::error::ConfigResult;
use crate::fixed::FixedPoint;
use crate::stream::{ChannelStream, assert_bank_width, read_frame, write_frame};

use super::cell::{GruCell, GruWeights};

/// GRU スタック
///
/// - `D`: 入力の型
/// - `R`: 隠れ状態・出力の型
#[derive(Debug)]
pub struct GruStack<D, R> {
    config: GruConfig,
    cell: GruCell,
    _marker: PhantomData<(D, R)>,
}

impl<D: FixedPoint, R: FixedPoint> GruStack<D, R> {
    pub fn new(config: GruConfig, weights: GruWeights) -> ConfigResult<Self> {
        let cell = GruCell::new(&config, weights)?;
        log::debug!(
            "gru stack: n_in={}, n_state={}, T={}, return_sequences={}, initial_state={}, {}/{}, {:?}",
            config.n_in,
            config.n_state,
            config.n_sequence,
            config.return_sequences,
            config.use_initial_state,
            config.activation.name(),
            config.recurrent_activation.name(),
            config.strategy,
        );
        Ok(Self {
            config,
            cell,
            _marker: PhantomData,
        })
    }

    pub fn config(&self) -> &GruConfig {
        &self.config
    }

    pub fn cell(&self) -> &GruCell {
        &self.cell
    }

    /// 出力フレームの幅（= `n_state`）
    pub fn n_out(&self) -> usize {
        self.config.n_state
    }

    /// 出力の総要素数
    pub fn output_len(&self) -> usize {
        self.config.n_sequence_out() * self.config.n_state
    }

    /// `T * n_in` 要素の入力（時刻優先）を処理し、出力を返す
    ///
    /// 出力は `return_sequences` なら `T * n_state`、そうでなければ `n_state` 要素。
    ///
    /// # Panics
    ///
    /// 入力長が `T * n_in` でない場合、初期状態の有無が構成と一致しない場合、
    /// 初期状態の長さが `n_state` でない場合。
    #[track_caller]
    pub fn run(&self, inputs: &[D], initial: Option<&[R]>) -> Vec<R> {
        let n_in = self.config.n_in;
        assert_eq!(
            inputs.len(),
            self.config.n_sequence * n_in,
            "gru input length must be n_sequence * n_in"
        );

        let mut chunks = inputs.chunks_exact(n_in);
        let mut out = Vec::with_capacity(self.output_len());
        self.drive(
            initial,
            |x| {
                // 長さは上で検査済み
                if let Some(chunk) = chunks.next() {
                    for (dst, src) in x.iter_mut().zip(chunk) {
                        *dst = src.to_f64();
                    }
                }
            },
            |h| out.extend_from_slice(h),
        );
        out
    }

    /// ストリーム版
    ///
    /// 入力ストリームから T フレームを順に読み、出力ストリームに書き出す。
    /// `initial` は `use_initial_state` のときだけ渡す。
    #[track_caller]
    pub fn process(
        &self,
        data: &mut [ChannelStream<D>],
        initial: Option<&mut [ChannelStream<R>]>,
        res: &mut [ChannelStream<R>],
    ) {
        assert_bank_width(data, self.config.n_in, "gru input");
        assert_bank_width(res, self.config.n_state, "gru output");
        // 構成と食い違う初期状態ストリームは読む前に拒否する
        self.assert_initial_supplied(initial.is_some());

        let initial = initial.map(|streams| {
            assert_bank_width(streams, self.config.n_state, "gru initial state");
            read_frame(streams)
        });
        self.drive(
            initial.as_deref(),
            |x| {
                for (dst, v) in x.iter_mut().zip(read_frame(data)) {
                    *dst = v.to_f64();
                }
            },
            |h| write_frame(res, h),
        );
    }

    #[track_caller]
    fn assert_initial_supplied(&self, supplied: bool) {
        assert_eq!(
            supplied, self.config.use_initial_state,
            "initial state must be supplied exactly when use_initial_state is set"
        );
    }

    /// 状態機械の本体
    #[track_caller]
    fn drive(&self, initial: Option<&[R]>, mut next_input: impl FnMut(&mut [f64]), mut emit: impl FnMut(&[R])) {
        let n_state = self.config.n_state;
        self.assert_initial_supplied(initial.is_some());

        let mut state = vec![R::default(); n_state];
        if let Some(init) = initial {
            assert_eq!(init.len(), n_state, "initial state width must be n_state");
            state.copy_from_slice(init);
        }

        let mut x = vec![0.0; self.config.n_in];
        let mut h = vec![0.0; n_state];
        for t in 0..self.config.n_sequence {
            next_input(&mut x);
            for (dst, s) in h.iter_mut().zip(&state) {
                *dst = s.to_f64();
            }
            self.cell.step(&x, &mut h);
            for (s, &v) in state.iter_mut().zip(&h) {
                *s = R::from_f64(v);
            }
            log::trace!("gru step {t}: h={state:?}");

            if self.config.return_sequences {
                emit(&state);
            }
        }

        if !self.config.return_sequences {
            emit(&state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fixed;
    use crate::recurrent::ActivationKind;
    use crate::stream::channel_bank;

    type D = Fixed<16, 6>;
    type R = Fixed<16, 6>;

    fn sigmoid(x: f64) -> f64 {
        1.0 / (1.0 + (-x).exp())
    }

    fn test_weights(n_in: usize, n_state: usize) -> GruWeights {
        let mut w = GruWeights::zeros(n_in, n_state);
        for (i, v) in w.kernel.iter_mut().enumerate() {
            *v = ((i * 7 % 11) as f64 - 5.0) * 0.1;
        }
        for (i, v) in w.recurrent_kernel.iter_mut().enumerate() {
            *v = ((i * 5 % 9) as f64 - 4.0) * 0.05;
        }
        for (i, v) in w.bias.iter_mut().enumerate() {
            *v = (i as f64 - 2.0) * 0.1;
        }
        for (i, v) in w.recurrent_bias.iter_mut().enumerate() {
            *v = 0.2 - i as f64 * 0.05;
        }
        w
    }

    fn inputs(t: usize, n_in: usize) -> Vec<D> {
        (0..t * n_in)
            .map(|k| D::from_f64(((k as f64) * 0.7).sin()))
            .collect()
    }

    #[test]
    fn test_zero_input_single_step_is_bias_only() {
        let n = 2;
        let w = test_weights(2, n);
        let stack = GruStack::<D, R>::new(GruConfig::new(2, n, 1), w.clone()).unwrap();
        let out = stack.run(&[D::ZERO, D::ZERO], None);
        assert_eq!(out.len(), n);

        for j in 0..n {
            let z = sigmoid(w.bias[j] + w.recurrent_bias[j]);
            let r = sigmoid(w.bias[n + j] + w.recurrent_bias[n + j]);
            let cand = (w.bias[2 * n + j] + r * w.recurrent_bias[2 * n + j]).tanh();
            let expected = (1.0 - z) * cand;
            assert!((out[j].to_f64() - expected).abs() <= R::epsilon());
        }
    }

    #[test]
    fn test_return_sequences_last_frame_equals_final_state() {
        let (n_in, n, t) = (3, 4, 6);
        let xs = inputs(t, n_in);

        let last_only = GruStack::<D, R>::new(GruConfig::new(n_in, n, t), test_weights(n_in, n)).unwrap();
        let mut seq_config = GruConfig::new(n_in, n, t);
        seq_config.return_sequences = true;
        let all_steps = GruStack::<D, R>::new(seq_config, test_weights(n_in, n)).unwrap();

        let last = last_only.run(&xs, None);
        let seq = all_steps.run(&xs, None);
        assert_eq!(seq.len(), t * n);
        assert_eq!(&seq[(t - 1) * n..], &last[..]);
    }

    #[test]
    fn test_initial_state_changes_result() {
        let (n_in, n, t) = (2, 2, 3);
        let xs = inputs(t, n_in);
        let mut config = GruConfig::new(n_in, n, t);
        config.use_initial_state = true;
        let with_init = GruStack::<D, R>::new(config, test_weights(n_in, n)).unwrap();
        let without = GruStack::<D, R>::new(GruConfig::new(n_in, n, t), test_weights(n_in, n)).unwrap();

        // 0 の初期状態は初期状態なしと同じ
        let zeros = [R::ZERO; 2];
        assert_eq!(with_init.run(&xs, Some(&zeros)), without.run(&xs, None));

        let init = [R::from_f64(0.5), R::from_f64(-0.5)];
        assert_ne!(with_init.run(&xs, Some(&init)), without.run(&xs, None));
    }

    #[test]
    #[should_panic(expected = "initial state must be supplied")]
    fn test_unexpected_initial_state_panics() {
        let stack = GruStack::<D, R>::new(GruConfig::new(1, 1, 1), test_weights(1, 1)).unwrap();
        stack.run(&[D::ZERO], Some(&[R::ZERO]));
    }

    #[test]
    #[should_panic(expected = "initial state must be supplied")]
    fn test_missing_initial_state_panics() {
        let mut config = GruConfig::new(1, 1, 1);
        config.use_initial_state = true;
        let stack = GruStack::<D, R>::new(config, test_weights(1, 1)).unwrap();
        stack.run(&[D::ZERO], None);
    }

    #[test]
    fn test_process_matches_run() {
        let (n_in, n, t) = (2, 3, 5);
        let xs = inputs(t, n_in);
        let mut config = GruConfig::new(n_in, n, t);
        config.return_sequences = true;
        config.recurrent_activation = ActivationKind::HardSigmoid;
        let stack = GruStack::<D, R>::new(config, test_weights(n_in, n)).unwrap();

        let mut data = channel_bank(n_in);
        for frame in xs.chunks(n_in) {
            write_frame(&mut data, frame);
        }
        let mut res = channel_bank(n);
        stack.process(&mut data, None, &mut res);

        assert!(data.iter().all(ChannelStream::is_empty));
        let expected = stack.run(&xs, None);
        for step in expected.chunks(n) {
            assert_eq!(read_frame(&mut res), step);
        }
        assert!(res.iter().all(ChannelStream::is_empty));
    }

    #[test]
    fn test_process_reads_initial_state_stream() {
        let (n_in, n, t) = (1, 2, 2);
        let xs = inputs(t, n_in);
        let mut config = GruConfig::new(n_in, n, t);
        config.use_initial_state = true;
        let stack = GruStack::<D, R>::new(config, test_weights(n_in, n)).unwrap();

        let init = [R::from_f64(0.25), R::from_f64(-0.125)];
        let mut init_streams = channel_bank(n);
        write_frame(&mut init_streams, &init);
        let mut data = channel_bank(n_in);
        for frame in xs.chunks(n_in) {
            write_frame(&mut data, frame);
        }
        let mut res = channel_bank(n);
        stack.process(&mut data, Some(&mut init_streams), &mut res);

        assert_eq!(read_frame(&mut res), stack.run(&xs, Some(&init)));
    }

    #[test]
    fn test_unexpected_initial_stream_is_not_consumed() {
        let stack = GruStack::<D, R>::new(GruConfig::new(1, 1, 1), test_weights(1, 1)).unwrap();
        let mut data = channel_bank(1);
        write_frame(&mut data, &[D::ZERO]);
        let mut init_streams = channel_bank(1);
        write_frame(&mut init_streams, &[R::from_f64(0.5)]);
        let mut res = channel_bank(1);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            stack.process(&mut data, Some(&mut init_streams), &mut res);
        }));
        assert!(result.is_err());
        assert_eq!(init_streams[0].len(), 1);
        assert_eq!(data[0].len(), 1);
    }

    #[test]
    fn test_zero_sequence_rejected() {
        let err = GruStack::<D, R>::new(GruConfig::new(1, 1, 0), test_weights(1, 1)).unwrap_err();
        assert_eq!(err, crate::error::ConfigError::ZeroSequence);
    }
}
