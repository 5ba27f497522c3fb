//! チャネルストリーム
//!
//! 1 チャネル = 1 本の単一生産者・単一消費者 FIFO。
//! 各段は 1 サイクルごとに全チャネルから 1 要素ずつ読み、1 要素ずつ書く。
//!
//! 宣言された要素数を超えて読むのはプログラミングエラーなので panic する。

use std::collections::VecDeque;

/// 単一チャネルのストリーム
#[derive(Debug, Clone, Default)]
pub struct ChannelStream<T> {
    queue: VecDeque<T>,
    reads: usize,
    writes: usize,
}

impl<T> ChannelStream<T> {
    /// 空のストリームを作成
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            reads: 0,
            writes: 0,
        }
    }

    /// 要素を書き込む
    #[inline]
    pub fn write(&mut self, value: T) {
        self.writes += 1;
        self.queue.push_back(value);
    }

    /// 要素を読み出す
    ///
    /// # Panics
    ///
    /// ストリームが空の場合。
    #[inline]
    #[track_caller]
    pub fn read(&mut self) -> T {
        match self.try_read() {
            Some(v) => v,
            None => panic!(
                "read past end of stream ({} reads after {} writes)",
                self.reads, self.writes
            ),
        }
    }

    /// 要素があれば読み出す
    #[inline]
    pub fn try_read(&mut self) -> Option<T> {
        let v = self.queue.pop_front()?;
        self.reads += 1;
        Some(v)
    }

    /// 未読の要素数
    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// 未読の要素がないか
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// これまでに読み出した要素数
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// これまでに書き込んだ要素数
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl<T> FromIterator<T> for ChannelStream<T> {
    fn from_iter<It: IntoIterator<Item = T>>(iter: It) -> Self {
        let mut s = Self::new();
        for v in iter {
            s.write(v);
        }
        s
    }
}

/// `n` 本の空ストリームを作成
pub fn channel_bank<T>(n: usize) -> Vec<ChannelStream<T>> {
    (0..n).map(|_| ChannelStream::new()).collect()
}

/// 全チャネルから 1 要素ずつ読み出す
///
/// どれか 1 本でも空なら、何も消費する前に panic する（全チャネル一括）。
#[track_caller]
pub fn read_frame<T>(streams: &mut [ChannelStream<T>]) -> Vec<T> {
    assert_frame_ready(streams);
    streams.iter_mut().map(ChannelStream::read).collect()
}

/// 全チャネルに 1 要素以上あることを確認する
///
/// 複数のバンクから 1 フレームずつ読む段で、どれかを消費する前に呼ぶ。
#[track_caller]
pub(crate) fn assert_frame_ready<T>(streams: &[ChannelStream<T>]) {
    if let Some(ch) = streams.iter().position(ChannelStream::is_empty) {
        panic!("stream exhausted on channel {ch} of {}", streams.len());
    }
}

/// 全チャネルに 1 要素ずつ書き込む
///
/// # Panics
///
/// `values` の長さとチャネル数が異なる場合。
#[track_caller]
pub fn write_frame<T: Copy>(streams: &mut [ChannelStream<T>], values: &[T]) {
    assert_eq!(
        streams.len(),
        values.len(),
        "frame width does not match channel count"
    );
    for (s, &v) in streams.iter_mut().zip(values) {
        s.write(v);
    }
}

/// バンク幅の検査（プログラミングエラーなので panic）
#[track_caller]
pub(crate) fn assert_bank_width<T>(streams: &[ChannelStream<T>], expected: usize, what: &str) {
    assert_eq!(
        streams.len(),
        expected,
        "{what}: expected {expected} channels, got {}",
        streams.len()
    );
}
