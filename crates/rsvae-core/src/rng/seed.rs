//! シード導出（SplitMix32）
//!
//! 1 個のシードから、並列レーン用の独立な初期状態列を作る。
//! 連番や低 Hamming 重みのシードをそのまま xorshift レーンに入れると
//! レーン間の出力が相関するため、必ずこの混合を通す。
//!
//! 状態は `state += GOLDEN_GAMMA` で進み、出力は状態の全単射な混合。
//! したがって同じ連鎖から取り出した値は 2^32 個まで互いに異なる。
//!
//! 連鎖状態として次へ引き継ぐのは加算後の内部状態 `seed + n * GOLDEN_GAMMA`
//! であり、最後に出力した混合値ではない。混合値を引き継ぐ実装とは
//! 2 段目以降のレーン初期値が一致しない。

/// 黄金比由来の加算定数
pub const GOLDEN_GAMMA: u32 = 0x9e37_79b9;

/// SplitMix32 の出力混合関数（全単射、0 のみが 0 に写る）
#[inline]
pub const fn mix32(mut z: u32) -> u32 {
    z = (z ^ (z >> 16)).wrapping_mul(0x85eb_ca6b);
    z = (z ^ (z >> 13)).wrapping_mul(0xc2b2_ae35);
    z ^ (z >> 16)
}

/// SplitMix32 生成器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitMix32 {
    state: u32,
}

impl SplitMix32 {
    /// シードから生成
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// 連鎖状態（次の導出のシードとして使う）
    #[inline]
    pub const fn state(&self) -> u32 {
        self.state
    }

    /// 次の値
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(GOLDEN_GAMMA);
        mix32(self.state)
    }

    /// 0 でない次の値
    ///
    /// 混合関数は状態 0 のときだけ 0 を返すので、その場合はもう 1 段進める。
    #[inline]
    pub fn next_nonzero(&mut self) -> u32 {
        loop {
            let z = self.next_u32();
            if z != 0 {
                return z;
            }
        }
    }
}

/// `seed` から `out.len()` 個のレーン初期状態を導出し、連鎖状態を返す
///
/// 返り値をそのまま次の `derive_seeds` に渡せば、入れ子のレーン群
/// （M 個の K 幅レーン群など）を 1 個のシードから重複なく構築できる。
pub fn derive_seeds(seed: u32, out: &mut [u32]) -> u32 {
    let mut sm = SplitMix32::new(seed);
    for o in out.iter_mut() {
        *o = sm.next_nonzero();
    }
    sm.state()
}
