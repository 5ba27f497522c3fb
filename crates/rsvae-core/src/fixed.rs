//! 固定小数点数
//!
//! 任意精度固定小数点型（全体 `W` bit、整数部 `I` bit、符号込み）を
//! const generics で表現する。
//!
//! | 型 | 全体幅 | 整数部 | 小数部 | 表現範囲 |
//! |----|-------|-------|-------|---------|
//! | `Fixed<8, 3>` | 8 | 3 | 5 | [-4, 4) |
//! | `Fixed<16, 6>` | 16 | 6 | 10 | [-32, 32) |
//! | `Fixed<18, 8>` | 18 | 8 | 10 | [-128, 128) |
//!
//! 量子化の既定は「-∞ 方向への切り捨て + ビット幅での折り返し」。
//! 丸め・飽和が必要な箇所（exp テーブルなど）はモード指定版を使う。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// 小数部を落とすときの丸めモード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rounding {
    /// -∞ 方向への切り捨て
    #[default]
    Truncate,
    /// 最近接丸め（ちょうど中間は偶数側）
    Convergent,
}

/// 整数部があふれたときの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Overflow {
    /// 2 の補数での折り返し
    #[default]
    Wrap,
    /// 最大値・最小値に張り付く
    Saturate,
}

#[inline]
fn pow2(bits: u32) -> f64 {
    (1u64 << bits) as f64
}

/// 小数部 `from_frac` bit の値を `to_frac` bit に再量子化する
#[inline]
fn requantize(value: i128, from_frac: u32, to_frac: u32, rounding: Rounding) -> i128 {
    if from_frac <= to_frac {
        return value << (to_frac - from_frac);
    }
    let shift = from_frac - to_frac;
    debug_assert!(shift < 127);
    // 算術右シフトは -∞ 方向への切り捨て
    let floor = value >> shift;
    match rounding {
        Rounding::Truncate => floor,
        Rounding::Convergent => {
            let rem = value - (floor << shift);
            let half = 1i128 << (shift - 1);
            if rem > half || (rem == half && floor & 1 == 1) {
                floor + 1
            } else {
                floor
            }
        }
    }
}

/// `width` bit の符号付き整数に収める
#[inline]
fn fit_width(value: i128, width: u32, overflow: Overflow) -> i64 {
    match overflow {
        Overflow::Wrap => {
            let s = 128 - width;
            ((value << s) >> s) as i64
        }
        Overflow::Saturate => {
            let max = (1i128 << (width - 1)) - 1;
            let min = -(1i128 << (width - 1));
            value.clamp(min, max) as i64
        }
    }
}

/// 固定小数点スカラーの共通インターフェース
///
/// 生の値 `raw` は常に `WIDTH` bit から符号拡張された `i64` で、
/// 実数値は `raw * 2^-FRAC_BITS`。
pub trait FixedPoint:
    Copy + Default + PartialEq + Eq + PartialOrd + Ord + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// 全体のビット幅（符号込み）
    const WIDTH: u32;
    /// 整数部のビット幅（符号込み）
    const INT_BITS: u32;
    /// 小数部のビット幅
    const FRAC_BITS: u32 = Self::WIDTH - Self::INT_BITS;

    /// 生の値を取得
    fn raw(self) -> i64;

    /// 生の値から生成（`WIDTH` bit で折り返す）
    fn from_raw(raw: i64) -> Self;

    /// 小数部 `frac_bits` bit のスケール済み整数から、モード指定で量子化
    fn from_scaled_with(value: i128, frac_bits: u32, rounding: Rounding, overflow: Overflow) -> Self {
        let q = requantize(value, frac_bits, Self::FRAC_BITS, rounding);
        Self::from_raw(fit_width(q, Self::WIDTH, overflow))
    }

    /// 小数部 `frac_bits` bit のスケール済み整数から量子化（切り捨て + 折り返し）
    fn from_scaled(value: i128, frac_bits: u32) -> Self {
        Self::from_scaled_with(value, frac_bits, Rounding::Truncate, Overflow::Wrap)
    }

    /// 浮動小数点からモード指定で量子化
    ///
    /// NaN は 0 になる。
    fn from_f64_with(x: f64, rounding: Rounding, overflow: Overflow) -> Self {
        // 2 のべき乗倍なので丸め誤差は出ない
        let scaled = x * pow2(Self::FRAC_BITS);
        let q = match rounding {
            Rounding::Truncate => scaled.floor(),
            Rounding::Convergent => scaled.round_ties_even(),
        };
        Self::from_raw(fit_width(q as i128, Self::WIDTH, overflow))
    }

    /// 浮動小数点から量子化（切り捨て + 折り返し）
    fn from_f64(x: f64) -> Self {
        Self::from_f64_with(x, Rounding::Truncate, Overflow::Wrap)
    }

    /// 実数値
    fn to_f64(self) -> f64 {
        self.raw() as f64 / pow2(Self::FRAC_BITS)
    }

    /// 最小単位（1 LSB）の実数値
    fn epsilon() -> f64 {
        1.0 / pow2(Self::FRAC_BITS)
    }

    /// 別の固定小数点型へ変換（切り捨て + 折り返し）
    fn convert<U: FixedPoint>(self) -> U {
        U::from_scaled(i128::from(self.raw()), Self::FRAC_BITS)
    }
}

/// 固定小数点数 `W` bit（整数部 `I` bit）
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Fixed<const W: u32, const I: u32>(i64);

impl<const W: u32, const I: u32> Fixed<W, I> {
    const LAYOUT_OK: () = assert!(
        W >= 1 && W <= 32 && I <= W,
        "Fixed<W, I> requires 1 <= W <= 32 and I <= W"
    );

    /// ゼロ
    pub const ZERO: Self = Self(0);

    /// 表現できる最大値
    pub fn max_value() -> Self {
        Self::from_raw((1i64 << (W - 1)) - 1)
    }

    /// 表現できる最小値
    pub fn min_value() -> Self {
        Self::from_raw(-(1i64 << (W - 1)))
    }
}

impl<const W: u32, const I: u32> FixedPoint for Fixed<W, I> {
    const WIDTH: u32 = W;
    const INT_BITS: u32 = I;

    #[inline]
    fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    fn from_raw(raw: i64) -> Self {
        let () = Self::LAYOUT_OK;
        let s = 64 - W;
        Self((raw << s) >> s)
    }
}

impl<const W: u32, const I: u32> Add for Fixed<W, I> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::from_raw(self.0.wrapping_add(rhs.0))
    }
}

impl<const W: u32, const I: u32> Sub for Fixed<W, I> {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::from_raw(self.0.wrapping_sub(rhs.0))
    }
}

impl<const W: u32, const I: u32> Neg for Fixed<W, I> {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::from_raw(self.0.wrapping_neg())
    }
}

impl<const W: u32, const I: u32> fmt::Debug for Fixed<W, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed<{W},{I}>({})", self.to_f64())
    }
}

impl<const W: u32, const I: u32> fmt::Display for Fixed<W, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

/// `a + b * c` を 128bit 整数で正確に計算し、`R` に一度だけ量子化する
///
/// 中間結果は全精度で保持されるため、量子化誤差は最終代入の 1 回のみ。
#[inline]
pub fn mul_add<A, B, C, R>(a: A, b: B, c: C) -> R
where
    A: FixedPoint,
    B: FixedPoint,
    C: FixedPoint,
    R: FixedPoint,
{
    let prod_frac = B::FRAC_BITS + C::FRAC_BITS;
    let frac = prod_frac.max(A::FRAC_BITS);
    let product = (i128::from(b.raw()) * i128::from(c.raw())) << (frac - prod_frac);
    let base = i128::from(a.raw()) << (frac - A::FRAC_BITS);
    R::from_scaled(base + product, frac)
}
