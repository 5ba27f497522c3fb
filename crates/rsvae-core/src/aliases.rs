//! 型エイリアスの集約（精度を変えるときはここだけ更新）
//!
//! 既定の精度はモデル変換時の既定構成に合わせている。

use crate::fixed::Fixed;
use crate::explogvar::{ExpHalfTable, ExpLogVar};
use crate::gaussian::GaussianArray;
use crate::recurrent::{Bidirectional, GruStack};
use crate::sampler::{GaussianNoise, ReparamSampler};

// スカラー型
/// 層の入出力・平均・対数分散（16 bit、整数部 6 bit）
pub type DefaultT = Fixed<16, 6>;
/// exp テーブル値（18 bit、整数部 8 bit、丸め + 飽和で格納）
pub type ExpTableT = Fixed<18, 8>;
/// 正規乱数（8 bit、整数部 3 bit）
pub type NoiseT = Fixed<8, 3>;

// 段の型
pub type DefaultExpHalfTable = ExpHalfTable<DefaultT, ExpTableT>;
pub type DefaultExpLogVar = ExpLogVar<DefaultT, ExpTableT>;
pub type DefaultGaussianArray = GaussianArray<NoiseT>;
pub type DefaultNoise = GaussianNoise<NoiseT>;
pub type DefaultSampler = ReparamSampler<DefaultT, ExpTableT, NoiseT>;
pub type DefaultGru = GruStack<DefaultT, DefaultT>;
pub type DefaultBidirectional = Bidirectional<DefaultT, DefaultT>;
