//! GRU 重みの読み込みと生成
//!
//! JSON は単方向なら `GruWeights` そのもの、双方向なら
//! `{"forward": {...}, "backward": {...}}`。
//! ファイルを指定しない場合はシード付き乱数で重みを作る（動作確認用）。

use std::path::Path;

use anyhow::{Context, Result, ensure};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use rsvae_core::GruWeights;

use crate::common::io::open_reader;

/// 双方向 GRU の重み
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BidirectionalWeights {
    pub forward: GruWeights,
    pub backward: GruWeights,
}

fn load_json<T: serde::de::DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let reader = open_reader(path).with_context(|| format!("failed to open {}", path.display()))?;
    serde_json::from_reader(reader).with_context(|| format!("invalid weight JSON in {}", path.display()))
}

/// 単方向 GRU の重みを読み、次元を確認する
pub fn load_gru<P: AsRef<Path>>(path: P, n_in: usize, n_state: usize) -> Result<GruWeights> {
    let w: GruWeights = load_json(path)?;
    check_dims(&w, n_in, n_state)?;
    Ok(w)
}

/// 双方向 GRU の重みを読み、次元を確認する
pub fn load_bidirectional<P: AsRef<Path>>(path: P, n_in: usize, n_state: usize) -> Result<BidirectionalWeights> {
    let w: BidirectionalWeights = load_json(path)?;
    check_dims(&w.forward, n_in, n_state).context("forward weights")?;
    check_dims(&w.backward, n_in, n_state).context("backward weights")?;
    Ok(w)
}

fn check_dims(w: &GruWeights, n_in: usize, n_state: usize) -> Result<()> {
    ensure!(
        w.n_in == n_in && w.n_state == n_state,
        "weights are {}x{} but the configuration expects {n_in}x{n_state}",
        w.n_in,
        w.n_state
    );
    w.validate()?;
    Ok(())
}

/// `[-scale, scale)` の一様乱数で重みを作る
pub fn random_gru(n_in: usize, n_state: usize, seed: u64, scale: f64) -> GruWeights {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut w = GruWeights::zeros(n_in, n_state);
    for v in w
        .kernel
        .iter_mut()
        .chain(w.recurrent_kernel.iter_mut())
        .chain(w.bias.iter_mut())
        .chain(w.recurrent_bias.iter_mut())
    {
        *v = rng.random_range(-scale..scale);
    }
    w
}

/// 順方向・逆方向で異なる乱数列から重みを作る
pub fn random_bidirectional(n_in: usize, n_state: usize, seed: u64, scale: f64) -> BidirectionalWeights {
    BidirectionalWeights {
        forward: random_gru(n_in, n_state, seed, scale),
        backward: random_gru(n_in, n_state, seed.wrapping_add(1), scale),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_weights_are_deterministic_and_shaped() {
        let a = random_gru(3, 4, 11, 0.5);
        let b = random_gru(3, 4, 11, 0.5);
        assert_eq!(a, b);
        assert!(a.validate().is_ok());
        assert!(a.kernel.iter().all(|v| (-0.5..0.5).contains(v)));

        let bi = random_bidirectional(3, 4, 11, 0.5);
        assert_eq!(bi.forward, a);
        assert_ne!(bi.forward, bi.backward);
    }

    #[test]
    fn test_load_roundtrip_and_dimension_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gru.json");
        let w = random_gru(2, 3, 5, 1.0);
        std::fs::write(&path, serde_json::to_string(&w).unwrap()).unwrap();

        assert_eq!(load_gru(&path, 2, 3).unwrap(), w);
        assert!(load_gru(&path, 2, 4).is_err());
    }

    #[test]
    fn test_load_bidirectional_rejects_bad_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bi.json");
        let mut w = random_bidirectional(1, 2, 9, 1.0);
        w.backward.recurrent_bias.pop();
        std::fs::write(&path, serde_json::to_string(&w).unwrap()).unwrap();

        let err = load_bidirectional(&path, 1, 2).unwrap_err();
        assert!(format!("{err:#}").contains("backward"));
    }
}
