//! パイプライン構成ファイル
//!
//! ```toml
//! [sampler]
//! n_elem = 64
//! n_samples = 4
//! seed = 42
//!
//! [gru]
//! n_in = 4
//! n_state = 8
//! n_sequence = 16
//! return_sequences = true
//! strategy = { kind = "resource", reuse_factor = 4 }
//!
//! [bidirectional]
//! n_in = 4
//! n_state = 8
//! n_sequence = 16
//! ```
//!
//! どのセクションも省略できる。読み込み時に各セクションを検証する。

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use rsvae_core::{BidirectionalConfig, GruConfig, SamplerConfig};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineFile {
    #[serde(default)]
    pub sampler: Option<SamplerConfig>,
    #[serde(default)]
    pub gru: Option<GruConfig>,
    #[serde(default)]
    pub bidirectional: Option<BidirectionalConfig>,
}

impl PipelineFile {
    /// TOML 文字列から読み、各セクションを検証する
    pub fn parse(src: &str) -> Result<Self> {
        let file: Self = toml::from_str(src).context("invalid pipeline TOML")?;
        file.validate()?;
        Ok(file)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&src).with_context(|| format!("in {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(s) = &self.sampler {
            s.validate().context("[sampler]")?;
        }
        if let Some(g) = &self.gru {
            g.validate().context("[gru]")?;
        }
        if let Some(b) = &self.bidirectional {
            b.validate().context("[bidirectional]")?;
        }
        Ok(())
    }
}
