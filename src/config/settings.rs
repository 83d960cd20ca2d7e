//! Transformer settings, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across worker
//! threads.  Every field has a default, so a partial `settings.toml` only
//! needs the values it changes.

use std::path::Path;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::mapper::MapperParams;
use crate::prosody::ProsodyParams;

use super::AppPaths;

// ---------------------------------------------------------------------------
// PipelineSwitches
// ---------------------------------------------------------------------------

/// Boolean switches that shape the conversion passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSwitches {
    /// Substitute the spectral envelope through the codebook.
    pub vocal_tract_transformation: bool,
    /// Keep the frame rate fixed; implies `separate_prosody`.
    pub fixed_rate_conversion: bool,
    /// Emit source-side codebook envelopes instead of target-side ones.
    pub resynthesize_from_source_codebook: bool,
    /// Search the target side of the codebook instead of the source side.
    pub match_using_target_codebook: bool,
    /// Run vocal-tract and prosody conversion as two engine passes.
    pub separate_prosody: bool,
    /// Keep the `_vt.wav` intermediate after a two-pass conversion.
    pub save_vocal_tract_only: bool,
    /// Re-run feature extraction even when feature files already exist.
    pub forced_reanalysis: bool,
    /// Log per-frame progress from the engine.
    pub display_progress: bool,
}

impl Default for PipelineSwitches {
    fn default() -> Self {
        Self {
            vocal_tract_transformation: true,
            fixed_rate_conversion: false,
            resynthesize_from_source_codebook: false,
            match_using_target_codebook: false,
            separate_prosody: false,
            save_vocal_tract_only: false,
            forced_reanalysis: false,
            display_progress: false,
        }
    }
}

// ---------------------------------------------------------------------------
// OutputConfig
// ---------------------------------------------------------------------------

/// Naming of output files and folders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Appended to each input stem: `<stem><suffix>.wav`.
    pub suffix: String,
    /// Free-form prefix of the parameter subfolder name.
    pub info_string: String,
    /// Write into `<output>/<parameter folder>/` instead of `<output>/`.
    pub parameter_subfolder: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: "_output".into(),
            info_string: String::new(),
            parameter_subfolder: false,
        }
    }
}

// ---------------------------------------------------------------------------
// TransformerConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level conversion configuration, serialised as `settings.toml`.
///
/// Immutable during a run: the batch transformer takes a normalised copy and
/// shares it read-only with every item.
///
/// # Persistence
///
/// ```rust,no_run
/// use codebook_vc::config::TransformerConfig;
///
/// // Load (returns Default when file is missing)
/// let config = TransformerConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformerConfig {
    /// Items converted concurrently; `1` runs sequentially.
    pub workers: usize,
    pub mapper: MapperParams,
    pub prosody: ProsodyParams,
    pub pipeline: PipelineSwitches,
    pub output: OutputConfig,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            mapper: MapperParams::default(),
            prosody: ProsodyParams::default(),
            pipeline: PipelineSwitches::default(),
            output: OutputConfig::default(),
        }
    }
}

impl TransformerConfig {
    /// Copy with implied switches applied: fixed-rate conversion always runs
    /// prosody as its own pass, and at least one worker is used.
    pub fn normalized(&self) -> Self {
        let mut config = self.clone();
        if config.pipeline.fixed_rate_conversion && !config.pipeline.separate_prosody {
            log::debug!("config: fixed-rate conversion enables separate prosody");
            config.pipeline.separate_prosody = true;
        }
        config.workers = config.workers.max(1);
        config
    }

    /// Reject settings no run could succeed with.  Mapper parameters are
    /// checked separately when the mapper is built.
    pub fn validate(&self) -> Result<()> {
        if let Err(reason) = self.prosody.scales.validate() {
            bail!("invalid scale factors: {reason}");
        }
        if self.output.suffix.contains(['/', '\\']) {
            bail!("output suffix {:?} must not contain a path separator", self.output.suffix);
        }
        Ok(())
    }

    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(TransformerConfig::default())` when the file does not
    /// exist yet so callers never need to special-case a missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
