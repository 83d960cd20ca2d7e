//! Cross-platform settings path and output folder naming.
//!
//! Config dir (holds `settings.toml`):
//!   Windows: %APPDATA%\codebook-vc\
//!   macOS:   ~/Library/Application Support/codebook-vc/
//!   Linux:   ~/.config/codebook-vc/

use std::path::{Path, PathBuf};

use super::TransformerConfig;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "codebook-vc";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);
        let settings_file = config_dir.join("settings.toml");

        Self {
            config_dir,
            settings_file,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

/// `[<info>_]best<N>_steep<S>_prosody<Type>x<Method>`
///
/// ```
/// use codebook_vc::config::{parameter_folder_name, TransformerConfig};
///
/// let name = parameter_folder_name(&TransformerConfig::default());
/// assert_eq!(name, "best3_steep1_prosodyHertzxNoTransformation");
/// ```
pub fn parameter_folder_name(config: &TransformerConfig) -> String {
    let info = &config.output.info_string;
    let prefix = if info.is_empty() {
        String::new()
    } else {
        format!("{info}_")
    };
    format!(
        "{prefix}best{}_steep{}_prosody{}x{:?}",
        config.mapper.num_best_matches,
        config.mapper.weighting_steepness,
        config.prosody.statistics_type.label(),
        config.prosody.transformation_method,
    )
}

/// Folder the converted files of a run land in.
pub fn resolve_output_folder(base: &Path, config: &TransformerConfig) -> PathBuf {
    if config.output.parameter_subfolder {
        base.join(parameter_folder_name(config))
    } else {
        base.to_path_buf()
    }
}
