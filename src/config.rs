//! Project configuration.
//!
//! Precedence, lowest first: built-in defaults, `galley.toml`, then the
//! `--recipes-dir` flag (or `GALLEY_RECIPES_DIR`).

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{GalleyError, GalleyResult};

/// Config file looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE: &str = "galley.toml";

/// Output format for rendered recipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Md,
    Json,
    Yaml,
}

/// Effective settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub recipes_dir: PathBuf,
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recipes_dir: PathBuf::from("recipes"),
            format: OutputFormat::Md,
        }
    }
}

/// On-disk shape of `galley.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    recipes_dir: Option<PathBuf>,
    format: Option<OutputFormat>,
}

/// Parse `galley.toml` content.
fn parse_config(path: &Path, content: &str) -> GalleyResult<ConfigFile> {
    toml::from_str(content).map_err(|e| GalleyError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

impl Config {
    /// Build the effective config.
    ///
    /// An explicit `config_path` must exist; the implicit `galley.toml` is
    /// optional. `recipes_dir` overrides whatever the file says.
    pub fn load(
        config_path: Option<&Path>,
        recipes_dir: Option<PathBuf>,
    ) -> GalleyResult<Self> {
        let file = match config_path {
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|e| GalleyError::io(path, e))?;
                parse_config(path, &content)?
            }
            None => {
                let path = Path::new(CONFIG_FILE);
                if path.is_file() {
                    let content =
                        std::fs::read_to_string(path).map_err(|e| GalleyError::io(path, e))?;
                    parse_config(path, &content)?
                } else {
                    ConfigFile::default()
                }
            }
        };
        Ok(Self::layer(file, recipes_dir))
    }

    fn layer(file: ConfigFile, recipes_dir: Option<PathBuf>) -> Self {
        let defaults = Self::default();
        Self {
            recipes_dir: recipes_dir
                .or(file.recipes_dir)
                .unwrap_or(defaults.recipes_dir),
            format: file.format.unwrap_or(defaults.format),
        }
    }
}
