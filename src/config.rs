//! User configuration (`config.toml`).
//!
//! Problems with the file never stop the program: they are returned as
//! warnings and the defaults are used instead.

use directories::ProjectDirs;
use serde::Deserialize;
use sheetcalc_engine::engine::{DEFAULT_COLS, DEFAULT_ROWS, GridBounds};
use std::path::{Path, PathBuf};

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub data_dir: Option<PathBuf>,
    pub grid: GridConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    pub columns: usize,
    pub rows: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            columns: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub filter: Option<String>,
}

impl Config {
    pub fn bounds(&self) -> GridBounds {
        GridBounds {
            cols: self.grid.columns,
            rows: self.grid.rows,
        }
    }

    /// Directory spreadsheets are stored in: the configured one, else the
    /// platform data dir.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(default_data_dir)
    }
}

/// Load the config from `explicit`, or from the user config dir when not
/// given. A missing default file is not a warning; a missing explicit one is.
pub fn load_config(explicit: Option<&PathBuf>) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let Some(path) = explicit.cloned().or_else(user_config_path) else {
        return (Config::default(), warnings);
    };

    if !path.exists() {
        if explicit.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Config::default(), warnings);
    }

    let mut config = read_config(&path, &mut warnings).unwrap_or_default();
    if config.grid.columns == 0 || config.grid.rows == 0 {
        warnings.push(format!(
            "Ignoring empty grid size {}x{} in {}",
            config.grid.columns,
            config.grid.rows,
            path.display()
        ));
        config.grid = GridConfig::default();
    }
    (config, warnings)
}

fn read_config(path: &Path, warnings: &mut Vec<String>) -> Option<Config> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            None
        }
        Ok(_) => match std::fs::read_to_string(path) {
            Ok(content) => parse_config(&content)
                .map_err(|err| warnings.push(format!("Failed to parse {}: {}", path.display(), err)))
                .ok(),
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", path.display(), err));
                None
            }
        },
        Err(err) => {
            warnings.push(format!(
                "Failed to read metadata for {}: {}",
                path.display(),
                err
            ));
            None
        }
    }
}

pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(content)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "sheetcalc")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

fn default_data_dir() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "sheetcalc")?;
    Some(proj.data_dir().to_path_buf())
}
