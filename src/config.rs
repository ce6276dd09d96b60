//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `marketpulse.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input dataset settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Output artifact settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Chart rendering settings.
    #[serde(default)]
    pub charts: ChartsConfig,
}

/// Input dataset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory containing the input CSV files.
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,

    /// Sales dataset file name.
    #[serde(default = "default_sales_file")]
    pub sales_file: String,

    /// Competitor observations file name.
    #[serde(default = "default_competitors_file")]
    pub competitors_file: String,

    /// Survey responses file name.
    #[serde(default = "default_survey_file")]
    pub survey_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            sales_file: default_sales_file(),
            competitors_file: default_competitors_file(),
            survey_file: default_survey_file(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_sales_file() -> String {
    "marketpulse_sales.csv".to_string()
}

fn default_competitors_file() -> String {
    "marketpulse_competitors.csv".to_string()
}

fn default_survey_file() -> String {
    "marketpulse_survey.csv".to_string()
}

/// Output artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory that receives the report artifacts.
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Workbook file name.
    #[serde(default = "default_workbook_file")]
    pub workbook_file: String,

    /// Charts subdirectory name, relative to the output directory.
    #[serde(default = "default_charts_subdir")]
    pub charts_subdir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            workbook_file: default_workbook_file(),
            charts_subdir: default_charts_subdir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

fn default_workbook_file() -> String {
    "marketpulse_summary.xlsx".to_string()
}

fn default_charts_subdir() -> String {
    "charts".to_string()
}

/// Chart rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartsConfig {
    /// Rendered chart width in pixels.
    #[serde(default = "default_chart_width")]
    pub width: u32,

    /// Rendered chart height in pixels.
    #[serde(default = "default_chart_height")]
    pub height: u32,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            width: default_chart_width(),
            height: default_chart_height(),
        }
    }
}

fn default_chart_width() -> u32 {
    900
}

fn default_chart_height() -> u32 {
    600
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new("marketpulse.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data_dir) = args.data_dir {
            self.data.dir = data_dir.clone();
        }
        if let Some(ref out_dir) = args.out_dir {
            self.output.dir = out_dir.clone();
        }
    }

    /// Path to the sales dataset.
    pub fn sales_path(&self) -> PathBuf {
        self.data.dir.join(&self.data.sales_file)
    }

    /// Path to the competitor observations dataset.
    pub fn competitors_path(&self) -> PathBuf {
        self.data.dir.join(&self.data.competitors_file)
    }

    /// Path to the survey dataset.
    pub fn survey_path(&self) -> PathBuf {
        self.data.dir.join(&self.data.survey_file)
    }

    /// Path the workbook is written to.
    pub fn workbook_path(&self) -> PathBuf {
        self.output.dir.join(&self.output.workbook_file)
    }

    /// Directory the charts are written to.
    pub fn charts_dir(&self) -> PathBuf {
        self.output.dir.join(&self.output.charts_subdir)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.dir, PathBuf::from("data"));
        assert_eq!(config.data.sales_file, "marketpulse_sales.csv");
        assert_eq!(config.output.dir, PathBuf::from("outputs"));
        assert_eq!(config.output.workbook_file, "marketpulse_summary.xlsx");
        assert_eq!(config.charts.width, 900);
        assert_eq!(config.charts.height, 600);
    }

    #[test]
    fn test_default_paths() {
        let config = Config::default();
        assert_eq!(
            config.sales_path(),
            PathBuf::from("data").join("marketpulse_sales.csv")
        );
        assert_eq!(
            config.workbook_path(),
            PathBuf::from("outputs").join("marketpulse_summary.xlsx")
        );
        assert_eq!(
            config.charts_dir(),
            PathBuf::from("outputs").join("charts")
        );
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[data]
dir = "exports/q4"
sales_file = "sales.csv"

[output]
dir = "reports"

[charts]
width = 1280
height = 720
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.data.dir, PathBuf::from("exports/q4"));
        assert_eq!(config.data.sales_file, "sales.csv");
        // Unset fields fall back to defaults.
        assert_eq!(config.data.survey_file, "marketpulse_survey.csv");
        assert_eq!(config.output.dir, PathBuf::from("reports"));
        assert_eq!(config.output.charts_subdir, "charts");
        assert_eq!(config.charts.width, 1280);
        assert_eq!(config.charts.height, 720);
    }

    #[test]
    fn test_merge_with_args_overrides_dirs() {
        let args = crate::cli::Args {
            data_dir: Some(PathBuf::from("elsewhere")),
            out_dir: Some(PathBuf::from("reports")),
            config: None,
            skip_charts: false,
            verbose: false,
            quiet: false,
            init_config: false,
        };

        let mut config = Config::default();
        config.merge_with_args(&args);

        assert_eq!(config.data.dir, PathBuf::from("elsewhere"));
        assert_eq!(config.output.dir, PathBuf::from("reports"));
        // File names come from the config, not the CLI.
        assert_eq!(config.data.sales_file, "marketpulse_sales.csv");
    }

    #[test]
    fn test_merge_with_args_keeps_config_when_unset() {
        let args = crate::cli::Args {
            data_dir: None,
            out_dir: None,
            config: None,
            skip_charts: false,
            verbose: false,
            quiet: false,
            init_config: false,
        };

        let mut config = Config::default();
        config.data.dir = PathBuf::from("from-file");
        config.merge_with_args(&args);

        assert_eq!(config.data.dir, PathBuf::from("from-file"));
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("[charts]"));
    }
}
