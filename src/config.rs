use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "CO2_DASHBOARD_CONFIG";
/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.json";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Where the source files live and which country to chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory the source file names are resolved against.
    pub data_dir: PathBuf,
    /// Target country (trimmed, case-insensitive match).
    pub country: String,
    /// Preferred first year of the initial window.
    pub default_start_year: i32,
    pub sources: SourceFiles,
}

/// File names (or paths) of each source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFiles {
    pub co2: PathBuf,
    pub energy: PathBuf,
    pub gdp: PathBuf,
    pub temperature: PathBuf,
    /// Disaster counts are optional; `null` hides the chart.
    pub disasters: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            country: "China".to_string(),
            default_start_year: 1980,
            sources: SourceFiles::default(),
        }
    }
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            co2: PathBuf::from("yearly_co2_emissions_1000_tonnes (1).xlsx"),
            energy: PathBuf::from("energy_use_per_person.xlsx"),
            gdp: PathBuf::from("gdp_per_capita_yearly_growth.xlsx"),
            temperature: PathBuf::from("temperature_china_cleaned.csv"),
            disasters: Some(PathBuf::from("natural_disasters_china.csv")),
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Resolve the config: explicit path, then `$CO2_DASHBOARD_CONFIG`, then
    /// `dashboard.json` in the working directory, then built-in defaults.
    pub fn discover(explicit: Option<PathBuf>) -> Result<Self> {
        let candidate = explicit.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        if let Some(path) = candidate {
            log::info!("Using config {}", path.display());
            return Self::from_file(&path);
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            log::info!("Using config {}", local.display());
            return Self::from_file(local);
        }
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Source path resolved against `data_dir` (absolute paths pass through).
    pub fn resolve(&self, file: &Path) -> PathBuf {
        self.data_dir.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        std::fs::write(
            &path,
            r#"{ "country": "India", "sources": { "temperature": "temp_india.csv", "disasters": null } }"#,
        )
        .unwrap();

        let cfg = DashboardConfig::from_file(&path).unwrap();
        assert_eq!(cfg.country, "India");
        assert_eq!(cfg.default_start_year, 1980);
        assert_eq!(cfg.sources.temperature, PathBuf::from("temp_india.csv"));
        assert_eq!(cfg.sources.co2, SourceFiles::default().co2);
        assert_eq!(cfg.sources.disasters, None);
    }

    #[test]
    fn explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(&path, r#"{ "default_start_year": 1990 }"#).unwrap();
        let cfg = DashboardConfig::discover(Some(path)).unwrap();
        assert_eq!(cfg.default_start_year, 1990);
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(DashboardConfig::from_file(&path).is_err());
    }

    #[test]
    fn resolve_joins_data_dir() {
        let cfg = DashboardConfig {
            data_dir: PathBuf::from("/srv/data"),
            ..DashboardConfig::default()
        };
        assert_eq!(
            cfg.resolve(&cfg.sources.gdp),
            PathBuf::from("/srv/data/gdp_per_capita_yearly_growth.xlsx")
        );
    }
}
