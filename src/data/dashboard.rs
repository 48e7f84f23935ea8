use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use super::cache::SeriesCache;
use super::filter::intersection_bounds;
use super::loader::load_table;
use super::model::{Indicator, Series};
use super::normalize::{load_co2, load_disasters, load_energy, load_gdp, load_temperature};
use crate::config::DashboardConfig;

// ---------------------------------------------------------------------------
// DashboardData – every tidy series the charts consume
// ---------------------------------------------------------------------------

/// The loaded indicator series. Cheap to clone; the series themselves are
/// shared with the cache and never mutated.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub country: String,
    pub co2: Arc<[Series]>,
    pub energy: Arc<[Series]>,
    pub gdp: Arc<[Series]>,
    pub temperature: Arc<[Series]>,
    pub disasters: Option<Arc<[Series]>>,
}

impl DashboardData {
    /// Load every configured source, reusing cached series where possible.
    /// Any schema or I/O error aborts the whole load.
    pub fn load(config: &DashboardConfig, cache: &mut SeriesCache) -> Result<Self> {
        let country = config.country.trim().to_string();
        let sources = &config.sources;

        let co2 = cache.get_or_load("co2", &country, &config.resolve(&sources.co2), |path| {
            let co2 = load_co2(&load_table(path)?, &country)?;
            Ok(vec![co2.country, co2.world])
        })?;
        let energy = cache.get_or_load("energy", &country, &config.resolve(&sources.energy), |path| {
            Ok(vec![load_energy(&load_table(path)?, &country)?])
        })?;
        let gdp = cache.get_or_load("gdp", &country, &config.resolve(&sources.gdp), |path| {
            Ok(vec![load_gdp(&load_table(path)?, &country)?])
        })?;
        let temperature =
            cache.get_or_load("temperature", &country, &config.resolve(&sources.temperature), |path| {
                Ok(vec![load_temperature(&load_table(path)?)?])
            })?;
        let disasters = sources
            .disasters
            .as_deref()
            .map(|file: &Path| {
                cache.get_or_load("disasters", &country, &config.resolve(file), |path| {
                    Ok(vec![load_disasters(&load_table(path)?, &country)?])
                })
            })
            .transpose()?;

        let data = DashboardData {
            country,
            co2,
            energy,
            gdp,
            temperature,
            disasters,
        };
        for s in data.all_series() {
            log::info!(
                "{}: {} points ({:?}–{:?})",
                s.indicator,
                s.len(),
                s.min_year(),
                s.max_year()
            );
        }
        Ok(data)
    }

    /// Every loaded series, in chart order.
    pub fn all_series(&self) -> impl Iterator<Item = &Series> {
        self.co2
            .iter()
            .chain(self.energy.iter())
            .chain(self.gdp.iter())
            .chain(self.temperature.iter())
            .chain(self.disasters.iter().flat_map(|d| d.iter()))
    }

    pub fn series(&self, indicator: Indicator) -> Option<&Series> {
        self.all_series().find(|s| s.indicator == indicator)
    }

    /// Years shared by every loaded series.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        intersection_bounds(self.all_series())
    }
}

/// `DashboardData::load` with the failing source named in the error chain.
pub fn load_dashboard(config: &DashboardConfig, cache: &mut SeriesCache) -> Result<DashboardData> {
    DashboardData::load(config, cache)
        .with_context(|| format!("loading data from {}", config.data_dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceFiles;
    use crate::data::error::DataError;
    use std::path::PathBuf;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    fn fixture() -> (tempfile::TempDir, DashboardConfig) {
        let dir = tempfile::tempdir().unwrap();
        let d = dir.path();
        write(d, "co2.csv", ",2018,2019,2020\nChina,9000,10000,11000\nChina,,,\nUSA,85000,90000,95000\n");
        write(d, "energy.csv", "country,2019.0,2020.0\nChina,2300,2350\n");
        write(d, "gdp.csv", "Country Name,Country Code,2019,2020,2021\nChina,CHN,5.5,2.0,8.0\n");
        write(d, "temp.csv", "Year , Temp (°C)\n2017,8.9\n2019,9.1\n2020,9.3\n");
        write(d, "disasters.csv", "Start Year,Country\n2019,China\n2019,China\n2020,China\n2020,Japan\n");

        let config = DashboardConfig {
            data_dir: d.to_path_buf(),
            country: " china ".to_string(),
            default_start_year: 1980,
            sources: SourceFiles {
                co2: PathBuf::from("co2.csv"),
                energy: PathBuf::from("energy.csv"),
                gdp: PathBuf::from("gdp.csv"),
                temperature: PathBuf::from("temp.csv"),
                disasters: Some(PathBuf::from("disasters.csv")),
            },
        };
        (dir, config)
    }

    #[test]
    fn loads_all_sources_and_intersects_years() {
        let (_dir, config) = fixture();
        let mut cache = SeriesCache::new();
        let data = load_dashboard(&config, &mut cache).unwrap();

        let co2 = data.series(Indicator::Co2).unwrap();
        assert_eq!(co2.value_at(2019), Some(10.0));
        let world = data.series(Indicator::WorldCo2).unwrap();
        assert_eq!(world.value_at(2020), Some(106.0));
        let disasters = data.series(Indicator::Disasters).unwrap();
        assert_eq!(disasters.value_at(2019), Some(2.0));
        assert_eq!(disasters.value_at(2020), Some(1.0));

        assert_eq!(data.year_bounds(), Some((2019, 2020)));
        assert_eq!(cache.len(), 5);
    }

    #[test]
    fn reload_hits_the_cache() {
        let (_dir, config) = fixture();
        let mut cache = SeriesCache::new();
        let first = load_dashboard(&config, &mut cache).unwrap();
        let second = load_dashboard(&config, &mut cache).unwrap();
        assert!(Arc::ptr_eq(&first.co2, &second.co2));
        assert_eq!(cache.stats(), (5, 5));
    }

    #[test]
    fn changing_country_reloads_its_series() {
        let (dir, mut config) = fixture();
        write(dir.path(), "co2.csv", ",2019,2020\nChina,10000,11000\nUSA,90000,95000\n");
        write(dir.path(), "energy.csv", "country,2019,2020\nChina,2300,2350\nUSA,6800,6400\n");
        write(dir.path(), "gdp.csv", "Country Name,2019,2020\nChina,5.5,2.0\nUSA,1.8,-3.7\n");
        write(dir.path(), "disasters.csv", "Start Year,Country\n2019,China\n2020,USA\n");
        let mut cache = SeriesCache::new();
        load_dashboard(&config, &mut cache).unwrap();

        config.country = "USA".to_string();
        let data = load_dashboard(&config, &mut cache).unwrap();
        assert_eq!(data.series(Indicator::Co2).unwrap().value_at(2020), Some(95.0));
        assert_eq!(data.series(Indicator::GdpGrowth).unwrap().value_at(2020), Some(-3.7));
        assert_eq!(data.series(Indicator::Disasters).unwrap().value_at(2020), Some(1.0));
    }

    #[test]
    fn schema_error_aborts_load() {
        let (dir, config) = fixture();
        write(dir.path(), "temp.csv", "Year,Rainfall\n2019,1\n");
        let mut cache = SeriesCache::new();
        let err = load_dashboard(&config, &mut cache).unwrap_err();
        let schema = err
            .chain()
            .find_map(|e| e.downcast_ref::<DataError>())
            .cloned();
        assert!(matches!(schema, Some(DataError::MissingColumn { .. })));
    }

    #[test]
    fn disasters_are_optional() {
        let (_dir, mut config) = fixture();
        config.sources.disasters = None;
        let mut cache = SeriesCache::new();
        let data = load_dashboard(&config, &mut cache).unwrap();
        assert!(data.series(Indicator::Disasters).is_none());
        assert_eq!(data.year_bounds(), Some((2019, 2020)));
    }
}
