use std::collections::BTreeMap;

use super::error::DataError;
use super::filter::{country_matches, filter_country};
use super::model::{CellValue, Indicator, LongTable, RawTable, Series};
use super::reshape::{wide_to_long, YEAR_RANGE};

// ---------------------------------------------------------------------------
// Source header names
// ---------------------------------------------------------------------------

const CO2_ID: &str = "country";
const CO2_KT: &str = "CO2_kt";
const ENERGY_ID: &str = "country";
const GDP_ID: &str = "Country Name";

const YEAR: &str = "Year";
const TEMPERATURE_ALIASES: [&str; 3] = ["Temperature (°C)", "Temp (°C)", "Value"];
const DISASTER_COUNT_ALIASES: [&str; 2] = ["Disasters", "Disaster Count"];
const RAW_YEAR_ALIASES: [&str; 2] = ["start year", "year"];
const RAW_COUNTRY: &str = "country";

/// Kilotonnes per megatonne.
const KT_PER_MT: f64 = 1000.0;

// ---------------------------------------------------------------------------
// Wide indicators: CO₂, energy, GDP growth
// ---------------------------------------------------------------------------

/// The CO₂ file yields two series: the target country and the world total.
#[derive(Debug, Clone)]
pub struct Co2Series {
    pub country: Series,
    pub world: Series,
}

/// Wide CO₂ table in kilotonnes → (country Mt, world Mt).
///
/// The world total is the per-year sum over every identifier row; a year
/// contributes only if at least one row has a value for it.
pub fn load_co2(table: &RawTable, country: &str) -> Result<Co2Series, DataError> {
    let long = wide_to_long(table, CO2_ID, CO2_KT)?;

    let mut world: BTreeMap<i32, f64> = BTreeMap::new();
    for row in &long.rows {
        if let Some(kt) = row.value {
            *world.entry(row.year).or_insert(0.0) += kt / KT_PER_MT;
        }
    }

    Ok(Co2Series {
        country: country_series(&long, country, Indicator::Co2, KT_PER_MT),
        world: Series::from_pairs(Indicator::WorldCo2, world),
    })
}

/// Wide energy-use-per-person table → target country series.
pub fn load_energy(table: &RawTable, country: &str) -> Result<Series, DataError> {
    let long = wide_to_long(table, ENERGY_ID, Indicator::Energy.column())?;
    Ok(country_series(&long, country, Indicator::Energy, 1.0))
}

/// World Bank-style GDP-per-capita-growth table → target country series.
pub fn load_gdp(table: &RawTable, country: &str) -> Result<Series, DataError> {
    let long = wide_to_long(table, GDP_ID, Indicator::GdpGrowth.column())?;
    Ok(country_series(&long, country, Indicator::GdpGrowth, 1.0))
}

fn country_series(long: &LongTable, country: &str, indicator: Indicator, divisor: f64) -> Series {
    let rows = filter_country(long, country).rows;
    if rows.is_empty() {
        log::warn!(
            "{indicator}: no '{}' rows for '{country}' in column '{}'",
            long.value_name,
            long.id_column
        );
    }
    Series::from_pairs(
        indicator,
        rows.into_iter()
            .filter_map(|row| row.value.map(|v| (row.year, v / divisor))),
    )
}

// ---------------------------------------------------------------------------
// Tidy temperature
// ---------------------------------------------------------------------------

/// Tidy temperature table with a `Year` column and a temperature column
/// (`Temperature (°C)`, `Temp (°C)` or `Value`). Header whitespace is ignored.
pub fn load_temperature(table: &RawTable) -> Result<Series, DataError> {
    let trimmed = trim_headers(table);

    let year_idx = trimmed.column_index(YEAR).ok_or_else(|| DataError::MissingColumn {
        table: table.name.clone(),
        wanted: YEAR.to_string(),
        headers: trimmed.headers.clone(),
    })?;
    let value_idx = TEMPERATURE_ALIASES
        .iter()
        .find_map(|alias| trimmed.column_index(alias))
        .ok_or_else(|| DataError::MissingColumn {
            table: table.name.clone(),
            wanted: Indicator::Temperature.column().to_string(),
            headers: trimmed.headers.clone(),
        })?;

    Ok(tidy_series(&trimmed, year_idx, value_idx, Indicator::Temperature))
}

fn trim_headers(table: &RawTable) -> RawTable {
    RawTable {
        name: table.name.clone(),
        headers: table.headers.iter().map(|h| h.trim().to_string()).collect(),
        rows: table.rows.clone(),
    }
}

/// Year cell → calendar year; numeric coercion then truncation.
fn year_from_cell(cell: &CellValue) -> Option<i32> {
    let v = cell.as_f64()?.trunc();
    if v < *YEAR_RANGE.start() as f64 || v > *YEAR_RANGE.end() as f64 {
        return None;
    }
    Some(v as i32)
}

fn tidy_series(table: &RawTable, year_idx: usize, value_idx: usize, indicator: Indicator) -> Series {
    let mut skipped = 0usize;
    let pairs: Vec<(i32, f64)> = (0..table.len())
        .filter_map(|r| {
            let pair = year_from_cell(table.cell(r, year_idx))
                .zip(table.cell(r, value_idx).as_f64());
            if pair.is_none() {
                skipped += 1;
            }
            pair
        })
        .collect();
    if skipped > 0 {
        log::warn!("{}: skipped {skipped} row(s) without a usable year or value", table.name);
    }
    Series::from_pairs(indicator, pairs)
}

// ---------------------------------------------------------------------------
// Disasters: tidy pass-through or raw event aggregation
// ---------------------------------------------------------------------------

/// Shape of a disaster table, decided once per load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisasterLayout {
    /// Already (Year, count) per row.
    Tidy { year: usize, count: usize },
    /// One row per event; counted per year.
    Raw { year: usize, country: Option<usize> },
}

/// Decide between the tidy and raw layouts, or fail when no year column exists.
pub fn classify_disaster_table(table: &RawTable) -> Result<DisasterLayout, DataError> {
    let count = DISASTER_COUNT_ALIASES
        .iter()
        .find_map(|alias| table.find_column_loose(alias));
    if let (Some(year), Some(count)) = (table.find_column_loose(YEAR), count) {
        return Ok(DisasterLayout::Tidy { year, count });
    }

    let year = RAW_YEAR_ALIASES
        .iter()
        .find_map(|alias| table.find_column_loose(alias))
        .ok_or_else(|| DataError::MissingYearColumn {
            table: table.name.clone(),
            headers: table.headers.clone(),
        })?;
    Ok(DisasterLayout::Raw {
        year,
        country: table.find_column_loose(RAW_COUNTRY),
    })
}

/// Yearly disaster counts for `country`.
pub fn load_disasters(table: &RawTable, country: &str) -> Result<Series, DataError> {
    let layout = classify_disaster_table(table)?;
    log::debug!("{}: disaster layout {layout:?}", table.name);

    Ok(match layout {
        DisasterLayout::Tidy { year, count } => {
            tidy_series(table, year, count, Indicator::Disasters)
        }
        DisasterLayout::Raw {
            year,
            country: country_idx,
        } => {
            let mut counts: BTreeMap<i32, u32> = BTreeMap::new();
            for r in 0..table.len() {
                if let Some(c) = country_idx {
                    if !country_matches(&table.cell(r, c).as_text(), country) {
                        continue;
                    }
                }
                if let Some(y) = year_from_cell(table.cell(r, year)) {
                    *counts.entry(y).or_insert(0) += 1;
                }
            }
            Series::from_pairs(
                Indicator::Disasters,
                counts.into_iter().map(|(y, n)| (y, f64::from(n))),
            )
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Observation;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn table(name: &str, headers: &[&str], rows: Vec<Vec<CellValue>>) -> RawTable {
        let mut t = RawTable::new(name, headers.iter().map(|s| s.to_string()).collect());
        for row in rows {
            t.push_row(row);
        }
        t
    }

    fn pairs(s: &Series) -> Vec<(i32, f64)> {
        s.points.iter().map(|p| (p.year, p.value)).collect()
    }

    #[test]
    fn co2_end_to_end_scenario() {
        let t = table(
            "co2.csv",
            &["", "2019", "2020"],
            vec![
                vec![text("China"), CellValue::Integer(10000), CellValue::Integer(11000)],
                vec![text("China"), CellValue::Null, CellValue::Null],
                vec![text("USA"), CellValue::Integer(90000), CellValue::Integer(95000)],
            ],
        );
        let co2 = load_co2(&t, "China").unwrap();
        assert_eq!(pairs(&co2.country), vec![(2019, 10.0), (2020, 11.0)]);
        assert_eq!(pairs(&co2.world), vec![(2019, 100.0), (2020, 106.0)]);
    }

    #[test]
    fn co2_world_skips_years_without_any_value() {
        let t = table(
            "co2.csv",
            &["country", "1999", "2000"],
            vec![vec![text("China"), CellValue::Null, CellValue::Float(1000.0)]],
        );
        let co2 = load_co2(&t, "china").unwrap();
        assert_eq!(co2.world.points, vec![Observation { year: 2000, value: 1.0 }]);
    }

    #[test]
    fn gdp_uses_country_name_column() {
        let t = table(
            "gdp.csv",
            &["Country Code", "Country Name", "Indicator Name", "2000", "2001"],
            vec![
                vec![text("CHN"), text("China"), text("growth"), CellValue::Float(7.6), CellValue::Float(7.6)],
                vec![text("USA"), text("United States"), text("growth"), CellValue::Float(3.0), CellValue::Null],
            ],
        );
        let gdp = load_gdp(&t, "China").unwrap();
        assert_eq!(gdp.indicator, Indicator::GdpGrowth);
        assert_eq!(pairs(&gdp), vec![(2000, 7.6), (2001, 7.6)]);
    }

    #[test]
    fn missing_country_gives_empty_series() {
        let t = table(
            "energy.csv",
            &["country", "2000"],
            vec![vec![text("USA"), CellValue::Float(7000.0)]],
        );
        assert!(load_energy(&t, "China").unwrap().is_empty());
    }

    #[test]
    fn temperature_aliases_and_header_whitespace() {
        let t = table(
            "temp.csv",
            &[" Year ", "Temp (°C)"],
            vec![
                vec![CellValue::Integer(2001), CellValue::Float(8.1)],
                vec![text("bad"), CellValue::Float(9.9)],
                vec![CellValue::Float(2000.0), CellValue::Float(7.9)],
            ],
        );
        let temp = load_temperature(&t).unwrap();
        assert_eq!(pairs(&temp), vec![(2000, 7.9), (2001, 8.1)]);

        let t = table("temp.csv", &["Year", "Value"], vec![vec![CellValue::Integer(1990), CellValue::Float(7.0)]]);
        assert_eq!(pairs(&load_temperature(&t).unwrap()), vec![(1990, 7.0)]);
    }

    #[test]
    fn temperature_without_value_column_is_fatal() {
        let t = table("temp.csv", &["Year", "Rainfall"], vec![]);
        match load_temperature(&t) {
            Err(DataError::MissingColumn { wanted, headers, .. }) => {
                assert_eq!(wanted, "Temperature (°C)");
                assert_eq!(headers, vec!["Year".to_string(), "Rainfall".to_string()]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn raw_disaster_events_are_counted_per_year() {
        let t = table(
            "disasters.csv",
            &["Start Year", "Country"],
            vec![
                vec![CellValue::Integer(2008), text("China")],
                vec![CellValue::Integer(2008), text("China")],
                vec![CellValue::Integer(2009), text("China")],
            ],
        );
        let s = load_disasters(&t, "China").unwrap();
        assert_eq!(pairs(&s), vec![(2008, 2.0), (2009, 1.0)]);
    }

    #[test]
    fn raw_disasters_filter_by_country_when_present() {
        let t = table(
            "disasters.csv",
            &["Disaster Type", " start  year ", "country"],
            vec![
                vec![text("Flood"), text("2010.0"), text(" china")],
                vec![text("Storm"), CellValue::Integer(2010), text("Japan")],
                vec![text("Flood"), CellValue::Null, text("China")],
            ],
        );
        assert_eq!(
            classify_disaster_table(&t).unwrap(),
            DisasterLayout::Raw { year: 1, country: Some(2) }
        );
        assert_eq!(pairs(&load_disasters(&t, "China").unwrap()), vec![(2010, 1.0)]);

        let no_country = table(
            "disasters.csv",
            &["Year"],
            vec![vec![CellValue::Integer(2010)], vec![CellValue::Integer(2010)]],
        );
        assert_eq!(pairs(&load_disasters(&no_country, "China").unwrap()), vec![(2010, 2.0)]);
    }

    #[test]
    fn tidy_disasters_pass_through() {
        let t = table(
            "disasters.csv",
            &["Year", "Disaster Count"],
            vec![
                vec![CellValue::Integer(2001), CellValue::Integer(20)],
                vec![CellValue::Integer(2000), CellValue::Integer(17)],
            ],
        );
        assert_eq!(
            classify_disaster_table(&t).unwrap(),
            DisasterLayout::Tidy { year: 0, count: 1 }
        );
        assert_eq!(pairs(&load_disasters(&t, "China").unwrap()), vec![(2000, 17.0), (2001, 20.0)]);
    }

    #[test]
    fn disasters_without_year_column_are_fatal() {
        let t = table("disasters.csv", &["Country", "Deaths"], vec![]);
        assert!(matches!(
            load_disasters(&t, "China"),
            Err(DataError::MissingYearColumn { .. })
        ));
    }
}
