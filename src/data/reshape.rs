use super::error::DataError;
use super::model::{LongRow, LongTable, RawTable};

/// Inclusive range of labels accepted as calendar years.
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1700..=2100;

/// Header synonyms tried when the expected identifier column is missing.
const ID_SYNONYMS: [&str; 3] = ["country", "country name", "nation"];

/// A header recognised as a year column.
#[derive(Debug, Clone, PartialEq)]
pub struct YearColumn {
    pub index: usize,
    pub year: i32,
}

// ---------------------------------------------------------------------------
// Year-column detection
// ---------------------------------------------------------------------------

/// Parse a header label as a year: float parse, truncate, range check.
/// `"2019"`, `"2019.0"` and `" 2019 "` all give `Some(2019)`.
pub fn parse_year_label(label: &str) -> Option<i32> {
    let v = label.trim().parse::<f64>().ok()?;
    if !v.is_finite() {
        return None;
    }
    let year = v.trunc();
    if year < *YEAR_RANGE.start() as f64 || year > *YEAR_RANGE.end() as f64 {
        return None;
    }
    Some(year as i32)
}

/// Return the year-like headers, in original column order.
pub fn detect_year_columns(headers: &[String]) -> Vec<YearColumn> {
    headers
        .iter()
        .enumerate()
        .filter_map(|(index, label)| {
            parse_year_label(label).map(|year| YearColumn { index, year })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Identifier column resolution
// ---------------------------------------------------------------------------

/// Find the identifier column: the expected name, then known synonyms
/// (case-insensitive, trimmed), then the first column.
pub fn resolve_id_column(table: &RawTable, expected: &str) -> Result<usize, DataError> {
    if table.headers.is_empty() {
        return Err(DataError::NoColumns {
            table: table.name.clone(),
        });
    }
    if let Some(idx) = table.column_index(expected) {
        return Ok(idx);
    }
    for synonym in ID_SYNONYMS {
        if let Some(idx) = table
            .headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(synonym))
        {
            return Ok(idx);
        }
    }
    Ok(0)
}

// ---------------------------------------------------------------------------
// Wide → long
// ---------------------------------------------------------------------------

/// Reshape a wide table (one identifier column, one column per year) into
/// tidy rows, one per (identifier row × year column), sorted by year.
///
/// Cells that are empty or non-numeric keep their row with `value: None`.
/// Duplicate identifier+year combinations are kept as-is.
pub fn wide_to_long(
    table: &RawTable,
    id_column: &str,
    value_name: &str,
) -> Result<LongTable, DataError> {
    let id_idx = resolve_id_column(table, id_column)?;
    let years: Vec<YearColumn> = detect_year_columns(&table.headers)
        .into_iter()
        .filter(|yc| yc.index != id_idx)
        .collect();

    if years.is_empty() {
        return Err(DataError::NoYearColumns {
            table: table.name.clone(),
            headers: table.headers.clone(),
        });
    }

    let mut rows = Vec::with_capacity(table.len() * years.len());
    for r in 0..table.len() {
        let id = table.cell(r, id_idx).as_text();
        for yc in &years {
            rows.push(LongRow {
                id: id.clone(),
                year: yc.year,
                value: table.cell(r, yc.index).as_f64(),
            });
        }
    }
    // Stable: rows keep source order within a year.
    rows.sort_by_key(|row| row.year);
    log::debug!(
        "{}: {} year columns → {} '{value_name}' rows",
        table.name,
        years.len(),
        rows.len()
    );

    Ok(LongTable {
        id_column: table.headers[id_idx].clone(),
        value_name: value_name.to_string(),
        rows,
    })
}
