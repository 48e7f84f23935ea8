use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a raw table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring what spreadsheet exports contain.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Numeric coercion: numbers pass through, numeric text is parsed,
    /// everything else (including NaN) is missing.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            CellValue::Float(v) => *v,
            CellValue::Integer(i) => *i as f64,
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
            CellValue::Bool(_) | CellValue::Null => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Trimmed text form used for identifier columns. Null becomes "".
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Null => String::new(),
            other => other.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// RawTable – one loaded file before normalisation
// ---------------------------------------------------------------------------

/// A loaded table: untrusted header labels plus rows of typed cells.
/// Every row has exactly `headers.len()` cells (short rows are padded with
/// `Null` by the loaders).
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Human-readable origin (usually the file name), used in diagnostics.
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        RawTable {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.headers.len(), CellValue::Null);
        self.rows.push(row);
    }

    /// Exact header lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Header lookup ignoring surrounding whitespace, case and inner spaces.
    pub fn find_column_loose(&self, name: &str) -> Option<usize> {
        let wanted = loose_key(name);
        self.headers.iter().position(|h| loose_key(h) == wanted)
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&CellValue::Null)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Lower-cased header with all whitespace removed: `" Start  Year"` → `"startyear"`.
pub fn loose_key(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

// ---------------------------------------------------------------------------
// LongTable – output of the wide-to-long reshape
// ---------------------------------------------------------------------------

/// One (identifier, year) cell of a reshaped wide table.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRow {
    pub id: String,
    pub year: i32,
    /// `None` when the source cell was empty or non-numeric.
    pub value: Option<f64>,
}

/// Tidy (identifier, Year, value) rows sorted ascending by year.
#[derive(Debug, Clone, Default)]
pub struct LongTable {
    pub id_column: String,
    pub value_name: String,
    pub rows: Vec<LongRow>,
}

// ---------------------------------------------------------------------------
// Indicator / Series – the tidy output handed to the presentation layer
// ---------------------------------------------------------------------------

/// The indicators the dashboard knows how to chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Indicator {
    Co2,
    WorldCo2,
    Energy,
    GdpGrowth,
    Temperature,
    Disasters,
    /// Target country's CO₂ as a percentage of the world total.
    Co2Share,
}

impl Indicator {
    pub const ALL: [Indicator; 7] = [
        Indicator::Co2,
        Indicator::WorldCo2,
        Indicator::Energy,
        Indicator::GdpGrowth,
        Indicator::Temperature,
        Indicator::Disasters,
        Indicator::Co2Share,
    ];

    /// Canonical value-column name.
    pub fn column(self) -> &'static str {
        match self {
            Indicator::Co2 => "CO₂ (Mt)",
            Indicator::WorldCo2 => "CO₂_World (Mt)",
            Indicator::Energy => "Energy (kg oil-eq./capita)",
            Indicator::GdpGrowth => "GDP Growth (%)",
            Indicator::Temperature => "Temperature (°C)",
            Indicator::Disasters => "Disasters",
            Indicator::Co2Share => "CO₂ % of World",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A single (Year, Value) observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub year: i32,
    pub value: f64,
}

/// An indicator series: unique, strictly increasing years; missing years
/// are simply absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub indicator: Indicator,
    pub points: Vec<Observation>,
}

impl Series {
    /// Build a series from arbitrary (year, value) pairs.
    ///
    /// Pairs are stably sorted by year; for a repeated year the first value
    /// in input order wins and the rest are reported as dropped.
    pub fn from_pairs(indicator: Indicator, pairs: impl IntoIterator<Item = (i32, f64)>) -> Self {
        let mut pairs: Vec<(i32, f64)> = pairs.into_iter().collect();
        pairs.sort_by_key(|&(year, _)| year);

        let mut points: Vec<Observation> = Vec::with_capacity(pairs.len());
        let mut dropped = 0usize;
        for (year, value) in pairs {
            if points.last().is_some_and(|p| p.year == year) {
                dropped += 1;
                continue;
            }
            points.push(Observation { year, value });
        }
        if dropped > 0 {
            log::warn!("{indicator}: dropped {dropped} duplicate year value(s), keeping the first");
        }
        Series { indicator, points }
    }

    pub fn empty(indicator: Indicator) -> Self {
        Series {
            indicator,
            points: Vec::new(),
        }
    }

    pub fn min_year(&self) -> Option<i32> {
        self.points.first().map(|p| p.year)
    }

    pub fn max_year(&self) -> Option<i32> {
        self.points.last().map(|p| p.year)
    }

    pub fn value_at(&self, year: i32) -> Option<f64> {
        self.points
            .binary_search_by_key(&year, |p| p.year)
            .ok()
            .map(|i| self.points[i].value)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
