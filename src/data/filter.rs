use super::model::{LongTable, Series};

// ---------------------------------------------------------------------------
// Country filter
// ---------------------------------------------------------------------------

/// Whitespace-trimmed, case-insensitive exact match on an identifier.
pub fn country_matches(id: &str, target: &str) -> bool {
    id.trim().to_lowercase() == target.trim().to_lowercase()
}

/// Keep only the rows of `table` whose identifier is `country`.
/// Zero matches is not an error; the result is simply empty.
pub fn filter_country(table: &LongTable, country: &str) -> LongTable {
    LongTable {
        id_column: table.id_column.clone(),
        value_name: table.value_name.clone(),
        rows: table
            .rows
            .iter()
            .filter(|row| country_matches(&row.id, country))
            .cloned()
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Year window
// ---------------------------------------------------------------------------

/// Year range shared by every non-empty series: (max of minima, min of maxima).
///
/// Empty series are skipped. Returns `None` when nothing is loaded or the
/// ranges do not overlap.
pub fn intersection_bounds<'a>(series: impl IntoIterator<Item = &'a Series>) -> Option<(i32, i32)> {
    let mut bounds: Option<(i32, i32)> = None;
    for s in series {
        let (Some(lo), Some(hi)) = (s.min_year(), s.max_year()) else {
            continue;
        };
        bounds = Some(match bounds {
            None => (lo, hi),
            Some((cur_lo, cur_hi)) => (cur_lo.max(lo), cur_hi.min(hi)),
        });
    }
    bounds.filter(|(lo, hi)| lo <= hi)
}

/// A closed, never-empty year interval `[start, end]` inside fixed bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearWindow {
    pub start: i32,
    pub end: i32,
    pub min: i32,
    pub max: i32,
}

impl YearWindow {
    /// Initial window: from the later of `bounds.0` and `preferred_start`
    /// up to the upper bound.
    pub fn with_default_start(bounds: (i32, i32), preferred_start: i32) -> Self {
        let (min, max) = bounds;
        YearWindow {
            start: preferred_start.clamp(min, max),
            end: max,
            min,
            max,
        }
    }

    /// Move the start, dragging `end` along if they would cross.
    pub fn set_start(&mut self, year: i32) {
        self.start = year.clamp(self.min, self.max);
        self.end = self.end.max(self.start);
    }

    /// Move the end, dragging `start` along if they would cross.
    pub fn set_end(&mut self, year: i32) {
        self.end = year.clamp(self.min, self.max);
        self.start = self.start.min(self.end);
    }

    /// Re-fit the window inside new bounds, keeping the current selection
    /// where it still fits.
    pub fn rebound(&mut self, bounds: (i32, i32)) {
        self.min = bounds.0;
        self.max = bounds.1;
        self.start = self.start.clamp(self.min, self.max);
        self.end = self.end.clamp(self.start, self.max);
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    /// A fresh copy of `series` restricted to the window.
    pub fn apply(&self, series: &Series) -> Series {
        Series {
            indicator: series.indicator,
            points: series
                .points
                .iter()
                .filter(|p| self.contains(p.year))
                .copied()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Indicator, LongRow};

    fn long(ids: &[(&str, i32, f64)]) -> LongTable {
        LongTable {
            id_column: "Country".into(),
            value_name: "v".into(),
            rows: ids
                .iter()
                .map(|&(id, year, v)| LongRow {
                    id: id.to_string(),
                    year,
                    value: Some(v),
                })
                .collect(),
        }
    }

    fn span(indicator: Indicator, from: i32, to: i32) -> Series {
        Series::from_pairs(indicator, (from..=to).map(|y| (y, y as f64)))
    }

    #[test]
    fn country_filter_is_exact_and_case_insensitive() {
        let t = long(&[(" china ", 2000, 1.0), ("CHINA", 2001, 2.0), ("China, Hong Kong", 2000, 3.0)]);
        let cn = filter_country(&t, "China");
        assert_eq!(cn.rows.len(), 2);
        assert!(filter_country(&t, "Atlantis").rows.is_empty());
    }

    #[test]
    fn country_filter_is_idempotent() {
        let t = long(&[("China", 2000, 1.0), ("USA", 2000, 2.0), ("china", 2001, 3.0)]);
        let once = filter_country(&t, "China");
        let twice = filter_country(&once, "China");
        assert_eq!(once.rows, twice.rows);
    }

    #[test]
    fn intersection_is_inside_every_series() {
        let all = vec![
            span(Indicator::Co2, 1960, 2020),
            span(Indicator::Temperature, 1975, 2022),
            span(Indicator::Energy, 1971, 2015),
        ];
        let (lo, hi) = intersection_bounds(&all).unwrap();
        assert_eq!((lo, hi), (1975, 2015));
        for s in &all {
            assert!(lo >= s.min_year().unwrap());
            assert!(hi <= s.max_year().unwrap());
        }
    }

    #[test]
    fn narrowing_one_series_never_widens_bounds() {
        let mut all = vec![span(Indicator::Co2, 1960, 2020), span(Indicator::GdpGrowth, 1961, 2021)];
        let before = intersection_bounds(&all).unwrap();
        all[1] = span(Indicator::GdpGrowth, 1990, 2000);
        let after = intersection_bounds(&all).unwrap();
        assert!(after.0 >= before.0 && after.1 <= before.1);
    }

    #[test]
    fn empty_series_are_skipped_and_disjoint_ranges_give_none() {
        let all = vec![span(Indicator::Co2, 1990, 2000), Series::empty(Indicator::Disasters)];
        assert_eq!(intersection_bounds(&all), Some((1990, 2000)));

        let disjoint = vec![span(Indicator::Co2, 1900, 1950), span(Indicator::Energy, 1960, 2000)];
        assert_eq!(intersection_bounds(&disjoint), None);
        assert_eq!(intersection_bounds(&Vec::<Series>::new()), None);
    }

    #[test]
    fn default_window_prefers_modern_era() {
        let w = YearWindow::with_default_start((1960, 2020), 1980);
        assert_eq!((w.start, w.end), (1980, 2020));
        let w = YearWindow::with_default_start((1990, 2020), 1980);
        assert_eq!((w.start, w.end), (1990, 2020));
        let w = YearWindow::with_default_start((1960, 1975), 1980);
        assert_eq!((w.start, w.end), (1975, 1975));
    }

    #[test]
    fn window_never_empty_and_clamped() {
        let mut w = YearWindow::with_default_start((1970, 2010), 1970);
        w.set_start(2050);
        assert_eq!((w.start, w.end), (2010, 2010));
        w.set_end(1900);
        assert_eq!((w.start, w.end), (1970, 1970));
        w.set_end(2000);
        w.rebound((1980, 1990));
        assert_eq!((w.start, w.end), (1980, 1990));
    }

    #[test]
    fn apply_returns_windowed_copy() {
        let s = span(Indicator::Co2, 1995, 2005);
        let mut w = YearWindow::with_default_start((1995, 2005), 1995);
        w.set_start(2000);
        w.set_end(2002);
        let cut = w.apply(&s);
        assert_eq!(cut.points.iter().map(|p| p.year).collect::<Vec<_>>(), vec![2000, 2001, 2002]);
        assert_eq!(s.len(), 11);
    }
}
