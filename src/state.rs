use std::path::PathBuf;

use crate::config::DashboardConfig;
use crate::data::cache::SeriesCache;
use crate::data::dashboard::{load_dashboard, DashboardData};
use crate::data::error::Unavailable;
use crate::data::filter::YearWindow;
use crate::data::metrics::{
    inner_join, linear_trend, pearson, share_of_total, Correlation, JoinedRow, TrendLine,
};
use crate::data::model::{Indicator, Series};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Tidy series memoised across reloads.
    pub cache: SeriesCache,

    /// Loaded series (None until a load succeeds).
    pub data: Option<DashboardData>,

    /// Selected year range; None when the series share no years.
    pub window: Option<YearWindow>,

    /// Fatal load error replacing the charts.
    pub load_error: Option<String>,

    /// Non-fatal status shown in the top bar.
    pub status_message: Option<String>,

    /// Whether the per-year data table is shown under the charts.
    pub show_table: bool,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            cache: SeriesCache::new(),
            data: None,
            window: None,
            load_error: None,
            status_message: None,
            show_table: false,
        }
    }

    /// (Re)load every source through the cache and refit the window.
    pub fn reload(&mut self) {
        match load_dashboard(&self.config, &mut self.cache) {
            Ok(data) => self.set_data(data),
            Err(e) => {
                log::error!("Failed to load data: {e:#}");
                self.data = None;
                self.window = None;
                self.load_error = Some(format!("{e:#}"));
            }
        }
    }

    /// Drop every cached series, then reload from disk.
    pub fn clear_cache_and_reload(&mut self) {
        self.cache.clear();
        self.reload();
    }

    /// Point the dashboard at another data directory.
    pub fn set_data_dir(&mut self, dir: PathBuf) {
        log::info!("Data directory set to {}", dir.display());
        self.config.data_dir = dir;
        self.reload();
    }

    /// Ingest freshly loaded data and fit the window to its year bounds.
    pub fn set_data(&mut self, data: DashboardData) {
        self.window = match (data.year_bounds(), self.window) {
            (Some(bounds), Some(mut w)) => {
                w.rebound(bounds);
                Some(w)
            }
            (Some(bounds), None) => Some(YearWindow::with_default_start(
                bounds,
                self.config.default_start_year,
            )),
            (None, _) => None,
        };
        self.status_message = self
            .window
            .is_none()
            .then(|| Unavailable::NoCommonYears.to_string());
        self.load_error = None;
        self.data = Some(data);
    }

    pub fn set_window_start(&mut self, year: i32) {
        if let Some(w) = &mut self.window {
            w.set_start(year);
        }
    }

    pub fn set_window_end(&mut self, year: i32) {
        if let Some(w) = &mut self.window {
            w.set_end(year);
        }
    }

    /// Back to the initial window for the current bounds.
    pub fn reset_window(&mut self) {
        if let Some(w) = &mut self.window {
            *w = YearWindow::with_default_start((w.min, w.max), self.config.default_start_year);
        }
    }

    /// Everything one render pass needs, derived from the cached series.
    pub fn view(&self) -> Option<WindowedView> {
        let data = self.data.as_ref()?;
        let window = self.window?;
        Some(WindowedView::new(data, &window))
    }
}

// ---------------------------------------------------------------------------
// WindowedView – per-render derived data
// ---------------------------------------------------------------------------

/// Windowed copies of every series plus the derived metrics.
#[derive(Debug, Clone)]
pub struct WindowedView {
    pub window: YearWindow,
    pub series: Vec<Series>,
    pub scatter: Vec<JoinedRow>,
    pub correlation: Result<Correlation, Unavailable>,
    pub trend: Result<TrendLine, Unavailable>,
    pub share: Result<Series, Unavailable>,
}

impl WindowedView {
    pub fn new(data: &DashboardData, window: &YearWindow) -> Self {
        let windowed = |indicator: Indicator| {
            data.series(indicator)
                .map(|s| window.apply(s))
                .unwrap_or_else(|| Series::empty(indicator))
        };
        let co2 = windowed(Indicator::Co2);
        let world = windowed(Indicator::WorldCo2);
        let temperature = windowed(Indicator::Temperature);

        WindowedView {
            window: *window,
            scatter: inner_join(&co2, &temperature),
            correlation: pearson(&co2, &temperature),
            trend: linear_trend(&co2, &temperature),
            share: share_of_total(&co2, &world),
            series: data.all_series().map(|s| window.apply(s)).collect(),
        }
    }

    /// A windowed series, or why it cannot be charted.
    pub fn get(&self, indicator: Indicator) -> Result<&Series, Unavailable> {
        self.series
            .iter()
            .find(|s| s.indicator == indicator && !s.is_empty())
            .ok_or_else(|| Unavailable::Empty(indicator.to_string()))
    }

    pub fn has(&self, indicator: Indicator) -> bool {
        self.series.iter().any(|s| s.indicator == indicator)
    }
}
