use eframe::egui::{Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

use crate::color::IndicatorColors;
use crate::data::error::Unavailable;
use crate::data::metrics::{year_table, Correlation, TrendLine};
use crate::data::model::{Indicator, Series};
use crate::state::{AppState, WindowedView};

const CHART_HEIGHT: f32 = 240.0;

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render every chart for the current window, or the reason there are none.
pub fn dashboard(ui: &mut Ui, state: &AppState, colors: &IndicatorColors) {
    if let Some(err) = &state.load_error {
        ui.vertical_centered(|ui: &mut Ui| {
            ui.heading("The data could not be loaded");
            ui.add_space(8.0);
            ui.label(RichText::new(err).color(Color32::RED));
            ui.add_space(8.0);
            ui.label("Fix the file or pick another data folder (File → Open data folder…).");
        });
        return;
    }

    let Some(data) = &state.data else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a data folder to start  (File → Open data folder…)");
        });
        return;
    };

    let Some(view) = state.view() else {
        info(ui, &Unavailable::NoCommonYears.to_string());
        return;
    };

    let country = &data.country;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading(format!(
                "{country} CO₂, Temperature, Energy, and GDP: Case Study Dashboard"
            ));
            ui.label(
                RichText::new(format!(
                    "Years {}–{} (shared by all sources: {}–{})",
                    view.window.start, view.window.end, view.window.min, view.window.max
                ))
                .weak(),
            );
            ui.separator();

            ui.columns(2, |cols| {
                line_chart(
                    &mut cols[0],
                    &format!("{country} CO₂ Emissions (Mt)"),
                    view.get(Indicator::Co2),
                    colors,
                    Some("CO₂ converted from thousand tonnes to million tonnes (Mt)."),
                );
                line_chart(
                    &mut cols[1],
                    &format!("{country} Temperature (Annual Mean, °C)"),
                    view.get(Indicator::Temperature),
                    colors,
                    Some("National annual mean temperature."),
                );
            });

            ui.columns(2, |cols| {
                line_chart(
                    &mut cols[0],
                    "Energy Use per Person (kg oil-eq./capita)",
                    view.get(Indicator::Energy),
                    colors,
                    None,
                );
                line_chart(
                    &mut cols[1],
                    "GDP per Capita Growth (%)",
                    view.get(Indicator::GdpGrowth),
                    colors,
                    None,
                );
            });

            if view.has(Indicator::Disasters) {
                line_chart(
                    ui,
                    &format!("Natural Disasters in {country} (events per year)"),
                    view.get(Indicator::Disasters),
                    colors,
                    None,
                );
            }

            ui.separator();
            scatter_chart(ui, country, &view, colors);

            ui.separator();
            line_chart(
                ui,
                &format!("{country}’s CO₂ as % of Global Total"),
                view.share.as_ref().map_err(Clone::clone),
                colors,
                Some("The ratio controls for global totals and shows the changing share."),
            );

            if state.show_table {
                ui.separator();
                data_table(ui, &view);
            }

            ui.separator();
            ui.label(
                RichText::new(
                    "CO₂, energy and GDP growth come from wide (year-per-column) tables \
                     reshaped to tidy form. All charts respect the selected year range.",
                )
                .weak(),
            );
        });
}

fn info(ui: &mut Ui, message: &str) {
    ui.label(RichText::new(format!("ℹ {message}")).color(Color32::LIGHT_BLUE));
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

/// Time series with markers, or an informational placeholder.
fn line_chart(
    ui: &mut Ui,
    title: &str,
    series: Result<&Series, Unavailable>,
    colors: &IndicatorColors,
    caption: Option<&str>,
) {
    ui.strong(title);
    let series = match series {
        Ok(s) if !s.is_empty() => s,
        Ok(s) => {
            info(ui, &Unavailable::Empty(s.indicator.to_string()).to_string());
            return;
        }
        Err(reason) => {
            info(ui, &reason.to_string());
            return;
        }
    };

    let color = colors.color_for(series.indicator);
    let points: Vec<[f64; 2]> = series
        .points
        .iter()
        .map(|p| [f64::from(p.year), p.value])
        .collect();

    Plot::new(title)
        .height(CHART_HEIGHT)
        .x_axis_label("Year")
        .y_axis_label(series.indicator.column())
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(points.clone()))
                    .name(series.indicator.column())
                    .color(color)
                    .width(2.0),
            );
            plot_ui.points(Points::new(PlotPoints::from(points)).radius(3.0).color(color));
        });

    if let Some(text) = caption {
        ui.label(RichText::new(text).weak());
    }
}

/// CO₂ vs temperature scatter with the least-squares trend line.
fn scatter_chart(ui: &mut Ui, country: &str, view: &WindowedView, colors: &IndicatorColors) {
    ui.strong(format!("Relationship: CO₂ vs Temperature ({country})"));
    if view.scatter.is_empty() {
        info(
            ui,
            &Unavailable::NoOverlap {
                left: Indicator::Co2.to_string(),
                right: Indicator::Temperature.to_string(),
            }
            .to_string(),
        );
        return;
    }

    let points: Vec<[f64; 2]> = view.scatter.iter().map(|r| [r.left, r.right]).collect();
    let trend = view.trend.as_ref().ok().map(|t| trend_points(t, &points));

    Plot::new("co2_vs_temperature")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(Indicator::Co2.column())
        .y_axis_label(Indicator::Temperature.column())
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.points(
                Points::new(PlotPoints::from(points))
                    .name("Years")
                    .radius(4.0)
                    .color(colors.color_for(Indicator::Temperature)),
            );
            if let Some(line) = trend {
                plot_ui.line(
                    Line::new(PlotPoints::from(line))
                        .name("OLS trend")
                        .color(Color32::GRAY)
                        .width(1.5),
                );
            }
        });

    match &view.correlation {
        Ok(c) => ui.label(correlation_text(c)),
        Err(reason) => ui.label(RichText::new(format!("ℹ {reason}")).color(Color32::LIGHT_BLUE)),
    };
    ui.label(
        RichText::new("A positive trend suggests years with higher CO₂ tend to be warmer.").weak(),
    );
}

fn trend_points(trend: &TrendLine, points: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let (lo, hi) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p[0]), hi.max(p[0]))
        });
    vec![[lo, trend.at(lo)], [hi, trend.at(hi)]]
}

fn correlation_text(c: &Correlation) -> String {
    format!(
        "Pearson r = {:.3}, p = {:.4} (n = {} years)",
        c.r, c.p_value, c.n
    )
}

// ---------------------------------------------------------------------------
// Data table
// ---------------------------------------------------------------------------

/// One row per year, one column per windowed indicator.
fn data_table(ui: &mut Ui, view: &WindowedView) {
    let mut columns: Vec<&Series> = view.series.iter().collect();
    if let Ok(share) = &view.share {
        columns.push(share);
    }
    let rows = year_table(&columns);

    ui.strong("Data");
    ui.push_id("data_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .column(Column::auto().at_least(50.0))
            .columns(Column::auto().at_least(90.0), columns.len())
            .header(20.0, |mut header| {
                header.col(|ui: &mut Ui| {
                    ui.strong("Year");
                });
                for s in &columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(s.indicator.column());
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, rows.len(), |mut row| {
                    let (year, values) = &rows[row.index()];
                    row.col(|ui: &mut Ui| {
                        ui.label(year.to_string());
                    });
                    for v in values {
                        row.col(|ui: &mut Ui| {
                            ui.label(v.map(|v| format!("{v:.2}")).unwrap_or_default());
                        });
                    }
                });
            });
    });
}
