use eframe::egui::{self, Color32, RichText, ScrollArea, Slider, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – year range and sources
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Controls");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            year_range(ui, state);
            ui.separator();
            sources(ui, state);
        });
}

fn year_range(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Year range");
    let Some(window) = state.window else {
        ui.label("No shared years to select.");
        return;
    };

    let mut start = window.start;
    let mut end = window.end;
    if ui
        .add(Slider::new(&mut start, window.min..=window.max).text("From"))
        .changed()
    {
        state.set_window_start(start);
    }
    if ui
        .add(Slider::new(&mut end, window.min..=window.max).text("To"))
        .changed()
    {
        state.set_window_end(end);
    }

    ui.label(
        RichText::new(format!("Shared by all sources: {}–{}", window.min, window.max)).weak(),
    );
    if ui.small_button("Reset").clicked() {
        state.reset_window();
    }
}

fn sources(ui: &mut Ui, state: &AppState) {
    ui.strong("Sources");
    ui.label(format!("Country: {}", state.config.country.trim()));

    let cfg = &state.config;
    let files = [
        ("CO₂", Some(&cfg.sources.co2)),
        ("Energy", Some(&cfg.sources.energy)),
        ("GDP growth", Some(&cfg.sources.gdp)),
        ("Temperature", Some(&cfg.sources.temperature)),
        ("Disasters", cfg.sources.disasters.as_ref()),
    ];
    for (label, file) in files {
        let text = match file {
            Some(f) => cfg.resolve(f).display().to_string(),
            None => "(not configured)".to_string(),
        };
        ui.label(RichText::new(format!("{label}: {text}")).small());
    }

    if let Some(data) = &state.data {
        egui::CollapsingHeader::new(RichText::new("Loaded series").strong())
            .id_salt("loaded_series")
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                for s in data.all_series() {
                    let span = match (s.min_year(), s.max_year()) {
                        (Some(lo), Some(hi)) => format!("{lo}–{hi}"),
                        _ => "empty".to_string(),
                    };
                    ui.label(format!("{}: {} years ({span})", s.indicator, s.len()));
                }
            });
    }

    let (hits, misses) = state.cache.stats();
    ui.label(
        RichText::new(format!(
            "Cache: {} source(s), {hits} hit(s), {misses} load(s)",
            state.cache.len()
        ))
        .weak(),
    );
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
            if ui.button("Clear cache and reload").clicked() {
                state.clear_cache_and_reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(data) = &state.data {
            ui.label(format!(
                "{} series loaded from {}",
                data.all_series().count(),
                state.config.data_dir.display()
            ));
        }

        ui.separator();

        if ui
            .selectable_label(state.show_table, "Data table")
            .clicked()
        {
            state.show_table = !state.show_table;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::YELLOW));
        }
    });
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open data folder")
        .set_directory(&state.config.data_dir)
        .pick_folder();

    if let Some(dir) = folder {
        state.set_data_dir(dir);
    }
}
