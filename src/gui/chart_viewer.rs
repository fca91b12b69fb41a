//! Chart Viewer Widget
//! Central scrollable panel: intro text, raw data table, histogram and map.

use crate::charts::ChartPlotter;
use crate::data::HOURS;
use crate::stats::HourlyStats;
use egui::{Color32, RichText, ScrollArea};
use polars::prelude::DataFrame;

const SECTION_SPACING: f32 = 15.0;
const RAW_ROW_HEIGHT: f32 = 18.0;
const RAW_TABLE_HEIGHT: f32 = 300.0;

const INTRO: &str = "In this project, we create an interactive app for exploring a public Uber \
dataset for pickups and drop-offs in New York City. We fetch and cache data, draw charts, plot \
information on a map, and use interactive widgets, like a slider, to filter results.";

/// Views derived from the loaded table for one selected hour.
#[derive(Debug, Clone)]
pub struct HourlyViews {
    pub histogram: [u64; HOURS],
    pub stats: HourlyStats,
    pub hour: u8,
    /// `[lon, lat]` of pickups in `hour`.
    pub points: Vec<[f64; 2]>,
}

/// Scrollable dashboard body.
#[derive(Default)]
pub struct ChartViewer {
    pub views: Option<HourlyViews>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_views(&mut self, views: HourlyViews) {
        self.views = Some(views);
    }

    pub fn clear(&mut self) {
        self.views = None;
    }

    /// Draw the dashboard body
    pub fn show(&self, ui: &mut egui::Ui, table: Option<&DataFrame>, show_raw_data: bool) {
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading(RichText::new("Uber Pickups in NYC").size(26.0).strong());
                ui.add_space(8.0);
                ui.label(INTRO);
                ui.add_space(SECTION_SPACING);

                // Raw data
                ui.heading("Raw data");
                ui.add_space(5.0);
                match table {
                    Some(df) if show_raw_data => {
                        ui.label(RichText::new("Uber pickups").size(15.0).strong());
                        Self::draw_raw_table(ui, df);
                    }
                    Some(_) => {
                        ui.label(
                            "Raw data is currently hidden. Check *Show raw data* in the sidebar to display.",
                        );
                    }
                    None => {
                        ui.label(RichText::new("Loading data...").color(Color32::GRAY));
                    }
                }
                ui.add_space(SECTION_SPACING);

                let Some(views) = &self.views else {
                    return;
                };

                // Histogram
                ui.heading("Histogram: Uber's busiest hours in New York City");
                ui.add_space(5.0);
                ui.label(RichText::new("Number of pickups by hour").size(15.0).strong());
                ChartPlotter::draw_hour_histogram(ui, &views.histogram, views.hour);
                ui.add_space(8.0);
                ChartPlotter::draw_stats_table(ui, &views.stats, &views.histogram, views.hour);
                ui.add_space(SECTION_SPACING);

                // Map
                ui.heading("Map: pickup locations");
                ui.add_space(5.0);
                ui.label(
                    RichText::new(format!("Map of all pickups at {}:00", views.hour))
                        .size(15.0)
                        .strong(),
                );
                ChartPlotter::draw_pickup_map(ui, &views.points, views.hour);
            });
    }

    /// Virtualized grid of the raw table; only visible rows are formatted.
    ///
    /// Grid index 0 is the header, so `show_rows` gets one row more than the table has.
    fn draw_raw_table(ui: &mut egui::Ui, df: &DataFrame) {
        let columns = df.get_columns();

        ScrollArea::both()
            .id_salt("raw_data")
            .max_height(RAW_TABLE_HEIGHT)
            .auto_shrink([false, true])
            .show_rows(ui, RAW_ROW_HEIGHT, df.height() + 1, |ui, index_range| {
                egui::Grid::new("raw_data_grid")
                    .striped(true)
                    .min_col_width(80.0)
                    .min_row_height(RAW_ROW_HEIGHT)
                    .show(ui, |ui| {
                        for index in index_range {
                            let Some(row) = table_row(index) else {
                                ui.label(RichText::new("#").strong());
                                for column in columns {
                                    ui.label(RichText::new(column.name().as_str()).strong());
                                }
                                ui.end_row();
                                continue;
                            };

                            ui.label(RichText::new(row.to_string()).color(Color32::GRAY));
                            for column in columns {
                                let text = column
                                    .get(row)
                                    .map(|v| v.to_string().trim_matches('"').to_string())
                                    .unwrap_or_default();
                                ui.label(text);
                            }
                            ui.end_row();
                        }
                    });
            });
    }
}

/// Table row shown at grid index `index`; `None` for the header.
fn table_row(index: usize) -> Option<usize> {
    index.checked_sub(1)
}
