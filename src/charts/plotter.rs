//! Chart Plotter Module
//! Interactive histogram and pickup map using egui_plot.

use crate::data::HOURS;
use crate::stats::HourlyStats;
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoints, Points};

pub const BAR_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue
pub const HIGHLIGHT_COLOR: Color32 = Color32::from_rgb(231, 76, 60); // Red
pub const MAP_COLOR: Color32 = Color32::from_rgb(200, 30, 0);

/// Longitude degrees per pixel over latitude degrees per pixel at NYC (1 / cos 40.7°).
const MAP_ASPECT: f32 = 1.32;

/// Creates the dashboard charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Draw the 24-bucket histogram, highlighting the selected hour.
    pub fn draw_hour_histogram(ui: &mut egui::Ui, histogram: &[u64; HOURS], selected_hour: u8) {
        let bars: Vec<Bar> = histogram
            .iter()
            .enumerate()
            .map(|(hour, &count)| {
                let color = if hour == selected_hour as usize {
                    HIGHLIGHT_COLOR
                } else {
                    BAR_COLOR
                };
                Bar::new(hour as f64, count as f64)
                    .width(0.9)
                    .fill(color)
                    .name(format!("{}:00", hour))
            })
            .collect();

        Plot::new("pickups_by_hour")
            .height(280.0)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .include_x(-0.5)
            .include_x(HOURS as f64 - 0.5)
            .include_y(0.0)
            .x_axis_label("Hour")
            .y_axis_label("Pickups")
            .x_axis_formatter(|mark, _range| {
                let v = mark.value;
                if v >= 0.0 && v < HOURS as f64 && v.fract() == 0.0 {
                    format!("{}", v as usize)
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).name("Pickups"));
            });
    }

    /// Draw pickup locations as a scatter of `[lon, lat]` points.
    pub fn draw_pickup_map(ui: &mut egui::Ui, points: &[[f64; 2]], hour: u8) {
        if points.is_empty() {
            ui.label(
                RichText::new(format!("No pickups at {}:00", hour))
                    .size(13.0)
                    .color(Color32::GRAY),
            );
        }

        Plot::new("pickup_map")
            .height(420.0)
            .data_aspect(MAP_ASPECT)
            .x_axis_label("Longitude")
            .y_axis_label("Latitude")
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                plot_ui.points(
                    Points::new(PlotPoints::from_iter(points.iter().copied()))
                        .radius(2.0)
                        .color(MAP_COLOR.gamma_multiply(0.7))
                        .name(format!("Pickups at {}:00", hour)),
                );
            });
    }

    /// Draw hourly statistics table
    pub fn draw_stats_table(
        ui: &mut egui::Ui,
        stats: &HourlyStats,
        histogram: &[u64; HOURS],
        hour: u8,
    ) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new("hourly_stats_table")
                    .striped(true)
                    .min_col_width(70.0)
                    .spacing([8.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("Total").strong().size(11.0));
                        ui.label(RichText::new("Busiest").strong().size(11.0));
                        ui.label(RichText::new("Quietest").strong().size(11.0));
                        ui.label(RichText::new("Mean/h").strong().size(11.0));
                        ui.label(RichText::new("Median/h").strong().size(11.0));
                        ui.label(RichText::new("Std/h").strong().size(11.0));
                        ui.label(RichText::new(format!("{}:00 share", hour)).strong().size(11.0));
                        ui.end_row();

                        ui.label(RichText::new(stats.total.to_string()).size(11.0));
                        ui.label(
                            RichText::new(format!(
                                "{}:00 ({})",
                                stats.busiest_hour, stats.busiest_count
                            ))
                            .size(11.0)
                            .color(HIGHLIGHT_COLOR),
                        );
                        ui.label(
                            RichText::new(format!(
                                "{}:00 ({})",
                                stats.quietest_hour, stats.quietest_count
                            ))
                            .size(11.0),
                        );
                        ui.label(RichText::new(format!("{:.1}", stats.mean)).size(11.0));
                        ui.label(RichText::new(format!("{:.1}", stats.median)).size(11.0));
                        ui.label(RichText::new(format!("{:.1}", stats.std)).size(11.0));
                        ui.label(
                            RichText::new(format!(
                                "{:.1}%",
                                stats.share_of(histogram, hour as usize)
                            ))
                            .size(11.0),
                        );
                        ui.end_row();
                    });
            });
    }
}
