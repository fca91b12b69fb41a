//! Control Panel Widget
//! Left side bar with the data source, raw data and map settings.

use crate::config::AppConfig;
use egui::{Color32, RichText};

/// Widget state driving the dashboard views.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSettings {
    pub row_limit: usize,
    pub show_raw_data: bool,
    pub hour: u8,
}

impl From<&AppConfig> for UserSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            row_limit: config.row_limit,
            show_raw_data: config.show_raw_data,
            hour: config.default_hour.min(23),
        }
    }
}

/// Left side control panel.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub source_label: String,
    pub status: String,
    pub is_loading: bool,
    pub export_enabled: bool,
}

impl ControlPanel {
    pub fn new(config: &AppConfig, source_label: String) -> Self {
        Self {
            settings: UserSettings::from(config),
            source_label,
            status: "Ready".to_string(),
            is_loading: false,
            export_enabled: false,
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🚕 Uber Pickups")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("New York City, September 2014")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(RichText::new(&self.source_label).size(12.0));
                ui.add_space(5.0);

                ui.horizontal(|ui| {
                    ui.label("Rows:");
                    ui.add(
                        egui::DragValue::new(&mut self.settings.row_limit)
                            .range(0..=1_100_000)
                            .speed(100),
                    );
                });

                ui.add_space(5.0);
                ui.add_enabled_ui(!self.is_loading, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("🔄 Load").clicked() {
                            action = ControlPanelAction::Reload;
                        }
                        if ui.button("📂 Open local file").clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Raw Data Section =====
        ui.label(RichText::new("📋 Raw Data Settings").size(14.0).strong());
        ui.add_space(5.0);
        ui.checkbox(&mut self.settings.show_raw_data, "Show raw data");

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Map Section =====
        ui.label(RichText::new("🗺 Map Settings").size(14.0).strong());
        ui.add_space(5.0);

        let slider = ui.add(egui::Slider::new(&mut self.settings.hour, 0..=23).text("Hour"));
        if slider.changed() {
            action = ControlPanelAction::HourChanged;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled, |ui| {
                let button = egui::Button::new(RichText::new("🖼 Export histogram").size(14.0))
                    .min_size(egui::vec2(180.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportHistogram;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        ui.label(RichText::new("📊 Status").size(14.0).strong());
        ui.add_space(5.0);

        if self.is_loading {
            ui.add(egui::Spinner::new());
        }

        let status_color = if self.status.starts_with("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.starts_with("Done") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set status line
    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    Reload,
    BrowseCsv,
    HourChanged,
    ExportHistogram,
}
