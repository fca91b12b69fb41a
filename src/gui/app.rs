//! Uber Pickups Main Application
//! Main window with control panel and dashboard body.

use crate::charts::StaticChartRenderer;
use crate::config::AppConfig;
use crate::data::{DataProcessor, FileSource, PickupLoader, ProcessorError};
use crate::gui::chart_viewer::HourlyViews;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::stats::StatsCalculator;
use egui::SidePanel;
use polars::prelude::DataFrame;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;
use tracing::{error, info, warn};

/// Size of the exported histogram image
const EXPORT_WIDTH: u32 = 1200;
const EXPORT_HEIGHT: u32 = 700;

/// Table loading result from background thread
enum LoadResult {
    Complete { df: Arc<DataFrame>, cached: bool },
    Error(String),
}

/// Main application window.
pub struct PickupsApp {
    config: AppConfig,
    loader: Arc<PickupLoader>,
    processor: DataProcessor,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
    table: Option<Arc<DataFrame>>,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl PickupsApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig, loader: PickupLoader) -> Self {
        let control_panel = ControlPanel::new(&config, loader.source_label());
        let mut app = Self {
            processor: DataProcessor::new(&config.date_column),
            config,
            loader: Arc::new(loader),
            control_panel,
            chart_viewer: ChartViewer::new(),
            table: None,
            load_rx: None,
            is_loading: false,
        };
        app.start_load();
        app
    }

    /// Load the table for the current row limit in a background thread
    fn start_load(&mut self) {
        if self.is_loading {
            return;
        }

        let row_limit = self.control_panel.settings.row_limit;
        let loader = Arc::clone(&self.loader);
        let cached = loader.is_cached(row_limit);

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        self.is_loading = true;
        self.control_panel.is_loading = true;
        self.control_panel.set_status("Loading data...");

        thread::spawn(move || {
            let result = match loader.load(row_limit) {
                Ok(df) => LoadResult::Complete { df, cached },
                Err(e) => {
                    error!(row_limit, "failed to load pickup data: {}", e);
                    LoadResult::Error(e.to_string())
                }
            };
            let _ = tx.send(result);
        });
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Complete { df, cached } => {
                        let status = if cached {
                            "Done! (using cache)".to_string()
                        } else {
                            format!("Done! Loaded {} rows", df.height())
                        };
                        self.control_panel.set_status(&status);
                        self.table = Some(df);
                        self.refresh_views();
                    }
                    LoadResult::Error(error) => {
                        self.control_panel.set_status(&format!("Error: {}", error));
                    }
                }
                self.is_loading = false;
                self.control_panel.is_loading = false;
                should_keep_receiver = false;
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    /// Recompute histogram, hour filter and statistics for the selected hour
    fn refresh_views(&mut self) {
        let Some(df) = self.table.clone() else {
            return;
        };
        let hour = self.control_panel.settings.hour;

        match self.derive_views(&df, hour) {
            Ok(views) => {
                self.chart_viewer.set_views(views);
                self.control_panel.export_enabled = true;
            }
            Err(e) => {
                error!(hour, "failed to derive views: {}", e);
                self.chart_viewer.clear();
                self.control_panel.export_enabled = false;
                self.control_panel.set_status(&format!("Error: {}", e));
            }
        }
    }

    fn derive_views(&self, df: &DataFrame, hour: u8) -> Result<HourlyViews, ProcessorError> {
        let histogram = self.processor.histogram(df)?;
        let filtered = self.processor.filter_by_hour(df, hour)?;
        let points = DataProcessor::map_points(&filtered)?;

        Ok(HourlyViews {
            stats: StatsCalculator::hourly_stats(&histogram),
            histogram,
            hour,
            points,
        })
    }

    /// Switch to a local copy of the dataset; the new loader starts with an empty cache
    fn handle_browse_csv(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv", "gz"])
            .pick_file()
        {
            info!(path = %path.display(), "switching to local data file");
            let loader = PickupLoader::from_config(FileSource::new(path), &self.config);
            self.control_panel.source_label = loader.source_label();
            self.loader = Arc::new(loader);
            self.table = None;
            self.chart_viewer.clear();
            self.control_panel.export_enabled = false;
            self.start_load();
        }
    }

    /// Render the histogram to PNG and open it
    fn handle_export_histogram(&mut self) {
        let Some(views) = &self.chart_viewer.views else {
            self.control_panel.set_status("No histogram to export");
            return;
        };

        let output_path = match rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name("pickups_by_hour.png")
            .save_file()
        {
            Some(path) => path,
            None => return, // User cancelled
        };

        let png = match StaticChartRenderer::render_histogram_png(
            &views.histogram,
            views.hour,
            EXPORT_WIDTH,
            EXPORT_HEIGHT,
        ) {
            Ok(png) => png,
            Err(e) => {
                error!("histogram render failed: {}", e);
                self.control_panel
                    .set_status(&format!("Error: render failed: {}", e));
                return;
            }
        };

        if let Err(e) = std::fs::write(&output_path, png) {
            error!(path = %output_path.display(), "histogram export failed: {}", e);
            self.control_panel
                .set_status(&format!("Error: export failed: {}", e));
            return;
        }

        info!(path = %output_path.display(), "histogram exported");
        self.control_panel
            .set_status(&format!("Done! Exported {}", output_path.display()));

        if let Err(e) = open::that(&output_path) {
            warn!("could not open exported image: {}", e);
        }
    }
}

impl eframe::App for PickupsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::Reload => self.start_load(),
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::HourChanged => self.refresh_views(),
                        ControlPanelAction::ExportHistogram => self.handle_export_histogram(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - dashboard body
        let show_raw_data = self.control_panel.settings.show_raw_data;
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer
                .show(ui, self.table.as_deref(), show_raw_data);
        });
    }
}
