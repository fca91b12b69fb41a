//! Static Chart Renderer
//! Renders the pickups-by-hour histogram to PNG bytes with plotters.

use crate::data::HOURS;
use image::{ImageFormat, RgbImage};
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::io::Cursor;
use thiserror::Error;

const BAR: RGBColor = RGBColor(52, 152, 219);
const HIGHLIGHT: RGBColor = RGBColor(231, 76, 60);

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Image buffer does not match {0}x{1}")]
    Buffer(u32, u32),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Draw(err.to_string())
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render the histogram as a bar chart and encode it as PNG.
    pub fn render_histogram_png(
        histogram: &[u64; HOURS],
        selected_hour: u8,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        let y_max = Self::axis_ceiling(histogram.iter().copied().max().unwrap_or(0));

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE)?;

            let mut chart = ChartBuilder::on(&root)
                .caption("Number of pickups by hour", ("sans-serif", 28))
                .margin(20)
                .x_label_area_size(40)
                .y_label_area_size(70)
                .build_cartesian_2d(0u32..HOURS as u32, 0u64..y_max)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(HOURS)
                .x_desc("Hour")
                .y_desc("Pickups")
                .draw()?;

            chart.draw_series(histogram.iter().enumerate().map(|(hour, &count)| {
                let color = if hour == selected_hour as usize {
                    HIGHLIGHT
                } else {
                    BAR
                };
                let hour = hour as u32;
                let mut bar = Rectangle::new([(hour, 0), (hour + 1, count)], color.filled());
                bar.set_margin(0, 0, 3, 3);
                bar
            }))?;

            root.present()?;
        }

        let image =
            RgbImage::from_raw(width, height, buffer).ok_or(RenderError::Buffer(width, height))?;
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }

    /// Round the tallest bar up to a readable axis limit.
    fn axis_ceiling(max: u64) -> u64 {
        if max == 0 {
            return 1;
        }
        let step = Self::nice_step(max as f64, 8);
        let ceiling = ((max as f64 / step).ceil() * step) as u64;
        if ceiling <= max {
            ceiling + step as u64
        } else {
            ceiling
        }
    }

    fn nice_step(range: f64, target_steps: usize) -> f64 {
        let raw_step = range / target_steps as f64;
        let magnitude = 10f64.powf(raw_step.log10().floor());
        let normalized = raw_step / magnitude;

        let nice = if normalized <= 1.0 {
            1.0
        } else if normalized <= 2.0 {
            2.0
        } else if normalized <= 5.0 {
            5.0
        } else {
            10.0
        };

        (nice * magnitude).max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_ceiling_rounds_to_nice_steps() {
        assert_eq!(StaticChartRenderer::axis_ceiling(0), 1);
        assert_eq!(StaticChartRenderer::axis_ceiling(1234), 1400);
        assert_eq!(StaticChartRenderer::axis_ceiling(7), 8);
        assert_eq!(StaticChartRenderer::axis_ceiling(1600), 1800);
    }
}
