//! Statistics Calculator Module
//! Descriptive statistics over the hourly pickup histogram.

use crate::data::HOURS;
use statrs::statistics::{Data, Distribution, Median};

/// Summary of pickups per hour of day.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyStats {
    pub total: u64,
    pub busiest_hour: usize,
    pub busiest_count: u64,
    pub quietest_hour: usize,
    pub quietest_count: u64,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

impl Default for HourlyStats {
    fn default() -> Self {
        Self {
            total: 0,
            busiest_hour: 0,
            busiest_count: 0,
            quietest_hour: 0,
            quietest_count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
        }
    }
}

impl HourlyStats {
    /// Share of all pickups that happened in `hour`, in percent.
    pub fn share_of(&self, histogram: &[u64; HOURS], hour: usize) -> f64 {
        if self.total == 0 || hour >= HOURS {
            return 0.0;
        }
        histogram[hour] as f64 * 100.0 / self.total as f64
    }
}

/// Handles statistical calculations over the histogram.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute hourly statistics. Ties resolve to the earliest hour.
    pub fn hourly_stats(histogram: &[u64; HOURS]) -> HourlyStats {
        let total: u64 = histogram.iter().sum();

        let mut busiest = (0, histogram[0]);
        let mut quietest = (0, histogram[0]);
        for (hour, &count) in histogram.iter().enumerate().skip(1) {
            if count > busiest.1 {
                busiest = (hour, count);
            }
            if count < quietest.1 {
                quietest = (hour, count);
            }
        }

        let data = Data::new(histogram.iter().map(|&c| c as f64).collect::<Vec<f64>>());

        HourlyStats {
            total,
            busiest_hour: busiest.0,
            busiest_count: busiest.1,
            quietest_hour: quietest.0,
            quietest_count: quietest.1,
            mean: data.mean().unwrap_or(f64::NAN),
            median: data.median(),
            std: data.std_dev().unwrap_or(f64::NAN),
        }
    }
}
