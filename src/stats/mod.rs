//! Stats module - Hourly statistics

mod calculator;

pub use calculator::{HourlyStats, StatsCalculator};
