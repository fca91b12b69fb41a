//! View Derivation Module
//! Hour-of-day histogram and hour filter over a loaded pickup table.

use crate::config::DATE_COLUMN;
use polars::prelude::*;
use rayon::prelude::*;
use thiserror::Error;

/// Number of histogram buckets, one per hour of day.
pub const HOURS: usize = 24;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Hour {0} is outside 0..=23")]
    HourOutOfRange(u8),
}

/// Derives the histogram and the filtered view from a pickup table.
///
/// All operations are pure; the input table is never modified.
#[derive(Debug, Clone)]
pub struct DataProcessor {
    date_column: String,
}

impl Default for DataProcessor {
    fn default() -> Self {
        Self::new(DATE_COLUMN)
    }
}

impl DataProcessor {
    pub fn new(date_column: &str) -> Self {
        Self {
            date_column: date_column.to_string(),
        }
    }

    /// Hour component of every timestamp, nulls preserved.
    fn hours(&self, df: &DataFrame) -> Result<Int8Chunked, ProcessorError> {
        let out = df
            .clone()
            .lazy()
            .select([col(self.date_column.as_str()).dt().hour().alias("hour")])
            .collect()?;
        Ok(out.column("hour")?.i8()?.clone())
    }

    /// Count pickups per hour into 24 buckets covering [0, 24).
    ///
    /// Rows with a null timestamp are not counted.
    pub fn histogram(&self, df: &DataFrame) -> Result<[u64; HOURS], ProcessorError> {
        let hours: Vec<i8> = self.hours(df)?.into_iter().flatten().collect();

        let buckets = hours
            .par_iter()
            .fold(
                || [0u64; HOURS],
                |mut acc, &hour| {
                    if (0..HOURS as i8).contains(&hour) {
                        acc[hour as usize] += 1;
                    }
                    acc
                },
            )
            .reduce(
                || [0u64; HOURS],
                |mut left, right| {
                    for (l, r) in left.iter_mut().zip(right) {
                        *l += r;
                    }
                    left
                },
            );

        Ok(buckets)
    }

    /// Rows whose timestamp hour equals `hour`, in original order.
    ///
    /// An hour with no pickups yields an empty frame with the same schema.
    pub fn filter_by_hour(&self, df: &DataFrame, hour: u8) -> Result<DataFrame, ProcessorError> {
        if hour as usize >= HOURS {
            return Err(ProcessorError::HourOutOfRange(hour));
        }

        let filtered = df
            .clone()
            .lazy()
            .filter(
                col(self.date_column.as_str())
                    .dt()
                    .hour()
                    .eq(lit(hour as i8)),
            )
            .collect()?;
        Ok(filtered)
    }

    /// Extract `[lon, lat]` pairs for the map, skipping rows with a missing coordinate.
    pub fn map_points(view: &DataFrame) -> Result<Vec<[f64; 2]>, ProcessorError> {
        let lat = view.column("lat")?.cast(&DataType::Float64)?;
        let lon = view.column("lon")?.cast(&DataType::Float64)?;

        let points = lon
            .f64()?
            .into_iter()
            .zip(lat.f64()?.into_iter())
            .filter_map(|(x, y)| Some([x?, y?]))
            .collect();
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TIMESTAMP_FORMAT;
    use crate::data::loader::tests::{sample_table, CountingSource};
    use crate::data::PickupLoader;

    fn table_from_csv(csv: &str) -> DataFrame {
        let (source, _) = CountingSource::new(csv);
        let loader = PickupLoader::new(source, DATE_COLUMN, TIMESTAMP_FORMAT);
        loader.load(10_000).unwrap().as_ref().clone()
    }

    fn lat_values(df: &DataFrame) -> Vec<f64> {
        df.column("lat")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect()
    }

    #[test]
    fn histogram_counts_each_hour() {
        let df = sample_table();
        let hist = DataProcessor::default().histogram(&df).unwrap();

        let mut expected = [0u64; HOURS];
        expected[5] = 1;
        expected[17] = 2;
        assert_eq!(hist, expected);
    }

    #[test]
    fn histogram_sums_to_row_count() {
        let mut csv = String::from("Date/Time,Lat,Lon,Base\n");
        for i in 0..250 {
            csv.push_str(&format!(
                "9/{}/2014 {}:{:02}:00,40.{:04},-73.9,B02512\n",
                i % 30 + 1,
                (i * 7) % 24,
                i % 60,
                i
            ));
        }
        let df = table_from_csv(&csv);
        let hist = DataProcessor::default().histogram(&df).unwrap();

        assert_eq!(hist.iter().sum::<u64>(), df.height() as u64);
        assert_eq!(df.height(), 250);
    }

    #[test]
    fn histogram_of_empty_table_is_all_zero() {
        let processor = DataProcessor::default();
        let empty = processor.filter_by_hour(&sample_table(), 3).unwrap();
        let hist = processor.histogram(&empty).unwrap();
        assert_eq!(hist, [0u64; HOURS]);
    }

    #[test]
    fn filter_keeps_matching_rows_in_order() {
        let df = sample_table();
        let processor = DataProcessor::default();
        let view = processor.filter_by_hour(&df, 17).unwrap();

        assert_eq!(view.height(), 2);
        assert_eq!(lat_values(&view), vec![40.7215, 40.7588]);
        assert_eq!(processor.histogram(&view).unwrap()[17], 2);
        assert_eq!(processor.histogram(&view).unwrap().iter().sum::<u64>(), 2);
    }

    #[test]
    fn filter_without_matches_is_empty() {
        let df = sample_table();
        let view = DataProcessor::default().filter_by_hour(&df, 3).unwrap();

        assert_eq!(view.height(), 0);
        assert_eq!(view.width(), df.width());
    }

    #[test]
    fn filter_rejects_out_of_range_hour() {
        let df = sample_table();
        assert!(matches!(
            DataProcessor::default().filter_by_hour(&df, 24),
            Err(ProcessorError::HourOutOfRange(24))
        ));
    }

    #[test]
    fn map_points_skip_missing_coordinates() {
        let df = table_from_csv(
            "Date/Time,Lat,Lon\n9/1/2014 1:00:00,40.5,-73.5\n9/1/2014 1:10:00,,-73.6\n9/1/2014 1:20:00,40.7,-73.7\n",
        );
        let points = DataProcessor::map_points(&df).unwrap();
        assert_eq!(points, vec![[-73.5, 40.5], [-73.7, 40.7]]);
    }
}
