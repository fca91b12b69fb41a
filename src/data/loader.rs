//! Pickup Data Loader Module
//! Fetches the pickup CSV, normalizes it with Polars and memoizes the result per row limit.

use crate::config::AppConfig;
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to fetch data: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("Failed to read data file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Missing column: {0}")]
    MissingColumn(String),
    #[error("Column '{column}' has type {dtype}, expected text timestamps")]
    UnexpectedType { column: String, dtype: String },
    #[error("Unparseable timestamp {value:?} at row {row}: {source}")]
    Timestamp {
        row: usize,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Where the raw CSV bytes come from.
pub trait Source: Send + Sync {
    /// Short human readable name, shown in the control panel.
    fn describe(&self) -> String;

    /// Fetch the whole (possibly gzip compressed) CSV payload.
    fn fetch(&self) -> Result<Vec<u8>, LoaderError>;
}

/// Remote dataset served over HTTP(S).
pub struct HttpSource {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(url: &str) -> Result<Self, LoaderError> {
        // No timeout: the fetch blocks until the download completes
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .user_agent(concat!("uber_pickups/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }
}

impl Source for HttpSource {
    fn describe(&self) -> String {
        self.url
            .rsplit('/')
            .next()
            .unwrap_or(&self.url)
            .to_string()
    }

    fn fetch(&self) -> Result<Vec<u8>, LoaderError> {
        let response = self.client.get(&self.url).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}

/// Local copy of the dataset.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Source for FileSource {
    fn describe(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn fetch(&self) -> Result<Vec<u8>, LoaderError> {
        Ok(std::fs::read(&self.path)?)
    }
}

/// Loads pickup tables and keeps every table it produced for the life of the loader.
///
/// Tables are handed out as `Arc<DataFrame>` so every caller asking for the same
/// row limit shares one read-only copy. A failed load is not cached.
pub struct PickupLoader {
    source: Box<dyn Source>,
    date_column: String,
    timestamp_format: String,
    cache: Mutex<HashMap<usize, Arc<DataFrame>>>,
}

impl PickupLoader {
    pub fn new(source: impl Source + 'static, date_column: &str, timestamp_format: &str) -> Self {
        Self {
            source: Box::new(source),
            date_column: date_column.to_string(),
            timestamp_format: timestamp_format.to_string(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(source: impl Source + 'static, config: &AppConfig) -> Self {
        Self::new(source, &config.date_column, &config.timestamp_format)
    }

    /// Name of the underlying source.
    pub fn source_label(&self) -> String {
        self.source.describe()
    }

    /// Check whether a table for `row_limit` has already been loaded.
    pub fn is_cached(&self, row_limit: usize) -> bool {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&row_limit)
    }

    /// Load at most `row_limit` rows, fetching only on the first call per limit.
    pub fn load(&self, row_limit: usize) -> Result<Arc<DataFrame>, LoaderError> {
        // The lock is held across the fetch so concurrent callers of one limit fetch once
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(df) = cache.get(&row_limit) {
            debug!(row_limit, "pickup table served from cache");
            return Ok(Arc::clone(df));
        }

        let started = Instant::now();
        info!(row_limit, source = %self.source.describe(), "fetching pickup data");

        let bytes = self.source.fetch()?;
        let df = Arc::new(self.read_table(bytes, row_limit)?);

        info!(
            rows = df.height(),
            columns = df.width(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pickup data loaded"
        );

        cache.insert(row_limit, Arc::clone(&df));
        Ok(df)
    }

    /// Parse CSV bytes into a normalized table.
    fn read_table(&self, bytes: Vec<u8>, row_limit: usize) -> Result<DataFrame, LoaderError> {
        // The reader stops after `row_limit` rows and gunzips only what it needs
        let mut df = CsvReadOptions::default()
            .with_has_header(true)
            .with_n_rows(Some(row_limit))
            .with_infer_schema_length(Some(10000))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;

        lowercase_columns(&mut df)?;
        parse_timestamps(&mut df, &self.date_column, &self.timestamp_format)?;
        Ok(df)
    }
}

fn lowercase_columns(df: &mut DataFrame) -> Result<(), LoaderError> {
    let names: Vec<PlSmallStr> = df
        .get_column_names()
        .iter()
        .map(|name| PlSmallStr::from(name.to_lowercase()))
        .collect();
    df.set_column_names(names)?;
    Ok(())
}

/// Replace the text timestamp column by a millisecond datetime column.
fn parse_timestamps(df: &mut DataFrame, column: &str, format: &str) -> Result<(), LoaderError> {
    let timestamps = df
        .column(column)
        .map_err(|_| LoaderError::MissingColumn(column.to_string()))?;

    match timestamps.dtype() {
        DataType::Datetime(_, _) => return Ok(()),
        DataType::String => {}
        other => {
            return Err(LoaderError::UnexpectedType {
                column: column.to_string(),
                dtype: other.to_string(),
            })
        }
    }

    let mut millis: Vec<Option<i64>> = Vec::with_capacity(timestamps.len());
    for (row, value) in timestamps.str()?.into_iter().enumerate() {
        let parsed = match value {
            Some(text) => {
                let dt = NaiveDateTime::parse_from_str(text.trim(), format).map_err(|source| {
                    LoaderError::Timestamp {
                        row,
                        value: text.to_string(),
                        source,
                    }
                })?;
                Some(dt.and_utc().timestamp_millis())
            }
            None => None,
        };
        millis.push(parsed);
    }

    let parsed = Int64Chunked::from_iter_options(column.into(), millis.into_iter())
        .into_datetime(TimeUnit::Milliseconds, None)
        .into_series();
    df.with_column(parsed)?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{DATE_COLUMN, TIMESTAMP_FORMAT};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) const SAMPLE_CSV: &str = "\
Date/Time,Lat,Lon,Base
9/1/2014 5:13:00,40.7366,-73.9906,B02512
9/1/2014 17:01:00,40.7215,-73.9956,B02512
9/1/2014 17:45:00,40.7588,-73.9776,B02598
";

    /// Serves a fixed payload and counts fetches.
    pub(crate) struct CountingSource {
        payload: Vec<u8>,
        fetches: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl CountingSource {
        pub(crate) fn new(payload: &str) -> (Self, Arc<AtomicUsize>) {
            Self::from_bytes(payload.as_bytes().to_vec())
        }

        pub(crate) fn from_bytes(payload: Vec<u8>) -> (Self, Arc<AtomicUsize>) {
            let fetches = Arc::new(AtomicUsize::new(0));
            let source = Self {
                payload,
                fetches: Arc::clone(&fetches),
                delay: Duration::ZERO,
            };
            (source, fetches)
        }

        /// Sleep this long inside every fetch.
        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    impl Source for CountingSource {
        fn describe(&self) -> String {
            "stub".to_string()
        }

        fn fetch(&self) -> Result<Vec<u8>, LoaderError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            Ok(self.payload.clone())
        }
    }

    pub(crate) fn sample_table() -> Arc<DataFrame> {
        let (source, _) = CountingSource::new(SAMPLE_CSV);
        PickupLoader::new(source, DATE_COLUMN, TIMESTAMP_FORMAT)
            .load(100)
            .unwrap()
    }

    #[test]
    fn columns_are_lowercased_and_timestamps_parsed() {
        let df = sample_table();
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["date/time", "lat", "lon", "base"]);
        assert!(matches!(
            df.column(DATE_COLUMN).unwrap().dtype(),
            DataType::Datetime(TimeUnit::Milliseconds, None)
        ));
        assert_eq!(df.height(), 3);
    }

    #[test]
    fn row_limit_bounds_the_table() {
        let (source, _) = CountingSource::new(SAMPLE_CSV);
        let loader = PickupLoader::new(source, DATE_COLUMN, TIMESTAMP_FORMAT);
        assert_eq!(loader.load(2).unwrap().height(), 2);
        assert_eq!(loader.load(1).unwrap().height(), 1);
        assert_eq!(loader.load(10_000).unwrap().height(), 3);
    }

    #[test]
    fn repeated_loads_hit_the_cache() {
        let (source, fetches) = CountingSource::new(SAMPLE_CSV);
        let loader = PickupLoader::new(source, DATE_COLUMN, TIMESTAMP_FORMAT);
        assert!(!loader.is_cached(2));

        let first = loader.load(2).unwrap();
        let second = loader.load(2).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert!(loader.is_cached(2));

        loader.load(3).unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_loads_fetch_once() {
        let (source, fetches) = CountingSource::new(SAMPLE_CSV);
        let source = source.with_delay(Duration::from_millis(50));
        let loader = PickupLoader::new(source, DATE_COLUMN, TIMESTAMP_FORMAT);

        let tables: Vec<Arc<DataFrame>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| loader.load(2).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(tables.len(), 4);
        for table in &tables {
            assert!(Arc::ptr_eq(&tables[0], table));
        }
        assert_eq!(tables[0].height(), 2);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn gzip_payload_is_decompressed_within_row_limit() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SAMPLE_CSV.as_bytes()).unwrap();
        let gzipped = encoder.finish().unwrap();
        assert_eq!(&gzipped[..2], &[0x1f, 0x8b]);

        let (source, fetches) = CountingSource::from_bytes(gzipped);
        let loader = PickupLoader::new(source, DATE_COLUMN, TIMESTAMP_FORMAT);

        let limited = loader.load(2).unwrap();
        let names: Vec<String> = limited
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["date/time", "lat", "lon", "base"]);
        assert_eq!(limited.height(), 2);
        assert!(matches!(
            limited.column(DATE_COLUMN).unwrap().dtype(),
            DataType::Datetime(TimeUnit::Milliseconds, None)
        ));

        assert_eq!(loader.load(100).unwrap().height(), 3);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn bad_timestamp_fails_and_is_not_cached() {
        let csv = "Date/Time,Lat,Lon\n9/1/2014 5:13:00,40.7,-73.9\nnot a date,40.7,-73.9\n";
        let (source, fetches) = CountingSource::new(csv);
        let loader = PickupLoader::new(source, DATE_COLUMN, TIMESTAMP_FORMAT);

        match loader.load(10) {
            Err(LoaderError::Timestamp { row, value, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "not a date");
            }
            other => panic!("expected timestamp error, got {other:?}"),
        }
        assert!(!loader.is_cached(10));
        assert!(loader.load(10).is_err());
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_timestamp_column_is_reported() {
        let (source, _) = CountingSource::new("Lat,Lon\n40.7,-73.9\n");
        let loader = PickupLoader::new(source, DATE_COLUMN, TIMESTAMP_FORMAT);
        assert!(matches!(
            loader.load(10),
            Err(LoaderError::MissingColumn(name)) if name == DATE_COLUMN
        ));
    }

    #[test]
    fn file_source_reads_local_copy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uber-raw-data-sep14.csv");
        std::fs::write(&path, SAMPLE_CSV).unwrap();

        let source = FileSource::new(&path);
        assert_eq!(source.describe(), "uber-raw-data-sep14.csv");

        let loader = PickupLoader::new(source, DATE_COLUMN, TIMESTAMP_FORMAT);
        assert_eq!(loader.load(10).unwrap().height(), 3);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let loader = PickupLoader::new(
            FileSource::new("/nonexistent/pickups.csv"),
            DATE_COLUMN,
            TIMESTAMP_FORMAT,
        );
        assert!(matches!(loader.load(10), Err(LoaderError::Io(_))));
    }
}
