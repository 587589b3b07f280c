//! CSV storage for historical bars.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use trading_core::atomic::write_atomic;
use trading_core::error::DataError;
use trading_core::types::Bar;

/// Column layout of the bar CSV, in order.
pub const CSV_COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

/// CSV record format.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRecord {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl From<&Bar> for CsvRecord {
    fn from(bar: &Bar) -> Self {
        Self {
            timestamp: bar.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

/// A CSV file of bars for one source and symbol.
#[derive(Debug, Clone)]
pub struct CsvBarStore {
    path: PathBuf,
}

impl CsvBarStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load all bars, sorted by timestamp.
    pub fn load(&self) -> Result<Vec<Bar>, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_path(&self.path)
            .map_err(csv_error)?;

        let headers = reader.headers().map_err(csv_error)?.clone();
        let missing: Vec<String> = CSV_COLUMNS
            .iter()
            .filter(|column| !headers.iter().any(|h| h == **column))
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DataError::MissingColumns {
                missing,
                expected: CSV_COLUMNS.iter().map(|c| c.to_string()).collect(),
            });
        }

        let mut bars = Vec::new();
        for (row, result) in reader.deserialize().enumerate() {
            let record: CsvRecord = result.map_err(csv_error)?;
            let bar = Bar::new(
                parse_timestamp(&record.timestamp)?,
                record.open,
                record.high,
                record.low,
                record.close,
                record.volume,
            );
            if !bar.is_finite() {
                return Err(DataError::ParseError(format!(
                    "non-finite value in data row {}",
                    row + 1
                )));
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.timestamp);
        debug!(path = %self.path.display(), bars = bars.len(), "Loaded bars from CSV");
        Ok(bars)
    }

    /// Replace the file with `bars`.
    ///
    /// An empty slice is rejected and leaves any existing file untouched.
    pub fn save(&self, bars: &[Bar]) -> Result<(), DataError> {
        if bars.is_empty() {
            return Err(DataError::NoDataAvailable);
        }

        let mut writer = WriterBuilder::new().has_headers(true).from_writer(Vec::new());
        for bar in bars {
            writer.serialize(CsvRecord::from(bar)).map_err(csv_error)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        write_atomic(&self.path, &bytes)?;
        info!(path = %self.path.display(), bars = bars.len(), "Wrote bars to CSV");
        Ok(())
    }
}

fn csv_error(e: csv::Error) -> DataError {
    let message = e.to_string();
    match e.into_kind() {
        csv::ErrorKind::Io(io) => DataError::Io(io),
        _ => DataError::ParseError(message),
    }
}

/// Parse a bar timestamp.
///
/// RFC 3339 is the native format. Naive date/times are read as UTC, and bare
/// integers as Unix seconds (or milliseconds when too large for seconds).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DataError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt.and_utc());
        }
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Some(dt) = NaiveDate::parse_from_str(raw, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Ok(dt.and_utc());
        }
    }

    if let Ok(ts) = raw.parse::<i64>() {
        let parsed = if ts > 10_000_000_000 {
            DateTime::from_timestamp_millis(ts)
        } else {
            DateTime::from_timestamp(ts, 0)
        };
        if let Some(dt) = parsed {
            return Ok(dt);
        }
    }

    Err(DataError::ParseError(format!("Could not parse timestamp: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;

    fn bar(hour: u32, close: f64) -> Bar {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap();
        Bar::new(ts, close - 0.5, close + 1.0, close - 1.0, close, 1200.0)
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvBarStore::new(dir.path().join("training_data.alpaca.NVDA.csv"));
        let bars = vec![bar(14, 101.25), bar(15, 102.0), bar(16, 99.75)];

        store.save(&bars).unwrap();
        assert_eq!(store.load().unwrap(), bars);

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with("timestamp,open,high,low,close,volume\n"));
        assert!(text.contains("2024-03-01T14:00:00Z,100.75,102.25,100.25,101.25,1200"));
    }

    #[test]
    fn test_load_sorts_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.csv");
        fs::write(
            &path,
            "timestamp,open,high,low,close,volume\n\
             2024-03-01T15:00:00Z,1,2,0.5,1.5,10\n\
             2024-03-01T14:00:00Z,1,2,0.5,1.2,10\n",
        )
        .unwrap();

        let bars = CsvBarStore::new(&path).load().unwrap();
        assert_eq!(bars[0].close, 1.2);
        assert_eq!(bars[1].close, 1.5);
    }

    #[test]
    fn test_load_reports_missing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.csv");
        fs::write(&path, "timestamp,open,high,low,volume\n2024-03-01,1,2,0.5,10\n").unwrap();

        match CsvBarStore::new(&path).load() {
            Err(DataError::MissingColumns { missing, expected }) => {
                assert_eq!(missing, vec!["close".to_string()]);
                assert_eq!(expected.len(), 6);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_save_empty_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvBarStore::new(dir.path().join("bars.csv"));
        store.save(&[bar(14, 100.0)]).unwrap();

        assert!(matches!(store.save(&[]), Err(DataError::NoDataAvailable)));
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvBarStore::new(dir.path().join("absent.csv"));
        assert!(!store.exists());
        assert!(matches!(store.load(), Err(DataError::Io(_))));
    }

    #[test]
    fn test_parse_timestamp() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-15T10:30:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-15T05:30:00-05:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-15 10:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-01-15 10:30:00+00:00").unwrap(), expected);
        assert_eq!(parse_timestamp("1705314600").unwrap(), expected);
        assert_eq!(parse_timestamp("1705314600000").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2024-01-15").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
        );
        assert!(parse_timestamp("yesterday").is_err());
    }
}
