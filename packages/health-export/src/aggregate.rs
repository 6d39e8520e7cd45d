//! Daily totals over a published table, and the HTTP-shaped response that
//! serves them.
//!
//! The table's timestamp column (`endtime` in projected tables, `endDate` in
//! full ones) decides which calendar day a row's `value` counts towards.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::config::{sanitize_key_component, AGGREGATE_WINDOW_DAYS};
use crate::error::{ExportError, Result};
use crate::format::table_reader;
use crate::store::{BlobLocation, BlobSource};

/// Timestamp columns, in order of preference.
const TIMESTAMP_COLUMNS: [&str; 2] = ["endtime", "endDate"];

const VALUE_COLUMN: &str = "value";

/// Sum of a table's values on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub value: f64,
}

/// Calendar day of an export timestamp, in the timestamp's own offset.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use health_export::aggregate::parse_day;
///
/// let day = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
/// assert_eq!(parse_day("2024-01-31 23:30:00 +0100"), Some(day));
/// assert_eq!(parse_day("2024-01-31"), Some(day));
/// assert_eq!(parse_day("yesterday"), None);
/// ```
#[must_use]
pub fn parse_day(timestamp: &str) -> Option<NaiveDate> {
    let timestamp = timestamp.trim();
    if let Ok(dt) = DateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(dt.date_naive());
    }
    NaiveDate::parse_from_str(timestamp, "%Y-%m-%d").ok()
}

/// Sum `value` per calendar day over every row of a table.
///
/// Rows whose timestamp or value can't be read are skipped.
///
/// # Errors
/// - `MalformedTable` if the bytes are not UTF-8 or a row does not fit the header
/// - `MissingColumn` if the header lacks a timestamp or value column
pub fn daily_totals(table: &[u8]) -> Result<Vec<DailyTotal>> {
    let mut reader = table_reader(table);

    let header = reader.headers()?.clone();
    let column = |name: &str| header.iter().position(|h| h == name);
    let ts_index = TIMESTAMP_COLUMNS
        .iter()
        .find_map(|&name| column(name))
        .ok_or_else(|| ExportError::MissingColumn(TIMESTAMP_COLUMNS[0].to_string()))?;
    let value_index =
        column(VALUE_COLUMN).ok_or_else(|| ExportError::MissingColumn(VALUE_COLUMN.into()))?;

    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result?;
        let day = row.get(ts_index).and_then(parse_day);
        let value = row
            .get(value_index)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite());

        match (day, value) {
            (Some(day), Some(value)) => *totals.entry(day).or_insert(0.0) += value,
            _ => tracing::debug!(row = row_no + 1, "Skipping row without timestamp or value"),
        }
    }

    Ok(totals
        .into_iter()
        .map(|(date, value)| DailyTotal { date, value })
        .collect())
}

/// Keep the `days` calendar days ending at the latest date present.
///
/// Expects `totals` sorted by date, as [`daily_totals`] returns them.
#[must_use]
pub fn last_days(totals: &[DailyTotal], days: u64) -> Vec<DailyTotal> {
    let Some(latest) = totals.last().map(|t| t.date) else {
        return Vec::new();
    };
    let first = latest
        .checked_sub_days(Days::new(days.saturating_sub(1)))
        .unwrap_or(NaiveDate::MIN);
    totals.iter().filter(|t| t.date >= first).copied().collect()
}

/// Daily totals over the standard window.
pub fn daily_window(table: &[u8]) -> Result<Vec<DailyTotal>> {
    Ok(last_days(&daily_totals(table)?, AGGREGATE_WINDOW_DAYS))
}

/// Rendering of daily totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AggregateFormat {
    #[default]
    Csv,
    Json,
}

impl AggregateFormat {
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Json => "application/json",
        }
    }

    /// Render totals as `date,value` CSV or a JSON array.
    pub fn render(&self, totals: &[DailyTotal]) -> Result<String> {
        match self {
            Self::Csv => {
                let rows: String = totals
                    .iter()
                    .map(|t| format!("{},{}\n", t.date.format("%Y-%m-%d"), t.value))
                    .collect();
                Ok(format!("date,value\n{rows}"))
            }
            Self::Json => Ok(serde_json::to_string(totals)?),
        }
    }
}

impl FromStr for AggregateFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(ExportError::Config(format!(
                "Unknown format '{other}'. Expected csv or json"
            ))),
        }
    }
}

/// Request for a table's daily totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateQuery {
    pub container: String,
    pub key: String,
    /// `csv` (default) or `json`.
    pub format: Option<String>,
}

impl AggregateQuery {
    /// Build from query-string parameters `bucketName`, `objectKey` and
    /// `format`. Missing parameters are left empty and rejected by
    /// [`respond`].
    pub fn from_params<K, V>(params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut query = Self::default();
        for (name, value) in params {
            match name.as_ref() {
                "bucketName" => query.container = value.into(),
                "objectKey" => query.key = value.into(),
                "format" => query.format = Some(value.into()),
                _ => {}
            }
        }
        query
    }
}

/// Status, headers and body of an aggregate response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl AggregateResponse {
    /// Value of a header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn new(status: u16, content_type: &str, body: String) -> Self {
        let headers = vec![
            ("Content-Type".to_string(), content_type.to_string()),
            ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
            (
                "Access-Control-Allow-Headers".to_string(),
                "Content-Type".to_string(),
            ),
            (
                "Access-Control-Allow-Methods".to_string(),
                "OPTIONS, GET".to_string(),
            ),
        ];
        Self {
            status,
            headers,
            body,
        }
    }

    fn error(status: u16, message: &str) -> Self {
        let body = serde_json::json!({ "message": message }).to_string();
        Self::new(status, "application/json", body)
    }
}

/// Serve the daily totals of a stored table.
///
/// Never fails: every error becomes a 4xx/5xx response whose body carries a
/// short message only. A bad query is 400, a stored table without the
/// needed columns is 422.
pub fn respond(source: &dyn BlobSource, query: &AggregateQuery) -> AggregateResponse {
    match build_response(source, query) {
        Ok(response) => response,
        Err(e) => {
            let (status, message) = match &e {
                ExportError::InvalidLocation(_) | ExportError::Config(_) => (400, e.to_string()),
                ExportError::MissingColumn(_) => (422, e.to_string()),
                ExportError::NotFound { .. } => (404, "Table not found".to_string()),
                _ => (500, "Internal error".to_string()),
            };
            if status >= 500 {
                tracing::error!(error = %e, "Aggregate request failed");
            } else {
                tracing::debug!(error = %e, status, "Aggregate request rejected");
            }
            AggregateResponse::error(status, &message)
        }
    }
}

fn build_response(source: &dyn BlobSource, query: &AggregateQuery) -> Result<AggregateResponse> {
    let format = query
        .format
        .as_deref()
        .map(str::parse::<AggregateFormat>)
        .transpose()?
        .unwrap_or_default();
    let location = BlobLocation::new(query.container.as_str(), query.key.as_str())?;

    let table = source.fetch(&location)?;
    let totals = daily_window(&table)?;
    let mut response = AggregateResponse::new(200, format.content_type(), format.render(&totals)?);

    if format == AggregateFormat::Csv {
        response.headers.push((
            "Content-Disposition".to_string(),
            format!("attachment; filename={}", download_name(&location.key)),
        ));
    }
    Ok(response)
}

/// `<stem>_per_day.csv` for a table key.
fn download_name(key: &str) -> String {
    let stem = Path::new(key)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(sanitize_key_component)
        .filter(|s| s.chars().any(|c| c != '.'))
        .unwrap_or_else(|| "table".to_string());
    format!("{stem}_per_day.csv")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    const ENERGY: &str = "activity,unit,time,starttime,endtime,value
\"ActiveEnergyBurned\",\"kcal\",,,2024-03-01 08:10:00 +0100,10.5
\"ActiveEnergyBurned\",\"kcal\",,,2024-03-01 21:00:00 +0100,4.5
\"ActiveEnergyBurned\",\"kcal\",,,2024-03-03 07:00:00 +0100,20
";

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_day_formats() {
        assert_eq!(parse_day("2024-03-01 23:59:59 -0500"), Some(day(2024, 3, 1)));
        assert_eq!(parse_day("2024-03-01 08:10:00"), Some(day(2024, 3, 1)));
        assert_eq!(parse_day("2024-03-01T08:10:00+02:00"), Some(day(2024, 3, 1)));
        assert_eq!(parse_day("2024-03-01"), Some(day(2024, 3, 1)));
        assert_eq!(parse_day(""), None);
        assert_eq!(parse_day("03/01/2024"), None);
    }

    #[test]
    fn test_daily_totals_sums_per_day() {
        let totals = daily_totals(ENERGY.as_bytes()).unwrap();
        assert_eq!(
            totals,
            vec![
                DailyTotal { date: day(2024, 3, 1), value: 15.0 },
                DailyTotal { date: day(2024, 3, 3), value: 20.0 },
            ]
        );
    }

    #[test]
    fn test_daily_totals_uses_end_date_in_full_tables() {
        let table = "sourceName,sourceVersion,device,type,unit,creationDate,startDate,endDate,value
\"Watch\",,,\"StepCount\",\"count\",,,2024-03-01 10:00:00 +0000,100
\"Watch\",,,\"StepCount\",\"count\",,,2024-03-01 11:00:00 +0000,50
";
        let totals = daily_totals(table.as_bytes()).unwrap();
        assert_eq!(totals, vec![DailyTotal { date: day(2024, 3, 1), value: 150.0 }]);
    }

    #[test]
    fn test_daily_totals_skips_unreadable_rows() {
        let table = "endtime,value
2024-03-01 10:00:00 +0000,1
,2
2024-03-01 12:00:00 +0000,
not a date,3
2024-03-01 13:00:00 +0000,abc
2024-03-01 14:00:00 +0000,4
";
        let totals = daily_totals(table.as_bytes()).unwrap();
        assert_eq!(totals, vec![DailyTotal { date: day(2024, 3, 1), value: 5.0 }]);
    }

    #[test]
    fn test_daily_totals_missing_columns() {
        assert!(matches!(
            daily_totals(b"time,value\n"),
            Err(ExportError::MissingColumn(c)) if c == "endtime"
        ));
        assert!(matches!(
            daily_totals(b"endtime,amount\n"),
            Err(ExportError::MissingColumn(c)) if c == "value"
        ));
    }

    #[test]
    fn test_last_days_window_is_inclusive() {
        let totals: Vec<DailyTotal> = [day(2024, 1, 1), day(2024, 1, 2), day(2024, 1, 31)]
            .into_iter()
            .map(|date| DailyTotal { date, value: 1.0 })
            .collect();

        let window = last_days(&totals, 30);
        let dates: Vec<NaiveDate> = window.iter().map(|t| t.date).collect();
        assert_eq!(dates, vec![day(2024, 1, 2), day(2024, 1, 31)]);

        assert!(last_days(&[], 30).is_empty());
    }

    #[test]
    fn test_render_csv_and_json() {
        let totals = vec![
            DailyTotal { date: day(2024, 3, 1), value: 15.0 },
            DailyTotal { date: day(2024, 3, 3), value: 2.5 },
        ];
        assert_eq!(
            AggregateFormat::Csv.render(&totals).unwrap(),
            "date,value\n2024-03-01,15\n2024-03-03,2.5\n"
        );
        assert_eq!(
            AggregateFormat::Json.render(&totals).unwrap(),
            r#"[{"date":"2024-03-01","value":15.0},{"date":"2024-03-03","value":2.5}]"#
        );
    }

    #[test]
    fn test_respond_csv() {
        let store = MemoryStore::new();
        let loc = BlobLocation::new("bites-ai-dev", "ActiveEnergyBurned.csv").unwrap();
        store.insert(loc, ENERGY.as_bytes());

        let query = AggregateQuery::from_params([
            ("bucketName", "bites-ai-dev"),
            ("objectKey", "ActiveEnergyBurned.csv"),
        ]);
        let response = respond(&store, &query);

        assert_eq!(response.status, 200);
        assert_eq!(response.header("content-type"), Some("text/csv"));
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(
            response.header("Content-Disposition"),
            Some("attachment; filename=ActiveEnergyBurned_per_day.csv")
        );
        assert_eq!(response.body, "date,value\n2024-03-01,15\n2024-03-03,20\n");
    }

    #[test]
    fn test_respond_json() {
        let store = MemoryStore::new();
        let loc = BlobLocation::new("bites-ai-dev", "ActiveEnergyBurned.csv").unwrap();
        store.insert(loc, ENERGY.as_bytes());

        let query = AggregateQuery::from_params([
            ("bucketName", "bites-ai-dev"),
            ("objectKey", "ActiveEnergyBurned.csv"),
            ("format", "json"),
        ]);
        let response = respond(&store, &query);

        assert_eq!(response.status, 200);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.header("Content-Disposition"), None);
        let parsed: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(parsed[0]["date"], "2024-03-01");
        assert_eq!(parsed[1]["value"], 20.0);
    }

    #[test]
    fn test_respond_error_statuses() {
        let store = MemoryStore::new();

        let missing_params = respond(&store, &AggregateQuery::default());
        assert_eq!(missing_params.status, 400);

        let bad_format = respond(
            &store,
            &AggregateQuery {
                container: "bites-ai-dev".into(),
                key: "x.csv".into(),
                format: Some("xml".into()),
            },
        );
        assert_eq!(bad_format.status, 400);

        let not_found = respond(
            &store,
            &AggregateQuery::from_params([("bucketName", "bites-ai-dev"), ("objectKey", "x.csv")]),
        );
        assert_eq!(not_found.status, 404);
        assert_eq!(not_found.body, r#"{"message":"Table not found"}"#);
        assert_eq!(not_found.header("Access-Control-Allow-Origin"), Some("*"));
    }

    #[test]
    fn test_respond_hides_internal_detail() {
        let store = MemoryStore::new();
        let loc = BlobLocation::new("bites-ai-dev", "broken.csv").unwrap();
        store.insert(loc, b"endtime,value\n2024-03-01,\xff\xfe\n".to_vec());

        let response = respond(
            &store,
            &AggregateQuery::from_params([("bucketName", "bites-ai-dev"), ("objectKey", "broken.csv")]),
        );

        assert_eq!(response.status, 500);
        assert_eq!(response.body, r#"{"message":"Internal error"}"#);
    }

    #[test]
    fn test_respond_table_without_needed_columns() {
        let store = MemoryStore::new();
        let loc = BlobLocation::new("bites-ai-dev", "Workout.csv").unwrap();
        store.insert(loc, b"activity,duration\n\"Running\",31.5\n".to_vec());

        let response = respond(
            &store,
            &AggregateQuery::from_params([("bucketName", "bites-ai-dev"), ("objectKey", "Workout.csv")]),
        );

        assert_eq!(response.status, 422);
        assert!(response.body.contains("endtime"));
    }

    #[test]
    fn test_daily_totals_rejects_row_of_wrong_arity() {
        let table = "endtime,value\n2024-03-01 10:00:00 +0000,1,extra\n";
        assert!(matches!(
            daily_totals(table.as_bytes()),
            Err(ExportError::MalformedTable(_))
        ));
    }

    #[test]
    fn test_daily_totals_unescapes_quoted_fields() {
        let table = "type,endtime,value\n\"a \\\"b\\\", c\",2024-03-01 10:00:00 +0000,2\n";
        let totals = daily_totals(table.as_bytes()).unwrap();
        assert_eq!(totals, vec![DailyTotal { date: day(2024, 3, 1), value: 2.0 }]);
    }

    #[test]
    fn test_download_name() {
        assert_eq!(download_name("ActiveEnergyBurned.csv"), "ActiveEnergyBurned_per_day.csv");
        assert_eq!(download_name("42/StepCount.csv"), "StepCount_per_day.csv");
        assert_eq!(download_name("..."), "table_per_day.csv");
    }
}
