//! Response normalization
//!
//! Turns raw provider bodies into values ready for a [`TimeSeriesTable`]:
//!
//! - SMARD chart JSON: `{"series": [[epoch_ms, value|null], ...]}`
//! - BMRS CSV: four preamble lines, a header line, data rows, `<EOF>` footer
//! - EirGrid dashboard JSON: `{"Rows": [{"EffectiveTime", "FieldName", "Region", "Value"}]}`
//!
//! Malformed bodies are [`ParseError`]s; they are fatal for the request.

use chrono::{DateTime, TimeZone};
use chrono_tz::Europe::Berlin;
use chrono_tz::Tz;
use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;

use crate::catalog::Resolution;
use crate::error::ParseError;
use crate::table::TimeSeriesTable;

// ============================================================================
// Shared field helpers
// ============================================================================

/// Parse a numeric field; empty and not-a-number markers are missing values
///
/// # Examples
///
/// ```
/// # use grid_market_data::normalize::parse_value;
/// assert_eq!(parse_value("1234.5").unwrap(), Some(1234.5));
/// assert_eq!(parse_value(" -12 ").unwrap(), Some(-12.0));
/// assert_eq!(parse_value("").unwrap(), None);
/// assert_eq!(parse_value("NaN").unwrap(), None);
/// assert!(parse_value("12,5a").is_err());
/// ```
pub fn parse_value(value: &str) -> Result<Option<f64>, ParseError> {
    let trimmed = value.trim();

    let upper = trimmed.to_uppercase();
    if trimmed.is_empty() || upper == "NAN" || upper == "NULL" || upper == "N/A" {
        return Ok(None);
    }

    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ParseError::InvalidDecimal(value.to_string()))
}

/// Look up a field of a CSV record by column name
pub fn get_field<'a>(
    record: &'a StringRecord,
    headers: &StringRecord,
    field_name: &str,
) -> Result<&'a str, ParseError> {
    let idx = headers
        .iter()
        .position(|h| h.trim() == field_name)
        .ok_or_else(|| ParseError::MissingColumn(field_name.to_string()))?;

    record
        .get(idx)
        .ok_or_else(|| ParseError::MissingColumn(field_name.to_string()))
}

// ============================================================================
// SMARD chart JSON
// ============================================================================

#[derive(Debug, Deserialize)]
struct SmardChart {
    series: Vec<(i64, Option<f64>)>,
}

/// Parse a SMARD chart file into `(Europe/Berlin timestamp, value)` points
///
/// Points keep provider order; `null` values stay missing.
///
/// # Examples
///
/// ```
/// # use grid_market_data::normalize::parse_smard_series;
/// let body = r#"{"meta_data":{"version":1},"series":[[1694988000000,120.5],[1694988900000,null]]}"#;
/// let points = parse_smard_series(body).unwrap();
///
/// assert_eq!(points.len(), 2);
/// assert_eq!(points[0].0.to_rfc3339(), "2023-09-18T00:00:00+02:00");
/// assert_eq!(points[0].1, Some(120.5));
/// assert_eq!(points[1].1, None);
/// ```
pub fn parse_smard_series(body: &str) -> Result<Vec<(DateTime<Tz>, Option<f64>)>, ParseError> {
    let chart: SmardChart = serde_json::from_str(body)
        .map_err(|e| ParseError::Json(format!("Failed to parse SMARD chart: {}", e)))?;

    chart
        .series
        .into_iter()
        .map(|(millis, value)| {
            let ts = Berlin
                .timestamp_millis_opt(millis)
                .single()
                .ok_or_else(|| ParseError::InvalidTimestamp(millis.to_string()))?;
            Ok((ts, value))
        })
        .collect()
}

/// Single-column table of a SMARD chart file, in MW for energy series
///
/// Quarter-hour files carry energy per slot (MWh) and are scaled by 4; hourly
/// price files are returned as published.
pub fn smard_table<L>(
    label: L,
    body: &str,
    resolution: Resolution,
) -> Result<TimeSeriesTable<L>, ParseError> {
    let points = parse_smard_series(body)?;
    let factor = resolution.energy_to_power();
    Ok(TimeSeriesTable::from_points(label, points).map_values(|v| v * factor))
}

// ============================================================================
// BMRS CSV
// ============================================================================

/// Lines preceding the header of a BMRS CSV report
pub const BMRS_PREAMBLE_LINES: usize = 4;

const BMRS_FOOTER: &str = "<EOF>";

/// Header and data rows of one BMRS CSV report
#[derive(Debug, Clone)]
pub struct BmrsCsv {
    headers: StringRecord,
    records: Vec<StringRecord>,
}

impl BmrsCsv {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `(settlement period, value)` pairs sorted by period
    ///
    /// With `filter = Some((column, wanted))` only rows whose `column` equals
    /// `wanted` are used.
    pub fn period_values(
        &self,
        period_column: &str,
        value_column: &str,
        filter: Option<(&str, &str)>,
    ) -> Result<Vec<(i64, Option<f64>)>, ParseError> {
        let mut pairs = Vec::new();

        for record in &self.records {
            if let Some((column, wanted)) = filter {
                if get_field(record, &self.headers, column)?.trim() != wanted {
                    continue;
                }
            }

            let raw_period = get_field(record, &self.headers, period_column)?;
            let period = parse_period(raw_period)?;
            let value = parse_value(get_field(record, &self.headers, value_column)?)?;
            pairs.push((period, value));
        }

        pairs.sort_by_key(|(period, _)| *period);
        Ok(pairs)
    }
}

fn parse_period(raw: &str) -> Result<i64, ParseError> {
    let trimmed = raw.trim();
    if let Ok(period) = trimmed.parse::<i64>() {
        return Ok(period);
    }

    // Periods occasionally come as "12.0"
    match trimmed.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 => Ok(v as i64),
        _ => Err(ParseError::InvalidDecimal(raw.to_string())),
    }
}

/// Parse a BMRS CSV report
///
/// Skips the preamble, reads the header line, and drops the `<EOF>` footer.
///
/// # Examples
///
/// ```
/// # use grid_market_data::normalize::parse_bmrs_csv;
/// let body = "HDR\n*\n*\n*\nSettlementPeriod,Quantity\n2,200\n1,100\n<EOF>\n";
/// let report = parse_bmrs_csv(body).unwrap();
///
/// assert_eq!(
///     report.period_values("SettlementPeriod", "Quantity", None).unwrap(),
///     vec![(1, Some(100.0)), (2, Some(200.0))]
/// );
/// ```
pub fn parse_bmrs_csv(body: &str) -> Result<BmrsCsv, ParseError> {
    let content = body
        .splitn(BMRS_PREAMBLE_LINES + 1, '\n')
        .nth(BMRS_PREAMBLE_LINES)
        .ok_or_else(|| ParseError::CsvFormat("BMRS report ends before its header line".to_string()))?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ParseError::CsvFormat(format!("Failed to read CSV headers: {}", e)))?
        .clone();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| ParseError::CsvFormat(format!("CSV parse error: {}", e)))?;
        let is_footer = record
            .get(0)
            .map_or(false, |field| field.trim().starts_with(BMRS_FOOTER));
        if is_footer || record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        records.push(record);
    }

    Ok(BmrsCsv { headers, records })
}

// ============================================================================
// EirGrid dashboard JSON
// ============================================================================

#[derive(Debug, Deserialize)]
struct EirGridResponse {
    #[serde(rename = "Rows")]
    rows: Vec<EirGridRow>,
}

/// One row of a Smart Grid Dashboard response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EirGridRow {
    #[serde(rename = "EffectiveTime", default)]
    pub effective_time: Option<String>,

    #[serde(rename = "FieldName", default)]
    pub field_name: Option<String>,

    #[serde(rename = "Region", default)]
    pub region: Option<String>,

    #[serde(rename = "Value", default)]
    pub value: Option<f64>,
}

/// Parse the rows of a Smart Grid Dashboard response
///
/// # Examples
///
/// ```
/// # use grid_market_data::normalize::parse_eirgrid_rows;
/// let body = r#"{"ErrorMessage":null,"Rows":[
///     {"EffectiveTime":"18-Sep-2023 00:00:00","FieldName":"WIND_ACTUAL","Region":"ALL","Value":1204},
///     {"EffectiveTime":"18-Sep-2023 00:15:00","FieldName":"WIND_ACTUAL","Region":"ALL","Value":null}
/// ],"Status":"Success"}"#;
///
/// let rows = parse_eirgrid_rows(body).unwrap();
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[0].value, Some(1204.0));
/// assert_eq!(rows[1].value, None);
/// ```
pub fn parse_eirgrid_rows(body: &str) -> Result<Vec<EirGridRow>, ParseError> {
    let response: EirGridResponse = serde_json::from_str(body)
        .map_err(|e| ParseError::Json(format!("Failed to parse EirGrid rows: {}", e)))?;
    Ok(response.rows)
}

/// Values of the rows in provider order, optionally only one `FieldName`
pub fn eirgrid_values(rows: &[EirGridRow], field_name: Option<&str>) -> Vec<Option<f64>> {
    rows.iter()
        .filter(|row| match field_name {
            Some(wanted) => row.field_name.as_deref() == Some(wanted),
            None => true,
        })
        .map(|row| row.value)
        .collect()
}
