use std::mem::take;

use log::debug;
use thiserror::Error;

use crate::model::{CalendarDate, TimeSeriesRecord};

const DATE: &str = "Date";
const REGION: &str = "RegionName";
const PRICE: &str = "AveragePrice";
const CHANGE_1M: &str = "1m%Change";
const CHANGE_12M: &str = "12m%Change";

#[derive(Debug, Error)]
pub enum CsvParseError {
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("no header row")]
    Empty,
    #[error("missing column `{0}`")]
    MissingColumn(&'static str),
    #[error("line {line}: invalid date `{value}`")]
    Date { line: usize, value: String },
}

/// Split CSV text into rows of fields. Quoted fields may contain the
/// separator, doubled quotes and line breaks; CRLF is accepted.
pub fn split_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(take(&mut field));
                if row.len() > 1 || row.first().is_some_and(|f| !f.is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    row.push(field);
    if row.len() > 1 || row.first().is_some_and(|f| !f.is_empty()) {
        rows.push(row);
    }
    rows
}

/// Parse a `D/M/YY` date. Two-digit years below 50 are 20xx, the rest
/// 19xx; four-digit years are taken as written.
pub fn parse_date(value: &str) -> Option<CalendarDate> {
    let mut parts = value.trim().split('/');
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let year_str = parts.next()?.trim();
    if parts.next().is_some() {
        return None;
    }
    let year: i32 = year_str.parse().ok()?;
    let year = match year_str.len() {
        1 | 2 if year < 50 => 2000 + year,
        1 | 2 => 1900 + year,
        _ => year,
    };
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Some(CalendarDate::new(year, month, day))
}

/// Parse the housing time series (`Date,RegionName,AveragePrice,1m%Change,
/// 12m%Change`, extra columns ignored, any order).
///
/// Rows without a date or region are skipped; empty numeric cells are
/// `None`.
pub fn parse_time_series(data: &[u8]) -> Result<Vec<TimeSeriesRecord>, CsvParseError> {
    let text = std::str::from_utf8(data)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rows = split_rows(text).into_iter();
    let header = rows.next().ok_or(CsvParseError::Empty)?;

    let column = |name: &'static str| {
        header
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(CsvParseError::MissingColumn(name))
    };
    let date_col = column(DATE)?;
    let region_col = column(REGION)?;
    let price_col = column(PRICE)?;
    let change_1m_col = column(CHANGE_1M).ok();
    let change_12m_col = column(CHANGE_12M).ok();

    let mut records = Vec::new();
    // Header is line 1.
    for (i, row) in rows.enumerate() {
        let line = i + 2;
        let cell = |col: usize| row.get(col).map(|s| s.trim()).unwrap_or("");

        let date_str = cell(date_col);
        let region = cell(region_col);
        if date_str.is_empty() || region.is_empty() {
            continue;
        }
        let date = parse_date(date_str).ok_or_else(|| CsvParseError::Date {
            line,
            value: date_str.to_string(),
        })?;

        // Unreadable numbers are no-data for this row only.
        let number = |col: Option<usize>, name: &str| -> Option<f64> {
            let value = cell(col?);
            if value.is_empty() {
                return None;
            }
            match value.parse::<f64>() {
                Ok(n) if n.is_finite() => Some(n),
                _ => {
                    debug!("line {line}: unreadable {name} `{value}`, treated as no data");
                    None
                }
            }
        };

        records.push(TimeSeriesRecord {
            region: region.to_string(),
            date,
            average_price: number(Some(price_col), PRICE),
            change_1m: number(change_1m_col, CHANGE_1M),
            change_12m: number(change_12m_col, CHANGE_12M),
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Date,RegionName,AreaCode,AveragePrice,1m%Change,12m%Change\r\n\
        1/1/95,Camden,E09000007,115418.1,,\r\n\
        1/2/95,Camden,E09000007,117318.4,1.6,\r\n\
        1/7/25, Westminster ,E09000033,1030500,-0.4,3.25\r\n\
        1/7/25,\"Kensington and Chelsea\",E09000020,,,\r\n";

    #[test]
    fn parses_sample_rows() {
        let records = parse_time_series(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 4);

        assert_eq!(records[0].date, CalendarDate::new(1995, 1, 1));
        assert_eq!(records[0].average_price, Some(115_418.1));
        assert_eq!(records[0].change_1m, None);
        assert_eq!(records[1].change_1m, Some(1.6));

        assert_eq!(records[2].region, "Westminster");
        assert_eq!(records[2].date, CalendarDate::new(2025, 7, 1));
        assert_eq!(records[2].change_12m, Some(3.25));

        assert_eq!(records[3].region, "Kensington and Chelsea");
        assert_eq!(records[3].average_price, None);
    }

    #[test]
    fn year_pivot() {
        assert_eq!(parse_date("1/1/49").unwrap().year, 2049);
        assert_eq!(parse_date("1/1/50").unwrap().year, 1950);
        assert_eq!(parse_date("1/1/00").unwrap().year, 2000);
        assert_eq!(parse_date("15/3/2024").unwrap(), CalendarDate::new(2024, 3, 15));
        assert_eq!(parse_date("1/13/24"), None);
        assert_eq!(parse_date("2024-01-01"), None);
    }

    #[test]
    fn quoted_fields() {
        let rows = split_rows("a,\"b,c\",\"say \"\"hi\"\"\"\n\n1,2,3");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["a", "b,c", "say \"hi\""]);
    }

    #[test]
    fn skips_rows_without_date_or_region() {
        let csv = "Date,RegionName,AveragePrice\n,Camden,1\n1/1/20,,2\n1/1/20,Barnet,3\n";
        let records = parse_time_series(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].region, "Barnet");
    }

    #[test]
    fn unreadable_numbers_are_no_data_for_that_row() {
        let csv = "Date,RegionName,AveragePrice,1m%Change\n\
            1/1/20,Camden,1,0.5\n\
            1/1/20,Barnet,lots,NaN\n\
            1/1/20,Brent,3,n/a\n";
        let records = parse_time_series(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].average_price, Some(1.0));
        assert_eq!(records[1].average_price, None);
        assert_eq!(records[1].change_1m, None);
        assert_eq!(records[2].average_price, Some(3.0));
        assert_eq!(records[2].change_1m, None);
    }

    #[test]
    fn reports_structural_errors() {
        let csv = "Date,RegionName,AveragePrice\n1/1/20,Camden,1\nsoon,Barnet,2\n";
        let err = parse_time_series(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CsvParseError::Date { line: 3, .. }));

        let err = parse_time_series(b"Date,RegionName\n").unwrap_err();
        assert!(matches!(err, CsvParseError::MissingColumn("AveragePrice")));
        assert!(matches!(parse_time_series(b"").unwrap_err(), CsvParseError::Empty));
    }
}
