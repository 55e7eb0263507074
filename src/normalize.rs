use crate::error::{PipelineError, Result};
use crate::structs::NormalizedAnomaly;
use chrono::NaiveDate;
use log::warn;
use std::path::Path;

/// Rewrites an anomaly table with ISO 8601 dates.
///
/// `DetectionDate` (DD/MM/YYYY) becomes `YYYY-MM-DD` and a combined
/// `DetectionDateTime` column (`YYYY-MM-DDTHH:MM:SS`) is appended from the
/// date and the unchanged `DetectionTime`. Rows whose date does not parse
/// are logged and dropped.
pub fn normalize_anomalies(input: &Path) -> Result<Vec<NormalizedAnomaly>> {
    let mut reader = csv::Reader::from_path(input)?;
    let headers = reader.headers()?.clone();
    let column = |name: &str| -> Result<usize> {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            PipelineError::Data(format!("column not found: '{name}' in {}", input.display()))
        })
    };

    let type_idx = column("TypeAnomaly")?;
    let severity_idx = column("Severity")?;
    let date_idx = column("DetectionDate")?;
    let time_idx = column("DetectionTime")?;
    let anomaly_idx = column("Anomaly")?;
    let city_idx = column("City")?;

    let mut rows = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let raw_date = record.get(date_idx).unwrap_or("").trim();
        let date = match NaiveDate::parse_from_str(raw_date, "%d/%m/%Y") {
            Ok(date) => date,
            Err(_) => {
                warn!(
                    "{}: row {} dropped, bad detection date '{raw_date}'",
                    input.display(),
                    row + 1
                );
                continue;
            }
        };

        let iso_date = date.format("%Y-%m-%d").to_string();
        let time = record.get(time_idx).unwrap_or("").trim().to_string();
        rows.push(NormalizedAnomaly {
            type_anomaly: record.get(type_idx).unwrap_or("").to_string(),
            severity: record.get(severity_idx).unwrap_or("").to_string(),
            detection_date_time: format!("{iso_date}T{time}"),
            detection_date: iso_date,
            detection_time: time,
            anomaly: record.get(anomaly_idx).unwrap_or("").to_string(),
            city: record.get(city_idx).unwrap_or("").to_string(),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn dates_become_iso_and_date_time_is_combined() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("anomaly.csv");
        fs::write(
            &input,
            "TypeAnomaly,Severity,DetectionDate,DetectionTime,Anomaly,City\n\
Excessive Wind,High,05/03/2021,14:30:00,Record Wind,Arco\n\
Reduced Visibility,Low,31/10/2025,23:59:59,Dense Fog,Telve\n",
        )
        .unwrap();

        let rows = normalize_anomalies(&input).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].detection_date, "2021-03-05");
        assert_eq!(rows[0].detection_date_time, "2021-03-05T14:30:00");
        assert_eq!(rows[1].detection_date_time, "2025-10-31T23:59:59");
        assert_eq!(rows[1].city, "Telve");
    }

    #[test]
    fn bad_dates_are_dropped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("anomaly.csv");
        fs::write(
            &input,
            "TypeAnomaly,Severity,DetectionDate,DetectionTime,Anomaly,City\n\
Excessive Wind,High,2021-03-05,14:30:00,Record Wind,Arco\n\
Solid Precipitation,Medium,06/07/2022,08:00:00,Sudden Hail,Povo\n",
        )
        .unwrap();

        let rows = normalize_anomalies(&input).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].anomaly, "Sudden Hail");
    }

    #[test]
    fn missing_column_is_a_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("anomaly.csv");
        fs::write(&input, "Severity,DetectionDate\nHigh,05/03/2021\n").unwrap();
        assert!(normalize_anomalies(&input).is_err());
    }
}
