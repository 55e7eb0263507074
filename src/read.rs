use crate::error::{PipelineError, Result};
use crate::structs::DailyObservation;
use chrono::NaiveDate;
use csv::StringRecord;
use log::warn;
use std::fs;
use std::path::Path;

/// Column names of the open-meteo daily export.
pub const TIME_COL: &str = "time";
pub const WEATHER_CODE_COL: &str = "weather_code (wmo code)";
pub const TEMP_MAX_COL: &str = "temperature_2m_max (°C)";
pub const TEMP_MIN_COL: &str = "temperature_2m_min (°C)";
pub const TEMP_MEAN_COL: &str = "temperature_2m_mean (°C)";
pub const HUM_MAX_COL: &str = "relative_humidity_2m_max (%)";
pub const HUM_MIN_COL: &str = "relative_humidity_2m_min (%)";
pub const HUM_MEAN_COL: &str = "relative_humidity_2m_mean (%)";
pub const WIND_SPEED_COL: &str = "wind_speed_10m_mean (km/h)";
pub const WIND_GUSTS_COL: &str = "wind_gusts_10m_mean (km/h)";
pub const WIND_DIR_COL: &str = "winddirection_10m_dominant (°)";
pub const PREC_COL: &str = "precipitation_sum (mm)";
pub const PREC_HOURS_COL: &str = "precipitation_hours (h)";

/// Export files start with this many metadata lines before the header row.
pub const METADATA_ROWS: usize = 3;

/// Reads one per-city export into daily observations.
///
/// The first [`METADATA_ROWS`] lines are skipped, the next line is the
/// header. Every column named in `required` must be present or the whole
/// file is rejected with a `Data` error; all other known columns are
/// optional. Rows with an unparseable date or numeric cell are logged and
/// skipped, the rest of the file is still used.
pub fn read_city_export(path: &Path, required: &[&str]) -> Result<Vec<DailyObservation>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| PipelineError::Data(format!("cannot read {}: {e}", path.display())))?;
    let data = skip_metadata(&raw, METADATA_ROWS);

    let mut reader = csv::Reader::from_reader(data.as_bytes());
    let headers = reader.headers()?.clone();

    for col in required {
        if !headers.iter().any(|h| h == *col) {
            return Err(PipelineError::Data(format!(
                "column not found: '{col}' in {}",
                path.display()
            )));
        }
    }

    let position = |name: &str| headers.iter().position(|h| h == name);
    let time_idx = position(TIME_COL).ok_or_else(|| {
        PipelineError::Data(format!("column not found: '{TIME_COL}' in {}", path.display()))
    })?;
    let weather_code_idx = position(WEATHER_CODE_COL);
    let temp_max_idx = position(TEMP_MAX_COL);
    let temp_min_idx = position(TEMP_MIN_COL);
    let temp_mean_idx = position(TEMP_MEAN_COL);
    let hum_max_idx = position(HUM_MAX_COL);
    let hum_min_idx = position(HUM_MIN_COL);
    let hum_mean_idx = position(HUM_MEAN_COL);
    let wind_speed_idx = position(WIND_SPEED_COL);
    let wind_gusts_idx = position(WIND_GUSTS_COL);
    let wind_dir_idx = position(WIND_DIR_COL);
    let prec_idx = position(PREC_COL);
    let prec_hours_idx = position(PREC_HOURS_COL);

    let mut observations = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;

        let date = match record.get(time_idx).map(str::trim) {
            Some(cell) if !cell.is_empty() => match parse_date(cell) {
                Ok(date) => date,
                Err(_) => {
                    warn!(
                        "{}: row {} skipped, bad date '{}'",
                        path.display(),
                        row + 1,
                        cell
                    );
                    continue;
                }
            },
            _ => {
                warn!("{}: row {} skipped, empty date", path.display(), row + 1);
                continue;
            }
        };

        let observation = (|| -> std::result::Result<DailyObservation, String> {
            Ok(DailyObservation {
                date,
                weather_code: number_cell(&record, weather_code_idx)?,
                temp_max: number_cell(&record, temp_max_idx)?,
                temp_min: number_cell(&record, temp_min_idx)?,
                temp_mean: number_cell(&record, temp_mean_idx)?,
                humidity_max: number_cell(&record, hum_max_idx)?,
                humidity_min: number_cell(&record, hum_min_idx)?,
                humidity_mean: number_cell(&record, hum_mean_idx)?,
                wind_speed: number_cell(&record, wind_speed_idx)?,
                wind_gusts: number_cell(&record, wind_gusts_idx)?,
                wind_direction: number_cell(&record, wind_dir_idx)?,
                precipitation: number_cell(&record, prec_idx)?,
                precipitation_hours: number_cell(&record, prec_hours_idx)?,
            })
        })();

        match observation {
            Ok(obs) => observations.push(obs),
            Err(cell) => {
                warn!(
                    "{}: row {} skipped, bad numeric cell '{}'",
                    path.display(),
                    row + 1,
                    cell
                );
            }
        }
    }

    Ok(observations)
}

/// Accepts ISO (`2020-01-31`), day-first (`31/01/2020`) and ISO date-time
/// (`2020-01-31T06:00`) forms.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let date_part = text.split('T').next().unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%d/%m/%Y"))
        .map_err(PipelineError::from)
}

fn skip_metadata(raw: &str, rows: usize) -> &str {
    let mut rest = raw;
    for _ in 0..rows {
        match rest.find('\n') {
            Some(pos) => rest = &rest[pos + 1..],
            None => return "",
        }
    }
    rest
}

fn number_cell(
    record: &StringRecord,
    idx: Option<usize>,
) -> std::result::Result<Option<f64>, String> {
    let Some(idx) = idx else {
        return Ok(None);
    };
    match record.get(idx).map(str::trim) {
        None | Some("") => Ok(None),
        Some(cell) => cell.parse::<f64>().map(Some).map_err(|_| cell.to_string()),
    }
}
