use crate::error::{PipelineError, Result};
use crate::read::{
    self, HUM_MAX_COL, HUM_MEAN_COL, HUM_MIN_COL, PREC_COL, PREC_HOURS_COL, TEMP_MAX_COL,
    TEMP_MEAN_COL, TEMP_MIN_COL, TIME_COL, WEATHER_CODE_COL, WIND_DIR_COL, WIND_GUSTS_COL,
    WIND_SPEED_COL,
};
use crate::structs::{ComponentOutput, ReportRow, UnitReport};
use chrono::Datelike;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

const CITY_FILE_PREFIX: &str = "open-meteo-";
const CITY_FILE_SUFFIX: &str = ".csv";

/// Every column the wide report schema needs from a city export.
const REQUIRED_COLUMNS: [&str; 13] = [
    TIME_COL,
    WEATHER_CODE_COL,
    HUM_MAX_COL,
    HUM_MIN_COL,
    HUM_MEAN_COL,
    WIND_DIR_COL,
    TEMP_MAX_COL,
    TEMP_MIN_COL,
    PREC_COL,
    PREC_HOURS_COL,
    WIND_GUSTS_COL,
    WIND_SPEED_COL,
    TEMP_MEAN_COL,
];

/// Fixed city → station code table used by the `city-codes` pass.
pub const CITY_CODES: [(&str, &str); 10] = [
    ("Lavarone", "T0032"),
    ("Trento", "T0356"),
    ("Povo", "T0142"),
    ("Mezzana", "T0071"),
    ("Arco", "T0322"),
    ("Tenno", "T0200"),
    ("Cavalese", "T0367"),
    ("Telve", "T0392"),
    ("Predazzo", "T0389"),
    ("Rovereto", "T0147"),
];

/// Finds `open-meteo-{city}.csv` exports in `dir`, in directory-listing
/// order. The city name is whatever sits between prefix and extension.
pub fn discover_city_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(city) = name
            .strip_prefix(CITY_FILE_PREFIX)
            .and_then(|rest| rest.strip_suffix(CITY_FILE_SUFFIX))
        {
            if !city.is_empty() {
                found.push((city.to_string(), entry.path()));
            }
        }
    }
    Ok(found)
}

/// Reads one city export and reshapes it into wide-schema report rows
/// tagged with the source city.
pub fn report_rows_for_city(city: &str, path: &Path) -> Result<Vec<ReportRow>> {
    let observations = read::read_city_export(path, &REQUIRED_COLUMNS)?;
    Ok(observations
        .into_iter()
        .map(|o| ReportRow {
            city: city.to_string(),
            date: o.date,
            weather_code: o.weather_code,
            humidity_max: o.humidity_max,
            humidity_min: o.humidity_min,
            humidity_mean: o.humidity_mean,
            wind_direction: o.wind_direction,
            temp_max: o.temp_max,
            temp_min: o.temp_min,
            precipitation: o.precipitation,
            precipitation_hours: o.precipitation_hours,
            wind_gusts: o.wind_gusts,
            wind_speed: o.wind_speed,
            temp_mean: o.temp_mean,
        })
        .collect())
}

/// Merges every discovered city export into one wide report, preserving row
/// order within each city and city order as discovered. A file missing a
/// required column becomes a skipped unit; the merge continues.
pub fn run(input_dir: &Path) -> Result<ComponentOutput<ReportRow>> {
    let mut rows = Vec::new();
    let mut units = Vec::new();

    for (city, path) in discover_city_files(input_dir)? {
        match report_rows_for_city(&city, &path) {
            Ok(city_rows) => {
                debug!("{city}: {} report rows", city_rows.len());
                units.push(UnitReport::processed(&city, city_rows.len()));
                rows.extend(city_rows);
            }
            Err(e) => {
                warn!("skipping {city}: {e}");
                units.push(UnitReport::skipped(&city, e.to_string()));
            }
        }
    }

    Ok(ComponentOutput { rows, units })
}

/// Appends a `CityCode` column to a merged report, mapping the `City`
/// column through [`CITY_CODES`]. Unmapped cities get an empty code and a
/// warning once per city.
pub fn append_city_codes(input: &Path, output: &Path) -> Result<usize> {
    let mut reader = csv::Reader::from_path(input)?;
    let headers = reader.headers()?.clone();
    let city_idx = headers
        .iter()
        .position(|h| h == "City")
        .ok_or_else(|| PipelineError::Data(format!("column not found: 'City' in {}", input.display())))?;

    let mut writer = csv::Writer::from_path(output)?;
    let mut out_headers: Vec<&str> = headers.iter().collect();
    out_headers.push("CityCode");
    writer.write_record(&out_headers)?;

    let mut unmapped: Vec<String> = Vec::new();
    let mut written = 0;
    for record in reader.records() {
        let record = record?;
        let city = record.get(city_idx).unwrap_or("");
        let code = CITY_CODES
            .iter()
            .find(|(name, _)| *name == city)
            .map(|(_, code)| *code)
            .unwrap_or_else(|| {
                if !unmapped.iter().any(|c| c == city) {
                    warn!("no station code for city '{city}'");
                    unmapped.push(city.to_string());
                }
                ""
            });

        let mut cells: Vec<&str> = record.iter().collect();
        cells.push(code);
        writer.write_record(&cells)?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// Keeps only report rows whose `Date` falls in the inclusive year range.
/// Rows with an unparseable date are logged and dropped.
pub fn filter_report_years(
    input: &Path,
    output: &Path,
    year_range: (i32, i32),
) -> Result<usize> {
    let mut reader = csv::Reader::from_path(input)?;
    let headers = reader.headers()?.clone();
    let date_idx = headers
        .iter()
        .position(|h| h == "Date")
        .ok_or_else(|| PipelineError::Data(format!("column not found: 'Date' in {}", input.display())))?;

    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record(&headers)?;

    let mut written = 0;
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let cell = record.get(date_idx).unwrap_or("").trim();
        match read::parse_date(cell) {
            Ok(date) => {
                let year = date.year();
                if year >= year_range.0 && year <= year_range.1 {
                    writer.write_record(&record)?;
                    written += 1;
                }
            }
            Err(_) => warn!("{}: row {} dropped, bad date '{cell}'", input.display(), row + 1),
        }
    }
    writer.flush()?;
    Ok(written)
}
