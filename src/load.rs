use crate::error::Result;
use crate::structs::{
    AnomalyEvent, ArchiveRecord, LoadedFile, MicroclimateProfile, NormalizedAnomaly, ReportRow,
    SeasonalAggregate, TrendResult,
};
use csv::Writer;
use serde::Serialize;
use std::{fs::File, path::Path};

/// Writes seasonal aggregates to a CSV file.
///
/// # Arguments
/// * `rows` - Seasonal aggregates, already in output order
/// * `output_path` - Path where the CSV file will be created
///
/// # Errors
/// Returns error if the file cannot be created or written to.
pub fn write_seasonal_csv(rows: &[SeasonalAggregate], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record([
        "City",
        "Year",
        "Season",
        "AverageTemperature",
        "AveragePrecipitation",
    ])?;

    for row in rows {
        writer.write_record(&[
            row.city.clone(),
            row.year.to_string(),
            row.season.clone(),
            fmt_opt1(row.average_temperature),
            fmt_opt1(row.average_precipitation),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes per-city trend results to a CSV file.
pub fn write_trend_csv(rows: &[TrendResult], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record([
        "City",
        "ClimateTrend",
        "ParameterMeasured",
        "TimeWindow",
        "TotalVariation",
        "AnnualRate",
    ])?;

    for row in rows {
        writer.write_record(&[
            &row.city,
            &row.climate_trend,
            &row.parameter_measured,
            &row.time_window,
            &row.total_variation,
            &row.annual_rate,
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes per-city microclimate profiles to a CSV file.
pub fn write_microclimate_csv(rows: &[MicroclimateProfile], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record([
        "City",
        "MicroClimate",
        "MicroclimateType",
        "TemperatureRange",
        "HumidityRange",
        "WindPattern",
    ])?;

    for row in rows {
        writer.write_record(&[
            &row.city,
            &row.microclimate,
            &row.microclimate_type,
            &row.temperature_range,
            &row.humidity_range,
            &row.wind_pattern,
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the merged wide-schema weather report to a CSV file.
pub fn write_report_csv(rows: &[ReportRow], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record([
        "City",
        "Date",
        "WeatherCode",
        "MaxHumidity (Percentage)",
        "MinHumidity (Percentage)",
        "MeanHumidity (Percentage)",
        "WindDirection (Degree)",
        "MaxTemperature (Celsius)",
        "MinTemperature (Celsius)",
        "Precipitation (mm)",
        "PrecipitationHours (h)",
        "WindGusts (km/h)",
        "WindSpeed (km/h)",
        "MeanTemperature (Celsius)",
    ])?;

    for row in rows {
        writer.write_record(&[
            row.city.clone(),
            row.date.format("%Y-%m-%d").to_string(),
            fmt_opt(row.weather_code),
            fmt_opt(row.humidity_max),
            fmt_opt(row.humidity_min),
            fmt_opt(row.humidity_mean),
            fmt_opt(row.wind_direction),
            fmt_opt(row.temp_max),
            fmt_opt(row.temp_min),
            fmt_opt(row.precipitation),
            fmt_opt(row.precipitation_hours),
            fmt_opt(row.wind_gusts),
            fmt_opt(row.wind_speed),
            fmt_opt(row.temp_mean),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes synthetic anomaly events to a CSV file.
pub fn write_anomaly_csv(rows: &[AnomalyEvent], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record([
        "TypeAnomaly",
        "Severity",
        "DetectionDate",
        "DetectionTime",
        "Anomaly",
        "City",
    ])?;

    for row in rows {
        writer.write_record(&[
            &row.type_anomaly,
            &row.severity,
            &row.detection_date,
            &row.detection_time,
            &row.anomaly,
            &row.city,
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes ISO-normalized anomaly events to a CSV file.
pub fn write_normalized_csv(rows: &[NormalizedAnomaly], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record([
        "TypeAnomaly",
        "Severity",
        "DetectionDate",
        "DetectionTime",
        "Anomaly",
        "City",
        "DetectionDateTime",
    ])?;

    for row in rows {
        writer.write_record(&[
            &row.type_anomaly,
            &row.severity,
            &row.detection_date,
            &row.detection_time,
            &row.anomaly,
            &row.city,
            &row.detection_date_time,
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the per-source-file summary of an anomaly run to a CSV file.
pub fn write_loaded_files_csv(rows: &[LoadedFile], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(["City", "FileName", "FilePath", "Loaded"])?;
    for row in rows {
        writer.write_record(&[
            row.city.clone(),
            row.file_name.clone(),
            row.file_path.clone(),
            row.loaded.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the cleaned station archive, semicolon-delimited like its
/// sources.
pub fn write_archive_csv(rows: &[ArchiveRecord], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(file);

    writer.write_record([
        "Location",
        "Date",
        "MeanTemp",
        "MinTemperature",
        "MaxTemperature",
        "MeanHumidity",
        "WindSpeed",
        "WindGusts",
        "Rainfall",
        "Phenomena",
    ])?;

    for row in rows {
        writer.write_record(&[
            row.location.clone().unwrap_or_default(),
            row.date.clone().unwrap_or_default(),
            fmt_opt(row.mean_temp),
            fmt_opt(row.min_temperature),
            fmt_opt(row.max_temperature),
            fmt_opt(row.mean_humidity),
            fmt_opt(row.wind_speed),
            fmt_opt(row.wind_gusts),
            fmt_opt(row.rainfall),
            row.phenomena.clone().unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes any row collection to a pretty-formatted JSON file.
///
/// # Errors
/// Returns error if the file cannot be created or serialization fails.
pub fn write_json<T: Serialize>(rows: &[T], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    serde_json::to_writer_pretty(file, rows)?;
    Ok(())
}

/// Missing cells stay empty in the output.
fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn fmt_opt1(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.1}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn seasonal_csv_has_header_and_one_decimal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("season.csv");
        let rows = vec![SeasonalAggregate {
            city: "Trento".to_string(),
            year: 2020,
            season: "Winter".to_string(),
            average_temperature: Some(2.0),
            average_precipitation: None,
            count: 90,
        }];

        write_seasonal_csv(&rows, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "City,Year,Season,AverageTemperature,AveragePrecipitation"
        );
        assert_eq!(lines.next().unwrap(), "Trento,2020,Winter,2.0,");
    }

    #[test]
    fn archive_csv_is_semicolon_delimited() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.csv");
        let rows = vec![ArchiveRecord {
            location: Some("Telve".to_string()),
            date: Some("1/1/2020".to_string()),
            mean_temp: Some(12.5),
            min_temperature: None,
            max_temperature: None,
            mean_humidity: None,
            wind_speed: None,
            wind_gusts: None,
            rainfall: None,
            phenomena: Some("thunderstorm".to_string()),
        }];

        write_archive_csv(&rows, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Location;Date;MeanTemp"));
        assert!(text.contains("Telve;1/1/2020;12.5;;;;;;;thunderstorm"));
    }
}
