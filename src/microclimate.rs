use crate::config::DatasetConfig;
use crate::error::{PipelineError, Result};
use crate::read::{self, HUM_MEAN_COL, TEMP_MEAN_COL, TIME_COL, WIND_DIR_COL, WIND_SPEED_COL};
use crate::stats;
use crate::structs::{ComponentOutput, DailyObservation, MicroclimateProfile, UnitReport};
use chrono::Datelike;
use log::{debug, warn};

/// Builds the categorical microclimate profile of one city from its full
/// observation history.
///
/// All bands are half-open with an inclusive lower bound, so a maximum
/// temperature of exactly 12.0 already falls in the "cool" band. The
/// dominant wind direction is the most frequent value in the series (first
/// encountered on ties) and defaults to 0 for an empty series.
pub fn profile_for_city(city: &str, observations: &[DailyObservation]) -> Result<MicroclimateProfile> {
    let temperatures: Vec<f64> = observations.iter().filter_map(|o| o.temp_mean).collect();
    let humidities: Vec<f64> = observations.iter().filter_map(|o| o.humidity_mean).collect();
    let wind_speeds: Vec<f64> = observations.iter().filter_map(|o| o.wind_speed).collect();
    let wind_directions: Vec<f64> = observations
        .iter()
        .filter_map(|o| o.wind_direction)
        .collect();

    let min_temp = stats::min(&temperatures)
        .ok_or_else(|| PipelineError::Data(format!("{city}: no temperature values")))?;
    let max_temp = stats::max(&temperatures).unwrap_or(min_temp);

    let min_hum = stats::min(&humidities).unwrap_or(0.0);
    let max_hum = stats::max(&humidities).unwrap_or(0.0);

    let avg_wind_speed = stats::mean(&wind_speeds).unwrap_or(0.0);
    let dominant_direction = stats::mode_first(&wind_directions).unwrap_or(0.0);

    let (category, category_type) = classify_max_temperature(max_temp);
    let start_year = observations.iter().map(|o| o.date.year()).min().unwrap_or(0);
    let end_year = observations.iter().map(|o| o.date.year()).max().unwrap_or(0);

    Ok(MicroclimateProfile {
        city: city.to_string(),
        microclimate: format!("{category} ({start_year}-{end_year})"),
        microclimate_type: category_type.to_string(),
        temperature_range: format!("{min_temp:.1}°C - {max_temp:.1}°C"),
        humidity_range: format!("{min_hum:.0}% - {max_hum:.0}%"),
        wind_pattern: format!(
            "{}, avg {avg_wind_speed:.1} km/h, dominant {dominant_direction:.0}°",
            classify_wind_speed(avg_wind_speed)
        ),
    })
}

/// Wind strength bands over the mean wind speed in km/h.
fn classify_wind_speed(avg_speed: f64) -> &'static str {
    if avg_speed < 5.0 {
        "light winds"
    } else if avg_speed < 15.0 {
        "moderate winds"
    } else if avg_speed < 30.0 {
        "strong winds"
    } else {
        "severe winds"
    }
}

/// Microclimate bands over the maximum observed mean temperature in °C.
fn classify_max_temperature(max_temp: f64) -> (&'static str, &'static str) {
    if max_temp < 12.0 {
        ("alpine cold microclimate", "cold")
    } else if max_temp < 18.0 {
        ("cool microclimate", "mild")
    } else if max_temp < 24.0 {
        ("temperate microclimate", "temperate")
    } else if max_temp < 30.0 {
        ("warm microclimate", "warm")
    } else {
        ("very warm microclimate", "hot")
    }
}

/// Classifies every configured city, one unit per city, skip-and-continue
/// on unreadable files or missing columns.
pub fn run(cfg: &DatasetConfig) -> ComponentOutput<MicroclimateProfile> {
    let mut rows = Vec::new();
    let mut units = Vec::new();

    for city in &cfg.cities {
        let path = cfg.city_file(city);
        let outcome = read::read_city_export(
            &path,
            &[TIME_COL, TEMP_MEAN_COL, HUM_MEAN_COL, WIND_SPEED_COL, WIND_DIR_COL],
        )
        .and_then(|observations| profile_for_city(city, &observations));
        match outcome {
            Ok(profile) => {
                debug!("{city}: {}", profile.microclimate);
                units.push(UnitReport::processed(city, 1));
                rows.push(profile);
            }
            Err(e) => {
                warn!("skipping {city}: {e}");
                units.push(UnitReport::skipped(city, e.to_string()));
            }
        }
    }

    ComponentOutput { rows, units }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn obs(day: u32, temp: f64, hum: f64, speed: f64, dir: f64) -> DailyObservation {
        DailyObservation {
            date: NaiveDate::from_ymd_opt(2020, 6, day).unwrap(),
            weather_code: None,
            temp_max: None,
            temp_min: None,
            temp_mean: Some(temp),
            humidity_max: None,
            humidity_min: None,
            humidity_mean: Some(hum),
            wind_speed: Some(speed),
            wind_gusts: None,
            wind_direction: Some(dir),
            precipitation: None,
            precipitation_hours: None,
        }
    }

    #[test]
    fn band_edges_classify_into_higher_band() {
        assert_eq!(classify_max_temperature(11.9).0, "alpine cold microclimate");
        assert_eq!(classify_max_temperature(12.0).0, "cool microclimate");
        assert_eq!(classify_max_temperature(18.0).0, "temperate microclimate");
        assert_eq!(classify_max_temperature(24.0).0, "warm microclimate");
        assert_eq!(classify_max_temperature(30.0).0, "very warm microclimate");
    }

    #[test]
    fn wind_bands_are_lower_inclusive() {
        assert_eq!(classify_wind_speed(4.9), "light winds");
        assert_eq!(classify_wind_speed(5.0), "moderate winds");
        assert_eq!(classify_wind_speed(15.0), "strong winds");
        assert_eq!(classify_wind_speed(30.0), "severe winds");
    }

    #[test]
    fn profile_formats_ranges_and_pattern() {
        let observations = vec![
            obs(1, 4.25, 55.4, 3.0, 180.0),
            obs(2, 19.0, 81.6, 12.0, 180.0),
            obs(3, 11.5, 70.0, 9.0, 90.0),
        ];
        let profile = profile_for_city("Lavarone", &observations).unwrap();
        assert_eq!(profile.microclimate, "temperate microclimate (2020-2020)");
        assert_eq!(profile.microclimate_type, "temperate");
        assert_eq!(profile.temperature_range, "4.2°C - 19.0°C");
        assert_eq!(profile.humidity_range, "55% - 82%");
        assert_eq!(
            profile.wind_pattern,
            "moderate winds, avg 8.0 km/h, dominant 180°"
        );
    }

    #[test]
    fn dominant_direction_defaults_to_zero() {
        let mut observations = vec![obs(1, 10.0, 60.0, 2.0, 0.0)];
        observations[0].wind_direction = None;
        let profile = profile_for_city("Mezzana", &observations).unwrap();
        assert!(profile.wind_pattern.ends_with("dominant 0°"));
    }

    #[test]
    fn empty_temperature_series_is_rejected() {
        let mut observations = vec![obs(1, 10.0, 60.0, 2.0, 0.0)];
        observations[0].temp_mean = None;
        assert!(profile_for_city("Telve", &observations).is_err());
    }
}
