use crate::config::DatasetConfig;
use crate::error::{PipelineError, Result};
use crate::read::{self, TEMP_MEAN_COL, TIME_COL};
use crate::stats::{self, LinearFit};
use crate::structs::{ComponentOutput, DailyObservation, TrendResult, UnitReport};
use chrono::Datelike;
use log::{debug, warn};

/// Slopes below this magnitude (°C/year) count as no measurable change.
const STABLE_THRESHOLD: f64 = 0.05;

const DAYS_PER_YEAR: f64 = 365.25;

/// Fits the long-term temperature trend of one city series.
///
/// Elapsed time per row is (date - earliest date) in days / 365.25; mean
/// temperature is regressed on elapsed years by ordinary least squares.
/// Classification looks only at the slope: |slope| < 0.05 is stable,
/// otherwise the sign decides warming vs cooling. Series with fewer than
/// two temperature rows, or without any spread in time, cannot be fitted
/// and are rejected with a `Data` error.
pub fn trend_for_city(city: &str, observations: &[DailyObservation]) -> Result<TrendResult> {
    let earliest = observations
        .iter()
        .map(|o| o.date)
        .min()
        .ok_or_else(|| PipelineError::Data(format!("{city}: no observations")))?;
    let latest = observations.iter().map(|o| o.date).max().unwrap_or(earliest);

    let mut elapsed_years = Vec::new();
    let mut temperatures = Vec::new();
    for obs in observations {
        if let Some(t) = obs.temp_mean {
            elapsed_years.push((obs.date - earliest).num_days() as f64 / DAYS_PER_YEAR);
            temperatures.push(t);
        }
    }

    let fit = stats::linear_regression(&elapsed_years, &temperatures).ok_or_else(|| {
        PipelineError::Data(format!("{city}: series too short for trend regression"))
    })?;

    let start_year = earliest.year();
    let end_year = latest.year();
    let years_diff = end_year - start_year;
    let total_variation = fit.slope * years_diff as f64;

    debug!(
        "{city}: slope={:.4} r={:.3} p={:.3} over {} rows",
        fit.slope,
        fit.r_value,
        fit.p_value,
        temperatures.len()
    );

    Ok(TrendResult {
        city: city.to_string(),
        climate_trend: classify_slope(&fit).to_string(),
        parameter_measured: TEMP_MEAN_COL.to_string(),
        time_window: format!("{start_year}-{end_year} ({:.1} years)", years_diff as f64),
        total_variation: format!("{total_variation:.2}°C (total change)"),
        annual_rate: format!("{:.4}°C/year", fit.slope),
    })
}

fn classify_slope(fit: &LinearFit) -> &'static str {
    if fit.slope.abs() < STABLE_THRESHOLD {
        "Stable (Minimal Change)"
    } else if fit.slope > 0.0 {
        "Warming (Increase)"
    } else {
        "Cooling (Decrease)"
    }
}

/// Estimates the trend for every configured city, one unit per city,
/// skip-and-continue on unreadable files, missing columns, or series too
/// short to regress.
pub fn run(cfg: &DatasetConfig) -> ComponentOutput<TrendResult> {
    let mut rows = Vec::new();
    let mut units = Vec::new();

    for city in &cfg.cities {
        let path = cfg.city_file(city);
        let outcome = read::read_city_export(&path, &[TIME_COL, TEMP_MEAN_COL])
            .and_then(|observations| trend_for_city(city, &observations));
        match outcome {
            Ok(result) => {
                debug!("{city}: {}", result.climate_trend);
                units.push(UnitReport::processed(city, 1));
                rows.push(result);
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

    fn series(slope_per_year: f64, base: f64, days: u32) -> Vec<DailyObservation> {
        let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        (0..days)
            .map(|d| {
                let date = start + chrono::Days::new(d as u64);
                DailyObservation {
                    date,
                    weather_code: None,
                    temp_max: None,
                    temp_min: None,
                    temp_mean: Some(base + slope_per_year * (d as f64 / 365.25)),
                    humidity_max: None,
                    humidity_min: None,
                    humidity_mean: None,
                    wind_speed: None,
                    wind_gusts: None,
                    wind_direction: None,
                    precipitation: None,
                    precipitation_hours: None,
                }
            })
            .collect()
    }

    #[test]
    fn linear_series_recovers_slope_and_label() {
        let result = trend_for_city("Trento", &series(0.1, 8.0, 4000)).unwrap();
        assert_eq!(result.climate_trend, "Warming (Increase)");
        assert_eq!(result.annual_rate, "0.1000°C/year");

        let result = trend_for_city("Trento", &series(0.01, 8.0, 4000)).unwrap();
        assert_eq!(result.climate_trend, "Stable (Minimal Change)");

        let result = trend_for_city("Trento", &series(-0.2, 8.0, 4000)).unwrap();
        assert_eq!(result.climate_trend, "Cooling (Decrease)");
    }

    #[test]
    fn constant_series_is_stable_with_zero_slope() {
        let result = trend_for_city("Povo", &series(0.0, 10.0, 366)).unwrap();
        assert_eq!(result.climate_trend, "Stable (Minimal Change)");
        assert_eq!(result.annual_rate, "0.0000°C/year");
        assert_eq!(result.total_variation, "0.00°C (total change)");
    }

    #[test]
    fn window_formats_observed_year_range() {
        let result = trend_for_city("Arco", &series(0.0, 10.0, 367)).unwrap();
        assert_eq!(result.time_window, "2000-2001 (1.0 years)");
        assert_eq!(result.parameter_measured, TEMP_MEAN_COL);
    }

    #[test]
    fn single_point_series_is_rejected() {
        let err = trend_for_city("Tenno", &series(0.0, 10.0, 1)).unwrap_err();
        assert!(err.to_string().contains("too short"));

        let err = trend_for_city("Tenno", &[]).unwrap_err();
        assert!(err.to_string().contains("no observations"));
    }
}
