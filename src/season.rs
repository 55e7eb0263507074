use crate::config::DatasetConfig;
use crate::read::{self, PREC_COL, TEMP_MEAN_COL, TIME_COL};
use crate::structs::{ComponentOutput, DailyObservation, SeasonalAggregate, UnitReport};
use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use std::collections::HashMap;

/// Astronomical season, Northern Hemisphere day-exact boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub fn label(self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
        }
    }
}

/// Maps a date to its season. Winter = Dec 21–Mar 19, Spring = Mar 20–Jun 20,
/// Summer = Jun 21–Sep 22, Autumn = Sep 23–Dec 20.
pub fn season_of(date: NaiveDate) -> Season {
    match (date.month(), date.day()) {
        (12, d) if d >= 21 => Season::Winter,
        (1 | 2, _) => Season::Winter,
        (3, d) if d <= 19 => Season::Winter,
        (3..=5, _) => Season::Spring,
        (6, d) if d <= 20 => Season::Spring,
        (6..=8, _) => Season::Summer,
        (9, d) if d <= 22 => Season::Summer,
        _ => Season::Autumn,
    }
}

/// Groups one city's observations by (year, season) and averages the
/// available temperature and precipitation values per group, rounded to one
/// decimal. Groups outside `year_range` are dropped after aggregation.
/// Output order is year ascending, then season label alphabetically.
pub fn seasonal_aggregates(
    city: &str,
    observations: &[DailyObservation],
    year_range: (i32, i32),
) -> Vec<SeasonalAggregate> {
    let mut groups: HashMap<(i32, Season), SeasonBucket> = HashMap::new();

    for obs in observations {
        let bucket = groups
            .entry((obs.date.year(), season_of(obs.date)))
            .or_default();
        bucket.count += 1;
        if let Some(t) = obs.temp_mean {
            bucket.temperatures.push(t);
        }
        if let Some(p) = obs.precipitation {
            bucket.precipitations.push(p);
        }
    }

    let mut rows: Vec<SeasonalAggregate> = groups
        .into_iter()
        .filter(|((year, _), _)| *year >= year_range.0 && *year <= year_range.1)
        .map(|((year, season), bucket)| SeasonalAggregate {
            city: city.to_string(),
            year,
            season: season.label().to_string(),
            average_temperature: crate::stats::mean(&bucket.temperatures).map(round1),
            average_precipitation: crate::stats::mean(&bucket.precipitations).map(round1),
            count: bucket.count,
        })
        .collect();

    rows.sort_by(|a, b| a.year.cmp(&b.year).then_with(|| a.season.cmp(&b.season)));
    rows
}

#[derive(Default)]
struct SeasonBucket {
    temperatures: Vec<f64>,
    precipitations: Vec<f64>,
    count: u32,
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Runs the seasonal aggregation over every configured city, one unit per
/// city, skip-and-continue on unreadable files or missing columns.
pub fn run(cfg: &DatasetConfig) -> ComponentOutput<SeasonalAggregate> {
    let mut rows = Vec::new();
    let mut units = Vec::new();

    for city in &cfg.cities {
        let path = cfg.city_file(city);
        match read::read_city_export(&path, &[TIME_COL, TEMP_MEAN_COL, PREC_COL]) {
            Ok(observations) => {
                let aggregates = seasonal_aggregates(city, &observations, cfg.year_range);
                debug!(
                    "{}: {} observations into {} seasonal groups",
                    city,
                    observations.len(),
                    aggregates.len()
                );
                units.push(UnitReport::processed(city, aggregates.len()));
                rows.extend(aggregates);
            }
            Err(e) => {
                warn!("skipping {city}: {e}");
                units.push(UnitReport::skipped(city, e.to_string()));
            }
        }
    }

    ComponentOutput { rows, units }
}
