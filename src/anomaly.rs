use crate::config::DatasetConfig;
use crate::read::{self, TIME_COL};
use crate::structs::{AnomalyEvent, LoadedFile, UnitReport};
use chrono::NaiveDate;
use log::{debug, warn};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::BTreeSet;

/// Fixed anomaly taxonomy, (name → type) pairs.
pub const ANOMALY_DEFINITIONS: [(&str, &str); 7] = [
    ("Extreme Heat Wave", "Too Hot Temperature"),
    ("Intense Cold Peak", "Too Cold Temperature"),
    ("Torrential Rainfall", "Excessive Precipitation"),
    ("Severe Drought", "Prolonged Low Precipitation"),
    ("Record Wind", "Excessive Wind"),
    ("Sudden Hail", "Solid Precipitation"),
    ("Dense Fog", "Reduced Visibility"),
];

pub const SEVERITIES: [&str; 4] = ["Critical", "High", "Medium", "Low"];

/// Maximum number of events drawn for one covered date.
const MAX_EVENTS_PER_DAY: u32 = 3;

/// The calendar dates synthetic events may fall on, plus the bookkeeping of
/// which source files contributed.
#[derive(Debug)]
pub struct DateDomain {
    pub dates: Vec<NaiveDate>,
    pub files: Vec<LoadedFile>,
    /// True when no source file was readable and the full reference window
    /// was used instead.
    pub fallback: bool,
}

/// Unions the distinct dates of every readable city file, clipped to the
/// reference window. When not a single file is readable, every day of the
/// window becomes the domain.
pub fn collect_date_domain(cfg: &DatasetConfig) -> DateDomain {
    let mut all_dates: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut files = Vec::new();
    let mut readable = 0;

    for city in &cfg.cities {
        let path = cfg.city_file(city);
        let file_name = format!("open-meteo-{city}.csv");
        match read::read_city_export(&path, &[TIME_COL]) {
            Ok(observations) => {
                all_dates.extend(observations.iter().map(|o| o.date));
                readable += 1;
                files.push(LoadedFile {
                    city: city.clone(),
                    file_name,
                    file_path: path.display().to_string(),
                    loaded: true,
                });
            }
            Err(e) => {
                warn!("cannot read '{file_name}': {e}");
                files.push(LoadedFile {
                    city: city.clone(),
                    file_name,
                    file_path: path.display().to_string(),
                    loaded: false,
                });
            }
        }
    }

    if readable > 0 {
        let dates: Vec<NaiveDate> = all_dates
            .into_iter()
            .filter(|d| *d >= cfg.reference_start && *d <= cfg.reference_end)
            .collect();
        debug!(
            "date domain from {readable} files, {} unique days",
            dates.len()
        );
        DateDomain {
            dates,
            files,
            fallback: false,
        }
    } else {
        let mut dates = Vec::new();
        let mut day = cfg.reference_start;
        while day <= cfg.reference_end {
            dates.push(day);
            day = day.succ_opt().unwrap_or(day);
        }
        warn!("no source file readable, falling back to the full reference window");
        DateDomain {
            dates,
            files,
            fallback: true,
        }
    }
}

/// Draws 0–3 random events per covered date: a uniform taxonomy entry,
/// severity, city and time of day each. No statistical fidelity intended;
/// the output exists to exercise downstream schemas.
pub fn generate_events<R: Rng + ?Sized>(
    dates: &[NaiveDate],
    cities: &[String],
    rng: &mut R,
) -> Vec<AnomalyEvent> {
    let mut events = Vec::new();

    for date in dates {
        let count = rng.random_range(0..=MAX_EVENTS_PER_DAY);
        for _ in 0..count {
            let (name, kind) = ANOMALY_DEFINITIONS
                .choose(rng)
                .copied()
                .unwrap_or(ANOMALY_DEFINITIONS[0]);
            let severity = SEVERITIES.choose(rng).copied().unwrap_or(SEVERITIES[0]);
            let city = cities
                .choose(rng)
                .cloned()
                .unwrap_or_default();

            let hour = rng.random_range(0..24u32);
            let minute = rng.random_range(0..60u32);
            let second = rng.random_range(0..60u32);

            events.push(AnomalyEvent {
                type_anomaly: kind.to_string(),
                severity: severity.to_string(),
                detection_date: date.format("%d/%m/%Y").to_string(),
                detection_time: format!("{hour:02}:{minute:02}:{second:02}"),
                anomaly: name.to_string(),
                city,
            });
        }
    }

    events
}

/// Everything one generator run produces: the events, the per-file summary
/// and the per-unit outcomes.
pub struct AnomalyRun {
    pub events: Vec<AnomalyEvent>,
    pub files: Vec<LoadedFile>,
    pub units: Vec<UnitReport>,
}

pub fn run<R: Rng + ?Sized>(cfg: &DatasetConfig, rng: &mut R) -> AnomalyRun {
    let domain = collect_date_domain(cfg);
    let events = generate_events(&domain.dates, &cfg.cities, rng);

    let units = domain
        .files
        .iter()
        .map(|f| {
            if f.loaded {
                UnitReport::processed(&f.city, 1)
            } else {
                UnitReport::skipped(&f.city, "file not readable")
            }
        })
        .collect();

    AnomalyRun {
        events,
        files: domain.files,
        units,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn dates(n: u64) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        (0..n).map(|d| start + chrono::Days::new(d)).collect()
    }

    #[test]
    fn events_draw_from_the_fixed_taxonomy() {
        let mut rng = StdRng::seed_from_u64(7);
        let cities = vec!["Trento".to_string(), "Arco".to_string()];
        let events = generate_events(&dates(200), &cities, &mut rng);

        assert!(!events.is_empty());
        for event in &events {
            let pair = ANOMALY_DEFINITIONS
                .iter()
                .find(|(name, _)| *name == event.anomaly)
                .unwrap();
            assert_eq!(event.type_anomaly, pair.1);
            assert!(SEVERITIES.contains(&event.severity.as_str()));
            assert!(cities.contains(&event.city));
        }
    }

    #[test]
    fn per_day_event_count_is_bounded() {
        let mut rng = StdRng::seed_from_u64(42);
        let cities = vec!["Trento".to_string()];
        let one_day = dates(1);
        for _ in 0..50 {
            let events = generate_events(&one_day, &cities, &mut rng);
            assert!(events.len() <= MAX_EVENTS_PER_DAY as usize);
        }
    }

    #[test]
    fn formats_match_the_schema() {
        let mut rng = StdRng::seed_from_u64(1);
        let cities = vec!["Povo".to_string()];
        let events = generate_events(&dates(60), &cities, &mut rng);
        let event = events.first().unwrap();

        // DD/MM/YYYY and HH:MM:SS
        assert_eq!(event.detection_date.len(), 10);
        assert_eq!(&event.detection_date[2..3], "/");
        assert_eq!(&event.detection_date[5..6], "/");
        assert_eq!(event.detection_time.len(), 8);
        assert_eq!(&event.detection_time[2..3], ":");
    }

    #[test]
    fn unreadable_sources_fall_back_to_full_window() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = DatasetConfig::with_base_dir(dir.path());
        cfg.reference_start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        cfg.reference_end = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();

        let domain = collect_date_domain(&cfg);
        assert!(domain.fallback);
        assert_eq!(domain.dates.len(), 31);
        assert!(domain.files.iter().all(|f| !f.loaded));
    }

    #[test]
    fn covered_dates_are_clipped_to_the_window() {
        let dir = tempfile::tempdir().unwrap();
        let content = "meta\nmeta\nmeta\ntime\n1989-12-31\n1990-01-01\n1990-01-02\n";
        std::fs::write(dir.path().join("open-meteo-Trento.csv"), content).unwrap();

        let mut cfg = DatasetConfig::with_base_dir(dir.path());
        cfg.cities = vec!["Trento".to_string()];

        let domain = collect_date_domain(&cfg);
        assert!(!domain.fallback);
        assert_eq!(
            domain.dates,
            vec![
                NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(1990, 1, 2).unwrap()
            ]
        );
    }
}
