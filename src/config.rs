use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// The ten cities covered by the dataset, in processing order.
pub const CITIES: [&str; 10] = [
    "Trento", "Povo", "Rovereto", "Tenno", "Mezzana", "Predazzo", "Lavarone", "Telve", "Cavalese",
    "Arco",
];

/// Station name of the regional archive files.
pub const ARCHIVE_STATION: &str = "Telve";

/// Everything a component needs to locate its inputs and bound its output:
/// base directory of the per-city exports, the city list, the reference
/// window for synthetic data, and the archive station/year range.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub base_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub cities: Vec<String>,
    pub reference_start: NaiveDate,
    pub reference_end: NaiveDate,
    /// Inclusive year filter applied to seasonal aggregates.
    pub year_range: (i32, i32),
    pub archive_station: String,
    /// Inclusive range of year directories merged by the archive command.
    pub archive_years: (i32, i32),
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("Dataset_API"),
            archive_dir: PathBuf::from(ARCHIVE_STATION),
            cities: CITIES.iter().map(|c| c.to_string()).collect(),
            reference_start: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            reference_end: NaiveDate::from_ymd_opt(2025, 10, 31).unwrap(),
            year_range: (1990, 2025),
            archive_station: ARCHIVE_STATION.to_string(),
            archive_years: (2000, 2025),
        }
    }
}

impl DatasetConfig {
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    /// Path of one city's daily export, `open-meteo-{city}.csv`.
    pub fn city_file(&self, city: &str) -> PathBuf {
        self.base_dir.join(format!("open-meteo-{city}.csv"))
    }

    pub fn set_archive_dir(&mut self, dir: impl AsRef<Path>) {
        self.archive_dir = dir.as_ref().to_path_buf();
    }
}
