use chrono::NaiveDate;
use log::{Log, Metadata, Record as LogRecord};
use serde::{Deserialize, Serialize};

/// Simple logger implementation
pub struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &LogRecord) {
        println!("[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

/// One row of a per-city daily export. Every measurement is optional:
/// missing cells stay missing and the reducers skip them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub weather_code: Option<f64>,
    pub temp_max: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_mean: Option<f64>,
    pub humidity_max: Option<f64>,
    pub humidity_min: Option<f64>,
    pub humidity_mean: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_gusts: Option<f64>,
    pub wind_direction: Option<f64>,
    pub precipitation: Option<f64>,
    pub precipitation_hours: Option<f64>,
}

/// Per-city, per-year, per-season averages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalAggregate {
    pub city: String,
    pub year: i32,
    pub season: String,
    pub average_temperature: Option<f64>,
    pub average_precipitation: Option<f64>,
    pub count: u32,
}

/// Long-term temperature trend for one city
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendResult {
    pub city: String,
    pub climate_trend: String,
    pub parameter_measured: String,
    pub time_window: String,
    pub total_variation: String,
    pub annual_rate: String,
}

/// Categorical microclimate summary for one city
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MicroclimateProfile {
    pub city: String,
    pub microclimate: String,
    pub microclimate_type: String,
    pub temperature_range: String,
    pub humidity_range: String,
    pub wind_pattern: String,
}

/// One row of the merged wide-schema weather report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub city: String,
    pub date: NaiveDate,
    pub weather_code: Option<f64>,
    pub humidity_max: Option<f64>,
    pub humidity_min: Option<f64>,
    pub humidity_mean: Option<f64>,
    pub wind_direction: Option<f64>,
    pub temp_max: Option<f64>,
    pub temp_min: Option<f64>,
    pub precipitation: Option<f64>,
    pub precipitation_hours: Option<f64>,
    pub wind_gusts: Option<f64>,
    pub wind_speed: Option<f64>,
    pub temp_mean: Option<f64>,
}

/// Synthetic anomaly event. Date and time are kept pre-formatted
/// (DD/MM/YYYY and HH:MM:SS) the way the generator emits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyEvent {
    pub type_anomaly: String,
    pub severity: String,
    pub detection_date: String,
    pub detection_time: String,
    pub anomaly: String,
    pub city: String,
}

/// Anomaly event rewritten with ISO 8601 date and combined date-time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedAnomaly {
    pub type_anomaly: String,
    pub severity: String,
    pub detection_date: String,
    pub detection_time: String,
    pub anomaly: String,
    pub city: String,
    pub detection_date_time: String,
}

/// One row of the cleaned station archive. The date stays as source text;
/// numeric columns are decimal-comma text converted to numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub location: Option<String>,
    pub date: Option<String>,
    pub mean_temp: Option<f64>,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub mean_humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_gusts: Option<f64>,
    pub rainfall: Option<f64>,
    pub phenomena: Option<String>,
}

/// Source-file bookkeeping written next to the anomaly output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedFile {
    pub city: String,
    pub file_name: String,
    pub file_path: String,
    pub loaded: bool,
}

/// Outcome of one unit of work (a city or a source file)
#[derive(Debug, Clone, Serialize)]
pub enum UnitStatus {
    Processed { rows: usize },
    Skipped { reason: String },
}

/// Per-unit report returned to the caller next to the produced rows,
/// so abort-vs-continue stays a caller decision.
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub unit: String,
    pub status: UnitStatus,
}

impl UnitReport {
    pub fn processed(unit: impl Into<String>, rows: usize) -> Self {
        Self {
            unit: unit.into(),
            status: UnitStatus::Processed { rows },
        }
    }

    pub fn skipped(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            status: UnitStatus::Skipped {
                reason: reason.into(),
            },
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, UnitStatus::Skipped { .. })
    }
}

/// Rows produced by one component run plus the per-unit outcomes
#[derive(Debug, Clone)]
pub struct ComponentOutput<T> {
    pub rows: Vec<T>,
    pub units: Vec<UnitReport>,
}
