pub mod anomaly;
pub mod archive;
pub mod config;
pub mod error;
pub mod load;
pub mod microclimate;
pub mod normalize;
pub mod read;
pub mod report;
pub mod season;
pub mod stats;
pub mod structs;
pub mod trend;

// Re-export public API
pub use config::{CITIES, DatasetConfig};
pub use error::{PipelineError, Result};
pub use season::{Season, season_of};
pub use structs::{
    AnomalyEvent, ArchiveRecord, ComponentOutput, DailyObservation, LoadedFile,
    MicroclimateProfile, NormalizedAnomaly, ReportRow, SeasonalAggregate, SimpleLogger,
    TrendResult, UnitReport, UnitStatus,
};
