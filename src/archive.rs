use crate::config::DatasetConfig;
use crate::error::{PipelineError, Result};
use crate::structs::{ArchiveRecord, ComponentOutput, UnitReport};
use log::{debug, warn};
use std::fs;
use std::path::Path;

/// Italian month names as they appear in archive file names.
const MONTHS: [&str; 12] = [
    "gennaio", "febbraio", "marzo", "aprile", "maggio", "giugno", "luglio", "agosto", "settembre",
    "ottobre", "novembre", "dicembre",
];

/// Columns expected in the raw archive files, in canonical output order.
const EXPECTED_COLUMNS: [&str; 10] = [
    "LOCALITA",
    "DATA",
    "TMEDIA °C",
    "TMIN °C",
    "TMAX °C",
    "UMIDITA %",
    "VENTOMEDIA km/h",
    "RAFFICA km/h",
    "PIOGGIA mm",
    "FENOMENI",
];

/// Italian → English weather phenomenon lookup. Two-token compounds are
/// listed next to their parts and must be matched before single tokens.
const PHENOMENA_TRANSLATIONS: [(&str, &str); 11] = [
    ("pioggia", "rain"),
    ("pioggia temporale", "thunderstorm"),
    ("temporale", "thunderstorm"),
    ("neve", "snow"),
    ("nevischio", "sleet"),
    ("grandine", "hail"),
    ("foschia", "mist"),
    ("nebbia", "fog"),
    ("sereno", "clear"),
    ("nubi sparse", "partly cloudy"),
    ("coperto", "overcast"),
];

/// Translates a free-text phenomenon description token by token.
///
/// The input is lowercased and whitespace-tokenized; at each position a
/// two-token compound is tried first so that e.g. "pioggia temporale"
/// resolves to "thunderstorm" instead of two independent words. Unknown
/// tokens pass through unchanged.
pub fn translate_phenomena(text: &str) -> String {
    let lowered = text.to_lowercase();
    let parts: Vec<&str> = lowered.split_whitespace().collect();

    let mut translated: Vec<&str> = Vec::with_capacity(parts.len());
    let mut i = 0;
    while i < parts.len() {
        if i + 1 < parts.len() {
            let compound = format!("{} {}", parts[i], parts[i + 1]);
            if let Some(term) = lookup(&compound) {
                translated.push(term);
                i += 2;
                continue;
            }
        }
        translated.push(lookup(parts[i]).unwrap_or(parts[i]));
        i += 1;
    }
    translated.join(" ")
}

fn lookup(token: &str) -> Option<&'static str> {
    PHENOMENA_TRANSLATIONS
        .iter()
        .find(|(italian, _)| *italian == token)
        .map(|(_, english)| *english)
}

/// Converts decimal-comma numeric text; empty or unparseable cells become
/// missing.
fn parse_decimal_comma(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.replace(',', ".").parse::<f64>().ok()
}

/// Month number encoded in an archive file name
/// (`{station}-{year}-{mese}.csv`), if the third dash token is a known
/// Italian month.
pub fn month_of_file(name: &str, station: &str) -> Option<u32> {
    if !name.starts_with(&format!("{station}-")) || !name.ends_with(".csv") {
        return None;
    }
    let token = name.split('-').nth(2)?.trim_end_matches(".csv").to_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == token)
        .map(|i| i as u32 + 1)
}

/// Reads one semicolon-delimited month file into archive records.
///
/// Actual columns are intersected with the expected set; expected columns
/// missing from the file are synthesized as empty, so the row count never
/// changes because of a header difference.
pub fn read_archive_file(path: &Path) -> Result<Vec<ArchiveRecord>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| PipelineError::Data(format!("cannot read {}: {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(raw.as_bytes());
    let headers = reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);

    let location_idx = position(EXPECTED_COLUMNS[0]);
    let date_idx = position(EXPECTED_COLUMNS[1]);
    let mean_temp_idx = position(EXPECTED_COLUMNS[2]);
    let min_temp_idx = position(EXPECTED_COLUMNS[3]);
    let max_temp_idx = position(EXPECTED_COLUMNS[4]);
    let humidity_idx = position(EXPECTED_COLUMNS[5]);
    let wind_speed_idx = position(EXPECTED_COLUMNS[6]);
    let wind_gusts_idx = position(EXPECTED_COLUMNS[7]);
    let rainfall_idx = position(EXPECTED_COLUMNS[8]);
    let phenomena_idx = position(EXPECTED_COLUMNS[9]);

    let text_cell = |record: &csv::StringRecord, idx: Option<usize>| -> Option<String> {
        idx.and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .map(str::to_string)
    };
    let number_cell = |record: &csv::StringRecord, idx: Option<usize>| -> Option<f64> {
        idx.and_then(|i| record.get(i)).and_then(parse_decimal_comma)
    };

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        records.push(ArchiveRecord {
            location: text_cell(&record, location_idx),
            date: text_cell(&record, date_idx),
            mean_temp: number_cell(&record, mean_temp_idx),
            min_temperature: number_cell(&record, min_temp_idx),
            max_temperature: number_cell(&record, max_temp_idx),
            mean_humidity: number_cell(&record, humidity_idx),
            wind_speed: number_cell(&record, wind_speed_idx),
            wind_gusts: number_cell(&record, wind_gusts_idx),
            rainfall: number_cell(&record, rainfall_idx),
            phenomena: text_cell(&record, phenomena_idx).map(|p| translate_phenomena(&p)),
        });
    }
    Ok(records)
}

/// Merges every month file of every year directory in `cfg.archive_dir`
/// into one clean archive. Year directories are numeric names inside the
/// configured range, ascending; month files keep directory-listing order.
/// One unit per month file, skip-and-continue.
pub fn run(cfg: &DatasetConfig) -> Result<ComponentOutput<ArchiveRecord>> {
    let mut years: Vec<i32> = Vec::new();
    for entry in fs::read_dir(&cfg.archive_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(year) = entry.file_name().to_str().and_then(|n| n.parse::<i32>().ok()) {
            if year >= cfg.archive_years.0 && year <= cfg.archive_years.1 {
                years.push(year);
            }
        }
    }
    years.sort_unstable();

    let mut rows = Vec::new();
    let mut units = Vec::new();

    for year in years {
        let year_dir = cfg.archive_dir.join(year.to_string());
        for entry in fs::read_dir(&year_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if month_of_file(name, &cfg.archive_station).is_none() {
                continue;
            }

            let unit = format!("{year}/{name}");
            println!("Reading {}", entry.path().display());
            match read_archive_file(&entry.path()) {
                Ok(file_rows) => {
                    debug!("{unit}: {} rows", file_rows.len());
                    units.push(UnitReport::processed(&unit, file_rows.len()));
                    rows.extend(file_rows);
                }
                Err(e) => {
                    warn!("error reading {unit}: {e}");
                    units.push(UnitReport::skipped(&unit, e.to_string()));
                }
            }
        }
    }

    Ok(ComponentOutput { rows, units })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_phrases_win_over_single_tokens() {
        assert_eq!(translate_phenomena("pioggia temporale"), "thunderstorm");
        assert_eq!(translate_phenomena("nubi sparse"), "partly cloudy");
        assert_eq!(translate_phenomena("pioggia neve"), "rain snow");
    }

    #[test]
    fn unknown_tokens_pass_through() {
        assert_eq!(translate_phenomena("bruma"), "bruma");
        assert_eq!(translate_phenomena("Pioggia bruma"), "rain bruma");
    }

    #[test]
    fn translation_is_case_insensitive() {
        assert_eq!(translate_phenomena("SERENO"), "clear");
        assert_eq!(translate_phenomena("Nebbia"), "fog");
    }

    #[test]
    fn decimal_comma_becomes_decimal_point() {
        assert_eq!(parse_decimal_comma("12,5"), Some(12.5));
        assert_eq!(parse_decimal_comma("7"), Some(7.0));
        assert_eq!(parse_decimal_comma(""), None);
        assert_eq!(parse_decimal_comma("n/d"), None);
    }

    #[test]
    fn month_parsing_from_file_names() {
        assert_eq!(month_of_file("Telve-2020-Gennaio.csv", "Telve"), Some(1));
        assert_eq!(month_of_file("Telve-2020-dicembre.csv", "Telve"), Some(12));
        assert_eq!(month_of_file("Telve-2020-Undicembre.csv", "Telve"), None);
        assert_eq!(month_of_file("Other-2020-Gennaio.csv", "Telve"), None);
        assert_eq!(month_of_file("Telve-2020-Gennaio.txt", "Telve"), None);
    }

    #[test]
    fn missing_expected_column_becomes_empty_not_fewer_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Telve-2020-Gennaio.csv");
        // no FENOMENI column, decimal commas in numbers
        fs::write(
            &path,
            "LOCALITA;DATA;TMEDIA °C;PIOGGIA mm\nTelve;1/1/2020;2,5;0\nTelve;2/1/2020;3,0;1,5\n",
        )
        .unwrap();

        let rows = read_archive_file(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].mean_temp, Some(2.5));
        assert_eq!(rows[1].rainfall, Some(1.5));
        assert!(rows.iter().all(|r| r.phenomena.is_none()));
        assert!(rows.iter().all(|r| r.min_temperature.is_none()));
    }

    #[test]
    fn run_merges_years_in_order_and_skips_unknown_files() {
        let dir = tempfile::tempdir().unwrap();
        for year in ["2001", "2000", "1999"] {
            fs::create_dir(dir.path().join(year)).unwrap();
        }
        fs::write(
            dir.path().join("2000").join("Telve-2000-Gennaio.csv"),
            "LOCALITA;DATA;FENOMENI\nTelve;1/1/2000;pioggia temporale\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("2001").join("Telve-2001-Febbraio.csv"),
            "LOCALITA;DATA;FENOMENI\nTelve;1/2/2001;sereno\n",
        )
        .unwrap();
        // ignored: not a month file
        fs::write(dir.path().join("2000").join("README.csv"), "x\n").unwrap();
        // ignored: outside the year range
        fs::write(
            dir.path().join("1999").join("Telve-1999-Marzo.csv"),
            "LOCALITA;DATA;FENOMENI\nTelve;1/3/1999;neve\n",
        )
        .unwrap();

        let mut cfg = DatasetConfig::default();
        cfg.set_archive_dir(dir.path());

        let out = run(&cfg).unwrap();
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0].phenomena.as_deref(), Some("thunderstorm"));
        assert_eq!(out.rows[1].phenomena.as_deref(), Some("clear"));
        assert_eq!(out.units.len(), 2);
    }
}
