//! CSV-backed training data
//!
//! Channel and video tables are `;`-separated exports with French column
//! names; the seed table is usually a plain `,`-separated list. The delimiter
//! is taken from the header line, so either works for every table.

use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use sockpuppet_core_types::{ChannelRecord, ChannelSource, CohortSpec, SourceError, VideoSource};
use tracing::{debug, warn};

const HANDLE_COLUMNS: &[&str] = &["id_ytb", "channel_id", "handle"];
const LABEL_COLUMNS: &[&str] = &["idee_pol", "ideology", "ideologie"];
const NAME_COLUMNS: &[&str] = &["name", "nom", "id"];
const VIDEO_COLUMNS: &[&str] = &["video_id", "id", "youtube_id"];

struct Table {
    path: PathBuf,
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl Table {
    fn read(path: &Path) -> Result<Self, SourceError> {
        let raw =
            fs::read_to_string(path).map_err(|err| SourceError::unreadable(path, err.to_string()))?;
        let raw = raw.trim_start_matches('\u{feff}');
        let header_line = raw.lines().next().unwrap_or_default();
        let delimiter = if header_line.contains(';') { b';' } else { b',' };

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(raw.as_bytes());
        let headers = reader
            .headers()
            .map_err(|err| SourceError::unreadable(path, err.to_string()))?
            .clone();

        let mut rows = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row.map_err(|err| SourceError::Malformed {
                path: path.to_path_buf(),
                row: index + 1,
                message: err.to_string(),
            })?;
            rows.push(row);
        }
        debug!(path = %path.display(), rows = rows.len(), "table loaded");
        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    fn find(&self, candidates: &[&str]) -> Option<usize> {
        candidates.iter().find_map(|wanted| {
            self.headers
                .iter()
                .position(|header| header.eq_ignore_ascii_case(wanted))
        })
    }

    fn column(&self, candidates: &[&str]) -> Result<usize, SourceError> {
        self.find(candidates)
            .ok_or_else(|| SourceError::MissingColumn {
                path: self.path.clone(),
                column: candidates.join("|"),
            })
    }

    fn cell<'r>(row: &'r StringRecord, index: usize) -> &'r str {
        row.get(index).unwrap_or_default()
    }
}

/// Channel table with a handle and an ideology label per row.
#[derive(Clone, Debug)]
pub struct CsvChannels {
    path: PathBuf,
}

impl CsvChannels {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ChannelSource for CsvChannels {
    fn channels(&self) -> Result<Vec<ChannelRecord>, SourceError> {
        let table = Table::read(&self.path)?;
        let handle = table.column(HANDLE_COLUMNS)?;
        let label = table.column(LABEL_COLUMNS)?;
        let name = table.find(NAME_COLUMNS).filter(|index| *index != handle);

        Ok(table
            .rows
            .iter()
            .filter(|row| !Table::cell(row, handle).is_empty())
            .map(|row| ChannelRecord {
                handle: Table::cell(row, handle).to_string(),
                label: Table::cell(row, label).to_string(),
                name: name
                    .map(|index| Table::cell(row, index).to_string())
                    .filter(|value| !value.is_empty()),
            })
            .collect())
    }
}

/// Video table per cohort plus the shared test-seed table.
///
/// Both are optional: without a video table every cohort pool is empty,
/// without a seed table the seed pool is empty.
#[derive(Clone, Debug, Default)]
pub struct CsvVideos {
    videos: Option<PathBuf>,
    seeds: Option<PathBuf>,
}

impl CsvVideos {
    pub fn new(videos: Option<PathBuf>, seeds: Option<PathBuf>) -> Self {
        Self { videos, seeds }
    }
}

impl VideoSource for CsvVideos {
    fn videos_for(&self, cohort: &CohortSpec) -> Result<Vec<String>, SourceError> {
        let Some(path) = &self.videos else {
            warn!(cohort = %cohort.label, "no video table configured");
            return Ok(Vec::new());
        };
        let table = Table::read(path)?;
        let id = table.column(VIDEO_COLUMNS)?;
        let label = table.column(LABEL_COLUMNS)?;

        Ok(table
            .rows
            .iter()
            .filter(|row| cohort.matches(Table::cell(row, label)))
            .map(|row| Table::cell(row, id).to_string())
            .filter(|video| !video.is_empty())
            .collect())
    }

    fn seeds(&self) -> Result<Vec<String>, SourceError> {
        let Some(path) = &self.seeds else {
            return Ok(Vec::new());
        };
        if !path.exists() {
            warn!(path = %path.display(), "seed table not found, using default seeds");
            return Ok(Vec::new());
        }
        let table = Table::read(path)?;
        let id = table.column(&["video_id"])?;
        Ok(table
            .rows
            .iter()
            .map(|row| Table::cell(row, id).to_string())
            .filter(|seed| !seed.is_empty())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn table(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn channels_read_french_columns() {
        let file = table(
            "\u{feff}id;id_ytb;Type;idee_pol\n\
             Chaine A;chaineA;media;gauche\n\
             Chaine B; @chaineB ;media;droite extrême\n\
             Sans handle;;media;gauche\n",
        );
        let channels = CsvChannels::new(file.path()).channels().unwrap();

        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].handle, "chaineA");
        assert_eq!(channels[0].name.as_deref(), Some("Chaine A"));
        assert_eq!(channels[1].normalized_handle(), "@chaineB");

        let extreme = CohortSpec::resolve("ExtremeRight");
        let source = CsvChannels::new(file.path());
        let picked = source.channels_for(&extreme).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].handle, "@chaineB");
    }

    #[test]
    fn missing_label_column_is_reported() {
        let file = table("id_ytb;theme\nabc;politique\n");
        let err = CsvChannels::new(file.path()).channels().unwrap_err();
        assert!(matches!(err, SourceError::MissingColumn { .. }));
    }

    #[test]
    fn videos_match_cohort_aliases() {
        let file = table(
            "youtube_id;ideology\n\
             v1;gauche\n\
             v2;Left\n\
             v3;droite\n",
        );
        let source = CsvVideos::new(Some(file.path().to_path_buf()), None);
        let left = CohortSpec::resolve("Left");
        assert_eq!(source.videos_for(&left).unwrap(), ["v1", "v2"]);
        assert!(source.seeds().unwrap().is_empty());
    }

    #[test]
    fn seeds_use_comma_tables() {
        let file = table("video_id,title\nA1,first\nB2,second\n");
        let source = CsvVideos::new(None, Some(file.path().to_path_buf()));
        assert_eq!(source.seeds().unwrap(), ["A1", "B2"]);
    }

    #[test]
    fn absent_seed_table_is_empty() {
        let source = CsvVideos::new(None, Some(PathBuf::from("/nonexistent/seeds.csv")));
        assert!(source.seeds().unwrap().is_empty());
    }
}
