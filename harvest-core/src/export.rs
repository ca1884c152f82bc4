// CSV export of a company's scraped reviews

use crate::error::{HarvestError, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use harvest_scanner::ReviewRecord;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

const PATH_HAZARDS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Column labels written above the rows.
///
/// Rows are always name, company, location, size, type. `Legacy` keeps the
/// header earlier exports shipped with, where the first two labels are
/// swapped relative to the data beneath them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderLayout {
    #[default]
    Corrected,
    Legacy,
}

impl HeaderLayout {
    pub fn columns(&self) -> [&'static str; 5] {
        match self {
            HeaderLayout::Corrected => [
                "Reviewer Name",
                "Reviewer Company",
                "Location",
                "Company Size",
                "Review Type",
            ],
            HeaderLayout::Legacy => [
                "Reviewer Company",
                "Reviewer Name",
                "Location",
                "Company Size",
                "Review Type",
            ],
        }
    }
}

/// Replace characters that are unsafe in file names with `_`.
/// Control characters are replaced as well.
pub fn safe_company_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if PATH_HAZARDS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

pub fn artifact_name(safe_name: &str) -> String {
    format!("{}_reviews.csv", safe_name)
}

/// Receives finished artifacts. Same-named artifacts replace each other.
pub trait DownloadSink {
    fn save(&self, file_name: &str, contents: &[u8]) -> Result<()>;
}

/// Writes artifacts into a directory, creating it on first use.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, file_name: &str, contents: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(file_name), contents)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saved artifacts in save order.
    pub fn artifacts(&self) -> Vec<(String, Vec<u8>)> {
        self.artifacts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl DownloadSink for MemorySink {
    fn save(&self, file_name: &str, contents: &[u8]) -> Result<()> {
        self.artifacts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((file_name.to_string(), contents.to_vec()));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Exporter {
    layout: HeaderLayout,
}

impl Exporter {
    pub fn new(layout: HeaderLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> HeaderLayout {
        self.layout
    }

    /// Every field quoted, embedded quotes doubled, one row per record.
    pub fn to_csv(&self, records: &[ReviewRecord]) -> Result<Vec<u8>> {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(self.layout.columns())?;
        for record in records {
            writer.write_record(record.values())?;
        }

        writer
            .into_inner()
            .map_err(|e| HarvestError::Io(e.into_error()))
    }

    /// Serialize `records` and hand them to `sink` as `<safe_name>_reviews.csv`.
    /// Returns the artifact name.
    pub fn export(
        &self,
        safe_name: &str,
        records: &[ReviewRecord],
        sink: &dyn DownloadSink,
    ) -> Result<String> {
        let file_name = artifact_name(safe_name);
        let contents = self.to_csv(records)?;
        sink.save(&file_name, &contents)?;
        info!("Saved {} reviews to {}", records.len(), file_name);
        Ok(file_name)
    }
}
