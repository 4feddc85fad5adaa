// file: src/models/import.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an import came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportSource {
    IcsFile,
    RemoteService,
}

/// Outcome of a completed import. Failed imports never produce one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub source: ImportSource,
    /// Dataset generation that overlay edits must be tagged with.
    pub generation: u64,
    pub imported: usize,
    pub skipped: usize,
    pub per_month: [usize; 12],
    pub import_time: DateTime<Utc>,
}

impl ImportSummary {
    pub fn new(source: ImportSource, generation: u64, per_month: [usize; 12], skipped: usize) -> Self {
        Self {
            source,
            generation,
            imported: per_month.iter().sum(),
            skipped,
            per_month,
            import_time: Utc::now(),
        }
    }

    pub fn total_records(&self) -> usize {
        self.imported + self.skipped
    }

    pub fn message(&self) -> String {
        let mut msg = format!("Imported {} events.", self.imported);
        if self.skipped > 0 {
            msg.push_str(&format!(
                " Skipped {} without a usable start date.",
                self.skipped
            ));
        }
        msg
    }
}
