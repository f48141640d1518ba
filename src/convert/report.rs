use crate::convert::converter::ConversionResult;
use serde::Serialize;

/// Aggregate counts for one batch run, folded from per-file results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total_files: usize,
    pub converted: usize,
    pub failed: usize,
    pub outputs_created: usize,
    pub groups_skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    NothingToDo,
    AllSucceeded,
    PartialSuccess,
    NoneSucceeded,
}

impl BatchSummary {
    pub fn record(&mut self, result: &ConversionResult) {
        self.total_files += 1;
        if result.is_success() {
            self.converted += 1;
        } else {
            self.failed += 1;
        }
        self.outputs_created += result.outputs.len();
        self.groups_skipped += result.skipped_groups.len();
    }

    /// Qualitative outcome: total failure only applies when at least one
    /// file was attempted.
    pub fn verdict(&self) -> Verdict {
        if self.total_files == 0 {
            Verdict::NothingToDo
        } else if self.failed == 0 {
            Verdict::AllSucceeded
        } else if self.converted > 0 {
            Verdict::PartialSuccess
        } else {
            Verdict::NoneSucceeded
        }
    }
}
