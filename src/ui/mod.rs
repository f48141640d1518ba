pub mod output;
pub mod progress;

pub use output::{OutputFormatter, OutputMode, ProgressAwareOutput};
pub use progress::{finish_progress_with_summary, format_duration, ProgressManager};
