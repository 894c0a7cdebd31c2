pub mod detail;
pub mod resolve;
pub mod runs;

pub use detail::{RunSummary, SeverityFilter, failing_results, format_check_name, summarize};
pub use resolve::{ExceptionOutcome, ResolveError, add_exception, mark_fixed};
pub use runs::{Run, RunStats, group_by_run_id, run_stats};
