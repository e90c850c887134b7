//! Status transitions and job-level aggregation.
//!
//! The job status is derived from its entries with a fixed priority table:
//!
//! | rule                      | priority |
//! |---------------------------|----------|
//! | any entry `Failed`        | 3        |
//! | every entry `Success`     | 2        |
//! | any entry `Running`       | 1        |
//!
//! The highest matching rule wins. When no rule matches the prior job
//! status is kept, which is how `Warning` and `Idle` persist.

pub use toolpathkit_core::ToolPathStatus;

/// Compute the job status from the statuses of its entries
///
/// `prior` is returned unchanged when no rule matches. An empty entry set
/// matches nothing.
pub fn aggregate<I>(prior: ToolPathStatus, statuses: I) -> ToolPathStatus
where
    I: IntoIterator<Item = ToolPathStatus>,
{
    let mut any = false;
    let mut any_running = false;
    let mut any_failed = false;
    let mut all_success = true;

    for status in statuses {
        any = true;
        match status {
            ToolPathStatus::Running => any_running = true,
            ToolPathStatus::Failed => any_failed = true,
            _ => {}
        }
        if status != ToolPathStatus::Success {
            all_success = false;
        }
    }

    let rules = [
        (any_failed, 3, ToolPathStatus::Failed),
        (any && all_success, 2, ToolPathStatus::Success),
        (any_running, 1, ToolPathStatus::Running),
    ];

    rules
        .iter()
        .filter(|(matched, _, _)| *matched)
        .max_by_key(|(_, priority, _)| *priority)
        .map(|(_, _, status)| *status)
        .unwrap_or(prior)
}

/// Whether an entry in `status` is marked stale when the job fingerprint changes
///
/// Entries with a task in flight keep `Running`; their reply is checked
/// against the fingerprint it was dispatched with instead.
pub fn marks_stale(status: ToolPathStatus) -> bool {
    !matches!(status, ToolPathStatus::Running)
}

/// Whether an entry in `status` needs a new task on submission
pub fn needs_generation(status: ToolPathStatus) -> bool {
    !matches!(status, ToolPathStatus::Running | ToolPathStatus::Success)
}
