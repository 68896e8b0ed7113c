use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Maximum size for captured command output before truncation (1MB)
pub const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

const TRUNCATION_MARKER: &str = "\n... (output truncated)";

/// Outcome of a single command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failed,
}

/// One attempted command within a dispatch
#[derive(Debug, Clone)]
pub struct CommandRun {
    pub command: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub output: String,
    pub output_truncated: bool,
    pub error: Option<String>,
}

impl CommandRun {
    /// Record a command that exited successfully
    pub fn succeeded(command: &str, started_at: DateTime<Utc>, output: String) -> Self {
        let (output, output_truncated) = truncate_output(output);
        Self {
            command: command.to_string(),
            status: RunStatus::Success,
            started_at,
            completed_at: Utc::now(),
            output,
            output_truncated,
            error: None,
        }
    }

    /// Record a command that failed to start or exited unsuccessfully
    pub fn failed(
        command: &str,
        started_at: DateTime<Utc>,
        output: String,
        error: String,
    ) -> Self {
        let (output, output_truncated) = truncate_output(output);
        Self {
            command: command.to_string(),
            status: RunStatus::Failed,
            started_at,
            completed_at: Utc::now(),
            output,
            output_truncated,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    pub fn duration_ms(&self) -> i64 {
        (self.completed_at - self.started_at).num_milliseconds()
    }
}

/// Everything one webhook request ran, in execution order
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub request_id: Uuid,
    pub repository: String,
    pub runs: Vec<CommandRun>,
}

impl DispatchReport {
    pub fn new(request_id: Uuid, repository: String) -> Self {
        Self {
            request_id,
            repository,
            runs: Vec::new(),
        }
    }

    pub fn failed_count(&self) -> usize {
        self.runs.iter().filter(|run| !run.is_success()).count()
    }
}

/// Cap output at MAX_OUTPUT_SIZE, cutting on a char boundary.
fn truncate_output(mut output: String) -> (String, bool) {
    if output.len() <= MAX_OUTPUT_SIZE {
        return (output, false);
    }

    let mut cut = MAX_OUTPUT_SIZE;
    while !output.is_char_boundary(cut) {
        cut -= 1;
    }
    output.truncate(cut);
    output.push_str(TRUNCATION_MARKER);
    (output, true)
}
