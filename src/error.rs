use std::io;
use std::path::PathBuf;

/// Custom error type for gitlab_webhook operations
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Server stopped: {0}")]
    Serve(#[source] io::Error),

    #[error("Failed to read request: {0}")]
    RequestRead(#[source] axum::Error),

    #[error("Failed to parse request: {0}")]
    RequestParse(#[from] serde_json::Error),

    #[error("Failed to execute command '{command}': {source}")]
    CommandExecution {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Command '{command}' exited unsuccessfully ({})", exit_code_label(*code))]
    CommandFailed { command: String, code: Option<i32> },

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Failed to install signal handler: {0}")]
    Signal(#[source] io::Error),
}

fn exit_code_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Helper type for Results that use HookError
pub type Result<T> = std::result::Result<T, HookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failed_reports_exit_code() {
        let err = HookError::CommandFailed {
            command: "/usr/local/bin/deploy".to_string(),
            code: Some(3),
        };
        assert_eq!(
            err.to_string(),
            "Command '/usr/local/bin/deploy' exited unsuccessfully (exit code 3)"
        );
    }

    #[test]
    fn command_failed_without_code_mentions_signal() {
        let err = HookError::CommandFailed {
            command: "deploy".to_string(),
            code: None,
        };
        assert!(err.to_string().ends_with("(terminated by signal)"));
    }

    #[test]
    fn config_read_names_the_path() {
        let err = HookError::ConfigRead {
            path: PathBuf::from("missing.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to read config file 'missing.json': no such file"
        );
    }
}
