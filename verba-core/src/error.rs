use thiserror::Error;

/// All errors produced by verba-core.
///
/// The alignment and aggregation stages never fail; only configuration,
/// table (de)serialization and the worker pool can.
#[derive(Debug, Error)]
pub enum VerbaError {
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed table row at line {line}: {message}")]
    InvalidRow { line: u64, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("a batch is already running on this engine")]
    Busy,

    #[error("analysis worker failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VerbaError {
    pub(crate) fn invalid_row(line: u64, message: impl Into<String>) -> Self {
        Self::InvalidRow {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VerbaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert_and_keep_their_message() {
        fn open_missing() -> Result<()> {
            std::fs::read("/definitely/not/here.csv")?;
            Ok(())
        }
        let err = open_missing().unwrap_err();
        assert!(matches!(err, VerbaError::Io(_)));
        assert!(err.to_string().starts_with("IO error: "));
    }

    #[test]
    fn invalid_row_reports_line() {
        let err = VerbaError::invalid_row(7, "unknown category");
        assert_eq!(err.to_string(), "malformed table row at line 7: unknown category");
    }
}
