//! Error taxonomy for building a [`Table`](crate::reading::Table).
//!
//! Every variant is fatal to a load: there is no partial-success mode.

use thiserror::Error;

/// Errors produced while reading and normalizing a solar CSV.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The source could not be reached, or its bytes are not a valid CSV table.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Required columns are missing after header normalization.
    #[error("Missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    /// A date + time combination did not parse as a timestamp.
    #[error("Unparseable timestamp {value:?} on data row {row}")]
    TimestampParse { row: usize, value: String },
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::MalformedInput(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_schema_lists_fields() {
        let err = PipelineError::Schema {
            missing: vec!["time".to_string(), "load".to_string()],
        };
        assert_eq!(err.to_string(), "Missing required columns: time, load");
    }

    #[test]
    fn test_error_display_timestamp() {
        let err = PipelineError::TimestampParse {
            row: 3,
            value: "2025-13-01 00:00".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unparseable timestamp \"2025-13-01 00:00\" on data row 3"
        );
    }

    #[test]
    fn test_error_from_csv() {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader("a,b\n1,2,3\n".as_bytes());
        let csv_err = rdr.records().next().unwrap().unwrap_err();
        let err: PipelineError = csv_err.into();
        assert!(err.to_string().starts_with("Malformed input:"));
    }
}
