use thiserror::Error;

use crate::reports::ParseRecordError;

#[derive(Error, Debug)]
pub enum MicroPathError {
    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Error while reading or writing tab-separated records: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Unable to parse the configuration file: {0}")]
    ConfigParsingError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid blanket '{name}': {reason}")]
    InvalidBlanket { name: String, reason: String },

    #[error("Unknown temporal split: {0}")]
    UnknownTemporalSplit(String),

    #[error("Column '{0}' not found in the input header")]
    MissingColumn(String),

    #[error("Error during record parsing: {0}")]
    RecordParsing(ParseRecordError),
}

impl From<ParseRecordError> for MicroPathError {
    fn from(err: ParseRecordError) -> Self {
        MicroPathError::RecordParsing(err)
    }
}

impl PartialEq for MicroPathError {
    fn eq(&self, other: &Self) -> bool {
        use MicroPathError::*;
        match (self, other) {
            // Wrapped library errors are not comparable: equal if same variant
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (ConfigParsingError(_), ConfigParsingError(_)) => true,

            (InvalidConfig(a), InvalidConfig(b)) => a == b,
            (
                InvalidBlanket {
                    name: a,
                    reason: ra,
                },
                InvalidBlanket {
                    name: b,
                    reason: rb,
                },
            ) => a == b && ra == rb,
            (UnknownTemporalSplit(a), UnknownTemporalSplit(b)) => a == b,
            (MissingColumn(a), MissingColumn(b)) => a == b,
            (RecordParsing(a), RecordParsing(b)) => a == b,

            _ => false,
        }
    }
}
