use thiserror::Error;

/// Problems found in an order's line items.
///
/// `MalformedLineItem` is recoverable: the caller decides whether to skip the
/// offending item or abort. `NonNumericQuantity` never aborts aggregation; it is
/// reported alongside the result as a data-quality warning.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    #[error("line item {index} is malformed: {reason}")]
    MalformedLineItem { index: usize, reason: String },

    #[error("line item {index}: {field} quantity {raw} is not a finite non-negative number")]
    NonNumericQuantity {
        index: usize,
        field: String,
        raw: String,
    },

    #[error("invalid order payload: {0}")]
    InvalidOrder(String),
}

impl OrderError {
    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedLineItem {
            index,
            reason: reason.into(),
        }
    }

    /// Index of the line item the error refers to, if any.
    pub fn line_index(&self) -> Option<usize> {
        match self {
            Self::MalformedLineItem { index, .. } | Self::NonNumericQuantity { index, .. } => {
                Some(*index)
            }
            Self::InvalidOrder(_) => None,
        }
    }
}

impl From<serde_json::Error> for OrderError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidOrder(err.to_string())
    }
}

/// Failures reported by a print dispatcher.
#[derive(Debug, Error)]
pub enum PrintError {
    #[error("print job {0} has an empty payload")]
    EmptyJob(uuid::Uuid),

    #[error("printer write failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}
