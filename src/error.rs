use std::fmt;

use thiserror::Error;

/// Column selections a render cannot proceed without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredColumn {
    Label,
    Color,
}

impl fmt::Display for RequiredColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredColumn::Label => f.write_str("label"),
            RequiredColumn::Color => f.write_str("color"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CirclePackError {
    #[error("Please select both a Label column and a Color column ({0} column is not set)")]
    MissingColumn(RequiredColumn),
    #[error("At most {max} grouping columns are supported, got {got}")]
    TooManyGroupingColumns { got: usize, max: usize },
    #[error("Just one file at a time, please ({0} files dropped)")]
    WrongFileCount(usize),
    #[error("Please render a chart first.")]
    NothingRendered,
    #[error("No node with id {0} in the current chart")]
    UnknownNode(usize),
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CirclePackError {
    /// Errors that come from a user action and should be shown as a notification.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            CirclePackError::MissingColumn(_)
                | CirclePackError::TooManyGroupingColumns { .. }
                | CirclePackError::WrongFileCount(_)
        )
    }
}
