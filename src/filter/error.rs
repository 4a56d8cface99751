use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("Refusing to {0} without a WHERE condition")]
    Unscoped(&'static str),

    #[error("UPDATE requires at least one assignment")]
    EmptyAssignment,
}
