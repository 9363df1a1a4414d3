use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{self:?}")]
pub enum InputError {
    InvalidBaseHour(u32),
    InvalidPeriod(u32),
    MismatchedPairs { bases: usize, periods: usize },
    StreamLength {
        stream: &'static str,
        expected: usize,
        found: usize,
    },
}
