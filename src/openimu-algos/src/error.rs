use openimu_types::InputError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{self:?}")]
pub enum WindowError {
    NonPositiveWindow { w_len: usize, skip: usize },
    WindowTooLong { w_len: usize, axis_len: usize },
    InvalidAxis { axis: usize, ndim: usize },
    NonFiniteTimestamp { index: usize },
    UnsortedTimestamps { index: usize },
    TimestampOutOfRange { index: usize },
    Boundary(#[from] InputError),
}
