mod error;
pub use error::WindowError;

pub(crate) mod moments;
pub use moments::{
    Moment, SlidingWindow, rolling_kurtosis, rolling_mean, rolling_moment, rolling_sd,
    rolling_skewness,
};

pub(crate) mod median;
pub use median::rolling_median;

pub(crate) mod segment;
pub use segment::{DayWindow, day_windows, window_start_stop};

pub use openimu_types::DayBoundary;

pub mod helpers;
