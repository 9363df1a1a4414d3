#[macro_use]
extern crate log;

pub mod pipeline;
pub use pipeline::{
    DaySummary, MomentColumn, MomentSettings, WindowEntry, WindowListing, list_windows,
    read_recording, rolling_median_rows, stream_array, summarize,
};

pub use openimu_algos as algos;
pub use openimu_types as types;
