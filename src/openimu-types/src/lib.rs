#[macro_use]
extern crate log;

mod error;
pub use error::InputError;

mod day_boundary;
pub use day_boundary::{DayBoundary, WindowConfig};

mod recording;
pub use recording::{Recording, Stream};
