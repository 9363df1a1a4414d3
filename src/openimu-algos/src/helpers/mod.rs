pub mod axis;
pub mod time_math;
