pub mod actions;
pub mod time_format;
pub mod transitions;
pub mod views;
