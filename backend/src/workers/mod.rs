//! Background workers

pub mod session_reaper;
