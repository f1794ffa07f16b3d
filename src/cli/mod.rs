pub mod commands;
pub mod doctor;

pub use commands::run;
