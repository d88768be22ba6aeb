pub mod config;
pub mod value;
