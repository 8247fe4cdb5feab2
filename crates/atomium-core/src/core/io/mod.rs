pub mod config;
pub mod convert;
pub mod data_file;
pub mod error;
pub mod record;
pub mod traits;
