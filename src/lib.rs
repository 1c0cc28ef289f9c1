// Library for tests to access modules

pub mod config;
pub mod delta;
pub mod error;
pub mod models;
pub mod sysinfo_repo;
pub mod telemetry;
pub mod version;
pub mod worker;
