pub mod config;
pub mod logging;

pub mod checksum;
pub mod job;
pub mod release;
pub mod sampler;
pub mod units;
pub mod upload;
