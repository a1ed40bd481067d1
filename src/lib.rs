pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod event;
pub mod feature;
pub mod model;
pub mod overlay;
pub mod strategy;
pub mod surface;
pub mod time_bucket;
pub mod transport;
