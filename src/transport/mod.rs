pub mod rest;
pub mod stomp;
pub mod ws;

pub use rest::{SnapshotClient, SnapshotQuery};
pub use ws::{LiveClient, LiveMessage};
