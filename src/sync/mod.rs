pub mod engine;
pub mod remote;
pub mod single_flight;

pub use engine::{CacheSyncEngine, needs_pull};
pub use remote::HttpRemoteSource;
pub use single_flight::SingleFlight;
