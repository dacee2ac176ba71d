pub mod settings;

pub use settings::{AppConfig, CityConfig, MosqueConfig, RemoteConfig};
