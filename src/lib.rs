//! Postal code (CEP) lookup service.
//!
//! Races BrasilAPI against ViaCEP for every request and answers with whichever
//! succeeds first, bounded by a fixed deadline.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod lookup;
pub mod observability;
pub mod providers;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use lookup::{AddressResult, LookupError, RaceCoordinator};
pub use providers::ProviderClient;
