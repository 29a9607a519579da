//! Postal code resolution subsystem.
//!
//! # Data Flow
//! ```text
//! raw postal code
//!     → types.rs (PostalCode::parse rejects empty input)
//!     → race.rs (spawn one lookup per provider, select first success)
//!         → providers/* (one HTTP GET each, in parallel)
//!     → AddressResult or LookupError
//! ```

pub mod race;
pub mod types;

pub use race::{RaceCoordinator, DEFAULT_TIMEOUT};
pub use types::{
    AddressResult, LookupError, LookupOutcome, PostalCode, ProviderError, ProviderErrorKind,
    ProviderId,
};
