//! Shared types and engines for field health intelligence
//!
//! This crate contains the domain model and every pure computation, shared
//! between the backend and the offline client (via WASM).

pub mod engine;
pub mod error;
pub mod geometry;
pub mod models;
pub mod policy;
pub mod types;
pub mod validation;

pub use error::*;
pub use models::*;
pub use policy::*;
pub use types::*;
pub use validation::*;
