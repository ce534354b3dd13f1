//! HTTP request handlers

mod health;
mod monitoring;

pub use health::*;
pub use monitoring::*;
