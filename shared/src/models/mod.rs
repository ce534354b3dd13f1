//! Domain models for field health intelligence

mod alert;
mod analysis;
mod crop;
mod field;
mod statistics;
mod zone;

pub use alert::*;
pub use analysis::*;
pub use crop::*;
pub use field::*;
pub use statistics::*;
pub use zone::*;
