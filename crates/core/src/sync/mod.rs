//! Sync domain models, boundary traits and the sync engine.

mod engine;
mod model;
mod transport;

pub use engine::*;
pub use model::*;
pub use transport::*;
