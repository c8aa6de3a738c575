mod model;
mod repository;

pub use model::{SyncCursorDB, SyncEngineStateDB};
pub use repository::SyncRepository;
