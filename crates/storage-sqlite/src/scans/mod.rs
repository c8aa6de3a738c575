mod model;
mod repository;

pub use model::ScanDB;
pub use repository::ScanRepository;
