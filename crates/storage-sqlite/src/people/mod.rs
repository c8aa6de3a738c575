mod model;
mod repository;

pub use model::PersonDB;
pub use repository::PersonRepository;
