//! Attendee reference data: seeded once at bootstrap, read-only afterwards.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Stable external identifier (UUID issued by the upstream seed).
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub direct_manager: String,
    pub email: String,
}

impl Person {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Case-insensitive match against name and email, used by roster filters.
    pub fn matches_filter(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.display_name().to_lowercase().contains(&term)
            || self.email.to_lowercase().contains(&term)
    }
}

#[async_trait]
pub trait PersonRepositoryTrait: Send + Sync {
    fn get_person(&self, person_id: &str) -> Result<Option<Person>>;

    /// Bulk-get by id set; unknown ids are skipped, order is not preserved.
    fn get_people_by_ids(&self, ids: &[String]) -> Result<Vec<Person>>;

    fn count_people(&self) -> Result<i64>;

    /// Atomic seed load: either every row is visible afterwards or none is.
    async fn bulk_load(&self, people: Vec<Person>) -> Result<usize>;
}
