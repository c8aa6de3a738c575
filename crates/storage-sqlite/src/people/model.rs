use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use turnstile_core::people::Person;

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(table_name = crate::schema::people)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PersonDB {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub direct_manager: String,
    pub email: String,
}

impl From<PersonDB> for Person {
    fn from(db: PersonDB) -> Self {
        Person {
            id: db.id,
            first_name: db.first_name,
            last_name: db.last_name,
            direct_manager: db.direct_manager,
            email: db.email,
        }
    }
}

impl From<Person> for PersonDB {
    fn from(person: Person) -> Self {
        PersonDB {
            id: person.id,
            first_name: person.first_name,
            last_name: person.last_name,
            direct_manager: person.direct_manager,
            email: person.email,
        }
    }
}
