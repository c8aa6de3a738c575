use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;

use turnstile_core::people::{Person, PersonRepositoryTrait};
use turnstile_core::Result;

use super::model::PersonDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::people;

pub struct PersonRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl PersonRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        PersonRepository { pool, writer }
    }
}

#[async_trait]
impl PersonRepositoryTrait for PersonRepository {
    fn get_person(&self, person_id: &str) -> Result<Option<Person>> {
        let mut conn = get_connection(&self.pool)?;
        let person_db = people::table
            .find(person_id)
            .first::<PersonDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(person_db.map(Person::from))
    }

    fn get_people_by_ids(&self, ids: &[String]) -> Result<Vec<Person>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = get_connection(&self.pool)?;
        let people_db = people::table
            .filter(people::id.eq_any(ids))
            .load::<PersonDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(people_db.into_iter().map(Person::from).collect())
    }

    fn count_people(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        people::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| StorageError::from(e).into())
    }

    async fn bulk_load(&self, rows: Vec<Person>) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let loaded = conn.immediate_transaction::<_, StorageError, _>(|tx| {
                    let mut loaded = 0usize;
                    for person in rows {
                        let person_db = PersonDB::from(person);
                        diesel::insert_into(people::table)
                            .values(&person_db)
                            .on_conflict(people::id)
                            .do_update()
                            .set(&person_db)
                            .execute(tx)?;
                        loaded += 1;
                    }
                    Ok(loaded)
                })?;
                Ok(loaded)
            })
            .await
    }
}
