use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use turnstile_core::scans::{Scan, ScanMethod};

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
#[diesel(table_name = crate::schema::scans)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ScanDB {
    pub id: String,
    pub event_id: i32,
    pub person_id: String,
    pub timestamp: i64,
    pub method: String,
    pub uploaded: bool,
    pub is_local: bool,
}

impl TryFrom<ScanDB> for Scan {
    type Error = turnstile_core::Error;

    fn try_from(db: ScanDB) -> turnstile_core::Result<Self> {
        Ok(Scan {
            id: db.id,
            event_id: db.event_id,
            person_id: db.person_id,
            timestamp: db.timestamp,
            method: ScanMethod::parse(&db.method)?,
            uploaded: db.uploaded,
            is_local: db.is_local,
        })
    }
}

impl From<Scan> for ScanDB {
    fn from(scan: Scan) -> Self {
        ScanDB {
            id: scan.id,
            event_id: scan.event_id,
            person_id: scan.person_id,
            timestamp: scan.timestamp,
            method: scan.method.as_str().to_string(),
            uploaded: scan.uploaded,
            is_local: scan.is_local,
        }
    }
}
