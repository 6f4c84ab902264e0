//! Service commands called by the surrounding API layer.
//!
//! Each command takes the authenticated caller and a loosely-typed JSON
//! payload, checks the caller's role, parses the payload into a typed DTO,
//! and delegates into the domain modules. Failures come back as
//! [`crate::errors::ServiceError`] so the API layer can tell authorization,
//! validation, and store problems apart.

pub mod accounting;
pub mod analysis;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::MutexGuard;

use crate::db::DbState;
use crate::errors::ServiceError;
use crate::identity::Caller;

pub(crate) fn parse_payload<T: DeserializeOwned>(arg0: Option<Value>) -> Result<T, ServiceError> {
    let payload = arg0.unwrap_or(Value::Null);
    serde_json::from_value(payload).map_err(|e| ServiceError::InvalidPayload(e.to_string()))
}

pub(crate) fn lock_conn(db: &DbState) -> Result<MutexGuard<'_, rusqlite::Connection>, ServiceError> {
    db.conn
        .lock()
        .map_err(|e| ServiceError::StateLock(e.to_string()))
}

pub(crate) fn require_entry_access(caller: &Caller) -> Result<(), ServiceError> {
    if caller.can_enter_accounting() {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized {
            required: "manager or admin",
        })
    }
}

pub(crate) fn require_analysis_access(caller: &Caller) -> Result<(), ServiceError> {
    if caller.can_view_analysis() {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized { required: "admin" })
    }
}
