//! Caller identity handed in by the surrounding auth layer.
//!
//! Login and session management live outside this crate; commands only see
//! the already-authenticated caller's id, display name, and role, and gate
//! on the two permission levels the accounting surface uses.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Staff,
}

/// An authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl Caller {
    /// Daily sales/expense entry is open to managers and admins.
    pub fn can_enter_accounting(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Manager)
    }

    /// Fixed costs and the analysis views are admin-only.
    pub fn can_view_analysis(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}
