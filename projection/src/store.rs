//! In-memory current-state store
//!
//! Keyed by linear ID; applying a committed transition replaces the row for
//! that record, so the store always holds exactly one row per current
//! version.

use crate::rows::{DcrRow, XvpRow};
use dashmap::DashMap;
use record_store::CommittedTransition;
use uuid::Uuid;

/// Queryable current-state store
#[derive(Debug, Default)]
pub struct ProjectionStore {
    dcr: DashMap<Uuid, DcrRow>,
    xvp: DashMap<Uuid, XvpRow>,
}

impl ProjectionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a committed transition, upserting the record's row
    pub fn apply(&self, transition: &CommittedTransition) {
        match transition {
            CommittedTransition::Dcr { record, .. } => {
                self.dcr
                    .insert(record.linear_id.as_uuid(), DcrRow::from(record));
            }
            CommittedTransition::Xvp { record, .. } => {
                self.xvp
                    .insert(record.linear_id.as_uuid(), XvpRow::from(record));
            }
        }
    }

    /// Reservation row by linear ID
    pub fn dcr_by_linear_id(&self, linear_id: Uuid) -> Option<DcrRow> {
        self.dcr.get(&linear_id).map(|row| row.clone())
    }

    /// Reservation row by bound trade
    pub fn dcr_by_trade(&self, trade_id: &str) -> Option<DcrRow> {
        self.dcr
            .iter()
            .find(|row| row.trade_id.as_deref() == Some(trade_id))
            .map(|row| row.clone())
    }

    /// Reservation rows in a given status
    pub fn dcrs_by_status(&self, status: &str) -> Vec<DcrRow> {
        self.dcr
            .iter()
            .filter(|row| row.status == status)
            .map(|row| row.clone())
            .collect()
    }

    /// Trade row by linear ID
    pub fn xvp_by_linear_id(&self, linear_id: Uuid) -> Option<XvpRow> {
        self.xvp.get(&linear_id).map(|row| row.clone())
    }

    /// Trade row by trade ID
    pub fn xvp_by_trade(&self, trade_id: &str) -> Option<XvpRow> {
        self.xvp
            .iter()
            .find(|row| row.trade_id == trade_id)
            .map(|row| row.clone())
    }

    /// Trade rows in a given status
    pub fn xvps_by_status(&self, status: &str) -> Vec<XvpRow> {
        self.xvp
            .iter()
            .filter(|row| row.status == status)
            .map(|row| row.clone())
            .collect()
    }

    /// Number of reservation rows
    pub fn dcr_count(&self) -> usize {
        self.dcr.len()
    }

    /// Number of trade rows
    pub fn xvp_count(&self) -> usize {
        self.xvp.len()
    }
}
