//! In-process catalog with failure injection.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CatalogSource, DeliveryStatus, PromotionalItem};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
pub struct MemoryCatalog {
    items: Mutex<Vec<PromotionalItem>>,
    fail_snapshot: AtomicBool,
    fail_ack: AtomicBool,
    snapshots: AtomicUsize,
    ack_attempts: AtomicUsize,
}

impl MemoryCatalog {
    pub fn new(items: Vec<PromotionalItem>) -> Self {
        Self {
            items: Mutex::new(items),
            ..Self::default()
        }
    }

    /// Make `load_snapshot` fail with `SourceUnavailable`.
    pub fn fail_snapshot(&self, fail: bool) {
        self.fail_snapshot.store(fail, Ordering::SeqCst);
    }

    /// Make `mark_sent` fail with `UpdateConflict` without touching the row.
    pub fn fail_acks(&self, fail: bool) {
        self.fail_ack.store(fail, Ordering::SeqCst);
    }

    pub fn items(&self) -> Vec<PromotionalItem> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn status_of(&self, row: u32) -> Option<DeliveryStatus> {
        self.items().iter().find(|i| i.row == row).map(|i| i.status)
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.load(Ordering::SeqCst)
    }

    /// Number of `mark_sent` calls, successful or not.
    pub fn ack_attempts(&self) -> usize {
        self.ack_attempts.load(Ordering::SeqCst)
    }

    /// Remove a row, as if another operator deleted it.
    pub fn remove(&self, row: u32) {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .retain(|i| i.row != row);
    }
}

#[async_trait]
impl CatalogSource for MemoryCatalog {
    async fn load_snapshot(&self) -> Result<Vec<PromotionalItem>> {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        if self.fail_snapshot.load(Ordering::SeqCst) {
            return Err(Error::SourceUnavailable("memory catalog offline".to_string()));
        }
        Ok(self.items())
    }

    async fn mark_sent(&self, row: u32) -> Result<()> {
        self.ack_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_ack.load(Ordering::SeqCst) {
            return Err(Error::UpdateConflict(format!("row {} write rejected", row)));
        }

        let mut items = self
            .items
            .lock()
            .map_err(|_| Error::UpdateConflict("catalog lock poisoned".to_string()))?;
        let item = items
            .iter_mut()
            .find(|i| i.row == row)
            .ok_or_else(|| Error::UpdateConflict(format!("row {} no longer exists", row)))?;

        if item.status == DeliveryStatus::Sent {
            return Err(Error::UpdateConflict(format!("row {} already sent", row)));
        }
        item.status = DeliveryStatus::Sent;
        Ok(())
    }
}
