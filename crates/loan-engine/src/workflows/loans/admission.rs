use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::domain::ApplicantId;

/// Raised when an applicant is already at the pending-application cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("applicant already has {pending} pending application(s) (limit {limit})")]
pub struct PendingLimitExceeded {
    pub pending: u32,
    pub limit: u32,
}

/// Enforces the outstanding-application cap and serializes the
/// count-then-insert sequence per applicant.
///
/// The caller must hold the applicant's slot lock across the pending count,
/// the cap check, and the insert; otherwise two concurrent submissions can
/// both observe a count below the cap and both be admitted.
pub struct AdmissionGuard {
    max_pending: u32,
    slots: Mutex<HashMap<ApplicantId, Arc<Mutex<()>>>>,
}

impl AdmissionGuard {
    pub fn new(max_pending: u32) -> Self {
        Self {
            max_pending,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Per-applicant mutex; lock it for the whole check-then-create sequence.
    ///
    /// Slots whose `Arc` is no longer held by any caller are evicted on the
    /// way in, so the registry tracks applicants with in-flight submissions
    /// rather than every applicant ever seen.
    pub fn slot_for(&self, applicant: &ApplicantId) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().expect("admission slot map poisoned");
        slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        slots
            .entry(applicant.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    #[cfg(test)]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.lock().expect("admission slot map poisoned").len()
    }

    /// Allow iff the applicant's current pending count is below the cap.
    pub fn check(&self, pending: u32) -> Result<(), PendingLimitExceeded> {
        if pending < self.max_pending {
            Ok(())
        } else {
            Err(PendingLimitExceeded {
                pending,
                limit: self.max_pending,
            })
        }
    }
}
