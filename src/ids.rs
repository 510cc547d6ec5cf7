//! Identifier allocation for new records.
//!
//! An id is valid when it lies at or above the reserved threshold. Invalid ids are
//! replaced by a random free id in `[threshold, threshold + span)` once the user
//! confirms; a declined confirmation follows the configured [`DeclinePolicy`].

use crate::error::DomainError;
use crate::store::RecordStore;
use crate::types::RecordId;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Lowest id of the reserved staff range
pub const DEFAULT_ID_THRESHOLD: RecordId = 770_000_000;

/// Width of the range synthesized ids are drawn from
pub const DEFAULT_ID_SPAN: RecordId = 1_000_000;

/// User-confirmation collaborator
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// Fixed answer, for non-interactive runs
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirm for AutoConfirm {
    async fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}

/// What to do with an out-of-range id when regeneration is declined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclinePolicy {
    /// Keep the requested id even though it is out of range
    #[default]
    PassThrough,
    /// Refuse the create
    Reject,
}

/// Outcome of an allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// Requested id was already valid
    Accepted(RecordId),
    /// Requested id was replaced by a synthesized one
    Regenerated {
        requested: RecordId,
        assigned: RecordId,
    },
    /// Regeneration was declined and the invalid id kept
    PassedThrough(RecordId),
}

impl Allocation {
    pub fn id(&self) -> RecordId {
        match self {
            Allocation::Accepted(id) | Allocation::PassedThrough(id) => *id,
            Allocation::Regenerated { assigned, .. } => *assigned,
        }
    }
}

/// Id validation and synthesis policy
pub struct IdAllocator {
    threshold: RecordId,
    span: RecordId,
    on_decline: DeclinePolicy,
    rng: StdRng,
}

impl IdAllocator {
    pub fn new(threshold: RecordId, span: RecordId, on_decline: DeclinePolicy) -> Self {
        Self {
            threshold,
            span,
            on_decline,
            rng: StdRng::from_entropy(),
        }
    }

    /// Use a specific random source (deterministic tests)
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn threshold(&self) -> RecordId {
        self.threshold
    }

    pub fn span(&self) -> RecordId {
        self.span
    }

    pub fn is_valid(&self, id: RecordId) -> bool {
        id > 0 && id >= self.threshold
    }

    /// Draw random ids until one is free in the store.
    pub fn synthesize(&mut self, store: &RecordStore) -> Result<RecordId, DomainError> {
        let upper = self.threshold.saturating_add(self.span);
        let capacity = usize::try_from(self.span).unwrap_or(usize::MAX);
        if store.count_in_range(self.threshold, upper) >= capacity {
            return Err(DomainError::IdSpaceExhausted);
        }

        let mut attempts: u64 = 0;
        loop {
            attempts += 1;
            let candidate = self.threshold + self.rng.gen_range(0..self.span);
            if !store.contains(candidate) {
                debug!(id = candidate, attempts, "Synthesized record id");
                return Ok(candidate);
            }
        }
    }

    /// Validate a requested id, asking `confirm` before replacing an invalid one.
    pub async fn allocate(
        &mut self,
        requested: RecordId,
        store: &RecordStore,
        confirm: &dyn Confirm,
    ) -> Result<Allocation, DomainError> {
        if self.is_valid(requested) {
            return Ok(Allocation::Accepted(requested));
        }

        let message = format!(
            "Id {} is outside the staff range (must be at least {}). Generate a new id?",
            requested, self.threshold
        );
        if confirm.confirm(&message).await {
            let assigned = self.synthesize(store)?;
            return Ok(Allocation::Regenerated {
                requested,
                assigned,
            });
        }

        match self.on_decline {
            DeclinePolicy::PassThrough => {
                warn!(id = requested, "Keeping out-of-range id after declined regeneration");
                Ok(Allocation::PassedThrough(requested))
            }
            DeclinePolicy::Reject => Err(DomainError::InvalidId(requested)),
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_ID_THRESHOLD, DEFAULT_ID_SPAN, DeclinePolicy::default())
    }
}
