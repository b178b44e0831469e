//! Deduplicating consumer of candidate posts
//!
//! Candidates arrive in no particular order from every page worker. Each one
//! is checked and inserted under the run's index lock, so two candidates for
//! the same id can never both be admitted: the first to take the lock wins
//! and later ones are dropped as already known.

use crate::state::{Admission, RunContext};
use crate::storage::PostRecord;
use tokio::sync::mpsc;

/// Counters for one aggregation pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AggregateTally {
    /// Candidates received from the channel
    pub received: usize,
    /// Candidates that joined the new set
    pub admitted: usize,
    /// Candidates dropped because the id was already known
    pub duplicates: usize,
}

impl AggregateTally {
    fn record(&mut self, admission: Admission) {
        self.received += 1;
        match admission {
            Admission::New => self.admitted += 1,
            Admission::Known => self.duplicates += 1,
        }
    }

    pub fn merge(self, other: AggregateTally) -> AggregateTally {
        AggregateTally {
            received: self.received + other.received,
            admitted: self.admitted + other.admitted,
            duplicates: self.duplicates + other.duplicates,
        }
    }
}

/// Write access to the run's known-post index
#[derive(Debug, Clone)]
pub struct Aggregator {
    context: RunContext,
}

impl Aggregator {
    pub fn new(context: RunContext) -> Self {
        Self { context }
    }

    /// Offers one candidate to the index
    pub fn admit(&self, post: PostRecord) -> Admission {
        let id = post.id;
        let admission = self.context.lock_index().admit(post);
        if admission == Admission::New {
            tracing::trace!(post_id = id, "new post");
        }
        admission
    }

    /// Consumes candidates until every sender is gone
    pub async fn consume(self, mut candidates: mpsc::Receiver<PostRecord>) -> AggregateTally {
        let mut tally = AggregateTally::default();

        while let Some(post) = candidates.recv().await {
            tally.record(self.admit(post));
        }

        tracing::debug!(
            received = tally.received,
            admitted = tally.admitted,
            duplicates = tally.duplicates,
            "candidate channel drained"
        );
        tally
    }
}
