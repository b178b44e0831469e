//! Known-post index used for deduplication

use crate::storage::PostRecord;
use std::collections::HashMap;

/// Result of offering a candidate post to the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// First sighting; the post joined the new set
    New,
    /// The id was already known (stored earlier or admitted this run)
    Known,
}

/// Every known post id, plus the subset first seen during this run
///
/// The post id is the only key. A post is never overwritten once known, so
/// the first candidate for an id wins.
#[derive(Debug, Default)]
pub struct KnownIndex {
    known: HashMap<u64, PostRecord>,
    fresh: HashMap<u64, PostRecord>,
}

impl KnownIndex {
    /// Builds the index from the posts loaded out of storage
    pub fn from_known(known: HashMap<u64, PostRecord>) -> Self {
        Self {
            known,
            fresh: HashMap::new(),
        }
    }

    pub fn admit(&mut self, post: PostRecord) -> Admission {
        if self.known.contains_key(&post.id) {
            return Admission::Known;
        }

        self.fresh.insert(post.id, post.clone());
        self.known.insert(post.id, post);
        Admission::New
    }

    pub fn contains(&self, id: u64) -> bool {
        self.known.contains_key(&id)
    }

    pub fn get(&self, id: u64) -> Option<&PostRecord> {
        self.known.get(&id)
    }

    /// Number of known posts, including the ones admitted this run
    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    pub fn fresh_len(&self) -> usize {
        self.fresh.len()
    }

    /// Hands over the posts admitted this run, sorted by id
    ///
    /// The posts stay in the known set, so admitting them again still
    /// reports [`Admission::Known`].
    pub fn take_fresh(&mut self) -> Vec<PostRecord> {
        let mut fresh: Vec<_> = std::mem::take(&mut self.fresh).into_values().collect();
        fresh.sort_by_key(|post| post.id);
        fresh
    }
}
