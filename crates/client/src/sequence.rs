//! Per-entity request sequencing
//!
//! Every request is stamped with a number that is never reused. A response
//! is applied only while its ticket is still the newest one issued for that
//! entity; anything older is stale and dropped. Entries are dropped once the
//! newest request for an entity settles.

use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::Mutex;

/// Proof that a request was issued for `entity` as number `seq`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<K> {
    pub entity: K,
    pub seq: u64,
}

#[derive(Debug)]
struct State<K> {
    next: u64,
    latest: HashMap<K, u64>,
}

/// Tracks the newest request issued per entity
#[derive(Debug)]
pub struct RequestSequencer<K> {
    state: Mutex<State<K>>,
}

impl<K: Eq + Hash + Clone> Default for RequestSequencer<K> {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                next: 0,
                latest: HashMap::new(),
            }),
        }
    }
}

impl<K: Eq + Hash + Clone> RequestSequencer<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp a new request for `entity`, superseding earlier ones
    pub fn issue(&self, entity: K) -> Ticket<K> {
        let mut state = self.state.lock();
        state.next += 1;
        let seq = state.next;
        state.latest.insert(entity.clone(), seq);
        Ticket { entity, seq }
    }

    /// Whether no newer request has been issued since `ticket`
    pub fn is_current(&self, ticket: &Ticket<K>) -> bool {
        self.state.lock().latest.get(&ticket.entity) == Some(&ticket.seq)
    }

    /// Mark the request behind `ticket` as finished.
    ///
    /// The entity is forgotten when `ticket` is its newest request.
    pub fn settle(&self, ticket: &Ticket<K>) {
        let mut state = self.state.lock();
        if state.latest.get(&ticket.entity) == Some(&ticket.seq) {
            state.latest.remove(&ticket.entity);
        }
    }

    /// Entities with a request in flight
    pub fn len(&self) -> usize {
        self.state.lock().latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
