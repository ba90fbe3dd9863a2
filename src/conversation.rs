//! Bounded per-channel conversation history.
//!
//! Each channel keeps its most recent turns in arrival order. Appending
//! past the store's capacity drops the oldest turns, so a channel never
//! holds more than `capacity` turns after any mutation. Channels are
//! independent keys; one coarse lock guards the whole map.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::{ConversationTurn, GatewayError, Result};

/// Default number of turns kept per channel.
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Identifier of a chat channel in the host platform.
pub type ChannelId = u64;

/// Thread-safe store of recent turns per channel, bounded by `capacity`.
pub struct ConversationStore {
    capacity: usize,
    channels: Mutex<HashMap<ChannelId, VecDeque<ConversationTurn>>>,
}

impl ConversationStore {
    /// Create a store that keeps at most `capacity` turns per channel.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(GatewayError::Configuration(
                "max history per channel must be positive".into(),
            ));
        }
        Ok(Self {
            capacity,
            channels: Mutex::new(HashMap::new()),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ChannelId, VecDeque<ConversationTurn>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a turn, dropping the oldest turns beyond capacity.
    pub fn append(&self, channel: ChannelId, turn: ConversationTurn) {
        let role = turn.role;
        let mut channels = self.lock();
        let turns = channels.entry(channel).or_default();
        turns.push_back(turn);
        while turns.len() > self.capacity {
            turns.pop_front();
        }
        debug!(channel, ?role, turns = turns.len(), "appended turn");
    }

    /// Current turns in insertion order; empty for an unknown channel.
    pub fn read(&self, channel: ChannelId) -> Vec<ConversationTurn> {
        self.lock()
            .get(&channel)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove the channel's history entirely.
    pub fn clear(&self, channel: ChannelId) {
        if self.lock().remove(&channel).is_some() {
            info!(channel, "cleared conversation history");
        }
    }

    /// Number of channels with at least one stored turn.
    pub fn channel_count(&self) -> usize {
        self.lock().len()
    }

    /// Turns stored across all channels.
    pub fn total_turns(&self) -> usize {
        self.lock().values().map(VecDeque::len).sum()
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_MAX_HISTORY,
            channels: Mutex::new(HashMap::new()),
        }
    }
}
