//! Snowflake-style unique identifiers.
//!
//! Every externally visible record carries a `Uid`: a 64-bit, time-ordered,
//! collision-resistant identifier distinct from the storage-internal
//! auto-increment id. IDs are minted by a node-keyed [`SnowflakeGenerator`]
//! passed explicitly to whichever backend needs one.
//!
//! ID layout (63 usable bits, always non-negative as `i64`):
//!
//! ```text
//! | 41 bits: ms since 2024-01-01 UTC | 10 bits: node | 12 bits: sequence |
//! ```

use std::{
    fmt,
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Custom epoch: 2024-01-01 00:00:00 UTC, in milliseconds since the Unix epoch.
const EPOCH_MS: u64 = 1_704_067_200_000;

const NODE_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;

const NODE_MASK: u64 = (1 << NODE_BITS) - 1;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

/// Largest node id a generator can be keyed with.
pub const MAX_NODE_ID: u16 = NODE_MASK as u16;

/// A snowflake identifier.
///
/// `Uid::ZERO` marks "unassigned": persisted records are never given a zero
/// uid, and loaders backfill zero uids with freshly generated ones.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(i64);

impl Uid {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for Uid {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Uid> for i64 {
    fn from(value: Uid) -> Self {
        value.0
    }
}

impl FromStr for Uid {
    type Err = std::num::ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.parse::<i64>().map(Self)
    }
}

/// Errors from constructing a [`SnowflakeGenerator`].
#[derive(Debug, Error)]
pub enum UidError {
    #[error("node id {0} exceeds the {MAX_NODE_ID} maximum")]
    NodeOutOfRange(u16),
}

struct GeneratorState {
    last_timestamp: u64,
    sequence: u64,
}

/// Node-keyed snowflake generator.
///
/// Monotonic within a process; the node component keeps concurrently running
/// instances from colliding. The internal lock is held only for the duration
/// of the counter update.
pub struct SnowflakeGenerator {
    node: u64,
    state: Mutex<GeneratorState>,
}

impl fmt::Debug for SnowflakeGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeGenerator")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

impl SnowflakeGenerator {
    /// Create a generator keyed by `node_id` (0..=[`MAX_NODE_ID`]).
    ///
    /// # Errors
    ///
    /// Returns [`UidError::NodeOutOfRange`] when `node_id` does not fit the
    /// node bit width.
    pub fn new(node_id: u16) -> Result<Self, UidError> {
        if node_id > MAX_NODE_ID {
            return Err(UidError::NodeOutOfRange(node_id));
        }
        Ok(Self {
            node: u64::from(node_id),
            state: Mutex::new(GeneratorState {
                last_timestamp: 0,
                sequence: 0,
            }),
        })
    }

    /// Mint the next identifier.
    ///
    /// Sequence overflow within one millisecond waits for the next tick; a
    /// backwards clock step keeps using the last observed timestamp so IDs
    /// stay monotonic.
    pub fn generate(&self) -> Uid {
        loop {
            let timestamp = Self::now_since_epoch_ms();

            let mut state = self.state.lock();
            let sequence = if timestamp > state.last_timestamp {
                state.last_timestamp = timestamp;
                state.sequence = 0;
                0
            } else {
                state.sequence += 1;
                if state.sequence > SEQUENCE_MASK {
                    drop(state);
                    std::thread::sleep(std::time::Duration::from_millis(1));
                    continue;
                }
                state.sequence
            };

            let id = (state.last_timestamp << (NODE_BITS + SEQUENCE_BITS))
                | (self.node << SEQUENCE_BITS)
                | sequence;
            return Uid::new(id as i64);
        }
    }

    fn now_since_epoch_ms() -> u64 {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64);
        now_ms.saturating_sub(EPOCH_MS)
    }
}

/// Extracts the millisecond timestamp portion of an identifier.
#[must_use]
pub fn extract_timestamp(uid: Uid) -> u64 {
    (uid.value() as u64) >> (NODE_BITS + SEQUENCE_BITS)
}

/// Extracts the node portion of an identifier.
#[must_use]
pub fn extract_node(uid: Uid) -> u64 {
    ((uid.value() as u64) >> SEQUENCE_BITS) & NODE_MASK
}
