//! Opaque identifiers. Every id in the simulated system is a random v4 UUID,
//! matching the original Go implementation's use of `uuid.UUID` for block
//! hashes, rollup hashes, transaction ids, and addresses alike.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! opaque_id {
    ($name:ident) => {
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", stringify!($name), &self.0.simple().to_string()[..8])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", &self.0.simple().to_string()[..8])
            }
        }
    };
}

opaque_id!(BlockId);
opaque_id!(RollupId);
opaque_id!(TxId);
opaque_id!(Address);

/// Index of a miner/aggregator pair within the simulation. Used only for
/// logging and per-node stats bucketing, never for consensus decisions.
pub type NodeId = u64;

/// Tie-break value attached to both L1 blocks and L2 rollups. Lower wins.
pub type Nonce = u64;
