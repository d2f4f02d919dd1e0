//! Replication and consistency engine: HLC generator, hash-chained Oplog,
//! conflict resolvers, Vector Clock cache, document store with CDC,
//! snapshot/prune, and gap detection. The peer-to-peer transport layer
//! built on top of this lives in `replidb-net`.

pub mod error;
pub mod gap;
pub mod hlc;
pub mod oplog;
pub mod resolver;
pub mod retry;
pub mod snapshot;
pub mod store;
pub mod value;
pub mod vector_clock;

pub use error::{CoreError, CoreResult};
pub use gap::GapTracker;
pub use hlc::{HlcGenerator, HlcTimestamp};
pub use oplog::{MemoryOplogStore, Op, OplogEntry, OplogStore};
pub use retry::RetryPolicy;
pub use snapshot::{RemotePeerConfiguration, RemotePeerType, Snapshot, SnapshotMetadata};
pub use store::{Document, DocumentMetadata, DocumentStore, ResolverStrategy};
pub use value::Value;
pub use vector_clock::{Causality, VectorClockService};
