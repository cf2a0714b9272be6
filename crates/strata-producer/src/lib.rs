//! # Strata Producer
//!
//! The producer cycle engine: once per cycle it prepares a fresh write
//! state, lets user code populate it, stages snapshot / delta /
//! reverse-delta blobs, proves integrity by round-tripping the deltas
//! through independent read engines, validates, announces, and atomically
//! advances the published version — or rolls everything back.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut producer = Producer::builder()
//!     .publisher(publisher)
//!     .announcer(announcer)
//!     .build()?;
//!
//! producer.run_cycle(&mut |state: &mut WriteState<'_>| {
//!     for movie in movies {
//!         state.add(&movie)?;
//!     }
//!     Ok(())
//! })?;
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod artifacts;
mod blob;
mod builder;
mod error;
mod executor;
mod listener;
mod producer;
mod read_states;
mod status;
mod validation;
mod version;

pub use artifacts::Artifacts;
pub use blob::{Blob, BlobCompressor, BlobStager, FilesystemBlobStager, NoCompression};
pub use builder::{BuildError, ProducerBuilder};
pub use error::{ProducerError, RestoreError};
pub use executor::{InlineSnapshotExecutor, SnapshotExecutor, ThreadSnapshotExecutor};
pub use listener::{ListenerSupport, ProducerListener};
pub use producer::{Announcer, CycleOutcome, Populator, Producer, Publisher, WriteState};
pub use read_states::{ReadState, ReadStateHolder, Transition};
pub use status::{ProducerStatus, PublishStatus, RestoreStatus, Status};
pub use validation::{ValidationError, Validator};
pub use version::{VersionMinter, WallClockVersionMinter};

pub use strata_core::{BlobKind, Version, NO_VERSION};
