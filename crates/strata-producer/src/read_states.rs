//! Read states and the holder that rotates them.
//!
//! The producer publishes through a tiny state space: the committed holder
//! is either empty or holds the single announced [`ReadState`]; a cycle in
//! flight works on a [`Transition`] value cloned off the holder. The
//! committed holder is replaced only when a transition commits, so a failed
//! cycle can simply drop its transition and nothing observable changes.

use strata_core::{ReadStateEngine, Version};

/// A version bound to its materialized read engine.
#[derive(Debug, Clone)]
pub struct ReadState {
    version: Version,
    engine: ReadStateEngine,
}

impl ReadState {
    /// Creates a read state.
    #[must_use]
    pub fn new(version: Version, engine: ReadStateEngine) -> Self {
        Self { version, engine }
    }

    /// The state's version.
    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    /// The materialized engine.
    #[must_use]
    pub fn engine(&self) -> &ReadStateEngine {
        &self.engine
    }

    pub(crate) fn engine_mut(&mut self) -> &mut ReadStateEngine {
        &mut self.engine
    }
}

/// The committed read-state holder.
#[derive(Debug, Default)]
pub enum ReadStateHolder {
    /// No state has been announced yet.
    #[default]
    Empty,
    /// The single announced state.
    Current(ReadState),
}

impl ReadStateHolder {
    /// Installs a restored state as the announced current.
    #[must_use]
    pub fn restored(state: ReadState) -> Self {
        Self::Current(state)
    }

    /// Whether an announced state exists.
    #[must_use]
    pub fn has_current(&self) -> bool {
        matches!(self, Self::Current(_))
    }

    /// The announced state, if any.
    #[must_use]
    pub fn current(&self) -> Option<&ReadState> {
        match self {
            Self::Empty => None,
            Self::Current(state) => Some(state),
        }
    }

    /// Begins a cycle's round trip: clones the announced state (the private
    /// copy the integrity check applies deltas to) and mints an empty
    /// pending state at `pending_version`.
    #[must_use]
    pub fn roundtrip(&self, pending_version: Version) -> Transition {
        Transition {
            current: self.current().cloned(),
            pending: ReadState::new(pending_version, ReadStateEngine::new()),
        }
    }
}

/// A cycle's in-flight pair of read states.
///
/// `current` carries the prior announced version (absent on the first
/// cycle); `pending` carries the version being produced.
#[derive(Debug)]
pub struct Transition {
    current: Option<ReadState>,
    pending: ReadState,
}

impl Transition {
    /// The prior state's private copy, if a prior state exists.
    #[must_use]
    pub fn current(&self) -> Option<&ReadState> {
        self.current.as_ref()
    }

    /// The pending state.
    #[must_use]
    pub fn pending(&self) -> &ReadState {
        &self.pending
    }

    pub(crate) fn pending_mut(&mut self) -> &mut ReadState {
        &mut self.pending
    }

    /// Both sides, mutably, for the integrity round trip.
    pub(crate) fn parts_mut(&mut self) -> (Option<&mut ReadState>, &mut ReadState) {
        (self.current.as_mut(), &mut self.pending)
    }

    /// Exchanges the engines between the current and pending slots; the
    /// versions keep their slots.
    ///
    /// Used after reverse-delta validation: the forward-applied engine
    /// (proven equal to the pending checksum) moves under the pending
    /// version for commit, and the reverse-applied engine re-materializes
    /// the current slot. Without a current state this is a no-op.
    #[must_use]
    pub fn swap(mut self) -> Self {
        if let Some(current) = self.current.as_mut() {
            std::mem::swap(&mut current.engine, &mut self.pending.engine);
        }
        self
    }

    /// Drops the prior state and promotes pending to the announced current.
    #[must_use]
    pub fn commit(self) -> ReadStateHolder {
        ReadStateHolder::Current(self.pending)
    }
}
