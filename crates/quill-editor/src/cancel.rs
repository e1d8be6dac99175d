//! One outstanding request per operation kind.
//!
//! Issuing a ticket cancels the previous ticket of the same kind. Completions
//! are applied only while their ticket is still current.

use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Fetch,
    Save,
    Transform,
}

impl OperationKind {
    const COUNT: usize = 3;

    fn index(self) -> usize {
        match self {
            Self::Fetch => 0,
            Self::Save => 1,
            Self::Transform => 2,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fetch => "fetch",
            Self::Save => "save",
            Self::Transform => "transform",
        })
    }
}

/// Handle for one issued request.
#[derive(Debug, Clone)]
pub struct Ticket {
    kind: OperationKind,
    generation: u64,
    token: CancellationToken,
}

impl Ticket {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Token a host can watch to abandon its network call early.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    active: Option<CancellationToken>,
}

#[derive(Debug, Default)]
pub struct RequestSlots {
    slots: [Slot; OperationKind::COUNT],
    closed: bool,
}

impl RequestSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request of `kind`, superseding any outstanding one. Returns
    /// `None` once the slots are closed.
    pub fn issue(&mut self, kind: OperationKind) -> Option<Ticket> {
        if self.closed {
            return None;
        }

        let slot = &mut self.slots[kind.index()];
        if let Some(previous) = slot.active.take() {
            debug!(%kind, generation = slot.generation, "Superseding in-flight request");
            previous.cancel();
        }

        slot.generation += 1;
        let token = CancellationToken::new();
        slot.active = Some(token.clone());

        Some(Ticket {
            kind,
            generation: slot.generation,
            token,
        })
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        let slot = &self.slots[ticket.kind.index()];
        !self.closed
            && !ticket.token.is_cancelled()
            && slot.active.is_some()
            && slot.generation == ticket.generation
    }

    /// Release the slot held by `ticket`. Returns false if the ticket was
    /// stale, in which case its result must be dropped.
    pub fn complete(&mut self, ticket: &Ticket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.slots[ticket.kind.index()].active = None;
        true
    }

    pub fn in_flight(&self, kind: OperationKind) -> bool {
        self.slots[kind.index()].active.is_some()
    }

    pub fn busy(&self) -> bool {
        self.slots.iter().any(|s| s.active.is_some())
    }

    /// Cancel everything and refuse new tickets.
    pub fn close(&mut self) {
        self.closed = true;
        for slot in &mut self.slots {
            if let Some(token) = slot.active.take() {
                token.cancel();
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
