use super::{TimeEntry, TimeEntryId, WorkerId};

/// Result of a switch: the entry that was closed and the one that replaced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Switched {
    pub closed: TimeEntry,
    pub opened: TimeEntry,
}

/// A session transition, published after it has been persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started { entry: TimeEntry },
    Switched { closed: TimeEntry, opened: TimeEntry },
    Stopped { entry: TimeEntry },
    /// The open entry was deleted instead of stopped.
    Discarded {
        worker_id: WorkerId,
        entry_id: TimeEntryId,
    },
}

impl SessionEvent {
    pub fn worker_id(&self) -> WorkerId {
        match self {
            SessionEvent::Started { entry } | SessionEvent::Stopped { entry } => entry.worker_id,
            SessionEvent::Switched { opened, .. } => opened.worker_id,
            SessionEvent::Discarded { worker_id, .. } => *worker_id,
        }
    }
}

impl From<Switched> for SessionEvent {
    fn from(switched: Switched) -> Self {
        SessionEvent::Switched {
            closed: switched.closed,
            opened: switched.opened,
        }
    }
}
