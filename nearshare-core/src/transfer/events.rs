//! Transfer Event System

use super::TransferStatus;

/// Events emitted by the transfer simulator
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    /// A session moved to a new status
    StatusChanged {
        session_id: String,
        status: TransferStatus,
    },

    /// Progress advanced
    Progress { session_id: String, progress: u8 },

    /// A session reached 100%
    Completed {
        session_id: String,
        device_id: String,
    },

    /// A session could not reach its device
    Failed { session_id: String, reason: String },

    /// A session was cancelled by the user
    Cancelled { session_id: String },
}

impl TransferEvent {
    pub fn session_id(&self) -> &str {
        match self {
            TransferEvent::StatusChanged { session_id, .. }
            | TransferEvent::Progress { session_id, .. }
            | TransferEvent::Completed { session_id, .. }
            | TransferEvent::Failed { session_id, .. }
            | TransferEvent::Cancelled { session_id } => session_id,
        }
    }

    /// Check if this event ends a session
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferEvent::Completed { .. }
                | TransferEvent::Failed { .. }
                | TransferEvent::Cancelled { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_extraction() {
        let event = TransferEvent::Progress {
            session_id: "abc".to_string(),
            progress: 40,
        };
        assert_eq!(event.session_id(), "abc");
        assert!(!event.is_terminal());

        let event = TransferEvent::Cancelled {
            session_id: "abc".to_string(),
        };
        assert!(event.is_terminal());
    }
}
