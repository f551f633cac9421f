//! Build server status gate

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// What the build server is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Waiting,
    Building,
    Updating,
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServerStatus::Waiting => "waiting",
            ServerStatus::Building => "building",
            ServerStatus::Updating => "updating",
        };
        f.write_str(s)
    }
}

/// Guards the one-operation-at-a-time rule.
///
/// `try_begin` either hands out the only permit or reports what is
/// already running. The permit puts the gate back to Waiting when it
/// drops, so a failed or panicked operation cannot leave the server
/// stuck in Building.
pub struct StatusGate {
    current: Mutex<ServerStatus>,
}

impl StatusGate {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(ServerStatus::Waiting),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ServerStatus> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The status as of this instant
    pub fn current(&self) -> ServerStatus {
        *self.lock()
    }

    /// Move Waiting to `next`, or report the state that is in the way
    pub fn try_begin(self: Arc<Self>, next: ServerStatus) -> Result<StatusPermit, ServerStatus> {
        let mut current = self.lock();
        if *current != ServerStatus::Waiting {
            return Err(*current);
        }
        *current = next;
        drop(current);

        Ok(StatusPermit { gate: self })
    }
}

impl Default for StatusGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive right to run one operation
pub struct StatusPermit {
    gate: Arc<StatusGate>,
}

impl Drop for StatusPermit {
    fn drop(&mut self) {
        *self.gate.lock() = ServerStatus::Waiting;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_starts_waiting() {
        let gate = Arc::new(StatusGate::new());
        assert_eq!(gate.current(), ServerStatus::Waiting);
    }

    #[test]
    fn test_busy_gate_reports_running_state() {
        let gate = Arc::new(StatusGate::new());

        let _permit = gate.clone().try_begin(ServerStatus::Building).expect("first");
        assert_eq!(gate.current(), ServerStatus::Building);

        let second = gate.clone().try_begin(ServerStatus::Updating);
        match second {
            Err(current) => assert_eq!(current, ServerStatus::Building),
            Ok(_) => panic!("second permit should be rejected"),
        }
    }

    #[test]
    fn test_permit_drop_resets_to_waiting() {
        let gate = Arc::new(StatusGate::new());

        let permit = gate.clone().try_begin(ServerStatus::Updating).expect("permit");
        assert_eq!(gate.current(), ServerStatus::Updating);

        drop(permit);
        assert_eq!(gate.current(), ServerStatus::Waiting);
    }

    #[test]
    fn test_gate_resets_when_operation_errors() {
        fn failing_operation(gate: &Arc<StatusGate>) -> Result<(), &'static str> {
            let _permit = gate
                .clone()
                .try_begin(ServerStatus::Building)
                .map_err(|_| "busy")?;
            Err("blew up")
        }

        let gate = Arc::new(StatusGate::new());
        assert!(failing_operation(&gate).is_err());
        assert_eq!(gate.current(), ServerStatus::Waiting);
    }

    #[test]
    fn test_gate_reusable_after_reset() {
        let gate = Arc::new(StatusGate::new());

        drop(gate.clone().try_begin(ServerStatus::Building).expect("first"));
        let second = gate.clone().try_begin(ServerStatus::Updating);
        assert!(second.is_ok());
    }
}
