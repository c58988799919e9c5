//! Connection lifecycle state machine.

/// The lifecycle of one client connection.
///
/// Transitions are strictly ordered - no skipping states:
///
/// ```text
/// Connecting → Authenticated → Active → Disconnected
/// ```
///
/// - **Connecting**: socket upgraded, credentials not yet verified.
///   Invisible to the rest of the system; no presence, no rooms.
/// - **Authenticated**: token verified, user identity known. Still
///   not registered with the hub, so still receives nothing.
/// - **Active**: registered with the hub. Receives broadcasts, may
///   join rooms. A connection spends its whole useful life here.
/// - **Disconnected**: terminal. Cleanup has been handed to the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnPhase {
    Connecting,
    Authenticated,
    Active,
    Disconnected,
}

impl ConnPhase {
    /// Returns `true` while the connection participates in the hub.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// The next phase in the lifecycle, or `None` from the terminal
    /// phase. This enforces the strict ordering of the state machine.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Connecting => Some(Self::Authenticated),
            Self::Authenticated => Some(Self::Active),
            Self::Active => Some(Self::Disconnected),
            Self::Disconnected => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for ConnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "Connecting"),
            Self::Authenticated => write!(f, "Authenticated"),
            Self::Active => write!(f, "Active"),
            Self::Disconnected => write!(f, "Disconnected"),
        }
    }
}
