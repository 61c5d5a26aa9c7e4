/// Where the local user stands in the room's admission flow.
///
/// `Entering -> Pending -> Joined`, or `Entering -> Joined` for public
/// unlocked rooms. Every other state is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomPhase {
    Entering,
    Pending,
    Joined,
    Rejected { reason: Option<String> },
    Kicked { reason: Option<String> },
    RoomDeleted,
    Left,
    ConnectionLost,
}

impl RoomPhase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Entering | Self::Pending | Self::Joined)
    }

    pub fn is_joined(&self) -> bool {
        matches!(self, Self::Joined)
    }

    pub fn can_advance_to(&self, next: &RoomPhase) -> bool {
        match (self, next) {
            (Self::Entering, Self::Pending) => true,
            (Self::Entering | Self::Pending, Self::Joined) => true,
            (Self::Entering | Self::Pending, Self::Rejected { .. }) => true,
            (Self::Joined, Self::Rejected { .. }) => false,
            (current, next) => !current.is_terminal() && next.is_terminal(),
        }
    }
}
