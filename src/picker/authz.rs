//! Authorization policy for comment-triggered picks.
//!
//! The policy is a pure function over evidence the orchestrator has already
//! gathered, so it is unit-testable without network calls. `allow_all` is an
//! override, not evidence.

/// Facts about a requester, gathered from the platform before deciding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Evidence {
    /// The requester is a member of the organization owning the repository.
    pub org_member: bool,
    /// The requester is a collaborator on the repository.
    pub collaborator: bool,
    /// Comment triggers were previously enabled on this PR by an invite.
    pub invited: bool,
}

/// Whether a requester may trigger a cherry-pick by comment.
pub fn is_pick_allowed(allow_all: bool, evidence: Evidence) -> bool {
    allow_all || evidence.org_member || evidence.collaborator || evidence.invited
}

/// Whether a requester may issue an invite.
///
/// Inviting requires standing of its own; a previously recorded invite does
/// not grant the ability to invite further.
pub fn is_invite_allowed(allow_all: bool, evidence: Evidence) -> bool {
    allow_all || evidence.org_member || evidence.collaborator
}
