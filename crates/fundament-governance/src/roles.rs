//! Role capabilities consulted synchronously by the engine.

use std::collections::{HashMap, HashSet};

use fundament_types::MemberId;

/// Capability roles recognized by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// May create proposals regardless of stake (informational; proposal
    /// creation is gated by the stake minimum)
    Proposer,
    /// May execute queued proposals once the timelock elapses
    Executor,
    /// May cancel any non-terminal proposal
    Guardian,
}

/// Membership of identities in roles.
#[derive(Debug, Default)]
pub struct RoleRegistry {
    grants: HashMap<MemberId, HashSet<Role>>,
}

impl RoleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a role to a member.
    pub fn grant(&mut self, member: MemberId, role: Role) {
        self.grants.entry(member).or_default().insert(role);
    }

    /// Revoke a role from a member.
    pub fn revoke(&mut self, member: &MemberId, role: Role) {
        if let Some(roles) = self.grants.get_mut(member) {
            roles.remove(&role);
        }
    }

    /// Whether a member holds a role.
    pub fn has(&self, member: &MemberId, role: Role) -> bool {
        self.grants
            .get(member)
            .map(|roles| roles.contains(&role))
            .unwrap_or(false)
    }
}
