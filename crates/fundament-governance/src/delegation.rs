//! Delegation registry.
//!
//! Records a delegate/revoke relation between members. The relation is
//! intent only: ballot weight is always computed from the voter's own
//! stake, and delegated power is never folded into a delegatee's cast
//! vote. Chains are not resolved either; a delegatee's own delegation
//! is not followed.

use std::collections::HashMap;

use fundament_types::{Height, MemberId};

use crate::error::GovernanceError;

/// A single delegation edge.
#[derive(Debug, Clone)]
pub struct Delegation {
    /// Who is delegating
    pub delegator: MemberId,
    /// Who receives the delegation
    pub delegatee: MemberId,
    /// Height when the edge was created
    pub created_at: Height,
    /// Whether the edge is still active
    pub active: bool,
    /// Height when revoked, if revoked
    pub revoked_at: Option<Height>,
}

impl Delegation {
    fn new(delegator: MemberId, delegatee: MemberId, created_at: Height) -> Self {
        Self {
            delegator,
            delegatee,
            created_at,
            active: true,
            revoked_at: None,
        }
    }
}

/// Registry of delegation edges, keyed by delegator.
#[derive(Debug, Default)]
pub struct DelegationRegistry {
    /// delegator -> current edge (active or revoked)
    delegations: HashMap<MemberId, Delegation>,
    /// delegatee -> active delegators (reverse lookup)
    delegatees: HashMap<MemberId, Vec<MemberId>>,
}

impl DelegationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an active delegation edge, overwriting any prior edge.
    ///
    /// Stake preconditions are the engine's responsibility; this registry
    /// only validates the identities themselves.
    ///
    /// # Errors
    /// - `InvalidInput` for self-delegation or a zero delegatee identity
    pub fn delegate(
        &mut self,
        from: MemberId,
        to: MemberId,
        height: Height,
    ) -> Result<(), GovernanceError> {
        if to.is_zero() {
            return Err(GovernanceError::InvalidInput(
                "delegatee identity must be non-zero".to_string(),
            ));
        }
        if from == to {
            return Err(GovernanceError::InvalidInput(
                "self-delegation is not allowed".to_string(),
            ));
        }

        // Drop any prior active edge from the reverse lookup
        if let Some(prior) = self.delegations.get(&from) {
            if prior.active {
                if let Some(delegators) = self.delegatees.get_mut(&prior.delegatee) {
                    delegators.retain(|d| *d != from);
                }
            }
        }

        self.delegatees.entry(to).or_default().push(from);
        self.delegations.insert(from, Delegation::new(from, to, height));

        Ok(())
    }

    /// Deactivate an active delegation edge.
    ///
    /// # Errors
    /// - `InvalidStateTransition` when no active edge exists
    pub fn revoke(&mut self, from: MemberId, height: Height) -> Result<(), GovernanceError> {
        let delegation = self
            .delegations
            .get_mut(&from)
            .filter(|d| d.active)
            .ok_or_else(|| {
                GovernanceError::InvalidStateTransition(
                    "no active delegation to revoke".to_string(),
                )
            })?;

        delegation.active = false;
        delegation.revoked_at = Some(height);

        let delegatee = delegation.delegatee;
        if let Some(delegators) = self.delegatees.get_mut(&delegatee) {
            delegators.retain(|d| *d != from);
        }

        Ok(())
    }

    /// Current active delegatee for a member, if any.
    pub fn delegatee_of(&self, from: &MemberId) -> Option<MemberId> {
        self.delegations
            .get(from)
            .filter(|d| d.active)
            .map(|d| d.delegatee)
    }

    /// Whether a member has an active delegation.
    pub fn is_delegating(&self, from: &MemberId) -> bool {
        self.delegatee_of(from).is_some()
    }

    /// Active delegators pointing at a delegatee (direct only).
    pub fn delegators_of(&self, to: &MemberId) -> Vec<MemberId> {
        self.delegatees.get(to).cloned().unwrap_or_default()
    }

    /// Full edge record for a delegator, active or revoked.
    pub fn delegation(&self, from: &MemberId) -> Option<&Delegation> {
        self.delegations.get(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(n: u8) -> MemberId {
        let mut id = [0u8; 20];
        id[19] = n;
        MemberId::from_bytes(id)
    }

    #[test]
    fn test_delegate_and_lookup() {
        let mut registry = DelegationRegistry::new();
        let alice = member(1);
        let bob = member(2);

        registry.delegate(alice, bob, 100).unwrap();

        assert!(registry.is_delegating(&alice));
        assert_eq!(registry.delegatee_of(&alice), Some(bob));
        assert_eq!(registry.delegators_of(&bob), vec![alice]);
    }

    #[test]
    fn test_self_delegation_rejected() {
        let mut registry = DelegationRegistry::new();
        let alice = member(1);

        let result = registry.delegate(alice, alice, 100);
        assert!(matches!(result, Err(GovernanceError::InvalidInput(_))));
    }

    #[test]
    fn test_zero_delegatee_rejected() {
        let mut registry = DelegationRegistry::new();
        let result = registry.delegate(member(1), MemberId::ZERO, 100);
        assert!(matches!(result, Err(GovernanceError::InvalidInput(_))));
    }

    #[test]
    fn test_overwrite_prior_edge() {
        let mut registry = DelegationRegistry::new();
        let alice = member(1);
        let bob = member(2);
        let carol = member(3);

        registry.delegate(alice, bob, 100).unwrap();
        registry.delegate(alice, carol, 200).unwrap();

        assert_eq!(registry.delegatee_of(&alice), Some(carol));
        assert!(registry.delegators_of(&bob).is_empty());
        assert_eq!(registry.delegators_of(&carol), vec![alice]);
    }

    #[test]
    fn test_revoke() {
        let mut registry = DelegationRegistry::new();
        let alice = member(1);
        let bob = member(2);

        registry.delegate(alice, bob, 100).unwrap();
        registry.revoke(alice, 200).unwrap();

        assert!(!registry.is_delegating(&alice));
        assert!(registry.delegators_of(&bob).is_empty());

        let edge = registry.delegation(&alice).unwrap();
        assert!(!edge.active);
        assert_eq!(edge.revoked_at, Some(200));
    }

    #[test]
    fn test_revoke_without_edge_fails() {
        let mut registry = DelegationRegistry::new();
        let result = registry.revoke(member(1), 100);
        assert!(matches!(
            result,
            Err(GovernanceError::InvalidStateTransition(_))
        ));
    }

    #[test]
    fn test_revoke_twice_fails() {
        let mut registry = DelegationRegistry::new();
        let alice = member(1);

        registry.delegate(alice, member(2), 100).unwrap();
        registry.revoke(alice, 200).unwrap();

        assert!(registry.revoke(alice, 300).is_err());
    }

    #[test]
    fn test_no_chain_resolution() {
        let mut registry = DelegationRegistry::new();
        let alice = member(1);
        let bob = member(2);
        let carol = member(3);

        // alice -> bob, bob -> carol; alice's delegatee stays bob
        registry.delegate(alice, bob, 100).unwrap();
        registry.delegate(bob, carol, 100).unwrap();

        assert_eq!(registry.delegatee_of(&alice), Some(bob));
        assert_eq!(registry.delegators_of(&bob), vec![alice]);
    }
}
