//! Stake bookkeeping for fund members.
//!
//! One record per identity, created on first deposit and never deleted.
//! The aggregate stake is maintained in the same call that mutates a
//! member's stake, so the two are never observably split.

use std::collections::HashMap;

use fundament_types::{Amount, Height, MemberId};

use crate::error::GovernanceError;
use crate::voting;

/// A fund member's stake record.
#[derive(Debug, Clone)]
pub struct Member {
    /// Capital contributed, in base units
    pub stake: Amount,
    /// Height of the most recent stake mutation
    pub last_update_height: Height,
    /// Number of deposits made
    pub deposits: u64,
}

impl Member {
    fn new(height: Height) -> Self {
        Self {
            stake: 0,
            last_update_height: height,
            deposits: 0,
        }
    }

    /// Current voting power for this member.
    pub fn voting_power(&self) -> Amount {
        voting::voting_power(self.stake)
    }
}

/// Ledger of all member stakes plus the aggregate.
#[derive(Debug, Default)]
pub struct MembershipLedger {
    members: HashMap<MemberId, Member>,
    total_stake: Amount,
}

impl MembershipLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deposit capital for a member, creating the record on first deposit.
    ///
    /// # Errors
    /// - `InvalidInput` for a zero amount or on stake overflow
    pub fn deposit(
        &mut self,
        member: MemberId,
        amount: Amount,
        height: Height,
    ) -> Result<(), GovernanceError> {
        if amount == 0 {
            return Err(GovernanceError::InvalidInput(
                "deposit amount must be positive".to_string(),
            ));
        }

        // Validate both additions before touching any state
        let current = self.members.get(&member).map(|m| m.stake).unwrap_or(0);
        let new_stake = current.checked_add(amount).ok_or_else(|| {
            GovernanceError::InvalidInput("deposit overflows member stake".to_string())
        })?;
        let new_total = self.total_stake.checked_add(amount).ok_or_else(|| {
            GovernanceError::InvalidInput("deposit overflows total stake".to_string())
        })?;

        let record = self.members.entry(member).or_insert_with(|| Member::new(height));
        record.stake = new_stake;
        record.last_update_height = height;
        record.deposits += 1;
        self.total_stake = new_total;

        Ok(())
    }

    /// Get a member's record.
    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.members.get(id)
    }

    /// A member's stake; zero for unknown identities.
    pub fn stake_of(&self, id: &MemberId) -> Amount {
        self.members.get(id).map(|m| m.stake).unwrap_or(0)
    }

    /// A member's voting power; zero for unknown identities.
    pub fn voting_power_of(&self, id: &MemberId) -> Amount {
        voting::voting_power(self.stake_of(id))
    }

    /// Sum of all member stakes.
    pub fn total_stake(&self) -> Amount {
        self.total_stake
    }

    /// Number of members with a record.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}
