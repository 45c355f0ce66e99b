//! The governance engine aggregate.
//!
//! A single-writer sequential state machine: every mutating operation
//! takes `&mut self`, validates all of its preconditions before the
//! first mutation, and either commits completely or leaves the engine
//! untouched. Cross-entity pairs (member stake and aggregate stake,
//! treasury debit and the executed flag) are mutated inside one call so
//! no reader can observe them split.

use fundament_types::{Amount, Height, MemberId};

use crate::delegation::DelegationRegistry;
use crate::error::GovernanceError;
use crate::membership::{Member, MembershipLedger};
use crate::proposal::{
    CategoryTable, Proposal, ProposalCategory, ProposalRegistry, ProposalState, VoteChoice,
};
use crate::roles::{Role, RoleRegistry};
use crate::timelock::TimelockEntry;
use crate::treasury::TreasuryGuard;

/// Engine configuration, immutable after construction.
#[derive(Debug, Clone)]
pub struct GovernanceConfig {
    /// Voting window length in blocks
    pub voting_period: u64,
    /// Minimum stake required to create a proposal
    pub min_stake_to_propose: Amount,
    /// Per-category thresholds
    pub categories: CategoryTable,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            voting_period: 100_800, // ~1 week at 6s blocks
            min_stake_to_propose: 100,
            categories: CategoryTable::default(),
        }
    }
}

/// The governance state machine for the pooled fund.
#[derive(Debug)]
pub struct GovernanceEngine {
    config: GovernanceConfig,
    ledger: MembershipLedger,
    delegations: DelegationRegistry,
    proposals: ProposalRegistry,
    treasury: TreasuryGuard,
    roles: RoleRegistry,
}

impl GovernanceEngine {
    /// Create an engine with an empty treasury.
    pub fn new(config: GovernanceConfig) -> Self {
        Self {
            config,
            ledger: MembershipLedger::new(),
            delegations: DelegationRegistry::new(),
            proposals: ProposalRegistry::new(),
            treasury: TreasuryGuard::new(),
            roles: RoleRegistry::new(),
        }
    }

    /// Credit the pooled treasury.
    pub fn fund_treasury(&mut self, amount: Amount) -> Result<(), GovernanceError> {
        self.treasury.fund(amount)?;
        tracing::debug!(amount, balance = self.treasury.balance(), "treasury funded");
        Ok(())
    }

    /// Grant a capability role.
    pub fn grant_role(&mut self, member: MemberId, role: Role) {
        self.roles.grant(member, role);
    }

    /// Revoke a capability role.
    pub fn revoke_role(&mut self, member: &MemberId, role: Role) {
        self.roles.revoke(member, role);
    }

    /// Deposit capital for a member. Member stake and aggregate stake
    /// move together in this one call.
    pub fn deposit(
        &mut self,
        member: MemberId,
        amount: Amount,
        now: Height,
    ) -> Result<(), GovernanceError> {
        self.ledger.deposit(member, amount, now)?;
        tracing::debug!(
            member = %member,
            amount,
            total_stake = self.ledger.total_stake(),
            "deposit accepted"
        );
        Ok(())
    }

    /// Record a delegation edge from `from` to `to`.
    ///
    /// # Errors
    /// - `Unauthorized` if `from` has no stake
    /// - `InvalidInput` for self-delegation or a zero delegatee
    pub fn delegate(
        &mut self,
        from: MemberId,
        to: MemberId,
        now: Height,
    ) -> Result<(), GovernanceError> {
        if self.ledger.stake_of(&from) == 0 {
            return Err(GovernanceError::Unauthorized(
                "delegation requires nonzero stake".to_string(),
            ));
        }
        self.delegations.delegate(from, to, now)?;
        tracing::debug!(from = %from, to = %to, "delegation recorded");
        Ok(())
    }

    /// Revoke an active delegation edge.
    pub fn revoke_delegation(
        &mut self,
        from: MemberId,
        now: Height,
    ) -> Result<(), GovernanceError> {
        self.delegations.revoke(from, now)?;
        tracing::debug!(from = %from, "delegation revoked");
        Ok(())
    }

    /// Create a treasury-transfer proposal and return its id.
    ///
    /// # Errors
    /// - `Unauthorized` if the proposer's stake is below the minimum
    /// - `InvalidInput` for a zero recipient or empty description
    /// - `ResourceExhausted` above the category limit or current balance
    pub fn create_proposal(
        &mut self,
        proposer: MemberId,
        category: ProposalCategory,
        recipient: MemberId,
        amount: Amount,
        description: String,
        now: Height,
    ) -> Result<u64, GovernanceError> {
        if self.ledger.stake_of(&proposer) < self.config.min_stake_to_propose {
            return Err(GovernanceError::Unauthorized(format!(
                "proposing requires a stake of at least {}",
                self.config.min_stake_to_propose
            )));
        }
        if recipient.is_zero() {
            return Err(GovernanceError::InvalidInput(
                "recipient identity must be non-zero".to_string(),
            ));
        }
        if description.trim().is_empty() {
            return Err(GovernanceError::InvalidInput(
                "description must not be empty".to_string(),
            ));
        }
        let params = self.config.categories.params(category);
        self.treasury.check_create(category, params, amount)?;

        let id = self.proposals.create(
            proposer,
            category,
            recipient,
            amount,
            description,
            now,
            self.config.voting_period,
        );
        tracing::info!(
            id,
            proposer = %proposer,
            category = category.name(),
            amount,
            "proposal created"
        );
        Ok(id)
    }

    /// Cast a ballot weighted by the voter's own stake.
    ///
    /// Delegated power is never folded in; the weight is always the
    /// integer square root of the voter's own stake.
    pub fn vote(
        &mut self,
        id: u64,
        voter: MemberId,
        choice: VoteChoice,
        now: Height,
    ) -> Result<(), GovernanceError> {
        let weight = self.ledger.voting_power_of(&voter);
        let proposal = self.proposals.get_mut(id)?;
        proposal.cast_vote(voter, choice, weight, now)?;
        tracing::debug!(id, voter = %voter, weight, ?choice, "ballot recorded");
        Ok(())
    }

    /// Queue a passed proposal behind its category timelock.
    ///
    /// A second call fails: the derived state is then `Queued`, not the
    /// passed value.
    pub fn queue_proposal(&mut self, id: u64, now: Height) -> Result<(), GovernanceError> {
        let state = self.proposal_state(id, now)?;
        if state != ProposalState::Pending {
            return Err(GovernanceError::InvalidStateTransition(format!(
                "cannot queue a proposal in state {:?}",
                state
            )));
        }

        let proposal = self.proposals.get_mut(id)?;
        proposal.queued_at = Some(now);
        tracing::info!(id, queued_at = now, "proposal queued");
        Ok(())
    }

    /// Execute a queued proposal once its timelock has elapsed.
    ///
    /// The treasury transfer happens first; only on success is the
    /// proposal marked executed, so a failed transfer leaves the
    /// proposal queued and the balance untouched.
    ///
    /// # Errors
    /// - `Unauthorized` without the Executor role
    /// - `InvalidStateTransition` outside the Queued state or before the
    ///   timelock elapses
    /// - `TransferFailed` if the balance no longer covers the amount
    pub fn execute_proposal(
        &mut self,
        caller: MemberId,
        id: u64,
        now: Height,
    ) -> Result<(), GovernanceError> {
        if !self.roles.has(&caller, Role::Executor) {
            return Err(GovernanceError::Unauthorized(
                "execution requires the Executor role".to_string(),
            ));
        }

        let state = self.proposal_state(id, now)?;
        if state != ProposalState::Queued {
            return Err(GovernanceError::InvalidStateTransition(format!(
                "cannot execute a proposal in state {:?}",
                state
            )));
        }

        let (category, recipient, amount, queued_at) = {
            let proposal = self.proposals.get(id)?;
            (
                proposal.category,
                proposal.recipient,
                proposal.amount,
                // Queued state guarantees the timestamp is present
                proposal.queued_at.unwrap_or(now),
            )
        };

        let delay = self.config.categories.params(category).timelock_blocks;
        let timelock = TimelockEntry::new(queued_at, delay);
        if !timelock.is_ready(now) {
            return Err(GovernanceError::InvalidStateTransition(format!(
                "timelock not elapsed: executable at height {}",
                timelock.executable_at()
            )));
        }

        // Move the funds first. If this fails the proposal stays queued.
        self.treasury.transfer(id, category, recipient, amount, now)?;

        let proposal = self.proposals.get_mut(id)?;
        proposal.executed = true;
        proposal.executed_at = Some(now);
        tracing::info!(
            id,
            recipient = %recipient,
            amount,
            balance = self.treasury.balance(),
            "proposal executed"
        );
        Ok(())
    }

    /// Cancel a non-terminal proposal. Guardian only; permitted at any
    /// point before execution, including during the timelock.
    pub fn cancel_proposal(
        &mut self,
        caller: MemberId,
        id: u64,
        now: Height,
    ) -> Result<(), GovernanceError> {
        if !self.roles.has(&caller, Role::Guardian) {
            return Err(GovernanceError::Unauthorized(
                "cancellation requires the Guardian role".to_string(),
            ));
        }

        let proposal = self.proposals.get_mut(id)?;
        if proposal.executed {
            return Err(GovernanceError::InvalidStateTransition(
                "cannot cancel an executed proposal".to_string(),
            ));
        }
        if proposal.cancelled {
            return Err(GovernanceError::InvalidStateTransition(
                "proposal is already cancelled".to_string(),
            ));
        }

        proposal.cancelled = true;
        tracing::info!(id, at = now, "proposal cancelled");
        Ok(())
    }

    /// Derived state of a proposal at the given height, against live
    /// aggregate stake.
    pub fn proposal_state(&self, id: u64, now: Height) -> Result<ProposalState, GovernanceError> {
        let proposal = self.proposals.get(id)?;
        let params = self.config.categories.params(proposal.category);
        Ok(proposal.derive_state(now, self.ledger.total_stake(), params))
    }

    /// A member's current voting power.
    pub fn voting_power_of(&self, member: &MemberId) -> Amount {
        self.ledger.voting_power_of(member)
    }

    /// A member's ledger record.
    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.ledger.member(id)
    }

    /// A proposal record.
    pub fn proposal(&self, id: u64) -> Result<&Proposal, GovernanceError> {
        self.proposals.get(id)
    }

    /// The delegation registry.
    pub fn delegations(&self) -> &DelegationRegistry {
        &self.delegations
    }

    /// The treasury.
    pub fn treasury(&self) -> &TreasuryGuard {
        &self.treasury
    }

    /// Sum of all member stakes.
    pub fn total_stake(&self) -> Amount {
        self.ledger.total_stake()
    }

    /// The immutable engine configuration.
    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }
}
