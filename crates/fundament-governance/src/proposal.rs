//! Proposal lifecycle management.
//!
//! A proposal's state is never stored. It is derived on every query from
//! the raw record plus the caller-supplied height and the live aggregate
//! stake, so repeated calls may legitimately return different answers:
//! quorum is recomputed against current stake, and a passed proposal can
//! later report Defeated if aggregate stake grew in the interim.

use std::collections::HashMap;

use fundament_types::{Amount, Height, MemberId};

use crate::error::GovernanceError;

/// Spending category for a proposal, fixed at engine initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProposalCategory {
    /// Large, long-deliberation capital allocation
    HighConviction,
    /// Small speculative allocation
    ExperimentalBet,
    /// Routine operating cost
    OperationalExpense,
}

impl ProposalCategory {
    /// Get category name.
    pub fn name(&self) -> &'static str {
        match self {
            ProposalCategory::HighConviction => "High Conviction",
            ProposalCategory::ExperimentalBet => "Experimental Bet",
            ProposalCategory::OperationalExpense => "Operational Expense",
        }
    }
}

/// Thresholds bound to a category.
#[derive(Debug, Clone)]
pub struct CategoryParams {
    /// Minimum share of cast weight that must be For, in percent
    pub approval_threshold_pct: u8,
    /// Minimum total ballot weight as a share of current aggregate stake, in percent
    pub quorum_pct: u8,
    /// Maximum amount a single proposal in this category may move
    pub treasury_limit: Amount,
    /// Mandatory wait between queueing and execution, in blocks
    pub timelock_blocks: u64,
}

/// Immutable per-category threshold table, fixed at engine construction.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    pub high_conviction: CategoryParams,
    pub experimental_bet: CategoryParams,
    pub operational_expense: CategoryParams,
}

impl CategoryTable {
    /// Parameters for a category.
    pub fn params(&self, category: ProposalCategory) -> &CategoryParams {
        match category {
            ProposalCategory::HighConviction => &self.high_conviction,
            ProposalCategory::ExperimentalBet => &self.experimental_bet,
            ProposalCategory::OperationalExpense => &self.operational_expense,
        }
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self {
            high_conviction: CategoryParams {
                approval_threshold_pct: 60,
                quorum_pct: 30,
                treasury_limit: 500_000,
                timelock_blocks: 28_800, // ~2 days at 6s blocks
            },
            experimental_bet: CategoryParams {
                approval_threshold_pct: 50,
                quorum_pct: 20,
                treasury_limit: 50_000,
                timelock_blocks: 14_400, // ~1 day
            },
            operational_expense: CategoryParams {
                approval_threshold_pct: 40,
                quorum_pct: 25,
                treasury_limit: 10_000,
                timelock_blocks: 4_800, // ~8 hours
            },
        }
    }
}

/// Ballot choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChoice {
    /// In favor
    For,
    /// Against
    Against,
    /// Counts toward quorum but not approval
    Abstain,
}

/// A recorded ballot. Immutable once cast.
#[derive(Debug, Clone)]
pub struct Ballot {
    pub choice: VoteChoice,
    pub weight: Amount,
    pub cast_at: Height,
}

/// Derived proposal state.
///
/// `Pending` is overloaded: its name reads "voting not started", but the
/// pre-start interval actually reports `Active` (step 4 of the derivation),
/// and `Pending` is what a closed, quorum-passing, approval-passing
/// proposal reports while it waits to be queued. There is no distinct
/// Succeeded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalState {
    /// Voting closed with quorum and approval both met; awaiting queue
    Pending,
    /// Inside (or before) the voting window
    Active,
    /// Voting closed below quorum, or below the approval threshold
    Defeated,
    /// Queued behind the category timelock
    Queued,
    /// Funds moved; terminal
    Executed,
    /// Cancelled by the guardian; terminal
    Cancelled,
}

impl ProposalState {
    /// Terminal states permit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalState::Executed | ProposalState::Cancelled)
    }
}

/// A treasury-transfer proposal.
#[derive(Debug, Clone)]
pub struct Proposal {
    /// Unique sequential id
    pub id: u64,
    /// Member who created the proposal
    pub proposer: MemberId,
    /// Spending category
    pub category: ProposalCategory,
    /// Transfer recipient
    pub recipient: MemberId,
    /// Amount to transfer, in base units
    pub amount: Amount,
    /// Free-form description
    pub description: String,
    /// Height when voting opens
    pub voting_start: Height,
    /// Height when voting closes (inclusive)
    pub voting_end: Height,
    /// For votes (sum of voter weights)
    pub for_votes: Amount,
    /// Against votes (sum of voter weights)
    pub against_votes: Amount,
    /// Abstain votes (sum of voter weights)
    pub abstain_votes: Amount,
    /// Height when queued, set exactly once
    pub queued_at: Option<Height>,
    /// Height when executed, set exactly once
    pub executed_at: Option<Height>,
    /// Whether funds were moved
    pub executed: bool,
    /// Whether the guardian cancelled the proposal
    pub cancelled: bool,
    /// Recorded ballots, insertion-only
    pub ballots: HashMap<MemberId, Ballot>,
}

impl Proposal {
    /// Create a new proposal. Voting opens at `now + 1` and closes at
    /// `now + voting_period`.
    pub fn new(
        id: u64,
        proposer: MemberId,
        category: ProposalCategory,
        recipient: MemberId,
        amount: Amount,
        description: String,
        now: Height,
        voting_period: u64,
    ) -> Self {
        Self {
            id,
            proposer,
            category,
            recipient,
            amount,
            description,
            voting_start: now + 1,
            voting_end: now + voting_period,
            for_votes: 0,
            against_votes: 0,
            abstain_votes: 0,
            queued_at: None,
            executed_at: None,
            executed: false,
            cancelled: false,
            ballots: HashMap::new(),
        }
    }

    /// Cast a ballot with a precomputed weight.
    ///
    /// # Errors
    /// - `InvalidStateTransition` outside the voting window, on a
    ///   terminal or queued proposal, or on a duplicate ballot
    ///   (tallies untouched)
    /// - `Unauthorized` for zero weight
    pub fn cast_vote(
        &mut self,
        voter: MemberId,
        choice: VoteChoice,
        weight: Amount,
        now: Height,
    ) -> Result<(), GovernanceError> {
        if self.cancelled || self.executed || self.queued_at.is_some() {
            return Err(GovernanceError::InvalidStateTransition(
                "voting is closed".to_string(),
            ));
        }
        if now < self.voting_start || now > self.voting_end {
            return Err(GovernanceError::InvalidStateTransition(format!(
                "height {} is outside the voting window [{}, {}]",
                now, self.voting_start, self.voting_end
            )));
        }
        if self.ballots.contains_key(&voter) {
            return Err(GovernanceError::InvalidStateTransition(
                "member has already voted on this proposal".to_string(),
            ));
        }
        if weight == 0 {
            return Err(GovernanceError::Unauthorized(
                "voting requires nonzero stake".to_string(),
            ));
        }

        let tally = match choice {
            VoteChoice::For => &mut self.for_votes,
            VoteChoice::Against => &mut self.against_votes,
            VoteChoice::Abstain => &mut self.abstain_votes,
        };
        *tally = tally.checked_add(weight).ok_or_else(|| {
            GovernanceError::InvalidInput("vote tally overflow".to_string())
        })?;

        self.ballots.insert(
            voter,
            Ballot {
                choice,
                weight,
                cast_at: now,
            },
        );

        Ok(())
    }

    /// Derive the current state from stored fields, the caller-supplied
    /// height, and the live aggregate stake. Pure; nothing is cached.
    pub fn derive_state(
        &self,
        now: Height,
        total_stake_now: Amount,
        params: &CategoryParams,
    ) -> ProposalState {
        if self.cancelled {
            return ProposalState::Cancelled;
        }
        if self.executed {
            return ProposalState::Executed;
        }
        if self.queued_at.is_some() {
            return ProposalState::Queued;
        }
        // Covers the pre-start interval too: a proposal whose voting has
        // not technically opened still reports Active.
        if now <= self.voting_end {
            return ProposalState::Active;
        }

        // Voting closed. Quorum is a share of *current* aggregate stake,
        // not a snapshot, so this outcome can change between calls.
        let total_votes = self.total_votes();
        let quorum_required = total_stake_now.saturating_mul(params.quorum_pct as Amount) / 100;
        if total_votes < quorum_required {
            return ProposalState::Defeated;
        }

        let approval_required =
            total_votes.saturating_mul(params.approval_threshold_pct as Amount) / 100;
        if self.for_votes < approval_required {
            return ProposalState::Defeated;
        }

        ProposalState::Pending
    }

    /// Total ballot weight cast.
    pub fn total_votes(&self) -> Amount {
        self.for_votes
            .saturating_add(self.against_votes)
            .saturating_add(self.abstain_votes)
    }

    /// Whether a member has voted.
    pub fn has_voted(&self, voter: &MemberId) -> bool {
        self.ballots.contains_key(voter)
    }

    /// A member's recorded ballot, if any.
    pub fn ballot(&self, voter: &MemberId) -> Option<&Ballot> {
        self.ballots.get(voter)
    }
}

/// Registry of all proposals with a serialized id generator.
#[derive(Debug, Default)]
pub struct ProposalRegistry {
    proposals: HashMap<u64, Proposal>,
    next_id: u64,
}

impl ProposalRegistry {
    /// Create an empty registry. Ids start at 1.
    pub fn new() -> Self {
        Self {
            proposals: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert a new proposal and return its id.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &mut self,
        proposer: MemberId,
        category: ProposalCategory,
        recipient: MemberId,
        amount: Amount,
        description: String,
        now: Height,
        voting_period: u64,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        let proposal = Proposal::new(
            id,
            proposer,
            category,
            recipient,
            amount,
            description,
            now,
            voting_period,
        );
        self.proposals.insert(id, proposal);
        id
    }

    /// Get a proposal.
    pub fn get(&self, id: u64) -> Result<&Proposal, GovernanceError> {
        self.proposals
            .get(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))
    }

    /// Get a proposal mutably.
    pub fn get_mut(&mut self, id: u64) -> Result<&mut Proposal, GovernanceError> {
        self.proposals
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))
    }

    /// All proposals, unordered.
    pub fn all(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    /// Number of proposals ever created.
    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    /// Whether no proposal has been created yet.
    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }
}
