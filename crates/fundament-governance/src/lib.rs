//! Fundament Governance - governance engine for a pooled investment fund.
//!
//! This crate provides:
//! - Stake accounting with square-root vote weighting
//! - Proposal lifecycle with lazily-derived state
//! - Per-category timelocks and treasury limits
//! - Delegation intent tracking and role capabilities

pub mod delegation;
pub mod engine;
pub mod error;
pub mod membership;
pub mod proposal;
pub mod roles;
pub mod timelock;
pub mod treasury;
pub mod voting;

pub use delegation::{Delegation, DelegationRegistry};
pub use engine::{GovernanceConfig, GovernanceEngine};
pub use error::GovernanceError;
pub use membership::{Member, MembershipLedger};
pub use proposal::{
    Ballot, CategoryParams, CategoryTable, Proposal, ProposalCategory, ProposalState, VoteChoice,
};
pub use roles::{Role, RoleRegistry};
pub use timelock::TimelockEntry;
pub use treasury::{Disbursement, TreasuryGuard};
pub use voting::{integer_sqrt, voting_power};
