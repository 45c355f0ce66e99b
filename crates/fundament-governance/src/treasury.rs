//! Treasury balance and per-category limit enforcement.
//!
//! Holds the single native-value balance of the pool. Limits are checked
//! at proposal creation and the balance is re-validated at execution
//! time, because other executed proposals may have shrunk it since.

use std::collections::HashMap;

use fundament_types::{Amount, Height, MemberId};

use crate::error::GovernanceError;
use crate::proposal::{CategoryParams, ProposalCategory};

/// A recorded outbound transfer.
#[derive(Debug, Clone)]
pub struct Disbursement {
    /// Executed proposal that authorized the transfer
    pub proposal_id: u64,
    /// Transfer recipient
    pub recipient: MemberId,
    /// Amount moved
    pub amount: Amount,
    /// Height of execution
    pub height: Height,
}

/// Pool balance plus spend tracking.
#[derive(Debug, Default)]
pub struct TreasuryGuard {
    balance: Amount,
    spent_by_category: HashMap<ProposalCategory, Amount>,
    disbursements: Vec<Disbursement>,
}

impl TreasuryGuard {
    /// Create an empty treasury.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a treasury seeded with an opening balance.
    pub fn with_balance(balance: Amount) -> Self {
        Self {
            balance,
            ..Self::default()
        }
    }

    /// Credit the pool.
    ///
    /// # Errors
    /// - `InvalidInput` for a zero amount or balance overflow
    pub fn fund(&mut self, amount: Amount) -> Result<(), GovernanceError> {
        if amount == 0 {
            return Err(GovernanceError::InvalidInput(
                "funding amount must be positive".to_string(),
            ));
        }
        self.balance = self.balance.checked_add(amount).ok_or_else(|| {
            GovernanceError::InvalidInput("funding overflows treasury balance".to_string())
        })?;
        Ok(())
    }

    /// Validate a proposal amount at creation time.
    ///
    /// # Errors
    /// - `InvalidInput` for a zero amount
    /// - `ResourceExhausted` above the category limit or current balance
    pub fn check_create(
        &self,
        category: ProposalCategory,
        params: &CategoryParams,
        amount: Amount,
    ) -> Result<(), GovernanceError> {
        if amount == 0 {
            return Err(GovernanceError::InvalidInput(
                "proposal amount must be positive".to_string(),
            ));
        }
        if amount > params.treasury_limit {
            return Err(GovernanceError::ResourceExhausted(format!(
                "amount {} exceeds {} category limit {}",
                amount,
                category.name(),
                params.treasury_limit
            )));
        }
        if amount > self.balance {
            return Err(GovernanceError::ResourceExhausted(format!(
                "amount {} exceeds treasury balance {}",
                amount, self.balance
            )));
        }
        Ok(())
    }

    /// Move funds out of the pool at execution time.
    ///
    /// Re-validates the balance; the check at creation time does not
    /// carry over.
    ///
    /// # Errors
    /// - `TransferFailed` if the recipient is the zero identity or the
    ///   balance no longer covers the amount
    pub fn transfer(
        &mut self,
        proposal_id: u64,
        category: ProposalCategory,
        recipient: MemberId,
        amount: Amount,
        height: Height,
    ) -> Result<(), GovernanceError> {
        if recipient.is_zero() {
            return Err(GovernanceError::TransferFailed(
                "recipient identity is zero".to_string(),
            ));
        }
        if amount > self.balance {
            return Err(GovernanceError::TransferFailed(format!(
                "amount {} exceeds treasury balance {}",
                amount, self.balance
            )));
        }

        self.balance -= amount;
        *self.spent_by_category.entry(category).or_insert(0) += amount;
        self.disbursements.push(Disbursement {
            proposal_id,
            recipient,
            amount,
            height,
        });

        Ok(())
    }

    /// Current pool balance.
    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Cumulative spend in a category.
    pub fn spent_in(&self, category: ProposalCategory) -> Amount {
        self.spent_by_category.get(&category).copied().unwrap_or(0)
    }

    /// All outbound transfers, oldest first.
    pub fn disbursements(&self) -> &[Disbursement] {
        &self.disbursements
    }
}
