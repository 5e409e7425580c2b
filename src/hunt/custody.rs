//! Custody of pooled stake and the all-or-nothing prize payout.
//!
//! The pool is a single balance fed by every stake and by unconditional
//! funding. A win drains the entire balance to the winner through an injected
//! [`FundTransfer`] sink; the balance read, the transfer, and the zeroing all
//! happen under one guard, so no other settlement can observe or drain the
//! pool in between, and a failed transfer leaves the balance untouched.

use crate::errors::{HuntError, HuntResult};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Transfer sink error types
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("recipient {0} rejected the transfer")]
    Rejected(String),

    #[error("transfer failed: {0}")]
    Failed(String),
}

/// Destination for outgoing prize transfers
#[async_trait]
pub trait FundTransfer: Send + Sync {
    /// Move `amount` to `to`; an error must leave the recipient uncredited
    async fn transfer(&self, to: &str, amount: u64) -> Result<(), TransferError>;
}

/// In-memory account book, the provided [`FundTransfer`] implementation
pub struct MemoryVault {
    accounts: DashMap<String, u64>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Total credited to one recipient so far
    pub fn balance_of(&self, who: &str) -> u64 {
        self.accounts.get(who).map(|b| *b).unwrap_or(0)
    }

    /// Sum over all recipients
    pub fn total_credited(&self) -> u64 {
        self.accounts.iter().map(|entry| *entry.value()).sum()
    }
}

impl Default for MemoryVault {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FundTransfer for MemoryVault {
    async fn transfer(&self, to: &str, amount: u64) -> Result<(), TransferError> {
        let mut entry = self.accounts.entry(to.to_string()).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| TransferError::Failed(format!("account balance overflow for {}", to)))?;
        Ok(())
    }
}

/// Pooled prize balance
pub struct FundCustody {
    balance: Mutex<u64>,
    sink: Arc<dyn FundTransfer>,
}

impl FundCustody {
    pub fn new(sink: Arc<dyn FundTransfer>) -> Self {
        Self {
            balance: Mutex::new(0),
            sink,
        }
    }

    /// Credit the pool; returns the new balance
    pub async fn deposit(&self, amount: u64) -> HuntResult<u64> {
        let mut balance = self.balance.lock().await;
        *balance = balance.checked_add(amount).ok_or(HuntError::PoolOverflow)?;
        Ok(*balance)
    }

    /// Current pool balance
    pub async fn balance(&self) -> u64 {
        *self.balance.lock().await
    }

    /// Transfer the entire current balance to `to` and zero the pool.
    ///
    /// The guard is held across the sink call: on transfer failure the
    /// balance is left exactly as it was (no partial drain).
    pub async fn pay_all(&self, to: &str) -> HuntResult<u64> {
        let mut balance = self.balance.lock().await;
        let amount = *balance;
        self.sink.transfer(to, amount).await?;
        *balance = 0;
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RejectingSink;

    #[async_trait]
    impl FundTransfer for RejectingSink {
        async fn transfer(&self, to: &str, _amount: u64) -> Result<(), TransferError> {
            Err(TransferError::Rejected(to.to_string()))
        }
    }

    #[tokio::test]
    async fn test_deposit_accumulates() {
        let custody = FundCustody::new(Arc::new(MemoryVault::new()));
        assert_eq!(custody.deposit(100).await.expect("deposit"), 100);
        assert_eq!(custody.deposit(50).await.expect("deposit"), 150);
        assert_eq!(custody.balance().await, 150);
    }

    #[tokio::test]
    async fn test_pay_all_drains_to_recipient() {
        let vault = Arc::new(MemoryVault::new());
        let custody = FundCustody::new(vault.clone());
        custody.deposit(150).await.expect("deposit");

        let paid = custody.pay_all("alice").await.expect("payout");
        assert_eq!(paid, 150);
        assert_eq!(custody.balance().await, 0);
        assert_eq!(vault.balance_of("alice"), 150);
    }

    #[tokio::test]
    async fn test_failed_transfer_leaves_balance() {
        let custody = FundCustody::new(Arc::new(RejectingSink));
        custody.deposit(99).await.expect("deposit");

        let err = custody.pay_all("alice").await.expect_err("must fail");
        assert!(matches!(
            err,
            HuntError::Transfer(TransferError::Rejected(_))
        ));
        assert_eq!(custody.balance().await, 99);
    }

    #[tokio::test]
    async fn test_deposit_overflow_rejected() {
        let custody = FundCustody::new(Arc::new(MemoryVault::new()));
        custody.deposit(u64::MAX).await.expect("deposit");

        let err = custody.deposit(1).await.expect_err("must overflow");
        assert!(matches!(err, HuntError::PoolOverflow));
        assert_eq!(custody.balance().await, u64::MAX);
    }

    #[tokio::test]
    async fn test_pool_conservation() {
        let vault = Arc::new(MemoryVault::new());
        let custody = FundCustody::new(vault.clone());

        let mut deposited = 0u64;
        let mut paid = 0u64;
        for (i, amount) in [100u64, 250, 7, 42].iter().enumerate() {
            custody.deposit(*amount).await.expect("deposit");
            deposited += amount;
            if i % 2 == 1 {
                paid += custody.pay_all("winner").await.expect("payout");
            }
            assert_eq!(custody.balance().await, deposited - paid);
        }
        assert_eq!(vault.balance_of("winner"), paid);
    }
}
