//! Privileged-caller gate.
//!
//! Minting and administrative reconfiguration are restricted to callers the
//! gate recognises. The expiring ledger only ever asks
//! [`AccessControl::require_authorized`]; how authority is granted is the
//! gate's business.

use std::collections::HashSet;

use lapse_types::{AccountId, LapseError, Result};

/// Decides whether a caller may perform privileged operations.
pub trait AccessControl {
    /// Returns `Ok(())` if `caller` is privileged.
    ///
    /// # Errors
    /// Returns [`LapseError::Unauthorized`] otherwise.
    fn require_authorized(&self, caller: AccountId) -> Result<()>;
}

/// Owner-plus-minters gate.
///
/// The owner is always authorized and may grant or revoke minter rights and
/// hand ownership to another account.
#[derive(Debug, Clone)]
pub struct OwnerGate {
    owner: AccountId,
    minters: HashSet<AccountId>,
}

impl OwnerGate {
    /// Create a gate where only `owner` is authorized.
    #[must_use]
    pub fn new(owner: AccountId) -> Self {
        Self {
            owner,
            minters: HashSet::new(),
        }
    }

    /// The current owner.
    #[must_use]
    pub fn owner(&self) -> AccountId {
        self.owner
    }

    /// Whether `account` is privileged (owner or minter).
    #[must_use]
    pub fn is_authorized(&self, account: AccountId) -> bool {
        account == self.owner || self.minters.contains(&account)
    }

    /// Give `minter` mint rights. Owner only.
    ///
    /// # Errors
    /// Returns `Unauthorized` if `caller` is not the owner.
    pub fn grant_minter(&mut self, caller: AccountId, minter: AccountId) -> Result<()> {
        self.require_owner(caller)?;
        if self.minters.insert(minter) {
            tracing::info!(minter = %minter, "Minter granted");
        }
        Ok(())
    }

    /// Remove `minter`'s mint rights. Owner only.
    ///
    /// # Errors
    /// Returns `Unauthorized` if `caller` is not the owner.
    pub fn revoke_minter(&mut self, caller: AccountId, minter: AccountId) -> Result<()> {
        self.require_owner(caller)?;
        if self.minters.remove(&minter) {
            tracing::info!(minter = %minter, "Minter revoked");
        }
        Ok(())
    }

    /// Hand ownership to `new_owner`. Owner only.
    ///
    /// # Errors
    /// Returns `Unauthorized` if `caller` is not the owner.
    pub fn transfer_ownership(&mut self, caller: AccountId, new_owner: AccountId) -> Result<()> {
        self.require_owner(caller)?;
        tracing::info!(from = %self.owner, to = %new_owner, "Ownership transferred");
        self.owner = new_owner;
        Ok(())
    }

    fn require_owner(&self, caller: AccountId) -> Result<()> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(LapseError::Unauthorized { caller })
        }
    }
}

impl AccessControl for OwnerGate {
    fn require_authorized(&self, caller: AccountId) -> Result<()> {
        if self.is_authorized(caller) {
            Ok(())
        } else {
            tracing::warn!(caller = %caller, "Privileged call rejected");
            Err(LapseError::Unauthorized { caller })
        }
    }
}
