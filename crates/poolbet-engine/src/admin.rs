//! Single administrator role.
//!
//! Exactly one identity holds the role at any time. It is set to the
//! deployer at construction and can only be handed over by the current
//! holder. Authorization is a plain equality check.

use poolbet_types::{Identity, PoolbetError, Result};

/// Holder of the administrator role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRole {
    holder: Identity,
}

impl AdminRole {
    /// Create the role with `deployer` as first holder.
    ///
    /// # Errors
    /// Returns [`PoolbetError::InvalidIdentity`] for the zero identity.
    pub fn new(deployer: Identity) -> Result<Self> {
        if deployer.is_zero() {
            return Err(PoolbetError::InvalidIdentity(deployer));
        }
        Ok(Self { holder: deployer })
    }

    #[must_use]
    pub fn holder(&self) -> Identity {
        self.holder
    }

    /// Gate for privileged calls.
    ///
    /// # Errors
    /// Returns [`PoolbetError::Unauthorized`] unless `caller` is the holder.
    pub fn ensure(&self, caller: Identity) -> Result<()> {
        if caller == self.holder {
            Ok(())
        } else {
            tracing::warn!(
                caller = %caller,
                administrator = %self.holder.short(),
                "Privileged call rejected"
            );
            Err(PoolbetError::Unauthorized { caller })
        }
    }

    /// Check that `caller` may hand the role to `new_admin`, without changing anything.
    pub fn check_transfer(&self, caller: Identity, new_admin: Identity) -> Result<()> {
        self.ensure(caller)?;
        if new_admin.is_zero() {
            return Err(PoolbetError::InvalidIdentity(new_admin));
        }
        Ok(())
    }

    /// Replace the holder. Returns the previous holder.
    pub fn transfer(&mut self, caller: Identity, new_admin: Identity) -> Result<Identity> {
        self.check_transfer(caller, new_admin)?;
        Ok(std::mem::replace(&mut self.holder, new_admin))
    }
}
