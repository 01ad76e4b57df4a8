//! 2FA lifecycle: status, provisioning, enable, disable. A thin façade over
//! the gateway with no state machine beyond the at-most-one provisioning
//! material held between setup and enable. Enabling or disabling 2FA never
//! changes session state.

use crate::api::{error::ApiError, types::TwoFactorStatus, Gateway};
use secrecy::SecretString;
use std::sync::Arc;

/// Enrollment material returned once per setup call. The secret stays in
/// memory only; `SecretString` keeps it out of `Debug` output and logs. The
/// provisioning URI embeds the same secret and is handed to the caller solely
/// for authenticator import.
pub struct ProvisioningMaterial {
    pub secret: SecretString,
    pub provisioning_uri: String,
}

pub struct TwoFactorController {
    gateway: Arc<Gateway>,
    material: Option<ProvisioningMaterial>,
}

impl TwoFactorController {
    #[must_use]
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            material: None,
        }
    }

    /// Current enablement flag, refetched on demand and never cached.
    ///
    /// # Errors
    /// `Unauthorized` without a session, `Generic` otherwise; failures do not
    /// affect session state.
    pub async fn status(&self) -> Result<TwoFactorStatus, ApiError> {
        self.gateway.two_fa_status().await
    }

    /// Generate fresh provisioning material. Calling this again before
    /// `enable` is allowed and yields a new secret; the prior material is
    /// discarded on overwrite. Invalidation of older secrets is the server's
    /// concern.
    ///
    /// # Errors
    /// `Unauthorized` without a session.
    pub async fn setup(&mut self) -> Result<&ProvisioningMaterial, ApiError> {
        let response = self.gateway.two_fa_setup().await?;
        Ok(self.material.insert(ProvisioningMaterial {
            secret: SecretString::from(response.secret),
            provisioning_uri: response.provisioning_uri,
        }))
    }

    /// The material held since the last `setup`, if any.
    #[must_use]
    pub fn material(&self) -> Option<&ProvisioningMaterial> {
        self.material.as_ref()
    }

    /// Confirm enrollment with a 6-8 digit code. Failure leaves the status
    /// untouched and is reported verbatim; success discards the held
    /// material, which has served its purpose.
    ///
    /// # Errors
    /// `Unauthorized` or `Validation` when the server rejects the code.
    pub async fn enable(&mut self, code: &str) -> Result<(), ApiError> {
        self.gateway.two_fa_enable(code).await?;
        self.material = None;
        Ok(())
    }

    /// Disable 2FA. A valid code is required even while enabled, so a
    /// hijacked but uncoded session cannot silently downgrade the account.
    ///
    /// # Errors
    /// `Unauthorized` or `Validation` when the server rejects the code.
    pub async fn disable(&mut self, code: &str) -> Result<(), ApiError> {
        self.gateway.two_fa_disable(code).await?;
        Ok(())
    }
}
