// ── State reconciliation ──
//
// Converges the appliance toward the state a command describes. Every
// step follows the same shape: list what exists, skip if already
// converged, mutate, then list again and fail if the post-condition does
// not hold. Nothing is cached between steps.

mod lb;
mod vlan;

pub use lb::{AlgorithmParams, LbAlgorithm, LbProtocol};

use bigip_api::SaveMode;
use tracing::debug;

use crate::appliance::Appliance;
use crate::error::CoreError;

/// Per-command view of one session plus the driver settings that shape
/// object names.
pub struct Reconciler<'a, A: Appliance + ?Sized> {
    appliance: &'a A,
    inline: bool,
    private_interface: &'a str,
}

impl<'a, A: Appliance + ?Sized> Reconciler<'a, A> {
    pub fn new(appliance: &'a A, inline: bool, private_interface: &'a str) -> Self {
        Self {
            appliance,
            inline,
            private_interface,
        }
    }

    /// Persist the running configuration: base level, then high level.
    pub async fn save_configuration(&self) -> Result<(), CoreError> {
        debug!("saving appliance configuration");
        self.appliance
            .save_configuration(SaveMode::BaseLevel)
            .await?;
        self.appliance
            .save_configuration(SaveMode::HighLevel)
            .await?;
        Ok(())
    }
}

/// Fail with a reconciliation error unless `holds`.
fn verify(holds: bool, what: impl FnOnce() -> String) -> Result<(), CoreError> {
    if holds {
        Ok(())
    } else {
        Err(CoreError::reconciliation(what()))
    }
}
