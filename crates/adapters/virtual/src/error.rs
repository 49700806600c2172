//! Errors raised by the simulated platform.

use mistguard_domain::error::MistguardError;
use mistguard_domain::id::DeviceKey;

#[derive(Debug, thiserror::Error)]
pub enum VirtualError {
    /// The platform was switched offline.
    #[error("virtual platform is offline")]
    Offline,

    /// Commands are being refused on purpose.
    #[error("virtual platform rejected command for {0}")]
    Rejected(DeviceKey),

    /// No switch is registered under this key.
    #[error("unknown virtual device {0}")]
    UnknownDevice(DeviceKey),
}

impl From<VirtualError> for MistguardError {
    fn from(err: VirtualError) -> Self {
        Self::Platform(Box::new(err))
    }
}
