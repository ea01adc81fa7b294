//! Push target resolution.

use sky_core::Device;
use sky_storage::{DeviceStore, Result};

/// What a requested identifier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A single device.
    Device,
    /// Every device owned by a user.
    User,
}

impl TargetKind {
    /// Request field carrying identifiers of this kind.
    pub fn field(self) -> &'static str {
        match self {
            TargetKind::Device => "device_ids",
            TargetKind::User => "user_ids",
        }
    }
}

/// Maps device or user identifiers to concrete devices.
#[derive(Clone)]
pub struct TargetResolver<S> {
    store: S,
}

impl<S: DeviceStore> TargetResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolve one identifier.
    ///
    /// A device identifier yields exactly one device. A user identifier
    /// yields every owned device, and fails once for the user when none exist.
    pub fn resolve(&self, kind: TargetKind, id: &str) -> Result<Vec<Device>> {
        match kind {
            TargetKind::Device => self.store.get_device(id).map(|device| vec![device]),
            TargetKind::User => self.store.query_devices_by_user(id),
        }
    }
}
