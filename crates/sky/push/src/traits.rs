//! Dispatch traits.

use sky_core::{Device, Mapper};

/// Delivers one message to one device.
///
/// Implementations are injected where pushes are executed, so tests and
/// alternate providers substitute their own without shared global state.
#[trait_variant::make(Send)]
pub trait Dispatcher: Send + Sync {
    /// Send a rendered message to a device.
    async fn send(&self, device: &Device, message: &dyn Mapper) -> color_eyre::eyre::Result<()>;
}

impl<D: Dispatcher> Dispatcher for std::sync::Arc<D> {
    async fn send(&self, device: &Device, message: &dyn Mapper) -> color_eyre::eyre::Result<()> {
        (**self).send(device, message).await
    }
}
