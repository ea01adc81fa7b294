//! Dispatcher selection.

use color_eyre::eyre::WrapErr as _;
use sky_core::{Device, Mapper};
use sky_push::{ApnsDispatcher, Dispatcher, LogDispatcher};

use crate::config::ApnsConfig;

/// The dispatcher chosen by configuration.
pub enum ConfiguredDispatcher {
    Apns(ApnsDispatcher),
    Log(LogDispatcher),
}

impl ConfiguredDispatcher {
    pub fn from_config(apns: Option<&ApnsConfig>) -> color_eyre::eyre::Result<Self> {
        let Some(apns) = apns else {
            tracing::warn!("no push provider configured, notifications will only be logged");
            return Ok(Self::Log(LogDispatcher));
        };

        let certificate = std::fs::read(&apns.certificate).wrap_err_with(|| {
            format!("failed to read APNs certificate {}", apns.certificate.display())
        })?;

        let dispatcher = if apns.sandbox {
            ApnsDispatcher::sandbox(&certificate, &apns.password, &apns.topic)?
        } else {
            ApnsDispatcher::new(&certificate, &apns.password, &apns.topic)?
        };

        tracing::info!(topic = %apns.topic, sandbox = apns.sandbox, "APNs dispatcher ready");
        Ok(Self::Apns(dispatcher))
    }
}

impl Dispatcher for ConfiguredDispatcher {
    async fn send(&self, device: &Device, message: &dyn Mapper) -> color_eyre::eyre::Result<()> {
        match self {
            Self::Apns(apns) => apns.send(device, message).await,
            Self::Log(log) => log.send(device, message).await,
        }
    }
}
