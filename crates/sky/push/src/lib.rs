//! Sky Push Notifications
//!
//! Delivery strategies invoked once per resolved device.

mod apns;
mod log;
mod traits;

pub use apns::*;
pub use log::*;
pub use traits::*;
