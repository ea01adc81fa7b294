//! Sky Core Types
//!
//! Domain records, API error model and batch result types shared by the
//! storage, push and HTTP layers.

mod batch;
mod device;
mod error;
mod notification;
mod user;

pub use batch::*;
pub use device::*;
pub use error::*;
pub use notification::*;
pub use user::*;
