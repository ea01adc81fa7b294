//! Sky Service Layer
//!
//! Target resolution, batch execution and role management on top of the
//! storage and push layers.

mod batch;
mod push;
mod resolver;
mod roles;

pub use batch::*;
pub use push::*;
pub use resolver::*;
pub use roles::*;
