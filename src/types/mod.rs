//! Shared types

mod clock;
mod error;

pub use clock::{Clock, FixedClock, ManualClock, SystemClock};
pub use error::{AuthError, Result};
