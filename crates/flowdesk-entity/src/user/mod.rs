//! User domain entities.

pub mod duration;
pub mod model;
pub mod status;

pub use duration::SubscriptionDuration;
pub use model::{NewUser, User};
pub use status::UserStatus;
