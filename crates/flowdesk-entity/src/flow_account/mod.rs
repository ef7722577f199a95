//! Flow account domain entities.

pub mod code;
pub mod credential;
pub mod model;
pub mod pool;
pub mod status;

pub use code::AccountCode;
pub use credential::FlowCredential;
pub use model::{FLOW_ACCOUNT_CAPACITY, FlowAccount};
pub use pool::PoolStatus;
pub use status::AccountStatus;
