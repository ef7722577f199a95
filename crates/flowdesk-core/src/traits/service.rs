//! Service marker trait.

/// Marker trait for business logic services.
///
/// All services in `flowdesk-service` implement this trait so they can be
/// shared behind `Arc` across tasks.
pub trait Service: Send + Sync + 'static {}
