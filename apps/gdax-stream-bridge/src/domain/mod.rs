//! Domain layer: the feed message model and pure policies.
//!
//! Nothing here performs I/O; these types are shared by the feed client,
//! the publisher bridge, and the tests.

pub mod message;
pub mod routing;
pub mod subscription;
