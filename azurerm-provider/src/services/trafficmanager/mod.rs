//! Traffic Manager

mod endpoint;
pub mod ids;
pub mod models;
mod profile;
pub mod validate;

pub use endpoint::TrafficManagerEndpoint;
pub use profile::TrafficManagerProfile;
