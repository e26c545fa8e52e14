//! Media Services

mod account;
mod content_key_policy;
mod encoder;
pub mod ids;
pub mod models;
mod streaming_policy;
mod transform;
pub mod validate;

pub use account::MediaServicesAccount;
pub use content_key_policy::MediaContentKeyPolicy;
pub use streaming_policy::MediaStreamingPolicy;
pub use transform::MediaTransform;
