//! Azurerm Core
//!
//! Core library shared by the Azure provider: the declarative state model,
//! attribute schemas, the provider trait and the ARM resource-ID codec

pub mod arm_id;
pub mod attrs;
pub mod provider;
pub mod resource;
pub mod schema;
