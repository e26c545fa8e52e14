//! JSON configuration documents
//!
//! ```json
//! { "resources": [ { "type": "azurerm_media_transform", "name": "example",
//!                    "id": "/subscriptions/...", "attributes": { ... } } ] }
//! ```
//!
//! Nested blocks are written as arrays of objects.

use std::fs;
use std::path::Path;

use azurerm_core::resource::{Attributes, Resource, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    /// ARM ID once the resource exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl ResourceConfig {
    pub fn to_resource(&self) -> Resource {
        let attributes: Attributes = self
            .attributes
            .iter()
            .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
            .collect();
        Resource::new(&self.resource_type, &self.name).with_attributes(attributes)
    }
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let config: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| format!("Parse error in {}: {}", path.display(), e))?;
        config.check_unique_addresses()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, content + "\n")
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))
    }

    fn check_unique_addresses(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for r in &self.resources {
            if !seen.insert((r.resource_type.as_str(), r.name.as_str())) {
                return Err(format!(
                    "duplicate resource {}.{}",
                    r.resource_type, r.name
                ));
            }
        }
        Ok(())
    }
}
