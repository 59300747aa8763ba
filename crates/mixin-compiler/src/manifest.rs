/// Manifest listing the categories written for one input

use crate::compose::GeneratedExtension;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// File name of the manifest inside the output directory
pub const MANIFEST_FILE: &str = "mixins.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixinManifest {
    /// File name of the compiled input
    pub source: String,
    pub extensions: Vec<ExtensionEntry>,
}

/// One generated category and the files holding it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionEntry {
    pub owner: String,
    pub member: String,
    pub source_type: String,
    pub category: String,
    pub header: String,
    pub implementation: String,
}

impl MixinManifest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            extensions: Vec::new(),
        }
    }

    pub fn add(&mut self, extension: &GeneratedExtension) {
        let stem = file_stem(extension);
        self.extensions.push(ExtensionEntry {
            owner: extension.owner.clone(),
            member: extension.member.clone(),
            source_type: extension.source_type.clone(),
            category: extension.identifier.clone(),
            header: format!("{}.h", stem),
            implementation: format!("{}.m", stem),
        });
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// `Owner+category`, the conventional category file name
pub fn file_stem(extension: &GeneratedExtension) -> String {
    format!("{}+{}", extension.owner, extension.identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_entries_and_json() {
        let extension = GeneratedExtension {
            owner: "User".to_string(),
            source_type: "Helper".to_string(),
            member: "mws".to_string(),
            identifier: "mixin_property_mws_Helper".to_string(),
            declaration: String::new(),
            definition: String::new(),
        };

        let mut manifest = MixinManifest::new("User.h");
        manifest.add(&extension);

        let entry = &manifest.extensions[0];
        assert_eq!(entry.header, "User+mixin_property_mws_Helper.h");
        assert_eq!(entry.implementation, "User+mixin_property_mws_Helper.m");

        let json = manifest.to_json().unwrap();
        assert!(json.contains("\"sourceType\": \"Helper\""));
        assert_eq!(MixinManifest::from_json(&json).unwrap(), manifest);
    }
}
