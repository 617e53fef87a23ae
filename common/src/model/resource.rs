use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Compute-instance metadata resolved during enrichment.
///
/// Absent entirely when the compute-metadata provider cannot resolve the
/// resource; individual fields are optional because providers differ in what
/// they expose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetadata {
    pub id: String,
    pub display_name: String,
    /// Account, project or compartment the resource belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouping: Option<String>,
    /// Instance size/type, e.g. `VM.Standard.E4.Flex` or `t3.large`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Namespaced tags, keyed by namespace then tag name.
    #[serde(default)]
    pub structured_tags: HashMap<String, HashMap<String, String>>,
}
