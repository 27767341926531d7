//! # RFC 6902 JSON patch bodies.
//!
//! The only write the admitter performs is the evacuation mark:
//! ```text
//! [
//!   { "op": "test", "path": "/status/nodeName",           "value": "<node>" },
//!   { "op": "test", "path": "/status/evacuationNodeName", "value": null     },
//!   { "op": "add",  "path": "/status/evacuationNodeName", "value": "<node>" }
//! ]
//! ```
//! The `test` ops make the write conditional: if the VMI moved off `<node>`
//! or another call marked it since it was read, the store rejects the whole
//! patch. Concurrent duplicates therefore commit at most one mark.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Path of the VMI's current node.
pub const NODE_NAME_PATH: &str = "/status/nodeName";
/// Path of the evacuation mark.
pub const EVACUATION_NODE_NAME_PATH: &str = "/status/evacuationNodeName";

/// A single patch operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    /// Fails the whole patch unless `path` currently equals `value`.
    Test { path: String, value: Value },
    /// Sets `path` to `value`.
    Add { path: String, value: Value },
}

/// Ordered list of patch operations, applied atomically.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonPatch(pub Vec<PatchOp>);

impl JsonPatch {
    /// Builds the evacuation mark for a VMI running on `node`.
    ///
    /// # Example
    /// ```
    /// use eviction_admitter::JsonPatch;
    ///
    /// let body = JsonPatch::mark_for_evacuation("node-a").to_vec().unwrap();
    /// assert_eq!(
    ///     String::from_utf8(body).unwrap(),
    ///     concat!(
    ///         r#"[{"op":"test","path":"/status/nodeName","value":"node-a"},"#,
    ///         r#"{"op":"test","path":"/status/evacuationNodeName","value":null},"#,
    ///         r#"{"op":"add","path":"/status/evacuationNodeName","value":"node-a"}]"#,
    ///     )
    /// );
    /// ```
    pub fn mark_for_evacuation(node: &str) -> Self {
        JsonPatch(vec![
            PatchOp::Test {
                path: NODE_NAME_PATH.to_string(),
                value: Value::String(node.to_string()),
            },
            PatchOp::Test {
                path: EVACUATION_NODE_NAME_PATH.to_string(),
                value: Value::Null,
            },
            PatchOp::Add {
                path: EVACUATION_NODE_NAME_PATH.to_string(),
                value: Value::String(node.to_string()),
            },
        ])
    }

    /// Serializes the patch body.
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn ops(&self) -> &[PatchOp] {
        &self.0
    }
}

/// Options for a patch call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatchOptions {
    /// Validate only (server-side dry run); persist nothing.
    pub dry_run: bool,
}

impl PatchOptions {
    pub fn dry_run(dry_run: bool) -> Self {
        Self { dry_run }
    }
}
