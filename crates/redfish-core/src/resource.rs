//! Resource model shared by the store, the read model and the auth layer.
//!
//! A [`Resource`] is the unit of state the server authorizes access to. It
//! carries a per-method access-control list ([`AclByMethod`]), properties that
//! are returned to clients, and private fields that never leave the process.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Opaque identifier of a resource in the store.
pub type ResourceId = Uuid;

// ============================================================================
// Access control
// ============================================================================

/// Mapping from HTTP method to the privileges that grant it.
///
/// Any one listed privilege is enough (OR semantics). A method with no entry
/// is forbidden for everyone. Method names are stored upper-case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AclByMethod(BTreeMap<String, Vec<String>>);

impl AclByMethod {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the privilege list for `method`.
    #[must_use]
    pub fn with<I, S>(mut self, method: &str, privileges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(method, privileges);
        self
    }

    pub fn set<I, S>(&mut self, method: &str, privileges: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.insert(
            method.to_ascii_uppercase(),
            privileges.into_iter().map(Into::into).collect(),
        );
    }

    /// Privileges required for `method`, or `None` when the method has no entry.
    pub fn required(&self, method: &str) -> Option<&[String]> {
        self.0
            .get(method.to_ascii_uppercase().as_str())
            .map(Vec::as_slice)
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Private fields
// ============================================================================

/// Value stored in a resource's private fields.
///
/// `Debug` never prints the content; these hold signing secrets.
#[derive(Clone, PartialEq, Eq)]
pub enum PrivateValue {
    Bytes(Vec<u8>),
    Text(String),
    List(Vec<String>),
}

impl PrivateValue {
    /// Raw bytes of a `Bytes` or `Text` value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PrivateValue::Bytes(b) => Some(b),
            PrivateValue::Text(s) => Some(s.as_bytes()),
            PrivateValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            PrivateValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Debug for PrivateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivateValue::Bytes(b) => write!(f, "Bytes(<{} redacted>)", b.len()),
            PrivateValue::Text(s) => write!(f, "Text(<{} redacted>)", s.len()),
            PrivateValue::List(items) => write!(f, "List(<{} redacted>)", items.len()),
        }
    }
}

// ============================================================================
// Resource
// ============================================================================

/// A resource record as held by the read model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub uri: String,
    pub acl: AclByMethod,
    pub properties: Map<String, Value>,
    /// Never serialized.
    #[serde(skip)]
    pub private: HashMap<String, PrivateValue>,
}

impl Resource {
    pub fn new(id: ResourceId, uri: impl Into<String>) -> Self {
        Self {
            id,
            uri: uri.into(),
            acl: AclByMethod::default(),
            properties: Map::new(),
            private: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_acl(mut self, acl: AclByMethod) -> Self {
        self.acl = acl;
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_private(mut self, key: impl Into<String>, value: PrivateValue) -> Self {
        self.private.insert(key.into(), value);
        self
    }

    /// Marks the resource as a collection with an empty member list.
    #[must_use]
    pub fn as_collection(mut self) -> Self {
        self.properties
            .insert("Members".to_string(), Value::Array(Vec::new()));
        self.properties
            .insert("Members@odata.count".to_string(), Value::from(0));
        self
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.properties.get("Members"), Some(Value::Array(_)))
    }

    pub fn private_bytes(&self, key: &str) -> Option<&[u8]> {
        self.private.get(key).and_then(PrivateValue::as_bytes)
    }

    pub fn private_list(&self, key: &str) -> Option<&[String]> {
        self.private.get(key).and_then(PrivateValue::as_list)
    }

    /// JSON body returned to clients. Only public properties are included,
    /// with `@odata.id` always reflecting the resource URI.
    pub fn public_view(&self) -> Value {
        let mut body = self.properties.clone();
        body.insert("@odata.id".to_string(), Value::String(self.uri.clone()));
        Value::Object(body)
    }
}

/// Removes a trailing `#fragment` from a request path.
pub fn strip_fragment(path: &str) -> &str {
    match path.split_once('#') {
        Some((head, _)) => head,
        None => path,
    }
}
