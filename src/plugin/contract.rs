//! Contracts exchanged during the connect handshake.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Shape of a capability offered across a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    /// Nothing offered
    None,
    /// Plain data
    Data,
    /// Shared object, downcast by the receiver
    Object,
}

/// Capability set offered by one side of a connection.
#[derive(Clone, Default)]
pub enum Capability {
    /// No capability.
    #[default]
    None,
    /// Structured data.
    Data(serde_json::Value),
    /// Shared object of a concrete type.
    Object(Rc<dyn Any>),
}

impl Capability {
    /// Wrap a shared object.
    pub fn object<T: Any>(value: Rc<T>) -> Self {
        Capability::Object(value)
    }

    /// Variant of this capability.
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Capability::None => CapabilityKind::None,
            Capability::Data(_) => CapabilityKind::Data,
            Capability::Object(_) => CapabilityKind::Object,
        }
    }

    /// Data payload, if any.
    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Capability::Data(value) => Some(value),
            _ => None,
        }
    }

    /// Typed object, if this is an object of type `T`.
    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        match self {
            Capability::Object(object) => Rc::clone(object).downcast::<T>().ok(),
            _ => None,
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::None => write!(f, "None"),
            Capability::Data(value) => f.debug_tuple("Data").field(value).finish(),
            Capability::Object(_) => write!(f, "Object(..)"),
        }
    }
}

/// Interface an extension point hands to each attached plugin.
#[derive(Clone, Debug)]
pub struct ConnectionRequest {
    /// Id of the plugin owning the extension point
    pub owner_id: String,
    /// Extension point the interface belongs to
    pub extension_point: String,
    /// Contract version
    pub version: u32,
    /// Capabilities offered to the attached plugin
    pub api: Capability,
}

impl ConnectionRequest {
    /// Create a version 1 request without capabilities.
    pub fn new(owner_id: &str, extension_point: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            extension_point: extension_point.to_string(),
            version: 1,
            api: Capability::None,
        }
    }

    /// Set the contract version.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Set the offered capabilities.
    pub fn with_api(mut self, api: Capability) -> Self {
        self.api = api;
        self
    }
}

/// Reciprocal handle an attached plugin may return from `connect`.
#[derive(Clone, Debug)]
pub struct ConnectionResponse {
    /// Id of the responding plugin
    pub owner_id: String,
    /// Capabilities offered back
    pub api: Capability,
}

impl ConnectionResponse {
    /// Create a response.
    pub fn new(owner_id: &str, api: Capability) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            api,
        }
    }
}

/// What a connecting plugin expects from the interface it attaches to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRequirement {
    /// Expected capability shape
    pub kind: CapabilityKind,
    /// Expected contract version
    pub version: u32,
}

impl ContractRequirement {
    /// Create a requirement.
    pub fn new(kind: CapabilityKind, version: u32) -> Self {
        Self { kind, version }
    }

    /// Explain why `request` does not satisfy this requirement.
    pub fn mismatch(&self, request: &ConnectionRequest) -> Option<String> {
        if request.api.kind() != self.kind {
            return Some(format!(
                "expected {:?} capability, interface offers {:?}",
                self.kind,
                request.api.kind()
            ));
        }
        if request.version != self.version {
            return Some(format!(
                "expected contract version {}, interface is version {}",
                self.version, request.version
            ));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_kind() {
        assert_eq!(Capability::None.kind(), CapabilityKind::None);
        assert_eq!(Capability::default().kind(), CapabilityKind::None);
        assert_eq!(
            Capability::Data(serde_json::json!({"zoom": 5})).kind(),
            CapabilityKind::Data
        );
        assert_eq!(
            Capability::object(Rc::new(3u8)).kind(),
            CapabilityKind::Object
        );
    }

    #[test]
    fn test_capability_downcast() {
        let api = Capability::object(Rc::new(String::from("layers")));

        assert_eq!(api.downcast::<String>().as_deref(), Some(&"layers".to_string()));
        assert!(api.downcast::<u32>().is_none());
        assert!(Capability::None.downcast::<String>().is_none());
    }

    #[test]
    fn test_requirement_matches() {
        let request = ConnectionRequest::new("map", "layers")
            .with_version(2)
            .with_api(Capability::Data(serde_json::json!([])));

        assert!(ContractRequirement::new(CapabilityKind::Data, 2)
            .mismatch(&request)
            .is_none());
        assert!(ContractRequirement::new(CapabilityKind::Data, 1)
            .mismatch(&request)
            .is_some());
        assert!(ContractRequirement::new(CapabilityKind::Object, 2)
            .mismatch(&request)
            .is_some());
    }

    #[test]
    fn test_requirement_deserialize() {
        let req: ContractRequirement =
            serde_json::from_str(r#"{"kind":"object","version":3}"#).unwrap();
        assert_eq!(req, ContractRequirement::new(CapabilityKind::Object, 3));
    }
}
