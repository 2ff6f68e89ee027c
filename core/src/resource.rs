//! Resource handles and the provisioning engine seam.

use crate::secret::REDACTED;
use crate::{Context, Error, Output, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt::{self, Debug};

/// Input is a property value that is either known up front or derived.
pub enum Input<T> {
    /// A literal value.
    Value(T),
    /// A value that is only known once an output resolves.
    Output(Output<T>),
}

impl<T: Send + Sync + 'static> Input<T> {
    /// Lift this input into an output.
    pub fn into_output(self) -> Output<T> {
        match self {
            Input::Value(v) => Output::resolved(v),
            Input::Output(o) => o,
        }
    }
}

impl<T> Debug for Input<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Value(_) => f.write_str("Input::Value"),
            Input::Output(o) => write!(f, "Input::{o:?}"),
        }
    }
}

impl From<&str> for Input<String> {
    fn from(value: &str) -> Self {
        Input::Value(value.to_string())
    }
}

impl From<String> for Input<String> {
    fn from(value: String) -> Self {
        Input::Value(value)
    }
}

impl<T> From<Output<T>> for Input<T> {
    fn from(value: Output<T>) -> Self {
        Input::Output(value)
    }
}

impl<T> From<&Output<T>> for Input<T> {
    fn from(value: &Output<T>) -> Self {
        Input::Output(value.clone())
    }
}

/// Properties is the ordered property bag a resource descriptor renders into.
#[derive(Clone, Debug, Default)]
pub struct Properties {
    entries: Vec<(String, Output<Value>)>,
}

impl Properties {
    /// Create an empty property bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a string property. A later call with the same key wins.
    pub fn with(self, key: impl Into<String>, value: impl Into<Input<String>>) -> Self {
        let value = value.into().into_output().apply(|v| Value::String(v.clone()));
        self.with_output(key, value)
    }

    /// Set a literal JSON property.
    pub fn with_value(self, key: impl Into<String>, value: Value) -> Self {
        self.with_output(key, Output::resolved(value))
    }

    /// Set a derived JSON property.
    pub fn with_output(mut self, key: impl Into<String>, value: Output<Value>) -> Self {
        let key = key.into();
        self.entries.retain(|(k, _)| k != &key);
        self.entries.push((key, value));
        self
    }

    /// Property keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Keys whose value was derived from a secret, known once every property
    /// has resolved.
    pub fn secret_keys(&self) -> Output<BTreeSet<String>> {
        let entries = self.entries.clone();
        Output::from_future(async move {
            let mut keys = BTreeSet::new();
            for (key, value) in entries {
                if value.resolve_with_secret().await?.is_secret() {
                    keys.insert(key);
                }
            }
            Ok(keys)
        })
    }

    /// Resolve every property into one JSON object.
    ///
    /// The object is secret if any property is.
    pub fn into_output(self) -> Result<Output<Map<String, Value>>> {
        if self.entries.is_empty() {
            return Ok(Output::resolved(Map::new()));
        }

        let (keys, values): (Vec<_>, Vec<_>) = self.entries.into_iter().unzip();
        Ok(Output::all(values)?
            .apply(move |values| keys.into_iter().zip(values.iter().cloned()).collect()))
    }
}

/// ResourceRequest is what the provisioning engine receives for one resource.
#[derive(Clone)]
pub struct ResourceRequest {
    /// Resource type, such as `azure-native:storage:StorageAccount`.
    pub kind: String,
    /// Logical name of the resource within the stack.
    pub name: String,
    /// Fully resolved properties.
    pub properties: Map<String, Value>,
    /// Whether any property was derived from a secret.
    pub secret: bool,
}

impl Debug for ResourceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("ResourceRequest");
        d.field("kind", &self.kind).field("name", &self.name);
        if self.secret {
            d.field("properties", &REDACTED);
        } else {
            d.field("properties", &self.properties);
        }
        d.finish()
    }
}

/// ResourceState is the identity the engine reports once a resource exists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Provider id of the resource.
    pub id: String,
    /// Physical name of the resource.
    pub name: String,
    /// Provider outputs such as endpoints and host names.
    #[serde(default)]
    pub outputs: Map<String, Value>,
}

/// Provision is the external provisioning engine.
///
/// runpkg never creates cloud resources itself: it hands fully resolved
/// requests to an implementation of this trait, in dependency order.
#[async_trait::async_trait]
pub trait Provision: Debug + Send + Sync + 'static {
    /// Create the resource described by `req` and report its identity.
    async fn create_resource(&self, ctx: &Context, req: ResourceRequest) -> Result<ResourceState>;
}

/// ResourceHandle is the eventually-resolved identity of a declared resource.
///
/// Engines echo input properties back as outputs, so the handle remembers
/// which properties were secret and [`ResourceHandle::output`] keeps them
/// secret.
#[derive(Clone, Debug)]
pub struct ResourceHandle {
    kind: String,
    logical_name: String,
    state: Output<ResourceState>,
    secret_keys: Output<BTreeSet<String>>,
}

impl ResourceHandle {
    /// Create a handle over a state output.
    pub fn new(
        kind: impl Into<String>,
        logical_name: impl Into<String>,
        state: Output<ResourceState>,
    ) -> Self {
        Self {
            kind: kind.into(),
            logical_name: logical_name.into(),
            state,
            secret_keys: Output::resolved(BTreeSet::new()),
        }
    }

    /// Treat the outputs named in `secret_keys` as secret.
    pub fn with_secret_keys(mut self, secret_keys: Output<BTreeSet<String>>) -> Self {
        self.secret_keys = secret_keys;
        self
    }

    /// Resource type.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Logical name declared in the stack.
    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    /// The whole reported state.
    ///
    /// The state carries no secret taint, read secret-bearing values through
    /// [`ResourceHandle::output`].
    pub fn state(&self) -> &Output<ResourceState> {
        &self.state
    }

    /// Physical name, known once the resource exists.
    pub fn name(&self) -> Output<String> {
        self.state.apply(|s| s.name.clone())
    }

    /// Provider id, known once the resource exists.
    pub fn id(&self) -> Output<String> {
        self.state.apply(|s| s.id.clone())
    }

    /// A named provider output rendered as a string.
    ///
    /// Reading an output the engine did not report fails the derived value.
    /// An output echoing a secret property is secret.
    pub fn output(&self, key: &str) -> Output<String> {
        let logical_name = self.logical_name.clone();
        let k = key.to_string();
        let value = self.state.try_apply(move |s| match s.outputs.get(&k) {
            Some(Value::String(v)) => Ok(v.clone()),
            Some(Value::Null) | None => Err(Error::resolution_failed(format!(
                "resource {logical_name} did not report output {k}"
            ))),
            Some(v) => Ok(v.to_string()),
        });

        let key = key.to_string();
        value
            .zip(&self.secret_keys)
            .apply_output(move |(value, secret_keys)| {
                if secret_keys.contains(&key) {
                    Output::secret(value.clone())
                } else {
                    Output::resolved(value.clone())
                }
            })
    }
}
