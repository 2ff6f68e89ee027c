//! Stack assembly.

use crate::resource::{Properties, Provision, ResourceHandle, ResourceRequest};
use crate::secret::REDACTED;
use crate::{Context, Error, Output, Result};
use futures::future;
use log::{debug, info};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display};
use std::sync::{Arc, Mutex};

/// Stack declares resources against a provisioning engine.
///
/// Declaring a resource does not create it. Creation is driven by whoever
/// reads the resource first, and [`Stack::finish`] makes sure every declared
/// resource is created even if no output refers to it.
pub struct Stack {
    ctx: Context,
    engine: Arc<dyn Provision>,
    resources: Mutex<Vec<ResourceHandle>>,
}

impl Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("ctx", &self.ctx)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl Stack {
    /// Create a stack that provisions through `engine`.
    pub fn new(ctx: Context, engine: impl Provision) -> Self {
        Self {
            ctx,
            engine: Arc::new(engine),
            resources: Mutex::new(Vec::new()),
        }
    }

    /// The context resources and data-plane calls run in.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Declare a resource.
    ///
    /// The engine receives the request once every property has resolved. If
    /// any property fails, the resource is never requested and its handle
    /// fails with the same error.
    pub fn create(&self, kind: &str, name: &str, properties: Properties) -> Result<ResourceHandle> {
        let mut resources = self.resources.lock().expect("lock poisoned");
        if resources
            .iter()
            .any(|r| r.kind() == kind && r.logical_name() == name)
        {
            return Err(Error::composition_invalid(format!(
                "resource {kind} {name} is declared twice"
            )));
        }

        let secret_keys = properties.secret_keys();
        let properties = properties.into_output()?;
        let ctx = self.ctx.clone();
        let engine = self.engine.clone();
        let (k, n) = (kind.to_string(), name.to_string());
        let state = Output::from_future(async move {
            let resolved = properties.resolve_with_secret().await?;
            let req = ResourceRequest {
                kind: k,
                name: n,
                properties: resolved.value().clone(),
                secret: resolved.is_secret(),
            };
            debug!("requesting resource: {req:?}");

            let (k, n) = (req.kind.clone(), req.name.clone());
            let state = engine.create_resource(&ctx, req).await?;
            info!("created {k} {n} as {}", state.id);
            Ok(state)
        });

        let handle = ResourceHandle::new(kind, name, state).with_secret_keys(secret_keys);
        resources.push(handle.clone());
        Ok(handle)
    }

    /// Every resource declared so far, in declaration order.
    pub fn resources(&self) -> Vec<ResourceHandle> {
        self.resources.lock().expect("lock poisoned").clone()
    }

    /// Create every declared resource, then resolve the stack outputs.
    pub async fn finish(&self, outputs: StackOutputs) -> Result<ResolvedOutputs> {
        let resources = self.resources();
        debug!("waiting for {} resources", resources.len());
        future::try_join_all(resources.iter().map(|r| r.state().resolve())).await?;

        outputs.resolve().await
    }
}

/// StackOutputs are the named values a stack exports.
#[derive(Clone, Debug, Default)]
pub struct StackOutputs {
    outputs: BTreeMap<String, Output<String>>,
}

impl StackOutputs {
    /// Create an empty set of outputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Export `output` as `name`.
    pub fn with(mut self, name: impl Into<String>, output: Output<String>) -> Self {
        self.outputs.insert(name.into(), output);
        self
    }

    /// Get an exported output.
    pub fn get(&self, name: &str) -> Option<&Output<String>> {
        self.outputs.get(name)
    }

    /// Names of the exported outputs, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(String::as_str)
    }

    /// Wait for every exported output.
    pub async fn resolve(&self) -> Result<ResolvedOutputs> {
        let resolved = future::try_join_all(self.outputs.iter().map(|(name, output)| async move {
            let r = output.resolve_with_secret().await?;
            let value = ResolvedOutput {
                value: r.value().clone(),
                secret: r.is_secret(),
            };
            info!("stack output {name} = {value}");
            Ok::<_, Error>((name.clone(), value))
        }))
        .await?;

        Ok(ResolvedOutputs(resolved.into_iter().collect()))
    }
}

/// A resolved stack output.
///
/// Secret outputs are masked in every rendering, use
/// [`ResolvedOutput::reveal`] to read them.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedOutput {
    value: String,
    secret: bool,
}

impl ResolvedOutput {
    /// Read the value, even if it is secret.
    pub fn reveal(&self) -> &str {
        &self.value
    }

    /// Whether this output is secret.
    pub fn is_secret(&self) -> bool {
        self.secret
    }
}

impl Display for ResolvedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secret {
            f.write_str(REDACTED)
        } else {
            f.write_str(&self.value)
        }
    }
}

impl Debug for ResolvedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedOutput")
            .field("value", &format_args!("{self}"))
            .field("secret", &self.secret)
            .finish()
    }
}

impl Serialize for ResolvedOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The resolved outputs of a stack, sorted by name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedOutputs(BTreeMap<String, ResolvedOutput>);

impl ResolvedOutputs {
    /// Get an output by name.
    pub fn get(&self, name: &str) -> Option<&ResolvedOutput> {
        self.0.get(name)
    }

    /// Iterate outputs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedOutput)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of outputs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the stack exported nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render the outputs as JSON with secrets masked.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
