use crate::constants::*;
use async_trait::async_trait;
use log::debug;
use runpkg_core::hash::hex_sha256;
use runpkg_core::{Context, Error, Provision, ResourceRequest, ResourceState, Result};
use serde_json::Value;
use std::sync::{Arc, Mutex};

const ZERO_SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";

/// MemoryProvisioner is a deterministic in-memory engine for dry runs and
/// tests.
///
/// - Physical names get a suffix derived from the kind and logical name, so
///   they are stable across runs. A name given in the properties is kept.
/// - Ids, host names and instrumentation keys are synthesized.
/// - Every request is recorded in the order it arrived.
///
/// Clones share the record.
#[derive(Clone, Debug)]
pub struct MemoryProvisioner {
    subscription_id: String,
    requests: Arc<Mutex<Vec<ResourceRequest>>>,
}

impl Default for MemoryProvisioner {
    fn default() -> Self {
        Self {
            subscription_id: ZERO_SUBSCRIPTION.to_string(),
            requests: Arc::default(),
        }
    }
}

impl MemoryProvisioner {
    /// Create an engine in the all-zero subscription.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `subscription_id` in synthesized ids.
    pub fn with_subscription_id(mut self, subscription_id: impl Into<String>) -> Self {
        self.subscription_id = subscription_id.into();
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ResourceRequest> {
        self.requests.lock().expect("lock poisoned").clone()
    }

    fn physical_name(req: &ResourceRequest) -> String {
        if let Some(Value::String(name)) = name_property(&req.kind).and_then(|k| req.properties.get(k)) {
            return name.clone();
        }

        let suffix = &hex_sha256(format!("{}::{}", req.kind, req.name).as_bytes())[..7];
        if req.kind == STORAGE_ACCOUNT {
            // Account names are 3 to 24 lowercase letters and digits.
            let mut name: String = req
                .name
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .map(|c| c.to_ascii_lowercase())
                .take(24 - suffix.len())
                .collect();
            name.push_str(suffix);
            name
        } else {
            format!("{}{suffix}", req.name)
        }
    }

    fn id(&self, req: &ResourceRequest, name: &str) -> Result<String> {
        let group = format!("/subscriptions/{}/resourceGroups", self.subscription_id);
        if req.kind == RESOURCE_GROUP {
            return Ok(format!("{group}/{name}"));
        }

        let prop = |key: &str| -> Result<&str> {
            req.properties
                .get(key)
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    Error::composition_invalid(format!(
                        "resource {} is missing property {key}",
                        req.name
                    ))
                })
        };
        let rg = prop("resourceGroupName")?;

        let path = match req.kind.as_str() {
            STORAGE_ACCOUNT => format!("Microsoft.Storage/storageAccounts/{name}"),
            BLOB_CONTAINER => format!(
                "Microsoft.Storage/storageAccounts/{}/blobServices/default/containers/{name}",
                prop("accountName")?
            ),
            BLOB => format!(
                "Microsoft.Storage/storageAccounts/{}/blobServices/default/containers/{}/blobs/{name}",
                prop("accountName")?,
                prop("containerName")?
            ),
            COMPONENT => format!("Microsoft.Insights/components/{name}"),
            APP_SERVICE_PLAN => format!("Microsoft.Web/serverfarms/{name}"),
            WEB_APP => format!("Microsoft.Web/sites/{name}"),
            kind => {
                return Err(Error::composition_invalid(format!(
                    "unsupported resource kind {kind}"
                )))
            }
        };
        Ok(format!("{group}/{rg}/providers/{path}"))
    }
}

fn name_property(kind: &str) -> Option<&'static str> {
    match kind {
        STORAGE_ACCOUNT => Some("accountName"),
        BLOB_CONTAINER => Some("containerName"),
        BLOB => Some("blobName"),
        _ => None,
    }
}

/// Format the first 32 hex digits of `seed` as a guid.
fn synthetic_guid(seed: &str) -> String {
    let h = hex_sha256(seed.as_bytes());
    format!(
        "{}-{}-{}-{}-{}",
        &h[0..8],
        &h[8..12],
        &h[12..16],
        &h[16..20],
        &h[20..32]
    )
}

#[async_trait]
impl Provision for MemoryProvisioner {
    async fn create_resource(&self, _: &Context, req: ResourceRequest) -> Result<ResourceState> {
        let name = Self::physical_name(&req);
        let id = self.id(&req, &name)?;

        // Inputs are echoed back as outputs, as the provider does.
        let mut outputs = req.properties.clone();
        outputs.insert("name".to_string(), Value::String(name.clone()));
        match req.kind.as_str() {
            WEB_APP => {
                outputs.insert(
                    DEFAULT_HOST_NAME.to_string(),
                    Value::String(format!("{name}.azurewebsites.net")),
                );
            }
            COMPONENT => {
                outputs.insert(
                    INSTRUMENTATION_KEY.to_string(),
                    Value::String(synthetic_guid(&id)),
                );
            }
            _ => {}
        }

        debug!("memory engine created {} as {id}", req.name);
        self.requests.lock().expect("lock poisoned").push(req);
        Ok(ResourceState { id, name, outputs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Map};

    fn request(kind: &str, name: &str, properties: Value) -> ResourceRequest {
        let Value::Object(properties) = properties else {
            panic!("properties must be an object");
        };
        ResourceRequest {
            kind: kind.to_string(),
            name: name.to_string(),
            properties,
            secret: false,
        }
    }

    #[tokio::test]
    async fn test_names_are_stable() {
        let engine = MemoryProvisioner::new();
        let ctx = Context::new();

        let a = engine
            .create_resource(&ctx, request(RESOURCE_GROUP, "BlazorApp", json!({})))
            .await
            .unwrap();
        let b = engine
            .create_resource(&ctx, request(RESOURCE_GROUP, "BlazorApp", json!({})))
            .await
            .unwrap();

        assert_eq!(a, b);
        assert!(a.name.starts_with("BlazorApp"));
        assert_eq!(a.name.len(), "BlazorApp".len() + 7);
        assert_eq!(
            a.id,
            format!("/subscriptions/{ZERO_SUBSCRIPTION}/resourceGroups/{}", a.name)
        );
        assert_eq!(engine.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_storage_account_name() {
        let engine = MemoryProvisioner::new().with_subscription_id("sub");
        let ctx = Context::new();

        let generated = engine
            .create_resource(
                &ctx,
                request(STORAGE_ACCOUNT, "storage-Account", json!({"resourceGroupName": "rg1"})),
            )
            .await
            .unwrap();
        assert!(generated.name.starts_with("storageaccount"));
        assert!(generated
            .name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert!(generated.name.len() <= 24);

        let fixed = engine
            .create_resource(
                &ctx,
                request(
                    STORAGE_ACCOUNT,
                    "storage",
                    json!({"resourceGroupName": "rg1", "accountName": "storacct"}),
                ),
            )
            .await
            .unwrap();
        assert_eq!(fixed.name, "storacct");
        assert_eq!(
            fixed.id,
            "/subscriptions/sub/resourceGroups/rg1/providers/Microsoft.Storage/storageAccounts/storacct"
        );
    }

    #[tokio::test]
    async fn test_synthesized_outputs() {
        let engine = MemoryProvisioner::new();
        let ctx = Context::new();

        let app = engine
            .create_resource(
                &ctx,
                request(WEB_APP, "blazorserverappservice", json!({"resourceGroupName": "rg1"})),
            )
            .await
            .unwrap();
        assert_eq!(
            app.outputs[DEFAULT_HOST_NAME],
            format!("{}.azurewebsites.net", app.name)
        );
        assert_eq!(app.outputs["resourceGroupName"], "rg1");

        let insights = engine
            .create_resource(&ctx, request(COMPONENT, "appinsights", json!({"resourceGroupName": "rg1"})))
            .await
            .unwrap();
        let key = insights.outputs[INSTRUMENTATION_KEY].as_str().unwrap();
        assert_eq!(key.len(), 36);
        assert_eq!(key.matches('-').count(), 4);
    }

    #[tokio::test]
    async fn test_missing_resource_group() {
        let engine = MemoryProvisioner::new();
        let err = engine
            .create_resource(&Context::new(), request(COMPONENT, "appinsights", Value::Object(Map::new())))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), runpkg_core::ErrorKind::CompositionInvalid);
        assert!(engine.requests().is_empty());
    }
}
