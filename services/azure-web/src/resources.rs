//! Resource descriptors.
//!
//! Descriptors are inert values: they only render the properties the
//! provisioning engine receives. Properties that depend on other resources
//! take an [`Input`], so a descriptor can be built before its dependencies
//! exist.

use crate::constants::*;
use runpkg_core::{Error, Input, Output, Properties, ResourceHandle, Result, Stack};
use serde_json::{json, Value};
use std::collections::BTreeSet;

/// Descriptor renders one kind of resource.
pub trait Descriptor {
    /// Resource type understood by the engine.
    const KIND: &'static str;

    /// Render the properties of this resource.
    fn into_properties(self) -> Result<Properties>;
}

/// Declare `descriptor` as `name` in `stack`.
pub fn declare<D: Descriptor>(stack: &Stack, name: &str, descriptor: D) -> Result<ResourceHandle> {
    stack.create(D::KIND, name, descriptor.into_properties()?)
}

/// A resource group in the engine's default location.
#[derive(Debug, Default)]
pub struct ResourceGroup;

impl ResourceGroup {
    /// Create a resource group descriptor.
    pub fn new() -> Self {
        Self
    }
}

impl Descriptor for ResourceGroup {
    const KIND: &'static str = RESOURCE_GROUP;

    fn into_properties(self) -> Result<Properties> {
        Ok(Properties::new())
    }
}

/// A general purpose v2 storage account.
#[derive(Debug)]
pub struct StorageAccount {
    resource_group_name: Input<String>,
    account_name: Option<String>,
}

impl StorageAccount {
    /// A `Standard_LRS` `StorageV2` account.
    pub fn new(resource_group_name: impl Into<Input<String>>) -> Self {
        Self {
            resource_group_name: resource_group_name.into(),
            account_name: None,
        }
    }

    /// Use a fixed physical name instead of an engine generated one.
    pub fn with_account_name(mut self, account_name: impl Into<String>) -> Self {
        self.account_name = Some(account_name.into());
        self
    }
}

impl Descriptor for StorageAccount {
    const KIND: &'static str = STORAGE_ACCOUNT;

    fn into_properties(self) -> Result<Properties> {
        let mut props = Properties::new().with("resourceGroupName", self.resource_group_name);
        if let Some(name) = self.account_name {
            props = props.with("accountName", name);
        }
        Ok(props
            .with_value("sku", json!({ "name": "Standard_LRS" }))
            .with("kind", "StorageV2"))
    }
}

/// A private blob container.
#[derive(Debug)]
pub struct BlobContainer {
    resource_group_name: Input<String>,
    account_name: Input<String>,
    container_name: String,
}

impl BlobContainer {
    /// A container without public access.
    pub fn new(
        resource_group_name: impl Into<Input<String>>,
        account_name: impl Into<Input<String>>,
        container_name: impl Into<String>,
    ) -> Self {
        Self {
            resource_group_name: resource_group_name.into(),
            account_name: account_name.into(),
            container_name: container_name.into(),
        }
    }
}

impl Descriptor for BlobContainer {
    const KIND: &'static str = BLOB_CONTAINER;

    fn into_properties(self) -> Result<Properties> {
        Ok(Properties::new()
            .with("resourceGroupName", self.resource_group_name)
            .with("accountName", self.account_name)
            .with("containerName", self.container_name)
            .with("publicAccess", "None"))
    }
}

/// A block blob uploaded from a local archive.
#[derive(Debug)]
pub struct Blob {
    resource_group_name: Input<String>,
    account_name: Input<String>,
    container_name: Input<String>,
    blob_name: String,
    source: String,
}

impl Blob {
    /// A block blob named `blob_name` with the content of `source`.
    pub fn new(
        resource_group_name: impl Into<Input<String>>,
        account_name: impl Into<Input<String>>,
        container_name: impl Into<Input<String>>,
        blob_name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            resource_group_name: resource_group_name.into(),
            account_name: account_name.into(),
            container_name: container_name.into(),
            blob_name: blob_name.into(),
            source: source.into(),
        }
    }
}

impl Descriptor for Blob {
    const KIND: &'static str = BLOB;

    fn into_properties(self) -> Result<Properties> {
        Ok(Properties::new()
            .with("resourceGroupName", self.resource_group_name)
            .with("accountName", self.account_name)
            .with("containerName", self.container_name)
            .with("blobName", self.blob_name)
            .with("type", "Block")
            .with_value("source", json!({ "archive": self.source })))
    }
}

/// An Application Insights component.
#[derive(Debug)]
pub struct Component {
    resource_group_name: Input<String>,
}

impl Component {
    /// A `web` component.
    pub fn new(resource_group_name: impl Into<Input<String>>) -> Self {
        Self {
            resource_group_name: resource_group_name.into(),
        }
    }
}

impl Descriptor for Component {
    const KIND: &'static str = COMPONENT;

    fn into_properties(self) -> Result<Properties> {
        Ok(Properties::new()
            .with("resourceGroupName", self.resource_group_name)
            .with("applicationType", "web")
            .with("kind", "web"))
    }
}

/// An app service plan.
#[derive(Debug)]
pub struct AppServicePlan {
    resource_group_name: Input<String>,
    tier: String,
    sku_name: String,
}

impl AppServicePlan {
    /// A plan with the given sku, such as `Shared`/`D1` or `Dynamic`/`Y1`.
    pub fn new(
        resource_group_name: impl Into<Input<String>>,
        tier: impl Into<String>,
        sku_name: impl Into<String>,
    ) -> Self {
        Self {
            resource_group_name: resource_group_name.into(),
            tier: tier.into(),
            sku_name: sku_name.into(),
        }
    }
}

impl Descriptor for AppServicePlan {
    const KIND: &'static str = APP_SERVICE_PLAN;

    fn into_properties(self) -> Result<Properties> {
        Ok(Properties::new()
            .with("resourceGroupName", self.resource_group_name)
            .with_value("sku", json!({ "tier": self.tier, "name": self.sku_name })))
    }
}

/// One entry of an app's configuration.
#[derive(Debug)]
pub struct AppSetting {
    name: String,
    value: Input<String>,
}

impl AppSetting {
    /// A setting whose value is a literal or a derived value.
    pub fn new(name: impl Into<String>, value: impl Into<Input<String>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Setting name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A web or function app.
#[derive(Debug)]
pub struct WebApp {
    resource_group_name: Input<String>,
    server_farm_id: Input<String>,
    kind: Option<String>,
    app_settings: Vec<AppSetting>,
}

impl WebApp {
    /// An app hosted on the plan `server_farm_id`.
    pub fn new(
        resource_group_name: impl Into<Input<String>>,
        server_farm_id: impl Into<Input<String>>,
    ) -> Self {
        Self {
            resource_group_name: resource_group_name.into(),
            server_farm_id: server_farm_id.into(),
            kind: None,
            app_settings: Vec::new(),
        }
    }

    /// Set the app kind, `FunctionApp` for function apps.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Add an app setting.
    pub fn with_app_setting(mut self, setting: AppSetting) -> Self {
        self.app_settings.push(setting);
        self
    }
}

impl Descriptor for WebApp {
    const KIND: &'static str = WEB_APP;

    fn into_properties(self) -> Result<Properties> {
        let mut seen = BTreeSet::new();
        for setting in &self.app_settings {
            if !seen.insert(setting.name.as_str()) {
                return Err(Error::composition_invalid(format!(
                    "app setting {} is set twice",
                    setting.name
                )));
            }
        }

        let settings: Vec<_> = self
            .app_settings
            .into_iter()
            .map(|s| {
                let name = s.name;
                s.value
                    .into_output()
                    .apply(move |value| json!({ "name": name, "value": value }))
            })
            .collect();
        let site_config = if settings.is_empty() {
            Output::resolved(json!({ "appSettings": Value::Array(vec![]) }))
        } else {
            Output::all(settings)?.apply(|settings| json!({ "appSettings": settings }))
        };

        let mut props = Properties::new()
            .with("resourceGroupName", self.resource_group_name)
            .with("serverFarmId", self.server_farm_id);
        if let Some(kind) = self.kind {
            props = props.with("kind", kind);
        }
        Ok(props.with_output("siteConfig", site_config))
    }
}
