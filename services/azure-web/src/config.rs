use runpkg_core::{Context, Error, Result};
use serde::Deserialize;

/// The kind of app a stack deploys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppKind {
    /// A web app on a shared plan.
    #[default]
    Web,
    /// A function app on a consumption plan.
    Function,
}

/// Sku of the app service plan.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PlanSku {
    /// `Shared`, `Dynamic`, ...
    pub tier: String,
    /// `D1`, `Y1`, ...
    pub name: String,
}

/// Function runtime settings, only used by function apps.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FunctionConfig {
    /// `FUNCTIONS_WORKER_RUNTIME`
    pub worker_runtime: String,
    /// `FUNCTIONS_EXTENSION_VERSION`
    pub extension_version: String,
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            worker_runtime: "dotnet".to_string(),
            extension_version: "~3".to_string(),
        }
    }
}

/// StackConfig describes the app a stack deploys.
///
/// Loaded from a TOML file like:
///
/// ```toml
/// kind = "function"
/// app_name = "HelloWorldFunction"
/// package_path = "../HelloWorldFunction/bin/Debug/netcoreapp3.1/publish"
///
/// [plan]
/// tier = "Dynamic"
/// name = "Y1"
///
/// [function]
/// worker_runtime = "dotnet"
/// extension_version = "~3"
/// ```
///
/// Every field but `kind` is optional and defaults per kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackConfig {
    /// Web or function app.
    pub kind: AppKind,
    /// App name. The package blob is `{app_name}.zip` and the app resource is
    /// `{app_name}appservice`, both lowercased. Function apps also serve the
    /// function under this name.
    pub app_name: String,
    /// Logical name of the resource group.
    pub resource_group: String,
    /// Container the package is staged in.
    pub container: String,
    /// Local path of the published app.
    pub package_path: String,
    /// Fixed storage account name. The engine generates one if unset.
    pub storage_account_name: Option<String>,
    /// App service plan sku.
    pub plan: PlanSku,
    /// Function runtime settings.
    pub function: FunctionConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStackConfig {
    #[serde(default)]
    kind: AppKind,
    app_name: Option<String>,
    resource_group: Option<String>,
    container: Option<String>,
    package_path: Option<String>,
    storage_account_name: Option<String>,
    plan: Option<PlanSku>,
    function: Option<FunctionConfig>,
}

impl StackConfig {
    /// Defaults of a web app.
    pub fn web() -> Self {
        Self {
            kind: AppKind::Web,
            app_name: "BlazorServer".to_string(),
            resource_group: "BlazorApp".to_string(),
            container: "deploymentzips".to_string(),
            package_path: "../BlazorApp.BlazorServer/bin/Debug/net6.0/publish".to_string(),
            storage_account_name: None,
            plan: PlanSku {
                tier: "Shared".to_string(),
                name: "D1".to_string(),
            },
            function: FunctionConfig::default(),
        }
    }

    /// Defaults of a function app.
    pub fn function() -> Self {
        Self {
            kind: AppKind::Function,
            app_name: "HelloWorldFunction".to_string(),
            resource_group: "CSharpFunction".to_string(),
            container: "functionzips".to_string(),
            package_path: "../HelloWorldFunction/bin/Debug/netcoreapp3.1/publish".to_string(),
            storage_account_name: None,
            plan: PlanSku {
                tier: "Dynamic".to_string(),
                name: "Y1".to_string(),
            },
            function: FunctionConfig::default(),
        }
    }

    /// Load config from a TOML file read through `ctx`.
    ///
    /// A leading `~` in `path` is expanded to the home directory.
    pub async fn load(ctx: &Context, path: &str) -> Result<Self> {
        let path = ctx.expand_home_dir(path).ok_or_else(|| {
            Error::config_invalid(format!("cannot expand {path}, home directory is unknown"))
        })?;
        let content = ctx.file_read_as_string(&path).await?;
        Self::from_toml(&content)
            .map_err(|e| Error::config_invalid(format!("invalid stack config {path}")).with_source(e))
    }

    /// Parse config from TOML.
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawStackConfig = toml::from_str(content)
            .map_err(|e| Error::config_invalid("malformed stack config").with_source(e))?;

        let defaults = match raw.kind {
            AppKind::Web => Self::web(),
            AppKind::Function => Self::function(),
        };
        let config = Self {
            kind: raw.kind,
            app_name: raw.app_name.unwrap_or(defaults.app_name),
            resource_group: raw.resource_group.unwrap_or(defaults.resource_group),
            container: raw.container.unwrap_or(defaults.container),
            package_path: raw.package_path.unwrap_or(defaults.package_path),
            storage_account_name: raw.storage_account_name,
            plan: raw.plan.unwrap_or(defaults.plan),
            function: raw.function.unwrap_or(defaults.function),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check names against the rules Azure enforces.
    pub fn validate(&self) -> Result<()> {
        if self.app_name.is_empty()
            || !self
                .app_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(Error::config_invalid(format!(
                "app name must be ascii letters, digits or '-', got {:?}",
                self.app_name
            )));
        }
        if self.resource_group.is_empty() {
            return Err(Error::config_invalid("resource group name must not be empty"));
        }
        if !(3..=63).contains(&self.container.len())
            || !self
                .container
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(Error::config_invalid(format!(
                "container name must be 3 to 63 lowercase letters, digits or '-', got {:?}",
                self.container
            )));
        }
        if let Some(name) = &self.storage_account_name {
            if !(3..=24).contains(&name.len())
                || !name
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            {
                return Err(Error::config_invalid(format!(
                    "storage account name must be 3 to 24 lowercase letters or digits, got {name:?}"
                )));
            }
        }
        Ok(())
    }

    /// `{app_name}.zip`, lowercased.
    pub fn blob_name(&self) -> String {
        format!("{}.zip", self.app_name.to_lowercase())
    }

    /// `{app_name}appservice`, lowercased.
    pub fn app_resource_name(&self) -> String {
        format!("{}appservice", self.app_name.to_lowercase())
    }
}
