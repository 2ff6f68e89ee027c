use crate::config::{AppKind, StackConfig};
use crate::constants::*;
use crate::resources::*;
use log::debug;
use runpkg_azure_storage::Deriver;
use runpkg_core::{Output, ResolvedOutputs, ResourceHandle, Result, Stack, StackOutputs};

/// The storage side shared by every app: the package staged in a private
/// container, its signed url and the account's primary key.
struct StagedPackage {
    resource_group: ResourceHandle,
    storage_account: ResourceHandle,
    package_url: Output<String>,
    primary_key: Output<String>,
}

fn stage_package(stack: &Stack, deriver: &Deriver, config: &StackConfig) -> Result<StagedPackage> {
    let resource_group = declare(stack, &config.resource_group, ResourceGroup::new())?;

    let mut account = StorageAccount::new(resource_group.name());
    if let Some(name) = &config.storage_account_name {
        account = account.with_account_name(name);
    }
    let storage_account = declare(stack, "storage", account)?;

    let container = declare(
        stack,
        &config.container,
        BlobContainer::new(
            resource_group.name(),
            storage_account.name(),
            config.container.as_str(),
        ),
    )?;

    let blob_name = config.blob_name();
    let blob = declare(
        stack,
        &blob_name,
        Blob::new(
            resource_group.name(),
            storage_account.name(),
            container.name(),
            blob_name.as_str(),
            config.package_path.as_str(),
        ),
    )?;

    let package_url = deriver.signed_blob_read_url(
        blob.name(),
        container.name(),
        storage_account.name(),
        resource_group.name(),
    )?;
    let primary_key = deriver.primary_key(resource_group.name(), storage_account.name())?;

    Ok(StagedPackage {
        resource_group,
        storage_account,
        package_url,
        primary_key,
    })
}

fn telemetry_setting(stack: &Stack, resource_group: &ResourceHandle) -> Result<AppSetting> {
    let insights = declare(stack, "appinsights", Component::new(resource_group.name()))?;
    let connection = Output::format(
        "InstrumentationKey={}",
        &[insights.output(INSTRUMENTATION_KEY)],
    )?;
    Ok(AppSetting::new(APPLICATIONINSIGHTS_CONNECTION_STRING, connection))
}

fn plan(stack: &Stack, resource_group: &ResourceHandle, config: &StackConfig) -> Result<ResourceHandle> {
    declare(
        stack,
        "appserviceplan",
        AppServicePlan::new(
            resource_group.name(),
            config.plan.tier.as_str(),
            config.plan.name.as_str(),
        ),
    )
}

/// WebAppStack runs a web app from a package in blob storage.
///
/// Outputs `appServiceUrl`, `deploymentZipUrl` and the secret
/// `primaryStorageKey`.
#[derive(Clone, Debug)]
pub struct WebAppStack {
    config: StackConfig,
}

impl WebAppStack {
    /// Create a web app stack.
    pub fn new(config: StackConfig) -> Self {
        Self { config }
    }

    /// Declare the resources in `stack` and return the stack outputs.
    pub fn assemble(&self, stack: &Stack, deriver: &Deriver) -> Result<StackOutputs> {
        let config = &self.config;
        let staged = stage_package(stack, deriver, config)?;
        let telemetry = telemetry_setting(stack, &staged.resource_group)?;
        let plan = plan(stack, &staged.resource_group, config)?;

        let app = declare(
            stack,
            &config.app_resource_name(),
            WebApp::new(staged.resource_group.name(), plan.id())
                .with_app_setting(AppSetting::new(
                    WEBSITE_RUN_FROM_PACKAGE,
                    &staged.package_url,
                ))
                .with_app_setting(telemetry),
        )?;
        debug!("declared web app stack for {}", config.app_name);

        Ok(StackOutputs::new()
            .with(
                APP_SERVICE_URL,
                Output::format("https://{}", &[app.output(DEFAULT_HOST_NAME)])?,
            )
            .with(DEPLOYMENT_ZIP_URL, staged.package_url)
            .with(PRIMARY_STORAGE_KEY, staged.primary_key))
    }
}

/// FunctionAppStack runs a function app from a package in blob storage.
///
/// Outputs `endpoint`, `deploymentZipUrl` and the secret
/// `primaryStorageKey`.
#[derive(Clone, Debug)]
pub struct FunctionAppStack {
    config: StackConfig,
}

impl FunctionAppStack {
    /// Create a function app stack.
    pub fn new(config: StackConfig) -> Self {
        Self { config }
    }

    /// Declare the resources in `stack` and return the stack outputs.
    pub fn assemble(&self, stack: &Stack, deriver: &Deriver) -> Result<StackOutputs> {
        let config = &self.config;
        let staged = stage_package(stack, deriver, config)?;
        let storage_connection = deriver.connection_string(
            staged.resource_group.name(),
            staged.storage_account.name(),
        )?;
        let telemetry = telemetry_setting(stack, &staged.resource_group)?;
        let plan = plan(stack, &staged.resource_group, config)?;

        let app = declare(
            stack,
            &config.app_resource_name(),
            WebApp::new(staged.resource_group.name(), plan.id())
                .with_kind("FunctionApp")
                .with_app_setting(AppSetting::new(AZURE_WEB_JOBS_STORAGE, storage_connection))
                .with_app_setting(AppSetting::new(
                    FUNCTIONS_WORKER_RUNTIME,
                    config.function.worker_runtime.as_str(),
                ))
                .with_app_setting(AppSetting::new(
                    FUNCTIONS_EXTENSION_VERSION,
                    config.function.extension_version.as_str(),
                ))
                .with_app_setting(AppSetting::new(
                    WEBSITE_RUN_FROM_PACKAGE,
                    &staged.package_url,
                ))
                .with_app_setting(telemetry),
        )?;
        debug!("declared function app stack for {}", config.app_name);

        let endpoint = Output::format(
            "https://{}/api/{}?name=Pulumi",
            &[
                app.output(DEFAULT_HOST_NAME),
                Output::resolved(config.app_name.clone()),
            ],
        )?;
        Ok(StackOutputs::new()
            .with(ENDPOINT, endpoint)
            .with(DEPLOYMENT_ZIP_URL, staged.package_url)
            .with(PRIMARY_STORAGE_KEY, staged.primary_key))
    }
}

/// Assemble the stack `config` describes.
pub fn assemble(stack: &Stack, deriver: &Deriver, config: &StackConfig) -> Result<StackOutputs> {
    match config.kind {
        AppKind::Web => WebAppStack::new(config.clone()).assemble(stack, deriver),
        AppKind::Function => FunctionAppStack::new(config.clone()).assemble(stack, deriver),
    }
}

/// Assemble the stack `config` describes, create every resource and
/// resolve the outputs.
pub async fn deploy(
    stack: &Stack,
    deriver: &Deriver,
    config: &StackConfig,
) -> Result<ResolvedOutputs> {
    let outputs = assemble(stack, deriver, config)?;
    stack.finish(outputs).await
}
