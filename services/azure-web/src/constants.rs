// Resource kinds handed to the provisioning engine.
pub const RESOURCE_GROUP: &str = "azure-native:resources:ResourceGroup";
pub const STORAGE_ACCOUNT: &str = "azure-native:storage:StorageAccount";
pub const BLOB_CONTAINER: &str = "azure-native:storage:BlobContainer";
pub const BLOB: &str = "azure-native:storage:Blob";
pub const COMPONENT: &str = "azure-native:insights:Component";
pub const APP_SERVICE_PLAN: &str = "azure-native:web:AppServicePlan";
pub const WEB_APP: &str = "azure-native:web:WebApp";

// App settings.
pub const WEBSITE_RUN_FROM_PACKAGE: &str = "WEBSITE_RUN_FROM_PACKAGE";
pub const APPLICATIONINSIGHTS_CONNECTION_STRING: &str = "APPLICATIONINSIGHTS_CONNECTION_STRING";
pub const AZURE_WEB_JOBS_STORAGE: &str = "AzureWebJobsStorage";
pub const FUNCTIONS_WORKER_RUNTIME: &str = "FUNCTIONS_WORKER_RUNTIME";
pub const FUNCTIONS_EXTENSION_VERSION: &str = "FUNCTIONS_EXTENSION_VERSION";

// Provider outputs.
pub const DEFAULT_HOST_NAME: &str = "defaultHostName";
pub const INSTRUMENTATION_KEY: &str = "instrumentationKey";

// Stack outputs.
pub const APP_SERVICE_URL: &str = "appServiceUrl";
pub const ENDPOINT: &str = "endpoint";
pub const DEPLOYMENT_ZIP_URL: &str = "deploymentZipUrl";
pub const PRIMARY_STORAGE_KEY: &str = "primaryStorageKey";
