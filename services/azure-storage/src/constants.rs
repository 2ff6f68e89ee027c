// Env values used by runpkg.
pub const AZURE_SUBSCRIPTION_ID: &str = "AZURE_SUBSCRIPTION_ID";
pub const AZURE_RESOURCE_MANAGER_ENDPOINT: &str = "AZURE_RESOURCE_MANAGER_ENDPOINT";
pub const RUNPKG_STORAGE_ENDPOINT_SUFFIX: &str = "RUNPKG_STORAGE_ENDPOINT_SUFFIX";
pub const RUNPKG_SAS_BACKDATE_DAYS: &str = "RUNPKG_SAS_BACKDATE_DAYS";
pub const RUNPKG_SAS_VALIDITY_DAYS: &str = "RUNPKG_SAS_VALIDITY_DAYS";

// Env values used for ARM credentials.
pub const AZURE_ACCESS_TOKEN: &str = "AZURE_ACCESS_TOKEN";
pub const AZURE_TENANT_ID: &str = "AZURE_TENANT_ID";
pub const AZURE_CLIENT_ID: &str = "AZURE_CLIENT_ID";
pub const AZURE_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
pub const AZURE_AUTHORITY_HOST: &str = "AZURE_AUTHORITY_HOST";
pub const AZURE_OBJECT_ID: &str = "AZURE_OBJECT_ID";
pub const AZURE_MSI_RES_ID: &str = "AZURE_MSI_RES_ID";
pub const AZURE_MSI_SECRET: &str = "AZURE_MSI_SECRET";
pub const AZURE_IMDS_ENDPOINT: &str = "AZURE_IMDS_ENDPOINT";

// Env values used for shared key access.
pub const AZURE_STORAGE_CONNECTION_STRING: &str = "AZURE_STORAGE_CONNECTION_STRING";
pub const AZURE_STORAGE_ACCOUNT_NAME: &str = "AZURE_STORAGE_ACCOUNT_NAME";
pub const AZURE_STORAGE_ACCOUNT_KEY: &str = "AZURE_STORAGE_ACCOUNT_KEY";

// Defaults.
pub const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";
pub const DEFAULT_ARM_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
pub const DEFAULT_SAS_BACKDATE_DAYS: i64 = 365;
pub const DEFAULT_SAS_VALIDITY_DAYS: i64 = 3650;

pub const ARM_API_VERSION: &str = "2023-01-01";
pub const ARM_SCOPE: &str = "https://management.azure.com/.default";
pub const ARM_RESOURCE: &str = "https://management.azure.com/";

// Service SAS parameters.
pub const SERVICE_SAS_VERSION: &str = "2018-11-09";
