//! Azure storage derivations with convenience constructors.

pub use runpkg_azure_storage::*;

#[cfg(feature = "default-context")]
use crate::default_context;
#[cfg(feature = "default-context")]
use runpkg_core::Result;

/// Create a deriver backed by Azure Resource Manager.
///
/// This function uses:
/// - Default context (tokio file reader, reqwest HTTP client, OS environment)
/// - Config loaded from env, which must carry `AZURE_SUBSCRIPTION_ID`
/// - Default credential provider (access token, client secret, then IMDS)
///
/// # Example
///
/// ```no_run
/// # fn main() -> runpkg::Result<()> {
/// let deriver = runpkg::azure::default_deriver()?;
/// let url = deriver.signed_blob_read_url("app.zip", "deploymentzips", "storacct", "rg1")?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "default-context")]
pub fn default_deriver() -> Result<Deriver> {
    let ctx = default_context();
    let config = Config::from_env(&ctx)?;
    let data_plane = ArmDataPlane::new(&config, DefaultCredentialProvider::new())?;
    Ok(Deriver::new(ctx, data_plane).with_config(&config))
}

/// Create a deriver that signs locally with account keys from env.
///
/// Keys come from `AZURE_STORAGE_CONNECTION_STRING`, or
/// `AZURE_STORAGE_ACCOUNT_NAME` with `AZURE_STORAGE_ACCOUNT_KEY`.
#[cfg(feature = "default-context")]
pub fn shared_key_deriver() -> Result<Deriver> {
    let ctx = default_context();
    let config = Config::from_env(&ctx)?;
    let data_plane = SharedKeyDataPlane::from_env(&ctx)?;
    Ok(Deriver::new(ctx, data_plane).with_config(&config))
}
