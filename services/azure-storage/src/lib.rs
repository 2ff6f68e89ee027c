//! Azure Storage values for run-from-package deployments.
//!
//! This crate derives what an app needs to run from a package staged in blob
//! storage:
//! - a read-only url for the package, signed with a container scoped service SAS
//! - the storage account's primary key and connection string, tagged secret
//!
//! Data-plane reads go through a [`StorageDataPlane`], either [`ArmDataPlane`]
//! backed by Azure Resource Manager or [`SharedKeyDataPlane`] which signs
//! locally from known account keys.
//!
//! # Example
//!
//! ```rust,no_run
//! use runpkg_azure_storage::{ArmDataPlane, Config, DefaultCredentialProvider, Deriver};
//! use runpkg_core::{Context, Result};
//!
//! # async fn example(ctx: Context) -> Result<()> {
//! let config = Config::from_env(&ctx)?;
//! let data_plane = ArmDataPlane::new(&config, DefaultCredentialProvider::new())?;
//! let deriver = Deriver::new(ctx, data_plane).with_config(&config);
//!
//! let url = deriver.signed_blob_read_url("app.zip", "deploymentzips", "storacct", "rg1")?;
//! let key = deriver.primary_key("rg1", "storacct")?;
//!
//! println!("package url: {}", url.resolve().await?);
//! assert!(key.resolve_with_secret().await?.is_secret());
//! # Ok(())
//! # }
//! ```

mod constants;

mod config;
pub use config::Config;

mod sas;
pub use sas::{SasPolicy, SasWindow, ServiceSasRequest, SignedResource};

pub mod connection_string;

mod credential;
pub use credential::Credential;

mod provide_credential;
pub use provide_credential::*;

mod data_plane;
pub use data_plane::{ArmDataPlane, SharedKeyDataPlane, StorageAccountKey, StorageDataPlane};

mod derive;
pub use derive::{format_blob_url, Deriver};

#[cfg(test)]
mod testing;
