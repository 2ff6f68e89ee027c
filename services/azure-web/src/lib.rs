//! Run-from-package stacks for Azure App Service.
//!
//! A stack stages an app package as a blob in a private container and
//! configures a web or function app to run from it through a signed read
//! url. Resources are declared against a [`Stack`](runpkg_core::Stack) and
//! created by whatever [`Provision`](runpkg_core::Provision) engine backs it;
//! [`MemoryProvisioner`] is a deterministic one for dry runs.
//!
//! # Example
//!
//! ```rust,no_run
//! use runpkg_azure_storage::{Deriver, SharedKeyDataPlane};
//! use runpkg_azure_web::{deploy, MemoryProvisioner, StackConfig};
//! use runpkg_core::{Context, Result, Stack};
//!
//! # async fn example(ctx: Context) -> Result<()> {
//! let config = StackConfig::load(&ctx, "runpkg.toml").await?;
//! let deriver = Deriver::new(ctx.clone(), SharedKeyDataPlane::from_env(&ctx)?);
//! let stack = Stack::new(ctx, MemoryProvisioner::new());
//!
//! let outputs = deploy(&stack, &deriver, &config).await?;
//! println!("{}", outputs.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod constants;

mod config;
pub use config::{AppKind, FunctionConfig, PlanSku, StackConfig};

mod resources;
pub use resources::{
    declare, AppServicePlan, AppSetting, Blob, BlobContainer, Component, Descriptor,
    ResourceGroup, StorageAccount, WebApp,
};

mod memory;
pub use memory::MemoryProvisioner;

mod assemble;
pub use assemble::{assemble, deploy, FunctionAppStack, WebAppStack};
