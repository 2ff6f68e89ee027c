//! Dry run of the web app stack.
//!
//! Signs the package url locally, so it needs an account key:
//!
//! ```shell
//! AZURE_STORAGE_ACCOUNT_NAME=storacct AZURE_STORAGE_ACCOUNT_KEY=a2V5 \
//!     cargo run --example blazor_app
//! ```

use runpkg_azure_storage::{Config, Deriver, SharedKeyDataPlane};
use runpkg_azure_web::{deploy, MemoryProvisioner, StackConfig};
use runpkg_core::{Context, OsEnv, Result, Stack};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let ctx = Context::new().with_env(OsEnv);
    let data_plane = SharedKeyDataPlane::from_env(&ctx)?;
    let deriver = Deriver::new(ctx.clone(), data_plane).with_config(&Config::from_env(&ctx)?);

    let mut config = StackConfig::web();
    config.storage_account_name = ctx.env_var("AZURE_STORAGE_ACCOUNT_NAME");
    config.validate()?;

    let stack = Stack::new(ctx, MemoryProvisioner::new());
    let outputs = deploy(&stack, &deriver, &config).await?;

    println!("{}", outputs.to_json()?);
    Ok(())
}
