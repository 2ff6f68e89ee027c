//! Dry run of a function app stack loaded from a TOML file.
//!
//! ```shell
//! AZURE_STORAGE_CONNECTION_STRING="AccountName=storacct;AccountKey=a2V5" \
//!     cargo run --example function_app -- runpkg.toml
//! ```
//!
//! The config must set `kind = "function"` and a `storage_account_name`
//! matching the connection string.

use runpkg_azure_storage::{Config, Deriver, SharedKeyDataPlane};
use runpkg_azure_web::{deploy, MemoryProvisioner, StackConfig};
use runpkg_core::{Context, Error, OsEnv, Result, Stack};
use runpkg_file_read_tokio::TokioFileRead;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| Error::config_invalid("usage: function_app <stack.toml>"))?;

    let ctx = Context::new().with_file_read(TokioFileRead).with_env(OsEnv);
    let config = StackConfig::load(&ctx, &path).await?;

    let data_plane = SharedKeyDataPlane::from_env(&ctx)?;
    let deriver = Deriver::new(ctx.clone(), data_plane).with_config(&Config::from_env(&ctx)?);

    let stack = Stack::new(ctx, MemoryProvisioner::new());
    let outputs = deploy(&stack, &deriver, &config).await?;

    for (name, value) in outputs.iter() {
        println!("{name}: {value}");
    }
    Ok(())
}
