//! Core components for run-from-package provisioning.
//!
//! This crate provides the foundational types and traits for the runpkg ecosystem.
//! It defines the abstractions that let a stack describe its resources as a graph
//! of derived values and hand them to a provisioning engine in dependency order.
//!
//! ## Overview
//!
//! The crate is built around several key concepts:
//!
//! - **Context**: A container that holds implementations for file reading, HTTP sending, and environment access
//! - **Output**: A memoized, asynchronously derived value carrying a secret taint
//! - **Stack**: Declares resources against a [`Provision`] engine and resolves the exported outputs
//!
//! ## Example
//!
//! ```
//! use runpkg_core::{Output, Result};
//!
//! # async fn example() -> Result<()> {
//! let account = Output::resolved("storacct".to_string());
//! let key = Output::secret("abc123".to_string());
//!
//! let conn = Output::format(
//!     "DefaultEndpointsProtocol=https;AccountName={};AccountKey={}",
//!     &[account, key],
//! )?;
//!
//! let resolved = conn.resolve_with_secret().await?;
//! assert!(resolved.is_secret());
//! # Ok(())
//! # }
//! ```
//!
//! ## Traits
//!
//! This crate defines several important traits:
//!
//! - [`FileRead`]: For asynchronous file reading
//! - [`HttpSend`]: For sending HTTP requests
//! - [`Env`]: For environment variable access
//! - [`ProvideCredential`]: For loading credentials from various sources
//! - [`SigningCredential`]: For validating credentials
//! - [`Provision`]: For the engine that creates resources
//!
//! ## Utilities
//!
//! The crate also provides utility modules:
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time manipulation utilities
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::{
    Context, Env, FileRead, HttpSend, NoopEnv, NoopFileRead, NoopHttpSend, OsEnv, StaticEnv,
};

mod error;
pub use error::{Error, ErrorKind, Result};

mod api;
pub use api::{ProvideCredential, ProvideCredentialChain, SigningCredential};

mod secret;
pub use secret::{Secret, SecretString, REDACTED};

mod output;
pub use output::{Output, Resolved};

mod resource;
pub use resource::{Input, Properties, Provision, ResourceHandle, ResourceRequest, ResourceState};

mod stack;
pub use stack::{ResolvedOutput, ResolvedOutputs, Stack, StackOutputs};
