#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub use runpkg_core::*;

#[cfg(feature = "default-context")]
mod context;
#[cfg(feature = "default-context")]
pub use context::default_context;

#[cfg(feature = "azure")]
pub mod azure;

#[cfg(feature = "web")]
pub mod web {
    pub use runpkg_azure_web::*;
}
