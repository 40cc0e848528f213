#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg_hide))]
#![cfg_attr(docsrs, doc(cfg_hide(doc)))]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//!
//! Wrappers keeping provider credentials out of logs and `Debug` output.
//!

#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR" ), "/", "README.md"))]

mod access;
mod secret;
mod strategy;
mod strong_secret;

pub mod maskable;
#[cfg(feature = "serde")]
mod serde;

pub use access::{ExposeInterface, PeekInterface};
pub use maskable::Maskable;
pub use secret::Secret;
pub use strategy::{KeyMaterial, Strategy, WithType};
pub use strong_secret::StrongSecret;
