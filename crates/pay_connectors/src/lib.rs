#![warn(missing_debug_implementations)]

//!
//! Alipay and WeChat Pay adapters behind the `Payer` interface.
//!

#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR" ), "/", "README.md"))]

pub mod configs;
pub mod connectors;
pub(crate) mod constants;
pub(crate) mod utils;

pub use configs::{Connector, Settings};
pub use connectors::{Alipay, Wechatpay};
