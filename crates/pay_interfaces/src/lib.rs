//! Payer interface and the types shared by the payment gateway adapters
#![warn(missing_docs, missing_debug_implementations)]

pub mod api;
pub mod client;
pub mod configs;
pub mod consts;
pub mod errors;
pub mod types;
pub mod webhooks;
