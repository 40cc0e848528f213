#![allow(clippy::expect_used, clippy::panic, clippy::unwrap_used)]

mod alipay;
mod utils;
mod wechatpay;
