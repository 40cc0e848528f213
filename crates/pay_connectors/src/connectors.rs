pub mod alipay;
pub mod wechatpay;

pub use self::{
    alipay::{Alipay, AlipayOptions},
    wechatpay::{Wechatpay, WechatpayOptions},
};
