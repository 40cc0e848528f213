pub(crate) mod alipay {
    pub(crate) const BASE_URL_PRODUCTION: &str = "https://openapi.alipay.com/gateway.do";
    pub(crate) const BASE_URL_SANDBOX: &str =
        "https://openapi-sandbox.dl.alipaydev.com/gateway.do";

    pub(crate) const FORMAT: &str = "JSON";
    pub(crate) const CHARSET: &str = "utf-8";
    pub(crate) const VERSION: &str = "1.0";

    pub(crate) const SUCCESS_CODE: &str = "10000";
    pub(crate) const NOTIFICATION_ACK: &str = "success";
}

pub(crate) mod wechatpay {
    pub(crate) const BASE_URL_PRODUCTION: &str = "https://api.mch.weixin.qq.com";
    pub(crate) const BASE_URL_SANDBOX: &str = "https://api.mch.weixin.qq.com/sandboxnew";
    pub(crate) const UNIFIED_ORDER_PATH: &str = "/pay/unifiedorder";

    pub(crate) const SUCCESS: &str = "SUCCESS";
    pub(crate) const APP_PACKAGE: &str = "Sign=WXPay";
    pub(crate) const H5_SCENE_TYPE: &str = "Wap";

    pub(crate) const NOTIFICATION_ACK: &str = "<xml><return_code><![CDATA[SUCCESS]]></return_code><return_msg><![CDATA[OK]]></return_msg></xml>";
}
