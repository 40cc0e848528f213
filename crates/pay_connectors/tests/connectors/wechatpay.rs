use std::collections::BTreeMap;

use common_utils::{
    request::{Method, RequestContent},
    types::MinorUnit,
};
use masking::Secret;
use pay_connectors::connectors::{
    wechatpay::{self, transformers::WechatpaySignType},
    Wechatpay, WechatpayOptions,
};
use pay_interfaces::{
    api::{ConnectorCommon, Payer},
    errors::{ConnectorError, ErrorCategory},
    types::{NoticeParams, TradeStatus, Way},
    webhooks::NotificationPayload,
};

use crate::utils::{self, MockClient};

const API_KEY: &str = "192006250b4c09247ec02edce69f6a2d";
const APP_ID: &str = "wx2421b1c4370ec43b";
const MINI_PROGRAM_APP_ID: &str = "wx8888888888888888";
const MCH_ID: &str = "10000100";
const PREPAY_ID: &str = "wx201410272009395522657a690389285100";

struct WechatpayTest {
    payer: Wechatpay,
    client: MockClient,
}

impl WechatpayTest {
    fn new() -> Self {
        Self::with_sign_type(WechatpaySignType::Md5)
    }

    fn with_sign_type(sign_type: WechatpaySignType) -> Self {
        let client = MockClient::default();
        let options = WechatpayOptions {
            app_id: APP_ID.to_string(),
            mch_id: MCH_ID.to_string(),
            api_key: Secret::new(API_KEY.to_string()),
            is_production: false,
            notify_url: "https://merchant.example/notify/wechatpay".to_string(),
            api_domain: "https://merchant.example".to_string(),
            return_url: Some("https://merchant.example/return".to_string()),
            mini_program_app_id: Some(MINI_PROGRAM_APP_ID.to_string()),
            sign_type,
            base_url: Some("http://wechatpay.test".to_string()),
            timeout_secs: None,
        };
        let payer = Wechatpay::with_client(options, Box::new(client.clone())).unwrap();
        Self { payer, client }
    }

    /// Signed `pay/unifiedorder` success answer carrying `extra`
    fn respond_with_prepay(&self, extra: &[(&str, &str)]) {
        let mut params = utils::to_params([
            ("return_code", "SUCCESS"),
            ("return_msg", "OK"),
            ("appid", APP_ID),
            ("mch_id", MCH_ID),
            ("nonce_str", "IITRi8Iabbblz1Jc"),
            ("result_code", "SUCCESS"),
            ("prepay_id", PREPAY_ID),
        ]);
        params.extend(utils::to_params(extra.iter().copied()));
        let sign = utils::wechatpay_md5_sign(&params, API_KEY);
        params.insert("sign".to_string(), sign);
        self.client.respond_with(200, utils::to_xml(&params));
    }

    /// Parameters of the single unified order sent so far
    fn sent_unified_order(&self) -> NotificationPayload {
        let requests = self.client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].url, "http://wechatpay.test/pay/unifiedorder");
        let Some(RequestContent::Xml(body)) = &requests[0].body else {
            panic!("unified order must be posted as xml");
        };
        let payload = wechatpay::body_to_payload(body).unwrap();
        let params: BTreeMap<String, String> = payload
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        assert_eq!(
            payload.get("sign"),
            Some(utils::wechatpay_md5_sign(&params, API_KEY).as_str())
        );
        payload
    }
}

fn notification(sign_type: Option<&str>) -> NotificationPayload {
    let mut params = utils::to_params([
        ("appid", APP_ID),
        ("bank_type", "CFT"),
        ("cash_fee", "1234"),
        ("fee_type", "CNY"),
        ("is_subscribe", "Y"),
        ("mch_id", MCH_ID),
        ("nonce_str", "5d2b6c2a8db53831f7eda20af46e531c"),
        ("openid", "oUpF8uMEb4qRXf22hE3X68TekukE"),
        ("out_trade_no", "order_20240101_0001"),
        ("result_code", "SUCCESS"),
        ("return_code", "SUCCESS"),
        ("time_end", "20240101100000"),
        ("total_fee", "1234"),
        ("trade_type", "JSAPI"),
        ("transaction_id", "1004400740201409030005092168"),
    ]);
    let sign = match sign_type {
        Some(sign_type) => {
            params.insert("sign_type".to_string(), sign_type.to_string());
            utils::wechatpay_hmac_sign(&params, API_KEY)
        }
        None => utils::wechatpay_md5_sign(&params, API_KEY),
    };
    params.insert("sign".to_string(), sign);
    NotificationPayload::from_pairs(params)
}

#[tokio::test]
async fn should_return_code_url_for_native_payment() {
    let test = WechatpayTest::new();
    test.respond_with_prepay(&[
        ("trade_type", "NATIVE"),
        ("code_url", "weixin://wxpay/bizpayurl/up?pr=NwY5Mz9"),
    ]);

    let code_url = test.payer.call(Way::Qrcode, &utils::order()).await.unwrap();
    assert_eq!(code_url, "weixin://wxpay/bizpayurl/up?pr=NwY5Mz9");

    let sent = test.sent_unified_order();
    assert_eq!(sent.get("trade_type"), Some("NATIVE"));
    assert_eq!(sent.get("total_fee"), Some("1234"));
    assert_eq!(sent.get("spbill_create_ip"), Some("127.0.0.1"));
    assert_eq!(sent.get("product_id"), Some("order_20240101_0001"));
    assert_eq!(sent.get("out_trade_no"), Some("order_20240101_0001"));
    assert_eq!(sent.get("body"), Some("Coffee beans"));
    assert_eq!(sent.get("sign_type"), Some("MD5"));
    assert_eq!(sent.get("nonce_str").map(str::len), Some(32));
    assert_eq!(sent.get("openid"), None);
}

#[tokio::test]
async fn should_return_signed_app_params() {
    let test = WechatpayTest::new();
    test.respond_with_prepay(&[("trade_type", "APP")]);

    let order = utils::order().with_ip("203.0.113.7");
    let app_params = test.payer.call(Way::App, &order).await.unwrap();

    let pairs: BTreeMap<String, String> = serde_urlencoded::from_str(&app_params).unwrap();
    assert_eq!(pairs["appid"], APP_ID);
    assert_eq!(pairs["partnerid"], MCH_ID);
    assert_eq!(pairs["prepayid"], PREPAY_ID);
    assert_eq!(pairs["package"], "Sign=WXPay");
    assert!(!pairs["noncestr"].is_empty());
    assert!(pairs["timestamp"].parse::<i64>().is_ok());
    assert_eq!(pairs["sign"], utils::wechatpay_md5_sign(&pairs, API_KEY));

    let sent = test.sent_unified_order();
    assert_eq!(sent.get("trade_type"), Some("APP"));
    assert_eq!(sent.get("spbill_create_ip"), Some("203.0.113.7"));
}

#[tokio::test]
async fn should_append_redirect_url_to_mweb_url() {
    let test = WechatpayTest::new();
    test.respond_with_prepay(&[
        ("trade_type", "MWEB"),
        (
            "mweb_url",
            "https://wx.tenpay.com/cgi-bin/mmpayweb-bin/checkmweb?prepay_id=wx2016121516420242444321ca0631331346&package=1405458241",
        ),
    ]);

    let order = utils::order().with_ip("203.0.113.7");
    let url = test.payer.call(Way::Wap, &order).await.unwrap();
    assert_eq!(
        url,
        "https://wx.tenpay.com/cgi-bin/mmpayweb-bin/checkmweb?prepay_id=wx2016121516420242444321ca0631331346&package=1405458241\
         &redirect_url=https%3A%2F%2Fmerchant.example%2Freturn"
    );

    let sent = test.sent_unified_order();
    assert_eq!(sent.get("trade_type"), Some("MWEB"));
    let scene_info: serde_json::Value =
        serde_json::from_str(sent.get("scene_info").unwrap()).unwrap();
    assert_eq!(scene_info["h5_info"]["type"], "Wap");
    assert_eq!(scene_info["h5_info"]["wap_url"], "https://merchant.example");
    assert_eq!(scene_info["h5_info"]["wap_name"], "Coffee beans");
}

#[tokio::test]
async fn should_return_signed_js_api_params() {
    let test = WechatpayTest::new();
    test.respond_with_prepay(&[("trade_type", "JSAPI")]);

    let order = utils::order()
        .with_ip("203.0.113.7")
        .with_open_id("oUpF8uMEb4qRXf22hE3X68TekukE");
    let blob = test.payer.call(Way::JsApi, &order).await.unwrap();

    let params: BTreeMap<String, String> = serde_json::from_str(&blob).unwrap();
    assert_eq!(params["appId"], APP_ID);
    assert_eq!(params["package"], format!("prepay_id={PREPAY_ID}"));
    assert_eq!(params["signType"], "MD5");
    assert!(!params["nonceStr"].is_empty());
    assert!(params["timeStamp"].parse::<i64>().is_ok());
    let mut signed = params.clone();
    signed.remove("paySign");
    assert_eq!(
        params["paySign"],
        utils::wechatpay_md5_sign(&signed, API_KEY)
    );

    let sent = test.sent_unified_order();
    assert_eq!(sent.get("trade_type"), Some("JSAPI"));
    assert_eq!(sent.get("openid"), Some("oUpF8uMEb4qRXf22hE3X68TekukE"));
    assert_eq!(sent.get("appid"), Some(APP_ID));
}

#[tokio::test]
async fn should_use_mini_program_app_id() {
    let test = WechatpayTest::new();
    test.respond_with_prepay(&[("trade_type", "JSAPI")]);

    let order = utils::order()
        .with_ip("203.0.113.7")
        .with_open_id("oUpF8uMEb4qRXf22hE3X68TekukE");
    let blob = test.payer.call(Way::MiniProgram, &order).await.unwrap();

    let params: serde_json::Value = serde_json::from_str(&blob).unwrap();
    assert_eq!(params["appId"], MINI_PROGRAM_APP_ID);
    let sent = test.sent_unified_order();
    assert_eq!(sent.get("appid"), Some(MINI_PROGRAM_APP_ID));
    assert_eq!(sent.get("trade_type"), Some("JSAPI"));
}

#[tokio::test]
async fn should_require_client_ip_and_open_id() {
    let test = WechatpayTest::new();

    let error = test
        .payer
        .call(Way::App, &utils::order())
        .await
        .unwrap_err();
    assert_eq!(
        error.current_context(),
        &ConnectorError::MissingRequiredField { field_name: "ip" }
    );
    assert_eq!(
        error.current_context().category(),
        ErrorCategory::InvalidRequest
    );

    let error = test
        .payer
        .call(Way::JsApi, &utils::order().with_ip("203.0.113.7"))
        .await
        .unwrap_err();
    assert_eq!(
        error.current_context(),
        &ConnectorError::MissingRequiredField {
            field_name: "open_id"
        }
    );
    assert!(test.client.requests().is_empty());
}

#[tokio::test]
async fn should_not_support_form() {
    let test = WechatpayTest::new();
    let error = test
        .payer
        .call(Way::Form, &utils::order())
        .await
        .unwrap_err();
    assert_eq!(
        error.current_context(),
        &ConnectorError::WayNotSupported {
            way: Way::Form,
            connector: "wechatpay"
        }
    );
    assert_eq!(
        error.current_context().category(),
        ErrorCategory::UnsupportedChannel
    );
    assert!(test.client.requests().is_empty());
}

#[tokio::test]
async fn should_propagate_business_failure() {
    let test = WechatpayTest::new();
    let mut params = utils::to_params([
        ("return_code", "SUCCESS"),
        ("return_msg", "OK"),
        ("appid", APP_ID),
        ("mch_id", MCH_ID),
        ("nonce_str", "IITRi8Iabbblz1Jc"),
        ("result_code", "FAIL"),
        ("err_code", "ORDERPAID"),
        ("err_code_des", "order already paid"),
    ]);
    let sign = utils::wechatpay_md5_sign(&params, API_KEY);
    params.insert("sign".to_string(), sign);
    test.client.respond_with(200, utils::to_xml(&params));

    let error = test
        .payer
        .call(Way::Qrcode, &utils::order())
        .await
        .unwrap_err();
    assert_eq!(
        error.current_context().connector_reason(),
        Some(("ORDERPAID", "order already paid"))
    );
    assert_eq!(
        error.current_context().category(),
        ErrorCategory::ProviderBusiness
    );
}

#[tokio::test]
async fn should_propagate_communication_failure() {
    let test = WechatpayTest::new();
    test.client.respond_with(
        200,
        "<xml><return_code><![CDATA[FAIL]]></return_code><return_msg><![CDATA[mch_id mismatch]]></return_msg></xml>",
    );

    let error = test
        .payer
        .call(Way::Qrcode, &utils::order())
        .await
        .unwrap_err();
    assert_eq!(
        error.current_context(),
        &ConnectorError::ConnectorReturnedFailure {
            message: "mch_id mismatch".to_string()
        }
    );
}

#[tokio::test]
async fn should_reject_unsigned_unified_order_response() {
    let test = WechatpayTest::new();
    let params = utils::to_params([
        ("return_code", "SUCCESS"),
        ("return_msg", "OK"),
        ("appid", APP_ID),
        ("mch_id", MCH_ID),
        ("result_code", "SUCCESS"),
        ("trade_type", "NATIVE"),
        ("prepay_id", PREPAY_ID),
        ("code_url", "weixin://wxpay/bizpayurl?pr=FORGED"),
    ]);
    test.client.respond_with(200, utils::to_xml(&params));

    let error = test
        .payer
        .call(Way::Qrcode, &utils::order())
        .await
        .unwrap_err();
    assert_eq!(
        error.current_context(),
        &ConnectorError::ResponseSignatureVerificationFailed
    );
}

#[tokio::test]
async fn should_reject_unified_order_without_prepay_id() {
    for way in [Way::App, Way::JsApi] {
        let test = WechatpayTest::new();
        let mut params = utils::to_params([
            ("return_code", "SUCCESS"),
            ("return_msg", "OK"),
            ("appid", APP_ID),
            ("mch_id", MCH_ID),
            ("nonce_str", "IITRi8Iabbblz1Jc"),
            ("result_code", "SUCCESS"),
        ]);
        let sign = utils::wechatpay_md5_sign(&params, API_KEY);
        params.insert("sign".to_string(), sign);
        test.client.respond_with(200, utils::to_xml(&params));

        let order = utils::order()
            .with_ip("203.0.113.7")
            .with_open_id("oUpF8uMEb4qRXf22hE3X68TekukE");
        let error = test.payer.call(way, &order).await.unwrap_err();
        assert_eq!(
            error.current_context(),
            &ConnectorError::ResponseDeserializationFailed,
            "{way:?}"
        );
    }
}

#[tokio::test]
async fn should_reject_unreadable_response() {
    let test = WechatpayTest::new();
    test.client.respond_with(200, "<html>maintenance</body>");

    let error = test
        .payer
        .call(Way::Qrcode, &utils::order())
        .await
        .unwrap_err();
    assert_eq!(
        error.current_context(),
        &ConnectorError::ResponseDeserializationFailed
    );
    assert_eq!(
        error.current_context().category(),
        ErrorCategory::ProviderTransport
    );
}

#[test]
fn should_verify_md5_notification() {
    let test = WechatpayTest::new();
    let notice = test.payer.verify(&notification(None)).unwrap();
    assert_eq!(
        notice,
        NoticeParams {
            order_id: "order_20240101_0001".to_string(),
            payment_id: "1004400740201409030005092168".to_string(),
            trade_status: TradeStatus::Success,
            amount: MinorUnit::new(1234),
        }
    );
}

#[test]
fn should_verify_hmac_sha256_notification() {
    let test = WechatpayTest::with_sign_type(WechatpaySignType::HmacSha256);
    let notice = test
        .payer
        .verify(&notification(Some("HMAC-SHA256")))
        .unwrap();
    assert_eq!(notice.amount, MinorUnit::new(1234));
}

#[test]
fn should_verify_xml_notification_body() {
    let test = WechatpayTest::new();
    let params: BTreeMap<String, String> = notification(None)
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    let payload = wechatpay::body_to_payload(&utils::to_xml(&params)).unwrap();
    assert_eq!(
        test.payer.verify(&payload).unwrap().trade_status,
        TradeStatus::Success
    );
}

#[test]
fn should_reject_tampered_notification() {
    let test = WechatpayTest::new();
    let mut payload = notification(None);
    payload.insert("total_fee", "1");

    let error = test.payer.verify(&payload).unwrap_err();
    assert_eq!(
        error.current_context(),
        &ConnectorError::WebhookSourceVerificationFailed
    );
}

#[test]
fn should_reject_unsigned_notification() {
    let test = WechatpayTest::new();
    let payload: NotificationPayload = notification(None)
        .iter()
        .filter(|(key, _)| *key != "sign")
        .collect();

    let error = test.payer.verify(&payload).unwrap_err();
    assert_eq!(
        error.current_context().category(),
        ErrorCategory::SignatureVerification
    );
}

#[test]
fn should_acknowledge_with_xml_success() {
    let test = WechatpayTest::new();
    assert_eq!(
        test.payer.success(),
        "<xml><return_code><![CDATA[SUCCESS]]></return_code><return_msg><![CDATA[OK]]></return_msg></xml>"
    );
    assert_eq!(test.payer.id(), "wechatpay");
    assert_eq!(
        test.payer.supported_ways(),
        &[Way::Qrcode, Way::App, Way::Wap, Way::JsApi, Way::MiniProgram]
    );
}
