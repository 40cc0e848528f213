use std::collections::BTreeMap;

use base64::Engine;
use common_utils::{
    consts::BASE64_ENGINE,
    crypto::{self, VerifySignature},
    request::{Method, RequestContent},
    types::MinorUnit,
};
use masking::Secret;
use pay_connectors::connectors::{Alipay, AlipayOptions};
use pay_interfaces::{
    api::{ConnectorCommon, Payer},
    errors::{ConnectorError, ErrorCategory, HttpClientError},
    types::{NoticeParams, TradeStatus, Way},
    webhooks::NotificationPayload,
};

use crate::utils::{self, MockClient, RsaKeyPair};

struct AlipayTest {
    payer: Alipay,
    client: MockClient,
    app_keys: RsaKeyPair,
    gateway_keys: RsaKeyPair,
}

impl AlipayTest {
    fn new() -> Self {
        let app_keys = RsaKeyPair::generate();
        let gateway_keys = RsaKeyPair::generate();
        let client = MockClient::default();
        let options = AlipayOptions {
            app_id: "2021000000000000".to_string(),
            alipay_public_key: Secret::new(gateway_keys.public_pem.clone()),
            app_private_key: Secret::new(app_keys.private_pem.clone()),
            is_production: false,
            notify_url: "https://merchant.example/notify/alipay".to_string(),
            return_url: "https://merchant.example/return".to_string(),
            base_url: Some("http://alipay.test/gateway.do".to_string()),
            timeout_secs: Some(5),
        };
        let payer = Alipay::with_client(options, Box::new(client.clone())).unwrap();
        Self {
            payer,
            client,
            app_keys,
            gateway_keys,
        }
    }

    /// Gateway answer with `node` signed by the gateway key
    fn signed_precreate_response(&self, node: &str) -> String {
        let sign = self.gateway_keys.sign_sha256(node);
        format!(r#"{{"alipay_trade_precreate_response":{node},"sign":"{sign}"}}"#)
    }

    fn notification(&self, sign_type: &str) -> NotificationPayload {
        let mut params = utils::to_params([
            ("app_id", "2021000000000000"),
            ("charset", "utf-8"),
            ("gmt_payment", "2024-01-01 10:00:00"),
            ("notify_id", "2024010100222100000000000000000000"),
            ("notify_time", "2024-01-01 10:00:01"),
            ("notify_type", "trade_status_sync"),
            ("out_trade_no", "order_20240101_0001"),
            ("sign_type", sign_type),
            ("total_amount", "12.34"),
            ("trade_no", "2024010122001400000000000001"),
            ("trade_status", "TRADE_SUCCESS"),
        ]);
        let message = utils::sign_string(&params, &["sign", "sign_type"]);
        let sign = match sign_type {
            "RSA" => self.gateway_keys.sign_sha1(&message),
            _ => self.gateway_keys.sign_sha256(&message),
        };
        params.insert("sign".to_string(), sign);
        NotificationPayload::from_pairs(params)
    }

    fn assert_signed_by_app(&self, query: &str) -> Vec<(String, String)> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap();
        let params: BTreeMap<String, String> = pairs.iter().cloned().collect();
        let sign = pairs
            .iter()
            .find(|(key, _)| key == "sign")
            .map(|(_, value)| value.clone())
            .expect("signed query");
        let public_key = crypto::decode_key_material(&self.app_keys.public_pem).unwrap();
        assert!(crypto::RsaSha256
            .verify_signature(
                &public_key,
                &BASE64_ENGINE.decode(sign).unwrap(),
                utils::sign_string(&params, &["sign"]).as_bytes(),
            )
            .unwrap());
        pairs
    }
}

fn value_of<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

#[tokio::test]
async fn should_build_signed_page_pay_url() {
    let test = AlipayTest::new();
    let url = test.payer.call(Way::Form, &utils::order()).await.unwrap();

    let (base, query) = url.split_once('?').unwrap();
    assert_eq!(base, "http://alipay.test/gateway.do");
    let pairs = test.assert_signed_by_app(query);
    assert_eq!(value_of(&pairs, "method"), Some("alipay.trade.page.pay"));
    assert_eq!(value_of(&pairs, "sign_type"), Some("RSA2"));
    assert_eq!(
        value_of(&pairs, "return_url"),
        Some("https://merchant.example/return")
    );
    let biz_content: serde_json::Value =
        serde_json::from_str(value_of(&pairs, "biz_content").unwrap()).unwrap();
    assert_eq!(biz_content["total_amount"], "12.34");
    assert_eq!(biz_content["out_trade_no"], "order_20240101_0001");
    assert_eq!(biz_content["product_code"], "FAST_INSTANT_TRADE_PAY");
    assert!(test.client.requests().is_empty());
}

#[tokio::test]
async fn should_build_signed_wap_pay_url() {
    let test = AlipayTest::new();
    let url = test.payer.call(Way::Wap, &utils::order()).await.unwrap();

    let (_, query) = url.split_once('?').unwrap();
    let pairs = test.assert_signed_by_app(query);
    assert_eq!(value_of(&pairs, "method"), Some("alipay.trade.wap.pay"));
    let biz_content: serde_json::Value =
        serde_json::from_str(value_of(&pairs, "biz_content").unwrap()).unwrap();
    assert_eq!(biz_content["product_code"], "QUICK_WAP_WAY");
    assert_eq!(biz_content["quit_url"], "https://merchant.example/return");
}

#[tokio::test]
async fn should_build_signed_app_order_string() {
    let test = AlipayTest::new();
    let order_string = test.payer.call(Way::App, &utils::order()).await.unwrap();

    assert!(!order_string.starts_with("http"));
    let pairs = test.assert_signed_by_app(&order_string);
    assert_eq!(value_of(&pairs, "method"), Some("alipay.trade.app.pay"));
    assert_eq!(value_of(&pairs, "return_url"), None);
    assert_eq!(
        value_of(&pairs, "notify_url"),
        Some("https://merchant.example/notify/alipay")
    );
}

#[tokio::test]
async fn should_return_qr_code_from_precreate() {
    let test = AlipayTest::new();
    test.client.respond_with(
        200,
        test.signed_precreate_response(
            r#"{"code":"10000","msg":"Success","out_trade_no":"order_20240101_0001","qr_code":"https://qr.alipay.com/bax03431ljhokirwl38f00a7"}"#,
        ),
    );

    let qr_code = test.payer.call(Way::Qrcode, &utils::order()).await.unwrap();
    assert_eq!(qr_code, "https://qr.alipay.com/bax03431ljhokirwl38f00a7");

    let requests = test.client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].url, "http://alipay.test/gateway.do");
    let Some(RequestContent::FormUrlEncoded(pairs)) = &requests[0].body else {
        panic!("precreate must be posted as a form");
    };
    assert_eq!(value_of(pairs, "method"), Some("alipay.trade.precreate"));
    let biz_content: serde_json::Value =
        serde_json::from_str(value_of(pairs, "biz_content").unwrap()).unwrap();
    assert!(biz_content.get("product_code").is_none());
}

#[tokio::test]
async fn should_propagate_precreate_business_failure() {
    let test = AlipayTest::new();
    test.client.respond_with(
        200,
        test.signed_precreate_response(
            r#"{"code":"40004","msg":"Business Failed","sub_code":"ACQ.TRADE_HAS_SUCCESS","sub_msg":"trade already paid"}"#,
        ),
    );

    let error = test
        .payer
        .call(Way::Qrcode, &utils::order())
        .await
        .unwrap_err();
    let context = error.current_context();
    assert_eq!(context.category(), ErrorCategory::ProviderBusiness);
    assert_eq!(
        context.connector_reason(),
        Some(("ACQ.TRADE_HAS_SUCCESS", "trade already paid"))
    );
}

#[tokio::test]
async fn should_treat_gateway_error_response_as_business_failure() {
    let test = AlipayTest::new();
    test.client.respond_with(
        200,
        r#"{"error_response":{"code":"40002","msg":"Invalid Arguments","sub_code":"isv.invalid-app-id","sub_msg":"invalid app_id"}}"#,
    );

    let error = test
        .payer
        .call(Way::Qrcode, &utils::order())
        .await
        .unwrap_err();
    assert_eq!(
        error.current_context(),
        &ConnectorError::FailedAtConnector {
            code: "isv.invalid-app-id".to_string(),
            message: "invalid app_id".to_string()
        }
    );
}

#[tokio::test]
async fn should_reject_precreate_with_forged_signature() {
    let test = AlipayTest::new();
    let forger = RsaKeyPair::generate();
    let node = r#"{"code":"10000","msg":"Success","qr_code":"https://qr.example/forged"}"#;
    test.client.respond_with(
        200,
        format!(
            r#"{{"alipay_trade_precreate_response":{node},"sign":"{}"}}"#,
            forger.sign_sha256(node)
        ),
    );

    let error = test
        .payer
        .call(Way::Qrcode, &utils::order())
        .await
        .unwrap_err();
    assert_eq!(
        error.current_context(),
        &ConnectorError::ResponseSignatureVerificationFailed
    );
    assert_eq!(
        error.current_context().category(),
        ErrorCategory::SignatureVerification
    );
}

#[tokio::test]
async fn should_classify_transport_failures() {
    let test = AlipayTest::new();
    test.client
        .respond_with(502, "bad gateway")
        .fail_with(HttpClientError::RequestTimeoutReceived);

    let error = test
        .payer
        .call(Way::Qrcode, &utils::order())
        .await
        .unwrap_err();
    assert_eq!(
        error.current_context(),
        &ConnectorError::UnexpectedResponseStatus { status_code: 502 }
    );

    let error = test
        .payer
        .call(Way::Qrcode, &utils::order())
        .await
        .unwrap_err();
    assert_eq!(error.current_context(), &ConnectorError::RequestNotSent);
    assert_eq!(
        error.current_context().category(),
        ErrorCategory::ProviderTransport
    );
}

#[tokio::test]
async fn should_not_support_js_api_or_mini_program() {
    let test = AlipayTest::new();
    for way in [Way::JsApi, Way::MiniProgram] {
        let error = test.payer.call(way, &utils::order()).await.unwrap_err();
        assert_eq!(
            error.current_context(),
            &ConnectorError::WayNotSupported {
                way,
                connector: "alipay"
            }
        );
    }
    assert!(test.client.requests().is_empty());
    assert_eq!(
        test.payer.supported_ways(),
        &[Way::Form, Way::Qrcode, Way::App, Way::Wap]
    );
}

#[test]
fn should_verify_rsa2_notification() {
    let test = AlipayTest::new();
    let notice = test.payer.verify(&test.notification("RSA2")).unwrap();
    assert_eq!(
        notice,
        NoticeParams {
            order_id: "order_20240101_0001".to_string(),
            payment_id: "2024010122001400000000000001".to_string(),
            trade_status: TradeStatus::Success,
            amount: MinorUnit::new(1234),
        }
    );
}

#[test]
fn should_verify_rsa_notification() {
    let test = AlipayTest::new();
    let notice = test.payer.verify(&test.notification("RSA")).unwrap();
    assert_eq!(notice.amount, MinorUnit::new(1234));
}

#[test]
fn should_reject_tampered_notification() {
    let test = AlipayTest::new();
    let mut payload = test.notification("RSA2");
    payload.insert("total_amount", "0.01");

    let error = test.payer.verify(&payload).unwrap_err();
    assert_eq!(
        error.current_context(),
        &ConnectorError::WebhookSourceVerificationFailed
    );
}

#[test]
fn should_reject_unsigned_notification() {
    let test = AlipayTest::new();
    let payload: NotificationPayload = test
        .notification("RSA2")
        .iter()
        .filter(|(key, _)| *key != "sign")
        .collect();

    let error = test.payer.verify(&payload).unwrap_err();
    assert_eq!(
        error.current_context(),
        &ConnectorError::WebhookSourceVerificationFailed
    );
    assert_eq!(
        error.current_context().category(),
        ErrorCategory::SignatureVerification
    );
}

#[test]
fn should_read_url_encoded_notification_body() {
    let test = AlipayTest::new();
    let body = serde_urlencoded::to_string(
        test.notification("RSA2")
            .iter()
            .collect::<Vec<_>>(),
    )
    .unwrap();
    let payload = NotificationPayload::from_query_string(&body).unwrap();
    assert_eq!(
        test.payer.verify(&payload).unwrap().order_id,
        "order_20240101_0001"
    );
}

#[test]
fn should_acknowledge_with_success_literal() {
    let test = AlipayTest::new();
    assert_eq!(test.payer.success(), "success");
    assert_eq!(test.payer.id(), "alipay");
    assert_eq!(test.payer.request_timeout_secs(), Some(5));
}
