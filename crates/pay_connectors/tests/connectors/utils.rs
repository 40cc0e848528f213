use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use base64::Engine;
use common_utils::{
    consts::BASE64_ENGINE,
    crypto::{GenerateDigest, SignMessage},
    errors::CustomResult,
    request::Request,
    types::MinorUnit,
};
use openssl::{pkey::PKey, rsa::Rsa};
use pay_interfaces::{
    client::{ApiClient, Response},
    errors::HttpClientError,
    types::Order,
};

/// Replays canned gateway answers and keeps every request it was given
#[derive(Clone, Debug, Default)]
pub struct MockClient {
    responses: Arc<Mutex<VecDeque<CustomResult<Response, HttpClientError>>>>,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl MockClient {
    pub fn respond_with(&self, status_code: u16, body: impl Into<String>) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(Response {
            status_code,
            response: body.into().into_bytes().into(),
        }));
        self
    }

    pub fn fail_with(&self, error: HttpClientError) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(error_stack::report!(error)));
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiClient for MockClient {
    async fn send_request(
        &self,
        request: Request,
        _option_timeout_secs: Option<u64>,
    ) -> CustomResult<Response, HttpClientError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(error_stack::report!(HttpClientError::RequestNotSent(
                "no canned response left".to_string()
            ))))
    }
}

/// PEM encoded RSA key pair
#[derive(Clone, Debug)]
pub struct RsaKeyPair {
    pub private_pem: String,
    pub public_pem: String,
}

impl RsaKeyPair {
    pub fn generate() -> Self {
        let private_key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        Self {
            private_pem: String::from_utf8(private_key.private_key_to_pem_pkcs8().unwrap())
                .unwrap(),
            public_pem: String::from_utf8(private_key.public_key_to_pem().unwrap()).unwrap(),
        }
    }

    fn private_der(&self) -> Vec<u8> {
        common_utils::crypto::decode_key_material(&self.private_pem).unwrap()
    }

    pub fn sign_sha256(&self, message: &str) -> String {
        let signature = common_utils::crypto::RsaSha256
            .sign_message(&self.private_der(), message.as_bytes())
            .unwrap();
        BASE64_ENGINE.encode(signature)
    }

    pub fn sign_sha1(&self, message: &str) -> String {
        let signature = common_utils::crypto::RsaSha1
            .sign_message(&self.private_der(), message.as_bytes())
            .unwrap();
        BASE64_ENGINE.encode(signature)
    }
}

/// Sorted `k=v` string over non empty values, `excluded` keys left out
pub fn sign_string(params: &BTreeMap<String, String>, excluded: &[&str]) -> String {
    params
        .iter()
        .filter(|(key, value)| !value.is_empty() && !excluded.contains(&key.as_str()))
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn wechatpay_md5_sign(params: &BTreeMap<String, String>, api_key: &str) -> String {
    let message = format!("{}&key={api_key}", sign_string(params, &["sign"]));
    hex::encode_upper(
        common_utils::crypto::Md5
            .generate_digest(message.as_bytes())
            .unwrap(),
    )
}

pub fn wechatpay_hmac_sign(params: &BTreeMap<String, String>, api_key: &str) -> String {
    let message = format!("{}&key={api_key}", sign_string(params, &["sign"]));
    hex::encode_upper(
        common_utils::crypto::HmacSha256
            .sign_message(api_key.as_bytes(), message.as_bytes())
            .unwrap(),
    )
}

pub fn to_params<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

pub fn to_xml(params: &BTreeMap<String, String>) -> String {
    let body = params
        .iter()
        .map(|(key, value)| format!("<{key}><![CDATA[{value}]]></{key}>"))
        .collect::<String>();
    format!("<xml>{body}</xml>")
}

pub fn order() -> Order {
    Order::new("order_20240101_0001", "Coffee beans", MinorUnit::new(1234))
}
