//! Signing and digest primitives used by the gateway adapters
use base64::Engine;
use error_stack::{report, ResultExt};
use openssl::{
    hash::MessageDigest,
    pkey::{PKey, Private, Public},
    rsa::Rsa,
    sign::{Signer, Verifier},
};
use ring::hmac;

use crate::{
    consts,
    errors::{self, CustomResult},
};

/// Produces a signature over a message with a secret (key bytes or shared key)
pub trait SignMessage {
    /// Signature bytes, before any text encoding
    fn sign_message(
        &self,
        secret: &[u8],
        msg: &[u8],
    ) -> CustomResult<Vec<u8>, errors::CryptoError>;
}

/// Checks a signature received from a gateway.
///
/// `Ok(false)` is a mismatch; errors are reserved for unusable keys.
pub trait VerifySignature {
    /// Whether `signature` was made over `msg` with `secret`
    fn verify_signature(
        &self,
        secret: &[u8],
        signature: &[u8],
        msg: &[u8],
    ) -> CustomResult<bool, errors::CryptoError>;
}

/// Unkeyed hash of a message
pub trait GenerateDigest {
    /// Digest bytes of `message`
    fn generate_digest(&self, message: &[u8]) -> CustomResult<Vec<u8>, errors::CryptoError>;
}

/// HMAC-SHA256, WeChat Pay's `HMAC-SHA256` sign type
#[derive(Debug)]
pub struct HmacSha256;

impl SignMessage for HmacSha256 {
    fn sign_message(
        &self,
        secret: &[u8],
        msg: &[u8],
    ) -> CustomResult<Vec<u8>, errors::CryptoError> {
        Ok(hmac::sign(&hmac::Key::new(hmac::HMAC_SHA256, secret), msg)
            .as_ref()
            .to_vec())
    }
}

impl VerifySignature for HmacSha256 {
    fn verify_signature(
        &self,
        secret: &[u8],
        signature: &[u8],
        msg: &[u8],
    ) -> CustomResult<bool, errors::CryptoError> {
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
        Ok(hmac::verify(&key, msg, signature).is_ok())
    }
}

/// MD5, WeChat Pay's default `MD5` sign type.
///
/// The key is part of the hashed message, so verification ignores `secret`.
#[derive(Debug)]
pub struct Md5;

impl GenerateDigest for Md5 {
    fn generate_digest(&self, message: &[u8]) -> CustomResult<Vec<u8>, errors::CryptoError> {
        Ok(md5::compute(message).0.to_vec())
    }
}

impl VerifySignature for Md5 {
    fn verify_signature(
        &self,
        _secret: &[u8],
        signature: &[u8],
        msg: &[u8],
    ) -> CustomResult<bool, errors::CryptoError> {
        let digest = self.generate_digest(msg)?;
        Ok(ring::constant_time::verify_slices_are_equal(&digest, signature).is_ok())
    }
}

/// RSA PKCS#1 v1.5 signatures over SHA-256 (`RSA2`).
///
/// Signing takes a DER private key (PKCS#1 or PKCS#8), verification takes a DER public key
/// (SubjectPublicKeyInfo or PKCS#1).
#[derive(Debug)]
pub struct RsaSha256;

/// RSA PKCS#1 v1.5 signatures over SHA-1 (legacy `RSA`).
#[derive(Debug)]
pub struct RsaSha1;

impl SignMessage for RsaSha256 {
    fn sign_message(
        &self,
        secret: &[u8],
        msg: &[u8],
    ) -> CustomResult<Vec<u8>, errors::CryptoError> {
        rsa_sign(MessageDigest::sha256(), secret, msg)
    }
}

impl VerifySignature for RsaSha256 {
    fn verify_signature(
        &self,
        secret: &[u8],
        signature: &[u8],
        msg: &[u8],
    ) -> CustomResult<bool, errors::CryptoError> {
        rsa_verify(MessageDigest::sha256(), secret, signature, msg)
    }
}

impl SignMessage for RsaSha1 {
    fn sign_message(
        &self,
        secret: &[u8],
        msg: &[u8],
    ) -> CustomResult<Vec<u8>, errors::CryptoError> {
        rsa_sign(MessageDigest::sha1(), secret, msg)
    }
}

impl VerifySignature for RsaSha1 {
    fn verify_signature(
        &self,
        secret: &[u8],
        signature: &[u8],
        msg: &[u8],
    ) -> CustomResult<bool, errors::CryptoError> {
        rsa_verify(MessageDigest::sha1(), secret, signature, msg)
    }
}

fn rsa_sign(
    digest: MessageDigest,
    private_key_der: &[u8],
    msg: &[u8],
) -> CustomResult<Vec<u8>, errors::CryptoError> {
    let pkey = parse_rsa_private_key(private_key_der)?;
    let mut signer =
        Signer::new(digest, &pkey).change_context(errors::CryptoError::MessageSigningFailed)?;
    signer
        .update(msg)
        .change_context(errors::CryptoError::MessageSigningFailed)?;
    signer
        .sign_to_vec()
        .change_context(errors::CryptoError::MessageSigningFailed)
}

fn rsa_verify(
    digest: MessageDigest,
    public_key_der: &[u8],
    signature: &[u8],
    msg: &[u8],
) -> CustomResult<bool, errors::CryptoError> {
    let pkey = parse_rsa_public_key(public_key_der)?;
    let mut verifier = Verifier::new(digest, &pkey)
        .change_context(errors::CryptoError::SignatureVerificationFailed)?;
    verifier
        .update(msg)
        .change_context(errors::CryptoError::SignatureVerificationFailed)?;
    // malformed signatures surface as errors, treat them as a mismatch
    Ok(verifier.verify(signature).unwrap_or(false))
}

/// Parse a DER encoded RSA private key, either PKCS#8 or traditional PKCS#1.
pub fn parse_rsa_private_key(der: &[u8]) -> CustomResult<PKey<Private>, errors::CryptoError> {
    let pkey = PKey::private_key_from_der(der)
        .or_else(|_| Rsa::private_key_from_der(der).and_then(PKey::from_rsa))
        .change_context(errors::CryptoError::InvalidKey("rsa private key"))?;
    if pkey.rsa().is_err() {
        return Err(report!(errors::CryptoError::InvalidKey("rsa private key")))
            .attach_printable("private key is not an RSA key");
    }
    Ok(pkey)
}

/// Parse a DER encoded RSA public key, either SubjectPublicKeyInfo or PKCS#1.
pub fn parse_rsa_public_key(der: &[u8]) -> CustomResult<PKey<Public>, errors::CryptoError> {
    PKey::public_key_from_der(der)
        .or_else(|_| Rsa::public_key_from_der_pkcs1(der).and_then(PKey::from_rsa))
        .change_context(errors::CryptoError::InvalidKey("rsa public key"))
}

/// Decode key material handed out by the gateways' consoles.
///
/// Accepts a PEM document or the bare base64 body without armour, with any amount of
/// whitespace, and returns the DER bytes.
pub fn decode_key_material(key: &str) -> CustomResult<Vec<u8>, errors::CryptoError> {
    let body: String = key
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("-----"))
        .flat_map(|line| line.chars().filter(|c| !c.is_whitespace()))
        .collect();
    if body.is_empty() {
        return Err(report!(errors::CryptoError::InvalidKey("empty key")));
    }
    consts::BASE64_ENGINE
        .decode(body)
        .change_context(errors::CryptoError::InvalidKey("key is not valid base64"))
}

/// Generate a random string using a cryptographically secure pseudo-random number generator
/// (CSPRNG). Typically used for generating nonces.
#[inline]
pub fn generate_cryptographically_secure_random_string(length: usize) -> String {
    use rand::distributions::DistString;

    rand::distributions::Alphanumeric.sample_string(&mut rand::rngs::OsRng, length)
}
