//! GitHub webhook signature verification.
//!
//! GitHub signs webhook payloads with an HMAC keyed by the shared secret
//! configured on the hook. Two headers carry the digest:
//!
//! - `X-Hub-Signature`: `sha1=<hex>` (HMAC-SHA1)
//! - `X-Hub-Signature-256`: `sha256=<hex>` (HMAC-SHA256)
//!
//! Verification is the first step of processing; nothing is classified or
//! delivered for a request that fails it. This module never logs: the caller
//! picks a log level per [`Verification`] outcome.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Digest algorithm named by a signature header prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// `sha1=` prefix, sent in `X-Hub-Signature`.
    Sha1,
    /// `sha256=` prefix, sent in `X-Hub-Signature-256`.
    Sha256,
}

impl SignatureAlgorithm {
    fn prefix(self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1 => "sha1=",
            SignatureAlgorithm::Sha256 => "sha256=",
        }
    }
}

/// Outcome of checking one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The signature matches the payload.
    Valid,
    /// No webhook secret is configured. This is an operator error, not an
    /// attack, and is reported separately.
    SecretNotConfigured,
    /// The request carried no signature header.
    MissingSignature,
    /// The signature is malformed or does not match.
    Mismatch,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid)
    }
}

/// Parses a GitHub signature header (e.g. `sha1=abc123...`) into its
/// algorithm and raw digest bytes.
///
/// Returns `None` for malformed headers (unknown prefix, invalid hex, etc.).
/// Never panics.
///
/// # Examples
///
/// ```
/// use pr_thread_relay::webhooks::{SignatureAlgorithm, parse_signature_header};
///
/// let (alg, bytes) = parse_signature_header("sha1=abcd1234").unwrap();
/// assert_eq!(alg, SignatureAlgorithm::Sha1);
/// assert_eq!(bytes, vec![0xab, 0xcd, 0x12, 0x34]);
///
/// // Invalid: missing prefix
/// assert!(parse_signature_header("abcd1234").is_none());
///
/// // Invalid: bad hex
/// assert!(parse_signature_header("sha256=xyz").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<(SignatureAlgorithm, Vec<u8>)> {
    let (algorithm, hex_sig) = if let Some(rest) = header.strip_prefix("sha1=") {
        (SignatureAlgorithm::Sha1, rest)
    } else if let Some(rest) = header.strip_prefix("sha256=") {
        (SignatureAlgorithm::Sha256, rest)
    } else {
        return None;
    };

    hex::decode(hex_sig).ok().map(|bytes| (algorithm, bytes))
}

/// Computes the HMAC of a payload using the given secret.
///
/// Used by tests and tooling to generate expected signatures.
pub fn compute_signature(algorithm: SignatureAlgorithm, payload: &[u8], secret: &[u8]) -> Vec<u8> {
    match algorithm {
        SignatureAlgorithm::Sha1 => {
            let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC can take key of any size");
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
        SignatureAlgorithm::Sha256 => {
            let mut mac =
                HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
    }
}

/// Formats a digest as a GitHub-style header value, e.g. `sha1=<hex>`.
pub fn format_signature_header(algorithm: SignatureAlgorithm, signature: &[u8]) -> String {
    format!("{}{}", algorithm.prefix(), hex::encode(signature))
}

/// Verifies a GitHub webhook signature against the payload and secret.
///
/// Returns `true` if the signature is valid, `false` otherwise. The digest
/// comparison is constant-time.
///
/// # Examples
///
/// ```
/// use pr_thread_relay::webhooks::{
///     SignatureAlgorithm, compute_signature, format_signature_header, verify_signature,
/// };
///
/// let payload = br#"{"action":"opened"}"#;
/// let secret = b"my-secret-key";
///
/// let sig = compute_signature(SignatureAlgorithm::Sha1, payload, secret);
/// let header = format_signature_header(SignatureAlgorithm::Sha1, &sig);
///
/// assert!(verify_signature(payload, &header, secret));
/// assert!(!verify_signature(payload, &header, b"wrong-secret"));
/// ```
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some((algorithm, expected)) = parse_signature_header(signature_header) else {
        return false;
    };

    match algorithm {
        SignatureAlgorithm::Sha1 => match HmacSha1::new_from_slice(secret) {
            Ok(mut mac) => {
                mac.update(payload);
                mac.verify_slice(&expected).is_ok()
            }
            Err(_) => false,
        },
        SignatureAlgorithm::Sha256 => match HmacSha256::new_from_slice(secret) {
            Ok(mut mac) => {
                mac.update(payload);
                mac.verify_slice(&expected).is_ok()
            }
            Err(_) => false,
        },
    }
}

/// Checks a request against the configured secret.
///
/// The order of checks matters for reporting: an unconfigured secret is
/// reported before anything about the request itself.
pub fn verify(secret: Option<&[u8]>, signature_header: Option<&str>, raw_body: &[u8]) -> Verification {
    let Some(secret) = secret else {
        return Verification::SecretNotConfigured;
    };
    let Some(header) = signature_header else {
        return Verification::MissingSignature;
    };

    if verify_signature(raw_body, header, secret) {
        Verification::Valid
    } else {
        Verification::Mismatch
    }
}
