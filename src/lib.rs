pub mod config;
pub mod credential;
pub mod preferences;
pub mod schedule;
pub mod session;
pub mod totp;
pub(crate) mod uri_helper;

use core::num;
use std::{fmt::Display, str::FromStr};

use hmac::{digest::KeyInit, Hmac, Mac};

pub use config::SessionConfig;
pub use credential::{Credential, CredentialList, StoreError};
pub use preferences::{PreferenceError, PreferenceStore};
pub use schedule::{remaining_fraction, remaining_seconds, Tick, Ticker};
pub use session::{Authenticator, Session, SessionError, StartupReport};
pub use totp::{compute_code, Totp};

/// Largest digit count whose modulus still fits the 31-bit truncated value.
pub const MAX_DIGITS: u32 = 9;

#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("Secret is not valid base32")]
    InvalidSecret(#[source] data_encoding::DecodeError),
    #[error("Secret is empty")]
    EmptySecret,
    #[error("Invalid digest")]
    InvalidDigest(Vec<u8>),
    #[error("Invalid HMAC key")]
    InvalidKey(#[source] hmac::digest::InvalidLength),
    #[error("Invalid hashing algorithm, found {0}. Expected one of: SHA1, SHA256 or SHA512")]
    InvalidHashingAlgorithm(String),
    #[error("Invalid digit count {0}, expected 1 to 9")]
    InvalidDigits(u32),
    #[error("Invalid period, it must be at least one second")]
    InvalidPeriod,
    #[error("The provided URI is not valid, found {0}. Expected: {1}")]
    InvalidUriType(String, String),
    #[error("Could not parse the URI")]
    UriParseError(#[source] url::ParseError),
    #[error("Could not retrieve the secret from the URI")]
    UriMissingSecret,
    #[error("Could not parse an integer. Failed parsing: {1}")]
    IntegerParseError(#[source] num::ParseIntError, String),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OtpHashAlgorithm {
    #[default]
    SHA1,
    SHA256,
    SHA512,
}

impl Display for OtpHashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SHA1 => write!(f, "SHA1"),
            Self::SHA256 => write!(f, "SHA256"),
            Self::SHA512 => write!(f, "SHA512"),
        }
    }
}

impl FromStr for OtpHashAlgorithm {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_uppercase();

        match normalized.as_str() {
            "SHA1" => Ok(Self::SHA1),
            "SHA256" => Ok(Self::SHA256),
            "SHA512" => Ok(Self::SHA512),
            _ => Err(OtpError::InvalidHashingAlgorithm(s.to_string())),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OtpCode {
    code: u32,
    digits: u32,
}

impl OtpCode {
    pub fn integer(&self) -> u32 {
        self.code
    }
}

impl Display for OtpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:0padding$}",
            self.code,
            padding = (self.digits as usize)
        )
    }
}

/// Checks that a digit count is usable for truncation.
pub(crate) fn validate_digits(digits: u32) -> Result<u32, OtpError> {
    if (1..=MAX_DIGITS).contains(&digits) {
        Ok(digits)
    } else {
        Err(OtpError::InvalidDigits(digits))
    }
}

fn sign<M: Mac + KeyInit>(key: &[u8], data: &[u8]) -> Result<Vec<u8>, OtpError> {
    let mut mac = <M as Mac>::new_from_slice(key).map_err(OtpError::InvalidKey)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

pub trait Otp {
    /// Decodes a secret (given as an RFC4648 base32-encoded ASCII string)
    /// into a byte string.
    ///
    /// Surrounding whitespace and `=` padding are ignored and the alphabet is
    /// matched case-insensitively.
    fn decode_secret(secret: &str) -> Result<Vec<u8>, OtpError> {
        let normalized = secret.trim().trim_end_matches('=').to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(OtpError::EmptySecret);
        }

        data_encoding::BASE32_NOPAD
            .decode(normalized.as_bytes())
            .map_err(OtpError::InvalidSecret)
    }

    /// Calculates the HMAC digest of the big-endian `data` for the given secret.
    fn calc_digest(
        &self,
        decoded_secret: &[u8],
        algorithm: OtpHashAlgorithm,
        data: u64,
    ) -> Result<Vec<u8>, OtpError> {
        let data = data.to_be_bytes();

        match algorithm {
            OtpHashAlgorithm::SHA1 => sign::<Hmac<sha1::Sha1>>(decoded_secret, &data),
            OtpHashAlgorithm::SHA256 => sign::<Hmac<sha2::Sha256>>(decoded_secret, &data),
            OtpHashAlgorithm::SHA512 => sign::<Hmac<sha2::Sha512>>(decoded_secret, &data),
        }
    }

    /// Encodes the HMAC digest into a truncated integer.
    fn encode_digest_truncated(digest: &[u8], target_digits_count: u32) -> Result<u32, OtpError> {
        // While sometimes this is a hardcoded 19
        // the last byte tells us the offset for any algorithm
        let offset = match digest.last() {
            Some(x) => *x & 0xf,
            None => return Err(OtpError::InvalidDigest(Vec::from(digest))),
        } as usize;

        // Gets the 4 bytes that will compose the code
        let code_bytes: [u8; 4] = match digest.get(offset..offset + 4).map(TryInto::try_into) {
            Some(Ok(x)) => x,
            _ => return Err(OtpError::InvalidDigest(Vec::from(digest))),
        };

        let code = u32::from_be_bytes(code_bytes);
        let truncation_factor = u32::pow(10, validate_digits(target_digits_count)?);

        Ok((code & 0x7fffffff) % truncation_factor)
    }
}
