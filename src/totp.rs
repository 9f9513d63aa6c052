use crate::{validate_digits, Otp, OtpCode, OtpError, OtpHashAlgorithm};

pub const DEFAULT_PERIOD: u64 = 30;
pub const DEFAULT_DIGITS: u32 = 6;
/// Longest period whose window still fits in `u64` milliseconds.
pub const MAX_PERIOD: u64 = u64::MAX / 1000;

/// Checks that a period is usable for window arithmetic.
pub(crate) fn validate_period(period: u64) -> Result<u64, OtpError> {
    if (1..=MAX_PERIOD).contains(&period) {
        Ok(period)
    } else {
        Err(OtpError::InvalidPeriod)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Totp {
    pub(crate) secret: String,
    pub(crate) algorithm: OtpHashAlgorithm,
    pub(crate) period: u64,
    pub(crate) digits: u32,
}

impl Otp for Totp {}

impl Totp {
    /// Creates the config for the [Time-based One-time Password Algorithm](http://en.wikipedia.org/wiki/Time-based_One-time_Password_Algorithm)
    /// (TOTP) given an RFC4648 base32 encoded secret.
    ///
    /// Obs.: This method defaults to the SHA1 hash, a 6-digit code and a period of 30 seconds
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            algorithm: OtpHashAlgorithm::SHA1,
            period: DEFAULT_PERIOD,
            digits: DEFAULT_DIGITS,
        }
    }

    ///  Sets hashing algorithm
    pub fn with_algorithm(&mut self, algorithm: OtpHashAlgorithm) -> &mut Self {
        self.algorithm = algorithm;

        self
    }

    ///  Sets the period in seconds
    pub fn with_period(&mut self, period: u64) -> &mut Self {
        self.period = period;

        self
    }

    ///  Sets the number of digits to generate
    pub fn with_digits(&mut self, digits: u32) -> &mut Self {
        self.digits = digits;

        self
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn algorithm(&self) -> OtpHashAlgorithm {
        self.algorithm
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    /// Index of the time window containing `seconds_since_epoch`.
    pub fn counter(&self, seconds_since_epoch: u64) -> Result<u64, OtpError> {
        Ok(seconds_since_epoch / validate_period(self.period)?)
    }

    /// Generates a code for the given window counter.
    pub fn generate_at_counter(&self, counter: u64) -> Result<OtpCode, OtpError> {
        let digits = validate_digits(self.digits)?;
        let decoded = Self::decode_secret(self.secret.as_str())?;
        let digest = self.calc_digest(decoded.as_slice(), self.algorithm, counter)?;

        let code = Self::encode_digest_truncated(digest.as_ref(), digits)?;

        Ok(OtpCode { code, digits })
    }

    /// Generates a Totp from the provided seconds since the UNIX epoch
    /// truncated to the specified number of digits
    pub fn generate(&self, seconds_since_epoch: u64) -> Result<OtpCode, OtpError> {
        self.generate_at_counter(self.counter(seconds_since_epoch)?)
    }
}

/// Computes the zero-padded code for `secret` at `unix_time_seconds`.
///
/// Pure: the same secret and window always give the same code.
pub fn compute_code(
    secret: &str,
    unix_time_seconds: u64,
    time_step: u64,
    digits: u32,
) -> Result<String, OtpError> {
    let mut totp = Totp::new(secret.to_string());
    totp.with_period(time_step).with_digits(digits);

    Ok(totp.generate(unix_time_seconds)?.to_string())
}
