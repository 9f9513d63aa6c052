use std::{borrow::Cow, str::FromStr};

use crate::{
    credential::Credential,
    totp::{validate_period, Totp},
    validate_digits, OtpError, OtpHashAlgorithm,
};

const OTPAUTH_SCHEME: &str = "otpauth";
const TOTP_TYPE: &str = "totp";

const URI_SECRET_QUERY: &str = "secret";
const URI_ISSUER_QUERY: &str = "issuer";
const URI_HASH_QUERY: &str = "algorithm";
const URI_PERIOD_QUERY: &str = "period";
const URI_DIGITS_QUERY: &str = "digits";

/// Splits a decoded label on its first `:` into `(issuer, account)`.
fn split_label(label: &str) -> (&str, &str) {
    match label.split_once(':') {
        Some((issuer, account)) => (issuer, account),
        None => ("", label),
    }
}

pub fn credential_from_uri(uri: &str) -> Result<Credential, OtpError> {
    let uri = url::Url::parse(uri).map_err(OtpError::UriParseError)?;

    if uri.scheme() != OTPAUTH_SCHEME {
        return Err(OtpError::InvalidUriType(
            uri.scheme().into(),
            OTPAUTH_SCHEME.into(),
        ));
    }

    let host = uri.host_str();
    if host != Some(TOTP_TYPE) {
        return Err(OtpError::InvalidUriType(
            host.unwrap_or("None").into(),
            TOTP_TYPE.into(),
        ));
    }

    let raw_label = uri.path().strip_prefix('/').unwrap_or(uri.path());
    let label = urlencoding::decode(raw_label).unwrap_or(Cow::Borrowed(raw_label));
    let (label_issuer, account) = split_label(&label);

    let mut secret = "".to_string();
    let mut issuer = "".to_string();
    let mut algorithm = OtpHashAlgorithm::default();
    let mut period = crate::totp::DEFAULT_PERIOD;
    let mut digits = crate::totp::DEFAULT_DIGITS;

    for params in uri.query_pairs() {
        match params.0.as_ref() {
            // First non-blank value wins for repeated keys.
            URI_SECRET_QUERY => {
                if secret.is_empty() {
                    secret = params.1.trim().to_string();
                }
            }
            URI_ISSUER_QUERY => {
                if issuer.is_empty() {
                    issuer = params.1.to_string();
                }
            }
            URI_HASH_QUERY => algorithm = OtpHashAlgorithm::from_str(params.1.as_ref())?,
            URI_PERIOD_QUERY => {
                period = u64::from_str(params.1.as_ref())
                    .map_err(|e| OtpError::IntegerParseError(e, URI_PERIOD_QUERY.into()))?
            }
            URI_DIGITS_QUERY => {
                digits = u32::from_str(params.1.as_ref())
                    .map_err(|e| OtpError::IntegerParseError(e, URI_DIGITS_QUERY.into()))?
            }
            _ => (),
        }
    }

    if secret.is_empty() {
        return Err(OtpError::UriMissingSecret);
    }
    validate_period(period)?;
    validate_digits(digits)?;

    if issuer.is_empty() {
        issuer = label_issuer.to_string();
    }

    let mut totp = Totp::new(secret);
    totp.with_algorithm(algorithm)
        .with_period(period)
        .with_digits(digits);

    Ok(Credential::new(
        (!issuer.is_empty()).then_some(issuer),
        account.to_string(),
        totp,
    ))
}

pub fn credential_to_uri(credential: &Credential) -> Result<String, OtpError> {
    let mut uri = url::Url::parse(&format!("{OTPAUTH_SCHEME}://{TOTP_TYPE}/"))
        .map_err(OtpError::UriParseError)?;

    let issuer = credential.issuer();
    match issuer {
        Some(issuer) => uri.set_path(&format!("{}:{}", issuer, credential.account())),
        None => uri.set_path(credential.account()),
    }

    {
        let totp = credential.totp();
        let mut query_params = uri.query_pairs_mut();

        query_params.append_pair(URI_SECRET_QUERY, totp.secret());

        if let Some(issuer) = issuer {
            query_params.append_pair(URI_ISSUER_QUERY, issuer);
        }

        query_params
            .append_pair(URI_HASH_QUERY, &totp.algorithm().to_string())
            .append_pair(URI_DIGITS_QUERY, &totp.digits().to_string())
            .append_pair(URI_PERIOD_QUERY, &totp.period().to_string());
    }

    Ok(uri.to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{credential_from_uri, credential_to_uri};
    use crate::{OtpError, OtpHashAlgorithm};

    #[test]
    fn parses_label_and_issuer() {
        let credential = credential_from_uri(
            "otpauth://totp/Example:alice@example.com?secret=JBSWY3DPEHPK3PXP&issuer=Example",
        )
        .unwrap();

        assert_eq!("Example:alice@example.com", credential.display_name());
        assert_eq!("JBSWY3DPEHPK3PXP", credential.secret());
        assert_eq!(Some("Example"), credential.issuer());
        assert_eq!("alice@example.com", credential.account());
    }

    #[rstest]
    #[case("otpauth://totp/Label:bob?secret=JBSWY3DPEHPK3PXP&issuer=Param", Some("Param"), "Param:bob")]
    #[case("otpauth://totp/Label:bob?secret=JBSWY3DPEHPK3PXP", Some("Label"), "Label:bob")]
    #[case("otpauth://totp/Label:bob?secret=JBSWY3DPEHPK3PXP&issuer=", Some("Label"), "Label:bob")]
    #[case("otpauth://totp/bob?secret=JBSWY3DPEHPK3PXP", None, "bob")]
    #[case("otpauth://totp/bob?secret=JBSWY3DPEHPK3PXP&issuer=ACME%20Co", Some("ACME Co"), "ACME Co:bob")]
    #[case("otpauth://totp/ACME%20Co:john.doe%40email.com?secret=JBSWY3DPEHPK3PXP", Some("ACME Co"), "ACME Co:john.doe@email.com")]
    #[case("otpauth://totp/a:b:c?secret=JBSWY3DPEHPK3PXP", Some("a"), "a:b:c")]
    fn issuer_resolution(
        #[case] uri: &str,
        #[case] issuer: Option<&str>,
        #[case] display_name: &str,
    ) {
        let credential = credential_from_uri(uri).unwrap();

        assert_eq!(issuer, credential.issuer());
        assert_eq!(display_name, credential.display_name());
    }

    #[test]
    fn honors_optional_parameters() {
        let credential = credential_from_uri(
            "otpauth://totp/x?secret=JBSWY3DPEHPK3PXP&algorithm=sha256&digits=8&period=60&image=ignored",
        )
        .unwrap();

        assert_eq!(OtpHashAlgorithm::SHA256, credential.totp().algorithm());
        assert_eq!(8, credential.totp().digits());
        assert_eq!(60, credential.totp().period());
    }

    #[rstest]
    #[case("not a uri")]
    #[case("https://totp/x?secret=JBSWY3DPEHPK3PXP")]
    #[case("otpauth://hotp/x?secret=JBSWY3DPEHPK3PXP&counter=1")]
    #[case("otpauth://totp/x")]
    #[case("otpauth://totp/x?secret=")]
    #[case("otpauth://totp/x?issuer=Example")]
    #[case("otpauth://totp/x?secret=JBSWY3DPEHPK3PXP&algorithm=md5")]
    #[case("otpauth://totp/x?secret=JBSWY3DPEHPK3PXP&digits=ten")]
    #[case("otpauth://totp/x?secret=JBSWY3DPEHPK3PXP&digits=12")]
    #[case("otpauth://totp/x?secret=JBSWY3DPEHPK3PXP&period=0")]
    #[case("otpauth://totp/x?secret=JBSWY3DPEHPK3PXP&period=18446744073709551615")]
    #[case("otpauth://totp/x?secret=JBSWY3DPEHPK3PXP&period=18446744073709552")]
    fn rejects_unusable_lines(#[case] uri: &str) {
        assert!(credential_from_uri(uri).is_err());
    }

    #[rstest]
    #[case("otpauth://totp/x?secret=JBSWY3DPEHPK3PXP&secret=", "JBSWY3DPEHPK3PXP", "x")]
    #[case("otpauth://totp/x?secret=&secret=JBSWY3DPEHPK3PXP", "JBSWY3DPEHPK3PXP", "x")]
    #[case("otpauth://totp/x?secret=JBSWY3DPEHPK3PXP&secret=GEZDGNBV", "JBSWY3DPEHPK3PXP", "x")]
    #[case("otpauth://totp/x?secret=JBSWY3DPEHPK3PXP&issuer=Real&issuer=", "JBSWY3DPEHPK3PXP", "Real:x")]
    #[case("otpauth://totp/L:x?secret=JBSWY3DPEHPK3PXP&issuer=&issuer=Real", "JBSWY3DPEHPK3PXP", "Real:x")]
    fn repeated_keys_keep_first_non_blank(
        #[case] uri: &str,
        #[case] secret: &str,
        #[case] display_name: &str,
    ) {
        let credential = credential_from_uri(uri).unwrap();

        assert_eq!(secret, credential.secret());
        assert_eq!(display_name, credential.display_name());
    }

    #[rstest]
    #[case("otpauth://totp/x?%73ecret=JBSWY3DPEHPK3PXP&%69ssuer=Enc")]
    #[case("otpauth://totp/x?secre%74=JBSWY3DPEHPK3PXP&issue%72=Enc")]
    fn percent_encoded_keys_are_decoded(#[case] uri: &str) {
        let credential = credential_from_uri(uri).unwrap();

        assert_eq!("JBSWY3DPEHPK3PXP", credential.secret());
        assert_eq!("Enc:x", credential.display_name());
    }

    #[test]
    fn largest_period_is_accepted() {
        let credential = credential_from_uri(
            "otpauth://totp/x?secret=JBSWY3DPEHPK3PXP&period=18446744073709551",
        )
        .unwrap();

        assert_eq!(crate::totp::MAX_PERIOD, credential.totp().period());
    }

    #[test]
    fn missing_secret_error() {
        assert!(matches!(
            credential_from_uri("otpauth://totp/x?issuer=Example"),
            Err(OtpError::UriMissingSecret)
        ));
    }

    #[test]
    fn to_uri_round_trips() {
        let uri = "otpauth://totp/ACME%20Co:john.doe@email.com?secret=HXDMVJECJJWSRB3HWIZR4IFUGFTMXBOZ&issuer=ACME+Co&algorithm=SHA1&digits=6&period=30";
        let credential = credential_from_uri(uri).unwrap();

        assert_eq!(uri, credential_to_uri(&credential).unwrap());
        assert_eq!(credential, credential_from_uri(uri).unwrap());
    }
}
