use std::borrow::Cow;

use url::Url;

use super::{error, Error, SMTP_PORT, SUBMISSIONS_PORT, SUBMISSION_PORT};
use crate::transport::{Security, TransportParameters};

/// Builds `TransportParameters` from a connection URL
///
/// * `smtp://host[:port]`: plaintext, port 25 by default
/// * `smtp://host[:port]?tls=required`: mandatory `STARTTLS`, port 587 by default
/// * `smtp://host[:port]?tls=opportunistic`: `STARTTLS` when offered, port 587 by default
/// * `smtps://host[:port]`: implicit TLS, port 465 by default
///
/// A `user:password@` part switches authentication on.
pub(crate) fn from_connection_url(connection_url: &str) -> Result<TransportParameters, Error> {
    let connection_url = Url::parse(connection_url).map_err(error::url)?;
    let tls: Option<String> = connection_url
        .query_pairs()
        .find(|(k, _)| k == "tls")
        .map(|(_, v)| v.to_string());

    let host = connection_url
        .host_str()
        .ok_or_else(|| error::url("smtp host undefined"))?;

    let (default_port, encryption, security) = match (connection_url.scheme(), tls.as_deref()) {
        ("smtp", None) => (SMTP_PORT, false, Security::None),
        ("smtp", Some("required")) => (SUBMISSION_PORT, true, Security::Required),
        ("smtp", Some("opportunistic")) => (SUBMISSION_PORT, false, Security::Opportunistic),
        ("smtps", _) => (SUBMISSIONS_PORT, true, Security::Wrapper),
        (scheme, tls) => {
            return Err(error::url(format!(
                "Unknown scheme '{scheme}' or tls parameter '{tls:?}'"
            )))
        }
    };

    let mut parameters =
        TransportParameters::new(host, connection_url.port().unwrap_or(default_port))
            .encryption(encryption)
            .security(security);

    if let Some(password) = connection_url.password() {
        let percent_decode = |s: &str| {
            percent_encoding::percent_decode_str(s)
                .decode_utf8()
                .map(Cow::into_owned)
                .map_err(error::url)
        };
        parameters = parameters
            .authentication(true)
            .credentials(percent_decode(connection_url.username())?, percent_decode(password)?);
    }

    Ok(parameters)
}
