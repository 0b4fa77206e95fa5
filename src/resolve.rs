//! Turns a target URL and an optional proxy URL into a connection endpoint,
//! a request-target and the headers the proxy hop needs.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use http::{
    HeaderMap, HeaderValue,
    header::{HOST, PROXY_AUTHORIZATION},
};
use url::{Host, Position, Url};

use crate::{Error, Result, backend::Transport};

/// Where the outbound connection goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Endpoint {
    pub transport: Transport,
    pub host: String,
    pub port: u16,
}

/// Outcome of resolving one attempt.
#[derive(Debug)]
pub(crate) struct Resolved {
    /// The parsed target URL.
    pub url: Url,
    /// The connection endpoint: the proxy when one is configured.
    pub endpoint: Endpoint,
    /// Request-target written on the request line.
    pub target: String,
    /// Caller headers plus `Host` and, for proxies, `Proxy-Authorization`.
    pub headers: HeaderMap,
    pub proxied: bool,
}

pub(crate) fn resolve(url: &str, proxy: Option<&str>, headers: &HeaderMap) -> Result<Resolved> {
    let target = parse(url)?;
    let transport = Transport::for_scheme(target.scheme())?;
    let (host, port) = host_and_port(&target, url)?;
    let mut headers = headers.clone();

    let Some(proxy) = proxy else {
        if !headers.contains_key(HOST) {
            let authority = match target.port() {
                Some(port) => format!("{}:{port}", host_header(&target)),
                None => host_header(&target),
            };
            headers.insert(HOST, header_value(&authority)?);
        }
        let request_target = target[Position::BeforePath..Position::AfterQuery].to_owned();
        return Ok(Resolved {
            endpoint: Endpoint {
                transport,
                host,
                port,
            },
            target: request_target,
            url: target,
            headers,
            proxied: false,
        });
    };

    let proxy_url = parse(proxy)?;
    let proxy_transport = Transport::for_scheme(proxy_url.scheme())?;

    headers.insert(
        HOST,
        header_value(&format!("{}:{port}", host_header(&target)))?,
    );

    if !proxy_url.username().is_empty() || proxy_url.password().is_some() {
        let credentials = format!(
            "{}:{}",
            proxy_url.username(),
            proxy_url.password().unwrap_or_default()
        );
        let value = format!("Basic {}", BASE64.encode(credentials));
        headers.insert(PROXY_AUTHORIZATION, header_value(&value)?);
    }

    let (proxy_host, proxy_port) = host_and_port(&proxy_url, proxy)?;

    Ok(Resolved {
        endpoint: Endpoint {
            transport: proxy_transport,
            host: proxy_host,
            port: proxy_port,
        },
        target: absolute_form(&target),
        url: target,
        headers,
        proxied: true,
    })
}

fn parse(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|err| Error::invalid_url(url, err))
}

/// Connection host (IPv6 without brackets) and effective port.
fn host_and_port(url: &Url, raw: &str) -> Result<(String, u16)> {
    let host = match url.host() {
        Some(Host::Domain(domain)) => domain.to_owned(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        None => return Err(Error::invalid_url(raw, "missing host")),
    };
    let port = url
        .port_or_known_default()
        .ok_or_else(|| Error::invalid_url(raw, "missing port"))?;
    Ok((host, port))
}

fn host_header(url: &Url) -> String {
    url.host_str().unwrap_or_default().to_owned()
}

fn absolute_form(url: &Url) -> String {
    let mut url = url.clone();
    let _ = url.set_username("");
    let _ = url.set_password(None);
    url.set_fragment(None);
    url.to_string()
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|err| Error::InvalidRequest(err.to_string()))
}
