//! The request pipeline: resolve, encode, dispatch, decode, classify, repeat
//! on redirect.

use http::header::{AUTHORIZATION, COOKIE};
use http_body_util::Full;
use hyper::body::Bytes;
use tracing::debug;
use url::Url;

use crate::{
    Error, RequestOptions, Response, Result, collect, encode,
    redirect::{self, Step},
    resolve,
    timeout::with_timeout,
};

/// State shared by every attempt of one call.
#[derive(Debug, Default)]
struct Session {
    redirects: u32,
}

/// Issue a call described by `options`, following redirects if asked to.
///
/// The returned future settles once, with the terminal response or the first
/// error of any attempt.
///
/// # Errors
///
/// See [`Error`] for the possible failures.
pub async fn request(options: RequestOptions) -> Result<Response> {
    let mut options = options;
    let mut session = Session::default();

    loop {
        let (url, raw) = with_timeout(options.timeout, attempt(&options)).await?;
        let response = collect::decode(raw, options.format)?;

        match redirect::classify(
            options.follow,
            &mut session.redirects,
            &options.method,
            response.status(),
            response.headers(),
        )? {
            Step::Redirect { location, method } => {
                debug!(
                    status = %response.status(),
                    location = %location,
                    redirects = session.redirects,
                    "following redirect"
                );
                let next = redirect::next_url(&url, &location);
                if redirect::leaves_host(&url, &next) {
                    options.headers.remove(AUTHORIZATION);
                    options.headers.remove(COOKIE);
                }
                options.url = next;
                options.method = method;
            }
            Step::Finish => return redirect::validate(response, options.validate.as_ref()),
        }
    }
}

/// One resolve, encode and dispatch round trip; the body comes back buffered.
async fn attempt(options: &RequestOptions) -> Result<(Url, http::Response<Bytes>)> {
    let resolved = resolve::resolve(&options.url, options.proxy.as_deref(), &options.headers)?;
    debug!(
        method = %options.method,
        url = %resolved.url,
        proxied = resolved.proxied,
        "starting attempt"
    );

    let mut headers = resolved.headers;
    let payload = encode::encode(options.body.as_ref(), &mut headers)?;

    let mut request = http::Request::builder()
        .method(options.method.clone())
        .uri(resolved.target.as_str())
        .body(Full::new(payload.unwrap_or_default()))
        .map_err(|err| Error::InvalidRequest(err.to_string()))?;
    *request.headers_mut() = headers;

    let response = resolved
        .endpoint
        .transport
        .send(&resolved.endpoint, options.agent.as_ref(), request)
        .await?;

    Ok((resolved.url, response))
}
