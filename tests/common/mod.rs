//! Shared test utilities: a local server and raw socket helpers.
//!
//! The tiny_http server is started once per test binary and implements just
//! the routes the suite needs. Raw `async-net` listeners cover the cases a
//! regular server can't express (proxy capture, never answering).

#![allow(dead_code)]

use std::{
    io::{Cursor, Read},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

use async_net::{TcpListener, TcpStream};
use async_std::task;
use futures_util::io::{AsyncReadExt, AsyncWriteExt};
use once_cell::sync::OnceCell;
use tiny_http::{Header, Request, Response, Server, StatusCode};
use url::Url;
use zenfetch::backend::{Connect, ConnectFuture, Connection};

type TestResponse = Response<Cursor<Vec<u8>>>;

#[derive(Debug)]
pub struct TestServer {
    base: String,
    port: u16,
    // Keep the thread alive for the duration of the tests.
    _thread: thread::JoinHandle<()>,
}

/// Build a full URL against the local test server.
pub fn server_url(path: &str) -> String {
    format!("{}/{}", test_server().base, path.trim_start_matches('/'))
}

pub fn server_port() -> u16 {
    test_server().port
}

pub fn test_server() -> &'static TestServer {
    static INSTANCE: OnceCell<TestServer> = OnceCell::new();
    INSTANCE.get_or_init(TestServer::start)
}

impl TestServer {
    fn start() -> Self {
        let server = Server::http("127.0.0.1:0").expect("start test server");
        let port = server
            .server_addr()
            .to_ip()
            .expect("tcp listener")
            .port();
        let base = format!("http://127.0.0.1:{port}");
        let thread = thread::spawn(move || run_server(&server));

        Self {
            base,
            port,
            _thread: thread,
        }
    }
}

fn run_server(server: &Server) {
    for mut request in server.incoming_requests() {
        let response = handle_request(&mut request);
        let _ = request.respond(response);
    }
}

fn handle_request(request: &mut Request) -> TestResponse {
    // tiny_http only provides the path/query, so prefix with a dummy scheme/host.
    let url = Url::parse(&format!("http://localhost{}", request.url())).unwrap();
    let path = url.path().to_string();
    let query = url
        .query_pairs()
        .into_owned()
        .collect::<Vec<(String, String)>>();

    match path.as_str() {
        "/text" => text_response(200, "hello"),
        "/json" => json_response(200, r#"{"slideshow":{"title":"local","author":"zenfetch"}}"#),
        "/bytes" => Response::from_data(vec![0u8, 159, 146, 150]).with_status_code(StatusCode(200)),
        "/html" => text_response(200, "<html><body>not json</body></html>"),
        "/method" => text_response(200, request.method().as_str()),
        "/echo" => echo(request),
        "/no-location" => text_response(302, "nowhere to go"),
        "/see-other" => redirect_response(303, "/method"),
        _ => {
            if let Some(code) = path.strip_prefix("/status/") {
                let status = code.parse::<u16>().unwrap_or(400);
                return text_response(status, format!("status {status}"));
            }
            if let Some(steps) = path.strip_prefix("/redirect/") {
                let steps = steps.parse::<u32>().unwrap_or(0);
                if steps == 0 {
                    return text_response(200, "redirect complete");
                }
                return redirect_response(302, &format!("/redirect/{}", steps - 1));
            }
            if let Some(code) = path.strip_prefix("/redirect-to/") {
                let status = code.parse::<u16>().unwrap_or(302);
                let target = query
                    .iter()
                    .find(|(key, _)| key == "url")
                    .map_or("/", |(_, value)| value.as_str());
                return redirect_response(status, target);
            }
            text_response(404, format!("no route for {path}"))
        }
    }
}

/// Echo the method, content headers, body and a few request headers as JSON.
fn echo(request: &mut Request) -> TestResponse {
    let method = request.method().as_str().to_string();
    let content_type = header_value(request, "content-type");
    let content_length = header_value(request, "content-length");
    let x_test = header_value(request, "x-test");
    let user_agent = header_value(request, "user-agent");
    let authorization = header_value(request, "authorization");
    let mut body = String::new();
    request.as_reader().read_to_string(&mut body).unwrap();

    let payload = serde_json::json!({
        "method": method,
        "content_type": content_type,
        "content_length": content_length,
        "x_test": x_test,
        "user_agent": user_agent,
        "authorization": authorization,
        "body": body,
    });
    json_response(200, &payload.to_string())
}

fn redirect_response(status: u16, location: &str) -> TestResponse {
    let location_header = Header::from_bytes("Location", location).unwrap();
    text_response(status, "redirect").with_header(location_header)
}

fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|header| header.field.to_string().eq_ignore_ascii_case(name))
        .map(|header| header.value.as_str().to_string())
}

fn json_response(status: u16, body: &str) -> TestResponse {
    let content_type = Header::from_bytes("Content-Type", "application/json").unwrap();
    Response::from_string(body.to_string())
        .with_status_code(StatusCode(status))
        .with_header(content_type)
}

fn text_response(status: u16, body: impl Into<String>) -> TestResponse {
    Response::from_string(body.into()).with_status_code(StatusCode(status))
}

/// A listener answering every connection with `response` after recording the
/// request head it received.
pub async fn capture_server(response: &'static str) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let heads = Arc::new(Mutex::new(Vec::new()));
    let recorded = heads.clone();

    task::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let head = read_head(&mut socket).await;
            recorded.lock().unwrap().push(head);
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.close().await;
        }
    });

    (format!("127.0.0.1:{}", addr.port()), heads)
}

/// A listener that accepts connections and never writes a byte.
pub async fn silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    task::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    format!("http://127.0.0.1:{}/", addr.port())
}

/// A listener that writes a plaintext HTTP response as soon as a connection
/// opens, then closes it.
pub async fn plaintext_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    task::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok")
                .await;
            let _ = socket.close().await;
        }
    });

    addr.port()
}

async fn read_head(socket: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|window| window == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(read) => head.extend_from_slice(&buf[..read]),
        }
    }
    String::from_utf8_lossy(&head).into_owned()
}

/// Agent sending every connection to the local server, whatever the host.
#[derive(Debug, Default)]
pub struct LocalAgent {
    pub connects: AtomicUsize,
    pub seen: Mutex<Vec<(String, u16)>>,
}

impl LocalAgent {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl Connect for LocalAgent {
    fn connect<'a>(&'a self, host: &'a str, port: u16) -> ConnectFuture<'a> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((host.to_owned(), port));
        Box::pin(async move {
            let stream = TcpStream::connect(("127.0.0.1", server_port())).await?;
            Ok(Box::new(stream) as Connection)
        })
    }
}
