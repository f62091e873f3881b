//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every client verb
//! over real HTTP. Most tests use the default reqwest transport; a ureq
//! transport run on the blocking pool checks that the `Transport` seam is
//! all a host needs to implement.

use std::net::SocketAddr;

use ajax_core::{
    AjaxClient, ClientConfig, FileLike, FileList, FormValue, HttpMethod, HttpRequest,
    HttpResponse, Params, ResponseBody, Transport, TransportError,
};
use async_trait::async_trait;
use mock_server::{Echo, UploadedPart};
use serde_json::json;

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn echo(body: &ResponseBody) -> Echo {
    serde_json::from_value(body.as_json().expect("json body").clone()).unwrap()
}

fn uploaded(body: &ResponseBody) -> Vec<UploadedPart> {
    serde_json::from_value(body.as_json().expect("json body").clone()).unwrap()
}

/// Executes requests with ureq on the blocking pool.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses come back as data, as the `Transport` contract requires.
struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn execute(agent: &ureq::Agent, req: HttpRequest) -> Result<HttpResponse, ureq::Error> {
    let body = req.body.as_ref().map(|b| b.to_bytes());
    let url = req.url.as_str();
    let headers = req.headers.as_slice();

    let mut response = match (req.method, body) {
        (HttpMethod::Get, _) => with_headers(agent.get(url), headers).call(),
        (HttpMethod::Delete, None) => with_headers(agent.delete(url), headers).call(),
        (HttpMethod::Delete, Some(body)) => with_headers(agent.delete(url), headers)
            .force_send_body()
            .send(&body[..]),
        (HttpMethod::Post, Some(body)) => with_headers(agent.post(url), headers).send(&body[..]),
        (HttpMethod::Post, None) => with_headers(agent.post(url), headers).send_empty(),
        (HttpMethod::Put, Some(body)) => with_headers(agent.put(url), headers).send(&body[..]),
        (HttpMethod::Put, None) => with_headers(agent.put(url), headers).send_empty(),
    }?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                String::from_utf8_lossy(v.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = response.body_mut().read_to_vec()?;

    Ok(HttpResponse {
        status,
        headers,
        body: body.into(),
    })
}

#[async_trait]
impl Transport for UreqTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || execute(&agent, request))
            .await
            .map_err(|e| TransportError::new("JoinError", e.to_string()))?
            .map_err(|e| TransportError::new("NetworkError", e.to_string()))
    }
}

#[tokio::test]
async fn get_appends_query_and_sends_default_headers() {
    let addr = start_server();
    let client = AjaxClient::new().unwrap();

    let params = Params::from([("a", "b"), ("c", "d")]);
    let reply = client
        .get(&format!("http://{addr}/echo?x=1"), Some(&params), None)
        .await;

    assert_eq!(reply.status, 200);
    let seen = echo(&reply.body);
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.uri, "/echo?x=1&a=b&c=d");
    assert_eq!(seen.headers["x-requested-with"], "XMLHttpRequest");
    assert_eq!(seen.headers["accept"], "application/json");
}

#[tokio::test]
async fn post_put_delete_send_urlencoded_fields() {
    let addr = start_server();
    let client = AjaxClient::new().unwrap();
    let url = format!("http://{addr}/form");
    let params = Params::from([("name", "Jane Doe"), ("tag", "a&b")]);
    let expected = json!([["name", "Jane Doe"], ["tag", "a&b"]]);

    for reply in [
        client.post(&url, Some(&params), None).await,
        client.put(&url, Some(&params), None).await,
        client.delete(&url, Some(&params), None).await,
    ] {
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, ResponseBody::Json(expected.clone()));
    }
}

#[tokio::test]
async fn upload_single_file() {
    let addr = start_server();
    let client = AjaxClient::new().unwrap();

    let file = FileLike::new("foo.txt", "foo").with_content_type("text/plain");
    let reply = client
        .upload_file(&format!("http://{addr}/upload"), "post", file, None)
        .await
        .unwrap();

    assert_eq!(reply.status, 200);
    let parts = uploaded(&reply.body);
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].field, "0");
    assert_eq!(parts[0].file_name.as_deref(), Some("foo.txt"));
    assert_eq!(parts[0].content_type.as_deref(), Some("text/plain"));
    assert_eq!(parts[0].text.as_deref(), Some("foo"));
}

#[tokio::test]
async fn upload_file_list_with_put() {
    let addr = start_server();
    let client = AjaxClient::new().unwrap();

    let files: FileList = [FileLike::new("foo.txt", "foo"), FileLike::new("bar.txt", "barbar")]
        .into_iter()
        .collect();
    let reply = client
        .upload_file(&format!("http://{addr}/upload"), "PUT", files, None)
        .await
        .unwrap();

    let parts = uploaded(&reply.body);
    let fields: Vec<_> = parts
        .iter()
        .map(|p| (p.field.as_str(), p.file_name.as_deref(), p.size))
        .collect();
    assert_eq!(
        fields,
        vec![("0", Some("foo.txt"), 3), ("1", Some("bar.txt"), 6)]
    );
}

#[tokio::test]
async fn upload_value_from_json_description() {
    let addr = start_server();
    let client = AjaxClient::new().unwrap();

    let payload = json!({"entries": [["title", "notes"], ["doc", {"name": "n.md", "content": "# hi"}]]});
    let reply = client
        .upload_value(&format!("http://{addr}/upload"), "POST", &payload, None)
        .await
        .unwrap();

    let parts = uploaded(&reply.body);
    assert_eq!(parts[0].field, "title");
    assert_eq!(parts[0].text.as_deref(), Some("notes"));
    assert_eq!(parts[1].file_name.as_deref(), Some("n.md"));
}

#[tokio::test]
async fn decodes_text_multipart_and_bytes() {
    let addr = start_server();
    let client = AjaxClient::new().unwrap();

    let reply = client.get(&format!("http://{addr}/text"), None, None).await;
    assert_eq!(reply.body.as_text(), Some("foo"));

    let reply = client.get(&format!("http://{addr}/multipart"), None, None).await;
    let form = reply.body.as_form().expect("form body");
    assert_eq!(form.get("status").and_then(FormValue::as_text), Some("ok"));
    let report = form.get("report").and_then(FormValue::as_file).unwrap();
    assert_eq!(report.name, "report.txt");
    assert_eq!(report.bytes.as_ref(), b"all good");

    let reply = client.get(&format!("http://{addr}/bytes"), None, None).await;
    assert_eq!(reply.body.as_bytes().map(|b| b.to_vec()), Some(vec![0, 1, 2, 3]));
}

#[tokio::test]
async fn error_status_resolves_normally() {
    let addr = start_server();
    let client = AjaxClient::new().unwrap();

    let reply = client.delete(&format!("http://{addr}/status/404"), None, None).await;
    assert_eq!(reply.status, 404);
    assert_eq!(reply.body, ResponseBody::Json(json!({"status": 404})));
}

#[tokio::test]
async fn malformed_json_is_network_failure() {
    let addr = start_server();
    let client = AjaxClient::new().unwrap();

    let reply = client.get(&format!("http://{addr}/malformed"), None, None).await;
    assert!(reply.is_network_failure());
    assert!(reply.body.as_text().unwrap().starts_with("DecodeError:"));
}

#[tokio::test]
async fn refused_connection_is_network_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = AjaxClient::new().unwrap();
    let reply = client.get(&format!("http://{addr}/echo"), None, None).await;
    assert_eq!(reply.status, -1);
    assert!(reply.body.as_text().unwrap().starts_with("ConnectError:"));
}

#[tokio::test]
async fn default_headers_follow_set_and_remove() {
    let addr = start_server();
    let client = AjaxClient::new().unwrap();
    let url = format!("http://{addr}/echo");

    client.set_header("csrf", "abc");
    let reply = client.get(&url, None, None).await;
    assert_eq!(echo(&reply.body).headers.get("csrf").map(String::as_str), Some("abc"));

    client.remove_header("csrf");
    client.remove_header("Accept");
    let reply = client.get(&url, None, None).await;
    let seen = echo(&reply.body);
    assert!(!seen.headers.contains_key("csrf"));
    assert_eq!(seen.headers["accept"], "application/json");
}

#[tokio::test]
async fn concurrent_calls_are_independent() {
    let addr = start_server();
    let client = AjaxClient::new().unwrap();
    let url = format!("http://{addr}/echo?x=1");

    let first = Params::from([("n", "1")]);
    let second = Params::from([("n", "2")]);
    let (a, b) = tokio::join!(
        client.get(&url, Some(&first), Some(&[("X-Call", "first")])),
        client.get(&url, Some(&second), Some(&[("X-Call", "second")])),
    );

    let (a, b) = (echo(&a.body), echo(&b.body));
    assert_eq!(a.uri, "/echo?x=1&n=1");
    assert_eq!(a.headers["x-call"], "first");
    assert_eq!(b.uri, "/echo?x=1&n=2");
    assert_eq!(b.headers["x-call"], "second");
}

#[tokio::test(flavor = "multi_thread")]
async fn ureq_transport_drives_the_same_client() {
    let addr = start_server();
    let client = AjaxClient::with_transport(UreqTransport::new(), ClientConfig::default());

    let reply = client
        .post(&format!("http://{addr}/form"), Some(&Params::from([("a", "b")])), None)
        .await;
    assert_eq!(reply.body, ResponseBody::Json(json!([["a", "b"]])));

    let reply = client
        .upload_file(&format!("http://{addr}/upload"), "POST", FileLike::new("x.bin", vec![9u8; 4]), None)
        .await
        .unwrap();
    let parts = uploaded(&reply.body);
    assert_eq!(parts[0].field, "0");
    assert_eq!(parts[0].size, 4);

    let reply = client.get(&format!("http://{addr}/status/500"), None, None).await;
    assert_eq!(reply.status, 500);
}
