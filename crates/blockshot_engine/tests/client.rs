use std::time::Duration;

use blockshot_core::{Batch, BatchFailure, TextFragment};
use blockshot_engine::{
    ConverterClient, ConverterSettings, ReqwestConverterClient, GENERIC_CONVERTER_ERROR,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn batch(items: &[&str]) -> Batch {
    let fragments: Vec<TextFragment> = items.iter().map(|s| TextFragment::from(*s)).collect();
    let size = fragments.iter().map(|f| f.len() + 64).sum();
    Batch { fragments, size }
}

fn settings(server: &MockServer, route: &str) -> ConverterSettings {
    ConverterSettings::new(format!("{}{route}", server.uri()), "secret-key")
}

fn form_pairs(request: &Request) -> Vec<(String, String)> {
    url::form_urlencoded::parse(&request.body)
        .into_owned()
        .collect()
}

#[tokio::test]
async fn success_surfaces_output_file_and_sends_form_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/convert"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "data": { "rendering": { "output_file": "renders/batch-1.zip" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = settings(&server, "/convert");
    settings.css_url = Some("https://cdn.example.com/site.css".into());
    settings.render_engine = "chromium".into();
    let client = ReqwestConverterClient::new(settings);

    let result = client
        .send(&batch(&["<p>Hello & bye</p>", "<h2>Two</h2>"]), 1, 1)
        .await;

    assert!(result.success);
    assert_eq!(result.batch, 1);
    assert_eq!(result.http_code, 200);
    assert_eq!(result.blocks, 2);
    assert_eq!(result.output_file.as_deref(), Some("renders/batch-1.zip"));
    assert_eq!(result.error, None);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        form_pairs(&requests[0]),
        vec![
            ("api_key".to_string(), "secret-key".to_string()),
            ("html_blocks[]".to_string(), "<p>Hello & bye</p>".to_string()),
            ("html_blocks[]".to_string(), "<h2>Two</h2>".to_string()),
            ("css_url".to_string(), "https://cdn.example.com/site.css".to_string()),
            ("render_engine".to_string(), "chromium".to_string()),
        ]
    );
}

#[tokio::test]
async fn blank_render_engine_defaults_to_auto_and_css_is_omitted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "success": 1 })))
        .mount(&server)
        .await;

    let mut settings = settings(&server, "/convert");
    settings.render_engine = "  ".into();
    let result = ReqwestConverterClient::new(settings)
        .send(&batch(&["<p>x</p>"]), 2, 3)
        .await;

    assert!(result.success);
    assert_eq!(result.batch, 2);
    assert_eq!(result.output_file, None);

    let requests = server.received_requests().await.unwrap();
    let pairs = form_pairs(&requests[0]);
    assert!(pairs.contains(&("render_engine".to_string(), "auto".to_string())));
    assert!(pairs.iter().all(|(k, _)| k != "css_url"));
}

#[tokio::test]
async fn converter_rejection_uses_its_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "message": "quota exhausted"
        })))
        .mount(&server)
        .await;

    let result = ReqwestConverterClient::new(settings(&server, "/convert"))
        .send(&batch(&["<p>x</p>"]), 1, 1)
        .await;

    assert!(!result.success);
    assert_eq!(result.http_code, 200);
    assert_eq!(result.failure, Some(BatchFailure::Rejected));
    assert_eq!(result.error.as_deref(), Some("quota exhausted"));
}

#[tokio::test]
async fn error_field_is_preferred_on_http_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "success": false,
            "error": "invalid api key",
            "message": "unauthorized"
        })))
        .mount(&server)
        .await;

    let result = ReqwestConverterClient::new(settings(&server, "/convert"))
        .send(&batch(&["<p>x</p>"]), 1, 1)
        .await;

    assert!(!result.success);
    assert_eq!(result.http_code, 401);
    assert_eq!(result.failure, Some(BatchFailure::HttpStatus));
    assert_eq!(result.error.as_deref(), Some("invalid api key"));
}

#[tokio::test]
async fn success_flag_with_error_status_is_still_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({ "success": true })))
        .mount(&server)
        .await;

    let result = ReqwestConverterClient::new(settings(&server, "/convert"))
        .send(&batch(&["<p>x</p>"]), 1, 1)
        .await;

    assert!(!result.success);
    assert_eq!(result.http_code, 503);
    assert_eq!(result.error.as_deref(), Some(GENERIC_CONVERTER_ERROR));
}

#[tokio::test]
async fn unparsable_bodies_get_the_generic_marker() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<h1>Internal Server Error</h1>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let failed = ReqwestConverterClient::new(settings(&server, "/broken"))
        .send(&batch(&["<p>x</p>"]), 1, 2)
        .await;
    assert!(!failed.success);
    assert_eq!(failed.http_code, 500);
    assert_eq!(failed.failure, Some(BatchFailure::HttpStatus));
    assert_eq!(failed.error.as_deref(), Some(GENERIC_CONVERTER_ERROR));

    let garbled = ReqwestConverterClient::new(settings(&server, "/garbled"))
        .send(&batch(&["<p>x</p>"]), 2, 2)
        .await;
    assert!(!garbled.success);
    assert_eq!(garbled.http_code, 200);
    assert_eq!(garbled.failure, Some(BatchFailure::InvalidBody));
    assert_eq!(garbled.error.as_deref(), Some(GENERIC_CONVERTER_ERROR));
}

#[tokio::test]
async fn slow_converter_times_out_as_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_json(serde_json::json!({ "success": true })),
        )
        .mount(&server)
        .await;

    let mut settings = settings(&server, "/convert");
    settings.connect_timeout = Duration::from_millis(50);
    settings.request_timeout = Duration::from_millis(100);
    let result = ReqwestConverterClient::new(settings)
        .send(&batch(&["<p>x</p>"]), 1, 1)
        .await;

    assert!(!result.success);
    assert_eq!(result.http_code, 0);
    assert_eq!(result.failure, Some(BatchFailure::Transport));
    assert!(
        result.error.as_deref().unwrap().contains("timed out"),
        "unexpected error: {:?}",
        result.error
    );
}

#[tokio::test]
async fn redirect_chains_are_capped() {
    let server = MockServer::start().await;
    let target = format!("{}/loop", server.uri());
    Mock::given(path("/loop"))
        .respond_with(ResponseTemplate::new(307).insert_header("Location", target.as_str()))
        .mount(&server)
        .await;

    let result = ReqwestConverterClient::new(settings(&server, "/loop"))
        .send(&batch(&["<p>x</p>"]), 1, 1)
        .await;

    assert!(!result.success);
    assert_eq!(result.failure, Some(BatchFailure::Transport));
    assert!(result.error.as_deref().unwrap().contains("redirect"));
    let requests = server.received_requests().await.unwrap();
    assert!(requests.len() <= 4, "followed {} hops", requests.len());
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_failure() {
    // Bind and release a port so nothing is listening on it.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let uri = format!("http://127.0.0.1:{port}");

    let mut settings = ConverterSettings::new(format!("{uri}/convert"), "k");
    settings.connect_timeout = Duration::from_millis(200);
    settings.request_timeout = Duration::from_secs(1);
    let result = ReqwestConverterClient::new(settings)
        .send(&batch(&["<p>x</p>"]), 1, 1)
        .await;

    assert!(!result.success);
    assert_eq!(result.http_code, 0);
    assert_eq!(result.failure, Some(BatchFailure::Transport));
    assert!(result.error.is_some());
}
