mod common;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use common::{app_for, bearer, mount_token, statistics_args};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOOL: &str = "process_satellite_imagery";
const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0x0d];

#[tokio::test]
async fn image_reply_is_base64_encoded_with_default_format() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/process"))
        .and(header("authorization", bearer().as_str()))
        .and(header("accept", "image/png"))
        .and(body_partial_json(serde_json::json!({
            "format": "image/png",
            "width": 512,
            "height": 512,
            "bbox": [13.0, 45.0, 13.5, 45.5]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PNG_BYTES.to_vec(), "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let mut args = statistics_args();
    args["width"] = serde_json::json!(512);
    args["height"] = serde_json::json!(512);
    let outcome = app_for(&server)
        .tool_executor
        .execute(TOOL, args)
        .await
        .expect("known tool");
    let payload = outcome.payload();

    assert!(!outcome.is_error(), "{}", payload);
    assert_eq!(payload["content_type"], "image/png");
    assert_eq!(payload["size_bytes"], PNG_BYTES.len());
    let decoded = STANDARD
        .decode(payload["image_data"].as_str().expect("image_data"))
        .expect("valid base64");
    assert_eq!(decoded, PNG_BYTES);
    assert_eq!(payload["request_info"]["output_format"], "image/png");
}

#[tokio::test]
async fn explicit_output_format_drives_accept_header() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/process"))
        .and(header("accept", "image/tiff"))
        .and(body_partial_json(serde_json::json!({ "format": "image/tiff" })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x49, 0x49, 0x2a, 0x00], "image/tiff"))
        .expect(1)
        .mount(&server)
        .await;

    let mut args = statistics_args();
    args["output_format"] = serde_json::json!("image/tiff");
    let outcome = app_for(&server)
        .tool_executor
        .execute(TOOL, args)
        .await
        .expect("known tool");
    let payload = outcome.payload();
    assert_eq!(payload["content_type"], "image/tiff");
    assert_eq!(payload["size_bytes"], 4);
}

#[tokio::test]
async fn json_reply_is_returned_as_data() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/process"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            serde_json::json!({"values": [[0.42]]}).to_string(),
            "application/geo+json",
        ))
        .mount(&server)
        .await;

    let mut args = statistics_args();
    args["output_format"] = serde_json::json!("application/json");
    let outcome = app_for(&server)
        .tool_executor
        .execute(TOOL, args)
        .await
        .expect("known tool");
    let payload = outcome.payload();
    assert_eq!(payload["success"], true);
    assert_eq!(payload["data"]["values"][0][0], 0.42);
    assert_eq!(payload["content_type"], "application/geo+json");
    assert!(payload.get("image_data").is_none());
}

#[tokio::test]
async fn geometry_is_sent_instead_of_bbox() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    let polygon = serde_json::json!({
        "type": "Polygon",
        "coordinates": [[[13.0, 45.0], [13.5, 45.0], [13.5, 45.5], [13.0, 45.5], [13.0, 45.0]]]
    });
    Mock::given(method("POST"))
        .and(path("/api/v1/process"))
        .and(body_partial_json(serde_json::json!({ "geometry": polygon })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PNG_BYTES.to_vec(), "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let mut args = statistics_args();
    args.as_object_mut().expect("object").remove("bbox");
    args["geometry"] = polygon;
    let outcome = app_for(&server)
        .tool_executor
        .execute(TOOL, args)
        .await
        .expect("known tool");
    let payload = outcome.payload();
    assert!(!outcome.is_error(), "{}", payload);
    assert_eq!(payload["request_info"]["has_geometry"], true);
    assert_eq!(payload["request_info"]["has_bbox"], false);

    let requests = server.received_requests().await.expect("recording enabled");
    let process = requests
        .iter()
        .find(|r| r.url.path() == "/api/v1/process")
        .expect("process request");
    let body: serde_json::Value = serde_json::from_slice(&process.body).expect("json body");
    assert!(body.get("bbox").is_none());
}

#[tokio::test]
async fn oversized_dimensions_are_rejected_by_schema() {
    let server = MockServer::start().await;
    mount_token(&server, 0).await;

    let mut args = statistics_args();
    args["width"] = serde_json::json!(4096);
    let outcome = app_for(&server)
        .tool_executor
        .execute(TOOL, args)
        .await
        .expect("known tool");
    let payload = outcome.payload();
    assert_eq!(payload["error_type"], "validation_error");
    assert_eq!(payload["code"], "schema_violation");
}
