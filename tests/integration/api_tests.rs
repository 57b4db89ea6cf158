//! API integration tests for mosaic generation and error handling.
//!
//! Tests verify:
//! - Mosaic generation through `POST /mosaic`
//! - Error cases (missing fields, bad values, undecodable upload, empty corpus)
//! - Tile listing, reload and health endpoints
//! - HTTP response codes and headers
//! - CORS preflights and exposed headers

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use photo_mosaic::RouterConfig;

use super::test_utils::{
    assert_near, black_white_source, decode_rgb, is_valid_jpeg, mosaic_request, quadrant_png,
    router_for, router_with_config, solid_png, split_png, upload, MockTileSource, MultipartBody,
};

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// =============================================================================
// Mosaic Generation
// =============================================================================

#[tokio::test]
async fn test_mosaic_success() {
    let router = router_for(black_white_source()).await;
    let image = split_png(8, 8, [20, 20, 20], [230, 230, 230]);

    let response = router.oneshot(mosaic_request(upload(&image, "4"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "image/jpeg"
    );
    assert_eq!(response.headers().get("x-mosaic-blocks").unwrap(), "4");
    assert_eq!(
        response.headers().get("x-mosaic-blocks-skipped").unwrap(),
        "0"
    );
    assert_eq!(response.headers().get("x-mosaic-tile-size").unwrap(), "4");
    assert!(response.headers().contains_key("x-mosaic-duration-ms"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(is_valid_jpeg(&body), "Response should be a valid JPEG");

    let mosaic = decode_rgb(&body);
    assert_eq!(mosaic.dimensions(), (8, 8));
    assert_near(&mosaic, 1, 1, [0, 0, 0]);
    assert_near(&mosaic, 6, 6, [255, 255, 255]);
}

#[tokio::test]
async fn test_mosaic_places_each_quadrant() {
    let source = MockTileSource::new()
        .with_solid_tile("blue.png", [0, 0, 255], 16)
        .with_solid_tile("green.png", [0, 255, 0], 16)
        .with_solid_tile("red.png", [255, 0, 0], 16)
        .with_solid_tile("white.png", [255, 255, 255], 16);
    let router = router_for(source).await;

    let colors = [[255, 0, 0], [0, 255, 0], [0, 0, 255], [255, 255, 255]];
    let image = quadrant_png(32, 32, colors);
    let body = upload(&image, "16").text("quality", "95");

    let response = router.oneshot(mosaic_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let mosaic = decode_rgb(&bytes);
    assert_near(&mosaic, 8, 8, colors[0]);
    assert_near(&mosaic, 24, 8, colors[1]);
    assert_near(&mosaic, 8, 24, colors[2]);
    assert_near(&mosaic, 24, 24, colors[3]);
}

#[tokio::test]
async fn test_mosaic_odd_dimensions_preserved() {
    let router = router_for(black_white_source()).await;
    let image = solid_png(7, 5, [10, 10, 10]);

    let response = router.oneshot(mosaic_request(upload(&image, "2"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(decode_rgb(&bytes).dimensions(), (7, 5));
}

#[tokio::test]
async fn test_mosaic_empty_quality_uses_default() {
    let router = router_for(black_white_source()).await;
    let image = solid_png(4, 4, [200, 200, 200]);
    let body = upload(&image, "2").text("quality", "");

    let response = router.oneshot(mosaic_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_mosaic_ignores_unknown_fields() {
    let router = router_for(black_white_source()).await;
    let image = solid_png(4, 4, [200, 200, 200]);
    let body = upload(&image, "2").text("submit", "Generate");

    let response = router.oneshot(mosaic_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Form Errors
// =============================================================================

#[tokio::test]
async fn test_mosaic_missing_image() {
    let router = router_for(black_white_source()).await;
    let body = MultipartBody::new().text("tile_size", "4");

    let response = router.oneshot(mosaic_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "invalid_form");
    assert!(json["message"].as_str().unwrap().contains("image"));
}

#[tokio::test]
async fn test_mosaic_missing_tile_size() {
    let router = router_for(black_white_source()).await;
    let image = solid_png(4, 4, [0, 0, 0]);
    let body = MultipartBody::new().file("image", "a.png", "image/png", &image);

    let response = router.oneshot(mosaic_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["message"].as_str().unwrap().contains("tile_size"));
}

#[tokio::test]
async fn test_mosaic_non_numeric_tile_size() {
    let router = router_for(black_white_source()).await;
    let image = solid_png(4, 4, [0, 0, 0]);

    let response = router
        .oneshot(mosaic_request(upload(&image, "large")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_form");
}

#[tokio::test]
async fn test_mosaic_zero_tile_size() {
    let router = router_for(black_white_source()).await;
    let image = solid_png(4, 4, [0, 0, 0]);

    let response = router.oneshot(mosaic_request(upload(&image, "0"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_tile_size");
}

#[tokio::test]
async fn test_mosaic_tile_size_above_limit() {
    let router = router_for(black_white_source()).await;
    let image = solid_png(4, 4, [0, 0, 0]);

    // router_for caps tile size at 64
    let response = router.oneshot(mosaic_request(upload(&image, "65"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_tile_size");
}

#[tokio::test]
async fn test_mosaic_tile_size_wider_than_tiles() {
    let router = router_for(black_white_source()).await;
    let image = solid_png(64, 64, [10, 10, 10]);

    // Within the limit, but the corpus tiles are only 8px wide
    let response = router.oneshot(mosaic_request(upload(&image, "16"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "invalid_tile_size");
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_mosaic_invalid_quality() {
    let router = router_for(black_white_source()).await;
    let image = solid_png(4, 4, [0, 0, 0]);
    let body = upload(&image, "2").text("quality", "0");

    let response = router.oneshot(mosaic_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_quality");
}

#[tokio::test]
async fn test_mosaic_undecodable_image() {
    let router = router_for(black_white_source()).await;
    let body = upload(b"definitely not an image", "4");

    let response = router.oneshot(mosaic_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body_json(response).await["error"], "unsupported_image");
}

#[tokio::test]
async fn test_mosaic_upload_too_large() {
    let config = RouterConfig::new()
        .with_tracing(false)
        .with_max_upload_bytes(1024);
    let router = router_with_config(black_white_source(), config).await;
    let body = upload(&vec![0u8; 4096], "4");

    let response = router.oneshot(mosaic_request(body)).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_mosaic_without_multipart_body() {
    let router = router_for(black_white_source()).await;
    let request = Request::builder()
        .method("POST")
        .uri("/mosaic")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

// =============================================================================
// Empty Corpus
// =============================================================================

#[tokio::test]
async fn test_mosaic_empty_corpus() {
    let router = router_for(MockTileSource::new()).await;
    let image = solid_png(4, 4, [0, 0, 0]);

    let response = router.oneshot(mosaic_request(upload(&image, "2"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = body_json(response).await;
    assert_eq!(json["error"], "no_tiles");
    assert_eq!(json["message"], "No tiles available");
    assert_eq!(json["status"], 503);
}

// =============================================================================
// Corpus Endpoints
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let router = router_for(black_white_source()).await;

    let response = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["tiles"], 2);
}

#[tokio::test]
async fn test_tiles_endpoint() {
    let router = router_for(black_white_source()).await;

    let response = router.oneshot(get("/tiles")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["count"], 2);
    assert_eq!(json["tiles"][0]["id"], "black.png");
    assert_eq!(json["tiles"][0]["color"][0], 0.0);
    assert_eq!(json["tiles"][1]["id"], "white.png");
    assert_eq!(json["tiles"][1]["color"][2], 255.0);
}

#[tokio::test]
async fn test_reload_picks_up_new_tiles() {
    let source = black_white_source();
    let router = router_for(source.clone()).await;

    source.add_tile("red.png", solid_png(8, 8, [255, 0, 0]));

    let reload = Request::builder()
        .method("POST")
        .uri("/tiles/reload")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(reload).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["count"], 3);

    let response = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(body_json(response).await["tiles"], 3);
}

#[tokio::test]
async fn test_reload_requires_post() {
    let router = router_for(black_white_source()).await;

    let response = router.oneshot(get("/tiles/reload")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// Cross-Origin Access
// =============================================================================

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method("OPTIONS")
        .uri("/mosaic")
        .header("origin", origin)
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_preflight_allows_any_origin_by_default() {
    let router = router_for(black_white_source()).await;

    let response = router.oneshot(preflight("https://gallery.example")).await.unwrap();
    assert!(response.status().is_success());

    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    let methods = headers["access-control-allow-methods"].to_str().unwrap();
    assert!(methods.contains("POST"));
}

#[tokio::test]
async fn test_preflight_respects_allowed_origins() {
    let config = RouterConfig::new()
        .with_tracing(false)
        .with_allowed_origins(["https://gallery.example"]);
    let router = router_with_config(black_white_source(), config).await;

    let allowed = router
        .clone()
        .oneshot(preflight("https://gallery.example"))
        .await
        .unwrap();
    assert_eq!(
        allowed.headers()["access-control-allow-origin"],
        "https://gallery.example"
    );

    let refused = router.oneshot(preflight("https://elsewhere.example")).await.unwrap();
    assert!(refused.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_cross_origin_mosaic_exposes_stats_headers() {
    let router = router_for(black_white_source()).await;
    let image = split_png(8, 8, [20, 20, 20], [230, 230, 230]);

    let mut request = mosaic_request(upload(&image, "4"));
    request
        .headers_mut()
        .insert("origin", "https://gallery.example".parse().unwrap());

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let exposed = response.headers()["access-control-expose-headers"]
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(exposed.contains("x-mosaic-duration-ms"));
    assert!(exposed.contains("x-mosaic-blocks-skipped"));
}

// =============================================================================
// Upload Page
// =============================================================================

#[tokio::test]
async fn test_upload_page() {
    let router = router_for(black_white_source()).await;

    let response = router.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains(r#"name="tile_size""#));
    assert!(html.contains("2 tiles indexed"));
}

#[tokio::test]
async fn test_unknown_route() {
    let router = router_for(black_white_source()).await;

    let response = router.oneshot(get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
