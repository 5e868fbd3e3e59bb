use std::io::Cursor;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use base64::Engine;
use http_body_util::BodyExt;
use image::{ImageFormat, Rgb, RgbImage};
use lens_axum::{axum, AxumApp, LensAxumState};
use lens_blob::{DefaultKeyScheme, LocalDiskStore, MemoryStore, ObjectStore, UrlSigner};
use lens_core::{Asset, Container, ContainerId, GalleryRecords, MemoryRecords, OwnerId};
use lens_media::{FeedConfig, FeedSampler, JpegThumbnailer, MediaConfig, MediaPipeline, PhotoService};
use serde_json::{json, Value};
use tower::ServiceExt;

const BOUNDARY: &str = "lens-test-boundary";

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    RgbImage::from_pixel(width, height, Rgb([12, 120, 200]))
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn data_uri(bytes: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

fn multipart(parts: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (file_name, content_type, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"files\"; filename=\"{file_name}\"\r\n").as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

struct Harness {
    ax: AxumApp,
    records: MemoryRecords,
}

fn harness_with(store: Arc<dyn ObjectStore>, local: Option<Arc<LocalDiskStore>>) -> Harness {
    let records = MemoryRecords::new();
    records.insert_container(Container::new("g1", "alice", "Lisbon"));
    records.insert_container(Container::new("g2", "bob", "Porto"));

    let pipeline = Arc::new(MediaPipeline::new(
        store,
        Arc::new(DefaultKeyScheme),
        Arc::new(JpegThumbnailer::default()),
        MediaConfig::default().with_max_file_bytes(64 * 1024),
    ));
    let photos = Arc::new(PhotoService::new(pipeline.clone(), Arc::new(records.clone())));
    let feed = Arc::new(FeedSampler::new(
        Arc::new(records.clone()),
        pipeline,
        FeedConfig {
            sample_size: 50,
            page_size: 2,
        },
    ));

    let mut state = LensAxumState::new(photos, feed, 1024 * 1024);
    if let Some(local) = local {
        state = state.with_local_blobs(local);
    }
    Harness {
        ax: axum(state),
        records,
    }
}

fn harness() -> Harness {
    harness_with(Arc::new(MemoryStore::new()), None)
}

async fn send(ax: &AxumApp, request: Request<Body>) -> axum::response::Response {
    ax.router.clone().oneshot(request).await.unwrap()
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn raw_body(res: axum::response::Response) -> Vec<u8> {
    res.into_body().collect().await.unwrap().to_bytes().to_vec()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-owner-id", "alice")
        .body(Body::empty())
        .unwrap()
}

fn post_encoded(uri: &str, bytes: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-owner-id", "alice")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "dataUri": data_uri(bytes), "fileName": "edited.png" }).to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn health_ok() {
    let h = harness();
    let res = send(&h.ax, Request::builder().uri("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(res.status().as_u16(), 200);
    assert!(res.headers().get("x-request-id").is_some());
    assert_eq!(raw_body(res).await, b"ok");
}

#[tokio::test]
async fn missing_owner_is_401_with_feathers_shape() {
    let h = harness();
    let res = send(
        &h.ax,
        Request::builder().uri("/galleries/g1/photos").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(res.status().as_u16(), 401);
    let body = json_body(res).await;
    assert_eq!(body["name"], "NotAuthenticated");
    assert_eq!(body["code"], 401);
    assert_eq!(body["className"], "not-authenticated");
}

#[tokio::test]
async fn request_id_is_preserved_when_provided() {
    let h = harness();
    let provided = HeaderValue::from_static("req-test-123");
    let res = send(
        &h.ax,
        Request::builder()
            .uri("/health")
            .header("x-request-id", provided.clone())
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(res.headers().get("x-request-id").unwrap(), &provided);
}

#[tokio::test]
async fn multipart_batch_reports_each_file() {
    let h = harness();
    let image = png(40, 30);
    let body = multipart(&[
        ("a.png", "image/png", &image),
        ("notes.txt", "text/plain", b"hello"),
        ("b.png", "image/png", &image),
    ]);

    let res = send(
        &h.ax,
        Request::builder()
            .method("POST")
            .uri("/galleries/g1/photos")
            .header("x-owner-id", "alice")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap(),
    )
    .await;

    assert_eq!(res.status().as_u16(), 200);
    let report = json_body(res).await;
    assert_eq!(report["stored"], 2);
    assert_eq!(report["rejected"], 1);
    assert_eq!(report["failed"], 0);
    assert_eq!(report["items"][1]["status"], "rejected");
    assert_eq!(report["items"][1]["fileName"], "notes.txt");
    assert_eq!(h.records.asset_count(), 2);

    let listed = json_body(send(&h.ax, get("/galleries/g1/photos")).await).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed[0]["displayUrl"]["url"].as_str().unwrap().contains("/thumbnail/"));
    assert!(listed[0]["fullUrl"]["url"].as_str().unwrap().contains("/original/"));
    assert!(listed[0]["displayUrl"]["expiresAt"].is_string());
}

#[tokio::test]
async fn encoded_upload_then_url_download_and_delete() {
    let h = harness();
    let image = png(20, 20);

    let res = send(&h.ax, post_encoded("/galleries/g1/photos", &image)).await;
    assert_eq!(res.status().as_u16(), 201);
    let asset = json_body(res).await;
    let id = asset["id"].as_str().unwrap().to_string();
    assert_eq!(asset["contentType"], "image/png");

    let url = json_body(send(&h.ax, get(&format!("/galleries/g1/photos/{id}/url?variant=full"))).await).await;
    assert!(url["url"].as_str().unwrap().contains("/original/"));
    assert!(url["expiresAt"].is_string());

    let res = send(&h.ax, get(&format!("/galleries/g1/photos/{id}/download"))).await;
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.headers()["content-type"], "image/png");
    let disposition = res.headers()["content-disposition"].to_str().unwrap().to_string();
    assert_eq!(disposition, format!("attachment; filename=\"{id}.png\""));
    assert_eq!(raw_body(res).await, image);

    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri(format!("/galleries/g1/photos/{id}"))
            .header("x-owner-id", "alice")
            .body(Body::empty())
            .unwrap()
    };
    assert_eq!(send(&h.ax, delete()).await.status().as_u16(), 204);
    assert_eq!(h.records.asset_count(), 0);
    assert_eq!(send(&h.ax, delete()).await.status().as_u16(), 404);
}

#[tokio::test]
async fn unknown_variant_is_400() {
    let h = harness();
    let res = send(&h.ax, post_encoded("/galleries/g1/photos", &png(4, 4))).await;
    let id = json_body(res).await["id"].as_str().unwrap().to_string();

    let res = send(&h.ax, get(&format!("/galleries/g1/photos/{id}/url?variant=poster"))).await;
    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(json_body(res).await["className"], "bad-request");
}

#[tokio::test]
async fn malformed_payload_is_400_and_foreign_gallery_is_404() {
    let h = harness();

    let res = send(
        &h.ax,
        Request::builder()
            .method("POST")
            .uri("/galleries/g1/photos")
            .header("x-owner-id", "alice")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "dataUri": "not-a-data-uri" }).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(res.status().as_u16(), 400);

    let res = send(&h.ax, post_encoded("/galleries/g2/photos", &png(4, 4))).await;
    assert_eq!(res.status().as_u16(), 404);
    assert_eq!(json_body(res).await["name"], "NotFound");
}

#[tokio::test]
async fn unsupported_body_type_is_415() {
    let h = harness();
    let res = send(
        &h.ax,
        Request::builder()
            .method("POST")
            .uri("/galleries/g1/photos")
            .header("x-owner-id", "alice")
            .header("content-type", "text/plain")
            .body(Body::from("hi"))
            .unwrap(),
    )
    .await;
    assert_eq!(res.status().as_u16(), 415);
}

#[tokio::test]
async fn legacy_download_redirects() {
    let h = harness();
    let legacy = Asset::legacy(OwnerId::new("alice"), ContainerId::new("g1"), "/uploads/old.jpg");
    let id = legacy.id.clone();
    h.records.save_asset(legacy).await.unwrap();

    let res = send(&h.ax, get(&format!("/galleries/g1/photos/{id}/download"))).await;
    assert_eq!(res.status().as_u16(), 302);
    assert_eq!(res.headers()["location"], "/uploads/old.jpg");
}

#[tokio::test]
async fn feed_pages_set_has_more_header() {
    let h = harness();
    for i in 0..3 {
        let asset = Asset::legacy(OwnerId::new("alice"), ContainerId::new("g1"), format!("/uploads/{i}.jpg"));
        h.records.save_asset(asset).await.unwrap();
    }

    let res = send(&h.ax, get("/feed")).await;
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.headers()["x-hasmore"], "1");
    let page = json_body(res).await;
    assert_eq!(page["page"], 1);
    assert_eq!(page["pageSize"], 2);
    assert_eq!(page["hasMore"], true);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
    let item = &page["items"][0];
    assert!(item["fullUrl"].as_str().unwrap().starts_with("/uploads/"));
    assert_eq!(item["fullUrl"], item["imageUrl"]);

    let res = send(&h.ax, get("/feed?page=2")).await;
    assert_eq!(res.headers()["x-hasmore"], "0");
    assert_eq!(json_body(res).await["items"].as_array().unwrap().len(), 1);

    let res = send(&h.ax, get("/feed?page=-4")).await;
    assert_eq!(json_body(res).await["page"], 1);
}

#[tokio::test]
async fn local_blobs_are_served_behind_signatures() {
    let dir = tempfile::tempdir().unwrap();
    let signer = UrlSigner::new("test-secret").unwrap();
    let local = Arc::new(LocalDiskStore::new(dir.path(), "/blobs", signer.clone()));
    let h = harness_with(local.clone(), Some(local));
    let image = png(16, 16);

    let asset = json_body(send(&h.ax, post_encoded("/galleries/g1/photos", &image)).await).await;
    let id = asset["id"].as_str().unwrap();
    let key = asset["originalKey"].as_str().unwrap().to_string();

    let url = json_body(send(&h.ax, get(&format!("/galleries/g1/photos/{id}/url?variant=full"))).await).await;
    let signed = url["url"].as_str().unwrap().to_string();
    assert!(signed.starts_with(&format!("/blobs/{key}?expires=")));

    let res = send(&h.ax, Request::builder().uri(&signed).body(Body::empty()).unwrap()).await;
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(raw_body(res).await, image);

    let soon = chrono::Utc::now().timestamp() + 60;
    let short = format!("/blobs/{key}?expires={soon}&sig={}", signer.sign(&key, soon));
    let res = send(&h.ax, Request::builder().uri(&short).body(Body::empty()).unwrap()).await;
    assert_eq!(res.status().as_u16(), 200);
    let max_age: i64 = res.headers()["cache-control"]
        .to_str()
        .unwrap()
        .trim_start_matches("private, max-age=")
        .parse()
        .unwrap();
    assert!((0..=60).contains(&max_age));

    let tampered = format!("{}0", signed);
    let res = send(&h.ax, Request::builder().uri(&tampered).body(Body::empty()).unwrap()).await;
    assert_eq!(res.status().as_u16(), 403);

    let unsigned = format!("/blobs/{key}");
    let res = send(&h.ax, Request::builder().uri(&unsigned).body(Body::empty()).unwrap()).await;
    assert_eq!(res.status().as_u16(), 403);

    let past = 1_000;
    let expired = format!("/blobs/{key}?expires={past}&sig={}", signer.sign(&key, past));
    let res = send(&h.ax, Request::builder().uri(&expired).body(Body::empty()).unwrap()).await;
    assert_eq!(res.status().as_u16(), 410);

    let ghost = "alice/g1/original/missing.png";
    let future = 4_102_444_800;
    let absent = format!("/blobs/{ghost}?expires={future}&sig={}", signer.sign(ghost, future));
    let res = send(&h.ax, Request::builder().uri(&absent).body(Body::empty()).unwrap()).await;
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn blobs_without_local_store_are_404() {
    let h = harness();
    let res = send(
        &h.ax,
        Request::builder()
            .uri("/blobs/a/b.png?expires=1&sig=00")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status().as_u16(), 404);
}
