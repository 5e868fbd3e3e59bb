use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use lens_core::LensConfig;
use tower::ServiceExt;

fn memory_config() -> LensConfig {
    let mut config = LensConfig::new();
    config.set("storage.provider", "memory");
    config.set("http.port", "4040");
    config
}

#[tokio::test]
async fn boots_with_memory_store() {
    let (ax, http) = lens_server::build(&memory_config()).await.unwrap();
    assert_eq!(http.addr(), "127.0.0.1:4040");

    let res = ax
        .router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), "ok");
    assert!(ax.state.blobs.is_none());
}

#[tokio::test]
async fn unknown_provider_refuses_to_start() {
    let mut config = memory_config();
    config.set("storage.provider", "ftp");

    let err = lens_server::build(&config).await.err().unwrap();
    assert!(format!("{err:#}").contains("storage"));
}
