//! ImageStore persistence tests against tempdirs and a local byte server.

use actix_web::{web, App, HttpResponse, HttpServer};
use paragen::{ImageReference, ImageStore, ParalonError, StorageConfig};
use std::net::TcpListener;

const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];

fn spawn_byte_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let server = HttpServer::new(|| {
        App::new().route(
            "/img.png",
            web::get().to(|| async { HttpResponse::Ok().body(PNG_BYTES) }),
        )
    })
    .workers(1)
    .listen(listener)
    .expect("listen")
    .run();

    actix_web::rt::spawn(server);

    format!("http://{}", addr)
}

fn store_in(dir: &std::path::Path) -> ImageStore {
    let config = StorageConfig::new().with_dirs(
        dir.join("uploads").to_string_lossy().to_string(),
        dir.join("generated").to_string_lossy().to_string(),
    );
    ImageStore::new(&config).unwrap()
}

#[actix_web::test]
async fn url_reference_written_verbatim_creating_dirs() {
    let base = spawn_byte_server();
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());

    let dest = temp.path().join("nested/deeper/out.png");
    let reference = ImageReference::Url(format!("{}/img.png", base));
    store.save(&reference, &dest).await.unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), PNG_BYTES);
}

#[actix_web::test]
async fn url_fetch_failure_is_transport_error() {
    let base = spawn_byte_server();
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());

    let dest = temp.path().join("out.png");
    let reference = ImageReference::Url(format!("{}/missing.png", base));
    let err = store.save(&reference, &dest).await.unwrap_err();

    assert!(matches!(err, ParalonError::TransportError(_)));
    assert!(!dest.exists());
}

#[tokio::test]
async fn invalid_base64_reports_decode_error_without_partial_write() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());

    let dest = temp.path().join("out.png");
    let reference = ImageReference::InlineData("!!!not-base64!!!".into());
    let err = store.save(&reference, &dest).await.unwrap_err();

    assert!(matches!(err, ParalonError::DecodeError(_)));
    assert!(!dest.exists());
}

#[tokio::test]
async fn inline_data_is_decoded_before_writing() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());

    let dest = temp.path().join("out.png");
    let reference = ImageReference::InlineData("aGVsbG8=".into());
    store.save(&reference, &dest).await.unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"hello");
}

#[tokio::test]
async fn generated_files_get_fresh_png_names() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());

    let reference = ImageReference::InlineData("aGVsbG8=".into());
    let first = store.save_generated(&reference).await.unwrap();
    let second = store.save_generated(&reference).await.unwrap();

    assert!(first.ends_with(".png"));
    assert!(second.ends_with(".png"));
    assert_ne!(first, second);
    assert!(temp.path().join("generated").join(&first).exists());
}

#[tokio::test]
async fn uploads_are_uuid_prefixed_under_upload_root() {
    let temp = tempfile::tempdir().unwrap();
    let store = store_in(temp.path());

    let path = store.save_upload("source.png", b"raw bytes").await.unwrap();

    assert!(path.starts_with(temp.path().join("uploads")));
    let name = path.file_name().unwrap().to_string_lossy();
    assert!(name.ends_with("_source.png"));
    assert_eq!(std::fs::read(&path).unwrap(), b"raw bytes");
}
