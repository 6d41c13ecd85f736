//! Tests against a real listener: concurrent clients and clients that hang up
//! mid-download.
//!
//! Run with: `cargo test --test server_test`

mod helpers;

use helpers::{embedded_image_size, load_pdf, noisy_png, png, spawn_server, wait_until_empty};
use reqwest::multipart::{Form, Part};

fn image_form(image: Vec<u8>) -> Form {
    Form::new().part("image", Part::bytes(image).file_name("photo.png"))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_conversions_stay_isolated() {
    let (addr, app) = spawn_server().await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/convert", addr);

    let handles: Vec<_> = (0..8u32)
        .map(|i| {
            let client = client.clone();
            let url = url.clone();
            let (width, height) = (100 + 10 * i, 50 + 7 * i);
            tokio::spawn(async move {
                let response = client
                    .post(&url)
                    .multipart(image_form(png(width, height)))
                    .send()
                    .await
                    .unwrap();
                assert_eq!(response.status(), reqwest::StatusCode::OK);

                let bytes = response.bytes().await.unwrap();
                let pdf = load_pdf(&bytes);
                assert_eq!(pdf.get_pages().len(), 1);
                assert_eq!(
                    embedded_image_size(&pdf),
                    (i64::from(width), i64::from(height))
                );
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    assert!(wait_until_empty(app.upload_dir.path()).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_client_abort_during_download_cleans_up() {
    let (addr, app) = spawn_server().await;
    let client = reqwest::Client::new();

    let mut response = client
        .post(format!("http://{}/convert", addr))
        .multipart(image_form(noisy_png(1000, 1000)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    // Take one chunk, then hang up.
    let first = response.chunk().await.unwrap();
    assert!(first.is_some());
    drop(response);
    drop(client);

    assert!(wait_until_empty(app.upload_dir.path()).await);
}

#[tokio::test]
async fn test_missing_field_over_http() {
    let (addr, app) = spawn_server().await;

    let form = Form::new().text("caption", "nothing attached");
    let response = reqwest::Client::new()
        .post(format!("http://{}/convert", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap(), "No image uploaded");
    assert_eq!(helpers::residual_files(app.upload_dir.path()), 0);
}
