//! Shared setup for the conversion API tests.

#![allow(dead_code)]

use std::{
    io::Cursor,
    net::SocketAddr,
    path::Path,
    sync::Arc,
    time::Duration,
};

use axum::Router;
use image::{ImageFormat, Rgb, RgbImage};
use img2pdf_service::{
    adapters::{routes::build_router, state::AppState},
    application::services::DocumentGenerator,
    domain::config::server::ServerConfig,
    services::{create_document_generator, TempStorage},
};
use lopdf::{Document, Stream};
use tempfile::TempDir;

pub const BOUNDARY: &str = "img2pdf-test-boundary";

pub struct TestApp {
    pub upload_dir: TempDir,
    pub router: Router,
}

impl TestApp {
    pub fn residual_files(&self) -> usize {
        residual_files(self.upload_dir.path())
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(ServerConfig::default()).await
}

pub async fn setup_test_app_with(config: ServerConfig) -> TestApp {
    setup_test_app_from(config, create_document_generator()).await
}

pub async fn setup_test_app_from(
    mut config: ServerConfig,
    document_generator: Arc<dyn DocumentGenerator>,
) -> TestApp {
    let upload_dir = TempDir::new().unwrap();
    config.upload_dir = upload_dir.path().to_path_buf();

    let storage = TempStorage::init(&config.upload_dir).await.unwrap();
    let app_state = AppState {
        storage: Arc::new(storage),
        document_generator,
    };

    TestApp {
        router: build_router(app_state, &config),
        upload_dir,
    }
}

/// Serves the app on an ephemeral local port.
pub async fn spawn_server() -> (SocketAddr, TestApp) {
    let app = setup_test_app().await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (addr, app)
}

pub fn residual_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

/// Polls until the upload directory is empty. Cleanup on a real connection
/// runs after the last byte leaves the server, which can trail the client.
pub async fn wait_until_empty(dir: &Path) -> bool {
    for _ in 0..100 {
        if residual_files(dir) == 0 {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

/// Solid-color PNG of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    encode(RgbImage::from_pixel(width, height, Rgb([40, 160, 90])))
}

/// PNG filled with pseudo-random pixels so it does not compress away.
pub fn noisy_png(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x9E37_79B9;
    let image = RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xFF) as u8
        };
        Rgb([next(), next(), next()])
    });
    encode(image)
}

fn encode(image: RgbImage) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

/// One multipart part: field name, optional filename, content.
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub content: &'a [u8],
}

pub fn image_part(content: &[u8]) -> Part<'_> {
    Part {
        name: "image",
        filename: Some("photo.png"),
        content,
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    part.name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    part.name
                )
                .as_bytes(),
            ),
        }
        body.extend_from_slice(part.content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub fn load_pdf(bytes: &[u8]) -> Document {
    Document::load_mem(bytes).expect("response is not a readable PDF")
}

pub fn embedded_image(doc: &Document) -> &Stream {
    let page_id = *doc.get_pages().get(&1).unwrap();
    let page = doc.get_dictionary(page_id).unwrap();
    let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
    let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
    let image_id = xobjects.get(b"Im0").unwrap().as_reference().unwrap();
    doc.get_object(image_id).unwrap().as_stream().unwrap()
}

pub fn embedded_image_size(doc: &Document) -> (i64, i64) {
    let image = embedded_image(doc);
    (
        image.dict.get(b"Width").unwrap().as_i64().unwrap(),
        image.dict.get(b"Height").unwrap().as_i64().unwrap(),
    )
}

/// Operands of the `cm` operator that places the image: width, 0, 0,
/// height, x, y.
pub fn placement(doc: &Document) -> Vec<f32> {
    let page_id = *doc.get_pages().get(&1).unwrap();
    let content = doc.get_and_decode_page_content(page_id).unwrap();
    let cm = content
        .operations
        .iter()
        .find(|op| op.operator == "cm")
        .unwrap();
    cm.operands.iter().map(|o| o.as_float().unwrap()).collect()
}
