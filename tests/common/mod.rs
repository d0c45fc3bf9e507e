//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::net::{SocketAddr, TcpListener};
use std::path::Path;

use axum::Router;

pub const BOUNDARY: &str = "stylizer-test-boundary";

/// Serve `app` on an ephemeral port and return its base URL.
pub fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.set_nonblocking(true).expect("nonblocking listener");
    let addr: SocketAddr = listener.local_addr().expect("local addr");
    let server = axum::Server::from_tcp(listener)
        .expect("server from listener")
        .serve(app.into_make_service());
    tokio::spawn(async move {
        let _ = server.await;
    });
    format!("http://{}", addr)
}

/// Hand-built `multipart/form-data` body.
pub fn multipart_body(image: Option<(&str, &str, &[u8])>, style: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some((file_name, content_type, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(style) = style {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"style\"\r\n\r\n{style}\r\n").as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
