use std::collections::HashMap;

use kirchenjahr::scrape::{FetchConfig, Sites, build_client};
use reqwest::Client;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves the given pages on a local port and returns the base URL without a
/// trailing slash. Paths include the query string. Unknown paths answer
/// `404 Not Found`.
pub async fn serve(pages: &[(&str, &str)]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Expected local listener");
    let address = listener.local_addr().expect("Expected local address");
    let pages: HashMap<String, String> = pages
        .iter()
        .map(|(path, body)| ((*path).to_owned(), (*body).to_owned()))
        .collect();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut buffer = vec![0_u8; 8192];
            let read = stream.read(&mut buffer).await.unwrap_or(0);
            let request = String::from_utf8_lossy(buffer.get(..read).unwrap_or_default());
            let path = request
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1))
                .unwrap_or("/");

            let (status, body) = pages
                .get(path)
                .map_or(("404 Not Found", ""), |body| ("200 OK", body.as_str()));
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );

            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    format!("http://{address}")
}

/// A local URL nobody listens on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Expected local listener");
    let address = listener.local_addr().expect("Expected local address");
    drop(listener);

    format!("http://{address}/verschwunden")
}

/// Every site pointed at the same local server.
pub fn local_sites(base: &str) -> Sites {
    Sites {
        bibleserver: base.to_owned(),
        bigs: format!("{base}/bigs/"),
        losungen: format!("{base}/"),
        kirchenjahr: format!("{base}/"),
    }
}

pub fn client() -> Client {
    build_client(&FetchConfig::default()).expect("Expected HTTP client")
}
