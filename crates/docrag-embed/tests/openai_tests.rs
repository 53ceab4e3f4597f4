use docrag_core::config::EmbeddingSettings;
use docrag_core::traits::Embedder;
use docrag_core::Error;
use docrag_embed::OpenAiEmbedder;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serves one canned HTTP response and hands back the raw request text.
async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut tmp = [0u8; 4096];
        loop {
            let n = socket.read(&mut tmp).await.unwrap();
            if n == 0 { break; }
            buf.extend_from_slice(&tmp[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().parse::<usize>().unwrap()))
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + content_length { break; }
            }
        }
        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&buf).to_string()
    });
    (format!("http://{}", addr), handle)
}

fn settings(base_url: String) -> EmbeddingSettings {
    EmbeddingSettings { base_url, dim: 3, model: "test-embed".to_string(), ..EmbeddingSettings::default() }
}

#[tokio::test]
async fn results_are_reordered_by_index() {
    let body = r#"{"data":[{"index":1,"embedding":[0.0,1.0,0.0]},{"index":0,"embedding":[1.0,0.0,0.0]}]}"#;
    let (base_url, server) = serve_once("200 OK", body.to_string()).await;
    let embedder = OpenAiEmbedder::with_api_key(&settings(base_url), "sk-test").expect("embedder");

    let out = embedder
        .embed_request(&["first".to_string(), "second".to_string()])
        .await
        .expect("embed_request");
    assert_eq!(out, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /embeddings"), "{request}");
    assert!(request.to_ascii_lowercase().contains("authorization: bearer sk-test"));
    assert!(request.contains(r#""input":["first","second"]"#), "{request}");
    assert!(request.contains(r#""model":"test-embed""#));
}

#[tokio::test]
async fn http_error_is_an_embedding_provider_error() {
    let (base_url, server) = serve_once("429 Too Many Requests", r#"{"error":"slow down"}"#.to_string()).await;
    let embedder = OpenAiEmbedder::with_api_key(&settings(base_url), "sk-test").expect("embedder");
    let err = embedder.embed_request(&["x".to_string()]).await.expect_err("429");
    assert!(matches!(err, Error::EmbeddingProvider(_)), "{err}");
    assert!(err.to_string().contains("429"));
    server.await.unwrap();
}
