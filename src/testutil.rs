use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// In-process SSE endpoint. Every connection, whatever its path, receives
/// the same canned events and is then closed, so tests can observe both
/// delivery and reconnect behavior.
pub struct StreamFixture {
    pub base_url: String,
    pub connections: Arc<AtomicUsize>,
}

pub async fn spawn_stream_fixture(events: Vec<String>) -> StreamFixture {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&connections);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let events = events.clone();
            tokio::spawn(async move {
                let mut request = [0u8; 1024];
                let _ = socket.read(&mut request).await;

                let mut response = String::from(
                    "HTTP/1.1 200 OK\r\n\
                     content-type: text/event-stream\r\n\
                     connection: close\r\n\r\n",
                );
                response.push_str(": keep-alive\n\n");
                for event in &events {
                    response.push_str(&format!("data: {}\n\n", event));
                }
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    StreamFixture {
        base_url: format!("http://{}", addr),
        connections,
    }
}
