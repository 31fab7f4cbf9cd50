#![allow(dead_code)]

use std::{collections::HashMap, sync::{Arc, Mutex}, time::Duration};

use coolmasternet::{emulator::Emulator, Bridge, BridgeConfig};
use futures::StreamExt;
use tokio::{io::AsyncWriteExt, net::TcpListener};
use tokio_util::codec::{FramedRead, LinesCodec};

/// Short enough to keep timeout tests fast, long enough for loopback.
pub const TEST_READ_TIMEOUT: Duration = Duration::from_millis(200);

pub async fn listen() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    (listener, port)
}

pub fn bridge(port: u16) -> Bridge {
    Bridge::new(BridgeConfig::new("127.0.0.1").with_port(port).with_read_timeout(TEST_READ_TIMEOUT))
}

pub fn swing_bridge(port: u16) -> Bridge {
    Bridge::new(
        BridgeConfig::new("127.0.0.1")
            .with_port(port)
            .with_read_timeout(TEST_READ_TIMEOUT)
            .with_swing_support(true),
    )
}

pub async fn spawn_emulator(emulator: Emulator) -> u16 {
    let (listener, port) = listen().await;
    tokio::spawn(emulator.serve(listener));
    port
}

/// A scripted bridge: prompts, records the request line and answers from a
/// fixed table (`OK\r\n>` for anything not in it).
pub struct RecordingBridge {
    pub port: u16,
    requests: Arc<Mutex<Vec<String>>>,
}

impl RecordingBridge {
    pub async fn spawn(replies: &[(&str, &str)]) -> Self {
        let replies: HashMap<String, String> = replies.iter()
            .map(|(request, reply)| (request.to_string(), reply.to_string()))
            .collect();
        let replies = Arc::new(replies);

        let (listener, port) = listen().await;
        let requests = Arc::new(Mutex::new(Vec::new()));

        tokio::spawn({
            let requests = requests.clone();

            async move {
                loop {
                    let (socket, _) = listener.accept().await.expect("accept");
                    let replies = replies.clone();
                    let requests = requests.clone();

                    tokio::spawn(async move {
                        let (rx, mut tx) = socket.into_split();
                        let mut lines = FramedRead::new(rx, LinesCodec::new());

                        tx.write_all(b">").await.expect("write prompt");

                        if let Some(Ok(line)) = lines.next().await {
                            requests.lock().unwrap().push(line.clone());

                            let reply = replies.get(&line).map(String::as_str).unwrap_or("OK\r\n>");
                            let _ = tx.write_all(reply.as_bytes()).await;
                        }
                    });
                }
            }
        });

        Self { port, requests }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}
