//! Client for the bridge's prompt-delimited command channel.
//!
//! Every request is an isolated transaction on a fresh TCP connection:
//! connect, wait for the `>` prompt, send one line, read until `\n>`, close.
//! At most [`MAX_CONCURRENT_TRANSACTIONS`] transactions run at once; further
//! callers wait for a free slot.

use std::{collections::HashMap, sync::Arc};

use futures::{future, SinkExt, StreamExt};
use tokio::{io::AsyncWriteExt, net::TcpStream, sync::Semaphore, time::timeout};
use tokio_util::codec::Framed;
use tracing::{debug, trace, warn};

use crate::{
    config::{BridgeConfig, MAX_CONCURRENT_TRANSACTIONS},
    error::{Error, Result},
    protocol::{
        codec::{BridgeProtocolCodec, RxFrame, LINE_SEPARATOR},
        commands::Request,
        status::UNIT_ID_LEN,
    },
    unit::Unit,
};


/// Handle to a bridge. Cheap to clone; clones share the transaction pool.
#[derive(Clone, Debug)]
pub struct Bridge {
    config: Arc<BridgeConfig>,
    transactions: Arc<Semaphore>,
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config: Arc::new(config),
            transactions: Arc::new(Semaphore::new(MAX_CONCURRENT_TRANSACTIONS)),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Run one transaction and return the response body.
    ///
    /// The trailing prompt and any `OK\r\n` success marker are stripped;
    /// failure text (e.g. `Unsupported Feature`) is returned as-is.
    pub async fn request(&self, request: Request<'_>) -> Result<String> {
        let _permit = self.transactions.acquire().await
            .map_err(|_| Error::Protocol("bridge transaction pool closed".to_string()))?;

        debug!(%request, host = %self.config.host, port = self.config.port, "bridge request");

        let stream = TcpStream::connect((self.config.host.as_str(), self.config.port)).await?;
        stream.set_nodelay(true)?;

        let mut framed = Framed::new(stream, BridgeProtocolCodec::new());

        let response = self.exchange(&mut framed, request).await;

        // the socket is always closed before the permit is released
        if let Err(err) = framed.get_mut().shutdown().await {
            trace!(%err, "bridge socket shutdown failed");
        }
        drop(framed);

        match &response {
            Ok(body) => debug!(%request, len = body.len(), "bridge response"),
            Err(err) => debug!(%request, %err, "bridge request failed"),
        }

        response
    }

    async fn exchange(&self, framed: &mut Framed<TcpStream, BridgeProtocolCodec>, request: Request<'_>) -> Result<String> {
        let read_timeout = self.config.read_timeout;

        match timeout(read_timeout, framed.next()).await {
            Ok(Some(Ok(RxFrame::Prompt))) => {},
            Ok(Some(Err(err))) => return Err(err),
            Ok(Some(Ok(frame))) => return Err(Error::Protocol(format!("prompt not found, got {frame:?}"))),
            Ok(None) | Err(_) => return Err(Error::Protocol("prompt not found".to_string())),
        }

        framed.send(request).await?;

        match timeout(read_timeout, framed.next()).await {
            Ok(Some(Ok(RxFrame::Response(body)))) => Ok(body),
            Ok(Some(Err(err))) => Err(err),
            Ok(Some(Ok(frame))) => Err(Error::Protocol(format!("unexpected frame {frame:?}"))),
            Ok(None) => Err(Error::Protocol("connection closed before response".to_string())),
            Err(_) => Err(Error::Timeout),
        }
    }

    /// General bridge information (`set`), as key/value pairs.
    ///
    /// Duplicate keys: the last one wins.
    pub async fn info(&self) -> Result<HashMap<String, String>> {
        let raw = self.request(Request::Info).await?;

        Ok(parse_info(&raw))
    }

    /// Snapshot of every unit behind the bridge (`ls2`), keyed by unit id.
    ///
    /// Units are built concurrently; any single failure fails the whole call.
    pub async fn status(&self) -> Result<HashMap<String, Unit>> {
        let raw = self.request(Request::ListUnits).await?;

        let units = future::try_join_all(
            raw.trim()
                .split(LINE_SEPARATOR)
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| async move {
                    let unit_id = line.get(..UNIT_ID_LEN)
                        .ok_or_else(|| Error::Protocol(format!("status line too short: {line:?}")))?;

                    Unit::create(self.clone(), unit_id, Some(line.to_string())).await
                })
        ).await?;

        Ok(units.into_iter().map(|unit| (unit.unit_id().to_string(), unit)).collect())
    }

    /// Snapshot of a single unit (`ls2 {id}`).
    pub async fn unit(&self, unit_id: &str) -> Result<Unit> {
        Unit::create(self.clone(), unit_id, None).await
    }
}

fn parse_info(raw: &str) -> HashMap<String, String> {
    let mut info = HashMap::new();

    for line in raw.trim().split(LINE_SEPARATOR).filter(|line| !line.is_empty()) {
        let Some((key, value)) = line.split_once(':') else {
            warn!(line, "skipping info line without a key");
            continue;
        };

        info.insert(key.trim_end().to_string(), value.trim_start().to_string());
    }

    info
}
