//! TCP transport: one JSON message per line.

use contracts::{ChannelEvent, ContractError, MessageChannel, SignalMessage};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, instrument, warn};

use crate::connector::ChannelConnector;
use crate::error::SignalingError;
use crate::link::ChannelLink;

pub struct TcpJsonChannel {
    name: String,
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: Option<OwnedWriteHalf>,
}

impl TcpJsonChannel {
    pub fn new(name: impl Into<String>, stream: TcpStream) -> Self {
        let (read, write) = stream.into_split();
        Self {
            name: name.into(),
            lines: BufReader::new(read).lines(),
            writer: Some(write),
        }
    }

    #[instrument(name = "tcp_channel_connect", skip_all, fields(endpoint = %endpoint))]
    pub async fn connect(endpoint: &str) -> std::io::Result<Self> {
        let stream = TcpStream::connect(endpoint).await?;
        stream.set_nodelay(true)?;
        debug!("TCP channel connected");
        Ok(Self::new(endpoint, stream))
    }
}

impl MessageChannel for TcpJsonChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, message: &SignalMessage) -> Result<(), ContractError> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(ContractError::channel(&self.name, "channel closed"));
        };
        let mut line = serde_json::to_vec(message)
            .map_err(|e| ContractError::channel(&self.name, format!("serialize: {e}")))?;
        line.push(b'\n');
        writer
            .write_all(&line)
            .await
            .map_err(|e| ContractError::channel(&self.name, e.to_string()))
    }

    async fn recv(&mut self) -> ChannelEvent {
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<SignalMessage>(&line) {
                        Ok(message) => return ChannelEvent::Message(message),
                        Err(e) => {
                            warn!(channel = %self.name, error = %e, "Malformed message skipped");
                        }
                    }
                }
                Ok(None) => return ChannelEvent::Closed,
                Err(e) => {
                    return ChannelEvent::Error(ContractError::channel(&self.name, e.to_string()))
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .shutdown()
                .await
                .map_err(|e| ContractError::channel(&self.name, e.to_string()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TcpConnector {
    endpoint: String,
    queue_capacity: usize,
}

impl TcpConnector {
    pub fn new(endpoint: impl Into<String>, queue_capacity: usize) -> Self {
        Self {
            endpoint: endpoint.into(),
            queue_capacity,
        }
    }
}

impl ChannelConnector for TcpConnector {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    async fn connect(&self) -> Result<ChannelLink, SignalingError> {
        let channel = TcpJsonChannel::connect(&self.endpoint)
            .await
            .map_err(|e| SignalingError::connect(&self.endpoint, e.to_string()))?;
        Ok(ChannelLink::spawn(channel, self.queue_capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::InferenceMode;
    use tokio::io::AsyncBufReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_round_trip_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read, mut write) = stream.into_split();
            let mut lines = BufReader::new(read).lines();
            let offer = lines.next_line().await.unwrap().unwrap();
            write.write_all(b"not json\n\n").await.unwrap();
            write
                .write_all(b"{\"type\":\"config\",\"mode\":\"server\"}\n")
                .await
                .unwrap();
            offer
        });

        let mut channel = TcpJsonChannel::connect(&addr).await.unwrap();
        channel
            .send(&SignalMessage::Offer { sdp: "v=0".into() })
            .await
            .unwrap();

        match channel.recv().await {
            ChannelEvent::Message(SignalMessage::Config { mode }) => {
                assert_eq!(mode, InferenceMode::Remote)
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(channel.recv().await, ChannelEvent::Closed));

        let offer = server.await.unwrap();
        assert_eq!(offer, r#"{"type":"offer","sdp":"v=0"}"#);

        channel.close().await.unwrap();
        assert!(channel.send(&SignalMessage::MetricsRequest).await.is_err());
    }

    #[tokio::test]
    async fn test_connector_refused() {
        // bind then drop to get a port with no listener
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let connector = TcpConnector::new(addr, 4);
        assert!(matches!(
            connector.connect().await,
            Err(SignalingError::Connect { .. })
        ));
    }
}
