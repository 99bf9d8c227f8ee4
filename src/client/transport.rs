use async_trait::async_trait;
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::error::ChannelError;
use crate::protocol::{ClientMessage, ServerMessage};

/// Bidirectional message channel to the game server
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, msg: &ClientMessage) -> Result<(), ChannelError>;

    /// Next inbound message, `None` once the channel is closed
    async fn recv(&mut self) -> Option<Result<ServerMessage, ChannelError>>;
}

pub fn decode(text: &str) -> Result<ServerMessage, ChannelError> {
    serde_json::from_str(text).map_err(|e| ChannelError::Decode(e.to_string()))
}

pub fn encode(msg: &ClientMessage) -> Result<String, ChannelError> {
    serde_json::to_string(msg).map_err(|e| ChannelError::Encode(e.to_string()))
}

/// JSON text frames over a WebSocket
pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsTransport {
    pub async fn connect(url: &str) -> Result<Self, ChannelError> {
        tracing::info!("Connecting to {}", url);
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| ChannelError::WebSocket(e.to_string()))?;
        tracing::info!("Connected to {}", url);
        Ok(Self { stream })
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, msg: &ClientMessage) -> Result<(), ChannelError> {
        let json = encode(msg)?;
        tracing::debug!("-> {}", json);
        self.stream
            .send(Message::Text(json))
            .await
            .map_err(|e| ChannelError::WebSocket(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<ServerMessage, ChannelError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => {
                    tracing::debug!("<- {}", text);
                    return Some(decode(&text));
                }
                Ok(Message::Close(frame)) => {
                    tracing::info!("Server closed the connection: {:?}", frame);
                    return None;
                }
                Ok(Message::Ping(data)) => {
                    if let Err(e) = self.stream.send(Message::Pong(data)).await {
                        return Some(Err(ChannelError::WebSocket(e.to_string())));
                    }
                }
                Ok(_) => {}
                Err(e) => return Some(Err(ChannelError::WebSocket(e.to_string()))),
            }
        }
    }
}

/// In-process transport backed by unbounded channels
pub struct ChannelTransport {
    outbound: mpsc::UnboundedSender<ClientMessage>,
    inbound: mpsc::UnboundedReceiver<ServerMessage>,
}

/// The server's side of a [`ChannelTransport`]
pub struct ServerEnd {
    pub to_client: mpsc::UnboundedSender<ServerMessage>,
    pub from_client: mpsc::UnboundedReceiver<ClientMessage>,
}

pub fn channel_pair() -> (ChannelTransport, ServerEnd) {
    let (outbound, from_client) = mpsc::unbounded_channel();
    let (to_client, inbound) = mpsc::unbounded_channel();
    (
        ChannelTransport { outbound, inbound },
        ServerEnd {
            to_client,
            from_client,
        },
    )
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&mut self, msg: &ClientMessage) -> Result<(), ChannelError> {
        self.outbound
            .send(msg.clone())
            .map_err(|_| ChannelError::Closed)
    }

    async fn recv(&mut self) -> Option<Result<ServerMessage, ChannelError>> {
        self.inbound.recv().await.map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_reports_bad_frames() {
        assert!(matches!(
            decode(r#"{"t":"no-such-event"}"#),
            Err(ChannelError::Decode(_))
        ));
        assert_eq!(decode(r#"{"t":"room-closed"}"#), Ok(ServerMessage::RoomClosed));
    }

    #[tokio::test]
    async fn test_channel_pair_round_trip() {
        let (mut transport, mut server) = channel_pair();

        let msg = ClientMessage::StartGame {
            room_code: "ABC123".to_string(),
        };
        transport.send(&msg).await.unwrap();
        assert_eq!(server.from_client.recv().await, Some(msg));

        server.to_client.send(ServerMessage::GameStarted).unwrap();
        assert_eq!(transport.recv().await, Some(Ok(ServerMessage::GameStarted)));

        drop(server);
        assert_eq!(transport.recv().await, None);
        assert_eq!(
            transport
                .send(&ClientMessage::RequestNewGame {
                    room_code: "ABC123".to_string()
                })
                .await,
            Err(ChannelError::Closed)
        );
    }
}
