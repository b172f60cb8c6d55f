use futures::{SinkExt, StreamExt};
use promptdock_engine::dom::PageDom;
use promptdock_engine::facade::CommandHandler;
use promptdock_engine::protocol::{CommandResult, PageCommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// WebSocket front for a [`CommandHandler`].
///
/// Every text frame is one [`PageCommand`]; the reply is one
/// [`CommandResult`] frame. Commands are handled one at a time across all
/// connections since they share a single page.
#[derive(Clone)]
pub struct CommandServer {
    port: u16,
    handler: Arc<Mutex<CommandHandler<dyn PageDom>>>,
}

pub struct ServerHandle {
    pub local_addr: SocketAddr,
    pub accept_task: JoinHandle<()>,
}

impl ServerHandle {
    pub fn shutdown(self) {
        self.accept_task.abort();
    }
}

impl CommandServer {
    pub fn new(port: u16, handler: CommandHandler<dyn PageDom>) -> Self {
        Self {
            port,
            handler: Arc::new(Mutex::new(handler)),
        }
    }

    pub async fn start(&self) -> Result<ServerHandle, Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([127, 0, 0, 1], self.port));
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Command server listening on: {}", local_addr);

        let handler = Arc::clone(&self.handler);
        let accept_task = tokio::spawn(async move {
            info!("Server accept loop started");
            while let Ok((stream, peer)) = listener.accept().await {
                info!("Accepted TCP connection from: {}", peer);
                tokio::spawn(accept_connection(stream, Arc::clone(&handler)));
            }
        });

        Ok(ServerHandle {
            local_addr,
            accept_task,
        })
    }
}

async fn accept_connection(stream: TcpStream, handler: Arc<Mutex<CommandHandler<dyn PageDom>>>) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            error!("Error during the websocket handshake occurred: {}", e);
            return;
        }
    };

    info!("New WebSocket connection: established");
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    while let Some(msg) = ws_receiver.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => {
                info!("WebSocket closed");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
        };

        let result = answer(&handler, &text).await;
        let reply = match serde_json::to_string(&result) {
            Ok(reply) => reply,
            Err(e) => {
                error!("Failed to encode reply: {}", e);
                break;
            }
        };
        if let Err(e) = ws_sender.send(Message::Text(reply)).await {
            error!("Failed to send message to WS: {}", e);
            break;
        }
    }
}

/// Decode one frame and run it. Undecodable frames get a failed result.
pub async fn answer(handler: &Mutex<CommandHandler<dyn PageDom>>, text: &str) -> CommandResult {
    match serde_json::from_str::<PageCommand>(text) {
        Ok(command) => {
            debug!("Received {}", command.name());
            handler.lock().await.handle(command).await
        }
        Err(e) => {
            warn!("Rejected frame: {} | Text: {}", e, text);
            CommandResult::failed(format!("Invalid command: {}", e))
        }
    }
}
