//! Per-connection session task
//!
//! Every accepted socket runs one of these. Plain GETs get the game page and
//! close; upgrade requests go through the handshake, register with the lobby,
//! and pump frames into the dispatcher until the peer goes away.

use std::net::SocketAddr;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::app::AppState;
use crate::game::relay;
use crate::ws::codec::{self, Inbound};
use crate::ws::handshake;
use crate::ws::protocol::ClientMsg;

pub async fn handle_connection(stream: TcpStream, peer: SocketAddr, state: AppState) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let head = match handshake::read_request_head(&mut reader).await {
        Ok(head) => head,
        Err(error) => {
            debug!(%peer, %error, "Failed to read request head");
            return;
        }
    };

    if !head.is_upgrade() {
        // Plain browser GET: serve the game page and close
        let response = crate::assets::page_response(state.config.page_path.as_deref());
        if let Err(error) = write_half.write_all(&response).await {
            debug!(%peer, %error, "Failed to send game page");
        }
        let _ = write_half.shutdown().await;
        return;
    }

    let Some(key) = head.header("sec-websocket-key") else {
        warn!(%peer, "Upgrade request without Sec-WebSocket-Key");
        return;
    };
    let response = handshake::upgrade_response(key);
    if let Err(error) = write_half.write_all(response.as_bytes()).await {
        debug!(%peer, %error, "Failed to complete handshake");
        return;
    }

    let player_id = {
        let mut lobby = state.lobby.lock().await;
        let (id, directives) = lobby.join(Some(write_half));
        relay::deliver(&mut lobby, directives).await;
        id
    };
    info!(%peer, player_id, "Connection upgraded");

    loop {
        match codec::read_frame(&mut reader).await {
            Inbound::Text(text) => {
                let msg: ClientMsg = match serde_json::from_str(&text) {
                    Ok(msg) => msg,
                    Err(error) => {
                        debug!(player_id, %error, "Ignoring malformed message");
                        continue;
                    }
                };
                let mut lobby = state.lobby.lock().await;
                let directives = lobby.apply(player_id, msg);
                relay::deliver(&mut lobby, directives).await;
            }
            Inbound::Ping => {
                let mut lobby = state.lobby.lock().await;
                match lobby.writer_mut(player_id) {
                    Some(writer) => {
                        if writer.write_all(&codec::PONG_FRAME).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            Inbound::Ignored => continue,
            Inbound::Closed => break,
        }
    }

    let mut lobby = state.lobby.lock().await;
    let directives = lobby.remove(player_id);
    relay::deliver(&mut lobby, directives).await;
    info!(%peer, player_id, "Connection closed");
}
