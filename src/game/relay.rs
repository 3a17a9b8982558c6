//! Directive delivery under the lobby lock
//!
//! Directives are delivered while the caller still holds the lobby guard, so
//! every client observes transitions in the same order. A failed write marks
//! the peer dead; removing it produces follow-up directives (snapshot, host
//! promotion) that are delivered in the same sweep.

use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::game::lobby::{Directive, Lobby};
use crate::game::player::PlayerId;
use crate::ws::codec;
use crate::ws::protocol::ServerMsg;

/// Deliver a batch of directives, pruning peers whose sockets fail.
pub async fn deliver(lobby: &mut Lobby, mut pending: Vec<Directive>) {
    while !pending.is_empty() {
        let mut dead: Vec<PlayerId> = Vec::new();
        for directive in pending.drain(..) {
            match directive {
                Directive::Broadcast(msg) => fan_out(lobby, &msg, None, &mut dead).await,
                Directive::BroadcastExcept(skip, msg) => {
                    fan_out(lobby, &msg, Some(skip), &mut dead).await
                }
                Directive::To(id, msg) => {
                    if let Some(frame) = encode(&msg) {
                        if !send(lobby, id, &frame).await {
                            dead.push(id);
                        }
                    }
                }
            }
        }

        dead.sort_unstable();
        dead.dedup();
        for id in dead {
            debug!(player_id = id, "Dropping peer after failed write");
            pending.extend(lobby.remove(id));
        }
    }
}

async fn fan_out(lobby: &mut Lobby, msg: &ServerMsg, skip: Option<PlayerId>, dead: &mut Vec<PlayerId>) {
    let Some(frame) = encode(msg) else {
        return;
    };
    for id in lobby.live_ids() {
        if skip == Some(id) {
            continue;
        }
        if !send(lobby, id, &frame).await {
            dead.push(id);
        }
    }
}

/// Serialize once per directive; every recipient gets the same frame.
fn encode(msg: &ServerMsg) -> Option<Vec<u8>> {
    match serde_json::to_vec(msg) {
        Ok(payload) => Some(codec::encode_text(&payload)),
        Err(error) => {
            warn!(%error, "Failed to serialize outbound message");
            None
        }
    }
}

/// Write one frame to one peer. Players without a socket (bots, test
/// registrations) count as delivered.
async fn send(lobby: &mut Lobby, id: PlayerId, frame: &[u8]) -> bool {
    match lobby.writer_mut(id) {
        Some(writer) => writer.write_all(frame).await.is_ok(),
        None => true,
    }
}
