//! Async runtime around the session
//!
//! One task owns the [`Session`] and multiplexes three sources with
//! `tokio::select!`: the periodic tick, inbound frames from the transport and
//! user intents. Every event goes through `Session::handle` and the resulting
//! effects are applied here, in order.

pub mod transport;

use chrono::Utc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::avatar::AvatarStore;
use crate::error::ChannelError;
use crate::state::{Effect, Intent, Session, SessionEvent};
use crate::view::Renderer;
use transport::Transport;

/// Apply effects in order, stopping at the first failed send
async fn apply_effects<T: Transport, R: Renderer>(
    effects: Vec<Effect>,
    transport: &mut T,
    renderer: &mut R,
    store: Option<&AvatarStore>,
) -> Result<(), ChannelError> {
    for effect in effects {
        match effect {
            Effect::Send(msg) => {
                tracing::debug!("Sending {:?}", msg);
                transport.send(&msg).await?;
            }
            Effect::Render(view) => renderer.render(&view),
            Effect::Notice(notice) => renderer.notice(&notice),
            Effect::PersistAvatar(avatar) => {
                if let Some(store) = store {
                    if let Err(e) = store.save(&avatar) {
                        tracing::warn!("Failed to save avatar: {}", e);
                    }
                }
            }
        }
    }
    Ok(())
}

/// Drive the session until the connection drops or the intent stream ends.
///
/// Returns the session so callers can inspect where it ended up.
pub async fn run<T: Transport, R: Renderer>(
    mut session: Session,
    mut transport: T,
    renderer: &mut R,
    mut intents: mpsc::Receiver<Intent>,
    store: Option<&AvatarStore>,
    tick: Duration,
) -> Session {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    renderer.render(&session.view(Utc::now()));

    loop {
        // Server frames first so intents act on the latest state
        let event = tokio::select! {
            biased;

            frame = transport.recv() => match frame {
                Some(Ok(msg)) => SessionEvent::Server(msg),
                Some(Err(ChannelError::Decode(e))) => {
                    tracing::warn!("Dropping undecodable frame: {}", e);
                    continue;
                }
                Some(Err(e)) => SessionEvent::Disconnected(e),
                None => SessionEvent::Disconnected(ChannelError::Closed),
            },
            intent = intents.recv() => match intent {
                Some(intent) => SessionEvent::User(intent),
                None => {
                    tracing::info!("Input closed, shutting down");
                    break;
                }
            },
            _ = interval.tick() => SessionEvent::Tick,
        };

        let disconnected = matches!(event, SessionEvent::Disconnected(_));
        let effects = session.handle(event, Utc::now());

        if let Err(e) = apply_effects(effects, &mut transport, renderer, store).await {
            tracing::error!("Send failed: {}", e);
            let effects = session.handle(SessionEvent::Disconnected(e), Utc::now());
            // A reset session has nothing left to send
            let _ = apply_effects(effects, &mut transport, renderer, store).await;
            break;
        }

        if disconnected {
            break;
        }
    }

    session
}
