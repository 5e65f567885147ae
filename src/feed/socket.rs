//! The `/events` push channel.
//!
//! A socket is sent the serialized tree when it opens, once for every text frame it sends
//! (the page sends `request`, any text works) and on the server-driven push interval.
//! Binary frames end that one connection with close code 1003.

use super::FeedState;
use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use std::time::Duration;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};

/// What an inbound frame asks of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameOutcome {
    /// Send the current tree.
    Publish,
    /// Close the connection as unsupported.
    Reject,
    /// Nothing to do (ping/pong are answered by the transport).
    Ignore,
    /// The observer is closing.
    Close,
}

pub(crate) fn classify(message: &Message) -> FrameOutcome {
    match message {
        Message::Text(_) => FrameOutcome::Publish,
        Message::Binary(_) => FrameOutcome::Reject,
        Message::Ping(_) | Message::Pong(_) => FrameOutcome::Ignore,
        Message::Close(_) => FrameOutcome::Close,
    }
}

pub async fn events(ws: WebSocketUpgrade, State(state): State<FeedState>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state))
}

fn push_ticker(period: Option<Duration>) -> Option<Interval> {
    let period = period.filter(|p| !p.is_zero())?;
    // The connect-time push already happened; the first tick is one period later.
    let start = Instant::now().checked_add(period)?;
    let mut ticker = time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(ticker)
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn publish(socket: &mut WebSocket, state: &FeedState) -> Result<(), axum::Error> {
    socket.send(Message::Text(state.view.to_json().into())).await
}

async fn serve_socket(mut socket: WebSocket, state: FeedState) {
    let mut shutdown = state.shutdown.clone();
    let mut ticker = push_ticker(state.push_interval);
    debug!("Observer connected");

    if let Err(e) = publish(&mut socket, &state).await {
        debug!(error = %e, "Initial push failed");
        return;
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let message = match incoming {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        debug!(error = %e, "Socket error");
                        break;
                    }
                    None => break,
                };
                match classify(&message) {
                    FrameOutcome::Publish => {
                        if publish(&mut socket, &state).await.is_err() {
                            break;
                        }
                    }
                    FrameOutcome::Reject => {
                        warn!("Rejecting binary frame");
                        let _ = socket
                            .send(Message::Close(Some(CloseFrame {
                                code: close_code::UNSUPPORTED,
                                reason: "binary frames are not supported".into(),
                            })))
                            .await;
                        break;
                    }
                    FrameOutcome::Ignore => {}
                    FrameOutcome::Close => break,
                }
            }
            _ = next_tick(&mut ticker) => {
                if publish(&mut socket, &state).await.is_err() {
                    break;
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    let _ = socket.send(Message::Close(Some(CloseFrame {
                        code: close_code::AWAY,
                        reason: "server shutting down".into(),
                    }))).await;
                    break;
                }
            }
        }
    }
    debug!("Observer disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_frames_publish_and_binary_frames_reject() {
        assert_eq!(classify(&Message::Text("request".into())), FrameOutcome::Publish);
        assert_eq!(classify(&Message::Text("".into())), FrameOutcome::Publish);
        assert_eq!(
            classify(&Message::Binary(vec![1u8, 2, 3].into())),
            FrameOutcome::Reject
        );
        assert_eq!(classify(&Message::Ping(Vec::<u8>::new().into())), FrameOutcome::Ignore);
        assert_eq!(classify(&Message::Close(None)), FrameOutcome::Close);
    }

    #[test]
    fn test_zero_push_interval_disables_ticker() {
        assert!(push_ticker(None).is_none());
        assert!(push_ticker(Some(Duration::ZERO)).is_none());
    }

    #[tokio::test]
    async fn test_unrepresentable_push_interval_disables_ticker() {
        assert!(push_ticker(Some(Duration::MAX)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_ticker_waits_one_period() {
        let start = Instant::now();
        let mut ticker = push_ticker(Some(Duration::from_secs(15)));
        next_tick(&mut ticker).await;
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }
}
