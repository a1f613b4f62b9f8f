//! Reconnecting rebuilds the allowed-channel set from scratch; nothing
//! leaks across device sessions.

mod common;

use common::{ch, channel_msg, push_batch, sent, server_with_channels};
use meshbot::link::LinkEvent;

#[tokio::test(start_paused = true)]
async fn rebuild_fully_replaces_allowed_set() {
    let (mut server, state, _tx) =
        server_with_channels(vec![ch(1, "#robot"), ch(2, "#connections")]);
    server.connect().await;
    assert!(server.registry().allows(1));
    assert!(server.registry().allows(2));

    // Device comes back with a reshuffled channel table.
    state.lock().unwrap().channels = vec![ch(3, "#robot")];
    server.handle_event(LinkEvent::Disconnected).await;
    server.connect().await;

    assert!(!server.registry().allows(1), "stale index survived reconnect");
    assert!(!server.registry().allows(2), "stale index survived reconnect");
    assert!(server.registry().allows(3));

    // Behavioral check: the stale index is actually mute now.
    push_batch(&state, vec![channel_msg(1, "alice: ping", 0)]);
    server.handle_event(LinkEvent::MessagesWaiting).await;
    assert!(sent(&state).is_empty());

    push_batch(&state, vec![channel_msg(3, "alice: ping", 0)]);
    server.handle_event(LinkEvent::MessagesWaiting).await;
    assert_eq!(sent(&state).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn no_accepted_channels_leaves_registry_empty() {
    let (mut server, state, _tx) = server_with_channels(vec![ch(0, "Public"), ch(1, "#general")]);
    server.connect().await;
    assert!(server.registry().is_empty());

    push_batch(&state, vec![channel_msg(1, "ping", 0)]);
    server.handle_event(LinkEvent::MessagesWaiting).await;
    assert!(sent(&state).is_empty());
}
