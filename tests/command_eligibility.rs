//! No reply may ever leave the bot for an ineligible message, whatever its
//! text content.

mod common;

use common::{ch, channel_msg, push_batch, sent, server_with_channels, robot_channels};
use meshbot::link::{ChannelMessage, ContactMessage, LinkEvent, PendingMessage};

#[tokio::test(start_paused = true)]
async fn channel_zero_never_gets_a_reply() {
    // Even with an accepted name sitting at index 0, index 0 stays mute.
    let (mut server, state, _tx) = server_with_channels(vec![ch(0, "#robot"), ch(1, "#robot")]);
    server.connect().await;
    assert!(server.registry().allows(0));

    push_batch(&state, vec![channel_msg(0, "alice: ping", 1)]);
    server.handle_event(LinkEvent::MessagesWaiting).await;
    assert!(sent(&state).is_empty());
}

#[tokio::test(start_paused = true)]
async fn unlisted_channel_never_gets_a_reply() {
    let (mut server, state, _tx) = server_with_channels(robot_channels());
    server.connect().await;
    assert!(!server.registry().allows(3));

    push_batch(
        &state,
        vec![channel_msg(3, "ping", 0), channel_msg(3, ".date", 0)],
    );
    server.handle_event(LinkEvent::MessagesWaiting).await;
    assert!(sent(&state).is_empty());
}

#[tokio::test(start_paused = true)]
async fn textless_message_gets_no_reply() {
    let (mut server, state, _tx) = server_with_channels(robot_channels());
    server.connect().await;

    push_batch(
        &state,
        vec![PendingMessage::Channel(ChannelMessage {
            channel_idx: 1,
            text: None,
            sender_timestamp: 1714564800,
            path_len: 0,
        })],
    );
    server.handle_event(LinkEvent::MessagesWaiting).await;
    assert!(sent(&state).is_empty());
}

#[tokio::test(start_paused = true)]
async fn contact_messages_get_no_reply() {
    let (mut server, state, _tx) = server_with_channels(robot_channels());
    server.connect().await;

    push_batch(
        &state,
        vec![PendingMessage::Contact(ContactMessage {
            pub_key_prefix: vec![0xab; 6],
            text: Some("ping".to_string()),
            sender_timestamp: 1714564800,
            path_len: 2,
        })],
    );
    server.handle_event(LinkEvent::MessagesWaiting).await;
    assert!(sent(&state).is_empty());
}

#[tokio::test(start_paused = true)]
async fn non_command_text_gets_no_reply() {
    let (mut server, state, _tx) = server_with_channels(robot_channels());
    server.connect().await;

    push_batch(
        &state,
        vec![channel_msg(1, "good morning mesh, update your firmware", 0)],
    );
    server.handle_event(LinkEvent::MessagesWaiting).await;
    assert!(sent(&state).is_empty());
}
