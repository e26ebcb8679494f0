//! Integration tests for WebSocket subscription and notification fan-out.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use beacon_realtime::bridge::envelope::ChannelScope;
use beacon_realtime::message::factory;
use beacon_realtime::message::types::{UpdateBody, UpdateKind, UpdateOp};

fn child_item_update(channel: &str) -> beacon_realtime::message::types::ServerMessage {
    factory::update(
        channel,
        UpdateBody::Item {
            kind: UpdateKind::ChildItem,
            op: UpdateOp::Create,
            value: Some(json!({"id": "child-1"})),
        },
    )
}

#[tokio::test]
async fn test_subscribe_then_receive_update() {
    let app = helpers::TestApp::new().await;
    let mut client = app.connect().await;
    helpers::wait_for_clients(&app.broker, 1).await;

    client
        .send_json(&helpers::subscribe_request("item-1", "item"))
        .await;

    let response = app_response(&mut client).await;
    assert_eq!(response["status"], "success");
    assert_eq!(response["request"]["action"], "subscribe");
    assert_eq!(response["request"]["channel"], "item-1");

    app.bridge
        .dispatch(
            child_item_update("item-1"),
            ChannelScope::Channel("item-1".to_string()),
        )
        .await;

    let update = client.recv_json().await;
    assert_eq!(update["type"], "update");
    assert_eq!(update["realm"], "notif");
    assert_eq!(update["channel"], "item-1");
    assert_eq!(update["body"]["entity"], "item");
    assert_eq!(update["body"]["kind"], "childItem");
    assert_eq!(update["body"]["op"], "create");
    assert_eq!(update["body"]["value"]["id"], "child-1");
}

#[tokio::test]
async fn test_update_scoped_to_channel() {
    let app = helpers::TestApp::new().await;
    let mut subscriber = app.connect().await;
    let mut bystander = app.connect().await;
    helpers::wait_for_clients(&app.broker, 2).await;

    subscriber
        .send_json(&helpers::subscribe_request("item-1", "item"))
        .await;
    app_response(&mut subscriber).await;

    bystander
        .send_json(&helpers::subscribe_request("item-2", "item"))
        .await;
    app_response(&mut bystander).await;

    app.bridge
        .dispatch(
            child_item_update("item-1"),
            ChannelScope::Channel("item-1".to_string()),
        )
        .await;

    let update = subscriber.recv_json().await;
    assert_eq!(update["channel"], "item-1");

    bystander.expect_silence(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_broadcast_reaches_every_connection() {
    let app = helpers::TestApp::new().await;
    let mut subscribed = app.connect().await;
    let mut loose = app.connect().await;
    helpers::wait_for_clients(&app.broker, 2).await;

    subscribed
        .send_json(&helpers::subscribe_request("item-1", "item"))
        .await;
    app_response(&mut subscribed).await;

    app.bridge
        .dispatch(
            factory::info("maintenance window", None),
            ChannelScope::Broadcast,
        )
        .await;

    for client in [&mut subscribed, &mut loose] {
        let info = client.recv_json().await;
        assert_eq!(info["type"], "info");
        assert_eq!(info["message"], "maintenance window");
    }
}

#[tokio::test]
async fn test_malformed_frame_gets_invalid_request() {
    let app = helpers::TestApp::new().await;
    let mut client = app.connect().await;
    helpers::wait_for_clients(&app.broker, 1).await;

    client.send_text("this is not json").await;

    let response = client.recv_json().await;
    assert_eq!(response["type"], "response");
    assert_eq!(response["status"], "error");
    assert_eq!(response["error"]["name"], "INVALID_REQUEST");
    assert!(response.get("request").is_none());

    // A wrong realm fails validation the same way.
    client
        .send_json(&json!({
            "realm": "other",
            "action": "subscribe",
            "channel": "item-1",
            "entity": "item",
        }))
        .await;

    let response = client.recv_json().await;
    assert_eq!(response["error"]["name"], "INVALID_REQUEST");
    assert_eq!(app.broker.channel_count(), 0);
}

#[tokio::test]
async fn test_unsubscribe_unknown_channel_not_found() {
    let app = helpers::TestApp::new().await;
    let mut client = app.connect().await;
    helpers::wait_for_clients(&app.broker, 1).await;

    client
        .send_json(&helpers::unsubscribe_request("never-created"))
        .await;

    let response = client.recv_json().await;
    assert_eq!(response["status"], "error");
    assert_eq!(response["error"]["name"], "NOT_FOUND");
    assert_eq!(response["request"]["action"], "unsubscribe");
}

#[tokio::test]
async fn test_subscribe_only_replaces_prior_subscriptions() {
    let app = helpers::TestApp::new().await;
    let mut client = app.connect().await;
    helpers::wait_for_clients(&app.broker, 1).await;

    client
        .send_json(&helpers::subscribe_request("item-1", "item"))
        .await;
    app_response(&mut client).await;

    client
        .send_json(&json!({
            "realm": "notif",
            "action": "subscribeOnly",
            "channel": "chat-1",
            "entity": "chat",
        }))
        .await;
    let response = app_response(&mut client).await;
    assert_eq!(response["status"], "success");

    helpers::wait_for_subscribers(&app.broker, "chat-1", 1).await;
    assert_eq!(app.broker.subscriber_count("item-1"), 0);

    // Updates on the dropped channel no longer arrive.
    app.bridge
        .dispatch(
            child_item_update("item-1"),
            ChannelScope::Channel("item-1".to_string()),
        )
        .await;
    client.expect_silence(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_disconnect_action_tears_down_registration() {
    let app = helpers::TestApp::new().await;
    let mut client = app.connect().await;
    helpers::wait_for_clients(&app.broker, 1).await;

    client
        .send_json(&helpers::subscribe_request("item-1", "item"))
        .await;
    app_response(&mut client).await;

    client
        .send_json(&json!({"realm": "notif", "action": "disconnect"}))
        .await;

    helpers::wait_for_clients(&app.broker, 0).await;
    assert_eq!(app.pool.connection_count(), 0);
}

#[tokio::test]
async fn test_socket_close_tears_down_registration() {
    let app = helpers::TestApp::new().await;
    let client = app.connect().await;
    helpers::wait_for_clients(&app.broker, 1).await;

    client.close().await;

    helpers::wait_for_clients(&app.broker, 0).await;
    assert_eq!(app.pool.connection_count(), 0);
}

/// Receives the next frame and asserts it is a response message.
async fn app_response(client: &mut helpers::WsClient) -> serde_json::Value {
    let response = client.recv_json().await;
    assert_eq!(response["type"], "response");
    response
}

mod multi_instance {
    use super::*;

    #[tokio::test]
    async fn test_update_fans_out_across_instances() {
        let bus = beacon_realtime::bridge::memory_bus::MemoryBus::new(64);
        let app_a = helpers::TestApp::with_bus(Arc::new(bus.clone())).await;
        let app_b = helpers::TestApp::with_bus(Arc::new(bus)).await;

        let mut client_a = app_a.connect().await;
        let mut client_b = app_b.connect().await;
        helpers::wait_for_clients(&app_a.broker, 1).await;
        helpers::wait_for_clients(&app_b.broker, 1).await;

        client_a
            .send_json(&helpers::subscribe_request("item-9", "item"))
            .await;
        app_response(&mut client_a).await;
        client_b
            .send_json(&helpers::subscribe_request("item-9", "item"))
            .await;
        app_response(&mut client_b).await;

        // Dispatch through instance B; the origin instance delivers too.
        app_b
            .bridge
            .dispatch(
                child_item_update("item-9"),
                ChannelScope::Channel("item-9".to_string()),
            )
            .await;

        let update_a = client_a.recv_json().await;
        let update_b = client_b.recv_json().await;
        assert_eq!(update_a, update_b);
        assert_eq!(update_a["channel"], "item-9");
    }

    #[tokio::test]
    async fn test_broadcast_crosses_instances_without_subscriptions() {
        let bus = beacon_realtime::bridge::memory_bus::MemoryBus::new(64);
        let app_a = helpers::TestApp::with_bus(Arc::new(bus.clone())).await;
        let app_b = helpers::TestApp::with_bus(Arc::new(bus)).await;

        let mut client_b = app_b.connect().await;
        helpers::wait_for_clients(&app_b.broker, 1).await;

        app_a
            .bridge
            .dispatch(factory::info("rollout starting", None), ChannelScope::Broadcast)
            .await;

        let info = client_b.recv_json().await;
        assert_eq!(info["type"], "info");
        assert_eq!(info["message"], "rollout starting");
    }
}
