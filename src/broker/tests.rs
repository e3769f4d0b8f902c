use std::sync::Arc;

use tokio::sync::mpsc::error::TryRecvError;

use super::channel::Channel;
use super::engine::Broker;
use super::message::Message;
use crate::client::Client;
use crate::tests::wait_for;
use crate::utils::Error;

#[test]
fn test_message_frame_field_order() {
    let msg = Message::new("42", "hello", "greeting").with_retry(3000);
    assert_eq!(
        msg.to_string(),
        "id: 42\nevent: greeting\nretry: 3000\ndata: hello\n\n"
    );
}

#[test]
fn test_message_frame_omits_empty_fields() {
    let msg = Message::simple("hello");
    assert_eq!(msg.to_string(), "data: hello\n\n");
}

#[test]
fn test_message_frame_splits_multiline_data() {
    let msg = Message::new("1", "first\nsecond", "");
    assert_eq!(msg.to_string(), "id: 1\ndata: first\ndata: second\n\n");
}

#[test]
fn test_message_with_retry_is_a_copy() {
    let msg = Message::new("1", "x", "");
    let delivery = msg.clone().with_retry(500);

    assert_eq!(delivery.retry(), 500);
    assert!(!msg.has_retry());
}

#[test]
fn test_channel_add_and_remove_client() {
    let ch = Channel::new("t");
    let (client, _rx) = Client::new("", "t");
    let id = client.id().to_string();

    ch.add_client(client);
    assert_eq!(ch.client_count(), 1);

    ch.remove_client(&id);
    assert_eq!(ch.client_count(), 0);

    // removing an absent id is a no-op
    ch.remove_client(&id);
    assert_eq!(ch.client_count(), 0);
}

#[test]
fn test_channel_remove_client_closes_its_queue() {
    let ch = Channel::new("t");
    let (client, mut rx) = Client::new("", "t");
    let id = client.id().to_string();

    ch.add_client(client);
    ch.remove_client(&id);

    assert!(matches!(rx.try_recv(), Err(TryRecvError::Disconnected)));

    // a broadcast after removal cannot reach the detached client
    ch.broadcast(&Message::new("1", "late", ""));
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Disconnected)));
}

#[test]
fn test_channel_broadcast_reaches_all_clients() {
    let ch = Channel::new("t");
    let (a, mut rx_a) = Client::new("", "t");
    let (b, mut rx_b) = Client::new("", "t");

    ch.add_client(a);
    ch.add_client(b);
    ch.broadcast(&Message::new("1", "hello", ""));

    assert_eq!(rx_a.try_recv().unwrap().data(), "hello");
    assert_eq!(rx_b.try_recv().unwrap().data(), "hello");
    assert_eq!(ch.last_event_id(), "1");
}

#[test]
fn test_channel_broadcast_to_subset() {
    let ch = Channel::new("t");
    let (a, mut rx_a) = Client::new("", "t");
    let (b, mut rx_b) = Client::new("", "t");
    let a_id = a.id().to_string();

    ch.add_client(a);
    ch.add_client(b);

    // unknown ids in the subset are skipped silently
    let targets = vec![a_id, "not-a-member".to_string()];
    ch.broadcast_to(&Message::new("1", "only-a", ""), &targets);

    assert_eq!(rx_a.try_recv().unwrap().data(), "only-a");
    assert!(matches!(rx_b.try_recv(), Err(TryRecvError::Empty)));
}

#[test]
fn test_channel_close_disconnects_everyone() {
    let ch = Channel::new("t");
    let (a, mut rx_a) = Client::new("", "t");
    let (b, mut rx_b) = Client::new("", "t");

    ch.add_client(a);
    ch.add_client(b);
    ch.close();

    assert_eq!(ch.client_count(), 0);
    assert!(matches!(rx_a.try_recv(), Err(TryRecvError::Disconnected)));
    assert!(matches!(rx_b.try_recv(), Err(TryRecvError::Disconnected)));
}

#[tokio::test]
async fn test_attach_creates_channel_lazily() {
    let broker = Broker::new();
    assert!(!broker.has_channel("news"));

    let (client, _rx) = Client::new("", "news");
    broker.attach(client).unwrap();

    assert!(wait_for(|| broker.has_channel("news")).await);
    assert_eq!(broker.get_channel("news").unwrap().client_count(), 1);
    assert_eq!(broker.channels(), vec!["news".to_string()]);
}

#[tokio::test]
async fn test_broadcast_scenario_single_subscriber() {
    let broker = Broker::new();
    let (client, mut rx) = Client::new("", "news");
    let client_id = client.id().to_string();

    broker.attach(client).unwrap();
    assert!(wait_for(|| broker.has_channel("news")).await);

    broker
        .broadcast("news", &Message::new("1", "hello", ""))
        .unwrap();

    let msg = rx.recv().await.unwrap();
    assert_eq!(msg.id(), "1");
    assert_eq!(msg.data(), "hello");
    assert_eq!(broker.get_channel("news").unwrap().last_event_id(), "1");

    broker.detach("news", &client_id);
    assert!(wait_for(|| !broker.has_channel("news")).await);

    let err = broker.broadcast("news", &Message::simple("x")).unwrap_err();
    assert!(matches!(err, Error::NoClients { .. }));
}

#[tokio::test]
async fn test_broadcast_order_and_last_event_id() {
    let broker = Broker::new();
    let (client, mut rx) = Client::new("", "feed");

    broker.attach(client).unwrap();
    assert!(wait_for(|| broker.has_channel("feed")).await);

    for i in 1..=100 {
        broker
            .broadcast("feed", &Message::new(&format!("id_{i}"), "msg", ""))
            .unwrap();
    }

    let mut last_id = String::new();
    for i in 1..=100 {
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.id(), format!("id_{i}"));
        last_id = msg.id().to_string();
    }

    assert_eq!(broker.get_channel("feed").unwrap().last_event_id(), last_id);
}

#[tokio::test]
async fn test_detach_destroys_empty_channel() {
    let broker = Broker::new();
    let (client, mut rx) = Client::new("", "news");
    let client_id = client.id().to_string();

    broker.attach(client).unwrap();
    assert!(wait_for(|| broker.has_channel("news")).await);

    broker.detach("news", &client_id);
    assert!(wait_for(|| !broker.has_channel("news")).await);
    assert!(rx.recv().await.is_none());

    // a fresh attach recreates the channel
    let (client, _rx) = Client::new("", "news");
    broker.attach(client).unwrap();
    assert!(wait_for(|| broker.has_channel("news")).await);
    assert_eq!(broker.get_channel("news").unwrap().client_count(), 1);
}

#[tokio::test]
async fn test_detach_unknown_client_is_noop() {
    let broker = Broker::new();
    broker.detach("ghost", "nobody");

    // the loop stays healthy and keeps processing events
    let (client, _rx) = Client::new("", "alive");
    broker.attach(client).unwrap();
    assert!(wait_for(|| broker.has_channel("alive")).await);
}

#[tokio::test]
async fn test_broadcast_without_clients_has_no_side_effect() {
    let broker = Broker::new();

    let err = broker.broadcast("nowhere", &Message::simple("x")).unwrap_err();
    assert!(matches!(err, Error::NoClients { .. }));
    assert!(!broker.has_channel("nowhere"));
    assert!(broker.channels().is_empty());
}

#[tokio::test]
async fn test_broadcast_to_subset_through_broker() {
    let broker = Broker::new();
    let (a, mut rx_a) = Client::new("", "t");
    let (b, mut rx_b) = Client::new("", "t");
    let a_id = a.id().to_string();

    broker.attach(a).unwrap();
    broker.attach(b).unwrap();
    assert!(wait_for(|| broker.client_count() == 2).await);

    broker
        .broadcast_to("t", &[a_id], &Message::new("1", "only-a", ""))
        .unwrap();

    assert_eq!(rx_a.recv().await.unwrap().data(), "only-a");
    assert!(matches!(rx_b.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_client_count_sums_channels() {
    let broker = Broker::new();
    let mut receivers = Vec::new();

    for channel in ["a", "a", "b"] {
        let (client, rx) = Client::new("", channel);
        receivers.push(rx);
        broker.attach(client).unwrap();
    }

    assert!(wait_for(|| broker.client_count() == 3).await);

    let per_channel: usize = broker
        .channels()
        .iter()
        .filter_map(|name| broker.get_channel(name))
        .map(|ch| ch.client_count())
        .sum();

    assert_eq!(broker.client_count(), per_channel);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_client_count_under_churn() {
    let broker = Arc::new(Broker::new());
    let mut handles = Vec::new();

    for task in 0..4 {
        let broker = Arc::clone(&broker);
        handles.push(tokio::spawn(async move {
            for _ in 0..50 {
                let channel = format!("churn-{}", task % 2);
                let (client, _rx) = Client::new("", &channel);
                let client_id = client.id().to_string();

                broker.attach(client).unwrap();
                let _ = broker.broadcast(&channel, &Message::simple("x"));
                broker.detach(&channel, &client_id);
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert!(wait_for(|| broker.client_count() == 0).await);

    let per_channel: usize = broker
        .channels()
        .iter()
        .filter_map(|name| broker.get_channel(name))
        .map(|ch| ch.client_count())
        .sum();

    assert_eq!(broker.client_count(), per_channel);
}

#[tokio::test]
async fn test_close_channel_disconnects_its_clients() {
    let broker = Broker::new();
    let (client, mut rx) = Client::new("", "temp");

    broker.attach(client).unwrap();
    assert!(wait_for(|| broker.has_channel("temp")).await);

    broker.close_channel("temp");
    assert!(wait_for(|| !broker.has_channel("temp")).await);
    assert!(rx.recv().await.is_none());

    // closing a nonexistent channel is logged, not an error
    broker.close_channel("missing");
}

#[tokio::test]
async fn test_restart_tears_down_but_keeps_dispatching() {
    let broker = Broker::new();
    let (client, mut rx) = Client::new("", "live");

    broker.attach(client).unwrap();
    assert!(wait_for(|| broker.has_channel("live")).await);

    broker.restart();
    assert!(broker.channels().is_empty());
    assert!(rx.recv().await.is_none());

    // the dispatch loop is still running, so channels can come back
    let (client, _rx) = Client::new("", "live");
    broker.attach(client).unwrap();
    assert!(wait_for(|| broker.has_channel("live")).await);
}

#[tokio::test]
async fn test_shutdown_closes_every_queue_once() {
    let broker = Broker::new();
    let (a, mut rx_a) = Client::new("", "one");
    let (b, mut rx_b) = Client::new("", "two");

    broker.attach(a).unwrap();
    broker.attach(b).unwrap();
    assert!(wait_for(|| broker.client_count() == 2).await);

    broker.shutdown();

    // each connection observes exactly one end-of-stream
    assert!(rx_a.recv().await.is_none());
    assert!(rx_b.recv().await.is_none());
    assert!(broker.channels().is_empty());

    // a second shutdown neither deadlocks nor panics
    broker.shutdown();

    // once the loop has stopped, attach is rejected
    assert!(
        wait_for(|| {
            let (client, _rx) = Client::new("", "one");
            broker.attach(client).is_err()
        })
        .await
    );
}
