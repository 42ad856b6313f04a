use super::{Broker, Message};
use futures_util::StreamExt;
use std::time::Duration;

fn message(id: i64) -> Message {
    Message {
        id,
        name: "alice".to_string(),
        email: "a@x.com".to_string(),
        date: "Mon Jan  2 15:04:05 2006".to_string(),
        topic: "hi".to_string(),
        content: format!("message {id}"),
    }
}

#[test]
fn test_broker_new() {
    let broker = Broker::default();
    assert_eq!(broker.subscriber_count(), 0);
}

#[test]
fn test_subscribe_and_unsubscribe() {
    let broker = Broker::default();
    let sub = broker.subscribe();
    let id = sub.id();
    assert!(broker.is_subscribed(&id));

    assert!(broker.unsubscribe(&id));
    assert!(!broker.is_subscribed(&id));
    // a second unsubscribe is a no-op
    assert!(!broker.unsubscribe(&id));
}

#[test]
fn test_dropping_subscription_unsubscribes() {
    let broker = Broker::default();
    let sub = broker.subscribe();
    assert_eq!(broker.subscriber_count(), 1);
    drop(sub);
    assert_eq!(broker.subscriber_count(), 0);
}

#[tokio::test]
async fn test_publish_reaches_every_subscriber() {
    let broker = Broker::default();
    let mut a = broker.subscribe();
    let mut b = broker.subscribe();

    assert_eq!(broker.publish(message(1)), 2);

    assert_eq!(*a.recv().await.unwrap(), message(1));
    assert_eq!(*b.recv().await.unwrap(), message(1));
}

#[tokio::test]
async fn test_late_subscriber_misses_earlier_messages() {
    let broker = Broker::default();
    assert_eq!(broker.publish(message(1)), 0);

    let mut late = broker.subscribe();
    broker.publish(message(2));
    assert_eq!(late.recv().await.unwrap().id, 2);
}

#[tokio::test]
async fn test_publish_preserves_order() {
    let broker = Broker::default();
    let mut sub = broker.subscribe();
    for id in 1..=5 {
        broker.publish(message(id));
    }

    let ids: Vec<i64> = (&mut sub).take(5).map(|m| m.id).collect().await;
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_slow_subscriber_is_dropped() {
    let broker = Broker::new(2);
    let mut slow = broker.subscribe();
    let mut healthy = broker.subscribe();

    broker.publish(message(1));
    assert_eq!(healthy.recv().await.unwrap().id, 1);
    broker.publish(message(2));
    assert_eq!(healthy.recv().await.unwrap().id, 2);

    // slow never read: its queue of two is now full
    assert_eq!(broker.publish(message(3)), 1);
    assert!(!broker.is_subscribed(&slow.id()));
    assert!(broker.is_subscribed(&healthy.id()));
    assert_eq!(healthy.recv().await.unwrap().id, 3);

    // the slow feed drains what it had and then ends
    assert_eq!(slow.recv().await.unwrap().id, 1);
    assert_eq!(slow.recv().await.unwrap().id, 2);
    let end = tokio::time::timeout(Duration::from_secs(1), slow.recv())
        .await
        .expect("feed should end, not hang");
    assert!(end.is_none());
}

#[tokio::test]
async fn test_unsubscribe_during_publish_burst() {
    let broker = Broker::default();
    let sub = broker.subscribe();
    let id = sub.id();

    let publisher = {
        let broker = broker.clone();
        tokio::spawn(async move {
            for n in 1..=100 {
                broker.publish(message(n));
                tokio::task::yield_now().await;
            }
        })
    };
    drop(sub);
    publisher.await.unwrap();

    assert!(!broker.is_subscribed(&id));
    assert_eq!(broker.subscriber_count(), 0);
}

#[test]
fn test_encode_batch_shape() {
    let json = super::message::encode_batch(&[message(7)]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let arr = value.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    let obj = arr[0].as_object().unwrap();
    for key in ["id", "name", "email", "date", "topic", "content"] {
        assert!(obj.contains_key(key), "missing {key}");
    }
    assert_eq!(obj["id"], 7);
}
