use std::sync::Arc;

use super::{ChatLog, IdAllocator, MessageStore};
use crate::broker::message::{Draft, Message};
use crate::persistence::Persistence;
use crate::utils::RelayError;
use tempfile::tempdir;

fn draft(content: &str) -> Draft {
    Draft {
        name: "alice".into(),
        email: "a@x.com".into(),
        date: "Mon Jan  2 15:04:05 2006".into(),
        topic: "hi".into(),
        content: content.into(),
    }
}

fn filled_log(n: usize) -> ChatLog {
    let mut log = ChatLog::default();
    for i in 0..n {
        log.append(draft(&format!("m{i}"))).unwrap();
    }
    log
}

#[test]
fn allocator_starts_at_one() {
    let allocator = IdAllocator::new();
    assert_eq!(allocator.current(), 0);
    assert_eq!(allocator.next(), 1);
    assert_eq!(allocator.next(), 2);
    assert_eq!(allocator.current(), 2);
}

#[test]
fn allocator_rewind_reissues_next_id() {
    let allocator = IdAllocator::starting_at(10);
    assert_eq!(allocator.next(), 11);
    allocator.rewind_to(10);
    assert_eq!(allocator.next(), 11);
}

#[test]
fn allocator_is_unique_across_threads() {
    let allocator = Arc::new(IdAllocator::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let allocator = allocator.clone();
            std::thread::spawn(move || (0..250).map(|_| allocator.next()).collect::<Vec<_>>())
        })
        .collect();

    let mut ids: Vec<i64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=2000).collect::<Vec<_>>());
}

#[test]
fn store_rejects_out_of_sequence_ids() {
    let mut store = MessageStore::new();
    let err = store.append(draft("x").into_message(2)).unwrap_err();
    assert!(matches!(
        err,
        RelayError::IdMismatch {
            expected: 1,
            got: 2
        }
    ));
    assert!(store.is_empty());
}

#[test]
fn chat_log_assigns_contiguous_ids() {
    let log = filled_log(3);
    let ids: Vec<i64> = log.range(0, 3).iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(log.len(), 3);
    assert_eq!(log.last_id(), 3);
}

#[test]
fn range_is_half_open() {
    let log = filled_log(5);
    let contents: Vec<String> = log.range(1, 3).into_iter().map(|m| m.content).collect();
    assert_eq!(contents, vec!["m1", "m2"]);
}

#[test]
fn range_boundaries() {
    let log = filled_log(3);
    assert!(log.range(0, 0).is_empty());
    assert!(log.range(2, 1).is_empty());
    assert!(log.range(5, 10).is_empty());
    // beyond the end clamps instead of failing
    assert_eq!(log.range(1, 100).len(), 2);
    assert!(ChatLog::default().range(0, 10).is_empty());
}

#[test]
fn range_reads_are_idempotent() {
    let log = filled_log(4);
    let first: Vec<Message> = log.range(0, 4);
    let second: Vec<Message> = log.range(0, 4);
    assert_eq!(first, second);
}

#[tokio::test]
async fn persisted_log_resumes_ids_after_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().to_str().unwrap().to_string();
    {
        let store = MessageStore::with_persistence(Persistence::open(&path).unwrap()).unwrap();
        let mut log = ChatLog::new(store);
        log.append(draft("first")).unwrap();
        log.append(draft("second")).unwrap();
        log.durable().unwrap().flush().await.unwrap();
    }

    let store = MessageStore::with_persistence(Persistence::open(&path).unwrap()).unwrap();
    let mut log = ChatLog::new(store);
    assert_eq!(log.len(), 2);

    let third = log.append(draft("third")).unwrap();
    assert_eq!(third.id, 3);
    assert_eq!(log.range(0, 3)[0].content, "first");
}

#[test]
fn memory_only_log_has_no_durable_handle() {
    assert!(ChatLog::default().durable().is_none());
}
