use std::sync::Arc;

use straico_gateway::{ConversationStore, ConversationTurn, Role};

#[test]
fn keeps_most_recent_turns_in_order() {
    let store = ConversationStore::new(50).unwrap();
    for i in 0..57 {
        let turn = if i % 2 == 0 {
            ConversationTurn::user(format!("u{i}"))
        } else {
            ConversationTurn::assistant(format!("a{i}"))
        };
        store.append(9, turn);
    }

    let turns = store.read(9);
    assert_eq!(turns.len(), 50);
    assert_eq!(turns[0].content, "a7");
    assert_eq!(turns[49].content, "u56");
    assert_eq!(turns[49].role, Role::User);
}

#[test]
fn read_returns_a_snapshot() {
    let store = ConversationStore::new(10).unwrap();
    store.append(1, ConversationTurn::user("first"));
    let snapshot = store.read(1);
    store.append(1, ConversationTurn::assistant("second"));

    assert_eq!(snapshot.len(), 1);
    assert_eq!(store.read(1).len(), 2);
}

#[test]
fn speaker_name_is_preserved() {
    let store = ConversationStore::default();
    store.append(3, ConversationTurn::user("hello").with_speaker("grace"));
    let turns = store.read(3);
    assert_eq!(turns[0].speaker_name.as_deref(), Some("grace"));
}

#[test]
fn concurrent_appends_respect_capacity() {
    let store = Arc::new(ConversationStore::new(25).unwrap());
    let handles: Vec<_> = (0..8u64)
        .map(|worker| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..100 {
                    store.append(worker % 2, ConversationTurn::user(format!("{worker}-{i}")));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.channel_count(), 2);
    assert_eq!(store.read(0).len(), 25);
    assert_eq!(store.read(1).len(), 25);
    assert_eq!(store.total_turns(), 50);
}

#[test]
fn turns_serialize_with_lowercase_roles() {
    let turn = ConversationTurn::assistant("hi").with_speaker("bot");
    let value = serde_json::to_value(&turn).unwrap();
    assert_eq!(value["role"], "assistant");
    assert_eq!(value["name"], "bot");
}
