use super::*;
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;

fn frame(text: &str) -> Frame {
    Arc::from(text)
}

fn drain(rx: &mut mpsc::Receiver<Frame>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(f) = rx.try_recv() {
        out.push(f.to_string());
    }
    out
}

#[test]
fn test_join_creates_room() {
    let registry = RoomRegistry::new();
    let (conn, _rx) = Connection::channel(8);

    let outcome = registry.join("r1", &conn);

    assert_eq!(outcome.previous, None);
    assert!(outcome.created);
    assert!(registry.contains_room("r1"));
    assert_eq!(registry.member_count("r1"), 1);
    assert_eq!(registry.room_of(conn.id()), Some("r1".to_string()));
}

#[test]
fn test_second_member_does_not_recreate_room() {
    let registry = RoomRegistry::new();
    let (a, _rx_a) = Connection::channel(8);
    let (b, _rx_b) = Connection::channel(8);

    registry.join("r1", &a);
    let outcome = registry.join("r1", &b);

    assert!(!outcome.created);
    assert_eq!(registry.member_count("r1"), 2);
    assert_eq!(registry.room_count(), 1);
}

#[test]
fn test_leave_last_member_removes_room() {
    let registry = RoomRegistry::new();
    let (conn, _rx) = Connection::channel(8);

    registry.join("r1", &conn);
    assert_eq!(registry.leave(conn.id()), Some("r1".to_string()));

    assert!(!registry.contains_room("r1"));
    assert_eq!(registry.member_count("r1"), 0);
    assert_eq!(registry.room_count(), 0);
    assert_eq!(registry.room_of(conn.id()), None);
}

#[test]
fn test_leave_keeps_room_with_remaining_members() {
    let registry = RoomRegistry::new();
    let (a, _rx_a) = Connection::channel(8);
    let (b, _rx_b) = Connection::channel(8);

    registry.join("r1", &a);
    registry.join("r1", &b);
    registry.leave(a.id());

    assert!(registry.contains_room("r1"));
    assert_eq!(registry.member_count("r1"), 1);
}

#[test]
fn test_leave_is_idempotent() {
    let registry = RoomRegistry::new();
    let (conn, _rx) = Connection::channel(8);

    // Never joined
    assert_eq!(registry.leave(conn.id()), None);

    registry.join("r1", &conn);
    assert_eq!(registry.leave(conn.id()), Some("r1".to_string()));
    assert_eq!(registry.leave(conn.id()), None);
}

#[test]
fn test_rejoin_moves_connection() {
    let registry = RoomRegistry::new();
    let (a, _rx_a) = Connection::channel(8);
    let (b, _rx_b) = Connection::channel(8);

    registry.join("r1", &a);
    registry.join("r1", &b);

    let outcome = registry.join("r2", &a);

    assert_eq!(outcome.previous, Some("r1".to_string()));
    assert!(outcome.created);
    assert_eq!(registry.member_count("r1"), 1);
    assert_eq!(registry.member_count("r2"), 1);
    assert_eq!(registry.room_of(a.id()), Some("r2".to_string()));
}

#[test]
fn test_rejoin_from_sole_membership_removes_old_room() {
    let registry = RoomRegistry::new();
    let (conn, _rx) = Connection::channel(8);

    registry.join("r1", &conn);
    registry.join("r2", &conn);

    assert!(!registry.contains_room("r1"));
    assert!(registry.contains_room("r2"));
    assert_eq!(registry.room_count(), 1);
}

#[test]
fn test_rejoin_same_room_keeps_single_membership() {
    let registry = RoomRegistry::new();
    let (conn, _rx) = Connection::channel(8);

    registry.join("r1", &conn);
    let outcome = registry.join("r1", &conn);

    assert_eq!(outcome.previous, Some("r1".to_string()));
    assert!(!outcome.created);
    assert_eq!(registry.member_count("r1"), 1);
}

#[test]
fn test_broadcast_excludes_sender() {
    let registry = RoomRegistry::new();
    let (a, mut rx_a) = Connection::channel(8);
    let (b, mut rx_b) = Connection::channel(8);
    let (c, mut rx_c) = Connection::channel(8);

    registry.join("r1", &a);
    registry.join("r1", &b);
    registry.join("r1", &c);

    let delivered = registry.broadcast("r1", &frame("hello"), Some(a.id()));

    assert_eq!(delivered, 2);
    assert!(drain(&mut rx_a).is_empty());
    assert_eq!(drain(&mut rx_b), vec!["hello"]);
    assert_eq!(drain(&mut rx_c), vec!["hello"]);
}

#[test]
fn test_broadcast_without_exclude_reaches_everyone() {
    let registry = RoomRegistry::new();
    let (a, mut rx_a) = Connection::channel(8);
    let (b, mut rx_b) = Connection::channel(8);

    registry.join("r1", &a);
    registry.join("r1", &b);

    assert_eq!(registry.broadcast("r1", &frame("x"), None), 2);
    assert_eq!(drain(&mut rx_a), vec!["x"]);
    assert_eq!(drain(&mut rx_b), vec!["x"]);
}

#[test]
fn test_broadcast_stays_inside_room() {
    let registry = RoomRegistry::new();
    let (a, _rx_a) = Connection::channel(8);
    let (b, mut rx_b) = Connection::channel(8);
    let (outsider, mut rx_out) = Connection::channel(8);

    registry.join("r1", &a);
    registry.join("r1", &b);
    registry.join("r2", &outsider);

    registry.broadcast("r1", &frame("only r1"), Some(a.id()));

    assert_eq!(drain(&mut rx_b), vec!["only r1"]);
    assert!(drain(&mut rx_out).is_empty());
}

#[test]
fn test_broadcast_skips_closed_connection() {
    let registry = RoomRegistry::new();
    let (a, mut rx_a) = Connection::channel(8);
    let (b, rx_b) = Connection::channel(8);

    registry.join("r1", &a);
    registry.join("r1", &b);

    // Writer side gone: b is closed but still a member
    drop(rx_b);
    assert!(!b.is_open());

    let delivered = registry.broadcast("r1", &frame("ping"), None);

    assert_eq!(delivered, 1);
    assert_eq!(drain(&mut rx_a), vec!["ping"]);
    assert_eq!(registry.member_count("r1"), 2);
}

#[test]
fn test_broadcast_to_missing_room_is_noop() {
    let registry = RoomRegistry::new();
    assert_eq!(registry.broadcast("nowhere", &frame("x"), None), 0);
    assert_eq!(registry.room_count(), 0);
}

#[test]
fn test_broadcast_drops_when_buffer_full() {
    let registry = RoomRegistry::new();
    let (a, mut rx_a) = Connection::channel(1);

    registry.join("r1", &a);

    assert_eq!(registry.broadcast("r1", &frame("first"), None), 1);
    assert_eq!(registry.broadcast("r1", &frame("second"), None), 0);
    assert_eq!(drain(&mut rx_a), vec!["first"]);
}

#[test]
fn test_membership_index_matches_member_sets() {
    let registry = RoomRegistry::new();
    let conns: Vec<_> = (0..6).map(|_| Connection::channel(8)).collect();
    let rooms = ["a", "b", "c"];

    for (i, (conn, _)) in conns.iter().enumerate() {
        registry.join(rooms[i % 3], conn);
    }
    for (i, (conn, _)) in conns.iter().enumerate() {
        if i % 2 == 0 {
            registry.join(rooms[(i + 1) % 3], conn);
        } else {
            registry.leave(conn.id());
        }
    }

    let mut total = 0;
    for room in rooms {
        let count = registry.member_count(room);
        assert_eq!(registry.contains_room(room), count > 0);
        total += count;
    }
    let joined = conns
        .iter()
        .filter(|(c, _)| registry.room_of(c.id()).is_some())
        .count();
    assert_eq!(total, joined);
    assert_eq!(joined, 3);
}

#[test]
fn test_concurrent_join_leave_broadcast() {
    let registry = Arc::new(RoomRegistry::new());
    let mut handles = vec![];

    for t in 0..8 {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            let (conn, mut rx) = Connection::channel(1024);
            for i in 0..200 {
                let room = format!("room_{}", (t + i) % 4);
                registry.join(&room, &conn);
                assert_eq!(registry.room_of(conn.id()), Some(room.clone()));
                registry.broadcast(&room, &Arc::from("tick"), Some(conn.id()));
                if i % 3 == 0 {
                    registry.leave(conn.id());
                }
                while rx.try_recv().is_ok() {}
            }
            registry.leave(conn.id());
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    // Every connection has left: no room may survive
    assert_eq!(registry.room_count(), 0);
}
