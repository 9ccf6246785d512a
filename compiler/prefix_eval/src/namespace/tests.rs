use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::*;
use crate::environment::EnvError;
use pretty_assertions::assert_eq;

fn both_modes() -> Vec<Namespace> {
    vec![Namespace::direct(), Namespace::buffered().unwrap()]
}

#[test]
fn test_modes_agree_on_results() {
    for ns in both_modes() {
        let g = Scope::global();
        assert_eq!(ns.define(&g, "x", DeclType::Int), Ok(()));
        assert_eq!(
            ns.define(&g, "x", DeclType::Int),
            Err(EnvError::AlreadyDefined("x".into()))
        );
        assert_eq!(ns.assign(&g, "x", Value::Int(3), DeclType::Unknown, false), Ok(()));
        assert!(matches!(
            ns.assign(&g, "x", Value::from("no"), DeclType::Unknown, false),
            Err(EnvError::TypeMismatch { .. })
        ));
        assert_eq!(ns.get(&g, "x").unwrap().value, Value::Int(3));
        assert_eq!(ns.permafreeze(&g, "x"), Ok(()));
        assert_eq!(ns.thaw(&g, "x").map_err(|e| e.code()), Err(-2));
        assert_eq!(ns.thaw(&g, "nope").map_err(|e| e.code()), Err(-1));
        assert_eq!(ns.frozen_state(&g, "x"), Some(FrozenState::Permafrozen));
        assert!(ns.exists(&g, "x"));
    }
}

#[test]
fn test_buffered_writes_go_through_dispatcher() {
    let ns = Namespace::buffered().unwrap();
    assert!(ns.is_buffered());
    let g = Scope::global();
    ns.assign(&g, "a", Value::Int(1), DeclType::Int, true).unwrap();
    ns.set_alias(&g, "b", "a", DeclType::Unknown, true).unwrap();
    ns.freeze(&g, "a").unwrap();
    assert_eq!(ns.applied_ops(), 3);
    assert_eq!(ns.get_entry(&g, "b").unwrap().alias_target.as_deref(), Some("a"));
}

#[test]
fn test_failed_ops_are_data() {
    let ns = Namespace::buffered().unwrap();
    let g = Scope::global();
    ns.assign(&g, "f", Value::Int(1), DeclType::Int, true).unwrap();
    ns.freeze(&g, "f").unwrap();
    assert_eq!(
        ns.assign(&g, "f", Value::Int(2), DeclType::Unknown, false),
        Err(EnvError::Frozen("f".into()))
    );
    // the buffer keeps working after a rejected op
    ns.thaw(&g, "f").unwrap();
    ns.assign(&g, "f", Value::Int(2), DeclType::Unknown, false).unwrap();
    assert_eq!(ns.get(&g, "f").unwrap().value, Value::Int(2));
}

#[test]
fn test_shutdown_reverts_to_direct() {
    let ns = Namespace::buffered().unwrap();
    let g = Scope::global();
    ns.assign(&g, "x", Value::Int(1), DeclType::Int, true).unwrap();
    ns.shutdown();
    assert!(!ns.is_buffered());
    let applied = ns.applied_ops();
    ns.assign(&g, "x", Value::Int(2), DeclType::Unknown, false).unwrap();
    assert_eq!(ns.applied_ops(), applied);
    assert_eq!(ns.get(&g, "x").unwrap().value, Value::Int(2));
    ns.shutdown();
}

#[test]
fn test_concurrent_writers_single_value_wins() {
    const WRITERS: i64 = 16;
    for ns in both_modes() {
        let g = Scope::global();
        ns.define(&g, "x", DeclType::Int).unwrap();
        let handles: Vec<_> = (0..WRITERS)
            .map(|i| {
                let (ns, g) = (ns.clone(), g.clone());
                thread::spawn(move || ns.assign(&g, "x", Value::Int(i), DeclType::Int, false))
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), Ok(()));
        }
        let Value::Int(v) = ns.get(&g, "x").unwrap().value else {
            panic!("x lost its INT value");
        };
        assert!((0..WRITERS).contains(&v));
    }
}

#[test]
fn test_read_after_writes_sees_latest() {
    const N: i64 = 200;
    let ns = Namespace::buffered().unwrap();
    let g = Scope::global();
    ns.assign(&g, "x", Value::Int(0), DeclType::Int, true).unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let (ns, g) = (ns.clone(), g.clone());
            thread::spawn(move || {
                let mut last = 0;
                for _ in 0..N {
                    let v = ns.get(&g, "x").unwrap().value.as_int().unwrap();
                    assert!(v >= last, "read went backwards: {v} after {last}");
                    last = v;
                }
            })
        })
        .collect();

    for i in 1..=N {
        ns.assign(&g, "x", Value::Int(i), DeclType::Unknown, false)
            .unwrap();
    }
    assert_eq!(ns.get(&g, "x").unwrap().value, Value::Int(N));
    for r in readers {
        r.join().unwrap();
    }
}

#[test]
fn test_symbol_queue_blocks_until_drained() {
    let queue = Arc::new(SymbolQueue::new());
    queue.enter();
    queue.enter();
    assert_eq!(queue.pending(), 2);
    let q = Arc::clone(&queue);
    let releaser = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        q.leave();
        q.leave();
    });
    queue.wait_drained();
    assert_eq!(queue.pending(), 0);
    releaser.join().unwrap();
}

#[test]
fn test_nsop_symbol_and_kind() {
    let op = NsOp::Alias {
        name: "a".into(),
        target: "b".into(),
        ty: DeclType::Unknown,
        declare_if_missing: true,
    };
    assert_eq!(op.symbol(), "a");
    assert_eq!(op.kind(), "alias");
}
