#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test code; panics give clear failure messages"
)]

//! Property tests for the environment, run in both namespace modes.

use prefix_eval::{EnvError, FrozenState, Namespace, Scope, Value};
use prefix_ir::DeclType;
use proptest::prelude::*;

fn modes() -> Vec<Namespace> {
    vec![Namespace::direct(), Namespace::buffered().unwrap()]
}

fn read_int(ns: &Namespace, scope: &Scope, name: &str) -> Option<i64> {
    ns.get(scope, name).and_then(|b| b.value.as_int())
}

/// A chain `n0 -> n1 -> ... -> terminal` built in `scope`.
fn build_chain(ns: &Namespace, scope: &Scope, len: usize) -> Vec<String> {
    let terminal = "terminal".to_owned();
    ns.assign(scope, &terminal, Value::Int(0), DeclType::Int, true)
        .unwrap();
    let mut names = vec![terminal];
    for i in 0..len {
        let name = format!("link{i}");
        let target = names.last().unwrap().clone();
        ns.set_alias(scope, &name, &target, DeclType::Int, true)
            .unwrap();
        names.push(name);
    }
    names
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn writes_through_any_link_reach_the_terminal(len in 1usize..8, pick in 0usize..8, v in any::<i64>()) {
        for ns in modes() {
            let scope = Scope::global();
            let names = build_chain(&ns, &scope, len);
            let via = &names[1 + pick % len];
            ns.assign(&scope, via, Value::Int(v), DeclType::Unknown, false).unwrap();
            prop_assert_eq!(read_int(&ns, &scope, "terminal"), Some(v));
            for name in &names {
                prop_assert_eq!(read_int(&ns, &scope, name), Some(v));
            }
            ns.shutdown();
        }
    }

    #[test]
    fn freezing_the_terminal_blocks_every_link(len in 1usize..8, v in any::<i64>()) {
        for ns in modes() {
            let scope = Scope::global();
            let names = build_chain(&ns, &scope, len);
            ns.freeze(&scope, "terminal").unwrap();
            for name in &names[1..] {
                let err = ns.assign(&scope, name, Value::Int(v), DeclType::Unknown, false);
                prop_assert!(matches!(err, Err(EnvError::Frozen(_))), "{name}: {err:?}");
            }
            prop_assert_eq!(read_int(&ns, &scope, "terminal"), Some(0));
            ns.shutdown();
        }
    }

    #[test]
    fn permafrozen_never_thaws(attempts in 1usize..6, refreeze in any::<bool>()) {
        for ns in modes() {
            let scope = Scope::global();
            ns.assign(&scope, "x", Value::Int(1), DeclType::Int, true).unwrap();
            ns.permafreeze(&scope, "x").unwrap();
            for _ in 0..attempts {
                let err = ns.thaw(&scope, "x").unwrap_err();
                prop_assert_eq!(err.code(), -2);
                prop_assert_ne!(err.code(), EnvError::NotFound(String::new()).code());
                if refreeze {
                    ns.freeze(&scope, "x").unwrap();
                }
            }
            prop_assert_eq!(ns.frozen_state(&scope, "x"), Some(FrozenState::Permafrozen));
            ns.shutdown();
        }
    }

    #[test]
    fn type_gate_leaves_value_unchanged(before in any::<i64>(), text in "[a-z]{0,12}") {
        for ns in modes() {
            let scope = Scope::global();
            ns.define(&scope, "x", DeclType::Int).unwrap();
            ns.assign(&scope, "x", Value::Int(before), DeclType::Unknown, false).unwrap();
            let err = ns.assign(&scope, "x", Value::string(text.clone()), DeclType::Unknown, false);
            prop_assert!(matches!(err, Err(EnvError::TypeMismatch { .. })), "{err:?}");
            prop_assert_eq!(read_int(&ns, &scope, "x"), Some(before));
            ns.shutdown();
        }
    }

    #[test]
    fn string_copies_are_equal_but_distinct(text in "[ -~]{0,24}") {
        let original = Value::string(text);
        let once = original.clone();
        let twice = once.clone();
        prop_assert_eq!(&twice, &original);
        prop_assert!(!twice.ptr_eq(&original));
        prop_assert!(!twice.ptr_eq(&once));
    }
}
