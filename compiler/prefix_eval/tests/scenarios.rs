#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test code; panics give clear failure messages"
)]

//! Whole-program scenarios run through the public interpreter API.

use std::thread;

use pretty_assertions::assert_eq;
use prefix_eval::{buffer_handler, Interpreter, Namespace, Scope, Value};
use prefix_ir::{DeclType, Expr, FuncDef, Param, Program, Stmt};

fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::call(name, args)
}

fn add(name: &str, n: i64) -> Stmt {
    Stmt::assign(name, call("ADD", vec![Expr::ident(name), Expr::int(n)]))
}

fn interpreter(ns: Namespace, globals: Scope) -> Interpreter {
    Interpreter::builder()
        .namespace(ns)
        .globals(globals)
        .print_handler(buffer_handler())
        .build()
}

fn global_int(interp: &Interpreter, name: &str) -> i64 {
    interp
        .namespace()
        .get(interp.globals(), name)
        .and_then(|b| b.value.as_int())
        .unwrap()
}

#[test]
fn goto_from_inside_a_loop_restarts_at_the_label() {
    // before runs once; the loop jumps back on iteration 3 of the first pass.
    let program = Program::new(vec![
        Stmt::typed(DeclType::Int, "before", Expr::int(0)),
        Stmt::typed(DeclType::Int, "visits", Expr::int(0)),
        add("before", 1),
        Stmt::label(Expr::str("L")),
        add("visits", 1),
        Stmt::for_(
            "i",
            Expr::int(5),
            vec![Stmt::if_(
                call(
                    "AND",
                    vec![
                        call("EQ", vec![Expr::ident("i"), Expr::int(3)]),
                        call("LT", vec![Expr::ident("visits"), Expr::int(2)]),
                    ],
                ),
                vec![Stmt::goto(Expr::str("L"))],
                None,
            )],
        ),
        Stmt::try_(
            vec![Stmt::cont()],
            Some("err"),
            vec![Stmt::typed(DeclType::Str, "leak", Expr::ident("err"))],
        ),
    ]);

    for ns in [Namespace::direct(), Namespace::buffered().unwrap()] {
        let mut interp = interpreter(ns.clone(), Scope::global());
        interp.run(&program).unwrap();
        assert_eq!(global_int(&interp, "before"), 1);
        assert_eq!(global_int(&interp, "visits"), 2);
        assert_eq!(global_int(&interp, "i"), 5);
        let leak = interp.namespace().get(interp.globals(), "leak").unwrap();
        assert_eq!(leak.value, Value::string("CONTINUE outside of loop"));
        ns.shutdown();
    }
}

#[test]
fn copy_shares_containers_but_not_strings() {
    let program = Program::new(vec![
        Stmt::typed(DeclType::Tns, "t", Expr::tns(vec![Expr::int(1), Expr::int(2)])),
        Stmt::typed(DeclType::Tns, "t2", call("COPY", vec![Expr::ident("t")])),
        Stmt::typed(DeclType::Tns, "t3", call("DEEPCOPY", vec![Expr::ident("t")])),
        Stmt::typed(DeclType::Str, "s", Expr::str("text")),
        Stmt::typed(DeclType::Str, "s2", call("COPY", vec![Expr::ident("s")])),
    ]);
    let mut interp = interpreter(Namespace::direct(), Scope::global());
    interp.run(&program).unwrap();

    let get = |name: &str| {
        interp
            .namespace()
            .get(interp.globals(), name)
            .unwrap()
            .value
    };
    assert!(get("t").ptr_eq(&get("t2")));
    assert!(!get("t").ptr_eq(&get("t3")));
    assert!(get("t").deep_eq(&get("t3")));
    assert_eq!(get("s"), get("s2"));
    assert!(!get("s").ptr_eq(&get("s2")));
}

#[test]
fn interpreters_on_threads_share_one_global_scope() {
    const WORKERS: i64 = 4;
    const ROUNDS: i64 = 25;

    let ns = Namespace::buffered().unwrap();
    let globals = Scope::global();
    ns.assign(&globals, "last", Value::Int(-1), DeclType::Int, true)
        .unwrap();

    thread::scope(|s| {
        for id in 0..WORKERS {
            let ns = ns.clone();
            let globals = globals.clone();
            s.spawn(move || {
                let own = format!("count{id}");
                let program = Program::new(vec![
                    Stmt::typed(DeclType::Int, own.clone(), Expr::int(0)),
                    Stmt::for_(
                        "k",
                        Expr::int(ROUNDS),
                        vec![add(&own, 1), Stmt::assign("last", Expr::int(id))],
                    ),
                ]);
                // Each thread has its own counter scope for `k`.
                let mut interp = interpreter(ns, globals.child());
                interp.run(&program).unwrap();
            });
        }
    });

    let last = ns.get(&globals, "last").unwrap().value.as_int().unwrap();
    assert!((0..WORKERS).contains(&last), "last = {last}");
    // Counters were declared in the per-thread scopes, not the globals.
    assert!(ns.get(&globals, "count0").is_none());
    ns.shutdown();
}

#[test]
fn recursive_fibonacci_in_both_modes() {
    let fib = FuncDef::new(
        "fib",
        vec![Param::new(DeclType::Int, "n")],
        DeclType::Int,
        vec![
            Stmt::if_(
                call("LT", vec![Expr::ident("n"), Expr::int(2)]),
                vec![Stmt::ret(Expr::ident("n"))],
                None,
            ),
            Stmt::ret(call(
                "ADD",
                vec![
                    call("fib", vec![call("SUB", vec![Expr::ident("n"), Expr::int(1)])]),
                    call("fib", vec![call("SUB", vec![Expr::ident("n"), Expr::int(2)])]),
                ],
            )),
        ],
    );
    let program = Program::new(vec![
        Stmt::func(fib),
        Stmt::ret(call("fib", vec![Expr::int(12)])),
    ]);
    for ns in [Namespace::direct(), Namespace::buffered().unwrap()] {
        let mut interp = interpreter(ns.clone(), Scope::global());
        assert_eq!(interp.run(&program).unwrap(), Value::Int(144));
        ns.shutdown();
    }
}

#[test]
fn uncaught_error_reports_location_and_stops() {
    let program = Program::new(vec![
        Stmt::expr(call("PRINT", vec![Expr::str("first")])),
        Stmt::expr(call("DIV", vec![Expr::int(1), Expr::int(0)])).at(4, 1),
        Stmt::expr(call("PRINT", vec![Expr::str("never")])),
    ]);
    let mut interp = interpreter(Namespace::direct(), Scope::global());
    let err = interp.run(&program).unwrap_err();
    assert_eq!(err.describe(), "Division by zero at 4:1");
    assert_eq!(interp.get_print_output(), "first\n");
}
