use pretty_assertions::assert_eq;
use prefix_ir::{DeclType, ElseIf, Expr, FuncDef, KwArg, Location, Param, Program, Stmt};

use super::*;
use crate::namespace::Namespace;
use crate::print_handler::buffer_handler;

fn interp() -> Interpreter {
    Interpreter::builder().print_handler(buffer_handler()).build()
}

fn run(body: Vec<Stmt>) -> Result<Value, EvalError> {
    interp().run(&Program::new(body))
}

fn run_err(body: Vec<Stmt>) -> EvalError {
    run(body).unwrap_err()
}

fn output(body: Vec<Stmt>) -> String {
    let mut it = interp();
    it.run(&Program::new(body)).unwrap();
    it.get_print_output()
}

fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::call(name, args)
}

fn print(e: Expr) -> Stmt {
    Stmt::expr(call("PRINT", vec![e]))
}

fn int_param(name: &str) -> Param {
    Param::new(DeclType::Int, name)
}

fn func(name: &str, params: Vec<Param>, ret: DeclType, body: Vec<Stmt>) -> Stmt {
    Stmt::func(FuncDef::new(name, params, ret, body))
}

// Bindings

#[test]
fn typed_assignment_declares() {
    let v = run(vec![
        Stmt::typed(DeclType::Int, "x", Expr::int(5)),
        Stmt::assign("x", Expr::int(6)),
        Stmt::ret(Expr::ident("x")),
    ]);
    assert_eq!(v.unwrap(), Value::Int(6));
}

#[test]
fn assignment_errors() {
    assert_eq!(
        run_err(vec![Stmt::assign("y", Expr::int(1))]).message,
        "Cannot assign to undeclared identifier 'y'"
    );
    assert_eq!(
        run_err(vec![
            Stmt::typed(DeclType::Int, "x", Expr::int(5)),
            Stmt::assign("x", Expr::str("s")),
        ])
        .message,
        "Type mismatch: expected INT but got STR"
    );
    assert_eq!(
        run_err(vec![Stmt::typed(DeclType::Flt, "f", Expr::int(1))]).message,
        "Type mismatch: expected FLT but got INT"
    );
}

#[test]
fn reads_of_missing_and_uninitialized() {
    assert_eq!(
        run_err(vec![Stmt::ret(Expr::ident("z"))]).message,
        "Undefined identifier 'z'"
    );
    assert_eq!(
        run_err(vec![
            Stmt::decl(DeclType::Int, "x"),
            Stmt::ret(Expr::ident("x")),
        ])
        .message,
        "Identifier 'x' declared but not initialized"
    );
}

#[test]
fn redeclaration_is_an_error() {
    let err = run_err(vec![
        Stmt::decl(DeclType::Int, "x"),
        Stmt::decl(DeclType::Str, "x"),
    ]);
    assert_eq!(err.message, "Cannot redeclare identifier 'x'");
}

#[test]
fn declaration_then_assignment() {
    let v = run(vec![
        Stmt::decl(DeclType::Str, "s"),
        Stmt::assign("s", Expr::str("ok")),
        Stmt::ret(Expr::ident("s")),
    ]);
    assert_eq!(v.unwrap(), Value::string("ok"));
}

#[test]
fn alias_writes_reach_target() {
    let v = run(vec![
        Stmt::typed(DeclType::Int, "x", Expr::int(1)),
        Stmt::typed(DeclType::Int, "y", Expr::ptr("x")),
        Stmt::assign("y", Expr::int(7)),
        Stmt::ret(Expr::ident("x")),
    ]);
    assert_eq!(v.unwrap(), Value::Int(7));
}

#[test]
fn alias_to_self_is_rejected() {
    let err = run_err(vec![
        Stmt::typed(DeclType::Int, "x", Expr::int(1)),
        Stmt::typed(DeclType::Int, "y", Expr::ptr("y")),
    ]);
    assert!(err.message.starts_with("Cannot create alias 'y' -> 'y'"), "{}", err.message);
}

#[test]
fn errors_carry_statement_location() {
    let err = run_err(vec![
        Stmt::typed(DeclType::Int, "x", Expr::int(1)),
        Stmt::ret(Expr::ident("missing")).at(2, 3),
    ]);
    assert_eq!(err.location, Some(Location::new(2, 3)));
    assert_eq!(err.describe(), "Undefined identifier 'missing' at 2:3");
}

// Control flow

#[test]
fn if_elseif_else() {
    let pick = |n: i64| {
        run(vec![
            Stmt::if_chain(
                call("EQ", vec![Expr::int(n), Expr::int(1)]),
                vec![Stmt::ret(Expr::str("one"))],
                vec![ElseIf {
                    cond: call("EQ", vec![Expr::int(n), Expr::int(2)]),
                    body: vec![Stmt::ret(Expr::str("two"))],
                }],
                Some(vec![Stmt::ret(Expr::str("many"))]),
            ),
        ])
        .unwrap()
    };
    assert_eq!(pick(1), Value::string("one"));
    assert_eq!(pick(2), Value::string("two"));
    assert_eq!(pick(9), Value::string("many"));
}

#[test]
fn for_counts_from_one() {
    let out = output(vec![Stmt::for_("i", Expr::int(3), vec![print(Expr::ident("i"))])]);
    assert_eq!(out, "1\n10\n11\n");
}

#[test]
fn for_target_must_be_int() {
    let err = run_err(vec![Stmt::for_("i", Expr::str("3"), vec![])]);
    assert_eq!(err.message, "FOR target must be INT, got STR");
}

#[test]
fn while_with_break_and_continue() {
    // Print odd numbers below 6, stop at 6.
    let out = output(vec![
        Stmt::typed(DeclType::Int, "n", Expr::int(0)),
        Stmt::while_(
            Expr::int(1),
            vec![
                Stmt::assign("n", call("ADD", vec![Expr::ident("n"), Expr::int(1)])),
                Stmt::if_(
                    call("EQ", vec![Expr::ident("n"), Expr::int(6)]),
                    vec![Stmt::brk(1)],
                    None,
                ),
                Stmt::if_(
                    call("EQ", vec![call("MOD", vec![Expr::ident("n"), Expr::int(2)]), Expr::int(0)]),
                    vec![Stmt::cont()],
                    None,
                ),
                print(Expr::ident("n")),
            ],
        ),
    ]);
    assert_eq!(out, "1\n11\n101\n");
}

#[test]
fn break_leaves_several_loops() {
    let out = output(vec![
        Stmt::for_(
            "i",
            Expr::int(3),
            vec![Stmt::for_(
                "j",
                Expr::int(3),
                vec![
                    Stmt::if_(
                        call("EQ", vec![Expr::ident("j"), Expr::int(2)]),
                        vec![Stmt::brk(2)],
                        None,
                    ),
                    print(Expr::ident("j")),
                ],
            )],
        ),
        print(Expr::str("done")),
    ]);
    assert_eq!(out, "1\ndone\n");
}

#[test]
fn break_and_continue_outside_loops() {
    assert_eq!(
        run_err(vec![Stmt::for_("i", Expr::int(1), vec![Stmt::brk(2)])]).message,
        "BREAK(2) exceeds loop depth 1"
    );
    assert_eq!(run_err(vec![Stmt::cont()]).message, "CONTINUE outside of loop");
}

#[test]
fn goto_loops_back_to_label() {
    let v = run(vec![
        Stmt::typed(DeclType::Int, "n", Expr::int(0)),
        Stmt::label(Expr::int(1)),
        Stmt::assign("n", call("ADD", vec![Expr::ident("n"), Expr::int(1)])),
        Stmt::if_(
            call("LT", vec![Expr::ident("n"), Expr::int(3)]),
            vec![Stmt::goto(Expr::int(1))],
            None,
        ),
        Stmt::ret(Expr::ident("n")),
    ]);
    assert_eq!(v.unwrap(), Value::Int(3));
}

#[test]
fn goto_with_string_label_skips_forward() {
    let out = output(vec![
        Stmt::goto(Expr::str("end")),
        print(Expr::str("skipped")),
        Stmt::label(Expr::str("end")),
        print(Expr::str("reached")),
    ]);
    assert_eq!(out, "reached\n");
}

#[test]
fn label_errors() {
    assert_eq!(
        run_err(vec![Stmt::goto(Expr::int(5))]).message,
        "GOTO target 101 not found"
    );
    assert_eq!(
        run_err(vec![Stmt::label(Expr::int(1)), Stmt::label(Expr::int(1))]).message,
        "Duplicate GOTOPOINT label 1"
    );
    assert_eq!(
        run_err(vec![Stmt::goto(Expr::flt(1.0))]).message,
        "GOTO expects INT or STR, got FLT"
    );
}

#[test]
fn top_level_return_ends_program() {
    let out = output(vec![
        print(Expr::str("a")),
        Stmt::ret(Expr::int(0)),
        print(Expr::str("b")),
    ]);
    assert_eq!(out, "a\n");
}

// Functions

#[test]
fn user_function_call() {
    let v = run(vec![
        func(
            "add",
            vec![int_param("a"), int_param("b")],
            DeclType::Int,
            vec![Stmt::ret(call("ADD", vec![Expr::ident("a"), Expr::ident("b")]))],
        ),
        Stmt::ret(call("add", vec![Expr::int(2), Expr::int(3)])),
    ]);
    assert_eq!(v.unwrap(), Value::Int(5));
}

#[test]
fn recursion() {
    let fact = func(
        "fact",
        vec![int_param("n")],
        DeclType::Int,
        vec![
            Stmt::if_(
                call("LTE", vec![Expr::ident("n"), Expr::int(1)]),
                vec![Stmt::ret(Expr::int(1))],
                None,
            ),
            Stmt::ret(call(
                "MUL",
                vec![
                    Expr::ident("n"),
                    call("fact", vec![call("SUB", vec![Expr::ident("n"), Expr::int(1)])]),
                ],
            )),
        ],
    );
    let v = run(vec![fact, Stmt::ret(call("fact", vec![Expr::int(5)]))]);
    assert_eq!(v.unwrap(), Value::Int(120));
}

#[test]
fn recursion_limit_with_backtrace() {
    let mut it = Interpreter::builder()
        .print_handler(buffer_handler())
        .max_depth(Some(4))
        .build();
    let forever = func(
        "down",
        vec![],
        DeclType::Int,
        vec![Stmt::ret(call("down", vec![]).at(1, 2)).at(1, 1)],
    );
    let err = it
        .run(&Program::new(vec![forever, Stmt::ret(call("down", vec![]))]))
        .unwrap_err();
    assert_eq!(err.message, "Maximum recursion depth 4 exceeded");
    let trace = err.backtrace.unwrap();
    assert_eq!(trace.len(), 4);
    assert!(trace.frames().iter().all(|f| f.name == "down"));
    assert_eq!(it.call_depth(), 0);
}

#[test]
fn closures_capture_defining_scope() {
    let make = func(
        "make",
        vec![],
        DeclType::Func,
        vec![
            Stmt::typed(DeclType::Int, "k", Expr::int(10)),
            func("inner", vec![], DeclType::Int, vec![Stmt::ret(Expr::ident("k"))]),
            Stmt::ret(Expr::ident("inner")),
        ],
    );
    let v = run(vec![
        make,
        Stmt::typed(DeclType::Func, "f", call("make", vec![])),
        Stmt::ret(call("f", vec![])),
    ]);
    assert_eq!(v.unwrap(), Value::Int(10));
}

#[test]
fn callee_does_not_see_caller_locals() {
    let peek = func("peek", vec![], DeclType::Int, vec![Stmt::ret(Expr::ident("local"))]);
    let outer = func(
        "outer",
        vec![],
        DeclType::Int,
        vec![
            Stmt::typed(DeclType::Int, "local", Expr::int(1)),
            Stmt::ret(call("peek", vec![])),
        ],
    );
    let err = run_err(vec![peek, outer, Stmt::ret(call("outer", vec![]))]);
    assert_eq!(err.message, "Undefined identifier 'local'");
}

#[test]
fn keyword_arguments_bind_defaults() {
    let greet = || {
        func(
            "greet",
            vec![
                Param::new(DeclType::Str, "name"),
                Param::with_default(DeclType::Str, "greeting", Expr::str("hi")),
            ],
            DeclType::Str,
            vec![Stmt::ret(Expr::ident("greeting"))],
        )
    };
    let plain = run(vec![greet(), Stmt::ret(call("greet", vec![Expr::str("bob")]))]);
    assert_eq!(plain.unwrap(), Value::string("hi"));

    let kw = Expr::call_kw(
        "greet",
        vec![Expr::str("bob")],
        vec![KwArg::new("greeting", Expr::str("yo"))],
    );
    assert_eq!(run(vec![greet(), Stmt::ret(kw)]).unwrap(), Value::string("yo"));

    let by_keyword = Expr::call_kw(
        "greet",
        vec![Expr::str("a")],
        vec![KwArg::new("name", Expr::str("b"))],
    );
    assert_eq!(
        run_err(vec![greet(), Stmt::ret(by_keyword)]).message,
        "Parameter 'name' of greet cannot be passed by keyword"
    );

    let unknown = Expr::call_kw(
        "greet",
        vec![Expr::str("a")],
        vec![KwArg::new("tone", Expr::str("b"))],
    );
    assert_eq!(
        run_err(vec![greet(), Stmt::ret(unknown)]).message,
        "greet has no parameter 'tone'"
    );

    let too_many = call("greet", vec![Expr::str("a"), Expr::str("b")]);
    assert_eq!(
        run_err(vec![greet(), Stmt::ret(too_many)]).message,
        "greet expects 1 arguments, got 2"
    );
}

#[test]
fn parameter_and_return_types_are_checked() {
    let id = || func("id", vec![int_param("n")], DeclType::Int, vec![Stmt::ret(Expr::ident("n"))]);
    assert_eq!(
        run_err(vec![id(), Stmt::ret(call("id", vec![Expr::str("x")]))]).message,
        "Type mismatch for parameter 'n' of id: expected INT but got STR"
    );
    let bad = func("bad", vec![], DeclType::Int, vec![Stmt::ret(Expr::str("s"))]);
    assert_eq!(
        run_err(vec![bad, Stmt::ret(call("bad", vec![]))]).message,
        "Return type mismatch in function 'bad': expected INT but got STR"
    );
}

#[test]
fn falling_off_the_end_returns_defaults() {
    let cases = [
        (DeclType::Int, Value::Int(0)),
        (DeclType::Flt, Value::Float(0.0)),
        (DeclType::Str, Value::string("")),
    ];
    for (ty, expected) in cases {
        let v = run(vec![func("f", vec![], ty, vec![]), Stmt::ret(call("f", vec![]))]);
        assert_eq!(v.unwrap(), expected, "{ty}");
    }
    let err = run_err(vec![
        func("g", vec![], DeclType::Func, vec![]),
        Stmt::ret(call("g", vec![])),
    ]);
    assert_eq!(err.message, "FUNC-returning function 'g' must return a value");
}

#[test]
fn function_names_cannot_shadow_builtins_or_values() {
    assert_eq!(
        run_err(vec![func("ADD", vec![], DeclType::Int, vec![])]).message,
        "Cannot define function 'ADD': name is a builtin"
    );
    assert_eq!(
        run_err(vec![
            Stmt::typed(DeclType::Int, "f", Expr::int(1)),
            func("f", vec![], DeclType::Int, vec![]),
        ])
        .message,
        "Cannot define function 'f': identifier is bound to a INT value"
    );
}

#[test]
fn calling_non_functions() {
    assert_eq!(
        run_err(vec![Stmt::ret(call("nope", vec![]))]).message,
        "Unknown function 'nope'"
    );
    assert_eq!(
        run_err(vec![
            Stmt::typed(DeclType::Int, "x", Expr::int(1)),
            Stmt::ret(call("x", vec![])),
        ])
        .message,
        "'x' is a INT value, not a function"
    );
}

#[test]
fn pop_returns_and_deletes() {
    let take = func(
        "take",
        vec![],
        DeclType::Int,
        vec![Stmt::typed(DeclType::Int, "v", Expr::int(3)), Stmt::pop("v")],
    );
    let v = run(vec![take, Stmt::ret(call("take", vec![]))]);
    assert_eq!(v.unwrap(), Value::Int(3));
    assert_eq!(run_err(vec![Stmt::pop("v")]).message, "POP outside of function");
}

#[test]
fn typed_assignment_in_function_updates_global() {
    let bump = func(
        "bump",
        vec![],
        DeclType::Int,
        vec![Stmt::typed(DeclType::Int, "g", Expr::int(9))],
    );
    let v = run(vec![
        Stmt::typed(DeclType::Int, "g", Expr::int(1)),
        bump,
        Stmt::expr(call("bump", vec![])),
        Stmt::ret(Expr::ident("g")),
    ]);
    assert_eq!(v.unwrap(), Value::Int(9));
}

// Errors

#[test]
fn try_catch_binds_message() {
    let v = run(vec![
        Stmt::try_(
            vec![Stmt::expr(call("THROW", vec![Expr::str("bad")]))],
            Some("e"),
            vec![Stmt::ret(Expr::ident("e"))],
        ),
    ]);
    assert_eq!(v.unwrap(), Value::string("bad"));
}

#[test]
fn try_without_error_skips_catch() {
    let out = output(vec![Stmt::try_(
        vec![print(Expr::str("body"))],
        None,
        vec![print(Expr::str("catch"))],
    )]);
    assert_eq!(out, "body\n");
}

#[test]
fn try_catches_errors_from_nested_calls() {
    let boom = func(
        "boom",
        vec![],
        DeclType::Int,
        vec![Stmt::ret(call("DIV", vec![Expr::int(1), Expr::int(0)]))],
    );
    let v = run(vec![
        boom,
        Stmt::try_(
            vec![Stmt::expr(call("boom", vec![]))],
            Some("e"),
            vec![Stmt::ret(Expr::ident("e"))],
        ),
    ]);
    assert_eq!(v.unwrap(), Value::string("Division by zero"));
}

#[test]
fn catch_binds_in_current_scope() {
    let catcher = || {
        func(
            "f",
            vec![],
            DeclType::Str,
            vec![Stmt::try_(
                vec![Stmt::expr(call("THROW", vec![Expr::str("boom")]))],
                Some("e"),
                vec![Stmt::ret(Expr::ident("e"))],
            )],
        )
    };
    for ns in [Namespace::direct(), Namespace::buffered().unwrap()] {
        let run_in = |body: Vec<Stmt>| {
            Interpreter::builder()
                .namespace(ns.clone())
                .print_handler(buffer_handler())
                .build()
                .run(&Program::new(body))
        };
        let caught = run_in(vec![
            Stmt::typed(DeclType::Int, "e", Expr::int(1)),
            catcher(),
            Stmt::ret(call("f", vec![])),
        ]);
        assert_eq!(caught.unwrap(), Value::string("boom"));

        // the global `e` is untouched
        let global = run_in(vec![
            Stmt::typed(DeclType::Int, "e", Expr::int(1)),
            catcher(),
            Stmt::typed(DeclType::Str, "r", call("f", vec![])),
            Stmt::ret(Expr::ident("e")),
        ]);
        assert_eq!(global.unwrap(), Value::Int(1));
        ns.shutdown();
    }
}

#[test]
fn catch_reuses_existing_local_string() {
    let v = run(vec![
        Stmt::typed(DeclType::Str, "e", Expr::str("old")),
        Stmt::try_(
            vec![Stmt::expr(call("THROW", vec![Expr::str("new")]))],
            Some("e"),
            vec![],
        ),
        Stmt::ret(Expr::ident("e")),
    ]);
    assert_eq!(v.unwrap(), Value::string("new"));
}

#[test]
fn error_in_catch_body_escapes_its_try() {
    let rethrowing = || {
        Stmt::try_(
            vec![Stmt::expr(call("THROW", vec![Expr::str("first")]))],
            Some("e"),
            vec![
                print(Expr::ident("e")),
                Stmt::expr(call("THROW", vec![Expr::str("second")])),
            ],
        )
    };

    let mut it = interp();
    let err = it.run(&Program::new(vec![rethrowing()])).unwrap_err();
    assert_eq!(err.message, "second");
    assert_eq!(it.get_print_output(), "first\n");

    let v = run(vec![Stmt::try_(
        vec![rethrowing()],
        Some("outer"),
        vec![Stmt::ret(Expr::ident("outer"))],
    )]);
    assert_eq!(v.unwrap(), Value::string("second"));
}

#[test]
fn sticky_error_is_drained() {
    let mut it = interp();
    it.raise(EvalError::new("first"));
    it.raise(EvalError::new("second"));
    assert!(it.has_error());
    let err = it
        .run(&Program::new(vec![Stmt::expr(call("NOT", vec![Expr::int(0)]))]))
        .unwrap_err();
    assert_eq!(err.message, "first");
    assert!(!it.has_error());
}

// Containers

#[test]
fn tensor_literals_and_indexing() {
    let matrix = Expr::tns(vec![
        Expr::tns(vec![Expr::int(1), Expr::int(2)]),
        Expr::tns(vec![Expr::int(3), Expr::int(4)]),
    ]);
    let setup = || Stmt::typed(DeclType::Tns, "m", matrix.clone());
    let index = |idx: Vec<Expr>| Expr::index(Expr::ident("m"), idx);

    let v = run(vec![setup(), Stmt::ret(index(vec![Expr::int(2), Expr::int(1)]))]);
    assert_eq!(v.unwrap(), Value::Int(3));

    let v = run(vec![setup(), Stmt::ret(index(vec![Expr::wildcard(), Expr::int(-1)]))]);
    assert_eq!(v.unwrap().to_string(), "[10, 100]");

    let ragged = Expr::tns(vec![Expr::tns(vec![Expr::int(1)]), Expr::int(2)]);
    assert_eq!(
        run_err(vec![Stmt::ret(ragged)]).message,
        "Ragged tensor literal: sub-tensor shapes differ"
    );
}

#[test]
fn index_assignment_is_shared() {
    let v = run(vec![
        Stmt::typed(DeclType::Tns, "a", Expr::tns(vec![Expr::int(1), Expr::int(2)])),
        Stmt::typed(DeclType::Tns, "b", Expr::ident("a")),
        Stmt::index_assign(Expr::index(Expr::ident("b"), vec![Expr::int(1)]), Expr::int(5)),
        Stmt::ret(Expr::index(Expr::ident("a"), vec![Expr::int(1)])),
    ]);
    assert_eq!(v.unwrap(), Value::Int(5));
}

#[test]
fn index_assignment_respects_freeze() {
    let err = run_err(vec![
        Stmt::typed(DeclType::Tns, "a", Expr::tns(vec![Expr::int(1)])),
        Stmt::expr(call("FREEZE", vec![Expr::ident("a")])),
        Stmt::index_assign(Expr::index(Expr::ident("a"), vec![Expr::int(1)]), Expr::int(5)),
    ]);
    assert_eq!(err.message, "Cannot assign to frozen identifier 'a'");
}

#[test]
fn nested_map_paths() {
    let v = run(vec![
        Stmt::typed(
            DeclType::Map,
            "m",
            Expr::map(vec![(
                Expr::str("inner"),
                Expr::map(vec![(Expr::int(1), Expr::str("x"))]),
            )]),
        ),
        Stmt::index_assign(
            Expr::index(Expr::ident("m"), vec![Expr::str("inner"), Expr::int(2)]),
            Expr::str("y"),
        ),
        Stmt::ret(Expr::index(Expr::ident("m"), vec![Expr::str("inner"), Expr::int(2)])),
    ]);
    assert_eq!(v.unwrap(), Value::string("y"));

    let missing = run_err(vec![
        Stmt::typed(DeclType::Map, "m", Expr::map(vec![])),
        Stmt::ret(Expr::index(Expr::ident("m"), vec![Expr::str("k")])),
    ]);
    assert_eq!(missing.message, "Key k not found");
}

#[test]
fn slices_only_inside_indices() {
    assert_eq!(
        run_err(vec![Stmt::ret(Expr::wildcard())]).message,
        "Slice or '*' is only valid inside an index"
    );
}

// Configuration

#[test]
fn buffered_namespace_runs_the_same_program() {
    let program = Program::new(vec![
        Stmt::typed(DeclType::Int, "n", Expr::int(0)),
        Stmt::for_(
            "i",
            Expr::int(10),
            vec![Stmt::assign("n", call("ADD", vec![Expr::ident("n"), Expr::ident("i")]))],
        ),
        Stmt::ret(Expr::ident("n")),
    ]);
    let ns = Namespace::buffered().unwrap();
    let mut it = Interpreter::builder()
        .namespace(ns.clone())
        .print_handler(buffer_handler())
        .build();
    assert_eq!(it.run(&program).unwrap(), Value::Int(55));
    assert!(ns.applied_ops() > 0);
    ns.shutdown();
}

#[test]
fn executed_statements_are_counted() {
    let mut it = interp();
    it.run(&Program::new(vec![
        Stmt::expr(Expr::int(1)),
        Stmt::block(vec![Stmt::expr(Expr::int(2)), Stmt::expr(Expr::int(3))]),
    ]))
    .unwrap();
    assert_eq!(it.executed_statements(), 4);
}
