//! Static checks run by `prefix check` before anything executes.
//!
//! Only problems that are certain from the tree alone are reported:
//! literal labels defined twice in one block, functions named after a
//! builtin, and `BREAK`/`CONTINUE` that can never be inside a loop.

use prefix_eval::{BuiltinRegistry, LabelKey, Value};
use prefix_ir::{Expr, ExprKind, Location, Program, Stmt, StmtKind};
use rustc_hash::FxHashSet;

/// Every problem found in `program`, in tree order.
pub fn check_program(program: &Program) -> Vec<String> {
    let mut checker = Checker {
        builtins: BuiltinRegistry::core(),
        problems: Vec::new(),
    };
    checker.block(&program.body, 0);
    checker.problems
}

struct Checker {
    builtins: BuiltinRegistry,
    problems: Vec<String>,
}

impl Checker {
    fn report(&mut self, message: String, loc: Location) {
        if loc.is_dummy() {
            self.problems.push(message);
        } else {
            self.problems.push(format!("{message} at {loc}"));
        }
    }

    fn block(&mut self, stmts: &[Stmt], loops: usize) {
        let mut labels = FxHashSet::default();
        for stmt in stmts {
            if let StmtKind::Label(key) = &stmt.kind {
                if let Some(key) = literal_label(key) {
                    if !labels.insert(key.clone()) {
                        let shown = match key {
                            LabelKey::Int(n) => Value::Int(n).to_string(),
                            LabelKey::Str(s) => s,
                        };
                        self.report(format!("Duplicate GOTOPOINT label {shown}"), stmt.loc);
                    }
                }
            }
            self.stmt(stmt, loops);
        }
    }

    fn stmt(&mut self, stmt: &Stmt, loops: usize) {
        match &stmt.kind {
            StmtKind::Block(body) => self.block(body, loops),
            StmtKind::If {
                then_branch,
                elifs,
                else_branch,
                ..
            } => {
                self.block(then_branch, loops);
                for arm in elifs {
                    self.block(&arm.body, loops);
                }
                if let Some(body) = else_branch {
                    self.block(body, loops);
                }
            }
            StmtKind::While { body, .. } | StmtKind::For { body, .. } => {
                self.block(body, loops + 1);
            }
            StmtKind::Try {
                body, catch_body, ..
            } => {
                self.block(body, loops);
                self.block(catch_body, loops);
            }
            StmtKind::Func(def) => {
                if self.builtins.contains(&def.name) {
                    self.report(
                        format!("Function '{}' shadows a builtin", def.name),
                        def.loc,
                    );
                }
                self.block(&def.body, 0);
            }
            StmtKind::Break(count) => {
                if let ExprKind::Int(n) = count.kind {
                    if n < 1 || usize::try_from(n).is_ok_and(|n| n > loops) {
                        self.report(format!("BREAK({n}) exceeds loop depth {loops}"), stmt.loc);
                    }
                }
            }
            StmtKind::Continue if loops == 0 => {
                self.report("CONTINUE outside of loop".to_owned(), stmt.loc);
            }
            _ => {}
        }
    }
}

/// Key of a label written as a literal.
fn literal_label(key: &Expr) -> Option<LabelKey> {
    match &key.kind {
        ExprKind::Int(n) => Some(LabelKey::Int(*n)),
        ExprKind::Str(s) => Some(LabelKey::Str(s.clone())),
        _ => None,
    }
}
