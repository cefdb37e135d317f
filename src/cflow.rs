//! Completion analysis: whether a statement may complete normally, tracking
//! which labels it may break or continue to. Used to decide trailing returns
//! and switch fall-through. Approximations err toward "may complete", the
//! safe direction for both uses.

use std::collections::HashSet;

use crate::ast::*;

pub fn may_complete_normally(stmt: &Statement) -> bool {
    completion(stmt).normal
}

pub fn may_complete_normally_seq(stmts: &[Statement]) -> bool {
    completion_seq(stmts).normal
}

struct Completion {
    normal: bool,
    breaks: HashSet<String>,
    breaks_unlabeled: bool,
    continues: HashSet<String>,
    continues_unlabeled: bool,
}

impl Completion {
    fn normal() -> Completion {
        Completion {
            normal: true,
            breaks: HashSet::new(),
            breaks_unlabeled: false,
            continues: HashSet::new(),
            continues_unlabeled: false,
        }
    }

    fn abrupt() -> Completion {
        Completion { normal: false, ..Completion::normal() }
    }

    fn absorb(&mut self, other: Completion) {
        self.breaks.extend(other.breaks);
        self.breaks_unlabeled |= other.breaks_unlabeled;
        self.continues.extend(other.continues);
        self.continues_unlabeled |= other.continues_unlabeled;
    }
}

fn completion_seq(stmts: &[Statement]) -> Completion {
    let mut out = Completion::normal();
    for stmt in stmts {
        let c = completion(stmt);
        let normal = c.normal;
        out.absorb(c);
        if !normal {
            // Following statements are unreachable
            out.normal = false;
            break;
        }
    }
    out
}

fn completion(stmt: &Statement) -> Completion {
    match stmt {
        Statement::VarDecl(_)
        | Statement::FuncDecl(_)
        | Statement::Expr(_)
        | Statement::Empty
        | Statement::Debugger => Completion::normal(),

        Statement::Return(_) | Statement::Throw(_) => Completion::abrupt(),

        Statement::Break(stmt) => {
            let mut c = Completion::abrupt();
            match &stmt.label {
                Some(label) => {
                    c.breaks.insert(label.clone());
                }
                None => c.breaks_unlabeled = true,
            }
            c
        }
        Statement::Continue(stmt) => {
            let mut c = Completion::abrupt();
            match &stmt.label {
                Some(label) => {
                    c.continues.insert(label.clone());
                }
                None => c.continues_unlabeled = true,
            }
            c
        }

        Statement::Block(block) => completion_seq(&block.body),

        Statement::If(stmt) => {
            let mut c = completion(&stmt.conseq);
            let a = match &stmt.altern {
                Some(altern) => completion(altern),
                None => Completion::normal(),
            };
            c.normal = c.normal || a.normal;
            c.absorb(a);
            c
        }

        Statement::Labeled(stmt) => {
            let mut c = completion(&stmt.body);
            c.normal = c.normal || c.breaks.contains(&stmt.label);
            c.breaks.remove(&stmt.label);
            c.continues.remove(&stmt.label);
            c
        }

        Statement::While(stmt) => loop_completion(Some(stmt.test.as_ref()), &stmt.body, false),
        Statement::DoWhile(stmt) => loop_completion(Some(stmt.test.as_ref()), &stmt.body, true),
        Statement::For(stmt) => loop_completion(stmt.test.as_deref(), &stmt.body, false),

        Statement::ForIn(stmt) => {
            // May iterate zero times
            let mut c = completion(&stmt.body);
            c.normal = true;
            c.breaks_unlabeled = false;
            c.continues_unlabeled = false;
            c
        }

        Statement::With(stmt) => completion(&stmt.body),

        Statement::Switch(stmt) => {
            let has_default = stmt.cases.iter().any(|case| case.test.is_none());
            let mut out = Completion::normal();
            let mut any_normal = false;
            for case in &stmt.cases {
                let c = completion_seq(&case.body);
                any_normal |= c.normal;
                out.absorb(c);
            }
            out.normal = !has_default || any_normal || out.breaks_unlabeled;
            out.breaks_unlabeled = false;
            out
        }

        Statement::Try(stmt) => {
            let mut block = completion_seq(&stmt.block.body);
            let mut normal = block.normal;
            if let Some(handler) = &stmt.handler {
                // The block may throw partway through, so the handler may run
                let h = completion_seq(&handler.body.body);
                normal = normal || h.normal;
                block.absorb(h);
            }
            if let Some(finalizer) = &stmt.finalizer {
                let f = completion_seq(&finalizer.body);
                normal = normal && f.normal;
                block.absorb(f);
            }
            block.normal = normal;
            block
        }
    }
}

fn loop_completion(test: Option<&Expression>, body: &Statement, body_runs_first: bool) -> Completion {
    let b = completion(body);
    let truthy = test.map_or(true, is_truthy_literal);

    let normal = if body_runs_first {
        // do-while: the body runs, then the test gates another round
        b.breaks_unlabeled || ((b.normal || b.continues_unlabeled) && !truthy)
    } else {
        // while / for: a non-constant test may fail before the first round
        b.breaks_unlabeled || !truthy
    };

    Completion {
        normal,
        breaks: b.breaks,
        breaks_unlabeled: false,
        continues: b.continues,
        continues_unlabeled: false,
    }
}

fn is_truthy_literal(expr: &Expression) -> bool {
    match expr {
        Expression::Boolean(value) => *value,
        Expression::Number(value) => *value != 0.0 && !value.is_nan(),
        Expression::String(value) => !value.is_empty(),
        _ => false,
    }
}
