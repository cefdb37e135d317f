//! Rewrites an AST into its normal form: every expression at most one
//! operation deep, side-effecting subexpressions named by fresh temporaries,
//! all loops lowered to `while` (plus reshaped `for-in`), `switch` lowered to
//! chained `if`s, `with` compiled into `in`-test cascades, and function
//! bodies finalized with a hoisted `var` declaration and explicit returns.

use std::collections::HashMap;

use indexmap::IndexSet;

use crate::ast::*;
use crate::builder as b;
use crate::cflow;
use crate::error::{NormalizeError, NormalizeResult};
use crate::hoist::{self, HoistedDecl};
use crate::options::Options;
use crate::scope::ScopeChain;

/// The reserved identifier bound to the host global object by the program
/// wrapper. All global reads, writes, and deletes go through it.
pub const GLOBAL: &str = "__global";

/// Whether a name is one of the normalizer's generated temporaries.
pub fn is_tmp(name: &str) -> bool {
    match name.strip_prefix("tmp") {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Normalize a whole program. The result is a single statement applying
/// `function (__global) { ... }` to `this`.
pub fn normalize_program(program: &Program, options: Options) -> NormalizeResult<Program> {
    let mut normalizer = Normalizer::new(options);
    let mut max = None;
    for stmt in &program.body {
        scan_stmt_tmps(stmt, &mut max);
    }
    normalizer.counter = max.map_or(0, |max| max + 1);
    normalizer.program(program)
}

/// Normalize a standalone function. Free variables are treated as globals.
pub fn normalize_function(func: &Function, options: Options) -> NormalizeResult<Function> {
    let mut normalizer = Normalizer::new(options);
    let mut max = None;
    scan_function_tmps(func, &mut max);
    normalizer.counter = max.map_or(0, |max| max + 1);
    normalizer.scope.push_global(vec![]);
    let result = normalizer.function_entity(func, false);
    normalizer.scope.pop();
    result
}

/// Where an expression's value should land. `Name` is a caller-chosen
/// variable; `Lazy` allocates a temporary on first demand and remembers it.
/// Value-discarding contexts pass no target at all.
enum Target {
    Name(String),
    Lazy(Option<String>),
}

impl Target {
    fn name(name: impl Into<String>) -> Target {
        Target::Name(name.into())
    }

    fn lazy() -> Target {
        Target::Lazy(None)
    }

    fn get(&mut self, normalizer: &mut Normalizer) -> String {
        match self {
            Target::Name(name) => name.clone(),
            Target::Lazy(Some(name)) => name.clone(),
            Target::Lazy(slot) => {
                let name = normalizer.gen_tmp();
                *slot = Some(name.clone());
                name
            }
        }
    }

    /// Route later demands to an existing variable instead of a fresh temp.
    fn bind(&mut self, name: &str) {
        if let Target::Lazy(slot) = self {
            if slot.is_none() {
                *slot = Some(name.to_string());
            }
        }
    }
}

struct Normalizer {
    options: Options,
    /// Shared across entities within one call so temp names never collide.
    counter: usize,
    /// Temporaries of the entity currently being normalized.
    tmps: Vec<String>,
    ret_label: Option<String>,
    ret_var: Option<String>,
    scope: ScopeChain,
    /// Source label -> continue header of the loop it names.
    label_conts: HashMap<String, String>,
    /// Source labels attached to the loop statement being entered.
    pending_loop_labels: Vec<String>,
}

impl Normalizer {
    fn new(options: Options) -> Normalizer {
        Normalizer {
            options: options.canonicalize(),
            counter: 0,
            tmps: vec![],
            ret_label: None,
            ret_var: None,
            scope: ScopeChain::new(),
            label_conts: HashMap::new(),
            pending_loop_labels: vec![],
        }
    }

    fn gen_name(&mut self) -> String {
        let name = format!("tmp{}", self.counter);
        self.counter += 1;
        name
    }

    fn gen_tmp(&mut self) -> String {
        let name = self.gen_name();
        self.tmps.push(name.clone());
        name
    }

    /// Labels share the temp name space but are not declared.
    fn gen_label(&mut self) -> String {
        self.gen_name()
    }
}

/// Entity normalization: programs and functions.
impl Normalizer {
    fn program(&mut self, program: &Program) -> NormalizeResult<Program> {
        self.scope.push_global(hoist::collect_program(program));

        let result: NormalizeResult<(Vec<Statement>, Vec<Statement>)> = (|| {
            let mut body = vec![];
            for stmt in &program.body {
                body.extend(self.statement(stmt, None, None)?);
            }
            let prelude = self.function_prelude()?;
            Ok((body, prelude))
        })();
        self.scope.pop();
        let (body, prelude) = result?;

        let mut wrapped = vec![];
        if !self.tmps.is_empty() {
            wrapped.push(b::var_names(&self.tmps));
        }
        wrapped.extend(prelude);
        wrapped.extend(body);
        let wrapped = self.mk_block(wrapped).body;

        let wrapper = Function::new(None, vec![b::id(GLOBAL)], wrapped);
        Ok(Program {
            body: vec![b::expr_stmt(b::call(Expression::Function(wrapper), vec![b::this()]))],
        })
    }

    /// Normalize a nested function as its own entity, saving and restoring
    /// the per-entity state around it.
    fn function_entity(&mut self, func: &Function, strip_name: bool) -> NormalizeResult<Function> {
        let saved_tmps = std::mem::take(&mut self.tmps);
        let saved_ret_label = self.ret_label.take();
        let saved_ret_var = self.ret_var.take();
        let saved_label_conts = std::mem::take(&mut self.label_conts);
        let saved_pending = std::mem::take(&mut self.pending_loop_labels);

        self.scope.push_function(func, hoist::collect_function(func));
        let result = self.function_body(func);
        self.scope.pop();

        self.tmps = saved_tmps;
        self.ret_label = saved_ret_label;
        self.ret_var = saved_ret_var;
        self.label_conts = saved_label_conts;
        self.pending_loop_labels = saved_pending;

        let body = result?;
        let id = if strip_name {
            None
        } else {
            func.id.as_deref().map(|id| P::new(b::id(id.name.as_str())))
        };
        let params = func.params.iter().map(|param| b::id(param.name.as_str())).collect();
        Ok(Function::new(id, params, body))
    }

    fn function_body(&mut self, func: &Function) -> NormalizeResult<Vec<Statement>> {
        if self.options.unify_ret() {
            self.ret_label = Some(self.gen_label());
            self.ret_var = Some(self.gen_tmp());
        }

        let mut body = vec![];
        for stmt in &func.body {
            body.extend(self.statement(stmt, None, None)?);
        }

        if self.options.unify_ret() {
            let ret_label = self.ret_label.clone().unwrap();
            let ret_var = self.ret_var.clone().unwrap();
            body = vec![
                b::labeled(ret_label, self.mk_block_stmt(body)),
                b::return_stmt(Some(b::id_expr(&ret_var))),
            ];
        } else if cflow::may_complete_normally_seq(&body) {
            body.push(b::return_stmt(Some(b::null())));
        }

        if func.exposed.get() {
            return Err(NormalizeError::ExposedFunction);
        }

        let prelude = self.function_prelude()?;

        let mut names: IndexSet<String> = IndexSet::new();
        for decl in self.scope.entity_decls() {
            names.insert(decl.name().to_string());
        }
        for tmp in &self.tmps {
            names.insert(tmp.clone());
        }

        let mut out = vec![];
        if !names.is_empty() {
            let names: Vec<String> = names.into_iter().collect();
            out.push(b::var_names(&names));
        }
        out.extend(prelude);
        out.extend(body);
        Ok(self.mk_block(out).body)
    }

    /// Hoisted function declarations become assignments at the top of the
    /// entity, each normalized as its own entity.
    fn function_prelude(&mut self) -> NormalizeResult<Vec<Statement>> {
        let decls: Vec<HoistedDecl> = self.scope.entity_decls().to_vec();
        let mut out = vec![];
        for decl in decls {
            if let HoistedDecl::Func(func) = decl {
                out.extend(self.hoisted_function_assignment(func.as_ref())?);
            }
        }
        Ok(out)
    }

    fn hoisted_function_assignment(&mut self, func: &Function) -> NormalizeResult<Vec<Statement>> {
        // Hoisted function declarations always carry a name
        let name = func.id.as_deref().unwrap().name.clone();
        let strip = !self.options.backwards_compatible();
        let inner = self.function_entity(func, strip)?;

        // Write the function to its name the way an assignment would; at the
        // top of an entity there are no live with objects to route through.
        let mut out = vec![];
        if !is_tmp(&name) && self.scope.is_global(&name) {
            let name_tmp = self.gen_tmp();
            out.push(b::assign_stmt(&name_tmp, Expression::String(name)));
            let value_tmp = self.gen_tmp();
            out.push(b::assign_stmt(&value_tmp, Expression::Function(inner)));
            out.push(b::store_stmt(
                b::index_member(GLOBAL, &name_tmp, false),
                b::id_expr(&value_tmp),
            ));
        } else {
            out.push(b::assign_stmt(&name, Expression::Function(inner)));
        }
        Ok(out)
    }
}

/// Statement normalization.
impl Normalizer {
    fn statement(
        &mut self,
        stmt: &Statement,
        brk: Option<&str>,
        cont: Option<&str>,
    ) -> NormalizeResult<Vec<Statement>> {
        match stmt {
            Statement::Empty => Ok(vec![]),
            Statement::Debugger => Ok(vec![Statement::Debugger]),
            // Hoisted into the entity prelude
            Statement::FuncDecl(_) => Ok(vec![]),
            Statement::Expr(stmt) => self.expression(&stmt.expr, None),
            Statement::VarDecl(decl) => self.var_decl_inits(decl),
            Statement::Block(block) => {
                let mut out = vec![];
                for stmt in &block.body {
                    out.extend(self.statement(stmt, brk, cont)?);
                }
                Ok(out)
            }
            Statement::Return(stmt) => self.return_stmt(stmt),
            Statement::Throw(stmt) => {
                let (mut out, name) = self.expression_to_name(&stmt.argument)?;
                out.push(b::throw_stmt(b::id_expr(&name)));
                Ok(out)
            }
            Statement::If(stmt) => {
                let (mut out, test) = self.expression_to_name(&stmt.test)?;
                let conseq = self.statement(&stmt.conseq, brk, cont)?;
                let altern = match &stmt.altern {
                    Some(altern) => self.statement(altern, brk, cont)?,
                    None => vec![],
                };
                out.extend(self.mk_if(&test, conseq, altern));
                Ok(out)
            }
            Statement::Labeled(stmt) => self.labeled_stmt(stmt, cont),
            Statement::Break(stmt) => match &stmt.label {
                Some(label) => Ok(vec![b::break_stmt(Some(label.clone()))]),
                None => match brk {
                    Some(label) => Ok(vec![b::break_stmt(Some(label.to_string()))]),
                    None => Err(NormalizeError::UnlabeledBreak),
                },
            },
            Statement::Continue(stmt) => match &stmt.label {
                Some(label) => match self.label_conts.get(label) {
                    Some(cont_label) => Ok(vec![b::break_stmt(Some(cont_label.clone()))]),
                    None => Err(NormalizeError::UnknownLabel(label.clone())),
                },
                None => match cont {
                    Some(label) => Ok(vec![b::break_stmt(Some(label.to_string()))]),
                    None => Err(NormalizeError::UnlabeledContinue),
                },
            },
            Statement::While(stmt) => self.while_stmt(&stmt.test, &stmt.body, false),
            Statement::DoWhile(stmt) => self.while_stmt(&stmt.test, &stmt.body, true),
            Statement::For(stmt) => self.for_stmt(stmt),
            Statement::ForIn(stmt) => self.for_in_stmt(stmt),
            Statement::Switch(stmt) => self.switch_stmt(stmt, cont),
            Statement::With(stmt) => {
                let with_tmp = self.gen_tmp();
                let mut out =
                    self.expression(&stmt.object, Some(&mut Target::name(with_tmp.as_str())))?;
                self.scope.push_with(with_tmp);
                let body = self.statement(&stmt.body, brk, cont);
                self.scope.pop();
                out.extend(body?);
                Ok(out)
            }
            Statement::Try(stmt) => self.try_stmt(stmt, brk, cont),
        }
    }

    fn var_decl_inits(&mut self, decl: &VariableDeclaration) -> NormalizeResult<Vec<Statement>> {
        let mut out = vec![];
        for declarator in &decl.declarations {
            if let Some(init) = &declarator.init {
                out.extend(self.assign_ident(&declarator.id.name, init, None)?);
            }
        }
        Ok(out)
    }

    fn return_stmt(&mut self, stmt: &ReturnStatement) -> NormalizeResult<Vec<Statement>> {
        if !self.scope.in_function() {
            return Err(NormalizeError::ReturnOutsideFunction);
        }

        if self.options.unify_ret() {
            let ret_label = self.ret_label.clone().unwrap();
            let mut out = vec![];
            if let Some(arg) = &stmt.argument {
                let ret_var = self.ret_var.clone().unwrap();
                out.extend(self.expression(arg, Some(&mut Target::name(ret_var)))?);
            }
            out.push(b::break_stmt(Some(ret_label)));
            Ok(out)
        } else {
            match &stmt.argument {
                Some(arg) => {
                    let (mut out, name) = self.expression_to_name(arg)?;
                    out.push(b::return_stmt(Some(b::id_expr(&name))));
                    Ok(out)
                }
                None => Ok(vec![b::return_stmt(None)]),
            }
        }
    }

    fn labeled_stmt(
        &mut self,
        stmt: &LabeledStatement,
        cont: Option<&str>,
    ) -> NormalizeResult<Vec<Statement>> {
        let mut innermost: &Statement = &stmt.body;
        while let Statement::Labeled(inner) = innermost {
            innermost = &inner.body;
        }
        let is_loop = matches!(
            innermost,
            Statement::While(_) | Statement::DoWhile(_) | Statement::For(_) | Statement::ForIn(_)
        );

        if is_loop {
            self.pending_loop_labels.push(stmt.label.clone());
        }
        let cont_arg = if is_loop { Some(stmt.label.as_str()) } else { cont };
        let body = self.statement(&stmt.body, Some(stmt.label.as_str()), cont_arg)?;
        Ok(vec![b::labeled(stmt.label.clone(), self.mk_block_stmt(body))])
    }

    /// Loops unify to `brk: while (condTmp) { cont: { body }; cond -> condTmp }`.
    /// do-while primes the condition with `true` instead of the test.
    fn while_stmt(
        &mut self,
        test: &Expression,
        body: &Statement,
        is_do_while: bool,
    ) -> NormalizeResult<Vec<Statement>> {
        let cond_tmp = self.gen_tmp();
        let brk_label = self.gen_label();
        let cont_label = self.gen_label();

        let mut out = vec![];
        if is_do_while {
            out.push(b::assign_stmt(&cond_tmp, b::boolean(true)));
        } else {
            out.extend(self.expression(test, Some(&mut Target::name(cond_tmp.as_str())))?);
        }

        let registered = self.register_loop_labels(&cont_label);
        let body_result = self.statement(body, Some(brk_label.as_str()), Some(cont_label.as_str()));
        self.unregister_loop_labels(registered);
        let body_stmts = body_result?;

        let mut loop_body = vec![b::labeled(cont_label, self.mk_block_stmt(body_stmts))];
        loop_body.extend(self.expression(test, Some(&mut Target::name(cond_tmp.as_str())))?);

        out.push(b::labeled(
            brk_label,
            b::while_stmt(b::id_expr(&cond_tmp), self.mk_block_stmt(loop_body)),
        ));
        Ok(out)
    }

    fn for_stmt(&mut self, stmt: &ForStatement) -> NormalizeResult<Vec<Statement>> {
        let mut out = vec![];
        match &stmt.init {
            Some(ForInit::VarDecl(decl)) => out.extend(self.var_decl_inits(decl)?),
            Some(ForInit::Expression(expr)) => out.extend(self.expression(expr, None)?),
            None => {}
        }

        let cond_var = self.gen_tmp();
        match &stmt.test {
            Some(test) => {
                out.extend(self.expression(test, Some(&mut Target::name(cond_var.as_str())))?)
            }
            None => out.push(b::assign_stmt(&cond_var, b::boolean(true))),
        }

        let brk_label = self.gen_label();
        let cont_label = self.gen_label();
        let registered = self.register_loop_labels(&cont_label);
        let body_result = self.statement(&stmt.body, Some(brk_label.as_str()), Some(cont_label.as_str()));
        self.unregister_loop_labels(registered);
        let body_stmts = body_result?;

        let mut loop_body = vec![b::labeled(cont_label, self.mk_block_stmt(body_stmts))];
        if let Some(update) = &stmt.update {
            loop_body.extend(self.expression(update, None)?);
        }
        if let Some(test) = &stmt.test {
            loop_body.extend(self.expression(test, Some(&mut Target::name(cond_var.as_str())))?);
        }

        out.push(b::labeled(
            brk_label,
            b::while_stmt(b::id_expr(&cond_var), self.mk_block_stmt(loop_body)),
        ));
        Ok(out)
    }

    /// `for-in` keeps its shape but always iterates into a plain local; a
    /// body prefix routes the value to the real target when that target is
    /// global or with-shadowed.
    fn for_in_stmt(&mut self, stmt: &ForInStatement) -> NormalizeResult<Vec<Statement>> {
        let mut out = vec![];
        let target_name: String = match &stmt.left {
            ForInInit::VarDecl(decl) => {
                let declarator = &decl.declarations[0];
                if let Some(init) = &declarator.init {
                    // Legacy `for (var p = e in o)` initializer
                    out.extend(self.assign_ident(&declarator.id.name, init, None)?);
                }
                declarator.id.name.clone()
            }
            ForInInit::Expression(expr) => match expr.as_ref() {
                Expression::Id(id) => id.name.clone(),
                _ => return Err(NormalizeError::ForInTarget),
            },
        };

        let obj_tmp = self.gen_tmp();
        out.extend(self.expression(&stmt.right, Some(&mut Target::name(obj_tmp.as_str())))?);

        let direct = self.scope.is_local(&target_name)
            && self.scope.possible_with_bindings(&target_name).is_empty();
        let (loop_var, prefix) = if direct {
            (target_name, vec![])
        } else {
            let loop_tmp = self.gen_tmp();
            let value = b::id_expr(&loop_tmp);
            let assign = self.assign_ident(&target_name, &value, None)?;
            (loop_tmp, assign)
        };

        let brk_label = self.gen_label();
        let cont_label = self.gen_label();
        let registered = self.register_loop_labels(&cont_label);
        let body_result = self.statement(&stmt.body, Some(brk_label.as_str()), Some(cont_label.as_str()));
        self.unregister_loop_labels(registered);
        let mut body_stmts = prefix;
        body_stmts.extend(body_result?);

        let inner = vec![b::labeled(cont_label, self.mk_block_stmt(body_stmts))];
        out.push(b::labeled(
            brk_label,
            Statement::ForIn(ForInStatement {
                left: ForInInit::Expression(P::new(b::id_expr(&loop_var))),
                right: P::new(b::id_expr(&obj_tmp)),
                body: P::new(self.mk_block_stmt(inner)),
            }),
        ));
        Ok(out)
    }

    /// Lowered bottom-up into `if (eqTmp) { consequents } else { rest }`
    /// chains; fall-through is preserved by accumulating the following
    /// consequents up to the first that cannot complete normally.
    fn switch_stmt(
        &mut self,
        stmt: &SwitchStatement,
        cont: Option<&str>,
    ) -> NormalizeResult<Vec<Statement>> {
        let disc_tmp = self.gen_tmp();
        let mut out =
            self.expression(&stmt.discriminant, Some(&mut Target::name(disc_tmp.as_str())))?;

        let switch_label = self.gen_label();
        let mut current: Vec<Statement> = vec![];
        let mut saw_default = false;

        for (index, case) in stmt.cases.iter().enumerate().rev() {
            match &case.test {
                None => {
                    if !saw_default {
                        saw_default = true;
                        current = self.case_body(stmt, index, &switch_label, cont)?;
                    }
                }
                Some(test) => {
                    let (mut chain, test_name) = self.expression_to_name(test)?;
                    let eq_tmp = self.gen_tmp();
                    chain.push(b::assign_stmt(
                        &eq_tmp,
                        b::binary(
                            BinaryOperator::EqEqEq,
                            b::id_expr(&disc_tmp),
                            b::id_expr(&test_name),
                        ),
                    ));
                    let body = self.case_body(stmt, index, &switch_label, cont)?;
                    chain.extend(self.mk_if(&eq_tmp, body, current));
                    current = chain;
                }
            }
        }

        out.push(b::labeled(switch_label, self.mk_block_stmt(current)));
        Ok(out)
    }

    fn case_body(
        &mut self,
        stmt: &SwitchStatement,
        index: usize,
        brk: &str,
        cont: Option<&str>,
    ) -> NormalizeResult<Vec<Statement>> {
        let mut source: Vec<&Statement> = stmt.cases[index].body.iter().collect();
        for case in &stmt.cases[index + 1..] {
            let completes = source
                .last()
                .map_or(true, |last| cflow::may_complete_normally(last));
            if !completes {
                break;
            }
            source.extend(case.body.iter());
        }

        let mut out = vec![];
        for stmt in source {
            out.extend(self.statement(stmt, Some(brk), cont)?);
        }
        Ok(out)
    }

    fn try_stmt(
        &mut self,
        stmt: &TryStatement,
        brk: Option<&str>,
        cont: Option<&str>,
    ) -> NormalizeResult<Vec<Statement>> {
        let mut block_body = vec![];
        for inner in &stmt.block.body {
            block_body.extend(self.statement(inner, brk, cont)?);
        }

        let inner = match &stmt.handler {
            Some(handler) => {
                if handler.guard.is_some() {
                    return Err(NormalizeError::GuardedCatchHandler);
                }
                self.scope.push_catch(&handler.param);
                let handler_result: NormalizeResult<Vec<Statement>> = (|| {
                    let mut out = vec![];
                    for inner in &handler.body.body {
                        out.extend(self.statement(inner, brk, cont)?);
                    }
                    Ok(out)
                })();
                self.scope.pop();
                let handler_body = handler_result?;

                vec![Statement::Try(TryStatement {
                    block: self.mk_block(block_body),
                    handler: Some(P::new(CatchClause {
                        param: b::id(handler.param.name.as_str()),
                        guard: None,
                        body: self.mk_block(handler_body),
                    })),
                    finalizer: None,
                })]
            }
            None => block_body,
        };

        match &stmt.finalizer {
            Some(finalizer) if !finalizer.body.is_empty() => {
                let mut fin = vec![];
                for inner in &finalizer.body {
                    fin.extend(self.statement(inner, brk, cont)?);
                }
                Ok(vec![Statement::Try(TryStatement {
                    block: self.mk_block(inner),
                    handler: None,
                    finalizer: Some(self.mk_block(fin)),
                })])
            }
            _ => Ok(inner),
        }
    }

    fn register_loop_labels(&mut self, cont_label: &str) -> Vec<String> {
        let labels: Vec<String> = self.pending_loop_labels.drain(..).collect();
        for label in &labels {
            self.label_conts.insert(label.clone(), cont_label.to_string());
        }
        labels
    }

    fn unregister_loop_labels(&mut self, labels: Vec<String>) {
        for label in &labels {
            self.label_conts.remove(label);
        }
    }

    /// The `if` constructor for name-tested conditions. Under `unfold_ifs`,
    /// a two-armed `if` becomes two one-armed `if`s over a captured test.
    fn mk_if(
        &mut self,
        cond: &str,
        then_stmts: Vec<Statement>,
        else_stmts: Vec<Statement>,
    ) -> Vec<Statement> {
        if self.options.unfold_ifs() && !then_stmts.is_empty() && !else_stmts.is_empty() {
            let capture = self.gen_tmp();
            vec![
                b::assign_stmt(&capture, b::id_expr(cond)),
                b::if_stmt(
                    b::id_expr(cond),
                    self.mk_block_stmt(then_stmts),
                    Some(self.mk_block_stmt(vec![])),
                ),
                b::if_stmt(
                    b::id_expr(&capture),
                    self.mk_block_stmt(vec![]),
                    Some(self.mk_block_stmt(else_stmts)),
                ),
            ]
        } else if else_stmts.is_empty() {
            vec![b::if_stmt(b::id_expr(cond), self.mk_block_stmt(then_stmts), None)]
        } else {
            vec![b::if_stmt(
                b::id_expr(cond),
                self.mk_block_stmt(then_stmts),
                Some(self.mk_block_stmt(else_stmts)),
            )]
        }
    }

    fn mk_block_stmt(&self, stmts: Vec<Statement>) -> Statement {
        Statement::Block(self.mk_block(stmts))
    }

    /// Compatibility mode pads empty blocks with `;` and appends `;` after a
    /// trailing `if`, so the output round-trips through older printers.
    fn mk_block(&self, mut stmts: Vec<Statement>) -> Block {
        if self.options.backwards_compatible() {
            if stmts.is_empty() || matches!(stmts.last(), Some(Statement::If(_))) {
                stmts.push(Statement::Empty);
            }
        }
        Block { body: stmts }
    }
}

/// Expression normalization.
impl Normalizer {
    fn expression(
        &mut self,
        expr: &Expression,
        mut target: Option<&mut Target>,
    ) -> NormalizeResult<Vec<Statement>> {
        match expr {
            Expression::Null
            | Expression::Boolean(_)
            | Expression::Number(_)
            | Expression::String(_) => {
                let t = self.demand(&mut target);
                Ok(vec![b::assign_stmt(&t, clone_literal(expr))])
            }
            Expression::This => {
                let t = self.demand(&mut target);
                let value = if self.scope.in_global_entity() {
                    b::id_expr(GLOBAL)
                } else {
                    b::this()
                };
                Ok(vec![b::assign_stmt(&t, value)])
            }
            Expression::Id(id) => self.read_ident(&id.name, target),
            Expression::Function(func) => {
                let inner = self.function_entity(func, false)?;
                let t = self.demand(&mut target);
                Ok(vec![b::assign_stmt(&t, Expression::Function(inner))])
            }
            Expression::Array(arr) => {
                let mut out = vec![];
                let mut elements = vec![];
                for element in &arr.elements {
                    match element {
                        ArrayElement::Hole => elements.push(ArrayElement::Hole),
                        ArrayElement::Expression(element) => {
                            let (stmts, name) = self.expression_to_name(element)?;
                            out.extend(stmts);
                            elements.push(ArrayElement::Expression(b::id_expr(&name)));
                        }
                    }
                }
                let t = self.demand(&mut target);
                out.push(b::assign_stmt(&t, b::array(elements)));
                Ok(out)
            }
            Expression::Object(obj) => {
                let mut out = vec![];
                let mut properties = vec![];
                for prop in &obj.properties {
                    let key = clone_property_key(&prop.key);
                    match prop.kind {
                        PropertyKind::Init => {
                            let (stmts, name) = self.expression_to_name(&prop.value)?;
                            out.extend(stmts);
                            properties.push(b::property(key, b::id_expr(&name), PropertyKind::Init));
                        }
                        kind => {
                            let func = match prop.value.as_ref() {
                                Expression::Function(func) => func,
                                _ => panic!("Expected accessor function"),
                            };
                            let inner = self.function_entity(func, false)?;
                            properties.push(b::property(key, Expression::Function(inner), kind));
                        }
                    }
                }
                let t = self.demand(&mut target);
                out.push(b::assign_stmt(&t, b::object(properties)));
                Ok(out)
            }
            Expression::Member(member) => {
                let (mut out, base, index) = self.member_operands(member)?;
                let t = self.demand(&mut target);
                out.push(b::assign_stmt(&t, b::index_member(&base, &index, member.is_computed)));
                Ok(out)
            }
            Expression::Assign(assign) => self.assignment(assign, target),
            Expression::Update(update) => self.update(update, target),
            Expression::Unary(unary) => self.unary(unary, target),
            Expression::Binary(binary) => {
                let (mut out, left) = self.expression_to_name(&binary.left)?;
                let (right_stmts, right) = self.expression_to_name(&binary.right)?;
                out.extend(right_stmts);
                let t = self.demand(&mut target);
                out.push(b::assign_stmt(
                    &t,
                    b::binary(binary.operator, b::id_expr(&left), b::id_expr(&right)),
                ));
                Ok(out)
            }
            Expression::Logical(logical) => self.logical(logical, target),
            Expression::Conditional(cond) => {
                let (mut out, test) = self.expression_to_name(&cond.test)?;
                let t = self.demand(&mut target);
                let conseq =
                    self.expression(&cond.conseq, Some(&mut Target::name(t.as_str())))?;
                let altern =
                    self.expression(&cond.altern, Some(&mut Target::name(t.as_str())))?;
                out.extend(self.mk_if(&test, conseq, altern));
                Ok(out)
            }
            Expression::Call(call) => self.call(call, target),
            Expression::New(new) => self.new_expr(new, target),
            Expression::Sequence(seq) => {
                let mut out = vec![];
                if let Some((last, init)) = seq.expressions.split_last() {
                    for expr in init {
                        out.extend(self.expression(expr, None)?);
                    }
                    out.extend(self.expression(last, target)?);
                }
                Ok(out)
            }
        }
    }

    fn expression_to_name(&mut self, expr: &Expression) -> NormalizeResult<(Vec<Statement>, String)> {
        let mut slot = Target::lazy();
        let stmts = self.expression(expr, Some(&mut slot))?;
        let name = slot.get(self);
        Ok((stmts, name))
    }

    fn demand(&mut self, target: &mut Option<&mut Target>) -> String {
        match target {
            Some(t) => t.get(self),
            None => self.gen_tmp(),
        }
    }

    /// Base and index temporaries of a member access; dotted property names
    /// are materialized as string literals.
    fn member_operands(
        &mut self,
        member: &MemberExpression,
    ) -> NormalizeResult<(Vec<Statement>, String, String)> {
        let (mut out, base) = self.expression_to_name(&member.object)?;
        let index = if member.is_computed {
            let (stmts, index) = self.expression_to_name(&member.property)?;
            out.extend(stmts);
            index
        } else {
            let name_tmp = self.gen_tmp();
            out.push(b::assign_stmt(
                &name_tmp,
                Expression::String(member.property.to_id().name.clone()),
            ));
            name_tmp
        };
        Ok((out, base, index))
    }

    fn read_ident(
        &mut self,
        name: &str,
        mut target: Option<&mut Target>,
    ) -> NormalizeResult<Vec<Statement>> {
        let bindings = self.scope.possible_with_bindings(name);
        let global = !is_tmp(name) && self.scope.is_global(name);

        if !global && bindings.is_empty() {
            let t = self.demand(&mut target);
            return Ok(vec![b::assign_stmt(&t, b::id_expr(name))]);
        }

        let mut out = vec![];
        let name_tmp = self.gen_tmp();
        out.push(b::assign_stmt(&name_tmp, Expression::String(name.to_string())));
        let t = self.demand(&mut target);

        let mut current = self.ident_core_read(name, &t, &name_tmp, global)?;
        for with_tmp in &bindings {
            current = vec![b::if_stmt(
                b::binary(BinaryOperator::In, b::id_expr(&name_tmp), b::id_expr(with_tmp)),
                self.mk_block_stmt(vec![b::assign_stmt(
                    &t,
                    b::index_member(with_tmp, &name_tmp, false),
                )]),
                Some(self.mk_block_stmt(current)),
            )];
        }
        out.extend(current);
        Ok(out)
    }

    /// The lexical part of an identifier read, without the with cascade.
    fn ident_core_read(
        &mut self,
        name: &str,
        t: &str,
        name_tmp: &str,
        global: bool,
    ) -> NormalizeResult<Vec<Statement>> {
        if !global {
            return Ok(vec![b::assign_stmt(t, b::id_expr(name))]);
        }

        if self.options.reference_errors() && !self.scope.is_declared_global(name) {
            if !self.scope.is_global("ReferenceError") {
                return Err(NormalizeError::ReferenceErrorShadowed);
            }
            let ctor_name_tmp = self.gen_tmp();
            let ctor_tmp = self.gen_tmp();
            let exc_tmp = self.gen_tmp();
            Ok(vec![b::if_stmt(
                b::binary(BinaryOperator::In, b::id_expr(name_tmp), b::id_expr(GLOBAL)),
                self.mk_block_stmt(vec![b::assign_stmt(
                    t,
                    b::index_member(GLOBAL, name_tmp, false),
                )]),
                Some(self.mk_block_stmt(vec![
                    b::assign_stmt(
                        &ctor_name_tmp,
                        Expression::String("ReferenceError".to_string()),
                    ),
                    b::assign_stmt(&ctor_tmp, b::index_member(GLOBAL, &ctor_name_tmp, false)),
                    b::assign_stmt(&exc_tmp, b::new_expr(b::id_expr(&ctor_tmp), vec![])),
                    b::throw_stmt(b::id_expr(&exc_tmp)),
                ])),
            )])
        } else {
            Ok(vec![b::assign_stmt(t, b::index_member(GLOBAL, name_tmp, false))])
        }
    }

    fn assignment(
        &mut self,
        assign: &AssignmentExpression,
        target: Option<&mut Target>,
    ) -> NormalizeResult<Vec<Statement>> {
        if assign.operator != AssignmentOperator::Equals {
            return self.compound_assign(
                assign.operator.binary_operator(),
                &assign.left,
                &assign.right,
                target,
            );
        }

        match assign.left.as_ref() {
            Expression::Id(id) => self.assign_ident(&id.name, &assign.right, target),
            Expression::Member(member) => {
                let (mut out, base, index) = self.member_operands(member)?;
                let (rhs_stmts, value) = match target {
                    Some(t) => {
                        let stmts = self.expression(&assign.right, Some(&mut *t))?;
                        let value = t.get(self);
                        (stmts, value)
                    }
                    None => self.expression_to_name(&assign.right)?,
                };
                out.extend(rhs_stmts);
                out.push(b::store_stmt(
                    b::index_member(&base, &index, member.is_computed),
                    b::id_expr(&value),
                ));
                Ok(out)
            }
            _ => Err(NormalizeError::AssignmentTarget),
        }
    }

    fn assign_ident(
        &mut self,
        name: &str,
        rhs: &Expression,
        mut target: Option<&mut Target>,
    ) -> NormalizeResult<Vec<Statement>> {
        let bindings = self.scope.possible_with_bindings(name);
        let global = !is_tmp(name) && self.scope.is_global(name);

        // A write to a binding of an outer function exposes it
        if !self.scope.is_local(name) {
            if let Some(binding) = self.scope.lookup(name) {
                binding.set_exposed();
            }
        }

        let provided = matches!(&target, Some(Target::Name(_)));
        let mut out = vec![];

        if global {
            let name_tmp = self.gen_tmp();
            out.push(b::assign_stmt(&name_tmp, Expression::String(name.to_string())));
            let value = match &mut target {
                Some(t) => {
                    let stmts = self.expression(rhs, Some(&mut **t))?;
                    out.extend(stmts);
                    t.get(self)
                }
                None => {
                    let (stmts, value) = self.expression_to_name(rhs)?;
                    out.extend(stmts);
                    value
                }
            };
            let core = vec![b::store_stmt(
                b::index_member(GLOBAL, &name_tmp, false),
                b::id_expr(&value),
            )];
            out.extend(self.write_cascade(&bindings, &name_tmp, &value, core));
            Ok(out)
        } else if provided || !bindings.is_empty() {
            let name_tmp = if bindings.is_empty() {
                None
            } else {
                let name_tmp = self.gen_tmp();
                out.push(b::assign_stmt(&name_tmp, Expression::String(name.to_string())));
                Some(name_tmp)
            };
            let value = match &mut target {
                Some(t) => {
                    let stmts = self.expression(rhs, Some(&mut **t))?;
                    out.extend(stmts);
                    t.get(self)
                }
                None => {
                    let (stmts, value) = self.expression_to_name(rhs)?;
                    out.extend(stmts);
                    value
                }
            };
            let core = vec![b::assign_stmt(name, b::id_expr(&value))];
            match name_tmp {
                Some(name_tmp) => {
                    out.extend(self.write_cascade(&bindings, &name_tmp, &value, core))
                }
                None => out.extend(core),
            }
            Ok(out)
        } else {
            // No observer: normalize the value straight into the variable
            out.extend(self.expression(rhs, Some(&mut Target::name(name)))?);
            if let Some(t) = target {
                t.bind(name);
            }
            Ok(out)
        }
    }

    fn write_cascade(
        &self,
        bindings: &[String],
        name_tmp: &str,
        value: &str,
        core: Vec<Statement>,
    ) -> Vec<Statement> {
        let mut current = core;
        for with_tmp in bindings {
            current = vec![b::if_stmt(
                b::binary(BinaryOperator::In, b::id_expr(name_tmp), b::id_expr(with_tmp)),
                self.mk_block_stmt(vec![b::store_stmt(
                    b::index_member(with_tmp, name_tmp, false),
                    b::id_expr(value),
                )]),
                Some(self.mk_block_stmt(current)),
            )];
        }
        current
    }

    /// `L op= R` desugars to `T := R; L = L op T`; member targets keep their
    /// base and index evaluated once.
    fn compound_assign(
        &mut self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
        mut target: Option<&mut Target>,
    ) -> NormalizeResult<Vec<Statement>> {
        match left {
            Expression::Id(id) => {
                let (mut out, rhs_name) = self.expression_to_name(right)?;
                let combined =
                    b::binary(op, b::id_expr(id.name.as_str()), b::id_expr(&rhs_name));
                out.extend(self.assign_ident(&id.name, &combined, target)?);
                Ok(out)
            }
            Expression::Member(member) => {
                let (mut out, base, index) = self.member_operands(member)?;
                let old_tmp = self.gen_tmp();
                out.push(b::assign_stmt(
                    &old_tmp,
                    b::index_member(&base, &index, member.is_computed),
                ));
                let (rhs_stmts, rhs_name) = self.expression_to_name(right)?;
                out.extend(rhs_stmts);
                let t = self.demand(&mut target);
                out.push(b::assign_stmt(
                    &t,
                    b::binary(op, b::id_expr(&old_tmp), b::id_expr(&rhs_name)),
                ));
                out.push(b::store_stmt(
                    b::index_member(&base, &index, member.is_computed),
                    b::id_expr(&t),
                ));
                Ok(out)
            }
            _ => Err(NormalizeError::CompoundAssignmentTarget),
        }
    }

    fn update(
        &mut self,
        update: &UpdateExpression,
        mut target: Option<&mut Target>,
    ) -> NormalizeResult<Vec<Statement>> {
        let op = update.operator.binary_operator();

        if update.is_prefix || target.is_none() {
            let one = b::number(1.0);
            return self.compound_assign(op, &update.argument, &one, target);
        }

        // Postfix with an observed value: the old value lands in the target
        match update.argument.as_ref() {
            Expression::Id(id) => {
                let t = self.demand(&mut target);
                let mut out = self.read_ident(&id.name, Some(&mut Target::name(t.as_str())))?;
                let new_tmp = self.gen_tmp();
                out.push(b::assign_stmt(
                    &new_tmp,
                    b::binary(op, b::id_expr(&t), b::number(1.0)),
                ));
                let value = b::id_expr(&new_tmp);
                out.extend(self.assign_ident(&id.name, &value, None)?);
                Ok(out)
            }
            Expression::Member(member) => {
                let (mut out, base, index) = self.member_operands(member)?;
                let t = self.demand(&mut target);
                out.push(b::assign_stmt(&t, b::index_member(&base, &index, member.is_computed)));
                let new_tmp = self.gen_tmp();
                out.push(b::assign_stmt(
                    &new_tmp,
                    b::binary(op, b::id_expr(&t), b::number(1.0)),
                ));
                out.push(b::store_stmt(
                    b::index_member(&base, &index, member.is_computed),
                    b::id_expr(&new_tmp),
                ));
                Ok(out)
            }
            _ => Err(NormalizeError::CompoundAssignmentTarget),
        }
    }

    fn unary(
        &mut self,
        unary: &UnaryExpression,
        mut target: Option<&mut Target>,
    ) -> NormalizeResult<Vec<Statement>> {
        if unary.operator == UnaryOperator::Delete {
            return self.delete(&unary.argument, target);
        }

        let (mut out, arg) = self.expression_to_name(&unary.argument)?;
        let t = self.demand(&mut target);
        out.push(b::assign_stmt(&t, b::unary(unary.operator, b::id_expr(&arg))));
        Ok(out)
    }

    fn delete(
        &mut self,
        argument: &Expression,
        mut target: Option<&mut Target>,
    ) -> NormalizeResult<Vec<Statement>> {
        match argument {
            Expression::Id(id) => {
                if !is_tmp(&id.name) && self.scope.is_global(&id.name) {
                    let name_tmp = self.gen_tmp();
                    let mut out =
                        vec![b::assign_stmt(&name_tmp, Expression::String(id.name.clone()))];
                    let t = self.demand(&mut target);
                    out.push(b::assign_stmt(
                        &t,
                        b::unary(UnaryOperator::Delete, b::index_member(GLOBAL, &name_tmp, false)),
                    ));
                    Ok(out)
                } else {
                    // Deleting a local is a fixed no-op at runtime; keep it
                    let t = self.demand(&mut target);
                    Ok(vec![b::assign_stmt(
                        &t,
                        b::unary(UnaryOperator::Delete, b::id_expr(id.name.as_str())),
                    )])
                }
            }
            Expression::Member(member) => {
                let (mut out, base, index) = self.member_operands(member)?;
                let t = self.demand(&mut target);
                out.push(b::assign_stmt(
                    &t,
                    b::unary(
                        UnaryOperator::Delete,
                        b::index_member(&base, &index, member.is_computed),
                    ),
                ));
                Ok(out)
            }
            _ => Err(NormalizeError::DeleteOperand),
        }
    }

    fn logical(
        &mut self,
        logical: &LogicalExpression,
        mut target: Option<&mut Target>,
    ) -> NormalizeResult<Vec<Statement>> {
        let (mut out, left) = self.expression_to_name(&logical.left)?;
        let t = self.demand(&mut target);
        let rhs = self.expression(&logical.right, Some(&mut Target::name(t.as_str())))?;
        let copy = vec![b::assign_stmt(&t, b::id_expr(&left))];
        let (then_stmts, else_stmts) = match logical.operator {
            LogicalOperator::And => (rhs, copy),
            LogicalOperator::Or => (copy, rhs),
        };
        out.extend(self.mk_if(&left, then_stmts, else_stmts));
        Ok(out)
    }

    fn call(
        &mut self,
        call: &CallExpression,
        mut target: Option<&mut Target>,
    ) -> NormalizeResult<Vec<Statement>> {
        match call.callee.as_ref() {
            // Method call: the base stays the receiver
            Expression::Member(member) => {
                let (mut out, base, index) = self.member_operands(member)?;
                let (arg_stmts, args) = self.arguments(&call.arguments)?;
                out.extend(arg_stmts);
                let t = self.demand(&mut target);
                out.push(b::assign_stmt(
                    &t,
                    b::call(b::index_member(&base, &index, member.is_computed), id_args(&args)),
                ));
                Ok(out)
            }
            // eval must stay a direct call; routing it through the global
            // object would turn it into an indirect eval
            Expression::Id(id) if id.name == "eval" => {
                let (mut out, args) = self.arguments(&call.arguments)?;
                let t = self.demand(&mut target);
                out.push(b::assign_stmt(&t, b::call(b::id_expr("eval"), id_args(&args))));
                Ok(out)
            }
            Expression::Id(id)
                if !self.scope.possible_with_bindings(&id.name).is_empty() =>
            {
                self.cascaded_call(id, &call.arguments, target, false)
            }
            _ => {
                let (mut out, callee) = self.expression_to_name(&call.callee)?;
                let (arg_stmts, args) = self.arguments(&call.arguments)?;
                out.extend(arg_stmts);
                let t = self.demand(&mut target);
                out.push(b::assign_stmt(&t, b::call(b::id_expr(&callee), id_args(&args))));
                Ok(out)
            }
        }
    }

    fn new_expr(
        &mut self,
        new: &NewExpression,
        mut target: Option<&mut Target>,
    ) -> NormalizeResult<Vec<Statement>> {
        match new.callee.as_ref() {
            Expression::Id(id)
                if !self.scope.possible_with_bindings(&id.name).is_empty() =>
            {
                self.cascaded_call(id, &new.arguments, target, true)
            }
            _ => {
                let (mut out, callee) = self.expression_to_name(&new.callee)?;
                let (arg_stmts, args) = self.arguments(&new.arguments)?;
                out.extend(arg_stmts);
                let t = self.demand(&mut target);
                out.push(b::assign_stmt(&t, b::new_expr(b::id_expr(&callee), id_args(&args))));
                Ok(out)
            }
        }
    }

    /// A call through a with-shadowed name. Arguments are evaluated once,
    /// before the cascade; the hit branch calls `w[name](args)` so the with
    /// object becomes the receiver, the fallback resolves lexically.
    fn cascaded_call(
        &mut self,
        id: &Identifier,
        arguments: &[Expression],
        mut target: Option<&mut Target>,
        is_new: bool,
    ) -> NormalizeResult<Vec<Statement>> {
        let name = id.name.as_str();
        let bindings = self.scope.possible_with_bindings(name);
        let global = !is_tmp(name) && self.scope.is_global(name);

        let name_tmp = self.gen_tmp();
        let mut out = vec![b::assign_stmt(&name_tmp, Expression::String(name.to_string()))];
        let (arg_stmts, args) = self.arguments(arguments)?;
        out.extend(arg_stmts);
        let t = self.demand(&mut target);

        let fn_tmp = self.gen_tmp();
        let mut current = self.ident_core_read(name, &fn_tmp, &name_tmp, global)?;
        current.push(b::assign_stmt(
            &t,
            make_call(is_new, b::id_expr(&fn_tmp), id_args(&args)),
        ));

        for with_tmp in &bindings {
            current = vec![b::if_stmt(
                b::binary(BinaryOperator::In, b::id_expr(&name_tmp), b::id_expr(with_tmp)),
                self.mk_block_stmt(vec![b::assign_stmt(
                    &t,
                    make_call(is_new, b::index_member(with_tmp, &name_tmp, false), id_args(&args)),
                )]),
                Some(self.mk_block_stmt(current)),
            )];
        }
        out.extend(current);
        Ok(out)
    }

    fn arguments(
        &mut self,
        arguments: &[Expression],
    ) -> NormalizeResult<(Vec<Statement>, Vec<String>)> {
        let mut out = vec![];
        let mut names = vec![];
        for arg in arguments {
            let (stmts, name) = self.expression_to_name(arg)?;
            out.extend(stmts);
            names.push(name);
        }
        Ok((out, names))
    }
}

fn id_args(names: &[String]) -> Vec<Expression> {
    names.iter().map(|name| b::id_expr(name.as_str())).collect()
}

fn make_call(is_new: bool, callee: Expression, args: Vec<Expression>) -> Expression {
    if is_new {
        b::new_expr(callee, args)
    } else {
        b::call(callee, args)
    }
}

/// Fresh names must not collide with temp-shaped names already present in
/// the input (normalizer output fed back in, most commonly), so the counter
/// starts past the largest one found anywhere in the tree.
fn note_tmp(name: &str, max: &mut Option<usize>) {
    if is_tmp(name) {
        // The digits were just validated
        let index: usize = name["tmp".len()..].parse().unwrap();
        if max.map_or(true, |max| index > max) {
            *max = Some(index);
        }
    }
}

fn scan_function_tmps(func: &Function, max: &mut Option<usize>) {
    if let Some(id) = &func.id {
        note_tmp(&id.name, max);
    }
    for param in &func.params {
        note_tmp(&param.name, max);
    }
    for stmt in &func.body {
        scan_stmt_tmps(stmt, max);
    }
}

fn scan_stmt_tmps(stmt: &Statement, max: &mut Option<usize>) {
    match stmt {
        Statement::Empty | Statement::Debugger => {}
        Statement::VarDecl(decl) => scan_var_decl_tmps(decl, max),
        Statement::FuncDecl(func) => scan_function_tmps(func, max),
        Statement::Expr(stmt) => scan_expr_tmps(&stmt.expr, max),
        Statement::Block(block) => {
            for stmt in &block.body {
                scan_stmt_tmps(stmt, max);
            }
        }
        Statement::If(stmt) => {
            scan_expr_tmps(&stmt.test, max);
            scan_stmt_tmps(&stmt.conseq, max);
            if let Some(altern) = &stmt.altern {
                scan_stmt_tmps(altern, max);
            }
        }
        Statement::Switch(stmt) => {
            scan_expr_tmps(&stmt.discriminant, max);
            for case in &stmt.cases {
                if let Some(test) = &case.test {
                    scan_expr_tmps(test, max);
                }
                for stmt in &case.body {
                    scan_stmt_tmps(stmt, max);
                }
            }
        }
        Statement::For(stmt) => {
            match &stmt.init {
                Some(ForInit::VarDecl(decl)) => scan_var_decl_tmps(decl, max),
                Some(ForInit::Expression(expr)) => scan_expr_tmps(expr, max),
                None => {}
            }
            if let Some(test) = &stmt.test {
                scan_expr_tmps(test, max);
            }
            if let Some(update) = &stmt.update {
                scan_expr_tmps(update, max);
            }
            scan_stmt_tmps(&stmt.body, max);
        }
        Statement::ForIn(stmt) => {
            match &stmt.left {
                ForInInit::VarDecl(decl) => scan_var_decl_tmps(decl, max),
                ForInInit::Expression(expr) => scan_expr_tmps(expr, max),
            }
            scan_expr_tmps(&stmt.right, max);
            scan_stmt_tmps(&stmt.body, max);
        }
        Statement::While(stmt) => {
            scan_expr_tmps(&stmt.test, max);
            scan_stmt_tmps(&stmt.body, max);
        }
        Statement::DoWhile(stmt) => {
            scan_expr_tmps(&stmt.test, max);
            scan_stmt_tmps(&stmt.body, max);
        }
        Statement::With(stmt) => {
            scan_expr_tmps(&stmt.object, max);
            scan_stmt_tmps(&stmt.body, max);
        }
        Statement::Try(stmt) => {
            for stmt in &stmt.block.body {
                scan_stmt_tmps(stmt, max);
            }
            if let Some(handler) = &stmt.handler {
                note_tmp(&handler.param.name, max);
                if let Some(guard) = &handler.guard {
                    scan_expr_tmps(guard, max);
                }
                for stmt in &handler.body.body {
                    scan_stmt_tmps(stmt, max);
                }
            }
            if let Some(finalizer) = &stmt.finalizer {
                for stmt in &finalizer.body {
                    scan_stmt_tmps(stmt, max);
                }
            }
        }
        Statement::Throw(stmt) => scan_expr_tmps(&stmt.argument, max),
        Statement::Return(stmt) => {
            if let Some(argument) = &stmt.argument {
                scan_expr_tmps(argument, max);
            }
        }
        Statement::Break(stmt) => {
            if let Some(label) = &stmt.label {
                note_tmp(label, max);
            }
        }
        Statement::Continue(stmt) => {
            if let Some(label) = &stmt.label {
                note_tmp(label, max);
            }
        }
        Statement::Labeled(stmt) => {
            note_tmp(&stmt.label, max);
            scan_stmt_tmps(&stmt.body, max);
        }
    }
}

fn scan_var_decl_tmps(decl: &VariableDeclaration, max: &mut Option<usize>) {
    for declarator in &decl.declarations {
        note_tmp(&declarator.id.name, max);
        if let Some(init) = &declarator.init {
            scan_expr_tmps(init, max);
        }
    }
}

fn scan_expr_tmps(expr: &Expression, max: &mut Option<usize>) {
    match expr {
        Expression::Null
        | Expression::Boolean(_)
        | Expression::Number(_)
        | Expression::String(_)
        | Expression::This => {}
        Expression::Id(id) => note_tmp(&id.name, max),
        Expression::Function(func) => scan_function_tmps(func, max),
        Expression::Unary(unary) => scan_expr_tmps(&unary.argument, max),
        Expression::Binary(binary) => {
            scan_expr_tmps(&binary.left, max);
            scan_expr_tmps(&binary.right, max);
        }
        Expression::Logical(logical) => {
            scan_expr_tmps(&logical.left, max);
            scan_expr_tmps(&logical.right, max);
        }
        Expression::Assign(assign) => {
            scan_expr_tmps(&assign.left, max);
            scan_expr_tmps(&assign.right, max);
        }
        Expression::Update(update) => scan_expr_tmps(&update.argument, max),
        Expression::Member(member) => {
            scan_expr_tmps(&member.object, max);
            scan_expr_tmps(&member.property, max);
        }
        Expression::Conditional(cond) => {
            scan_expr_tmps(&cond.test, max);
            scan_expr_tmps(&cond.conseq, max);
            scan_expr_tmps(&cond.altern, max);
        }
        Expression::Call(call) => {
            scan_expr_tmps(&call.callee, max);
            for arg in &call.arguments {
                scan_expr_tmps(arg, max);
            }
        }
        Expression::New(new) => {
            scan_expr_tmps(&new.callee, max);
            for arg in &new.arguments {
                scan_expr_tmps(arg, max);
            }
        }
        Expression::Sequence(seq) => {
            for expr in &seq.expressions {
                scan_expr_tmps(expr, max);
            }
        }
        Expression::Array(arr) => {
            for element in &arr.elements {
                if let ArrayElement::Expression(element) = element {
                    scan_expr_tmps(element, max);
                }
            }
        }
        Expression::Object(obj) => {
            for prop in &obj.properties {
                scan_expr_tmps(&prop.value, max);
            }
        }
    }
}

fn clone_literal(expr: &Expression) -> Expression {
    match expr {
        Expression::Null => Expression::Null,
        Expression::Boolean(value) => Expression::Boolean(*value),
        Expression::Number(value) => Expression::Number(*value),
        Expression::String(value) => Expression::String(value.clone()),
        _ => panic!("Expected literal expression"),
    }
}

fn clone_property_key(key: &Expression) -> Expression {
    match key {
        Expression::Id(id) => b::id_expr(id.name.as_str()),
        Expression::String(value) => Expression::String(value.clone()),
        Expression::Number(value) => Expression::Number(*value),
        _ => panic!("Expected identifier or literal property key"),
    }
}
