//! Collects the declarations hoisted to the top of a function or program:
//! every `var` declarator and function declaration in the entity's
//! statements, not descending into nested functions.

use crate::ast::*;

#[derive(Clone, Copy)]
pub enum HoistedDecl {
    Func(AstPtr<Function>),
    Var(AstPtr<VariableDeclarator>),
}

impl HoistedDecl {
    pub fn name(&self) -> &str {
        match self {
            // Function declarations always carry a name
            HoistedDecl::Func(func) => &func.as_ref().id.as_deref().unwrap().name,
            HoistedDecl::Var(decl) => &decl.as_ref().id.name,
        }
    }
}

pub fn collect_program(program: &Program) -> Vec<HoistedDecl> {
    let mut decls = vec![];
    collect_stmts(&program.body, &mut decls);
    decls
}

pub fn collect_function(func: &Function) -> Vec<HoistedDecl> {
    let mut decls = vec![];
    collect_stmts(&func.body, &mut decls);
    decls
}

fn collect_stmts(stmts: &[Statement], decls: &mut Vec<HoistedDecl>) {
    for stmt in stmts {
        collect_stmt(stmt, decls);
    }
}

fn collect_stmt(stmt: &Statement, decls: &mut Vec<HoistedDecl>) {
    match stmt {
        Statement::VarDecl(var_decl) => collect_var_decl(var_decl, decls),
        Statement::FuncDecl(func) => decls.push(HoistedDecl::Func(AstPtr::from_ref(func))),
        Statement::Block(block) => collect_stmts(&block.body, decls),
        Statement::If(stmt) => {
            collect_stmt(&stmt.conseq, decls);
            if let Some(altern) = &stmt.altern {
                collect_stmt(altern, decls);
            }
        }
        Statement::Switch(stmt) => {
            for case in &stmt.cases {
                collect_stmts(&case.body, decls);
            }
        }
        Statement::For(stmt) => {
            if let Some(ForInit::VarDecl(var_decl)) = &stmt.init {
                collect_var_decl(var_decl, decls);
            }
            collect_stmt(&stmt.body, decls);
        }
        Statement::ForIn(stmt) => {
            if let ForInInit::VarDecl(var_decl) = &stmt.left {
                collect_var_decl(var_decl, decls);
            }
            collect_stmt(&stmt.body, decls);
        }
        Statement::While(stmt) => collect_stmt(&stmt.body, decls),
        Statement::DoWhile(stmt) => collect_stmt(&stmt.body, decls),
        Statement::With(stmt) => collect_stmt(&stmt.body, decls),
        Statement::Labeled(stmt) => collect_stmt(&stmt.body, decls),
        Statement::Try(stmt) => {
            collect_stmts(&stmt.block.body, decls);
            if let Some(handler) = &stmt.handler {
                collect_stmts(&handler.body.body, decls);
            }
            if let Some(finalizer) = &stmt.finalizer {
                collect_stmts(&finalizer.body, decls);
            }
        }
        Statement::Expr(_)
        | Statement::Return(_)
        | Statement::Throw(_)
        | Statement::Break(_)
        | Statement::Continue(_)
        | Statement::Empty
        | Statement::Debugger => {}
    }
}

fn collect_var_decl(var_decl: &VariableDeclaration, decls: &mut Vec<HoistedDecl>) {
    for decl in &var_decl.declarations {
        decls.push(HoistedDecl::Var(AstPtr::from_ref(decl)));
    }
}
