//! Structural checks over normalized output: operand flatness, explicit
//! break labels, hoist completeness, and that the normalizer accepts its own
//! output.

use std::collections::HashSet;

use jsnorm::ast::*;
use jsnorm::builder as b;
use jsnorm::{is_tmp, normalize_function, normalize_program, Options};

fn assert_trivial(expr: &Expression) {
    assert!(expr.is_trivial(), "operand must be an identifier or literal");
}

fn assert_flat_member(member: &MemberExpression) {
    assert!(member.is_computed, "normalized member accesses use brackets");
    assert_trivial(&member.object);
    assert_trivial(&member.property);
}

/// The right-hand side of a normalized assignment: at most one operation
/// over identifier/literal operands.
fn assert_flat_value(expr: &Expression, scope: &Scope) {
    match expr {
        _ if expr.is_trivial() => {
            if let Expression::Id(id) = expr {
                scope.check_use(&id.name);
            }
        }
        Expression::This => {}
        Expression::Function(func) => check_entity(func, scope),
        Expression::Member(member) => {
            assert_flat_member(member);
            scope.check_expr(&member.object);
            scope.check_expr(&member.property);
        }
        Expression::Binary(binary) => {
            assert_trivial(&binary.left);
            assert_trivial(&binary.right);
            scope.check_expr(&binary.left);
            scope.check_expr(&binary.right);
        }
        Expression::Unary(unary) => match unary.argument.as_ref() {
            Expression::Member(member) => {
                assert_eq!(unary.operator, UnaryOperator::Delete);
                assert_flat_member(member);
            }
            argument => {
                assert_trivial(argument);
                scope.check_expr(argument);
            }
        },
        Expression::Call(call) => {
            match call.callee.as_ref() {
                Expression::Member(member) => assert_flat_member(member),
                callee => assert_trivial(callee),
            }
            for arg in &call.arguments {
                assert_trivial(arg);
                scope.check_expr(arg);
            }
        }
        Expression::New(new) => {
            match new.callee.as_ref() {
                Expression::Member(member) => assert_flat_member(member),
                callee => assert_trivial(callee),
            }
            for arg in &new.arguments {
                assert_trivial(arg);
            }
        }
        Expression::Array(arr) => {
            for element in &arr.elements {
                if let ArrayElement::Expression(element) = element {
                    assert_trivial(element);
                }
            }
        }
        Expression::Object(obj) => {
            for prop in &obj.properties {
                match prop.kind {
                    PropertyKind::Init => assert_trivial(&prop.value),
                    PropertyKind::Get | PropertyKind::Set => match prop.value.as_ref() {
                        Expression::Function(func) => check_entity(func, scope),
                        _ => panic!("accessor value must be a function"),
                    },
                }
            }
        }
        _ => panic!("expression kind not allowed in normal form"),
    }
}

fn assert_flat_test(test: &Expression, scope: &Scope) {
    match test {
        Expression::Id(id) => scope.check_use(&id.name),
        // The global/with machinery tests membership directly
        Expression::Binary(binary) => {
            assert_eq!(binary.operator, BinaryOperator::In);
            assert_trivial(&binary.left);
            assert_trivial(&binary.right);
        }
        _ => panic!("if/while tests must be names or membership probes"),
    }
}

fn check_stmt(stmt: &Statement, scope: &Scope) {
    match stmt {
        Statement::Empty | Statement::Debugger => {}
        Statement::VarDecl(decl) => {
            for declarator in &decl.declarations {
                assert!(declarator.init.is_none(), "hoisted declarators carry no initializer");
            }
        }
        Statement::Expr(stmt) => match stmt.expr.as_ref() {
            Expression::Assign(assign) => {
                assert_eq!(assign.operator, AssignmentOperator::Equals);
                match assign.left.as_ref() {
                    Expression::Id(id) => scope.check_use(&id.name),
                    Expression::Member(member) => assert_flat_member(member),
                    _ => panic!("assignment target must be a name or member"),
                }
                assert_flat_value(&assign.right, scope);
            }
            _ => panic!("expression statements in normal form are assignments"),
        },
        Statement::Block(block) => {
            for stmt in &block.body {
                check_stmt(stmt, scope);
            }
        }
        Statement::If(stmt) => {
            assert_flat_test(&stmt.test, scope);
            check_stmt(&stmt.conseq, scope);
            if let Some(altern) = &stmt.altern {
                check_stmt(altern, scope);
            }
        }
        Statement::While(stmt) => {
            assert_flat_test(&stmt.test, scope);
            check_stmt(&stmt.body, scope);
        }
        Statement::ForIn(stmt) => {
            match &stmt.left {
                ForInInit::Expression(expr) => assert_trivial(expr),
                ForInInit::VarDecl(_) => panic!("for-in declarations are hoisted away"),
            }
            assert_trivial(&stmt.right);
            check_stmt(&stmt.body, scope);
        }
        Statement::Labeled(stmt) => check_stmt(&stmt.body, scope),
        Statement::Break(stmt) => {
            assert!(stmt.label.is_some(), "normalized breaks carry explicit labels");
        }
        Statement::Return(stmt) => {
            if let Some(argument) = &stmt.argument {
                assert_trivial(argument);
            }
        }
        Statement::Throw(stmt) => assert_trivial(&stmt.argument),
        Statement::Try(stmt) => {
            for inner in &stmt.block.body {
                check_stmt(inner, scope);
            }
            if let Some(handler) = &stmt.handler {
                assert!(handler.guard.is_none());
                for inner in &handler.body.body {
                    check_stmt(inner, scope);
                }
            }
            if let Some(finalizer) = &stmt.finalizer {
                for inner in &finalizer.body {
                    check_stmt(inner, scope);
                }
            }
        }
        Statement::Continue(_) => panic!("continue must be lowered to labeled break"),
        Statement::Switch(_) => panic!("switch must be lowered to if chains"),
        Statement::For(_) | Statement::DoWhile(_) => panic!("loops must be lowered to while"),
        Statement::With(_) => panic!("with must be compiled away"),
        Statement::FuncDecl(_) => panic!("function declarations must be hoisted away"),
    }
}

/// Declared names visible to an entity, for the use-implies-declared check
/// on generated temporaries.
struct Scope {
    declared: HashSet<String>,
}

impl Scope {
    fn check_use(&self, name: &str) {
        if is_tmp(name) {
            assert!(
                self.declared.contains(name),
                "temporary {} is not declared in any enclosing entity",
                name
            );
        }
    }

    fn check_expr(&self, expr: &Expression) {
        if let Expression::Id(id) = expr {
            self.check_use(&id.name);
        }
    }
}

fn check_entity(func: &Function, outer: &Scope) {
    let mut declared = outer.declared.clone();
    for param in &func.params {
        declared.insert(param.name.clone());
    }

    let mut body = func.body.as_slice();
    if let Some(Statement::VarDecl(decl)) = body.first() {
        let mut seen = HashSet::new();
        for declarator in &decl.declarations {
            assert!(
                seen.insert(declarator.id.name.clone()),
                "hoisted name {} declared twice",
                declarator.id.name
            );
            declared.insert(declarator.id.name.clone());
        }
        body = &body[1..];
    }

    let scope = Scope { declared };
    for stmt in body {
        check_stmt(stmt, &scope);
    }
}

fn check_program(program: &Program) {
    assert_eq!(program.body.len(), 1, "program output is a single wrapper call");
    let call = match &program.body[0] {
        Statement::Expr(stmt) => match stmt.expr.as_ref() {
            Expression::Call(call) => call,
            _ => panic!("program output must be a call"),
        },
        _ => panic!("program output must be an expression statement"),
    };
    assert!(matches!(call.arguments.as_slice(), [Expression::This]));
    match call.callee.as_ref() {
        Expression::Function(wrapper) => {
            assert_eq!(wrapper.params.len(), 1);
            assert_eq!(wrapper.params[0].name, "__global");
            check_entity(wrapper, &Scope { declared: HashSet::new() });
        }
        _ => panic!("program wrapper must be a function expression"),
    }
}

fn composite_function() -> Function {
    b::function(
        Some("k"),
        vec!["o", "a", "c", "g"],
        vec![
            b::var_decl(vec![("r", Some(b::number(0.0)))]),
            b::while_stmt(
                b::id_expr("c"),
                b::block(vec![
                    b::if_stmt(b::id_expr("a"), b::continue_stmt(None), None),
                    b::if_stmt(b::id_expr("r"), b::break_stmt(None), None),
                    b::assign_stmt(
                        "r",
                        b::call(
                            b::member(b::id_expr("o"), b::id_expr("m"), false),
                            vec![b::id_expr("r")],
                        ),
                    ),
                ]),
            ),
            b::labeled(
                "outer",
                b::while_stmt(
                    b::id_expr("c"),
                    b::block(vec![b::while_stmt(
                        b::id_expr("a"),
                        b::block(vec![b::continue_stmt(Some("outer".to_string()))]),
                    )]),
                ),
            ),
            Statement::ForIn(ForInStatement {
                left: ForInInit::VarDecl(VariableDeclaration {
                    declarations: vec![VariableDeclarator { id: b::id("p"), init: None }],
                }),
                right: P::new(b::id_expr("o")),
                body: P::new(b::block(vec![b::assign_stmt(
                    "r",
                    b::binary(BinaryOperator::Add, b::id_expr("r"), b::id_expr("p")),
                )])),
            }),
            b::while_stmt(
                b::id_expr("c"),
                b::block(vec![Statement::Switch(SwitchStatement {
                    discriminant: P::new(b::id_expr("a")),
                    cases: vec![
                        SwitchCase {
                            test: Some(P::new(b::number(1.0))),
                            body: vec![b::continue_stmt(None)],
                        },
                        SwitchCase {
                            test: Some(P::new(b::number(2.0))),
                            body: vec![
                                b::assign_stmt("r", b::number(2.0)),
                                b::break_stmt(None),
                            ],
                        },
                        SwitchCase {
                            test: None,
                            body: vec![b::assign_stmt("r", b::number(3.0))],
                        },
                    ],
                })]),
            ),
            Statement::Try(TryStatement {
                block: Block {
                    body: vec![b::expr_stmt(b::assign(
                        AssignmentOperator::Add,
                        b::member(b::id_expr("o"), b::id_expr("p"), false),
                        b::number(1.0),
                    ))],
                },
                handler: Some(P::new(CatchClause {
                    param: b::id("e"),
                    guard: None,
                    body: Block { body: vec![b::throw_stmt(b::id_expr("e"))] },
                })),
                finalizer: Some(Block {
                    body: vec![b::assign_stmt("r", b::number(0.0))],
                }),
            }),
            Statement::DoWhile(DoWhileStatement {
                test: P::new(b::id_expr("a")),
                body: P::new(b::block(vec![b::assign_stmt(
                    "a",
                    b::binary(BinaryOperator::Subtract, b::id_expr("a"), b::number(1.0)),
                )])),
            }),
            Statement::With(WithStatement {
                object: P::new(b::id_expr("o")),
                body: P::new(b::block(vec![b::assign_stmt("r", b::id_expr("q"))])),
            }),
            b::var_decl(vec![(
                "s",
                Some(b::conditional(
                    b::id_expr("a"),
                    b::logical(LogicalOperator::And, b::id_expr("c"), b::id_expr("r")),
                    b::array(vec![
                        ArrayElement::Expression(b::id_expr("r")),
                        ArrayElement::Hole,
                        ArrayElement::Expression(b::number(7.0)),
                    ]),
                )),
            )]),
            b::expr_stmt(b::update(
                UpdateOperator::Increment,
                b::member(b::id_expr("o"), b::string("n"), true),
                false,
            )),
            b::expr_stmt(b::unary(
                UnaryOperator::Delete,
                b::member(b::id_expr("o"), b::id_expr("p"), false),
            )),
            b::expr_stmt(b::call(
                Expression::Function(b::function(
                    None,
                    vec![],
                    vec![b::return_stmt(Some(b::id_expr("r")))],
                )),
                vec![],
            )),
            b::return_stmt(Some(b::id_expr("r"))),
        ],
    )
}

#[test]
fn normal_form_invariants_hold() {
    let func = composite_function();
    let normalized = normalize_function(&func, Options::empty()).unwrap();
    check_entity(&normalized, &Scope { declared: HashSet::new() });
}

#[test]
fn normal_form_invariants_hold_with_all_options() {
    let func = composite_function();
    let options = Options::REFERENCE_ERRORS | Options::UNIFY_RET | Options::UNFOLD_IFS;
    let normalized = normalize_function(&func, options).unwrap();
    check_entity(&normalized, &Scope { declared: HashSet::new() });
}

#[test]
fn program_output_is_checkable_and_renormalizable() {
    let program = Program {
        body: vec![
            b::var_decl(vec![("x", Some(b::number(1.0)))]),
            Statement::FuncDecl(b::function(
                Some("g"),
                vec![],
                vec![b::return_stmt(Some(b::id_expr("x")))],
            )),
            b::assign_stmt("x", b::call(b::id_expr("g"), vec![])),
            b::if_stmt(
                b::id_expr("x"),
                b::block(vec![b::assign_stmt("x", b::number(2.0))]),
                Some(b::block(vec![b::assign_stmt("x", b::number(3.0))])),
            ),
        ],
    };

    let first = normalize_program(&program, Options::empty()).unwrap();
    check_program(&first);

    // The normalizer accepts its own output, and the result is still flat
    let second = normalize_program(&first, Options::empty()).unwrap();
    check_program(&second);
}

#[test]
fn renormalizing_function_output_succeeds() {
    let func = composite_function();
    let first = normalize_function(&func, Options::empty()).unwrap();
    let second = normalize_function(&first, Options::empty()).unwrap();
    check_entity(&second, &Scope { declared: HashSet::new() });
}
