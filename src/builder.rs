//! Constructors for AST nodes. The normalizer builds its entire output
//! through these, and tests use them to assemble input trees.

use crate::ast::*;

pub fn id(name: impl Into<String>) -> Identifier {
    Identifier::new(name)
}

pub fn id_expr(name: impl Into<String>) -> Expression {
    Expression::Id(Identifier::new(name))
}

pub fn number(value: f64) -> Expression {
    Expression::Number(value)
}

pub fn string(value: impl Into<String>) -> Expression {
    Expression::String(value.into())
}

pub fn boolean(value: bool) -> Expression {
    Expression::Boolean(value)
}

pub fn null() -> Expression {
    Expression::Null
}

pub fn this() -> Expression {
    Expression::This
}

pub fn unary(operator: UnaryOperator, argument: Expression) -> Expression {
    Expression::Unary(UnaryExpression { operator, argument: P::new(argument) })
}

pub fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
    Expression::Binary(BinaryExpression {
        operator,
        left: P::new(left),
        right: P::new(right),
    })
}

pub fn logical(operator: LogicalOperator, left: Expression, right: Expression) -> Expression {
    Expression::Logical(LogicalExpression {
        operator,
        left: P::new(left),
        right: P::new(right),
    })
}

pub fn assign(operator: AssignmentOperator, left: Expression, right: Expression) -> Expression {
    Expression::Assign(AssignmentExpression {
        operator,
        left: P::new(left),
        right: P::new(right),
    })
}

pub fn update(operator: UpdateOperator, argument: Expression, is_prefix: bool) -> Expression {
    Expression::Update(UpdateExpression { operator, argument: P::new(argument), is_prefix })
}

pub fn member(object: Expression, property: Expression, is_computed: bool) -> Expression {
    Expression::Member(MemberExpression {
        object: P::new(object),
        property: P::new(property),
        is_computed,
        source_computed: is_computed,
    })
}

/// A bracket access of one identifier through another, as produced by the
/// normalizer. `source_computed` records the syntax of the access this node
/// was derived from.
pub fn index_member(base: &str, index: &str, source_computed: bool) -> Expression {
    Expression::Member(MemberExpression {
        object: P::new(id_expr(base)),
        property: P::new(id_expr(index)),
        is_computed: true,
        source_computed,
    })
}

pub fn conditional(test: Expression, conseq: Expression, altern: Expression) -> Expression {
    Expression::Conditional(ConditionalExpression {
        test: P::new(test),
        conseq: P::new(conseq),
        altern: P::new(altern),
    })
}

pub fn call(callee: Expression, arguments: Vec<Expression>) -> Expression {
    Expression::Call(CallExpression { callee: P::new(callee), arguments })
}

pub fn new_expr(callee: Expression, arguments: Vec<Expression>) -> Expression {
    Expression::New(NewExpression { callee: P::new(callee), arguments })
}

pub fn sequence(expressions: Vec<Expression>) -> Expression {
    Expression::Sequence(SequenceExpression { expressions })
}

pub fn array(elements: Vec<ArrayElement>) -> Expression {
    Expression::Array(ArrayExpression { elements })
}

pub fn object(properties: Vec<Property>) -> Expression {
    Expression::Object(ObjectExpression { properties })
}

pub fn property(key: Expression, value: Expression, kind: PropertyKind) -> Property {
    Property { key: P::new(key), value: P::new(value), kind }
}

pub fn function(id_name: Option<&str>, params: Vec<&str>, body: Vec<Statement>) -> Function {
    Function::new(
        id_name.map(|n| P::new(id(n))),
        params.into_iter().map(id).collect(),
        body,
    )
}

pub fn expr_stmt(expr: Expression) -> Statement {
    Statement::Expr(ExpressionStatement { expr: P::new(expr) })
}

/// `name = value;`
pub fn assign_stmt(name: &str, value: Expression) -> Statement {
    expr_stmt(assign(AssignmentOperator::Equals, id_expr(name), value))
}

/// `target = value;` for an arbitrary assignment target.
pub fn store_stmt(target: Expression, value: Expression) -> Statement {
    expr_stmt(assign(AssignmentOperator::Equals, target, value))
}

pub fn block(body: Vec<Statement>) -> Statement {
    Statement::Block(Block { body })
}

pub fn if_stmt(test: Expression, conseq: Statement, altern: Option<Statement>) -> Statement {
    Statement::If(IfStatement {
        test: P::new(test),
        conseq: P::new(conseq),
        altern: altern.map(P::new),
    })
}

pub fn while_stmt(test: Expression, body: Statement) -> Statement {
    Statement::While(WhileStatement { test: P::new(test), body: P::new(body) })
}

pub fn labeled(label: impl Into<String>, body: Statement) -> Statement {
    Statement::Labeled(LabeledStatement { label: label.into(), body: P::new(body) })
}

pub fn break_stmt(label: Option<String>) -> Statement {
    Statement::Break(BreakStatement { label })
}

pub fn continue_stmt(label: Option<String>) -> Statement {
    Statement::Continue(ContinueStatement { label })
}

pub fn return_stmt(argument: Option<Expression>) -> Statement {
    Statement::Return(ReturnStatement { argument: argument.map(P::new) })
}

pub fn throw_stmt(argument: Expression) -> Statement {
    Statement::Throw(ThrowStatement { argument: P::new(argument) })
}

pub fn var_decl(declarators: Vec<(&str, Option<Expression>)>) -> Statement {
    Statement::VarDecl(VariableDeclaration {
        declarations: declarators
            .into_iter()
            .map(|(name, init)| VariableDeclarator { id: id(name), init: init.map(P::new) })
            .collect(),
    })
}

/// The hoisted `var` declaration for a list of names, no initializers.
pub fn var_names(names: &[String]) -> Statement {
    Statement::VarDecl(VariableDeclaration {
        declarations: names
            .iter()
            .map(|name| VariableDeclarator { id: id(name.as_str()), init: None })
            .collect(),
    })
}
