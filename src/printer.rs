//! Prints an AST back to source text. The normalizer's output is flat, so
//! the printer stays simple; parentheses are added only where a reparse
//! would otherwise change shape.

use crate::ast::*;

pub fn print_program(program: &Program) -> String {
    let mut printer = Printer::new();
    for stmt in &program.body {
        printer.print_statement(stmt);
    }
    printer.finish()
}

pub fn print_function(func: &Function) -> String {
    let mut printer = Printer::new();
    printer.print_function(func);
    printer.string("\n");
    printer.finish()
}

pub fn print_statements(stmts: &[Statement]) -> String {
    let mut printer = Printer::new();
    for stmt in stmts {
        printer.print_statement(stmt);
    }
    printer.finish()
}

struct Printer {
    buf: String,
    indent: usize,
}

impl Printer {
    fn new() -> Printer {
        Printer { buf: String::new(), indent: 0 }
    }

    fn finish(self) -> String {
        self.buf
    }

    fn inc_indent(&mut self) {
        self.indent += 1;
    }

    fn dec_indent(&mut self) {
        self.indent -= 1;
    }

    fn indent(&mut self) {
        self.string(&"  ".repeat(self.indent))
    }

    fn string(&mut self, str: &str) {
        self.buf.push_str(str);
    }

    /// One full line: indentation, the statement, a newline.
    fn print_statement(&mut self, stmt: &Statement) {
        self.indent();
        self.statement_inner(stmt);
        self.string("\n");
    }

    /// The statement itself, without leading indent or trailing newline, so
    /// it can also follow a label on the same line.
    fn statement_inner(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Empty => self.string(";"),
            Statement::Debugger => self.string("debugger;"),
            Statement::Expr(stmt) => {
                // A leading `function` or `{` would reparse as a declaration
                let parens = matches!(
                    stmt.expr.as_ref(),
                    Expression::Function(_) | Expression::Object(_)
                );
                if parens {
                    self.string("(");
                    self.print_expression(&stmt.expr);
                    self.string(")");
                } else {
                    self.print_expression(&stmt.expr);
                }
                self.string(";");
            }
            Statement::VarDecl(decl) => self.print_var_decl(decl),
            Statement::FuncDecl(func) => self.print_function(func),
            Statement::Block(block) => self.print_block(block),
            Statement::If(stmt) => {
                self.string("if (");
                self.print_expression(&stmt.test);
                self.string(") ");
                self.print_attached(&stmt.conseq);
                if let Some(altern) = &stmt.altern {
                    self.string(" else ");
                    self.print_attached(altern);
                }
            }
            Statement::While(stmt) => {
                self.string("while (");
                self.print_expression(&stmt.test);
                self.string(") ");
                self.print_attached(&stmt.body);
            }
            Statement::DoWhile(stmt) => {
                self.string("do ");
                self.print_attached(&stmt.body);
                self.string(" while (");
                self.print_expression(&stmt.test);
                self.string(");");
            }
            Statement::For(stmt) => {
                self.string("for (");
                match &stmt.init {
                    Some(ForInit::VarDecl(decl)) => self.print_var_decl_no_semi(decl),
                    Some(ForInit::Expression(expr)) => self.print_expression(expr),
                    None => {}
                }
                self.string("; ");
                if let Some(test) = &stmt.test {
                    self.print_expression(test);
                }
                self.string("; ");
                if let Some(update) = &stmt.update {
                    self.print_expression(update);
                }
                self.string(") ");
                self.print_attached(&stmt.body);
            }
            Statement::ForIn(stmt) => {
                self.string("for (");
                match &stmt.left {
                    ForInInit::VarDecl(decl) => self.print_var_decl_no_semi(decl),
                    ForInInit::Expression(expr) => self.print_expression(expr),
                }
                self.string(" in ");
                self.print_expression(&stmt.right);
                self.string(") ");
                self.print_attached(&stmt.body);
            }
            Statement::With(stmt) => {
                self.string("with (");
                self.print_expression(&stmt.object);
                self.string(") ");
                self.print_attached(&stmt.body);
            }
            Statement::Switch(stmt) => {
                self.string("switch (");
                self.print_expression(&stmt.discriminant);
                self.string(") {\n");
                self.inc_indent();
                for case in &stmt.cases {
                    self.indent();
                    match &case.test {
                        Some(test) => {
                            self.string("case ");
                            self.print_expression(test);
                            self.string(":\n");
                        }
                        None => self.string("default:\n"),
                    }
                    self.inc_indent();
                    for stmt in &case.body {
                        self.print_statement(stmt);
                    }
                    self.dec_indent();
                }
                self.dec_indent();
                self.indent();
                self.string("}");
            }
            Statement::Try(stmt) => {
                self.string("try ");
                self.print_block(&stmt.block);
                if let Some(handler) = &stmt.handler {
                    self.string(" catch (");
                    self.string(&handler.param.name);
                    self.string(") ");
                    self.print_block(&handler.body);
                }
                if let Some(finalizer) = &stmt.finalizer {
                    self.string(" finally ");
                    self.print_block(finalizer);
                }
            }
            Statement::Throw(stmt) => {
                self.string("throw ");
                self.print_expression(&stmt.argument);
                self.string(";");
            }
            Statement::Return(stmt) => match &stmt.argument {
                Some(argument) => {
                    self.string("return ");
                    self.print_expression(argument);
                    self.string(";");
                }
                None => self.string("return;"),
            },
            Statement::Break(stmt) => match &stmt.label {
                Some(label) => {
                    self.string("break ");
                    self.string(label);
                    self.string(";");
                }
                None => self.string("break;"),
            },
            Statement::Continue(stmt) => match &stmt.label {
                Some(label) => {
                    self.string("continue ");
                    self.string(label);
                    self.string(";");
                }
                None => self.string("continue;"),
            },
            Statement::Labeled(stmt) => {
                self.string(&stmt.label);
                self.string(": ");
                self.statement_inner(&stmt.body);
            }
        }
    }

    /// The statement attached to a control-flow head: blocks stay inline,
    /// anything else goes on its own indented line.
    fn print_attached(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Block(block) => self.print_block(block),
            _ => self.statement_inner(stmt),
        }
    }

    fn print_block(&mut self, block: &Block) {
        if block.body.is_empty() {
            self.string("{}");
            return;
        }
        self.string("{\n");
        self.inc_indent();
        for stmt in &block.body {
            self.print_statement(stmt);
        }
        self.dec_indent();
        self.indent();
        self.string("}");
    }

    fn print_var_decl(&mut self, decl: &VariableDeclaration) {
        self.print_var_decl_no_semi(decl);
        self.string(";");
    }

    fn print_var_decl_no_semi(&mut self, decl: &VariableDeclaration) {
        self.string("var ");
        for (i, declarator) in decl.declarations.iter().enumerate() {
            if i > 0 {
                self.string(", ");
            }
            self.string(&declarator.id.name);
            if let Some(init) = &declarator.init {
                self.string(" = ");
                self.print_expression(init);
            }
        }
    }

    fn print_function(&mut self, func: &Function) {
        self.string("function ");
        if let Some(id) = &func.id {
            self.string(&id.name);
        }
        self.string("(");
        for (i, param) in func.params.iter().enumerate() {
            if i > 0 {
                self.string(", ");
            }
            self.string(&param.name);
        }
        self.string(") ");
        self.print_body(&func.body);
    }

    fn print_body(&mut self, body: &[Statement]) {
        if body.is_empty() {
            self.string("{}");
            return;
        }
        self.string("{\n");
        self.inc_indent();
        for stmt in body {
            self.print_statement(stmt);
        }
        self.dec_indent();
        self.indent();
        self.string("}");
    }

    fn print_expression(&mut self, expr: &Expression) {
        match expr {
            Expression::Id(id) => self.string(&id.name),
            Expression::Null => self.string("null"),
            Expression::Boolean(true) => self.string("true"),
            Expression::Boolean(false) => self.string("false"),
            Expression::Number(value) => {
                let formatted = format_number(*value);
                self.string(&formatted);
            }
            Expression::String(value) => self.print_string_literal(value),
            Expression::This => self.string("this"),
            Expression::Member(member) => {
                self.print_callee(&member.object);
                if member.is_computed {
                    self.string("[");
                    self.print_expression(&member.property);
                    self.string("]");
                } else {
                    self.string(".");
                    self.string(&member.property.to_id().name);
                }
            }
            Expression::Call(call) => {
                self.print_callee(&call.callee);
                self.print_arguments(&call.arguments);
            }
            Expression::New(new) => {
                self.string("new ");
                self.print_callee(&new.callee);
                self.print_arguments(&new.arguments);
            }
            Expression::Assign(assign) => {
                self.print_expression(&assign.left);
                self.string(assignment_op_str(assign.operator));
                self.print_expression(&assign.right);
            }
            Expression::Binary(binary) => {
                self.print_operand(&binary.left);
                self.string(binary_op_str(binary.operator));
                self.print_operand(&binary.right);
            }
            Expression::Logical(logical) => {
                self.print_operand(&logical.left);
                self.string(match logical.operator {
                    LogicalOperator::And => " && ",
                    LogicalOperator::Or => " || ",
                });
                self.print_operand(&logical.right);
            }
            Expression::Unary(unary) => {
                match unary.operator {
                    UnaryOperator::Plus => self.string("+"),
                    UnaryOperator::Minus => self.string("-"),
                    UnaryOperator::LogicalNot => self.string("!"),
                    UnaryOperator::BitwiseNot => self.string("~"),
                    UnaryOperator::TypeOf => self.string("typeof "),
                    UnaryOperator::Void => self.string("void "),
                    UnaryOperator::Delete => self.string("delete "),
                }
                self.print_operand(&unary.argument);
            }
            Expression::Update(update) => {
                let op = match update.operator {
                    UpdateOperator::Increment => "++",
                    UpdateOperator::Decrement => "--",
                };
                if update.is_prefix {
                    self.string(op);
                    self.print_operand(&update.argument);
                } else {
                    self.print_operand(&update.argument);
                    self.string(op);
                }
            }
            Expression::Conditional(cond) => {
                self.print_operand(&cond.test);
                self.string(" ? ");
                self.print_operand(&cond.conseq);
                self.string(" : ");
                self.print_operand(&cond.altern);
            }
            Expression::Sequence(seq) => {
                for (i, expr) in seq.expressions.iter().enumerate() {
                    if i > 0 {
                        self.string(", ");
                    }
                    self.print_expression(expr);
                }
            }
            Expression::Array(arr) => {
                self.string("[");
                for (i, element) in arr.elements.iter().enumerate() {
                    if i > 0 {
                        self.string(", ");
                    }
                    if let ArrayElement::Expression(element) = element {
                        self.print_expression(element);
                    }
                }
                if matches!(arr.elements.last(), Some(ArrayElement::Hole)) {
                    self.string(",");
                }
                self.string("]");
            }
            Expression::Object(obj) => {
                if obj.properties.is_empty() {
                    self.string("{}");
                    return;
                }
                self.string("{ ");
                for (i, prop) in obj.properties.iter().enumerate() {
                    if i > 0 {
                        self.string(", ");
                    }
                    self.print_property(prop);
                }
                self.string(" }");
            }
            Expression::Function(func) => self.print_function(func),
        }
    }

    fn print_property(&mut self, prop: &Property) {
        match prop.kind {
            PropertyKind::Init => {
                self.print_expression(&prop.key);
                self.string(": ");
                self.print_expression(&prop.value);
            }
            PropertyKind::Get | PropertyKind::Set => {
                self.string(if prop.kind == PropertyKind::Get { "get " } else { "set " });
                self.print_expression(&prop.key);
                let func = match prop.value.as_ref() {
                    Expression::Function(func) => func,
                    _ => panic!("Expected accessor function"),
                };
                self.string("(");
                for (i, param) in func.params.iter().enumerate() {
                    if i > 0 {
                        self.string(", ");
                    }
                    self.string(&param.name);
                }
                self.string(") ");
                self.print_body(&func.body);
            }
        }
    }

    /// Callee and member-base position: wrap anything a reparse would bind
    /// differently.
    fn print_callee(&mut self, expr: &Expression) {
        let parens = matches!(
            expr,
            Expression::Function(_)
                | Expression::Object(_)
                | Expression::Number(_)
                | Expression::Assign(_)
                | Expression::Binary(_)
                | Expression::Logical(_)
                | Expression::Conditional(_)
                | Expression::Unary(_)
                | Expression::Sequence(_)
        );
        if parens {
            self.string("(");
            self.print_expression(expr);
            self.string(")");
        } else {
            self.print_expression(expr);
        }
    }

    /// Operand position of a unary/binary operator.
    fn print_operand(&mut self, expr: &Expression) {
        let parens = matches!(
            expr,
            Expression::Assign(_)
                | Expression::Binary(_)
                | Expression::Logical(_)
                | Expression::Conditional(_)
                | Expression::Sequence(_)
                | Expression::Function(_)
                | Expression::Object(_)
        );
        if parens {
            self.string("(");
            self.print_expression(expr);
            self.string(")");
        } else {
            self.print_expression(expr);
        }
    }

    fn print_arguments(&mut self, arguments: &[Expression]) {
        self.string("(");
        for (i, arg) in arguments.iter().enumerate() {
            if i > 0 {
                self.string(", ");
            }
            self.print_expression(arg);
        }
        self.string(")");
    }

    fn print_string_literal(&mut self, value: &str) {
        self.buf.push('\'');
        for c in value.chars() {
            match c {
                '\'' => self.buf.push_str("\\'"),
                '\\' => self.buf.push_str("\\\\"),
                '\n' => self.buf.push_str("\\n"),
                '\r' => self.buf.push_str("\\r"),
                '\t' => self.buf.push_str("\\t"),
                _ => self.buf.push(c),
            }
        }
        self.buf.push('\'');
    }
}

fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn assignment_op_str(op: AssignmentOperator) -> &'static str {
    match op {
        AssignmentOperator::Equals => " = ",
        AssignmentOperator::Add => " += ",
        AssignmentOperator::Subtract => " -= ",
        AssignmentOperator::Multiply => " *= ",
        AssignmentOperator::Divide => " /= ",
        AssignmentOperator::Remainder => " %= ",
        AssignmentOperator::And => " &= ",
        AssignmentOperator::Or => " |= ",
        AssignmentOperator::Xor => " ^= ",
        AssignmentOperator::ShiftLeft => " <<= ",
        AssignmentOperator::ShiftRightArithmetic => " >>= ",
        AssignmentOperator::ShiftRightLogical => " >>>= ",
    }
}

fn binary_op_str(op: BinaryOperator) -> &'static str {
    match op {
        BinaryOperator::Add => " + ",
        BinaryOperator::Subtract => " - ",
        BinaryOperator::Multiply => " * ",
        BinaryOperator::Divide => " / ",
        BinaryOperator::Remainder => " % ",
        BinaryOperator::EqEq => " == ",
        BinaryOperator::EqEqEq => " === ",
        BinaryOperator::NotEq => " != ",
        BinaryOperator::NotEqEq => " !== ",
        BinaryOperator::LessThan => " < ",
        BinaryOperator::LessThanOrEqual => " <= ",
        BinaryOperator::GreaterThan => " > ",
        BinaryOperator::GreaterThanOrEqual => " >= ",
        BinaryOperator::And => " & ",
        BinaryOperator::Or => " | ",
        BinaryOperator::Xor => " ^ ",
        BinaryOperator::ShiftLeft => " << ",
        BinaryOperator::ShiftRightArithmetic => " >> ",
        BinaryOperator::ShiftRightLogical => " >>> ",
        BinaryOperator::In => " in ",
        BinaryOperator::InstanceOf => " instanceof ",
    }
}
