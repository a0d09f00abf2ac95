// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Node constructors.
//!
//! Each builder returns a fresh object with `"type"` first followed by the
//! type's fields in declaration order. Optional children take an `Option`
//! and are written as `null` when absent.

use crate::types::NodeType;
use crate::value::Value;

fn node<const N: usize>(t: NodeType, fields: [(&'static str, Value); N]) -> Value {
    Value::object(std::iter::once(("type", Value::from(t.name()))).chain(fields))
}

fn opt(value: Option<Value>) -> Value {
    value.unwrap_or_default()
}

pub fn identifier(name: &str) -> Value {
    node(NodeType::Identifier, [("name", Value::from(name))])
}

pub fn literal(value: impl Into<Value>) -> Value {
    node(NodeType::Literal, [("value", value.into())])
}

pub fn this_expression() -> Value {
    node(NodeType::ThisExpression, [])
}

pub fn program(body: Vec<Value>) -> Value {
    node(NodeType::Program, [("body", Value::from(body))])
}

pub fn block_statement(body: Vec<Value>) -> Value {
    node(NodeType::BlockStatement, [("body", Value::from(body))])
}

pub fn empty_statement() -> Value {
    node(NodeType::EmptyStatement, [])
}

pub fn debugger_statement() -> Value {
    node(NodeType::DebuggerStatement, [])
}

pub fn expression_statement(expression: Value) -> Value {
    node(NodeType::ExpressionStatement, [("expression", expression)])
}

pub fn if_statement(test: Value, consequent: Value, alternate: Option<Value>) -> Value {
    node(
        NodeType::IfStatement,
        [
            ("test", test),
            ("consequent", consequent),
            ("alternate", opt(alternate)),
        ],
    )
}

pub fn return_statement(argument: Option<Value>) -> Value {
    node(NodeType::ReturnStatement, [("argument", opt(argument))])
}

pub fn for_statement(
    init: Option<Value>,
    test: Option<Value>,
    update: Option<Value>,
    body: Value,
) -> Value {
    node(
        NodeType::ForStatement,
        [
            ("init", opt(init)),
            ("test", opt(test)),
            ("update", opt(update)),
            ("body", body),
        ],
    )
}

pub fn catch_clause(param: Value, body: Value) -> Value {
    node(NodeType::CatchClause, [("param", param), ("body", body)])
}

pub fn try_statement(block: Value, handler: Option<Value>, finalizer: Option<Value>) -> Value {
    node(
        NodeType::TryStatement,
        [
            ("block", block),
            ("handler", opt(handler)),
            ("finalizer", opt(finalizer)),
        ],
    )
}

pub fn variable_declaration(kind: &str, declarations: Vec<Value>) -> Value {
    node(
        NodeType::VariableDeclaration,
        [
            ("kind", Value::from(kind)),
            ("declarations", Value::from(declarations)),
        ],
    )
}

pub fn variable_declarator(id: Value, init: Option<Value>) -> Value {
    node(
        NodeType::VariableDeclarator,
        [("id", id), ("init", opt(init))],
    )
}

pub fn function_declaration(id: Value, params: Vec<Value>, body: Value) -> Value {
    node(
        NodeType::FunctionDeclaration,
        [
            ("id", id),
            ("params", Value::from(params)),
            ("body", body),
            ("generator", Value::Bool(false)),
            ("expression", Value::Bool(false)),
        ],
    )
}

pub fn function_expression(id: Option<Value>, params: Vec<Value>, body: Value) -> Value {
    node(
        NodeType::FunctionExpression,
        [
            ("id", opt(id)),
            ("params", Value::from(params)),
            ("body", body),
            ("generator", Value::Bool(false)),
            ("expression", Value::Bool(false)),
        ],
    )
}

pub fn arrow_function_expression(params: Vec<Value>, body: Value) -> Value {
    let expression = !NodeType::BlockStatement.check(&body);
    node(
        NodeType::ArrowFunctionExpression,
        [
            ("id", Value::Null),
            ("params", Value::from(params)),
            ("body", body),
            ("generator", Value::Bool(false)),
            ("expression", Value::Bool(expression)),
        ],
    )
}

pub fn array_expression(elements: Vec<Value>) -> Value {
    node(NodeType::ArrayExpression, [("elements", Value::from(elements))])
}

pub fn object_expression(properties: Vec<Value>) -> Value {
    node(
        NodeType::ObjectExpression,
        [("properties", Value::from(properties))],
    )
}

pub fn property(key: Value, value: Value) -> Value {
    node(
        NodeType::Property,
        [("kind", Value::from("init")), ("key", key), ("value", value)],
    )
}

pub fn sequence_expression(expressions: Vec<Value>) -> Value {
    node(
        NodeType::SequenceExpression,
        [("expressions", Value::from(expressions))],
    )
}

pub fn unary_expression(operator: &str, argument: Value, prefix: bool) -> Value {
    node(
        NodeType::UnaryExpression,
        [
            ("operator", Value::from(operator)),
            ("argument", argument),
            ("prefix", Value::Bool(prefix)),
        ],
    )
}

pub fn update_expression(operator: &str, argument: Value, prefix: bool) -> Value {
    node(
        NodeType::UpdateExpression,
        [
            ("operator", Value::from(operator)),
            ("argument", argument),
            ("prefix", Value::Bool(prefix)),
        ],
    )
}

fn operation(t: NodeType, operator: &str, left: Value, right: Value) -> Value {
    node(
        t,
        [
            ("operator", Value::from(operator)),
            ("left", left),
            ("right", right),
        ],
    )
}

pub fn binary_expression(operator: &str, left: Value, right: Value) -> Value {
    operation(NodeType::BinaryExpression, operator, left, right)
}

pub fn logical_expression(operator: &str, left: Value, right: Value) -> Value {
    operation(NodeType::LogicalExpression, operator, left, right)
}

pub fn assignment_expression(operator: &str, left: Value, right: Value) -> Value {
    operation(NodeType::AssignmentExpression, operator, left, right)
}

pub fn conditional_expression(test: Value, consequent: Value, alternate: Value) -> Value {
    node(
        NodeType::ConditionalExpression,
        [
            ("test", test),
            ("consequent", consequent),
            ("alternate", alternate),
        ],
    )
}

pub fn call_expression(callee: Value, arguments: Vec<Value>) -> Value {
    node(
        NodeType::CallExpression,
        [("callee", callee), ("arguments", Value::from(arguments))],
    )
}

pub fn new_expression(callee: Value, arguments: Vec<Value>) -> Value {
    node(
        NodeType::NewExpression,
        [("callee", callee), ("arguments", Value::from(arguments))],
    )
}

pub fn member_expression(object: Value, property: Value, computed: bool) -> Value {
    node(
        NodeType::MemberExpression,
        [
            ("object", object),
            ("property", property),
            ("computed", Value::Bool(computed)),
        ],
    )
}

pub fn spread_element(argument: Value) -> Value {
    node(NodeType::SpreadElement, [("argument", argument)])
}

pub fn yield_expression(argument: Option<Value>, delegate: bool) -> Value {
    node(
        NodeType::YieldExpression,
        [("argument", opt(argument)), ("delegate", Value::Bool(delegate))],
    )
}

pub fn block_comment(value: &str) -> Value {
    node(
        NodeType::Block,
        [
            ("value", Value::from(value)),
            ("leading", Value::Bool(true)),
            ("trailing", Value::Bool(false)),
        ],
    )
}

pub fn line_comment(value: &str) -> Value {
    node(
        NodeType::Line,
        [
            ("value", Value::from(value)),
            ("leading", Value::Bool(true)),
            ("trailing", Value::Bool(false)),
        ],
    )
}
