// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Parenthesization rules for printing expressions.

use tugast_core::{is_expression, is_node, some_field, type_of, NodeType, Value};

use crate::node_path::NodePath;
use crate::path::Name;

/// Binary operator precedence tiers, loosest first.
const PRECEDENCE: &[&[&str]] = &[
    &["||"],
    &["&&"],
    &["|"],
    &["^"],
    &["&"],
    &["==", "===", "!=", "!=="],
    &["<", ">", "<=", ">=", "in", "instanceof"],
    &[">>", "<<", ">>>"],
    &["+", "-"],
    &["*", "/", "%"],
];

/// The precedence tier of a binary or logical operator.
pub fn precedence(operator: &str) -> Option<usize> {
    PRECEDENCE
        .iter()
        .position(|tier| tier.contains(&operator))
}

fn operator_precedence(node: &Value) -> Option<usize> {
    node.get_key("operator").as_str().and_then(precedence)
}

/// True if `value` is, or contains anywhere below it, a call expression.
pub fn contains_call_expression(value: &Value) -> bool {
    if NodeType::CallExpression.check(value) {
        return true;
    }
    match value {
        Value::Array(items) => items.to_vec().iter().any(contains_call_expression),
        _ if is_node(value) => some_field(value, |_, child| contains_call_expression(child)),
        _ => false,
    }
}

impl NodePath {
    /// True if the expression at this cursor must be wrapped in parentheses
    /// to print correctly in its position.
    ///
    /// With `assume_expression_context`, the expression is taken to stand
    /// somewhere a statement cannot start, which disables the
    /// statement-start ambiguity check.
    pub fn needs_parens(&self, assume_expression_context: bool) -> bool {
        let Some(mut parent_path) = self.parent_path() else {
            return false;
        };
        let node = self.value();
        if !is_expression(&node) {
            return false;
        }
        let Some(node_type) = type_of(&node) else {
            return false;
        };
        if node_type == NodeType::Identifier {
            return false;
        }

        while !is_node(&parent_path.value()) {
            match parent_path.parent_path() {
                Some(grand) => parent_path = grand,
                None => return false,
            }
        }
        let parent = parent_path.value();
        let Some(parent_type) = type_of(&parent) else {
            return false;
        };

        let name = self.name();
        let is_field = |field: &str| {
            name.as_ref().is_some_and(|n| n.is_key(field)) && parent.get_key(field).same(&node)
        };

        use NodeType::*;
        match node_type {
            UnaryExpression | SpreadElement => {
                return parent_type == MemberExpression && is_field("object");
            }

            BinaryExpression | LogicalExpression => {
                return match parent_type {
                    CallExpression => is_field("callee"),
                    UnaryExpression | SpreadElement => true,
                    MemberExpression => is_field("object"),
                    BinaryExpression | LogicalExpression => {
                        match (operator_precedence(&parent), operator_precedence(&node)) {
                            (Some(outer), Some(inner)) if outer > inner => true,
                            (Some(outer), Some(inner)) if outer == inner => {
                                name == Some(Name::from("right"))
                            }
                            _ => false,
                        }
                    }
                    _ => false,
                };
            }

            SequenceExpression => {
                return match parent_type {
                    ForStatement => false,
                    ExpressionStatement => !name.as_ref().is_some_and(|n| n.is_key("expression")),
                    _ => true,
                };
            }

            YieldExpression => {
                return matches!(
                    parent_type,
                    BinaryExpression
                        | LogicalExpression
                        | UnaryExpression
                        | SpreadElement
                        | CallExpression
                        | MemberExpression
                        | NewExpression
                        | ConditionalExpression
                        | YieldExpression
                );
            }

            Literal => {
                return parent_type == MemberExpression
                    && node.get_key("value").as_f64().is_some()
                    && is_field("object");
            }

            AssignmentExpression | ConditionalExpression => {
                return match parent_type {
                    UnaryExpression | SpreadElement | BinaryExpression | LogicalExpression => true,
                    CallExpression => is_field("callee"),
                    ConditionalExpression => is_field("test"),
                    MemberExpression => is_field("object"),
                    _ => false,
                };
            }

            _ => {
                if parent_type == NewExpression && is_field("callee") {
                    return contains_call_expression(&node);
                }
            }
        }

        !assume_expression_context && !self.can_be_first_in_statement() && self.first_in_statement()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tugast_core::builders::*;

    fn statement_expression(expression: Value) -> NodePath {
        NodePath::new(program(vec![expression_statement(expression)]))
            .get("body")
            .get(0)
            .get("expression")
    }

    #[test]
    fn test_precedence_tiers() {
        assert_eq!(precedence("||"), Some(0));
        assert_eq!(precedence("==="), Some(5));
        assert_eq!(precedence("instanceof"), Some(6));
        assert_eq!(precedence("*"), Some(9));
        assert_eq!(precedence("**"), None);
        assert!(precedence("+") < precedence("*"));
    }

    #[test]
    fn test_looser_binary_under_tighter_parent() {
        // (a + b) * c
        let expr = statement_expression(binary_expression(
            "*",
            binary_expression("+", identifier("a"), identifier("b")),
            identifier("c"),
        ));
        assert!(expr.get("left").needs_parens(false));

        // a * b + c
        let expr = statement_expression(binary_expression(
            "+",
            binary_expression("*", identifier("a"), identifier("b")),
            identifier("c"),
        ));
        assert!(!expr.get("left").needs_parens(false));
    }

    #[test]
    fn test_equal_precedence_right_operand() {
        // a - (b - c)
        let expr = statement_expression(binary_expression(
            "-",
            identifier("a"),
            binary_expression("-", identifier("b"), identifier("c")),
        ));
        assert!(expr.get("right").needs_parens(false));

        let expr = statement_expression(binary_expression(
            "-",
            binary_expression("-", identifier("a"), identifier("b")),
            identifier("c"),
        ));
        assert!(!expr.get("left").needs_parens(false));
    }

    #[test]
    fn test_unknown_operator_never_forces_parens() {
        let expr = statement_expression(binary_expression(
            "*",
            binary_expression("**", identifier("a"), identifier("b")),
            identifier("c"),
        ));
        assert!(!expr.get("left").needs_parens(false));
    }

    #[test]
    fn test_binary_as_callee_and_member_object() {
        let call = statement_expression(call_expression(
            logical_expression("||", identifier("a"), identifier("b")),
            vec![],
        ));
        assert!(call.get("callee").needs_parens(false));

        let member = statement_expression(member_expression(
            binary_expression("+", identifier("a"), identifier("b")),
            identifier("c"),
            false,
        ));
        assert!(member.get("object").needs_parens(false));
        assert!(!member.get("property").needs_parens(false));
    }

    #[test]
    fn test_unary_as_member_object() {
        let member = statement_expression(member_expression(
            unary_expression("typeof", identifier("a"), true),
            identifier("length"),
            false,
        ));
        assert!(member.get("object").needs_parens(false));

        let binary = statement_expression(binary_expression(
            "+",
            unary_expression("-", identifier("a"), true),
            identifier("b"),
        ));
        assert!(!binary.get("left").needs_parens(false));
    }

    #[test]
    fn test_binary_under_unary_and_spread() {
        // !(a || b)
        let negation = statement_expression(unary_expression(
            "!",
            logical_expression("||", identifier("a"), identifier("b")),
            true,
        ));
        assert!(negation.get("argument").needs_parens(false));

        // f(...(a + b))
        let call = statement_expression(call_expression(
            identifier("f"),
            vec![spread_element(binary_expression(
                "+",
                identifier("a"),
                identifier("b"),
            ))],
        ));
        assert!(call
            .get("arguments")
            .get(0)
            .get("argument")
            .needs_parens(false));
    }

    #[test]
    fn test_sequence_positions() {
        let statement = statement_expression(sequence_expression(vec![
            identifier("a"),
            identifier("b"),
        ]));
        assert!(!statement.needs_parens(false));

        let for_loop = NodePath::new(program(vec![for_statement(
            Some(sequence_expression(vec![identifier("a"), identifier("b")])),
            None,
            None,
            empty_statement(),
        )]));
        assert!(!for_loop.get("body").get(0).get("init").needs_parens(false));

        let argument = statement_expression(call_expression(
            identifier("f"),
            vec![sequence_expression(vec![identifier("a"), identifier("b")])],
        ));
        assert!(argument.get("arguments").get(0).needs_parens(false));
    }

    #[test]
    fn test_yield_under_operators() {
        let binary = statement_expression(binary_expression(
            "+",
            yield_expression(Some(identifier("a")), false),
            identifier("b"),
        ));
        assert!(binary.get("left").needs_parens(false));

        let statement = statement_expression(yield_expression(None, false));
        assert!(!statement.needs_parens(false));
    }

    #[test]
    fn test_yield_under_call_new_and_conditional() {
        // (yield a)()
        let call = statement_expression(call_expression(
            yield_expression(Some(identifier("a")), false),
            vec![],
        ));
        assert!(call.get("callee").needs_parens(false));

        // new (yield a)()
        let construct = statement_expression(new_expression(
            yield_expression(Some(identifier("a")), false),
            vec![],
        ));
        assert!(construct.get("callee").needs_parens(false));

        // (yield a) ? b : c
        let conditional = statement_expression(conditional_expression(
            yield_expression(Some(identifier("a")), false),
            identifier("b"),
            identifier("c"),
        ));
        assert!(conditional.get("test").needs_parens(false));

        // f(yield a)
        let argument = statement_expression(call_expression(
            identifier("f"),
            vec![yield_expression(Some(identifier("a")), false)],
        ));
        assert!(argument.get("arguments").get(0).needs_parens(false));
    }

    #[test]
    fn test_numeric_literal_member_object() {
        let member = statement_expression(member_expression(
            literal(1),
            identifier("toString"),
            false,
        ));
        assert!(member.get("object").needs_parens(false));

        let member = statement_expression(member_expression(
            literal("s"),
            identifier("length"),
            false,
        ));
        assert!(!member.get("object").needs_parens(false));
    }

    #[test]
    fn test_assignment_and_conditional_positions() {
        let binary = statement_expression(binary_expression(
            "+",
            assignment_expression("=", identifier("a"), identifier("b")),
            identifier("c"),
        ));
        assert!(binary.get("left").needs_parens(false));

        let conditional = statement_expression(conditional_expression(
            conditional_expression(identifier("a"), identifier("b"), identifier("c")),
            identifier("d"),
            identifier("e"),
        ));
        assert!(conditional.get("test").needs_parens(false));
        assert!(!conditional.get("consequent").needs_parens(false));

        let statement = statement_expression(assignment_expression(
            "=",
            identifier("a"),
            identifier("b"),
        ));
        assert!(!statement.needs_parens(false));
    }

    #[test]
    fn test_assignment_and_conditional_as_callee_or_object() {
        // (a = b)()
        let call = statement_expression(call_expression(
            assignment_expression("=", identifier("a"), identifier("b")),
            vec![],
        ));
        assert!(call.get("callee").needs_parens(false));

        // f(a = b)
        let argument = statement_expression(call_expression(
            identifier("f"),
            vec![assignment_expression("=", identifier("a"), identifier("b"))],
        ));
        assert!(!argument.get("arguments").get(0).needs_parens(false));

        // (a ? b : c).x
        let member = statement_expression(member_expression(
            conditional_expression(identifier("a"), identifier("b"), identifier("c")),
            identifier("x"),
            false,
        ));
        assert!(member.get("object").needs_parens(false));

        // (a ? b : c)()
        let call = statement_expression(call_expression(
            conditional_expression(identifier("a"), identifier("b"), identifier("c")),
            vec![],
        ));
        assert!(call.get("callee").needs_parens(false));
    }

    #[test]
    fn test_new_callee_containing_call() {
        // new (f().g)()
        let expr = statement_expression(new_expression(
            member_expression(
                call_expression(identifier("f"), vec![]),
                identifier("g"),
                false,
            ),
            vec![],
        ));
        assert!(expr.get("callee").needs_parens(false));

        let expr = statement_expression(new_expression(
            member_expression(identifier("f"), identifier("g"), false),
            vec![],
        ));
        assert!(!expr.get("callee").needs_parens(false));
    }

    #[test]
    fn test_statement_start_ambiguity() {
        let function = statement_expression(function_expression(
            None,
            vec![],
            block_statement(vec![]),
        ));
        assert!(function.needs_parens(false));
        assert!(!function.needs_parens(true));

        // ({}).x
        let member = statement_expression(member_expression(
            object_expression(vec![]),
            identifier("x"),
            false,
        ));
        assert!(member.get("object").needs_parens(false));

        // a = {}
        let assignment = statement_expression(assignment_expression(
            "=",
            identifier("a"),
            object_expression(vec![]),
        ));
        assert!(!assignment.get("right").needs_parens(false));
    }

    #[test]
    fn test_trivial_cases() {
        assert!(!NodePath::new(binary_expression("+", literal(1), literal(2))).needs_parens(false));
        let ident = statement_expression(binary_expression(
            "*",
            identifier("a"),
            identifier("b"),
        ));
        assert!(!ident.get("left").needs_parens(false));
        let statement = NodePath::new(program(vec![empty_statement()]))
            .get("body")
            .get(0);
        assert!(!statement.needs_parens(false));
    }

    #[test]
    fn test_contains_call_expression() {
        assert!(contains_call_expression(&call_expression(identifier("f"), vec![])));
        assert!(contains_call_expression(&array_expression(vec![
            identifier("a"),
            binary_expression("+", literal(1), call_expression(identifier("g"), vec![])),
        ])));
        assert!(!contains_call_expression(&member_expression(
            identifier("a"),
            identifier("b"),
            false
        )));
    }
}
