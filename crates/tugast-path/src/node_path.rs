// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Syntax-aware cursors.
//!
//! A [`NodePath`] is a [`Path`] that also knows about syntax tree nodes: the
//! node enclosing its slot, the cursor of the parent node (skipping the
//! arrays and plain records in between), and the lexical scope it sits in.
//! These views are computed lazily, cached per cursor and dropped whenever
//! the cursor's slot is replaced.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;
use tugast_core::{builders, is_node, NodeType, Value};

use crate::error::PathError;
use crate::path::{Name, Path, PathViews, WeakPath};
use crate::scope::Scope;

/// A cursor with node, parent and scope views.
pub type NodePath = Path<NodeViews>;

/// Lazily computed views of a [`NodePath`].
///
/// Each slot is `None` until computed; the inner `Option` is the answer.
#[derive(Default)]
pub struct NodeViews {
    node: RefCell<Option<Option<Value>>>,
    parent: RefCell<Option<Option<WeakPath<NodeViews>>>>,
    scope: RefCell<Option<Option<Rc<Scope>>>>,
}

impl PathViews for NodeViews {
    fn clear(&self) {
        self.node.borrow_mut().take();
        self.parent.borrow_mut().take();
        self.scope.borrow_mut().take();
    }
}

fn cached<T: Clone>(slot: &RefCell<Option<T>>, compute: impl FnOnce() -> T) -> T {
    if let Some(value) = slot.borrow().as_ref() {
        return value.clone();
    }
    let value = compute();
    *slot.borrow_mut() = Some(value.clone());
    value
}

/// Climbs from `start` to the first cursor whose value is a node.
fn nearest_node_path(start: Option<NodePath>) -> Option<NodePath> {
    let mut current = start;
    while let Some(path) = current {
        if is_node(&path.value()) {
            return Some(path);
        }
        current = path.parent_path();
    }
    None
}

fn name_is_key(name: &Option<Name>, key: &str) -> bool {
    name.as_ref().is_some_and(|n| n.is_key(key))
}

fn name_is_index(name: &Option<Name>, index: usize) -> bool {
    name.as_ref().is_some_and(|n| n.is_index(index))
}

impl NodePath {
    /// The node enclosing this slot: the value itself if it is a node,
    /// otherwise the nearest node above it.
    pub fn node(&self) -> Option<Value> {
        cached(&self.views().node, || {
            let value = self.value();
            if is_node(&value) {
                return Some(value);
            }
            self.parent_path().and_then(|pp| pp.node())
        })
    }

    /// The cursor of the nearest node strictly containing this node.
    ///
    /// For a non-node slot (an array or a field value), the first node above
    /// it is this slot's own node, so the result is the node above that.
    pub fn parent(&self) -> Option<NodePath> {
        // Held weakly: a strong handle here would let the tree own itself.
        if let Some(cached) = self.views().parent.borrow().as_ref() {
            match cached {
                None => return None,
                Some(weak) => {
                    if let Some(parent) = weak.upgrade() {
                        return Some(parent);
                    }
                }
            }
        }
        let mut start = self.parent_path();
        if !is_node(&self.value()) {
            start = nearest_node_path(start).and_then(|p| p.parent_path());
        }
        let parent = nearest_node_path(start);
        *self.views().parent.borrow_mut() = Some(parent.as_ref().map(Path::downgrade));
        parent
    }

    /// The innermost scope enclosing this slot.
    ///
    /// A node that establishes a scope is considered to be inside it.
    pub fn scope(&self) -> Option<Rc<Scope>> {
        cached(&self.views().scope, || {
            let enclosing = self.parent_path().and_then(|pp| pp.scope());
            let value = self.value();
            if is_node(&value) && Scope::is_established_by(&value) {
                Some(Scope::new(self, enclosing))
            } else {
                enclosing
            }
        })
    }

    // ------------------------------------------------------------------------
    // Statement position
    // ------------------------------------------------------------------------

    /// False for nodes that would be misread at the start of a statement
    /// (a function expression reads as a declaration, an object literal as a
    /// block).
    pub fn can_be_first_in_statement(&self) -> bool {
        self.node().is_none_or(|node| {
            !(NodeType::FunctionExpression.check(&node) || NodeType::ObjectExpression.check(&node))
        })
    }

    /// True if this node's source text would start its enclosing statement.
    pub fn first_in_statement(&self) -> bool {
        let mut path = self.clone();
        while let Some(parent) = path.parent() {
            let node = path.value();
            let parent_node = parent.value();
            let name = path.name();
            let container = path.parent_path().and_then(|pp| pp.name());

            if NodeType::BlockStatement.check(&parent_node)
                && name_is_key(&container, "body")
                && name_is_index(&name, 0)
            {
                assert!(
                    parent_node.get_key("body").get_index(0).same(&node),
                    "block body slot does not hold the node"
                );
                return true;
            }

            if NodeType::ExpressionStatement.check(&parent_node) && name_is_key(&name, "expression")
            {
                assert!(
                    parent_node.get_key("expression").same(&node),
                    "statement expression slot does not hold the node"
                );
                return true;
            }

            let leading = (NodeType::SequenceExpression.check(&parent_node)
                && name_is_key(&container, "expressions")
                && name_is_index(&name, 0))
                || (NodeType::CallExpression.check(&parent_node) && name_is_key(&name, "callee"))
                || (NodeType::MemberExpression.check(&parent_node) && name_is_key(&name, "object"))
                || (NodeType::ConditionalExpression.check(&parent_node)
                    && name_is_key(&name, "test"))
                || ((NodeType::BinaryExpression.check(&parent_node)
                    || NodeType::LogicalExpression.check(&parent_node))
                    && name_is_key(&name, "left"))
                || ((NodeType::UnaryExpression.check(&parent_node)
                    || NodeType::UpdateExpression.check(&parent_node))
                    && parent_node.get_key("prefix").as_bool() == Some(false)
                    && name_is_key(&name, "argument"));

            if !leading {
                return false;
            }
            path = parent;
        }
        true
    }

    // ------------------------------------------------------------------------
    // Pruning
    // ------------------------------------------------------------------------

    /// Removes this node and tidies up the statement it leaves behind.
    ///
    /// Returns the cursor of the nearest remaining ancestor node.
    pub fn prune(&self) -> Result<Option<NodePath>, PathError> {
        let remaining = self.parent();
        self.replace(Vec::new())?;
        match remaining {
            Some(remaining) => clean_up_after_prune(remaining),
            None => Ok(None),
        }
    }
}

fn clean_up_after_prune(remaining: NodePath) -> Result<Option<NodePath>, PathError> {
    let node = remaining.value();

    if NodeType::VariableDeclaration.check(&node) {
        let declarations = node.get_key("declarations");
        if declarations.as_array().is_none_or(|d| d.is_empty()) {
            trace!("pruning empty variable declaration");
            return remaining.prune();
        }
    } else if NodeType::ExpressionStatement.check(&node) {
        if node.get_key("expression").is_null() {
            trace!("pruning empty expression statement");
            return remaining.prune();
        }
    } else if NodeType::IfStatement.check(&node) {
        clean_up_if_statement(&remaining)?;
    }

    Ok(Some(remaining))
}

fn clean_up_if_statement(if_statement: &NodePath) -> Result<(), PathError> {
    let node = if_statement.value();
    let test = node.get_key("test");
    let consequent = node.get_key("consequent");
    let alternate = node.get_key("alternate");

    if !consequent.is_null() {
        return Ok(());
    }

    if alternate.is_null() {
        trace!("if statement lost both branches; keeping its test");
        if_statement.replace_with(builders::expression_statement(test))?;
        return Ok(());
    }

    trace!("if statement lost its consequent; inverting test");
    let negated = if NodeType::UnaryExpression.check(&test)
        && test.get_key("operator").as_str() == Some("!")
    {
        test.get_key("argument")
    } else {
        builders::unary_expression("!", test, true)
    };
    if_statement.get("test").replace_with(negated)?;
    if_statement.get("consequent").replace_with(alternate)?;
    if_statement.get("alternate").remove()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tugast_core::builders::*;

    fn expression_program(expression: Value) -> NodePath {
        NodePath::new(program(vec![expression_statement(expression)]))
    }

    #[test]
    fn test_node_of_non_node_slot_is_enclosing_node() {
        let root = expression_program(call_expression(identifier("f"), vec![literal(1)]));
        let call = root.get_in(["body".into(), 0.into(), Name::from("expression")]);
        let arguments = call.get("arguments");
        assert!(arguments.node().unwrap().same(&call.value()));
        assert!(call.node().unwrap().same(&call.value()));
    }

    #[test]
    fn test_parent_skips_intermediate_slots() {
        let root = expression_program(call_expression(identifier("f"), vec![literal(1)]));
        let statement = root.get("body").get(0);
        let call = statement.get("expression");
        let argument = call.get("arguments").get(0);

        assert!(argument.parent().unwrap().ptr_eq(&call));
        assert!(call.parent().unwrap().ptr_eq(&statement));
        assert!(statement.parent().unwrap().ptr_eq(&root));
        assert!(root.parent().is_none());
        // A non-node slot's parent is the node above its own node.
        assert!(call.get("arguments").parent().unwrap().ptr_eq(&statement));
    }

    #[test]
    fn test_views_cleared_on_replace() {
        let root = expression_program(identifier("a"));
        let expr = root.get("body").get(0).get("expression");
        assert!(NodeType::Identifier.check(&expr.node().unwrap()));
        expr.replace_with(this_expression()).unwrap();
        assert!(NodeType::ThisExpression.check(&expr.node().unwrap()));
    }

    #[test]
    fn test_scope_chain() {
        let root = NodePath::new(program(vec![function_declaration(
            identifier("f"),
            vec![identifier("x")],
            block_statement(vec![return_statement(Some(identifier("x")))]),
        )]));
        let function = root.get("body").get(0);
        let returned = function
            .get("body")
            .get("body")
            .get(0)
            .get("argument");

        let program_scope = root.scope().unwrap();
        assert!(program_scope.is_global());
        let function_scope = returned.scope().unwrap();
        assert!(function_scope.node().same(&function.value()));
        assert!(Rc::ptr_eq(function_scope.parent().unwrap(), &program_scope));
        assert!(Rc::ptr_eq(&function.scope().unwrap(), &function_scope));
        assert!(Rc::ptr_eq(&returned.scope().unwrap(), &function_scope));
    }

    #[test]
    fn test_scope_is_cached_across_navigation() {
        let root = NodePath::new(program(vec![function_declaration(
            identifier("f"),
            vec![],
            block_statement(vec![]),
        )]));
        let first = root.get("body").get(0).get("body").scope().unwrap();
        let second = root.get("body").get(0).get("body").scope().unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        let established_by = first.path().unwrap();
        assert!(established_by.ptr_eq(&root.get("body").get(0)));
    }

    #[test]
    fn test_parent_view_survives_dropped_handles() {
        let root = expression_program(identifier("a"));
        let parent = root.get("body").get(0).get("expression").parent().unwrap();
        drop(parent);
        let again = root.get("body").get(0).get("expression").parent().unwrap();
        assert!(again.ptr_eq(&root.get("body").get(0)));
    }

    #[test]
    fn test_can_be_first_in_statement() {
        let root = expression_program(object_expression(vec![]));
        let object = root.get("body").get(0).get("expression");
        assert!(!object.can_be_first_in_statement());
        let ident = NodePath::new(identifier("a"));
        assert!(ident.can_be_first_in_statement());
    }

    #[test]
    fn test_first_in_statement_through_leading_positions() {
        // f().x + 1;
        let member = member_expression(
            call_expression(identifier("f"), vec![]),
            identifier("x"),
            false,
        );
        let root = expression_program(binary_expression("+", member, literal(1)));
        let binary = root.get("body").get(0).get("expression");
        let callee = binary.get("left").get("object").get("callee");
        assert!(callee.first_in_statement());
        assert!(!binary.get("right").first_in_statement());
        assert!(!binary.get("left").get("property").first_in_statement());
    }

    #[test]
    fn test_first_in_statement_through_postfix_update() {
        // ({}).x++;
        let postfix = expression_program(update_expression(
            "++",
            member_expression(object_expression(vec![]), identifier("x"), false),
            false,
        ));
        let object = postfix
            .get("body")
            .get(0)
            .get("expression")
            .get("argument")
            .get("object");
        assert!(object.first_in_statement());
        assert!(object.needs_parens(false));

        // ++({}).x;
        let prefix = expression_program(update_expression(
            "++",
            member_expression(object_expression(vec![]), identifier("x"), false),
            true,
        ));
        let object = prefix
            .get("body")
            .get(0)
            .get("expression")
            .get("argument")
            .get("object");
        assert!(!object.first_in_statement());
        assert!(!object.needs_parens(false));
    }

    #[test]
    fn test_first_in_statement_at_block_start() {
        let root = NodePath::new(block_statement(vec![
            expression_statement(identifier("a")),
            expression_statement(identifier("b")),
        ]));
        assert!(root.get("body").get(0).first_in_statement());
        assert!(!root.get("body").get(1).first_in_statement());
    }

    #[test]
    fn test_prune_sole_declarator_removes_declaration() {
        let root = NodePath::new(program(vec![
            variable_declaration("var", vec![variable_declarator(identifier("a"), None)]),
            expression_statement(identifier("b")),
        ]));
        let declarator = root.get("body").get(0).get("declarations").get(0);
        let remaining = declarator.prune().unwrap().unwrap();
        assert!(remaining.ptr_eq(&root));
        assert_eq!(root.get("body").get("length").value(), Value::from(1));
        assert!(NodeType::ExpressionStatement.check(&root.get("body").get(0).value()));
    }

    #[test]
    fn test_prune_keeps_declaration_with_other_declarators() {
        let root = NodePath::new(program(vec![variable_declaration(
            "var",
            vec![
                variable_declarator(identifier("a"), None),
                variable_declarator(identifier("b"), None),
            ],
        )]));
        let declaration = root.get("body").get(0);
        let remaining = declaration
            .get("declarations")
            .get(0)
            .prune()
            .unwrap()
            .unwrap();
        assert!(remaining.ptr_eq(&declaration));
        assert_eq!(
            declaration.get("declarations").get("length").value(),
            Value::from(1)
        );
    }

    #[test]
    fn test_prune_expression_removes_statement() {
        let root = expression_program(identifier("a"));
        let expression = root.get("body").get(0).get("expression");
        let remaining = expression.prune().unwrap().unwrap();
        assert!(remaining.ptr_eq(&root));
        assert_eq!(root.get("body").get("length").value(), Value::from(0));
    }

    #[test]
    fn test_prune_consequent_without_alternate() {
        let root = NodePath::new(program(vec![if_statement(
            identifier("x"),
            block_statement(vec![]),
            None,
        )]));
        root.get("body").get(0).get("consequent").prune().unwrap();
        let statement = root.get("body").get(0).value();
        assert!(NodeType::ExpressionStatement.check(&statement));
        assert_eq!(statement.get_key("expression"), identifier("x"));
    }

    #[test]
    fn test_prune_consequent_with_alternate_negates_test() {
        let root = NodePath::new(program(vec![if_statement(
            identifier("x"),
            block_statement(vec![]),
            Some(expression_statement(identifier("y"))),
        )]));
        let statement = root.get("body").get(0);
        statement.get("consequent").prune().unwrap();

        let node = statement.value();
        assert_eq!(node.get_key("test"), unary_expression("!", identifier("x"), true));
        assert_eq!(
            node.get_key("consequent"),
            expression_statement(identifier("y"))
        );
        assert!(!node.as_object().unwrap().contains_key("alternate"));
    }

    #[test]
    fn test_prune_unwraps_existing_negation() {
        let root = NodePath::new(program(vec![if_statement(
            unary_expression("!", identifier("x"), true),
            block_statement(vec![]),
            Some(block_statement(vec![])),
        )]));
        let statement = root.get("body").get(0);
        statement.get("consequent").prune().unwrap();
        assert_eq!(statement.value().get_key("test"), identifier("x"));
    }
}
