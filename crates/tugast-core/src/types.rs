// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Node type vocabulary and hierarchy.
//!
//! The vocabulary is a closed set of ESTree-style type names. Abstract types
//! (`Node`, `Expression`, `Statement`, ...) never appear as a node's `"type"`
//! but take part in the hierarchy, so a visitor handler declared for
//! `Expression` can serve every concrete expression.
//!
//! # Hierarchy
//!
//! Each type lists its direct bases. [`NodeType::supertype_list`] linearizes
//! them breadth-first starting from the type itself; when a base is reachable
//! along several routes only its last occurrence is kept, so shared ancestors
//! sort after everything that derives from them.
//!
//! # Fields
//!
//! [`NodeType::fields`] enumerates inherited fields first (in base order) and
//! then the type's own fields, some with a default used to fill in missing
//! slots during traversal.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::CoreError;
use crate::value::Value;

macro_rules! node_types {
    (
        $(
            $(#[$meta:meta])*
            $variant:ident
        ),* $(,)?
    ) => {
        /// A node type name, abstract or concrete.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeType {
            $(
                $(#[$meta])*
                $variant,
            )*
        }

        impl NodeType {
            /// Every type in the vocabulary, in declaration order.
            pub const ALL: &'static [NodeType] = &[$(NodeType::$variant,)*];

            /// The type name as it appears in a node's `"type"` field.
            pub fn name(self) -> &'static str {
                match self {
                    $(NodeType::$variant => stringify!($variant),)*
                }
            }
        }
    };
}

node_types! {
    // Abstract
    Printable,
    Node,
    Comment,
    Statement,
    Expression,
    Declaration,
    Pattern,
    Function,

    // Program and statements
    Program,
    BlockStatement,
    EmptyStatement,
    ExpressionStatement,
    IfStatement,
    LabeledStatement,
    BreakStatement,
    ContinueStatement,
    SwitchStatement,
    SwitchCase,
    ReturnStatement,
    ThrowStatement,
    TryStatement,
    CatchClause,
    WhileStatement,
    DoWhileStatement,
    ForStatement,
    ForInStatement,
    DebuggerStatement,

    // Declarations
    FunctionDeclaration,
    VariableDeclaration,
    VariableDeclarator,

    // Expressions
    Identifier,
    Literal,
    ThisExpression,
    ArrayExpression,
    ObjectExpression,
    Property,
    FunctionExpression,
    ArrowFunctionExpression,
    SequenceExpression,
    UnaryExpression,
    UpdateExpression,
    BinaryExpression,
    LogicalExpression,
    AssignmentExpression,
    ConditionalExpression,
    CallExpression,
    NewExpression,
    MemberExpression,
    SpreadElement,
    YieldExpression,

    // Comments
    /// A `/* ... */` comment.
    Block,
    /// A `// ...` comment.
    Line,
}

/// Default value for a field that is missing from a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Null,
    Bool(bool),
    EmptyArray,
    Str(&'static str),
}

impl FieldDefault {
    pub fn to_value(self) -> Value {
        match self {
            FieldDefault::Null => Value::Null,
            FieldDefault::Bool(b) => Value::Bool(b),
            FieldDefault::EmptyArray => Value::array([]),
            FieldDefault::Str(s) => Value::from(s),
        }
    }
}

/// A declared field of a node type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDef {
    pub name: &'static str,
    pub default: Option<FieldDefault>,
}

macro_rules! field {
    ($name:literal) => {
        FieldDef {
            name: $name,
            default: None,
        }
    };
}

macro_rules! defaulted {
    ($name:literal, $default:expr) => {
        FieldDef {
            name: $name,
            default: Some($default),
        }
    };
}

impl NodeType {
    /// Looks a type up by name.
    pub fn from_name(name: &str) -> Option<NodeType> {
        NodeType::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// Types that never appear as a concrete node's `"type"`.
    pub fn is_abstract(self) -> bool {
        use NodeType::*;
        matches!(
            self,
            Printable | Node | Comment | Statement | Expression | Declaration | Pattern | Function
        )
    }

    /// Direct bases, in declaration order.
    pub fn bases(self) -> &'static [NodeType] {
        use NodeType::*;
        match self {
            Printable => &[],
            Node | Comment => &[Printable],
            Statement | Expression | Pattern | Function => &[Node],
            Declaration => &[Statement],

            Program | SwitchCase | CatchClause | VariableDeclarator | Property | SpreadElement => {
                &[Node]
            }
            BlockStatement | EmptyStatement | ExpressionStatement | IfStatement
            | LabeledStatement | BreakStatement | ContinueStatement | SwitchStatement
            | ReturnStatement | ThrowStatement | TryStatement | WhileStatement
            | DoWhileStatement | ForStatement | ForInStatement | DebuggerStatement => &[Statement],

            FunctionDeclaration => &[Function, Declaration],
            VariableDeclaration => &[Declaration],

            Identifier => &[Node, Expression, Pattern],
            FunctionExpression | ArrowFunctionExpression => &[Function, Expression],
            Literal | ThisExpression | ArrayExpression | ObjectExpression | SequenceExpression
            | UnaryExpression | UpdateExpression | BinaryExpression | LogicalExpression
            | AssignmentExpression | ConditionalExpression | CallExpression | NewExpression
            | MemberExpression | YieldExpression => &[Expression],

            Block | Line => &[Comment],
        }
    }

    fn own_fields(self) -> &'static [FieldDef] {
        use FieldDefault as D;
        use NodeType::*;
        match self {
            Printable | Statement | Expression | Declaration | Pattern => &[],
            Node => &[field!("type")],
            Comment => &[
                field!("value"),
                defaulted!("leading", D::Bool(true)),
                defaulted!("trailing", D::Bool(false)),
            ],
            Function => &[
                defaulted!("id", D::Null),
                field!("params"),
                field!("body"),
                defaulted!("generator", D::Bool(false)),
                defaulted!("expression", D::Bool(false)),
            ],

            Program | BlockStatement => &[field!("body")],
            EmptyStatement | DebuggerStatement | ThisExpression => &[],
            ExpressionStatement => &[field!("expression")],
            IfStatement => &[
                field!("test"),
                field!("consequent"),
                defaulted!("alternate", D::Null),
            ],
            LabeledStatement => &[field!("label"), field!("body")],
            BreakStatement | ContinueStatement => &[defaulted!("label", D::Null)],
            SwitchStatement => &[
                field!("discriminant"),
                field!("cases"),
                defaulted!("lexical", D::Bool(false)),
            ],
            SwitchCase => &[field!("test"), field!("consequent")],
            ReturnStatement => &[defaulted!("argument", D::Null)],
            ThrowStatement => &[field!("argument")],
            TryStatement => &[
                field!("block"),
                defaulted!("handler", D::Null),
                defaulted!("finalizer", D::Null),
            ],
            CatchClause => &[field!("param"), field!("body")],
            WhileStatement => &[field!("test"), field!("body")],
            DoWhileStatement => &[field!("body"), field!("test")],
            ForStatement => &[
                field!("init"),
                field!("test"),
                field!("update"),
                field!("body"),
            ],
            ForInStatement => &[field!("left"), field!("right"), field!("body")],

            FunctionDeclaration => &[field!("id")],
            VariableDeclaration => &[defaulted!("kind", D::Str("var")), field!("declarations")],
            VariableDeclarator => &[field!("id"), defaulted!("init", D::Null)],

            Identifier => &[field!("name")],
            Literal => &[field!("value")],
            ArrayExpression => &[field!("elements")],
            ObjectExpression => &[field!("properties")],
            Property => &[defaulted!("kind", D::Str("init")), field!("key"), field!("value")],
            FunctionExpression | ArrowFunctionExpression => &[],
            SequenceExpression => &[field!("expressions")],
            UnaryExpression => &[
                field!("operator"),
                field!("argument"),
                defaulted!("prefix", D::Bool(true)),
            ],
            UpdateExpression => &[field!("operator"), field!("argument"), field!("prefix")],
            BinaryExpression | LogicalExpression | AssignmentExpression => {
                &[field!("operator"), field!("left"), field!("right")]
            }
            ConditionalExpression => &[field!("test"), field!("consequent"), field!("alternate")],
            CallExpression => &[field!("callee"), field!("arguments")],
            NewExpression => &[field!("callee"), defaulted!("arguments", D::EmptyArray)],
            MemberExpression => &[
                field!("object"),
                field!("property"),
                defaulted!("computed", D::Bool(false)),
            ],
            SpreadElement => &[field!("argument")],
            YieldExpression => &[
                defaulted!("argument", D::Null),
                defaulted!("delegate", D::Bool(false)),
            ],

            Block | Line => &[],
        }
    }

    /// This type followed by all of its supertypes, nearest first.
    pub fn supertype_list(self) -> &'static [NodeType] {
        static TABLE: OnceLock<Vec<Vec<NodeType>>> = OnceLock::new();
        let table = TABLE.get_or_init(|| NodeType::ALL.iter().map(|t| linearize(*t)).collect());
        &table[self as usize]
    }

    /// True when `self` is `other` or derives from it.
    pub fn is_subtype_of(self, other: NodeType) -> bool {
        self.supertype_list().contains(&other)
    }

    /// All fields, inherited first.
    pub fn fields(self) -> &'static [FieldDef] {
        static TABLE: OnceLock<Vec<Vec<FieldDef>>> = OnceLock::new();
        let table = TABLE.get_or_init(|| {
            NodeType::ALL
                .iter()
                .map(|t| {
                    let mut fields = Vec::new();
                    collect_fields(*t, &mut fields);
                    fields
                })
                .collect()
        });
        &table[self as usize]
    }

    pub fn field_names(self) -> Vec<&'static str> {
        self.fields().iter().map(|f| f.name).collect()
    }

    pub fn field(self, name: &str) -> Option<FieldDef> {
        self.fields().iter().copied().find(|f| f.name == name)
    }

    /// True when `value` is a node whose type is `self` or derives from it.
    pub fn check(self, value: &Value) -> bool {
        type_of(value).is_some_and(|t| t.is_subtype_of(self))
    }
}

fn linearize(start: NodeType) -> Vec<NodeType> {
    let mut list: Vec<Option<NodeType>> = vec![Some(start)];
    let mut last_seen: HashMap<NodeType, usize> = HashMap::new();
    let mut pos = 0;
    while pos < list.len() {
        if let Some(current) = list[pos] {
            if let Some(previous) = last_seen.insert(current, pos) {
                list[previous] = None;
            }
            list.extend(current.bases().iter().copied().map(Some));
        }
        pos += 1;
    }
    list.into_iter().flatten().collect()
}

fn collect_fields(t: NodeType, out: &mut Vec<FieldDef>) {
    for base in t.bases() {
        collect_fields(*base, out);
    }
    for own in t.own_fields() {
        match out.iter_mut().find(|f| f.name == own.name) {
            Some(existing) => *existing = *own,
            None => out.push(*own),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NodeType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::from_name(s).ok_or_else(|| CoreError::UnknownType {
            name: s.to_string(),
        })
    }
}

// ============================================================================
// Value predicates
// ============================================================================

/// The declared type of a value, if it is an object with a known `"type"`.
pub fn type_of(value: &Value) -> Option<NodeType> {
    value.type_name().and_then(|name| NodeType::from_name(&name))
}

/// True for syntax tree nodes. Comments are printable but are not nodes.
pub fn is_node(value: &Value) -> bool {
    NodeType::Node.check(value)
}

pub fn is_expression(value: &Value) -> bool {
    NodeType::Expression.check(value)
}

pub fn is_statement(value: &Value) -> bool {
    NodeType::Statement.check(value)
}

/// Field names to traverse for an object value.
///
/// Typed objects use their declared fields; plain records (no `"type"` key)
/// use their own keys. An object carrying an unrecognized `"type"` is an
/// error.
pub fn field_names_of(value: &Value) -> Result<Vec<String>, CoreError> {
    let Some(object) = value.as_object() else {
        return Ok(Vec::new());
    };
    if let Some(t) = type_of(value) {
        return Ok(t.field_names().into_iter().map(str::to_string).collect());
    }
    if let Some(type_value) = object.borrow().get("type") {
        return Err(CoreError::UnknownType {
            name: type_value.to_string(),
        });
    }
    Ok(object.keys())
}

/// The declared default for a missing field of `value`, if any.
pub fn field_default(value: &Value, field_name: &str) -> Option<Value> {
    type_of(value)
        .and_then(|t| t.field(field_name))
        .and_then(|f| f.default)
        .map(FieldDefault::to_value)
}

/// The field's value, falling back to its declared default.
pub fn field_value(value: &Value, field_name: &str) -> Value {
    if let Some(object) = value.as_object() {
        if object.contains_key(field_name) {
            return object.get(field_name);
        }
    }
    field_default(value, field_name).unwrap_or_default()
}

/// True if `predicate` holds for any declared field of a node.
pub fn some_field(value: &Value, mut predicate: impl FnMut(&str, &Value) -> bool) -> bool {
    let Some(t) = type_of(value) else {
        return false;
    };
    t.fields()
        .iter()
        .any(|f| predicate(f.name, &field_value(value, f.name)))
}

/// Maps every type to the nearest type in `candidates` along its supertype
/// list. Types with no candidate ancestor are absent from the table.
pub fn supertype_lookup_table(candidates: &HashSet<NodeType>) -> HashMap<NodeType, NodeType> {
    NodeType::ALL
        .iter()
        .filter_map(|t| {
            t.supertype_list()
                .iter()
                .find(|s| candidates.contains(s))
                .map(|s| (*t, *s))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_names_round_trip() {
        for t in NodeType::ALL {
            assert_eq!(NodeType::from_name(t.name()), Some(*t));
        }
        assert_eq!("Identifier".parse::<NodeType>(), Ok(NodeType::Identifier));
        assert!("Nope".parse::<NodeType>().is_err());
    }

    #[test]
    fn test_supertype_list_is_nearest_first() {
        assert_eq!(
            NodeType::FunctionDeclaration.supertype_list(),
            &[
                NodeType::FunctionDeclaration,
                NodeType::Function,
                NodeType::Declaration,
                NodeType::Statement,
                NodeType::Node,
                NodeType::Printable,
            ]
        );
    }

    #[test]
    fn test_shared_base_sorts_after_derived_routes() {
        // Identifier lists Node directly and through Expression/Pattern; Node
        // must come after both.
        let list = NodeType::Identifier.supertype_list();
        let node_pos = list.iter().position(|t| *t == NodeType::Node).unwrap();
        let expr_pos = list.iter().position(|t| *t == NodeType::Expression).unwrap();
        let pat_pos = list.iter().position(|t| *t == NodeType::Pattern).unwrap();
        assert!(node_pos > expr_pos);
        assert!(node_pos > pat_pos);
        assert_eq!(list.iter().filter(|t| **t == NodeType::Node).count(), 1);
    }

    #[test]
    fn test_fields_inherit_then_override() {
        let names = NodeType::FunctionDeclaration.field_names();
        assert_eq!(
            names,
            vec!["type", "id", "params", "body", "generator", "expression"]
        );
        assert_eq!(NodeType::FunctionDeclaration.field("id").unwrap().default, None);
        assert_eq!(
            NodeType::FunctionExpression.field("id").unwrap().default,
            Some(FieldDefault::Null)
        );
    }

    #[test]
    fn test_comments_are_not_nodes() {
        let comment = Value::from(json!({"type": "Line", "value": " hi"}));
        assert!(!is_node(&comment));
        assert!(NodeType::Comment.check(&comment));
        assert!(is_node(&Value::from(json!({"type": "Identifier", "name": "x"}))));
    }

    #[test]
    fn test_field_names_of() {
        let plain = Value::from(json!({"b": 1, "a": 2}));
        assert_eq!(field_names_of(&plain).unwrap(), vec!["b", "a"]);

        let unknown = Value::from(json!({"type": "Mystery"}));
        assert!(matches!(
            field_names_of(&unknown),
            Err(CoreError::UnknownType { .. })
        ));

        let ident = Value::from(json!({"type": "Identifier", "name": "x"}));
        assert_eq!(field_names_of(&ident).unwrap(), vec!["type", "name"]);
    }

    #[test]
    fn test_field_value_uses_defaults() {
        let stmt = Value::from(json!({"type": "IfStatement", "test": null, "consequent": null}));
        assert_eq!(field_value(&stmt, "alternate"), Value::Null);
        let unary = Value::from(json!({"type": "UnaryExpression", "operator": "!"}));
        assert_eq!(field_value(&unary, "prefix"), Value::Bool(true));
    }

    #[test]
    fn test_supertype_lookup_table() {
        let candidates: HashSet<NodeType> = [NodeType::Expression, NodeType::Identifier]
            .into_iter()
            .collect();
        let table = supertype_lookup_table(&candidates);
        assert_eq!(table.get(&NodeType::Identifier), Some(&NodeType::Identifier));
        assert_eq!(
            table.get(&NodeType::BinaryExpression),
            Some(&NodeType::Expression)
        );
        assert_eq!(table.get(&NodeType::IfStatement), None);
    }
}
