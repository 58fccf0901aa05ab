//! Language-agnostic intermediate representation of generated programs.
//!
//! Trees are built once by a producer (for example a schema-to-IR lowering
//! step), rewritten by the passes in [`crate::pass`], and then lowered to text
//! by a [backend]. Nodes are never mutated in place: every rewrite builds a
//! new tree, so a sub-tree can be shared freely before and after a pass.
//!
//! [backend]: crate::backend::Backend

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod fold;

/// Any node of the intermediate representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Node {
    Expr(Expr),
    Stmt(Stmt),
    Block(Block),
    Field(FieldDecl),
    Constructor(ConstructorDecl),
    Method(MethodDef),
    Class(ClassDecl),
    /// File declarations are built by the [generator], and should not be
    /// authored directly.
    ///
    /// [generator]: crate::generate::Generator
    File(FileDecl),
}

/// Type references.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Type {
    /// A named type, possibly qualified with a `.`-separated namespace, for
    /// example `java.util.List`.
    Named(String),
    /// A primitive type.
    Prim(Prim),
}

impl Type {
    pub fn named(name: impl Into<String>) -> Type {
        Type::Named(name.into())
    }

    /// Split a qualified name into its qualifier and its simple name.
    ///
    /// Returns `None` for primitives, unqualified names, and names with an
    /// empty qualifier or simple name.
    pub fn split_qualified(&self) -> Option<(&str, &str)> {
        match self {
            Type::Named(name) => match name.rsplit_once('.') {
                Some((qualifier, simple)) if !qualifier.is_empty() && !simple.is_empty() => {
                    Some((qualifier, simple))
                }
                _ => None,
            },
            Type::Prim(_) => None,
        }
    }
}

macro_rules! def_prims {
    ($($prim:ident => $name:literal),* $(,)?) => {
        /// Primitive types.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Prim {
            $(#[serde(rename = $name)] $prim,)*
        }

        impl Prim {
            pub const ALL: &'static [Prim] = &[$(Prim::$prim,)*];

            pub const fn name(self) -> &'static str {
                match self {
                    $(Prim::$prim => $name,)*
                }
            }
        }
    };
}

def_prims! {
    String => "string",
    Double => "double",
    Float => "float",
    Long => "long",
    Integer => "integer",
    Short => "short",
    Byte => "byte",
    Boolean => "boolean",
    Char => "char",
    Void => "void",
    UnsignedLong => "unsigned-long",
    UnsignedInt => "unsigned-int",
    UnsignedShort => "unsigned-short",
    UnsignedByte => "unsigned-byte",
}

impl fmt::Display for Prim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

macro_rules! def_bin_ops {
    ($($op:ident => $name:literal),* $(,)?) => {
        /// Binary operators.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum BinOp {
            $(#[serde(rename = $name)] $op,)*
        }

        impl BinOp {
            pub const ALL: &'static [BinOp] = &[$(BinOp::$op,)*];

            pub const fn name(self) -> &'static str {
                match self {
                    $(BinOp::$op => $name,)*
                }
            }
        }
    };
}

def_bin_ops! {
    Eq => "eq",
    Neq => "neq",
    Lt => "lt",
    LtEq => "lt-eq",
    Gt => "gt",
    GtEq => "gt-eq",
    Plus => "plus",
    Minus => "minus",
    Times => "times",
    Divide => "divide",
    Remainder => "remainder",
    And => "and",
    Or => "or",
    Shl => "shl",
    Shr => "shr",
    UnsignedShr => "unsigned-shr",
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declaration modifiers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Modifier {
    Public,
    Private,
    Static,
    Final,
}

impl Modifier {
    const fn bit(self) -> u8 {
        match self {
            Modifier::Public => 1 << 0,
            Modifier::Private => 1 << 1,
            Modifier::Static => 1 << 2,
            Modifier::Final => 1 << 3,
        }
    }
}

/// Visibility of a declaration, derived from its [`Modifiers`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// A set of [modifiers][Modifier]. Declarations are public unless marked
/// [private][Modifier::Private].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Modifier>", into = "Vec<Modifier>")]
pub struct Modifiers(u8);

impl Modifiers {
    pub const fn new() -> Modifiers {
        Modifiers(0)
    }

    pub const fn with(self, modifier: Modifier) -> Modifiers {
        Modifiers(self.0 | modifier.bit())
    }

    pub fn insert(&mut self, modifier: Modifier) {
        self.0 |= modifier.bit();
    }

    pub const fn contains(self, modifier: Modifier) -> bool {
        self.0 & modifier.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn visibility(self) -> Visibility {
        match self.contains(Modifier::Private) {
            true => Visibility::Private,
            false => Visibility::Public,
        }
    }

    pub const fn is_static(self) -> bool {
        self.contains(Modifier::Static)
    }

    pub const fn is_final(self) -> bool {
        self.contains(Modifier::Final)
    }

    /// The modifiers in the set, in declaration keyword order.
    pub fn iter(self) -> impl Iterator<Item = Modifier> {
        [
            Modifier::Public,
            Modifier::Private,
            Modifier::Static,
            Modifier::Final,
        ]
        .into_iter()
        .filter(move |modifier| self.contains(*modifier))
    }
}

impl FromIterator<Modifier> for Modifiers {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Modifiers {
        let mut modifiers = Modifiers::new();
        for modifier in iter {
            modifiers.insert(modifier);
        }
        modifiers
    }
}

impl From<Vec<Modifier>> for Modifiers {
    fn from(modifiers: Vec<Modifier>) -> Modifiers {
        modifiers.into_iter().collect()
    }
}

impl From<Modifiers> for Vec<Modifier> {
    fn from(modifiers: Modifiers) -> Vec<Modifier> {
        modifiers.iter().collect()
    }
}

/// Constant literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Const {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Null,
}

/// A named, typed parameter. Also used for local variable declarations and
/// for references to either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Param {
    pub name: String,
    pub r#type: Type,
}

impl Param {
    pub fn new(name: impl Into<String>, r#type: Type) -> Param {
        Param {
            name: name.into(),
            r#type,
        }
    }
}

/// The identity of a method: the type that owns it, and its name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MethodRef {
    pub owner: Type,
    pub name: String,
}

/// Expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Expr {
    /// Constant literals.
    Const(Const),
    /// References to parameters and local variables.
    Param(Param),
    /// Binary operations.
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Assignments.
    Assign { target: Box<Expr>, value: Box<Expr> },
    /// Method calls. Calls without a receiver are static calls on the owner of
    /// the method.
    Call {
        #[serde(default)]
        receiver: Option<Box<Expr>>,
        method: MethodRef,
        #[serde(default)]
        args: Vec<Expr>,
    },
    /// Object construction.
    New {
        r#type: Type,
        #[serde(default)]
        args: Vec<Expr>,
    },
    /// References to a field of the enclosing class.
    Field { r#type: Type, name: String },
}

impl Expr {
    pub fn param(name: impl Into<String>, r#type: Type) -> Expr {
        Expr::Param(Param::new(name, r#type))
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn assign(target: Expr, value: Expr) -> Expr {
        Expr::Assign {
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn int(value: i64) -> Expr {
        Expr::Const(Const::Int(value))
    }
}

/// Conditional statements.
///
/// The first `conds.len()` blocks are paired with the conditions in order.
/// A single trailing block, if present, is the `else` branch. Any other
/// combination of lengths is malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IfStmt {
    pub conds: Vec<Expr>,
    pub blocks: Vec<Block>,
}

impl IfStmt {
    pub fn is_well_formed(&self) -> bool {
        !self.conds.is_empty()
            && (self.blocks.len() == self.conds.len()
                || self.blocks.len() == self.conds.len() + 1)
    }

    /// The trailing `else` branch, if there is one.
    pub fn else_block(&self) -> Option<&Block> {
        match self.blocks.len() == self.conds.len() + 1 {
            true => self.blocks.last(),
            false => None,
        }
    }
}

/// Statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stmt {
    /// Expression statements.
    Expr(Expr),
    /// Local variable declarations, with an optional initializer.
    Decl {
        param: Param,
        #[serde(default)]
        init: Option<Expr>,
    },
    If(IfStmt),
    Block(Block),
    Return(Option<Expr>),
    /// Line comments.
    Comment(String),
}

/// A sequence of statements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Block {
        Block { stmts }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldDecl {
    #[serde(default)]
    pub modifiers: Modifiers,
    pub r#type: Type,
    pub name: String,
    #[serde(default)]
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConstructorDecl {
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MethodDef {
    #[serde(default)]
    pub modifiers: Modifiers,
    pub name: String,
    pub return_type: Type,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClassDecl {
    #[serde(default)]
    pub modifiers: Modifiers,
    /// The `.`-separated namespace of the class. Empty for the global
    /// namespace. Ignored for nested classes.
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub constructors: Vec<ConstructorDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
    /// Nested classes.
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
}

impl ClassDecl {
    /// An empty, public class in the global namespace.
    pub fn new(name: impl Into<String>) -> ClassDecl {
        ClassDecl {
            modifiers: Modifiers::new(),
            namespace: String::new(),
            name: name.into(),
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            classes: Vec::new(),
        }
    }

    /// The members of the class, in declaration order: fields, then
    /// constructors, then methods, then nested classes.
    pub fn members(&self) -> impl Iterator<Item = Member<'_>> {
        (self.fields.iter().map(Member::Field))
            .chain(self.constructors.iter().map(Member::Constructor))
            .chain(self.methods.iter().map(Member::Method))
            .chain(self.classes.iter().map(Member::Class))
    }
}

/// A borrowed member of a [class declaration][ClassDecl].
#[derive(Debug, Copy, Clone)]
pub enum Member<'a> {
    Field(&'a FieldDecl),
    Constructor(&'a ConstructorDecl),
    Method(&'a MethodDef),
    Class(&'a ClassDecl),
}

impl<'a> Member<'a> {
    pub fn modifiers(&self) -> Modifiers {
        match self {
            Member::Field(field) => field.modifiers,
            Member::Constructor(constructor) => constructor.modifiers,
            Member::Method(method) => method.modifiers,
            Member::Class(class) => class.modifiers,
        }
    }

    /// Whether a blank line should separate this member from the previous one.
    /// Consecutive fields are kept together.
    pub fn is_separated_from(&self, previous: Option<&Member<'a>>) -> bool {
        match (previous, self) {
            (None, _) => false,
            (Some(Member::Field(_)), Member::Field(_)) => false,
            (Some(_), _) => true,
        }
    }
}

/// The kind of an external [reference][Reference], which determines how a
/// backend renders it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
    /// Textual inclusion, for example `#include <string>`.
    Include,
    /// Bringing every name of a namespace into scope, for example
    /// `using namespace std;`.
    UsingNamespace,
    /// Bringing a single qualified name into scope, for example
    /// `using a::b::C;`.
    Using,
    /// Importing a qualified name, for example `import java.util.List;`.
    Import,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Include => write!(f, "include"),
            ReferenceKind::UsingNamespace => write!(f, "using-namespace"),
            ReferenceKind::Using => write!(f, "using"),
            ReferenceKind::Import => write!(f, "import"),
        }
    }
}

/// An external type or namespace that a generated file depends on.
///
/// References are compared structurally, so that they can be collected in a
/// set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Reference {
    pub kind: ReferenceKind,
    pub path: String,
}

impl Reference {
    pub fn new(kind: ReferenceKind, path: impl Into<String>) -> Reference {
        Reference {
            kind,
            path: path.into(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.kind, self.path)
    }
}

/// A single top-level class, along with the external references it requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileDecl {
    #[serde(default)]
    pub references: Vec<Reference>,
    pub class: ClassDecl,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_default_to_public() {
        let modifiers = Modifiers::new();
        assert!(modifiers.is_empty());
        assert_eq!(modifiers.visibility(), Visibility::Public);
        assert!(!modifiers.is_static());
        assert!(!modifiers.is_final());
    }

    #[test]
    fn modifiers_are_a_set() {
        let modifiers: Modifiers = [Modifier::Final, Modifier::Private, Modifier::Final]
            .into_iter()
            .collect();

        assert_eq!(modifiers.visibility(), Visibility::Private);
        assert!(modifiers.is_final());
        assert_eq!(
            modifiers.iter().collect::<Vec<_>>(),
            [Modifier::Private, Modifier::Final],
        );
    }

    #[test]
    fn split_qualified_names() {
        assert_eq!(
            Type::named("java.util.List").split_qualified(),
            Some(("java.util", "List")),
        );
        assert_eq!(Type::named("List").split_qualified(), None);
        assert_eq!(Type::named(".List").split_qualified(), None);
        assert_eq!(Type::named("java.util.").split_qualified(), None);
        assert_eq!(Type::Prim(Prim::String).split_qualified(), None);
    }

    #[test]
    fn if_stmt_block_counts() {
        let cond = || Expr::Const(Const::Bool(true));
        let if_stmt = |conds: usize, blocks: usize| IfStmt {
            conds: (0..conds).map(|_| cond()).collect(),
            blocks: (0..blocks).map(|_| Block::default()).collect(),
        };

        assert!(if_stmt(1, 1).is_well_formed());
        assert!(if_stmt(2, 3).is_well_formed());
        assert!(!if_stmt(2, 1).is_well_formed());
        assert!(!if_stmt(1, 3).is_well_formed());
        assert!(!if_stmt(0, 1).is_well_formed());

        assert!(if_stmt(2, 2).else_block().is_none());
        assert!(if_stmt(2, 3).else_block().is_some());
    }

    #[test]
    fn members_in_declaration_order() {
        let mut class = ClassDecl::new("Outer");
        class.classes.push(ClassDecl::new("Inner"));
        class.methods.push(MethodDef {
            modifiers: Modifiers::new(),
            name: "run".to_owned(),
            return_type: Type::Prim(Prim::Void),
            params: Vec::new(),
            body: Block::default(),
        });
        class.fields.push(FieldDecl {
            modifiers: Modifiers::new(),
            r#type: Type::Prim(Prim::Integer),
            name: "count".to_owned(),
            init: None,
        });

        let kinds = class
            .members()
            .map(|member| match member {
                Member::Field(_) => "field",
                Member::Constructor(_) => "constructor",
                Member::Method(_) => "method",
                Member::Class(_) => "class",
            })
            .collect::<Vec<_>>();

        assert_eq!(kinds, ["field", "method", "class"]);
    }

    #[test]
    fn deserialize_modifiers_from_list() {
        let field: FieldDecl = serde_json::from_str(
            r#"{ "modifiers": ["static", "final"], "type": { "prim": "long" }, "name": "MAX" }"#,
        )
        .unwrap();

        assert!(field.modifiers.is_static());
        assert!(field.modifiers.is_final());
        assert_eq!(field.r#type, Type::Prim(Prim::Long));
        assert_eq!(field.init, None);
    }
}
