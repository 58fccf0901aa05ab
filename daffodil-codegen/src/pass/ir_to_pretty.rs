//! A pretty printer for the intermediate representation.
//!
//! Trees are rendered as s-expressions. This is mainly intended for debugging,
//! and for pointing at nodes in diagnostics.
//!
//! Example:
//!
//! ```
//! use daffodil_codegen::ir::{BinOp, Expr, Node, Prim, Type};
//! use daffodil_codegen::pass::ir_to_pretty::Context;
//!
//! let expr = Expr::binary(
//!     BinOp::Plus,
//!     Expr::param("a", Type::Prim(Prim::Integer)),
//!     Expr::int(1),
//! );
//!
//! let context = Context::new();
//! let doc = context.node(&Node::Expr(expr));
//! assert_eq!(doc.pretty(80).to_string(), "(plus a 1)");
//! ```

use pretty::RcDoc;

use crate::ir::{
    Block, ClassDecl, Const, ConstructorDecl, Expr, FieldDecl, FileDecl, IfStmt, MethodDef,
    Modifier, Modifiers, Node, Param, Reference, Stmt, Type,
};

const INDENT: isize = 2;

pub struct Context {}

impl<'a> Context {
    pub fn new() -> Context {
        Context {}
    }

    /// Render an s-expression, breaking each item onto its own line if the
    /// whole expression does not fit.
    fn sexpr(
        &'a self,
        head: impl Into<String>,
        items: impl IntoIterator<Item = RcDoc<'a>>,
    ) -> RcDoc<'a> {
        let items = items.into_iter().collect::<Vec<_>>();
        let head = RcDoc::text(head.into());
        let body = match items.is_empty() {
            true => head,
            false => head
                .append(RcDoc::line().append(RcDoc::intersperse(items, RcDoc::line())).nest(INDENT)),
        };
        RcDoc::text("(").append(body).append(")").group()
    }

    fn name(&'a self, name: &str) -> RcDoc<'a> {
        RcDoc::text(name.to_owned())
    }

    pub fn node(&'a self, node: &Node) -> RcDoc<'a> {
        match node {
            Node::Expr(expr) => self.expr(expr),
            Node::Stmt(stmt) => self.stmt(stmt),
            Node::Block(block) => self.block(block),
            Node::Field(field) => self.field(field),
            Node::Constructor(constructor) => self.constructor(constructor),
            Node::Method(method) => self.method(method),
            Node::Class(class) => self.class(class),
            Node::File(file) => self.file(file),
        }
    }

    pub fn file(&'a self, file: &FileDecl) -> RcDoc<'a> {
        self.sexpr(
            "file",
            [
                self.sexpr(
                    "references",
                    file.references.iter().map(|reference| self.reference(reference)),
                ),
                self.class(&file.class),
            ],
        )
    }

    fn reference(&'a self, reference: &Reference) -> RcDoc<'a> {
        self.sexpr(reference.kind.to_string(), [self.name(&reference.path)])
    }

    pub fn class(&'a self, class: &ClassDecl) -> RcDoc<'a> {
        let name = match class.namespace.as_str() {
            "" => class.name.clone(),
            namespace => format!("{namespace}.{}", class.name),
        };

        let items = (self.modifiers(class.modifiers).into_iter())
            .chain([self.name(&name)])
            .chain(class.fields.iter().map(|field| self.field(field)))
            .chain((class.constructors.iter()).map(|constructor| self.constructor(constructor)))
            .chain(class.methods.iter().map(|method| self.method(method)))
            .chain(class.classes.iter().map(|class| self.class(class)));

        self.sexpr("class", items)
    }

    pub fn field(&'a self, field: &FieldDecl) -> RcDoc<'a> {
        let items = (self.modifiers(field.modifiers).into_iter())
            .chain([self.r#type(&field.r#type), self.name(&field.name)])
            .chain(field.init.iter().map(|init| self.expr(init)));

        self.sexpr("field", items)
    }

    pub fn constructor(&'a self, constructor: &ConstructorDecl) -> RcDoc<'a> {
        let items = (self.modifiers(constructor.modifiers).into_iter())
            .chain([self.params(&constructor.params), self.block(&constructor.body)]);

        self.sexpr("constructor", items)
    }

    pub fn method(&'a self, method: &MethodDef) -> RcDoc<'a> {
        let items = (self.modifiers(method.modifiers).into_iter()).chain([
            self.name(&method.name),
            self.r#type(&method.return_type),
            self.params(&method.params),
            self.block(&method.body),
        ]);

        self.sexpr("method", items)
    }

    fn modifiers(&'a self, modifiers: Modifiers) -> Option<RcDoc<'a>> {
        if modifiers.is_empty() {
            return None;
        }

        let modifiers = modifiers.iter().map(|modifier| match modifier {
            Modifier::Public => RcDoc::text("public"),
            Modifier::Private => RcDoc::text("private"),
            Modifier::Static => RcDoc::text("static"),
            Modifier::Final => RcDoc::text("final"),
        });

        Some(
            RcDoc::text("[")
                .append(RcDoc::intersperse(modifiers, RcDoc::space()))
                .append("]"),
        )
    }

    fn params(&'a self, params: &[Param]) -> RcDoc<'a> {
        self.sexpr("params", params.iter().map(|param| self.param(param)))
    }

    fn param(&'a self, param: &Param) -> RcDoc<'a> {
        RcDoc::text("(")
            .append(self.name(&param.name))
            .append(RcDoc::space())
            .append(self.r#type(&param.r#type))
            .append(")")
    }

    pub fn r#type(&'a self, r#type: &Type) -> RcDoc<'a> {
        match r#type {
            Type::Named(name) => self.name(name),
            Type::Prim(prim) => RcDoc::text(format!("%{prim}")),
        }
    }

    pub fn block(&'a self, block: &Block) -> RcDoc<'a> {
        self.sexpr("block", block.stmts.iter().map(|stmt| self.stmt(stmt)))
    }

    pub fn stmt(&'a self, stmt: &Stmt) -> RcDoc<'a> {
        match stmt {
            Stmt::Expr(expr) => self.expr(expr),
            Stmt::Decl { param, init } => self.sexpr(
                "let",
                [self.param(param)]
                    .into_iter()
                    .chain(init.iter().map(|init| self.expr(init))),
            ),
            Stmt::If(if_stmt) => self.if_stmt(if_stmt),
            Stmt::Block(block) => self.block(block),
            Stmt::Return(expr) => self.sexpr("return", expr.iter().map(|expr| self.expr(expr))),
            Stmt::Comment(text) => self.sexpr("comment", [RcDoc::text(format!("{text:?}"))]),
        }
    }

    pub fn if_stmt(&'a self, if_stmt: &IfStmt) -> RcDoc<'a> {
        self.sexpr(
            "if",
            [
                self.sexpr("conds", if_stmt.conds.iter().map(|cond| self.expr(cond))),
                self.sexpr("blocks", if_stmt.blocks.iter().map(|block| self.block(block))),
            ],
        )
    }

    pub fn expr(&'a self, expr: &Expr) -> RcDoc<'a> {
        match expr {
            Expr::Const(r#const) => self.r#const(r#const),
            Expr::Param(param) => self.name(&param.name),
            Expr::Binary { op, lhs, rhs } => self.sexpr(op.name(), [self.expr(lhs), self.expr(rhs)]),
            Expr::Assign { target, value } => {
                self.sexpr("assign", [self.expr(target), self.expr(value)])
            }
            Expr::Call {
                receiver,
                method,
                args,
            } => {
                let callee = match receiver {
                    Some(receiver) => self.sexpr(".", [self.expr(receiver), self.name(&method.name)]),
                    None => self.sexpr("::", [self.r#type(&method.owner), self.name(&method.name)]),
                };
                self.sexpr("call", [callee].into_iter().chain(args.iter().map(|arg| self.expr(arg))))
            }
            Expr::New { r#type, args } => self.sexpr(
                "new",
                [self.r#type(r#type)]
                    .into_iter()
                    .chain(args.iter().map(|arg| self.expr(arg))),
            ),
            Expr::Field { name, .. } => self.sexpr("field-ref", [self.name(name)]),
        }
    }

    fn r#const(&'a self, r#const: &Const) -> RcDoc<'a> {
        match r#const {
            Const::Bool(value) => RcDoc::text(value.to_string()),
            Const::Int(value) => RcDoc::text(value.to_string()),
            Const::Float(value) => RcDoc::text(format!("{value:?}")),
            Const::String(value) => RcDoc::text(format!("{value:?}")),
            Const::Null => RcDoc::text("null"),
        }
    }
}

impl Default for Context {
    fn default() -> Context {
        Context::new()
    }
}

/// Render a node on a single line, or across several lines if it is wider
/// than `width`.
pub fn to_string(node: &Node, width: usize) -> String {
    let context = Context::new();
    let doc = context.node(node);
    doc.pretty(width).to_string()
}
