//! Lowering of the intermediate representation to source text.
//!
//! A [`Backend`] knows how to render every node for one target language. The
//! parts of lowering that are common to the curly-brace languages we target
//! (blocks, statements, conditionals, operands, argument lists) are provided
//! here as `lower_*` functions, which backends use as the defaults for the
//! corresponding [`Backend`] methods.

use crate::error::GenerateError;
use crate::ir::{
    BinOp, Block, ClassDecl, Const, ConstructorDecl, Expr, FieldDecl, FileDecl, IfStmt, MethodDef,
    Node, Param, Prim, Stmt, Type,
};
use crate::pass::ir_to_pretty;
use crate::pass::resolve_imports::ResolveImports;
use crate::writer::CodeWriter;

pub mod cpp;
pub mod java;

/// The class name used when lowering a constructor that is not attached to a
/// class, and the stem of the file name used for fragments.
pub const FRAGMENT_NAME: &str = "Fragment";

/// Width used when pretty printing nodes for error messages.
const ERROR_NODE_WIDTH: usize = 80;

/// The target languages that code can be generated for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendKind {
    Cpp,
    Java,
}

/// The emission rules for one target language.
///
/// Each `emit_*` method renders one kind of node to `out`. Backends also
/// decide which external references their types need, by implementing
/// [`ResolveImports`].
pub trait Backend: ResolveImports {
    /// Short name of the backend, used in error messages.
    const NAME: &'static str;
    /// File extension of generated files, including the leading `.`.
    const EXTENSION: &'static str;
    /// Spellings of the supported primitive types.
    const PRIM_NAMES: &'static [(Prim, &'static str)];
    /// Symbols of the supported binary operators.
    const OP_SYMBOLS: &'static [(BinOp, &'static str)];

    fn prim_name(&self, prim: Prim) -> Result<&'static str, GenerateError> {
        lookup(Self::PRIM_NAMES, prim).ok_or(GenerateError::UnsupportedPrimitive {
            backend: Self::NAME,
            prim,
        })
    }

    fn op_symbol(&self, op: BinOp) -> Result<&'static str, GenerateError> {
        lookup(Self::OP_SYMBOLS, op).ok_or(GenerateError::UnsupportedOperator {
            backend: Self::NAME,
            op,
        })
    }

    /// Render a complete file: its references followed by its class.
    fn emit_file(&self, out: &mut dyn CodeWriter, file: &FileDecl) -> Result<(), GenerateError>;

    fn emit_class(
        &self,
        out: &mut dyn CodeWriter,
        class: &ClassDecl,
        nested: bool,
    ) -> Result<(), GenerateError>;

    fn emit_field(&self, out: &mut dyn CodeWriter, field: &FieldDecl) -> Result<(), GenerateError>;

    fn emit_constructor(
        &self,
        out: &mut dyn CodeWriter,
        class_name: &str,
        constructor: &ConstructorDecl,
    ) -> Result<(), GenerateError>;

    fn emit_method(&self, out: &mut dyn CodeWriter, method: &MethodDef)
        -> Result<(), GenerateError>;

    /// Render the statements of a block, one indentation level deeper than the
    /// current line. The delimiters of the block are left to the caller.
    fn emit_block(&self, out: &mut dyn CodeWriter, block: &Block) -> Result<(), GenerateError> {
        lower_block(self, out, block)
    }

    /// Render a statement. See [`manages_termination`] for which statements
    /// write complete lines, and which are written inline.
    fn emit_stmt(&self, out: &mut dyn CodeWriter, stmt: &Stmt) -> Result<(), GenerateError> {
        lower_stmt(self, out, stmt)
    }

    /// Render an expression inline, on the current line.
    fn emit_expr(&self, out: &mut dyn CodeWriter, expr: &Expr) -> Result<(), GenerateError>;

    /// Render a type reference inline, on the current line.
    fn emit_type(&self, out: &mut dyn CodeWriter, r#type: &Type) -> Result<(), GenerateError>;
}

pub fn lookup<K: PartialEq + Copy, V: Copy>(table: &[(K, V)], key: K) -> Option<V> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Render a node that may not be a complete file.
pub fn emit_node<B: Backend + ?Sized>(
    backend: &B,
    out: &mut dyn CodeWriter,
    node: &Node,
) -> Result<(), GenerateError> {
    match node {
        Node::Expr(expr) => {
            out.start_line("");
            backend.emit_expr(out, expr)?;
            out.end_line();
            Ok(())
        }
        Node::Stmt(stmt) => lower_block_stmt(backend, out, stmt),
        Node::Block(block) => lower_nested_block(backend, out, block),
        Node::Field(field) => backend.emit_field(out, field),
        Node::Constructor(constructor) => backend.emit_constructor(out, FRAGMENT_NAME, constructor),
        Node::Method(method) => backend.emit_method(out, method),
        Node::Class(class) => backend.emit_class(out, class, false),
        Node::File(file) => backend.emit_file(out, file),
    }
}

/// Control flow and comments are delimited by their own lines, and are not
/// terminated by a `;`. Every other statement is written inline.
pub fn manages_termination(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::If(_) | Stmt::Block(_) | Stmt::Comment(_) => true,
        Stmt::Expr(_) | Stmt::Decl { .. } | Stmt::Return(_) => false,
    }
}

pub fn lower_block<B: Backend + ?Sized>(
    backend: &B,
    out: &mut dyn CodeWriter,
    block: &Block,
) -> Result<(), GenerateError> {
    out.start_block();
    for stmt in &block.stmts {
        lower_block_stmt(backend, out, stmt)?;
    }
    out.end_block();
    Ok(())
}

/// Render a statement as it appears in a block, terminating it if needed.
fn lower_block_stmt<B: Backend + ?Sized>(
    backend: &B,
    out: &mut dyn CodeWriter,
    stmt: &Stmt,
) -> Result<(), GenerateError> {
    if manages_termination(stmt) {
        return backend.emit_stmt(out, stmt);
    }

    out.start_line("");
    backend.emit_stmt(out, stmt)?;
    out.write(";");
    out.end_line();
    Ok(())
}

pub fn lower_stmt<B: Backend + ?Sized>(
    backend: &B,
    out: &mut dyn CodeWriter,
    stmt: &Stmt,
) -> Result<(), GenerateError> {
    match stmt {
        Stmt::Expr(expr) => backend.emit_expr(out, expr),
        Stmt::Decl { param, init } => {
            lower_param(backend, out, param)?;
            if let Some(init) = init {
                out.write(" = ");
                backend.emit_expr(out, init)?;
            }
            Ok(())
        }
        Stmt::If(if_stmt) => lower_if(backend, out, if_stmt),
        Stmt::Block(block) => lower_nested_block(backend, out, block),
        Stmt::Return(None) => {
            out.write("return");
            Ok(())
        }
        Stmt::Return(Some(expr)) => {
            out.write("return ");
            backend.emit_expr(out, expr)
        }
        Stmt::Comment(text) => {
            lower_comment(out, text);
            Ok(())
        }
    }
}

/// Lower a conditional to a chain of `if`, `else if` and `else` branches.
pub fn lower_if<B: Backend + ?Sized>(
    backend: &B,
    out: &mut dyn CodeWriter,
    if_stmt: &IfStmt,
) -> Result<(), GenerateError> {
    if !if_stmt.is_well_formed() {
        let context = ir_to_pretty::Context::new();
        return Err(GenerateError::MalformedConditional {
            conds: if_stmt.conds.len(),
            blocks: if_stmt.blocks.len(),
            node: context.if_stmt(if_stmt).pretty(ERROR_NODE_WIDTH).to_string(),
        });
    }

    for (index, (cond, block)) in if_stmt.conds.iter().zip(&if_stmt.blocks).enumerate() {
        out.start_line(if index == 0 { "if (" } else { "} else if (" });
        backend.emit_expr(out, cond)?;
        out.write(") {");
        out.end_line();
        backend.emit_block(out, block)?;
    }
    if let Some(block) = if_stmt.else_block() {
        out.write_line("} else {");
        backend.emit_block(out, block)?;
    }
    out.write_line("}");

    Ok(())
}

fn lower_nested_block<B: Backend + ?Sized>(
    backend: &B,
    out: &mut dyn CodeWriter,
    block: &Block,
) -> Result<(), GenerateError> {
    out.write_line("{");
    backend.emit_block(out, block)?;
    out.write_line("}");
    Ok(())
}

/// Write a `//` comment line for each line of `text`. A lone `\r` ends a line
/// in both targets, so it is treated as a line break too.
pub fn lower_comment(out: &mut dyn CodeWriter, text: &str) {
    let text = text.replace("\r\n", "\n");
    let text = text.strip_suffix(['\n', '\r']).unwrap_or(&text);
    for line in text.split(['\n', '\r']) {
        match line.trim_end() {
            "" => out.write_line("//"),
            line => out.write_line(&format!("// {line}")),
        }
    }
}

/// Render a declaration body: ` {`, the statements, then a closing `}` line.
/// The declaration's header should already be on the current line.
pub fn lower_body<B: Backend + ?Sized>(
    backend: &B,
    out: &mut dyn CodeWriter,
    body: &Block,
) -> Result<(), GenerateError> {
    out.write(" {");
    out.end_line();
    backend.emit_block(out, body)?;
    out.write_line("}");
    Ok(())
}

/// Render a typed name, for example `int count`.
pub fn lower_param<B: Backend + ?Sized>(
    backend: &B,
    out: &mut dyn CodeWriter,
    param: &Param,
) -> Result<(), GenerateError> {
    backend.emit_type(out, &param.r#type)?;
    out.write(" ");
    out.write(&param.name);
    Ok(())
}

/// Render a parenthesised, comma-separated parameter list.
pub fn lower_params<B: Backend + ?Sized>(
    backend: &B,
    out: &mut dyn CodeWriter,
    params: &[Param],
) -> Result<(), GenerateError> {
    out.write("(");
    for (index, param) in params.iter().enumerate() {
        if index > 0 {
            out.write(", ");
        }
        lower_param(backend, out, param)?;
    }
    out.write(")");
    Ok(())
}

/// Render a parenthesised, comma-separated argument list.
pub fn lower_args<B: Backend + ?Sized>(
    backend: &B,
    out: &mut dyn CodeWriter,
    args: &[Expr],
) -> Result<(), GenerateError> {
    out.write("(");
    for (index, arg) in args.iter().enumerate() {
        if index > 0 {
            out.write(", ");
        }
        backend.emit_expr(out, arg)?;
    }
    out.write(")");
    Ok(())
}

pub fn lower_binary<B: Backend + ?Sized>(
    backend: &B,
    out: &mut dyn CodeWriter,
    op: BinOp,
    lhs: &Expr,
    rhs: &Expr,
) -> Result<(), GenerateError> {
    let symbol = backend.op_symbol(op)?;
    lower_operand(backend, out, lhs)?;
    out.write(" ");
    out.write(symbol);
    out.write(" ");
    lower_operand(backend, out, rhs)
}

pub fn lower_assign<B: Backend + ?Sized>(
    backend: &B,
    out: &mut dyn CodeWriter,
    target: &Expr,
    value: &Expr,
) -> Result<(), GenerateError> {
    backend.emit_expr(out, target)?;
    out.write(" = ");
    backend.emit_expr(out, value)
}

/// Operands that are themselves operations are parenthesised, so that the
/// structure of the tree survives regardless of operator precedence.
fn lower_operand<B: Backend + ?Sized>(
    backend: &B,
    out: &mut dyn CodeWriter,
    operand: &Expr,
) -> Result<(), GenerateError> {
    match operand {
        Expr::Binary { .. } | Expr::Assign { .. } => {
            out.write("(");
            backend.emit_expr(out, operand)?;
            out.write(")");
            Ok(())
        }
        _ => backend.emit_expr(out, operand),
    }
}

/// Render a constant, using `null` as the spelling of the null literal.
///
/// Neither target has a literal for infinities or NaN, so those are rejected.
pub fn const_text(
    backend: &'static str,
    r#const: &Const,
    null: &str,
) -> Result<String, GenerateError> {
    match r#const {
        Const::Bool(value) => Ok(value.to_string()),
        Const::Int(value) => Ok(value.to_string()),
        Const::Float(value) if !value.is_finite() => Err(GenerateError::UnsupportedFloat {
            backend,
            value: *value,
        }),
        Const::Float(value) => Ok(format!("{value:?}")),
        Const::String(value) => Ok(quote_string(value)),
        Const::Null => Ok(null.to_owned()),
    }
}

/// Quote a string literal, escaping characters that may not appear in it
/// directly. Other control characters are written as three digit octal
/// escapes, which both targets read the same way.
pub fn quote_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            ch if ch.is_ascii_control() => quoted.push_str(&format!("\\{:03o}", u32::from(ch))),
            ch => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}
