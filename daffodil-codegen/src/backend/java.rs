//! The Java backend.

use crate::backend::{self, Backend};
use crate::error::GenerateError;
use crate::ir::{
    BinOp, ClassDecl, Const, ConstructorDecl, Expr, FieldDecl, FileDecl, Member, MethodDef,
    Modifiers, Prim, Reference, ReferenceKind, Type, Visibility,
};
use crate::pass::resolve_imports::{Imports, ResolveImports};
use crate::writer::CodeWriter;

pub struct Java;

impl Java {
    /// Write the visibility keyword for a member, followed by a space.
    fn write_visibility(&self, out: &mut dyn CodeWriter, modifiers: Modifiers) {
        match modifiers.visibility() {
            Visibility::Public => out.write("public "),
            Visibility::Private => out.write("private "),
        }
    }

    fn emit_member(
        &self,
        out: &mut dyn CodeWriter,
        class: &ClassDecl,
        member: &Member<'_>,
    ) -> Result<(), GenerateError> {
        match member {
            Member::Field(field) => self.emit_field(out, field),
            Member::Constructor(constructor) => self.emit_constructor(out, &class.name, constructor),
            Member::Method(method) => self.emit_method(out, method),
            Member::Class(class) => self.emit_class(out, class, true),
        }
    }
}

impl ResolveImports for Java {
    // Primitives and `java.lang` need no imports.
    fn resolve_type(&self, r#type: &Type, imports: &mut Imports) -> Type {
        match (r#type, r#type.split_qualified()) {
            (Type::Named(name), Some((_, simple))) => {
                imports.insert(Reference::new(ReferenceKind::Import, name.clone()));
                Type::named(simple)
            }
            _ => r#type.clone(),
        }
    }
}

impl Backend for Java {
    const NAME: &'static str = "java";
    const EXTENSION: &'static str = ".java";

    const PRIM_NAMES: &'static [(Prim, &'static str)] = &[
        (Prim::String, "String"),
        (Prim::Double, "double"),
        (Prim::Float, "float"),
        (Prim::Long, "long"),
        (Prim::Integer, "int"),
        (Prim::Short, "short"),
        (Prim::Byte, "byte"),
        (Prim::Boolean, "boolean"),
        (Prim::Char, "char"),
        (Prim::Void, "void"),
    ];

    const OP_SYMBOLS: &'static [(BinOp, &'static str)] = &[
        (BinOp::Eq, "=="),
        (BinOp::Neq, "!="),
        (BinOp::Lt, "<"),
        (BinOp::LtEq, "<="),
        (BinOp::Gt, ">"),
        (BinOp::GtEq, ">="),
        (BinOp::Plus, "+"),
        (BinOp::Minus, "-"),
        (BinOp::Times, "*"),
        (BinOp::Divide, "/"),
        (BinOp::Remainder, "%"),
        (BinOp::And, "&&"),
        (BinOp::Or, "||"),
        (BinOp::Shl, "<<"),
        (BinOp::Shr, ">>"),
        (BinOp::UnsignedShr, ">>>"),
    ];

    fn emit_file(&self, out: &mut dyn CodeWriter, file: &FileDecl) -> Result<(), GenerateError> {
        if !file.class.namespace.is_empty() {
            out.write_line(&format!("package {};", file.class.namespace));
            out.write_line("");
        }

        for reference in &file.references {
            match reference.kind {
                ReferenceKind::Import => out.write_line(&format!("import {};", reference.path)),
                ReferenceKind::Include | ReferenceKind::UsingNamespace | ReferenceKind::Using => {
                    return Err(GenerateError::UnsupportedReference {
                        backend: Java::NAME,
                        reference: reference.clone(),
                    });
                }
            }
        }
        if !file.references.is_empty() {
            out.write_line("");
        }

        self.emit_class(out, &file.class, false)
    }

    fn emit_class(
        &self,
        out: &mut dyn CodeWriter,
        class: &ClassDecl,
        nested: bool,
    ) -> Result<(), GenerateError> {
        out.start_line("");
        match (class.modifiers.visibility(), nested) {
            (Visibility::Public, _) => out.write("public "),
            (Visibility::Private, true) => out.write("private "),
            // Top-level classes can not be private, so fall back to package access.
            (Visibility::Private, false) => {}
        }
        if nested {
            out.write("static ");
        }
        if class.modifiers.is_final() {
            out.write("final ");
        }
        out.write("class ");
        out.write(&class.name);
        out.write(" {");
        out.end_line();

        out.start_block();
        let mut previous = None;
        for member in class.members() {
            if member.is_separated_from(previous.as_ref()) {
                out.write_line("");
            }
            self.emit_member(out, class, &member)?;
            previous = Some(member);
        }
        out.end_block();

        out.write_line("}");
        Ok(())
    }

    fn emit_field(&self, out: &mut dyn CodeWriter, field: &FieldDecl) -> Result<(), GenerateError> {
        out.start_line("");
        self.write_visibility(out, field.modifiers);
        if field.modifiers.is_static() {
            out.write("static ");
        }
        if field.modifiers.is_final() {
            out.write("final ");
        }
        self.emit_type(out, &field.r#type)?;
        out.write(" ");
        out.write(&field.name);
        if let Some(init) = &field.init {
            out.write(" = ");
            self.emit_expr(out, init)?;
        }
        out.write(";");
        out.end_line();
        Ok(())
    }

    fn emit_constructor(
        &self,
        out: &mut dyn CodeWriter,
        class_name: &str,
        constructor: &ConstructorDecl,
    ) -> Result<(), GenerateError> {
        out.start_line("");
        self.write_visibility(out, constructor.modifiers);
        out.write(class_name);
        backend::lower_params(self, out, &constructor.params)?;
        backend::lower_body(self, out, &constructor.body)
    }

    fn emit_method(
        &self,
        out: &mut dyn CodeWriter,
        method: &MethodDef,
    ) -> Result<(), GenerateError> {
        out.start_line("");
        self.write_visibility(out, method.modifiers);
        if method.modifiers.is_static() {
            out.write("static ");
        }
        if method.modifiers.is_final() {
            out.write("final ");
        }
        self.emit_type(out, &method.return_type)?;
        out.write(" ");
        out.write(&method.name);
        backend::lower_params(self, out, &method.params)?;
        backend::lower_body(self, out, &method.body)
    }

    fn emit_expr(&self, out: &mut dyn CodeWriter, expr: &Expr) -> Result<(), GenerateError> {
        match expr {
            Expr::Const(Const::Int(value)) if i32::try_from(*value).is_err() => {
                out.write(&format!("{value}L"));
                Ok(())
            }
            Expr::Const(r#const) => {
                out.write(&backend::const_text(Java::NAME, r#const, "null")?);
                Ok(())
            }
            Expr::Param(param) => {
                out.write(&param.name);
                Ok(())
            }
            Expr::Binary { op, lhs, rhs } => backend::lower_binary(self, out, *op, lhs, rhs),
            Expr::Assign { target, value } => backend::lower_assign(self, out, target, value),
            Expr::Call {
                receiver: Some(receiver),
                method,
                args,
            } => {
                self.emit_expr(out, receiver)?;
                out.write(".");
                out.write(&method.name);
                backend::lower_args(self, out, args)
            }
            Expr::Call {
                receiver: None,
                method,
                args,
            } => {
                self.emit_type(out, &method.owner)?;
                out.write(".");
                out.write(&method.name);
                backend::lower_args(self, out, args)
            }
            Expr::New { r#type, args } => {
                out.write("new ");
                self.emit_type(out, r#type)?;
                backend::lower_args(self, out, args)
            }
            Expr::Field { name, .. } => {
                out.write("this.");
                out.write(name);
                Ok(())
            }
        }
    }

    fn emit_type(&self, out: &mut dyn CodeWriter, r#type: &Type) -> Result<(), GenerateError> {
        match r#type {
            Type::Named(name) => out.write(name),
            Type::Prim(prim) => out.write(self.prim_name(*prim)?),
        }
        Ok(())
    }
}
