//! The C++ backend.
//!
//! Classes are rendered with their members grouped into `public:` and
//! `private:` sections. Qualified type names are brought into scope with
//! `using` declarations, and the standard headers needed by primitive types
//! are included.

use crate::backend::{self, Backend};
use crate::error::GenerateError;
use crate::ir::{
    BinOp, ClassDecl, ConstructorDecl, Expr, FieldDecl, FileDecl, Member, MethodDef, Prim,
    Reference, ReferenceKind, Type, Visibility,
};
use crate::pass::resolve_imports::{Imports, ResolveImports};
use crate::writer::CodeWriter;

pub struct Cpp;

const STRING_HEADER: &str = "<string>";
const FIXED_WIDTH_HEADER: &str = "<cstdint>";
const STD_NAMESPACE: &str = "std";

impl Cpp {
    fn emit_reference(
        &self,
        out: &mut dyn CodeWriter,
        reference: &Reference,
    ) -> Result<(), GenerateError> {
        match reference.kind {
            ReferenceKind::Include => out.write_line(&format!("#include {}", reference.path)),
            ReferenceKind::UsingNamespace => {
                out.write_line(&format!("using namespace {};", reference.path))
            }
            ReferenceKind::Using => out.write_line(&format!("using {};", reference.path)),
            ReferenceKind::Import => {
                return Err(GenerateError::UnsupportedReference {
                    backend: Cpp::NAME,
                    reference: reference.clone(),
                })
            }
        }
        Ok(())
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

/// Convert a `.`-separated name to a `::`-separated one.
fn scoped_name(name: &str) -> String {
    name.replace('.', "::")
}

fn needs_fixed_width_header(prim: Prim) -> bool {
    matches!(
        prim,
        Prim::Byte | Prim::UnsignedLong | Prim::UnsignedInt | Prim::UnsignedShort | Prim::UnsignedByte,
    )
}

/// Types whose constants can be evaluated at compile time.
fn is_literal_type(r#type: &Type) -> bool {
    match r#type {
        Type::Prim(Prim::String | Prim::Void) | Type::Named(_) => false,
        Type::Prim(_) => true,
    }
}

impl ResolveImports for Cpp {
    fn resolve_type(&self, r#type: &Type, imports: &mut Imports) -> Type {
        if let Some((_, simple)) = r#type.split_qualified() {
            if let Type::Named(name) = r#type {
                imports.insert(Reference::new(ReferenceKind::Using, scoped_name(name)));
            }
            return Type::named(simple);
        }

        match r#type {
            Type::Prim(Prim::String) => {
                imports.insert(Reference::new(ReferenceKind::Include, STRING_HEADER));
                imports.insert(Reference::new(ReferenceKind::UsingNamespace, STD_NAMESPACE));
            }
            Type::Prim(prim) if needs_fixed_width_header(*prim) => {
                imports.insert(Reference::new(ReferenceKind::Include, FIXED_WIDTH_HEADER));
            }
            Type::Prim(_) | Type::Named(_) => {}
        }
        r#type.clone()
    }
}

impl Backend for Cpp {
    const NAME: &'static str = "cpp";
    const EXTENSION: &'static str = ".cpp";

    const PRIM_NAMES: &'static [(Prim, &'static str)] = &[
        (Prim::String, "string"),
        (Prim::Double, "double"),
        (Prim::Float, "float"),
        (Prim::Long, "long"),
        (Prim::Integer, "int"),
        (Prim::Short, "short"),
        (Prim::Byte, "int8_t"),
        (Prim::Boolean, "bool"),
        (Prim::Char, "char"),
        (Prim::Void, "void"),
        (Prim::UnsignedLong, "uint64_t"),
        (Prim::UnsignedInt, "uint32_t"),
        (Prim::UnsignedShort, "uint16_t"),
        (Prim::UnsignedByte, "uint8_t"),
    ];

    // There is no logical shift in C++: the shift depends on the operand type.
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
    ];

    fn emit_file(&self, out: &mut dyn CodeWriter, file: &FileDecl) -> Result<(), GenerateError> {
        for reference in &file.references {
            self.emit_reference(out, reference)?;
        }
        if !file.references.is_empty() {
            out.write_line("");
        }

        match file.class.namespace.as_str() {
            "" => self.emit_class(out, &file.class, false),
            namespace => {
                let namespace = scoped_name(namespace);
                out.write_line(&format!("namespace {namespace} {{"));
                out.write_line("");
                self.emit_class(out, &file.class, false)?;
                out.write_line("");
                out.write_line(&format!("}} // namespace {namespace}"));
                Ok(())
            }
        }
    }

    fn emit_class(
        &self,
        out: &mut dyn CodeWriter,
        class: &ClassDecl,
        _nested: bool,
    ) -> Result<(), GenerateError> {
        match class.modifiers.is_final() {
            true => out.write_line(&format!("class {} final {{", class.name)),
            false => out.write_line(&format!("class {} {{", class.name)),
        }

        let mut previous = None;
        let mut section = None;
        for member in class.members() {
            let visibility = member.modifiers().visibility();
            if section != Some(visibility) {
                if previous.is_some() {
                    out.write_line("");
                }
                out.write_line(match visibility {
                    Visibility::Public => "public:",
                    Visibility::Private => "private:",
                });
                section = Some(visibility);
            } else if member.is_separated_from(previous.as_ref()) {
                out.write_line("");
            }

            out.start_block();
            self.emit_member(out, class, &member)?;
            out.end_block();
            previous = Some(member);
        }

        out.write_line("};");
        Ok(())
    }

    // Static members are defined in the class body, as C++17 inline variables.
    fn emit_field(&self, out: &mut dyn CodeWriter, field: &FieldDecl) -> Result<(), GenerateError> {
        out.start_line("");
        match (field.modifiers.is_static(), field.modifiers.is_final()) {
            (true, true) if field.init.is_some() && is_literal_type(&field.r#type) => {
                out.write("static constexpr ")
            }
            (true, true) => out.write("inline static const "),
            (true, false) => out.write("inline static "),
            (false, true) => out.write("const "),
            (false, false) => {}
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
        out.start_line(class_name);
        backend::lower_params(self, out, &constructor.params)?;
        backend::lower_body(self, out, &constructor.body)
    }

    fn emit_method(
        &self,
        out: &mut dyn CodeWriter,
        method: &MethodDef,
    ) -> Result<(), GenerateError> {
        out.start_line("");
        if method.modifiers.is_static() {
            out.write("static ");
        }
        self.emit_type(out, &method.return_type)?;
        out.write(" ");
        out.write(&method.name);
        backend::lower_params(self, out, &method.params)?;
        backend::lower_body(self, out, &method.body)
    }

    fn emit_expr(&self, out: &mut dyn CodeWriter, expr: &Expr) -> Result<(), GenerateError> {
        match expr {
            Expr::Const(r#const) => {
                out.write(&backend::const_text(Cpp::NAME, r#const, "nullptr")?);
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
                out.write("::");
                out.write(&method.name);
                backend::lower_args(self, out, args)
            }
            // Objects are values, so construction does not allocate.
            Expr::New { r#type, args } => {
                self.emit_type(out, r#type)?;
                backend::lower_args(self, out, args)
            }
            Expr::Field { name, .. } => {
                out.write("this->");
                out.write(name);
                Ok(())
            }
        }
    }

    fn emit_type(&self, out: &mut dyn CodeWriter, r#type: &Type) -> Result<(), GenerateError> {
        match r#type {
            Type::Named(name) => out.write(&scoped_name(name)),
            Type::Prim(prim) => out.write(self.prim_name(*prim)?),
        }
        Ok(())
    }
}
