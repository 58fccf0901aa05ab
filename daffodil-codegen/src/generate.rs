//! The generation pipeline: import resolution, file packaging, then emission.

use crate::backend::{self, Backend, FRAGMENT_NAME};
use crate::error::GenerateError;
use crate::ir::{FileDecl, Node};
use crate::pass::resolve_imports::resolve_imports;
use crate::writer::{CodeWriter, IndentWriterFactory, WriterFactory};

/// A generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub content: String,
}

/// Generates source files for one backend.
///
/// Generators hold no state between runs, so a single generator can be used
/// for any number of calls to [`Generator::generate`].
pub struct Generator<'b, B, F> {
    backend: &'b B,
    factory: F,
}

impl<'b, B: Backend, F: WriterFactory> Generator<'b, B, F> {
    pub fn new(backend: &'b B, factory: F) -> Generator<'b, B, F> {
        Generator { backend, factory }
    }

    /// Resolve the references of a tree, packaging classes into files.
    ///
    /// Roots that are not classes are returned without packaging, with any
    /// references they need discarded. References already attached to a file
    /// declaration are merged with the ones that were resolved.
    pub fn prepare(&self, root: &Node) -> Node {
        let (root, mut imports) = resolve_imports(self.backend, root);

        match root {
            Node::Class(class) => Node::File(FileDecl {
                references: imports.into_sorted_vec(),
                class,
            }),
            Node::File(file) => {
                imports.extend(file.references);
                Node::File(FileDecl {
                    references: imports.into_sorted_vec(),
                    class: file.class,
                })
            }
            root => root,
        }
    }

    /// Generate the output files for a tree.
    ///
    /// A class produces exactly one file, named after the class. Any other
    /// node produces a single fragment file.
    pub fn generate(&self, root: &Node) -> Result<Vec<OutputFile>, GenerateError> {
        let root = self.prepare(root);
        let mut output_files = Vec::new();
        self.emit(&root, &mut output_files)?;
        Ok(output_files)
    }

    fn emit(&self, node: &Node, output_files: &mut Vec<OutputFile>) -> Result<(), GenerateError> {
        let mut out = self.factory.create();

        let stem = match node {
            Node::File(file) => {
                self.backend.emit_file(&mut out, file)?;
                file.class.name.as_str()
            }
            node => {
                backend::emit_node(self.backend, &mut out, node)?;
                FRAGMENT_NAME
            }
        };

        output_files.push(OutputFile {
            name: format!("{stem}{}", B::EXTENSION),
            content: out.code().to_owned(),
        });
        Ok(())
    }
}

/// Generate the output files for a tree, indenting with the default width.
pub fn generate<B: Backend>(backend: &B, root: &Node) -> Result<Vec<OutputFile>, GenerateError> {
    Generator::new(backend, IndentWriterFactory::default()).generate(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::cpp::Cpp;
    use crate::backend::java::Java;
    use crate::ir::{
        BinOp, Block, ClassDecl, Expr, FieldDecl, IfStmt, MethodDef, Modifiers, Param, Prim,
        Reference, ReferenceKind, Stmt, Type,
    };

    fn int() -> Type {
        Type::Prim(Prim::Integer)
    }

    fn adder() -> Node {
        let mut class = ClassDecl::new("Adder");
        class.methods.push(MethodDef {
            modifiers: Modifiers::new(),
            name: "add".to_owned(),
            return_type: int(),
            params: vec![Param::new("a", int()), Param::new("b", int())],
            body: Block::new(vec![Stmt::Return(Some(Expr::binary(
                BinOp::Plus,
                Expr::param("a", int()),
                Expr::param("b", int()),
            )))]),
        });
        Node::Class(class)
    }

    #[test]
    fn adder_in_cpp() {
        let output_files = generate(&Cpp, &adder()).unwrap();

        assert_eq!(
            output_files,
            [OutputFile {
                name: "Adder.cpp".to_owned(),
                content: "\
class Adder {
public:
    int add(int a, int b) {
        return a + b;
    }
};
"
                .to_owned(),
            }],
        );
    }

    #[test]
    fn adder_in_java() {
        let output_files = generate(&Java, &adder()).unwrap();

        assert_eq!(output_files.len(), 1);
        assert_eq!(output_files[0].name, "Adder.java");
        assert_eq!(
            output_files[0].content,
            "\
public class Adder {
    public int add(int a, int b) {
        return a + b;
    }
}
",
        );
    }

    #[test]
    fn files_without_references_start_with_the_class() {
        let cpp = generate(&Cpp, &adder()).unwrap();
        let java = generate(&Java, &adder()).unwrap();

        for content in [&cpp[0].content, &java[0].content] {
            assert!(!content.starts_with('\n'), "{content:?}");
            assert!(content.contains("class Adder {"), "{content:?}");
        }
    }

    #[test]
    fn references_precede_the_class() {
        let mut class = ClassDecl::new("Named");
        class.fields.push(FieldDecl {
            modifiers: Modifiers::new(),
            r#type: Type::Prim(Prim::String),
            name: "name".to_owned(),
            init: None,
        });

        let output_files = generate(&Cpp, &Node::Class(class)).unwrap();

        assert_eq!(
            output_files[0].content,
            "\
#include <string>
using namespace std;

class Named {
public:
    string name;
};
",
        );
    }

    #[test]
    fn generation_is_deterministic() {
        let mut class = ClassDecl::new("Many");
        for (index, name) in ["x.A", "y.B", "z.C", "x.A", "w.D"].iter().enumerate() {
            class.fields.push(FieldDecl {
                modifiers: Modifiers::new(),
                r#type: Type::named(*name),
                name: format!("f{index}"),
                init: None,
            });
        }
        let root = Node::Class(class);

        let first = generate(&Cpp, &root).unwrap();
        let second = generate(&Cpp, &root.clone()).unwrap();

        assert_eq!(first, second);
        assert!(first[0].content.starts_with(
            "using w::D;\nusing x::A;\nusing y::B;\nusing z::C;\n\nclass Many {\n"
        ));
    }

    #[test]
    fn prepare_wraps_classes_in_files() {
        let generator = Generator::new(&Java, IndentWriterFactory::new(2));
        let mut class = ClassDecl::new("Wrapped");
        class.fields.push(FieldDecl {
            modifiers: Modifiers::new(),
            r#type: Type::named("java.util.Map"),
            name: "map".to_owned(),
            init: None,
        });

        match generator.prepare(&Node::Class(class)) {
            Node::File(file) => {
                assert_eq!(
                    file.references,
                    [Reference::new(ReferenceKind::Import, "java.util.Map")],
                );
                assert_eq!(file.class.fields[0].r#type, Type::named("Map"));
            }
            node => panic!("unexpected node: {node:?}"),
        }
    }

    #[test]
    fn prepare_merges_file_references() {
        let generator = Generator::new(&Java, IndentWriterFactory::default());
        let mut class = ClassDecl::new("Merged");
        class.fields.push(FieldDecl {
            modifiers: Modifiers::new(),
            r#type: Type::named("java.util.Set"),
            name: "set".to_owned(),
            init: None,
        });
        let file = FileDecl {
            references: vec![
                Reference::new(ReferenceKind::Import, "java.util.Set"),
                Reference::new(ReferenceKind::Import, "java.io.File"),
            ],
            class,
        };

        match generator.prepare(&Node::File(file)) {
            Node::File(file) => assert_eq!(
                file.references,
                [
                    Reference::new(ReferenceKind::Import, "java.io.File"),
                    Reference::new(ReferenceKind::Import, "java.util.Set"),
                ],
            ),
            node => panic!("unexpected node: {node:?}"),
        }
    }

    #[test]
    fn fragments() {
        let stmt = Node::Stmt(Stmt::Return(Some(Expr::int(1))));
        let output_files = Generator::new(&Cpp, IndentWriterFactory::new(2))
            .generate(&stmt)
            .unwrap();

        assert_eq!(
            output_files,
            [OutputFile {
                name: "Fragment.cpp".to_owned(),
                content: "return 1;\n".to_owned(),
            }],
        );
    }

    #[test]
    fn malformed_conditionals_produce_no_output() {
        let mut class = ClassDecl::new("Broken");
        class.methods.push(MethodDef {
            modifiers: Modifiers::new(),
            name: "check".to_owned(),
            return_type: Type::Prim(Prim::Void),
            params: Vec::new(),
            body: Block::new(vec![Stmt::If(IfStmt {
                conds: vec![Expr::param("a", Type::Prim(Prim::Boolean))],
                blocks: Vec::new(),
            })]),
        });

        match generate(&Cpp, &Node::Class(class)) {
            Err(GenerateError::MalformedConditional { conds, blocks, .. }) => {
                assert_eq!((conds, blocks), (1, 0));
            }
            result => panic!("unexpected result: {result:?}"),
        }
    }

    #[test]
    fn unsupported_primitives_produce_no_output() {
        let mut class = ClassDecl::new("Unsigned");
        class.fields.push(FieldDecl {
            modifiers: Modifiers::new(),
            r#type: Type::Prim(Prim::UnsignedShort),
            name: "width".to_owned(),
            init: None,
        });

        assert_eq!(
            generate(&Java, &Node::Class(class)),
            Err(GenerateError::UnsupportedPrimitive {
                backend: "java",
                prim: Prim::UnsignedShort,
            }),
        );
    }
}
