//! Structure-preserving rewrites of the intermediate representation.
//!
//! Each `fold_*` method of [`Fold`] rebuilds one kind of node. The default
//! implementations call the matching `walk_*` function, which rebuilds the
//! node with each of its children folded in turn. Implementors override only
//! the methods for the nodes they care about.
//!
//! Folds borrow their input and return a fresh tree, leaving the input
//! untouched.

use crate::ir::{
    Block, ClassDecl, ConstructorDecl, Expr, FieldDecl, FileDecl, IfStmt, MethodDef, MethodRef,
    Node, Param, Stmt, Type,
};

pub trait Fold {
    fn fold_node(&mut self, node: &Node) -> Node {
        walk_node(self, node)
    }

    fn fold_file(&mut self, file: &FileDecl) -> FileDecl {
        walk_file(self, file)
    }

    fn fold_class(&mut self, class: &ClassDecl) -> ClassDecl {
        walk_class(self, class)
    }

    fn fold_field(&mut self, field: &FieldDecl) -> FieldDecl {
        walk_field(self, field)
    }

    fn fold_constructor(&mut self, constructor: &ConstructorDecl) -> ConstructorDecl {
        walk_constructor(self, constructor)
    }

    fn fold_method(&mut self, method: &MethodDef) -> MethodDef {
        walk_method(self, method)
    }

    fn fold_block(&mut self, block: &Block) -> Block {
        walk_block(self, block)
    }

    fn fold_stmt(&mut self, stmt: &Stmt) -> Stmt {
        walk_stmt(self, stmt)
    }

    fn fold_if(&mut self, if_stmt: &IfStmt) -> IfStmt {
        walk_if(self, if_stmt)
    }

    fn fold_expr(&mut self, expr: &Expr) -> Expr {
        walk_expr(self, expr)
    }

    fn fold_param(&mut self, param: &Param) -> Param {
        walk_param(self, param)
    }

    fn fold_method_ref(&mut self, method: &MethodRef) -> MethodRef {
        walk_method_ref(self, method)
    }

    /// Type references are leaves, and are returned unchanged by default.
    fn fold_type(&mut self, r#type: &Type) -> Type {
        r#type.clone()
    }
}

pub fn walk_node<F: Fold + ?Sized>(folder: &mut F, node: &Node) -> Node {
    match node {
        Node::Expr(expr) => Node::Expr(folder.fold_expr(expr)),
        Node::Stmt(stmt) => Node::Stmt(folder.fold_stmt(stmt)),
        Node::Block(block) => Node::Block(folder.fold_block(block)),
        Node::Field(field) => Node::Field(folder.fold_field(field)),
        Node::Constructor(constructor) => Node::Constructor(folder.fold_constructor(constructor)),
        Node::Method(method) => Node::Method(folder.fold_method(method)),
        Node::Class(class) => Node::Class(folder.fold_class(class)),
        Node::File(file) => Node::File(folder.fold_file(file)),
    }
}

pub fn walk_file<F: Fold + ?Sized>(folder: &mut F, file: &FileDecl) -> FileDecl {
    FileDecl {
        references: file.references.clone(),
        class: folder.fold_class(&file.class),
    }
}

pub fn walk_class<F: Fold + ?Sized>(folder: &mut F, class: &ClassDecl) -> ClassDecl {
    ClassDecl {
        modifiers: class.modifiers,
        namespace: class.namespace.clone(),
        name: class.name.clone(),
        fields: (class.fields.iter())
            .map(|field| folder.fold_field(field))
            .collect(),
        constructors: (class.constructors.iter())
            .map(|constructor| folder.fold_constructor(constructor))
            .collect(),
        methods: (class.methods.iter())
            .map(|method| folder.fold_method(method))
            .collect(),
        classes: (class.classes.iter())
            .map(|class| folder.fold_class(class))
            .collect(),
    }
}

pub fn walk_field<F: Fold + ?Sized>(folder: &mut F, field: &FieldDecl) -> FieldDecl {
    FieldDecl {
        modifiers: field.modifiers,
        r#type: folder.fold_type(&field.r#type),
        name: field.name.clone(),
        init: field.init.as_ref().map(|init| folder.fold_expr(init)),
    }
}

pub fn walk_constructor<F: Fold + ?Sized>(
    folder: &mut F,
    constructor: &ConstructorDecl,
) -> ConstructorDecl {
    ConstructorDecl {
        modifiers: constructor.modifiers,
        params: (constructor.params.iter())
            .map(|param| folder.fold_param(param))
            .collect(),
        body: folder.fold_block(&constructor.body),
    }
}

pub fn walk_method<F: Fold + ?Sized>(folder: &mut F, method: &MethodDef) -> MethodDef {
    MethodDef {
        modifiers: method.modifiers,
        name: method.name.clone(),
        return_type: folder.fold_type(&method.return_type),
        params: (method.params.iter())
            .map(|param| folder.fold_param(param))
            .collect(),
        body: folder.fold_block(&method.body),
    }
}

pub fn walk_block<F: Fold + ?Sized>(folder: &mut F, block: &Block) -> Block {
    Block {
        stmts: block.stmts.iter().map(|stmt| folder.fold_stmt(stmt)).collect(),
    }
}

pub fn walk_stmt<F: Fold + ?Sized>(folder: &mut F, stmt: &Stmt) -> Stmt {
    match stmt {
        Stmt::Expr(expr) => Stmt::Expr(folder.fold_expr(expr)),
        Stmt::Decl { param, init } => Stmt::Decl {
            param: folder.fold_param(param),
            init: init.as_ref().map(|init| folder.fold_expr(init)),
        },
        Stmt::If(if_stmt) => Stmt::If(folder.fold_if(if_stmt)),
        Stmt::Block(block) => Stmt::Block(folder.fold_block(block)),
        Stmt::Return(expr) => Stmt::Return(expr.as_ref().map(|expr| folder.fold_expr(expr))),
        Stmt::Comment(text) => Stmt::Comment(text.clone()),
    }
}

pub fn walk_if<F: Fold + ?Sized>(folder: &mut F, if_stmt: &IfStmt) -> IfStmt {
    IfStmt {
        conds: (if_stmt.conds.iter())
            .map(|cond| folder.fold_expr(cond))
            .collect(),
        blocks: (if_stmt.blocks.iter())
            .map(|block| folder.fold_block(block))
            .collect(),
    }
}

pub fn walk_expr<F: Fold + ?Sized>(folder: &mut F, expr: &Expr) -> Expr {
    match expr {
        Expr::Const(r#const) => Expr::Const(r#const.clone()),
        Expr::Param(param) => Expr::Param(folder.fold_param(param)),
        Expr::Binary { op, lhs, rhs } => Expr::Binary {
            op: *op,
            lhs: Box::new(folder.fold_expr(lhs)),
            rhs: Box::new(folder.fold_expr(rhs)),
        },
        Expr::Assign { target, value } => Expr::Assign {
            target: Box::new(folder.fold_expr(target)),
            value: Box::new(folder.fold_expr(value)),
        },
        Expr::Call {
            receiver,
            method,
            args,
        } => Expr::Call {
            receiver: (receiver.as_ref()).map(|receiver| Box::new(folder.fold_expr(receiver))),
            method: folder.fold_method_ref(method),
            args: args.iter().map(|arg| folder.fold_expr(arg)).collect(),
        },
        Expr::New { r#type, args } => Expr::New {
            r#type: folder.fold_type(r#type),
            args: args.iter().map(|arg| folder.fold_expr(arg)).collect(),
        },
        Expr::Field { r#type, name } => Expr::Field {
            r#type: folder.fold_type(r#type),
            name: name.clone(),
        },
    }
}

pub fn walk_param<F: Fold + ?Sized>(folder: &mut F, param: &Param) -> Param {
    Param {
        name: param.name.clone(),
        r#type: folder.fold_type(&param.r#type),
    }
}

pub fn walk_method_ref<F: Fold + ?Sized>(folder: &mut F, method: &MethodRef) -> MethodRef {
    MethodRef {
        owner: folder.fold_type(&method.owner),
        name: method.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinOp, Const, Modifiers, Prim};

    struct Identity;

    impl Fold for Identity {}

    /// Records every type reference it sees, and replaces each with `T`.
    struct CollectTypes(Vec<Type>);

    impl Fold for CollectTypes {
        fn fold_type(&mut self, r#type: &Type) -> Type {
            self.0.push(r#type.clone());
            Type::named("T")
        }
    }

    fn sample_class() -> ClassDecl {
        let mut class = ClassDecl::new("Sample");
        class.fields.push(FieldDecl {
            modifiers: Modifiers::new(),
            r#type: Type::named("a.Field"),
            name: "field".to_owned(),
            init: Some(Expr::New {
                r#type: Type::named("a.New"),
                args: vec![Expr::Const(Const::Null)],
            }),
        });
        class.constructors.push(ConstructorDecl {
            modifiers: Modifiers::new(),
            params: vec![Param::new("p", Type::named("a.CtorParam"))],
            body: Block::new(vec![Stmt::Expr(Expr::assign(
                Expr::Field {
                    r#type: Type::named("a.FieldRef"),
                    name: "field".to_owned(),
                },
                Expr::param("p", Type::named("a.ParamRef")),
            ))]),
        });
        class.methods.push(MethodDef {
            modifiers: Modifiers::new(),
            name: "method".to_owned(),
            return_type: Type::named("a.Return"),
            params: Vec::new(),
            body: Block::new(vec![
                Stmt::Decl {
                    param: Param::new("local", Type::named("a.Local")),
                    init: None,
                },
                Stmt::If(IfStmt {
                    conds: vec![Expr::binary(
                        BinOp::Eq,
                        Expr::Call {
                            receiver: None,
                            method: MethodRef {
                                owner: Type::named("a.Owner"),
                                name: "get".to_owned(),
                            },
                            args: Vec::new(),
                        },
                        Expr::int(1),
                    )],
                    blocks: vec![Block::new(vec![Stmt::Return(Some(Expr::Const(
                        Const::Null,
                    )))])],
                }),
            ]),
        });
        class.classes.push(ClassDecl {
            fields: vec![FieldDecl {
                modifiers: Modifiers::new(),
                r#type: Type::Prim(Prim::Integer),
                name: "nested".to_owned(),
                init: None,
            }],
            ..ClassDecl::new("Nested")
        });
        class
    }

    #[test]
    fn identity_fold_rebuilds_equal_tree() {
        let node = Node::Class(sample_class());
        assert_eq!(Identity.fold_node(&node), node);
    }

    #[test]
    fn fold_type_reaches_every_type_reference() {
        let node = Node::Class(sample_class());
        let mut folder = CollectTypes(Vec::new());
        let folded = folder.fold_node(&node);

        assert_eq!(
            folder.0,
            [
                Type::named("a.Field"),
                Type::named("a.New"),
                Type::named("a.CtorParam"),
                Type::named("a.FieldRef"),
                Type::named("a.ParamRef"),
                Type::named("a.Return"),
                Type::named("a.Local"),
                Type::named("a.Owner"),
                Type::Prim(Prim::Integer),
            ],
        );

        let mut check = CollectTypes(Vec::new());
        check.fold_node(&folded);
        assert!(check.0.iter().all(|r#type| *r#type == Type::named("T")));
    }
}
