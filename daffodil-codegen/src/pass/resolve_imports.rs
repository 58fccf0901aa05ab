//! Resolution of the external references required by a tree.
//!
//! This pass rewrites every type reference in a tree into the form that a
//! backend can emit, collecting the [references][Reference] that the
//! rewritten tree depends on along the way. Backends customise the pass by
//! implementing [`ResolveImports`].

use fxhash::FxHashSet;
use itertools::Itertools;

use crate::ir::fold::Fold;
use crate::ir::{Node, Reference, Type};

/// The backend-specific part of the pass.
pub trait ResolveImports {
    /// Decide which references a type needs, recording them in `imports`, and
    /// return the type that should appear in the rewritten tree.
    ///
    /// Types that the backend does not recognise should be returned
    /// unchanged.
    fn resolve_type(&self, r#type: &Type, imports: &mut Imports) -> Type;
}

/// A deduplicated, unordered set of references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Imports {
    references: FxHashSet<Reference>,
}

impl Imports {
    pub fn new() -> Imports {
        Imports::default()
    }

    /// Add a reference, returning `false` if it was already present.
    pub fn insert(&mut self, reference: Reference) -> bool {
        self.references.insert(reference)
    }

    pub fn contains(&self, reference: &Reference) -> bool {
        self.references.contains(reference)
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// The references in a canonical order, so that output built from them is
    /// reproducible.
    pub fn into_sorted_vec(self) -> Vec<Reference> {
        self.references.into_iter().sorted().collect()
    }
}

impl Extend<Reference> for Imports {
    fn extend<I: IntoIterator<Item = Reference>>(&mut self, iter: I) {
        self.references.extend(iter);
    }
}

pub struct Context<'r, R: ?Sized> {
    resolver: &'r R,
    imports: Imports,
}

impl<'r, R: ResolveImports + ?Sized> Context<'r, R> {
    pub fn new(resolver: &'r R) -> Context<'r, R> {
        Context {
            resolver,
            imports: Imports::new(),
        }
    }

    pub fn into_imports(self) -> Imports {
        self.imports
    }
}

impl<'r, R: ResolveImports + ?Sized> Fold for Context<'r, R> {
    fn fold_type(&mut self, r#type: &Type) -> Type {
        self.resolver.resolve_type(r#type, &mut self.imports)
    }
}

/// Rewrite the type references in `root`, returning the rewritten tree along
/// with the references it requires. The input tree is left unchanged.
pub fn resolve_imports<R: ResolveImports + ?Sized>(resolver: &R, root: &Node) -> (Node, Imports) {
    let mut context = Context::new(resolver);
    let root = context.fold_node(root);
    (root, context.into_imports())
}
