//! Declaration AST nodes.

use sable_core::{Mode, Span};

use crate::NodeId;
use crate::stmt::Block;

/// A whole program as the parser hands it over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceUnit<'ast> {
    pub classes: &'ast [ClassDecl<'ast>],
    pub span: Span,
}

/// Declared kind of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKindSpec {
    Reference,
    Abstract,
}

/// A class declaration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassDecl<'ast> {
    pub name: &'ast str,
    pub kind: ClassKindSpec,
    /// Declared abstract supertypes.
    pub supertypes: &'ast [TypeSpec<'ast>],
    /// Declared subtypes; only meaningful on abstract classes.
    pub subtypes: &'ast [TypeSpec<'ast>],
    pub members: &'ast [Member<'ast>],
    pub span: Span,
}

/// A class member.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Member<'ast> {
    Routine(&'ast RoutineDecl<'ast>),
    Iter(&'ast IterDecl<'ast>),
}

impl<'ast> Member<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Self::Routine(r) => r.span,
            Self::Iter(i) => i.span,
        }
    }

    pub fn name(&self) -> &'ast str {
        match self {
            Self::Routine(r) => r.name,
            Self::Iter(i) => i.name,
        }
    }
}

/// A routine declaration. `body` is `None` for abstract signatures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutineDecl<'ast> {
    pub name: &'ast str,
    pub params: &'ast [ParamDecl<'ast>],
    pub return_type: Option<TypeSpec<'ast>>,
    pub body: Option<Block<'ast>>,
    pub id: NodeId,
    pub span: Span,
}

/// An iterator declaration. Names end in `!` by convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterDecl<'ast> {
    pub name: &'ast str,
    pub params: &'ast [ParamDecl<'ast>],
    pub return_type: Option<TypeSpec<'ast>>,
    pub body: Option<Block<'ast>>,
    pub id: NodeId,
    pub span: Span,
}

/// A declared parameter with its passing mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDecl<'ast> {
    pub name: &'ast str,
    pub mode: Mode,
    pub ty: TypeSpec<'ast>,
    pub span: Span,
}

/// A type specifier: a name to be resolved against the registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeSpec<'ast> {
    pub name: &'ast str,
    pub span: Span,
}
