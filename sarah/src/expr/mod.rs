//! The expression and type algebra.
//!
//! Role
//! - [`Expr`] is the closed set of node kinds. Every composite node refers to already-built
//!   children through typed handles ([`ExprRef`], [`IntRef`], [`IdRef`], [`BindRef`],
//!   [`TypeRef`]) into the [`Context`](crate::context::Context) arena that owns it.
//! - Types are expressions too: [`Expr::Type`] nodes are the three per-context singletons
//!   `bool`, `int` and `kind` (the type of types).
//! - [`Decl`] records a name declared at a type, optionally with an initializer (a definition).
//!
//! Nodes are immutable once built and are never freed before the owning context.
//!
//! Example
//! ```
//! use sarah::context::Context;
//! use sarah::expr::{Expr, ExprKind};
//!
//! let mut cx = Context::new();
//! let three = cx.make_int(3);
//! let four = cx.make_int(4);
//! let sum = cx.make_add(three.expr(), four.expr());
//! assert_eq!(cx.kind(sum), ExprKind::Add);
//! assert!(matches!(cx.get(sum), Expr::Add(l, _) if *l == three.expr()));
//! ```
pub mod pretty;

use num_bigint::BigInt;
use strum::{EnumDiscriminants, EnumIs, EnumIter};

use crate::symbol::Symbol;

/// Handle to any expression node of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExprRef(pub(crate) u32);

impl ExprRef {
    /// Position of the node in the arena (construction order).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

macro_rules! define_typed_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) ExprRef);

        impl $name {
            /// Forget the static node kind.
            #[inline]
            pub fn expr(self) -> ExprRef {
                self.0
            }
        }

        impl From<$name> for ExprRef {
            fn from(value: $name) -> ExprRef {
                value.0
            }
        }
    };
}

define_typed_handle! {
    /// Handle to an [`Expr::Id`] node.
    IdRef
}

define_typed_handle! {
    /// Handle to an [`Expr::Int`] literal node.
    IntRef
}

define_typed_handle! {
    /// Handle to an [`Expr::Bind`] node.
    BindRef
}

define_typed_handle! {
    /// Handle to one of the type singletons ([`Expr::Type`]).
    ///
    /// Two type handles of the same context are equal iff they designate the same singleton.
    TypeRef
}

/// Handle to a declaration stored in a context.
///
/// Declaration identity is handle identity: two `Var` nodes denote the same variable iff they
/// carry the same `DeclRef`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeclRef(pub(crate) u32);

impl DeclRef {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The closed universe of types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum TypeKind {
    Bool,
    Int,
    /// The type of types.
    Kind,
}

impl TypeKind {
    /// Surface spelling of the type.
    pub fn spelling(self) -> &'static str {
        match self {
            TypeKind::Bool => "bool",
            TypeKind::Int => "int",
            TypeKind::Kind => "kind",
        }
    }
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.spelling())
    }
}

/// An expression node.
///
/// [`ExprKind`] is the field-less discriminant of this enum, convenient for dispatch tables
/// and assertions.
#[derive(Debug, Clone, EnumIs, EnumDiscriminants)]
#[strum_discriminants(name(ExprKind))]
#[strum_discriminants(derive(Hash, PartialOrd, Ord, EnumIter))]
#[strum_discriminants(vis(pub))]
pub enum Expr {
    // Atoms
    Id(Symbol),
    Bool(bool),
    Int(BigInt),
    Var { name: Symbol, decl: DeclRef },

    // Arithmetic
    Add(ExprRef, ExprRef),
    Sub(ExprRef, ExprRef),
    /// `factor * operand`
    Mul(IntRef, ExprRef),
    /// `operand / divisor`
    Div(IntRef, ExprRef),
    Neg(ExprRef),
    Pos(ExprRef),

    // Relational
    Eq(ExprRef, ExprRef),
    Ne(ExprRef, ExprRef),
    Lt(ExprRef, ExprRef),
    Gt(ExprRef, ExprRef),
    Le(ExprRef, ExprRef),
    Ge(ExprRef, ExprRef),

    // Logical
    And(ExprRef, ExprRef),
    Or(ExprRef, ExprRef),
    Imp(ExprRef, ExprRef),
    Iff(ExprRef, ExprRef),
    Not(ExprRef),

    // Binding and quantifiers
    Bind { name: IdRef, ty: TypeRef },
    Exists { bind: BindRef, body: ExprRef },
    Forall { bind: BindRef, body: ExprRef },

    // Types
    Type(TypeKind),
}

impl ExprKind {
    /// One of `==`, `!=`, `<`, `>`, `<=`, `>=`.
    pub fn is_relational(self) -> bool {
        use ExprKind::*;
        matches!(self, Eq | Ne | Lt | Gt | Le | Ge)
    }

    /// One of `and`, `or`, `->`, `<->`, `not`.
    pub fn is_logical(self) -> bool {
        use ExprKind::*;
        matches!(self, And | Or | Imp | Iff | Not)
    }

    /// One of `+`, `-` (binary and unary), `*`, `/`.
    pub fn is_arithmetic(self) -> bool {
        use ExprKind::*;
        matches!(self, Add | Sub | Mul | Div | Neg | Pos)
    }

    pub fn is_quantifier(self) -> bool {
        matches!(self, ExprKind::Exists | ExprKind::Forall)
    }

    /// Nodes without expression children.
    pub fn is_atom(self) -> bool {
        use ExprKind::*;
        matches!(self, Id | Bool | Int | Var | Type)
    }

    /// The relational operator denoting the complement of `self`, for relational kinds.
    ///
    /// `a < b` is false exactly when `a >= b` holds, and so on for the other pairs.
    pub fn negated_relation(self) -> Option<ExprKind> {
        use ExprKind::*;
        Some(match self {
            Eq => Ne,
            Ne => Eq,
            Lt => Ge,
            Gt => Le,
            Le => Gt,
            Ge => Lt,
            _ => return None,
        })
    }
}

impl Expr {
    /// Children of this node, in source order.
    ///
    /// Bind names and types are reported as children so that generic traversals see every node.
    pub fn children(&self) -> smallvec::SmallVec<[ExprRef; 2]> {
        use smallvec::smallvec;
        match self {
            Expr::Id(_) | Expr::Bool(_) | Expr::Int(_) | Expr::Var { .. } | Expr::Type(_) => {
                smallvec![]
            }
            Expr::Neg(e) | Expr::Pos(e) | Expr::Not(e) => smallvec![*e],
            Expr::Mul(n, e) | Expr::Div(n, e) => smallvec![n.expr(), *e],
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Eq(a, b)
            | Expr::Ne(a, b)
            | Expr::Lt(a, b)
            | Expr::Gt(a, b)
            | Expr::Le(a, b)
            | Expr::Ge(a, b)
            | Expr::And(a, b)
            | Expr::Or(a, b)
            | Expr::Imp(a, b)
            | Expr::Iff(a, b) => smallvec![*a, *b],
            Expr::Bind { name, ty } => smallvec![name.expr(), ty.expr()],
            Expr::Exists { bind, body } | Expr::Forall { bind, body } => {
                smallvec![bind.expr(), *body]
            }
        }
    }
}

/// A name declared at a type, in some environment.
///
/// A declaration with an initializer is a definition (`Def`): the predefined `bool`/`int`
/// names are `kind`-typed definitions whose initializers are the type singletons, and `let`
/// statements produce constants or type aliases.
#[derive(Debug, Clone)]
pub struct Decl {
    pub name: IdRef,
    pub ty: TypeRef,
    pub init: Option<ExprRef>,
}

impl Decl {
    /// Whether this declaration is a definition.
    #[inline]
    pub fn is_def(&self) -> bool {
        self.init.is_some()
    }
}
