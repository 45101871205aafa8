use strum::EnumIs;
use thiserror::Error;

use crate::expr::TypeKind;

/// Why an elaboration failed.
#[derive(Debug, Clone, PartialEq, Eq, EnumIs, Error)]
pub enum ElabError {
    /// An identifier is bound in none of the active environments.
    #[error("cannot find `{name}` in this scope")]
    UnboundName { name: String },

    /// An operand does not have the type its operator requires.
    #[error("mismatched types: expected `{expected}`, found `{found}`")]
    TypeMismatch { expected: TypeKind, found: TypeKind },

    /// The right-hand side of a binding does not designate a type.
    #[error("`{name}` is not a type")]
    NotAType { name: String },

    /// The right-hand side of a binding names a declaration without a definition.
    #[error("`{name}` is declared as a type but has no definition")]
    IncompleteType { name: String },

    /// Neither operand of a product (or the divisor of a quotient) is an integer literal.
    #[error("`{op}` requires an integer literal factor")]
    NonLiteralFactor { op: String },

    /// A top-level declaration reuses a name already bound in the same environment.
    #[error("`{name}` is already declared in this scope")]
    Redeclaration { name: String },

    /// An integer literal whose spelling is not a decimal number.
    #[error("malformed integer literal `{spell}`")]
    MalformedLiteral { spell: String },

    /// A parse tree shape that has no meaning in the expression language.
    #[error("malformed syntax tree: {reason}")]
    MalformedTree { reason: String },
}
