//! Sarah: typed elaboration and negation-normal form for a small logic.
//!
//! The language combines integer arithmetic, boolean connectives, relations and first-order
//! quantifiers over `bool` and `int`. Processing a program goes through three stages that
//! share one [`Context`](context::Context):
//!
//!  - [`syntax`] turns source text into untyped parse trees.
//!  - [`elaborate`] resolves names, type checks and builds typed expressions.
//!  - [`translate`] rewrites boolean expressions into negation-normal form.
//!
//! Every expression node is owned by the context and addressed through typed handles, so two
//! variables are the same exactly when they refer to the same declaration.
//!
//! Example
//! ```
//! use sarah::prelude::*;
//!
//! let mut cx = Context::new();
//! let factory = TreeFactory::new();
//! let tree = parse_expr("not (forall x : int . -x < 0)", &factory).unwrap();
//!
//! let mut diagnostics: Vec<Diagnostic> = Vec::new();
//! let elab = Elaborator::new(&mut cx, &mut diagnostics).elaborate(tree).unwrap();
//! let nnf = Translator::new(&mut cx).translate(elab);
//! assert_eq!(cx.display(nnf.expr).to_string(), "exists x : int . -x >= 0");
//! ```

/// Arena, factory and scope stack shared by every pass.
pub mod context;
/// Severities, diagnostics and the reporting boundary.
pub mod diagnostic;
/// Name resolution and type checking.
pub mod elaborate;
/// Elaboration failures.
pub mod error;
/// The expression and type algebra, and its printer.
pub mod expr;
/// Lexical environments.
pub mod scope;
/// Interned identifiers.
pub mod symbol;
/// Tokens, parse trees and the parser.
pub mod syntax;
/// Negation-normal-form translation.
pub mod translate;

pub mod prelude {
    //! Convenient re-exports for end users.
    pub use crate::context::{Context, ScopeGuard};
    pub use crate::diagnostic::{Diagnostic, DiagnosticSink, LogSink, Severity};
    pub use crate::elaborate::{ElabResult, Elaboration, Elaborator};
    pub use crate::error::ElabError;
    pub use crate::expr::pretty::{render_to, terminal_width, to_plain_string};
    pub use crate::expr::{Decl, DeclRef, Expr, ExprKind, ExprRef, TypeKind, TypeRef};
    pub use crate::syntax::{ParseError, Tree, TreeFactory, parse_expr, parse_program};
    pub use crate::translate::Translator;
}
