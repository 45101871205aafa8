//! Negation-normal-form translation.
//!
//! [`Translator::translate_expr`] threads a `carrying_not` flag down the tree: `true` means an
//! ancestor negation has not been applied yet. The flag is discharged by duality:
//!
//! | node          | flag off                      | flag on                              |
//! |---------------|-------------------------------|--------------------------------------|
//! | `a R b`       | `a R b`                       | `a R' b` (`R'` the complement of `R`)|
//! | `a and b`     | `a and b`                     | `¬a or ¬b`                           |
//! | `a or b`      | `a or b`                      | `¬a and ¬b`                          |
//! | `a -> b`      | `¬a or b`                     | `a and ¬b`                           |
//! | `a <-> b`     | `(a or ¬b) and (b or ¬a)`     | `(¬a and b) or (¬b and a)`           |
//! | `not a`       | `a` with flag on              | `a` with flag off                    |
//! | `exists b. e` | `exists b. e`                 | `forall b. ¬e`                       |
//! | `forall b. e` | `forall b. e`                 | `exists b. ¬e`                       |
//! | `true`/`false`| itself                        | the other literal                    |
//! | bool variable | itself                        | `not p`                              |
//!
//! Arithmetic operands carry no polarity and are translated with the flag off. The output
//! contains no `->`, no `<->`, and `not` only directly above a variable or identifier.
//!
//! Nodes whose translation would be identical to the input are reused rather than rebuilt.
use log::trace;

use crate::{
    context::Context,
    elaborate::Elaboration,
    expr::{Expr, ExprKind, ExprRef},
};

pub struct Translator<'c> {
    cx: &'c mut Context,
}

impl<'c> Translator<'c> {
    pub fn new(cx: &'c mut Context) -> Self {
        Translator { cx }
    }

    /// Negation-normal form of `elab`. The type is unchanged.
    pub fn translate(&mut self, elab: Elaboration) -> Elaboration {
        Elaboration::new(self.translate_expr(elab.expr, false), elab.ty)
    }

    /// Negation-normal form of the negation of `elab`.
    ///
    /// # Panics
    /// If `elab` is not a boolean formula (see [`Elaboration::is_formula`]).
    pub fn translate_negated(&mut self, elab: Elaboration) -> Elaboration {
        assert!(
            elab.is_formula(self.cx),
            "only boolean formulas can be negated, not {:?}",
            self.cx.kind(elab.expr)
        );
        Elaboration::new(self.translate_expr(elab.expr, true), elab.ty)
    }

    /// Translate `expr` under the pending negation `carrying_not`.
    pub fn translate_expr(&mut self, expr: ExprRef, carrying_not: bool) -> ExprRef {
        let kind = self.cx.kind(expr);
        let result = match *self.cx.get(expr) {
            // Relations
            Expr::Eq(a, b)
            | Expr::Ne(a, b)
            | Expr::Lt(a, b)
            | Expr::Gt(a, b)
            | Expr::Le(a, b)
            | Expr::Ge(a, b) => {
                let target = if carrying_not {
                    kind.negated_relation()
                        .unwrap_or_else(|| unreachable!("{kind:?} is relational"))
                } else {
                    kind
                };
                let (a, b) = (self.translate_expr(a, false), self.translate_expr(b, false));
                self.rebuild(expr, target, a, b)
            }

            // Connectives
            Expr::And(a, b) | Expr::Or(a, b) => {
                let target = match (kind, carrying_not) {
                    (k, false) => k,
                    (ExprKind::And, true) => ExprKind::Or,
                    _ => ExprKind::And,
                };
                let a = self.translate_expr(a, carrying_not);
                let b = self.translate_expr(b, carrying_not);
                self.rebuild(expr, target, a, b)
            }
            Expr::Imp(a, b) => {
                if carrying_not {
                    let a = self.translate_expr(a, false);
                    let b = self.translate_expr(b, true);
                    self.cx.make_and(a, b)
                } else {
                    let a = self.translate_expr(a, true);
                    let b = self.translate_expr(b, false);
                    self.cx.make_or(a, b)
                }
            }
            Expr::Iff(a, b) => {
                let (pos_a, neg_a) = (self.translate_expr(a, false), self.translate_expr(a, true));
                let (pos_b, neg_b) = (self.translate_expr(b, false), self.translate_expr(b, true));
                if carrying_not {
                    let left = self.cx.make_and(neg_a, pos_b);
                    let right = self.cx.make_and(neg_b, pos_a);
                    self.cx.make_or(left, right)
                } else {
                    let left = self.cx.make_or(pos_a, neg_b);
                    let right = self.cx.make_or(pos_b, neg_a);
                    self.cx.make_and(left, right)
                }
            }
            Expr::Not(a) => self.translate_expr(a, !carrying_not),

            // Quantifiers
            Expr::Exists { bind, body: old } | Expr::Forall { bind, body: old } => {
                let body = self.translate_expr(old, carrying_not);
                let target = match (kind, carrying_not) {
                    (k, false) => k,
                    (ExprKind::Forall, true) => ExprKind::Exists,
                    _ => ExprKind::Forall,
                };
                if target == kind && body == old {
                    expr
                } else if target == ExprKind::Forall {
                    self.cx.make_forall(bind, body)
                } else {
                    self.cx.make_exists(bind, body)
                }
            }

            // Arithmetic
            Expr::Add(a, b) | Expr::Sub(a, b) => {
                let (a, b) = (self.translate_expr(a, false), self.translate_expr(b, false));
                self.rebuild(expr, kind, a, b)
            }
            Expr::Mul(factor, operand) | Expr::Div(factor, operand) => {
                let translated = self.translate_expr(operand, false);
                if translated == operand {
                    expr
                } else if kind == ExprKind::Mul {
                    self.cx.make_mul(factor, translated)
                } else {
                    self.cx.make_div(factor, translated)
                }
            }
            Expr::Neg(a) | Expr::Pos(a) => {
                let translated = self.translate_expr(a, false);
                if translated == a {
                    expr
                } else if kind == ExprKind::Neg {
                    self.cx.make_neg(translated)
                } else {
                    self.cx.make_pos(translated)
                }
            }

            // Atoms
            Expr::Bool(value) if carrying_not => self.cx.make_bool(!value),
            Expr::Var { decl, .. } if carrying_not => {
                if self.cx.decl(decl).ty == self.cx.bool_type() {
                    self.cx.make_not(expr)
                } else {
                    expr
                }
            }
            Expr::Id(_) if carrying_not => self.cx.make_not(expr),
            Expr::Id(_)
            | Expr::Bool(_)
            | Expr::Int(_)
            | Expr::Var { .. }
            | Expr::Bind { .. }
            | Expr::Type(_) => expr,
        };

        trace!(
            "translated {kind:?}#{} (negated: {carrying_not}) to {:?}#{}",
            expr.index(),
            self.cx.kind(result),
            result.index()
        );
        result
    }

    /// The binary node `target(a, b)`, reusing `original` when nothing changed.
    fn rebuild(&mut self, original: ExprRef, target: ExprKind, a: ExprRef, b: ExprRef) -> ExprRef {
        let unchanged = target == self.cx.kind(original)
            && matches!(self.cx.get(original).children().as_slice(), [x, y] if *x == a && *y == b);
        if unchanged {
            original
        } else {
            self.cx.make_binary(target, a, b)
        }
    }
}

/// Negation-normal form of `expr`, without an outstanding negation.
pub fn translate(cx: &mut Context, expr: ExprRef) -> ExprRef {
    Translator::new(cx).translate_expr(expr, false)
}
