//! RcDoc-based pretty-printer with termcolor annotations for expressions.
//!
//! Role
//! - Convert an expression of a [`Context`] into an annotated document suitable for
//!   width-aware rendering.
//! - Provide colored output for terminals and plain strings for logs/tests.
//!
//! The output is surface syntax: printing an elaborated expression and parsing/elaborating the
//! text again in the same scope yields a [`Context::same`] expression. Parentheses are only
//! inserted where the grammar's precedence requires them. `Mul(n, e)` prints as `n * e` and
//! `Div(n, e)` as `e / n`.
use std::io::{self, Write};

use pretty::{FmtWrite, RcDoc, RenderAnnotated};
use termcolor::{Color, ColorSpec, WriteColor};

use crate::context::Context;
use crate::expr::{Expr, ExprKind, ExprRef};

/// Styles used to annotate parts of the pretty-printed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Punct, // colons, periods
    /// Parentheses are colored by nesting depth so matching pairs share a color.
    Paren(u8),
    Keyword,  // forall, exists, not, and, or
    Operator, // +, *, <, ->, <->
    Ident,    // variables and bound names
    Literal,  // integers, true, false
    Type,     // bool, int, kind
}

impl Style {
    fn to_color_spec(self) -> ColorSpec {
        let mut s = ColorSpec::new();
        match self {
            Style::Punct => {
                s.set_dimmed(true);
            }
            Style::Paren(depth) => {
                let fg = match depth % 6 {
                    0 => Color::Blue,
                    1 => Color::Green,
                    2 => Color::White,
                    3 => Color::Yellow,
                    4 => Color::Red,
                    _ => Color::Magenta,
                };
                s.set_fg(Some(fg)).set_dimmed(true);
            }
            Style::Keyword => {
                s.set_fg(Some(Color::Cyan)).set_bold(true);
            }
            Style::Operator => {
                s.set_fg(Some(Color::Yellow)).set_bold(true);
            }
            Style::Ident => {
                s.set_fg(Some(Color::Green)).set_bold(true);
            }
            Style::Literal => {
                s.set_fg(Some(Color::Blue));
            }
            Style::Type => {
                s.set_fg(Some(Color::Magenta));
            }
        }
        s
    }
}

fn styled(style: Style, s: &'static str) -> RcDoc<'static, Style> {
    RcDoc::as_string(s).annotate(style)
}

fn punct(s: &'static str) -> RcDoc<'static, Style> {
    styled(Style::Punct, s)
}

#[inline]
fn lparen(depth: u8) -> RcDoc<'static, Style> {
    RcDoc::as_string("(").annotate(Style::Paren(depth))
}

#[inline]
fn rparen(depth: u8) -> RcDoc<'static, Style> {
    RcDoc::as_string(")").annotate(Style::Paren(depth))
}

fn kw(s: &'static str) -> RcDoc<'static, Style> {
    styled(Style::Keyword, s)
}

fn op(s: &'static str) -> RcDoc<'static, Style> {
    styled(Style::Operator, s)
}

fn ident(name: impl std::fmt::Display) -> RcDoc<'static, Style> {
    RcDoc::as_string(name).annotate(Style::Ident)
}

/// Binding strength, loosest first, following the parser's precedence chain.
fn precedence(kind: ExprKind) -> u8 {
    use ExprKind::*;

    match kind {
        Forall | Exists | Bind => 0,
        Iff => 1,
        Imp => 2,
        Or => 3,
        And => 4,
        Not => 5,
        Eq | Ne => 6,
        Lt | Gt | Le | Ge => 7,
        Add | Sub => 8,
        Mul | Div => 9,
        Neg | Pos => 10,
        Id | Bool | Int | Var | Type => 11,
    }
}

fn operator(kind: ExprKind) -> RcDoc<'static, Style> {
    use ExprKind::*;

    match kind {
        Add => op("+"),
        Sub => op("-"),
        Mul => op("*"),
        Div => op("/"),
        Eq => op("=="),
        Ne => op("!="),
        Lt => op("<"),
        Gt => op(">"),
        Le => op("<="),
        Ge => op(">="),
        And => kw("and"),
        Or => kw("or"),
        Imp => op("->"),
        Iff => op("<->"),
        other => unreachable!("{other:?} is not an infix operator"),
    }
}

struct Printer<'c> {
    cx: &'c Context,
}

impl Printer<'_> {
    /// Print `e`, wrapped in parentheses when its precedence is below `min`.
    fn child(&self, e: ExprRef, min: u8, depth: u8) -> RcDoc<'static, Style> {
        if precedence(self.cx.kind(e)) < min {
            lparen(depth)
                .append(self.doc(e, depth + 1))
                .append(rparen(depth))
                .group()
        } else {
            self.doc(e, depth)
        }
    }

    fn infix(
        &self,
        kind: ExprKind,
        left: ExprRef,
        right: ExprRef,
        depth: u8,
    ) -> RcDoc<'static, Style> {
        let p = precedence(kind);
        // `->` associates to the right, everything else to the left
        let (left_min, right_min) = if kind == ExprKind::Imp {
            (p + 1, p)
        } else {
            (p, p + 1)
        };
        let separator = if kind.is_logical() {
            RcDoc::line()
        } else {
            RcDoc::space()
        };
        self.child(left, left_min, depth)
            .append(separator)
            .append(operator(kind))
            .append(RcDoc::space())
            .append(self.child(right, right_min, depth))
            .group()
    }

    fn doc(&self, e: ExprRef, depth: u8) -> RcDoc<'static, Style> {
        let kind = self.cx.kind(e);
        match self.cx.get(e) {
            Expr::Id(name) | Expr::Var { name, .. } => ident(name),
            Expr::Bool(true) => styled(Style::Literal, "true"),
            Expr::Bool(false) => styled(Style::Literal, "false"),
            Expr::Int(value) => RcDoc::as_string(value).annotate(Style::Literal),
            Expr::Type(ty) => styled(Style::Type, ty.spelling()),

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
            | Expr::Iff(a, b) => self.infix(kind, *a, *b, depth),
            Expr::Mul(factor, operand) => self.infix(kind, factor.expr(), *operand, depth),
            Expr::Div(divisor, operand) => self.infix(kind, *operand, divisor.expr(), depth),

            Expr::Neg(a) => op("-").append(self.child(*a, precedence(kind), depth)),
            Expr::Pos(a) => op("+").append(self.child(*a, precedence(kind), depth)),
            Expr::Not(a) => kw("not")
                .append(RcDoc::space())
                .append(self.child(*a, precedence(kind), depth))
                .group(),

            Expr::Bind { name, ty } => ident(self.cx.symbol(*name))
                .append(RcDoc::space())
                .append(punct(":"))
                .append(RcDoc::space())
                .append(self.doc(ty.expr(), depth)),
            Expr::Forall { bind, body } | Expr::Exists { bind, body } => {
                let keyword = if kind == ExprKind::Forall {
                    kw("forall")
                } else {
                    kw("exists")
                };
                keyword
                    .append(RcDoc::space())
                    .append(self.doc(bind.expr(), depth))
                    .append(RcDoc::space())
                    .append(punct("."))
                    .append(RcDoc::line().append(self.doc(*body, depth)).nest(2))
                    .group()
            }
        }
    }
}

/// Build the annotated document of `expr`.
pub fn to_doc(cx: &Context, expr: impl Into<ExprRef>) -> RcDoc<'static, Style> {
    Printer { cx }.doc(expr.into(), 0)
}

// A writer that maps Style annotations to termcolor ColorSpec on a WriteColor sink.
struct ColorWriter<'w, W: WriteColor + Write> {
    out: &'w mut W,
}

impl<'a, W: WriteColor + Write> RenderAnnotated<'a, Style> for ColorWriter<'_, W> {
    fn push_annotation(&mut self, ann: &'a Style) -> io::Result<()> {
        self.out.set_color(&ann.to_color_spec())
    }
    fn pop_annotation(&mut self) -> io::Result<()> {
        self.out.reset()
    }
}

impl<W: WriteColor + Write> pretty::Render for ColorWriter<'_, W> {
    type Error = io::Error;
    fn write_str(&mut self, s: &str) -> io::Result<usize> {
        self.out.write_all(s.as_bytes())?;
        Ok(s.len())
    }
    fn write_str_all(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(s.as_bytes())
    }
    fn fail_doc(&self) -> Self::Error {
        io::Error::other("render failed")
    }
}

/// Render `expr` to a `termcolor::WriteColor` with width-aware layout.
pub fn render_to<W: WriteColor + Write>(
    cx: &Context,
    expr: impl Into<ExprRef>,
    width: usize,
    out: &mut W,
) -> io::Result<()> {
    let mut cw = ColorWriter { out };
    to_doc(cx, expr).render_raw(width, &mut cw)
}

/// Format `expr` into a plain string without colors.
pub fn to_plain_string(cx: &Context, expr: impl Into<ExprRef>, width: usize) -> String {
    let mut buf = String::new();
    let _ = to_doc(cx, expr).render_fmt(width, &mut buf);
    buf
}

/// The width of the terminal, or 80 if it cannot be determined.
pub fn terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// [`Display`](std::fmt::Display) adapter for an expression of a context.
pub struct Pretty<'c> {
    cx: &'c Context,
    expr: ExprRef,
}

impl std::fmt::Display for Pretty<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut w = FmtWrite::new(f);
        to_doc(self.cx, self.expr).render_raw(80, &mut w)
    }
}

impl Context {
    /// Display `expr` as surface syntax.
    pub fn display(&self, expr: impl Into<ExprRef>) -> Pretty<'_> {
        Pretty {
            cx: self,
            expr: expr.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parentheses_follow_associativity() {
        let mut cx = Context::new();
        let bool_ty = cx.bool_type();
        let (p, q, r) = (
            cx.declare("p", bool_ty),
            cx.declare("q", bool_ty),
            cx.declare("r", bool_ty),
        );
        let (p, q, r) = (cx.make_var(p), cx.make_var(q), cx.make_var(r));

        let right_nested = cx.make_imp(q, r);
        let imp = cx.make_imp(p, right_nested);
        assert_eq!(cx.display(imp).to_string(), "p -> q -> r");

        let left_nested = cx.make_imp(p, q);
        let imp = cx.make_imp(left_nested, r);
        assert_eq!(cx.display(imp).to_string(), "(p -> q) -> r");

        let or = cx.make_or(p, q);
        let and = cx.make_and(or, r);
        assert_eq!(cx.display(and).to_string(), "(p or q) and r");
    }

    #[test]
    fn factors_print_in_source_order() {
        let mut cx = Context::new();
        let int = cx.int_type();
        let x = cx.declare("x", int);
        let x = cx.make_var(x);
        let two = cx.make_int(2);
        let mul = cx.make_mul(two, x);
        let div = cx.make_div(two, x);
        assert_eq!(cx.display(mul).to_string(), "2 * x");
        assert_eq!(cx.display(div).to_string(), "x / 2");
    }
}
