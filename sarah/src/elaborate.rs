//! Elaboration: from untyped parse trees to typed expressions.
//!
//! The [`Elaborator`] resolves names against the context's scope stack, checks every operator
//! against its fixed signature and builds the corresponding nodes. A failure is reported once,
//! where it is detected, and then travels up as `Err`; no node is built above a failed child.
//!
//! Operator signatures
//! - `+ - * /` (binary) and prefix `+ -`: `int` operands, `int` result.
//! - `== != < > <= >=`: `int` operands, `bool` result.
//! - `and or -> <->` and `not`: `bool` operands, `bool` result.
//! - `x : T`: `T` must designate a type; the result is the binding, typed `T`.
//! - `forall`/`exists`: the body is elaborated in a fresh scope holding the bound variable and
//!   must be `bool`.
use log::debug;
use num_bigint::BigInt;

use crate::{
    context::{Context, ScopeGuard},
    diagnostic::{Diagnostic, DiagnosticSink},
    error::ElabError,
    expr::{BindRef, Expr, ExprRef, IdRef, TypeRef},
    syntax::{Span, Token, TokenKind, Tree},
};

/// A successfully elaborated expression together with its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elaboration {
    pub expr: ExprRef,
    pub ty: TypeRef,
}

impl Elaboration {
    pub fn new(expr: ExprRef, ty: TypeRef) -> Self {
        Elaboration { expr, ty }
    }

    /// Whether this is a boolean formula, so something the translator can negate.
    ///
    /// A binding `p : bool` is typed `bool` but declares `p` rather than asserting anything.
    pub fn is_formula(&self, cx: &Context) -> bool {
        self.ty == cx.bool_type() && !cx.get(self.expr).is_bind()
    }
}

pub type ElabResult = Result<Elaboration, ElabError>;

/// Operand and result types of a binary operator.
#[derive(Debug, Clone, Copy)]
struct Signature {
    operand: TypeRef,
    result: TypeRef,
}

pub struct Elaborator<'c, 'd> {
    cx: &'c mut Context,
    sink: &'d mut dyn DiagnosticSink,
}

impl AsMut<Context> for Elaborator<'_, '_> {
    fn as_mut(&mut self) -> &mut Context {
        self.cx
    }
}

impl<'c, 'd> Elaborator<'c, 'd> {
    pub fn new(cx: &'c mut Context, sink: &'d mut dyn DiagnosticSink) -> Self {
        Elaborator { cx, sink }
    }

    pub fn context(&self) -> &Context {
        self.cx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        self.cx
    }

    /// Report `error` at `span` and hand it back for propagation.
    fn fail(&mut self, error: ElabError, span: Span) -> ElabError {
        self.sink.report(Diagnostic::error(error.to_string(), Some(span)));
        error
    }

    fn expect_type(
        &mut self,
        elab: Elaboration,
        expected: TypeRef,
        span: Span,
    ) -> Result<(), ElabError> {
        if elab.ty == expected {
            return Ok(());
        }
        let error = ElabError::TypeMismatch {
            expected: self.cx.type_kind(expected),
            found: self.cx.type_kind(elab.ty),
        };
        Err(self.fail(error, span))
    }

    fn malformed(&mut self, reason: impl Into<String>, span: Span) -> ElabError {
        self.fail(
            ElabError::MalformedTree {
                reason: reason.into(),
            },
            span,
        )
    }

    // ---------------------------- Expressions ----------------------------

    /// Elaborate one expression tree.
    pub fn elaborate(&mut self, tree: &Tree<'_>) -> ElabResult {
        match tree {
            Tree::Enclosed { arg, .. } => self.elaborate(arg),
            Tree::Terminal(token) => self.elaborate_terminal(*token),
            Tree::Unary { op, arg } => self.elaborate_unary(*op, arg, tree.span()),
            Tree::Binary { op, left, right } => match op.kind {
                TokenKind::Forall | TokenKind::Exists => {
                    self.elaborate_quantifier(*op, left, right)
                }
                TokenKind::Colon => {
                    let (bind, ty) = self.elaborate_binding(left, right)?;
                    Ok(Elaboration::new(bind.expr(), ty))
                }
                TokenKind::Assign => Err(self.malformed(
                    "definitions are only allowed as statements",
                    tree.span(),
                )),
                _ => self.elaborate_binary(*op, left, right),
            },
        }
    }

    fn elaborate_terminal(&mut self, token: Token<'_>) -> ElabResult {
        match token.kind {
            TokenKind::Identifier | TokenKind::BoolType | TokenKind::IntType => {
                match self.cx.lookup(token.spell) {
                    Some(decl) => {
                        let ty = self.cx.decl(decl).ty;
                        let var = self.cx.make_var(decl);
                        Ok(Elaboration::new(var, ty))
                    }
                    None => {
                        let error = ElabError::UnboundName {
                            name: token.spell.to_string(),
                        };
                        Err(self.fail(error, token.span))
                    }
                }
            }
            TokenKind::True | TokenKind::False => {
                let value = self.cx.make_bool(token.kind == TokenKind::True);
                Ok(Elaboration::new(value, self.cx.bool_type()))
            }
            TokenKind::IntLiteral => match BigInt::parse_bytes(token.spell.as_bytes(), 10) {
                Some(value) => {
                    let literal = self.cx.make_int(value);
                    Ok(Elaboration::new(literal.expr(), self.cx.int_type()))
                }
                None => {
                    let error = ElabError::MalformedLiteral {
                        spell: token.spell.to_string(),
                    };
                    Err(self.fail(error, token.span))
                }
            },
            _ => Err(self.malformed(
                format!("`{}` cannot stand alone", token.spell),
                token.span,
            )),
        }
    }

    fn elaborate_unary(&mut self, op: Token<'_>, arg: &Tree<'_>, span: Span) -> ElabResult {
        let (int, bool) = (self.cx.int_type(), self.cx.bool_type());
        let expected = match op.kind {
            TokenKind::Minus | TokenKind::Plus => int,
            TokenKind::Not => bool,
            _ => {
                return Err(self.malformed(
                    format!("`{}` is not a prefix operator", op.spell),
                    span,
                ));
            }
        };

        let operand = self.elaborate(arg)?;
        self.expect_type(operand, expected, arg.span())?;

        let expr = match op.kind {
            TokenKind::Minus => self.cx.make_neg(operand.expr),
            TokenKind::Plus => self.cx.make_pos(operand.expr),
            _ => self.cx.make_not(operand.expr),
        };
        Ok(Elaboration::new(expr, expected))
    }

    fn signature(&self, op: TokenKind) -> Option<Signature> {
        use TokenKind::*;
        let (int, bool) = (self.cx.int_type(), self.cx.bool_type());
        let (operand, result) = match op {
            Plus | Minus | Star | Slash => (int, int),
            EqEq | NotEq | Less | Greater | LessEq | GreaterEq => (int, bool),
            And | Or | Arrow | LeftRight => (bool, bool),
            _ => return None,
        };
        Some(Signature { operand, result })
    }

    fn elaborate_binary(&mut self, op: Token<'_>, left: &Tree<'_>, right: &Tree<'_>) -> ElabResult {
        let Some(signature) = self.signature(op.kind) else {
            let span = left.span().join(op.span).join(right.span());
            return Err(self.malformed(
                format!("`{}` is not a binary operator", op.spell),
                span,
            ));
        };

        let lhs = self.elaborate(left)?;
        let rhs = self.elaborate(right)?;

        // Both operands are checked so that each mismatch gets its own diagnostic
        let left_check = self.expect_type(lhs, signature.operand, left.span());
        let right_check = self.expect_type(rhs, signature.operand, right.span());
        left_check?;
        right_check?;

        let (a, b) = (lhs.expr, rhs.expr);
        let expr = match op.kind {
            TokenKind::Plus => self.cx.make_add(a, b),
            TokenKind::Minus => self.cx.make_sub(a, b),
            TokenKind::Star => {
                if let Some(factor) = self.cx.as_int(a) {
                    self.cx.make_mul(factor, b)
                } else if let Some(factor) = self.cx.as_int(b) {
                    self.cx.make_mul(factor, a)
                } else {
                    let error = ElabError::NonLiteralFactor {
                        op: op.spell.to_string(),
                    };
                    return Err(self.fail(error, left.span().join(right.span())));
                }
            }
            TokenKind::Slash => match self.cx.as_int(b) {
                Some(divisor) => self.cx.make_div(divisor, a),
                None => {
                    let error = ElabError::NonLiteralFactor {
                        op: op.spell.to_string(),
                    };
                    return Err(self.fail(error, right.span()));
                }
            },
            TokenKind::EqEq => self.cx.make_eq(a, b),
            TokenKind::NotEq => self.cx.make_ne(a, b),
            TokenKind::Less => self.cx.make_lt(a, b),
            TokenKind::Greater => self.cx.make_gt(a, b),
            TokenKind::LessEq => self.cx.make_le(a, b),
            TokenKind::GreaterEq => self.cx.make_ge(a, b),
            TokenKind::And => self.cx.make_and(a, b),
            TokenKind::Or => self.cx.make_or(a, b),
            TokenKind::Arrow => self.cx.make_imp(a, b),
            TokenKind::LeftRight => self.cx.make_iff(a, b),
            other => unreachable!("{other:?} has a signature but no constructor"),
        };
        Ok(Elaboration::new(expr, signature.result))
    }

    /// The type singleton designated by a `kind`-typed elaboration.
    ///
    /// Only a variable referring to a definition whose initializer is a type designates a type.
    fn resolve_type(&mut self, elab: Elaboration, span: Span) -> Result<TypeRef, ElabError> {
        let kind = self.cx.kind_type();
        self.expect_type(elab, kind, span)?;

        let decl = match self.cx.get(elab.expr) {
            Expr::Var { decl, .. } => *decl,
            _ => {
                let error = ElabError::NotAType {
                    name: "expression".to_string(),
                };
                return Err(self.fail(error, span));
            }
        };

        let name = self.cx.decl_name(decl).to_string();
        match self.cx.decl(decl).init {
            None => Err(self.fail(ElabError::IncompleteType { name }, span)),
            Some(init) => match self.cx.as_type(init) {
                Some(ty) => Ok(ty),
                None => Err(self.fail(ElabError::NotAType { name }, span)),
            },
        }
    }

    /// The spelling of a name position: an identifier, or a (possibly shadowed) type keyword.
    fn binder_name<'a>(&mut self, tree: &Tree<'a>) -> Result<Token<'a>, ElabError> {
        match tree {
            Tree::Terminal(
                token @ Token {
                    kind: TokenKind::Identifier | TokenKind::BoolType | TokenKind::IntType,
                    ..
                },
            ) => Ok(*token),
            other => Err(self.malformed("expected a name to bind", other.span())),
        }
    }

    /// `name : type-expr`
    fn elaborate_binding(
        &mut self,
        name: &Tree<'_>,
        ty: &Tree<'_>,
    ) -> Result<(BindRef, TypeRef), ElabError> {
        let name = self.binder_name(name)?;
        let ty_elab = self.elaborate(ty)?;
        let ty = self.resolve_type(ty_elab, ty.span())?;

        let id = self.cx.make_id(name.spell);
        Ok((self.cx.make_bind(id, ty), ty))
    }

    fn bind_parts(&self, bind: BindRef) -> (IdRef, TypeRef) {
        match self.cx.get(bind) {
            Expr::Bind { name, ty } => (*name, *ty),
            other => unreachable!("binding handle designates {other:?}"),
        }
    }

    fn elaborate_quantifier(
        &mut self,
        op: Token<'_>,
        binding: &Tree<'_>,
        body: &Tree<'_>,
    ) -> ElabResult {
        let Tree::Binary {
            op: Token {
                kind: TokenKind::Colon,
                ..
            },
            left,
            right,
        } = binding
        else {
            return Err(self.malformed(
                format!("`{}` expects a binding `name : type`", op.spell),
                binding.span(),
            ));
        };

        let (bind, _) = self.elaborate_binding(left, right)?;
        let (name, ty) = self.bind_parts(bind);
        let bool = self.cx.bool_type();

        let body = {
            let mut scope = ScopeGuard::new(self);
            scope.cx.declare_id(name, ty);
            let body_elab = scope.elaborate(body)?;
            scope.expect_type(body_elab, bool, body.span())?;
            body_elab
        };

        let expr = match op.kind {
            TokenKind::Forall => self.cx.make_forall(bind, body.expr),
            _ => self.cx.make_exists(bind, body.expr),
        };
        Ok(Elaboration::new(expr, bool))
    }

    // ----------------------------- Statements -----------------------------

    /// Elaborate one top-level statement: a declaration `x : T`, a definition `let x = e`, or
    /// an expression.
    pub fn elaborate_statement(&mut self, tree: &Tree<'_>) -> ElabResult {
        let result = match tree {
            Tree::Binary { op, left, right } if op.kind == TokenKind::Colon => {
                self.elaborate_declaration(left, right)
            }
            Tree::Binary { op, left, right } if op.kind == TokenKind::Assign => {
                self.elaborate_definition(left, right)
            }
            _ => self.elaborate(tree),
        };

        match &result {
            Ok(elab) => debug!(
                "statement at {} elaborated to {:?} : {}",
                tree.span(),
                self.cx.kind(elab.expr),
                self.cx.type_kind(elab.ty)
            ),
            Err(error) => debug!("statement at {} failed: {error}", tree.span()),
        }
        result
    }

    fn reject_redeclaration(&mut self, name: Token<'_>) -> Result<(), ElabError> {
        if self.cx.is_declared_locally(name.spell) {
            let error = ElabError::Redeclaration {
                name: name.spell.to_string(),
            };
            return Err(self.fail(error, name.span));
        }
        Ok(())
    }

    fn elaborate_declaration(&mut self, name: &Tree<'_>, ty: &Tree<'_>) -> ElabResult {
        let token = self.binder_name(name)?;
        self.reject_redeclaration(token)?;
        let (bind, ty) = self.elaborate_binding(name, ty)?;
        let (id, _) = self.bind_parts(bind);
        self.cx.declare_id(id, ty);
        Ok(Elaboration::new(bind.expr(), ty))
    }

    fn elaborate_definition(&mut self, name: &Tree<'_>, value: &Tree<'_>) -> ElabResult {
        let name = self.binder_name(name)?;
        self.reject_redeclaration(name)?;
        let elab = self.elaborate(value)?;

        if elab.ty == self.cx.kind_type() {
            // Type alias
            let ty = self.resolve_type(elab, value.span())?;
            let (id, kind) = (self.cx.make_id(name.spell), self.cx.kind_type());
            self.cx.define_id(id, kind, ty.expr());
        } else {
            let id = self.cx.make_id(name.spell);
            self.cx.define_id(id, elab.ty, elab.expr);
        }
        Ok(elab)
    }

    /// Elaborate every statement independently, one result per statement.
    pub fn elaborate_program(&mut self, statements: &[&Tree<'_>]) -> Vec<ElabResult> {
        let results: Vec<_> = statements
            .iter()
            .map(|tree| self.elaborate_statement(tree))
            .collect();
        let failed = results.iter().filter(|r| r.is_err()).count();
        debug!("elaborated {} statements ({failed} failed)", results.len());
        results
    }
}
