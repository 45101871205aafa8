//! Randomised checks of the translator and printer over generated formulas.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sarah::expr::IntRef;
use sarah::prelude::*;
use sarah::translate::translate;

/// Builds random well-typed formulas directly through the [`Context`] API.
struct Generator<'c> {
    cx: &'c mut Context,
    rng: ChaCha20Rng,
    bools: Vec<DeclRef>,
    ints: Vec<DeclRef>,
    fresh: usize,
}

impl AsMut<Context> for Generator<'_> {
    fn as_mut(&mut self) -> &mut Context {
        self.cx
    }
}

impl<'c> Generator<'c> {
    fn new(cx: &'c mut Context, seed: u64) -> Self {
        let (bool_ty, int_ty) = (cx.bool_type(), cx.int_type());
        let bools = vec![cx.declare("p", bool_ty), cx.declare("q", bool_ty)];
        let ints = vec![cx.declare("x", int_ty), cx.declare("y", int_ty)];
        Generator {
            cx,
            rng: ChaCha20Rng::seed_from_u64(seed),
            bools,
            ints,
            fresh: 0,
        }
    }

    fn pick(&mut self, int: bool) -> ExprRef {
        let decls = if int { &self.ints } else { &self.bools };
        let decl = decls[self.rng.random_range(0..decls.len())];
        self.cx.make_var(decl)
    }

    fn literal(&mut self) -> IntRef {
        let value = self.rng.random_range(0..10u32);
        self.cx.make_int(value)
    }

    fn term(&mut self, budget: usize) -> ExprRef {
        if budget == 0 || self.rng.random_bool(0.4) {
            return if self.rng.random_bool(0.3) {
                self.literal().expr()
            } else {
                self.pick(true)
            };
        }

        match self.rng.random_range(0..5) {
            0 => {
                let (a, b) = (self.term(budget - 1), self.term(budget - 1));
                self.cx.make_add(a, b)
            }
            1 => {
                let (a, b) = (self.term(budget - 1), self.term(budget - 1));
                self.cx.make_sub(a, b)
            }
            2 => {
                let (factor, operand) = (self.literal(), self.term(budget - 1));
                self.cx.make_mul(factor, operand)
            }
            3 => {
                let (divisor, operand) = (self.literal(), self.term(budget - 1));
                self.cx.make_div(divisor, operand)
            }
            _ => {
                let a = self.term(budget - 1);
                self.cx.make_neg(a)
            }
        }
    }

    fn relation(&mut self, budget: usize) -> ExprRef {
        let kinds = [
            ExprKind::Eq,
            ExprKind::Ne,
            ExprKind::Lt,
            ExprKind::Gt,
            ExprKind::Le,
            ExprKind::Ge,
        ];
        let kind = kinds[self.rng.random_range(0..kinds.len())];
        let (a, b) = (self.term(budget), self.term(budget));
        self.cx.make_binary(kind, a, b)
    }

    fn quantifier(&mut self, budget: usize, universal: bool) -> ExprRef {
        let name = format!("z{}", self.fresh);
        self.fresh += 1;
        let over_ints = self.rng.random_bool(0.5);
        let ty = if over_ints {
            self.cx.int_type()
        } else {
            self.cx.bool_type()
        };
        let id = self.cx.make_id(&name);
        let bind = self.cx.make_bind(id, ty);

        let body = {
            let mut scope = ScopeGuard::new(self);
            let decl = scope.cx.declare_id(id, ty);
            let bound = if over_ints {
                &mut scope.ints
            } else {
                &mut scope.bools
            };
            bound.push(decl);
            let body = scope.formula(budget);
            if over_ints {
                scope.ints.pop();
            } else {
                scope.bools.pop();
            }
            body
        };

        if universal {
            self.cx.make_forall(bind, body)
        } else {
            self.cx.make_exists(bind, body)
        }
    }

    fn formula(&mut self, budget: usize) -> ExprRef {
        if budget == 0 || self.rng.random_bool(0.25) {
            return match self.rng.random_range(0..3) {
                0 => {
                    let value = self.rng.random_bool(0.5);
                    self.cx.make_bool(value)
                }
                1 => self.pick(false),
                _ => self.relation(1),
            };
        }

        let budget = budget - 1;
        match self.rng.random_range(0..8) {
            0 => {
                let (a, b) = (self.formula(budget), self.formula(budget));
                self.cx.make_and(a, b)
            }
            1 => {
                let (a, b) = (self.formula(budget), self.formula(budget));
                self.cx.make_or(a, b)
            }
            2 => {
                let (a, b) = (self.formula(budget), self.formula(budget));
                self.cx.make_imp(a, b)
            }
            3 => {
                let (a, b) = (self.formula(budget), self.formula(budget));
                self.cx.make_iff(a, b)
            }
            4 => {
                let a = self.formula(budget);
                self.cx.make_not(a)
            }
            5 => self.quantifier(budget, true),
            6 => self.quantifier(budget, false),
            _ => self.relation(budget.min(2)),
        }
    }
}

fn is_nnf(cx: &Context, expr: ExprRef) -> bool {
    let mut stack = vec![expr];
    while let Some(e) = stack.pop() {
        match cx.get(e) {
            Expr::Imp(..) | Expr::Iff(..) => return false,
            Expr::Not(inner) if !cx.get(*inner).is_var() && !cx.get(*inner).is_id() => {
                return false;
            }
            other => stack.extend(other.children()),
        }
    }
    true
}

/// Runs `check` on formulas generated from a fixed seed.
fn for_random_formulas(check: impl Fn(&mut Context, ExprRef)) {
    let mut cx = Context::new();
    let mut formulas = Vec::new();
    {
        let mut generator = Generator::new(&mut cx, 0x5a7a);
        for _ in 0..200 {
            formulas.push(generator.formula(6));
        }
    }
    for formula in formulas {
        check(&mut cx, formula);
    }
}

#[test]
fn translation_output_is_in_negation_normal_form() {
    for_random_formulas(|cx, e| {
        let out = translate(cx, e);
        assert!(is_nnf(cx, out), "`{}` from `{}`", cx.display(out), cx.display(e));

        let not = cx.make_not(e);
        let out = translate(cx, not);
        assert!(is_nnf(cx, out), "`{}` from `{}`", cx.display(out), cx.display(not));
    });
}

#[test]
fn double_negation_translates_like_the_plain_formula() {
    for_random_formulas(|cx, e| {
        let once = cx.make_not(e);
        let twice = cx.make_not(once);
        let plain = translate(cx, e);
        let doubled = translate(cx, twice);
        assert!(cx.same(plain, doubled), "`{}`", cx.display(e));
    });
}

#[test]
fn translation_is_idempotent() {
    for_random_formulas(|cx, e| {
        let once = translate(cx, e);
        let twice = translate(cx, once);
        assert!(cx.same(once, twice), "`{}`", cx.display(once));
    });
}

#[test]
fn printed_formulas_elaborate_to_the_same_text() {
    for_random_formulas(|cx, e| {
        let printed = cx.display(e).to_string();
        let factory = TreeFactory::new();
        let tree = parse_expr(&printed, &factory).expect("printed text should parse");
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let elab = Elaborator::new(cx, &mut diagnostics)
            .elaborate(tree)
            .expect("printed text should elaborate");
        assert_eq!(elab.ty, cx.bool_type());
        assert_eq!(cx.display(elab.expr).to_string(), printed);
    });
}
