use sarah::prelude::*;
use sarah::translate::translate;

/// Elaborate `src` in `cx` and return the elaboration of its last statement.
fn elaborate(cx: &mut Context, src: &str) -> Elaboration {
    let factory = TreeFactory::new();
    let statements = parse_program(src, &factory).expect("parse should succeed");
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let results = Elaborator::new(cx, &mut diagnostics).elaborate_program(&statements);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    results.into_iter().last().unwrap().unwrap()
}

fn with_variables() -> Context {
    let mut cx = Context::new();
    elaborate(&mut cx, "p : bool; q : bool; x : int; y : int");
    cx
}

fn negated(cx: &mut Context, expr: ExprRef) -> ExprRef {
    let not = cx.make_not(expr);
    translate(cx, not)
}

/// No implication, no biconditional, and negation only directly above an atom.
fn assert_nnf(cx: &Context, expr: ExprRef) {
    let mut stack = vec![expr];
    while let Some(e) = stack.pop() {
        match cx.get(e) {
            Expr::Imp(..) | Expr::Iff(..) => panic!("`{}` is not in NNF", cx.display(expr)),
            Expr::Not(inner) => assert!(
                cx.get(*inner).is_var() || cx.get(*inner).is_id(),
                "`{}` negates a compound expression",
                cx.display(expr)
            ),
            other => stack.extend(other.children()),
        }
    }
}

#[test]
fn relational_operators_flip_to_their_complement() {
    let mut cx = with_variables();
    let x = elaborate(&mut cx, "x").expr;
    let y = elaborate(&mut cx, "y").expr;

    let table = [
        (ExprKind::Eq, ExprKind::Ne),
        (ExprKind::Ne, ExprKind::Eq),
        (ExprKind::Lt, ExprKind::Ge),
        (ExprKind::Gt, ExprKind::Le),
        (ExprKind::Le, ExprKind::Gt),
        (ExprKind::Ge, ExprKind::Lt),
    ];
    for (kind, complement) in table {
        let relation = cx.make_binary(kind, x, y);
        assert_eq!(translate(&mut cx, relation), relation, "{kind:?} is already NNF");

        let out = negated(&mut cx, relation);
        assert_eq!(cx.kind(out), complement, "negation of {kind:?}");
        assert_eq!(cx.get(out).children().as_slice(), &[x, y]);
    }
}

#[test]
fn double_negation_vanishes() {
    let mut cx = with_variables();
    for src in [
        "x < y",
        "p and q",
        "p -> x == 1",
        "(p <-> q) or not (x > 2)",
        "forall z : int . exists w : int . z + w != x",
        "true",
    ] {
        let e = elaborate(&mut cx, src).expr;
        let once = cx.make_not(e);
        let twice = cx.make_not(once);
        let plain = translate(&mut cx, e);
        let doubled = translate(&mut cx, twice);
        assert!(cx.same(plain, doubled), "`{src}`");
    }
}

#[test]
fn negated_conjunction_and_disjunction_follow_de_morgan() {
    let mut cx = with_variables();
    let a = elaborate(&mut cx, "x < 1").expr;
    let b = elaborate(&mut cx, "p or y >= 2").expr;

    let and = cx.make_and(a, b);
    let lhs = negated(&mut cx, and);
    let (not_a, not_b) = (negated(&mut cx, a), negated(&mut cx, b));
    let rhs = cx.make_or(not_a, not_b);
    assert!(cx.same(lhs, rhs));

    let or = cx.make_or(a, b);
    let lhs = negated(&mut cx, or);
    let rhs = cx.make_and(not_a, not_b);
    assert!(cx.same(lhs, rhs));
    assert_eq!(cx.display(lhs).to_string(), "x >= 1 and (not p and y < 2)");
}

#[test]
fn negated_quantifiers_swap() {
    let mut cx = with_variables();
    let forall = elaborate(&mut cx, "forall z : int . z > 0 -> x < z").expr;
    let Expr::Forall { bind, body } = *cx.get(forall) else {
        panic!("expected a universal quantifier");
    };

    let out = negated(&mut cx, forall);
    let negated_body = Translator::new(&mut cx).translate_expr(body, true);
    let Expr::Exists {
        bind: out_bind,
        body: out_body,
    } = *cx.get(out)
    else {
        panic!("expected an existential quantifier");
    };
    assert_eq!(out_bind, bind);
    assert!(cx.same(out_body, negated_body));

    let exists = elaborate(&mut cx, "exists z : bool . z and p").expr;
    let out = negated(&mut cx, exists);
    assert_eq!(cx.kind(out), ExprKind::Forall);
    assert_eq!(cx.display(out).to_string(), "forall z : bool . not z or not p");
}

#[test]
fn implications_become_disjunctions() {
    let mut cx = with_variables();
    let imp = elaborate(&mut cx, "x > 0 -> p").expr;
    let Expr::Imp(a, b) = *cx.get(imp) else {
        panic!("expected an implication");
    };

    let out = translate(&mut cx, imp);
    let not_a = negated(&mut cx, a);
    let expected = cx.make_or(not_a, b);
    assert!(cx.same(out, expected));
    assert_eq!(cx.display(out).to_string(), "x <= 0 or p");

    let out = negated(&mut cx, imp);
    let not_b = negated(&mut cx, b);
    let expected = cx.make_and(a, not_b);
    assert!(cx.same(out, expected));
    assert_eq!(cx.display(out).to_string(), "x > 0 and not p");
}

#[test]
fn biconditionals_expand_in_both_polarities() {
    let mut cx = with_variables();
    let iff = elaborate(&mut cx, "p <-> x == y").expr;

    let out = translate(&mut cx, iff);
    assert_eq!(
        cx.display(out).to_string(),
        "(p or x != y) and (x == y or not p)"
    );
    assert_nnf(&cx, out);

    let out = negated(&mut cx, iff);
    assert_eq!(
        cx.display(out).to_string(),
        "not p and x == y or x != y and p"
    );
    assert_nnf(&cx, out);
}

#[test]
fn boolean_atoms_absorb_negation() {
    let mut cx = with_variables();
    let t = elaborate(&mut cx, "true").expr;
    let out = negated(&mut cx, t);
    assert!(matches!(cx.get(out), Expr::Bool(false)));

    let p = elaborate(&mut cx, "p").expr;
    let out = negated(&mut cx, p);
    assert!(matches!(cx.get(out), Expr::Not(inner) if *inner == p));

    let not_not_p = elaborate(&mut cx, "not not p").expr;
    let Expr::Not(not_p) = *cx.get(not_not_p) else {
        panic!("expected a negation");
    };
    let Expr::Not(p) = *cx.get(not_p) else {
        panic!("expected a negation");
    };
    assert_eq!(translate(&mut cx, not_not_p), p);
}

#[test]
fn negated_concrete_formula() {
    let mut cx = Context::new();
    let elab = elaborate(&mut cx, "forall x : int . -x < 0");
    let Expr::Forall { bind, body } = *cx.get(elab.expr) else {
        panic!("expected a universal quantifier");
    };
    let Expr::Lt(neg, _) = *cx.get(body) else {
        panic!("expected `<`");
    };

    let out = Translator::new(&mut cx).translate_negated(elab);
    assert_eq!(out.ty, cx.bool_type());
    assert_eq!(cx.display(out.expr).to_string(), "exists x : int . -x >= 0");

    let Expr::Exists { bind: out_bind, body } = *cx.get(out.expr) else {
        panic!("expected an existential quantifier");
    };
    assert_eq!(out_bind, bind);
    let Expr::Ge(out_neg, _) = *cx.get(body) else {
        panic!("expected `>=`");
    };
    assert_eq!(out_neg, neg);
}

#[test]
fn arithmetic_is_left_untouched() {
    let mut cx = with_variables();
    let e = elaborate(&mut cx, "x + 2 * y - x / 3 < -(y + 1)").expr;
    let before = cx.len();
    assert_eq!(translate(&mut cx, e), e);
    assert_eq!(cx.len(), before);

    let out = negated(&mut cx, e);
    assert_eq!(cx.display(out).to_string(), "x + 2 * y - x / 3 >= -(y + 1)");
}

#[test]
fn translation_preserves_the_type() {
    let mut cx = with_variables();
    let elab = elaborate(&mut cx, "not (p and (q -> x < y))");
    let out = Translator::new(&mut cx).translate(elab);
    assert_eq!(out.ty, elab.ty);
    assert_nnf(&cx, out.expr);
    assert_eq!(cx.display(out.expr).to_string(), "not p or q and x >= y");

    let int = elaborate(&mut cx, "x * 4");
    let out = Translator::new(&mut cx).translate(int);
    assert_eq!(out, int);
}

#[test]
fn declarations_are_not_formulas() {
    let mut cx = Context::new();
    let decl = elaborate(&mut cx, "p : bool");
    assert_eq!(decl.ty, cx.bool_type());
    assert!(!decl.is_formula(&cx));

    let var = elaborate(&mut cx, "p");
    assert!(var.is_formula(&cx));
    let int = elaborate(&mut cx, "x : int; x + 1");
    assert!(!int.is_formula(&cx));
}

#[test]
#[should_panic(expected = "only boolean formulas can be negated")]
fn negating_a_declaration_panics() {
    let mut cx = Context::new();
    let decl = elaborate(&mut cx, "p : bool");
    Translator::new(&mut cx).translate_negated(decl);
}
