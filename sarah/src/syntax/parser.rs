//! Lexer and parser for the surface language, using chumsky.
//!
//! Two stages:
//! 1) Tokenisation from the source string into [`Token`]s carrying byte spans.
//! 2) Parsing the token slice into arena-allocated [`Tree`]s.
//!
//! Precedence, loosest first: quantifiers, `<->`, `->` (right-associative), `or`, `and`,
//! `not`, `==`/`!=`, `<`/`>`/`<=`/`>=`, `+`/`-`, `*`/`/`, prefix `+`/`-`, primaries. All other
//! binary operators are left-associative.
//!
//! A program is a `;`-separated list of statements: `let x = e`, a declaration `x : T`, or an
//! expression. Comments run from `//` to the end of the line.
//!
//! Example
//! ```
//! use sarah::syntax::{parse_expr, Tree, TreeFactory, TokenKind};
//!
//! let factory = TreeFactory::new();
//! let tree = parse_expr("forall x : int . -x < 0", &factory).unwrap();
//! assert!(tree.is_binary_op(TokenKind::Forall));
//! ```
use chumsky::prelude::*;
use log::debug;
use thiserror::Error;

use super::token::{Span, Token, TokenKind};
use super::tree::{Tree, TreeFactory};

/// A lexing or parsing failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

type LexExtra<'s> = extra::Err<Rich<'s, char>>;
type ParseExtra<'t, 'a> = extra::Err<Rich<'t, Token<'a>>>;

// ---------------- Lexer ----------------

fn lexer<'s>() -> impl Parser<'s, &'s str, Vec<(TokenKind, SimpleSpan)>, LexExtra<'s>> {
    use TokenKind::*;

    // Multi-char operators first to avoid prefix capture
    let op = choice((
        just("<->").to(LeftRight),
        just("->").to(Arrow),
        just("<=").to(LessEq),
        just(">=").to(GreaterEq),
        just("==").to(EqEq),
        just("!=").to(NotEq),
        just('<').to(Less),
        just('>').to(Greater),
        just('=').to(Assign),
        just('+').to(Plus),
        just('-').to(Minus),
        just('*').to(Star),
        just('/').to(Slash),
        just('(').to(LParen),
        just(')').to(RParen),
        just('.').to(Dot),
        just(':').to(Colon),
        just(';').to(Semicolon),
    ));

    let word = text::ascii::ident()
        .map(|word: &str| TokenKind::keyword(word).unwrap_or(Identifier));
    let int = text::digits(10).to(IntLiteral);

    // Comments are single-line starting with "//"
    let comment = just("//")
        .then(any().and_is(just('\n').not()).repeated())
        .padded()
        .to(());
    let trivia = comment.repeated().padded();

    let token = choice((op, word, int)).map_with(|kind, e| (kind, e.span()));

    trivia
        .clone()
        .ignore_then(token.then_ignore(trivia).repeated().collect())
        .then_ignore(end())
}

/// Split `src` into tokens.
pub fn lex(src: &str) -> Result<Vec<Token<'_>>, Vec<ParseError>> {
    let (tokens, errors) = lexer().parse(src).into_output_errors();
    if !errors.is_empty() {
        return Err(errors
            .into_iter()
            .map(|e| ParseError {
                message: format!("lexing error: {e}"),
                span: Span::from(*e.span()),
            })
            .collect());
    }

    let tokens = tokens
        .unwrap_or_default()
        .into_iter()
        .map(|(kind, span)| Token::new(kind, &src[span.start..span.end], Span::from(span)))
        .collect::<Vec<_>>();
    debug!("lexed {} tokens", tokens.len());
    Ok(tokens)
}

// ---------------- Parser over tokens ----------------

fn token<'t, 'a: 't>(
    kind: TokenKind,
) -> impl Parser<'t, &'t [Token<'a>], Token<'a>, ParseExtra<'t, 'a>> + Clone {
    any()
        .filter(move |t: &Token<'a>| t.kind == kind)
        .labelled(kind.describe())
}

/// `operand (op operand)*`, folded to the left.
fn binary_left<'t, 'a: 't, P, Q>(
    factory: &'a TreeFactory<'a>,
    operand: P,
    op: Q,
) -> impl Parser<'t, &'t [Token<'a>], &'a Tree<'a>, ParseExtra<'t, 'a>> + Clone
where
    P: Parser<'t, &'t [Token<'a>], &'a Tree<'a>, ParseExtra<'t, 'a>> + Clone,
    Q: Parser<'t, &'t [Token<'a>], Token<'a>, ParseExtra<'t, 'a>> + Clone,
{
    operand
        .clone()
        .foldl(op.then(operand).repeated(), move |left, (op, right)| {
            factory.make_binary(op, left, right)
        })
}

fn primary_parser<'t, 'a: 't, P>(
    factory: &'a TreeFactory<'a>,
    expr: P,
) -> impl Parser<'t, &'t [Token<'a>], &'a Tree<'a>, ParseExtra<'t, 'a>> + Clone
where
    P: Parser<'t, &'t [Token<'a>], &'a Tree<'a>, ParseExtra<'t, 'a>> + Clone,
{
    use TokenKind::*;

    let terminal = choice((
        token(True),
        token(False),
        token(IntLiteral),
        token(Identifier),
        token(BoolType),
        token(IntType),
    ))
    .map(move |t| factory.make_terminal(t));

    let enclosed = token(LParen)
        .then(expr)
        .then(token(RParen))
        .map(move |((open, arg), close)| factory.make_enclosed(open, arg, close))
        .labelled("parentheses");

    choice((terminal, enclosed)).labelled("primary expression")
}

fn expr_parser<'t, 'a: 't>(
    factory: &'a TreeFactory<'a>,
) -> impl Parser<'t, &'t [Token<'a>], &'a Tree<'a>, ParseExtra<'t, 'a>> + Clone {
    use TokenKind::*;

    recursive(move |expr| {
        let primary = primary_parser(factory, expr.clone());

        // Prefix signs: right-assoc
        let sign = choice((token(Plus), token(Minus)))
            .repeated()
            .foldr(primary.clone(), move |op, arg| factory.make_unary(op, arg))
            .labelled("sign");

        let mult = binary_left(factory, sign, choice((token(Star), token(Slash))));
        let additive = binary_left(factory, mult, choice((token(Plus), token(Minus))));
        let ordering = binary_left(
            factory,
            additive,
            choice((
                token(Less),
                token(Greater),
                token(LessEq),
                token(GreaterEq),
            )),
        );
        let equality = binary_left(factory, ordering, choice((token(EqEq), token(NotEq))));

        let not = token(Not)
            .repeated()
            .foldr(equality, move |op, arg| factory.make_unary(op, arg));

        let and = binary_left(factory, not, token(And));
        let or = binary_left(factory, and, token(Or));

        // Implication is right-assoc
        let imp = recursive(move |imp| {
            or.then(token(Arrow).then(imp).or_not())
                .map(move |(left, rest)| match rest {
                    Some((op, right)) => factory.make_binary(op, left, right),
                    None => left,
                })
                .labelled("implication")
        });

        let iff = binary_left(factory, imp, token(LeftRight));

        // `forall x : T . body` becomes `Binary(forall, Binary(:, x, T), body)`
        // The bound name may shadow a type keyword
        let binder = choice((token(Identifier), token(BoolType), token(IntType)));
        let quantified = choice((token(Forall), token(Exists)))
            .then(binder)
            .then(token(Colon))
            .then(primary)
            .then_ignore(token(Dot))
            .then(expr)
            .map(move |((((quant, name), colon), ty), body)| {
                let binding = factory.make_binary(colon, factory.make_terminal(name), ty);
                factory.make_binary(quant, binding, body)
            })
            .labelled("quantifier");

        choice((quantified, iff)).labelled("expression").boxed()
    })
}

fn statement_parser<'t, 'a: 't>(
    factory: &'a TreeFactory<'a>,
) -> impl Parser<'t, &'t [Token<'a>], &'a Tree<'a>, ParseExtra<'t, 'a>> + Clone {
    use TokenKind::*;

    let expr = expr_parser(factory);
    let name = choice((token(Identifier), token(BoolType), token(IntType)))
        .map(move |t| factory.make_terminal(t));

    // `let x = e` becomes `Binary(=, x, e)`
    let definition = token(Let)
        .ignore_then(name.clone())
        .then(token(Assign))
        .then(expr.clone())
        .map(move |((name, assign), value)| factory.make_binary(assign, name, value))
        .labelled("definition");

    let declaration = name
        .then(token(Colon))
        .then(primary_parser(factory, expr.clone()))
        .map(move |((name, colon), ty)| factory.make_binary(colon, name, ty))
        .labelled("declaration");

    choice((definition, declaration, expr)).labelled("statement")
}

/// Map a span over token indices back to bytes of the source.
fn byte_span(span: SimpleSpan, tokens: &[Token<'_>], eof: usize) -> Span {
    let start = tokens.get(span.start).map_or(eof, |t| t.span.start);
    let end = if span.end > span.start {
        tokens.get(span.end - 1).map_or(eof, |t| t.span.end)
    } else {
        start
    };
    Span::new(start, end.max(start))
}

fn convert_errors(
    errors: Vec<Rich<'_, Token<'_>>>,
    tokens: &[Token<'_>],
    eof: usize,
) -> Vec<ParseError> {
    errors
        .into_iter()
        .map(|e| ParseError {
            message: format!("parse error: {e}"),
            span: byte_span(*e.span(), tokens, eof),
        })
        .collect()
}

// ---------------- Public API ----------------

/// Parse a whole program into one tree per statement.
pub fn parse_program<'a>(
    src: &'a str,
    factory: &'a TreeFactory<'a>,
) -> Result<Vec<&'a Tree<'a>>, Vec<ParseError>> {
    let tokens = lex(src)?;
    let (statements, errors) = statement_parser(factory)
        .separated_by(token(TokenKind::Semicolon))
        .allow_trailing()
        .collect::<Vec<_>>()
        .then_ignore(end())
        .parse(tokens.as_slice())
        .into_output_errors();

    if !errors.is_empty() {
        return Err(convert_errors(errors, &tokens, src.len()));
    }
    let statements = statements.unwrap_or_default();
    debug!("parsed {} statements", statements.len());
    Ok(statements)
}

/// Parse a single expression.
pub fn parse_expr<'a>(
    src: &'a str,
    factory: &'a TreeFactory<'a>,
) -> Result<&'a Tree<'a>, Vec<ParseError>> {
    let tokens = lex(src)?;
    let (tree, errors) = expr_parser(factory)
        .then_ignore(end())
        .parse(tokens.as_slice())
        .into_output_errors();

    match tree {
        Some(tree) if errors.is_empty() => Ok(tree),
        _ => Err(convert_errors(errors, &tokens, src.len())),
    }
}
