//! Untyped parse trees.
//!
//! Trees live in a [`TreeFactory`] arena and borrow their token spellings from the source,
//! so a tree is valid for as long as both the factory and the source text are.
use typed_arena::Arena;

use super::token::{Span, Token, TokenKind};

/// One node of the parse tree.
///
/// The elaborator dispatches only on these four categories and the kind of the token they
/// carry.
#[derive(Debug, Clone, Copy)]
pub enum Tree<'a> {
    /// `open arg close`, e.g. a parenthesised expression.
    Enclosed {
        open: Token<'a>,
        close: Token<'a>,
        arg: &'a Tree<'a>,
    },
    /// A literal, keyword or identifier.
    Terminal(Token<'a>),
    Unary {
        op: Token<'a>,
        arg: &'a Tree<'a>,
    },
    /// Infix operators, bindings (`x : T`), definitions (`let x = e`) and quantifiers
    /// (`forall (x : T) body`).
    Binary {
        op: Token<'a>,
        left: &'a Tree<'a>,
        right: &'a Tree<'a>,
    },
}

impl<'a> Tree<'a> {
    /// Source range covered by this tree.
    pub fn span(&self) -> Span {
        match self {
            Tree::Enclosed { open, close, .. } => open.span.join(close.span),
            Tree::Terminal(token) => token.span,
            Tree::Unary { op, arg } => op.span.join(arg.span()),
            Tree::Binary { op, left, right } => op.span.join(left.span()).join(right.span()),
        }
    }

    /// The token that decides how this node is interpreted.
    pub fn token(&self) -> Token<'a> {
        match self {
            Tree::Enclosed { open, .. } => *open,
            Tree::Terminal(token) => *token,
            Tree::Unary { op, .. } | Tree::Binary { op, .. } => *op,
        }
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparenthesized(&self) -> &Tree<'a> {
        let mut tree = self;
        while let Tree::Enclosed { arg, .. } = tree {
            tree = arg;
        }
        tree
    }

    /// Whether this node is `Binary` with its operator token of kind `kind`.
    pub fn is_binary_op(&self, kind: TokenKind) -> bool {
        matches!(self, Tree::Binary { op, .. } if op.kind == kind)
    }
}

/// Arena for parse trees.
pub struct TreeFactory<'a> {
    trees: Arena<Tree<'a>>,
}

impl Default for TreeFactory<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TreeFactory<'a> {
    pub fn new() -> Self {
        Self {
            trees: Arena::new(),
        }
    }

    #[inline]
    pub fn alloc(&'a self, tree: Tree<'a>) -> &'a Tree<'a> {
        self.trees.alloc(tree)
    }

    pub fn make_enclosed(
        &'a self,
        open: Token<'a>,
        arg: &'a Tree<'a>,
        close: Token<'a>,
    ) -> &'a Tree<'a> {
        self.alloc(Tree::Enclosed { open, close, arg })
    }

    pub fn make_terminal(&'a self, token: Token<'a>) -> &'a Tree<'a> {
        self.alloc(Tree::Terminal(token))
    }

    pub fn make_unary(&'a self, op: Token<'a>, arg: &'a Tree<'a>) -> &'a Tree<'a> {
        self.alloc(Tree::Unary { op, arg })
    }

    pub fn make_binary(
        &'a self,
        op: Token<'a>,
        left: &'a Tree<'a>,
        right: &'a Tree<'a>,
    ) -> &'a Tree<'a> {
        self.alloc(Tree::Binary { op, left, right })
    }

    /// Number of trees allocated so far.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
