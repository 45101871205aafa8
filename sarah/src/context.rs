//! The construction context: arena, factory and scope stack.
//!
//! Role
//! - Own every expression node and declaration created during one analysis unit. Nodes are
//!   appended to a single vector and addressed by typed handles; nothing is freed before the
//!   context itself is dropped, so handles stay valid for the context's whole lifetime.
//! - Expose the `make_*` constructors. These are the only way to create nodes, which keeps node
//!   identity under the context's control.
//! - Hold the three type singletons and the scope stack, whose bottom environment (the "top"
//!   environment) predefines `bool` and `int`.
//!
//! A context is not thread-safe: node creation is an unsynchronised append.
//!
//! Example: variable identity
//! ```
//! use sarah::context::Context;
//!
//! let mut cx = Context::new();
//! let int = cx.int_type();
//! let x = cx.declare("x", int);
//! let v1 = cx.make_var(x);
//! let v2 = cx.make_var(x);
//! assert!(cx.same(v1, v2));
//!
//! let other = {
//!     let mut scope = cx.scoped();
//!     scope.declare("x", int)
//! };
//! let v3 = cx.make_var(other);
//! assert!(!cx.same(v1, v3));
//! ```
use std::ops::{Deref, DerefMut};

use log::debug;
use num_bigint::BigInt;
use smallvec::SmallVec;

use crate::{
    expr::{BindRef, Decl, DeclRef, Expr, ExprKind, ExprRef, IdRef, IntRef, TypeKind, TypeRef},
    scope::{Environment, ScopeStack},
    symbol::{Interner, Symbol},
};

/// Arena, factory and scope stack for one analysis unit.
#[derive(Debug)]
pub struct Context {
    interner: Interner,
    nodes: Vec<Expr>,
    decls: Vec<Decl>,
    scopes: ScopeStack,

    bool_type: TypeRef,
    int_type: TypeRef,
    kind_type: TypeRef,

    bool_def: DeclRef,
    int_def: DeclRef,
}

macro_rules! define_binary_makers {
    ($( $(#[$meta:meta])* $fn_name:ident => $variant:ident ),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[inline]
            pub fn $fn_name(&mut self, lhs: ExprRef, rhs: ExprRef) -> ExprRef {
                self.alloc(Expr::$variant(lhs, rhs))
            }
        )+
    };
}

impl Context {
    /// Create a context with its type singletons and the top environment holding the
    /// `bool` and `int` definitions.
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(64);
        nodes.push(Expr::Type(TypeKind::Bool));
        nodes.push(Expr::Type(TypeKind::Int));
        nodes.push(Expr::Type(TypeKind::Kind));

        let mut cx = Context {
            interner: Interner::new(),
            nodes,
            decls: Vec::new(),
            scopes: ScopeStack::new(),
            bool_type: TypeRef(ExprRef(0)),
            int_type: TypeRef(ExprRef(1)),
            kind_type: TypeRef(ExprRef(2)),
            bool_def: DeclRef(0),
            int_def: DeclRef(0),
        };

        cx.scopes.push(Environment::new());
        let (kind, bool_ty, int_ty) = (cx.kind_type, cx.bool_type, cx.int_type);
        cx.bool_def = cx.define("bool", kind, bool_ty.expr());
        cx.int_def = cx.define("int", kind, int_ty.expr());

        debug!("created context with predefined `bool` and `int`");
        cx
    }

    #[inline]
    fn alloc(&mut self, expr: Expr) -> ExprRef {
        let index = u32::try_from(self.nodes.len()).expect("expression arena exhausted");
        self.nodes.push(expr);
        ExprRef(index)
    }

    /// The node behind `expr`.
    ///
    /// # Panics
    /// If `expr` was not created by this context.
    #[inline]
    pub fn get(&self, expr: impl Into<ExprRef>) -> &Expr {
        &self.nodes[expr.into().index()]
    }

    /// Discriminant of the node behind `expr`.
    #[inline]
    pub fn kind(&self, expr: impl Into<ExprRef>) -> ExprKind {
        ExprKind::from(self.get(expr))
    }

    /// Number of nodes owned by this context, type singletons included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ------------------------------ Types ------------------------------

    #[inline]
    pub fn bool_type(&self) -> TypeRef {
        self.bool_type
    }

    #[inline]
    pub fn int_type(&self) -> TypeRef {
        self.int_type
    }

    #[inline]
    pub fn kind_type(&self) -> TypeRef {
        self.kind_type
    }

    /// The singleton designating `kind`.
    pub fn type_of_kind(&self, kind: TypeKind) -> TypeRef {
        match kind {
            TypeKind::Bool => self.bool_type,
            TypeKind::Int => self.int_type,
            TypeKind::Kind => self.kind_type,
        }
    }

    /// Which singleton `ty` designates.
    pub fn type_kind(&self, ty: TypeRef) -> TypeKind {
        match self.get(ty) {
            Expr::Type(kind) => *kind,
            other => unreachable!("type handle designates a non-type node {other:?}"),
        }
    }

    /// View `expr` as a type, if it is one of the singletons.
    pub fn as_type(&self, expr: ExprRef) -> Option<TypeRef> {
        self.get(expr).is_type().then_some(TypeRef(expr))
    }

    /// View `expr` as an integer literal node.
    pub fn as_int(&self, expr: ExprRef) -> Option<IntRef> {
        self.get(expr).is_int().then_some(IntRef(expr))
    }

    /// View `expr` as a binding node.
    pub fn as_bind(&self, expr: ExprRef) -> Option<BindRef> {
        self.get(expr).is_bind().then_some(BindRef(expr))
    }

    // ------------------------------ Atoms ------------------------------

    /// Intern `text` in this context's symbol table.
    pub fn intern(&mut self, text: &str) -> Symbol {
        self.interner.intern(text)
    }

    /// The symbol of an `Id` node.
    pub fn symbol(&self, id: IdRef) -> &Symbol {
        match self.get(id) {
            Expr::Id(symbol) => symbol,
            other => unreachable!("identifier handle designates {other:?}"),
        }
    }

    pub fn make_id(&mut self, name: &str) -> IdRef {
        let symbol = self.interner.intern(name);
        self.make_id_symbol(symbol)
    }

    pub fn make_id_symbol(&mut self, symbol: Symbol) -> IdRef {
        IdRef(self.alloc(Expr::Id(symbol)))
    }

    pub fn make_bool(&mut self, value: bool) -> ExprRef {
        self.alloc(Expr::Bool(value))
    }

    pub fn make_int(&mut self, value: impl Into<BigInt>) -> IntRef {
        IntRef(self.alloc(Expr::Int(value.into())))
    }

    /// A reference to `decl`, spelled with the declared name.
    pub fn make_var(&mut self, decl: DeclRef) -> ExprRef {
        let name = self.symbol(self.decl(decl).name).clone();
        self.alloc(Expr::Var { name, decl })
    }

    // ---------------------------- Composites ----------------------------

    define_binary_makers! {
        make_add => Add,
        make_sub => Sub,
        make_eq => Eq,
        make_ne => Ne,
        make_lt => Lt,
        make_gt => Gt,
        make_le => Le,
        make_ge => Ge,
        make_and => And,
        make_or => Or,
        /// `lhs -> rhs`
        make_imp => Imp,
        /// `lhs <-> rhs`
        make_iff => Iff,
    }

    /// `factor * operand`
    pub fn make_mul(&mut self, factor: IntRef, operand: ExprRef) -> ExprRef {
        self.alloc(Expr::Mul(factor, operand))
    }

    /// `operand / divisor`
    pub fn make_div(&mut self, divisor: IntRef, operand: ExprRef) -> ExprRef {
        self.alloc(Expr::Div(divisor, operand))
    }

    pub fn make_neg(&mut self, operand: ExprRef) -> ExprRef {
        self.alloc(Expr::Neg(operand))
    }

    pub fn make_pos(&mut self, operand: ExprRef) -> ExprRef {
        self.alloc(Expr::Pos(operand))
    }

    pub fn make_not(&mut self, operand: ExprRef) -> ExprRef {
        self.alloc(Expr::Not(operand))
    }

    pub fn make_bind(&mut self, name: IdRef, ty: TypeRef) -> BindRef {
        BindRef(self.alloc(Expr::Bind { name, ty }))
    }

    pub fn make_exists(&mut self, bind: BindRef, body: ExprRef) -> ExprRef {
        self.alloc(Expr::Exists { bind, body })
    }

    pub fn make_forall(&mut self, bind: BindRef, body: ExprRef) -> ExprRef {
        self.alloc(Expr::Forall { bind, body })
    }

    /// Build the binary node of the given kind over `lhs` and `rhs`.
    ///
    /// # Panics
    /// If `kind` is not one of the relational, logical-binary, `Add` or `Sub` kinds.
    pub fn make_binary(&mut self, kind: ExprKind, lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        let expr = match kind {
            ExprKind::Add => Expr::Add(lhs, rhs),
            ExprKind::Sub => Expr::Sub(lhs, rhs),
            ExprKind::Eq => Expr::Eq(lhs, rhs),
            ExprKind::Ne => Expr::Ne(lhs, rhs),
            ExprKind::Lt => Expr::Lt(lhs, rhs),
            ExprKind::Gt => Expr::Gt(lhs, rhs),
            ExprKind::Le => Expr::Le(lhs, rhs),
            ExprKind::Ge => Expr::Ge(lhs, rhs),
            ExprKind::And => Expr::And(lhs, rhs),
            ExprKind::Or => Expr::Or(lhs, rhs),
            ExprKind::Imp => Expr::Imp(lhs, rhs),
            ExprKind::Iff => Expr::Iff(lhs, rhs),
            other => panic!("{other:?} does not take two expression operands"),
        };
        self.alloc(expr)
    }

    // --------------------------- Declarations ---------------------------

    /// The declaration behind `decl`.
    #[inline]
    pub fn decl(&self, decl: DeclRef) -> &Decl {
        &self.decls[decl.index()]
    }

    /// Declared name of `decl`.
    pub fn decl_name(&self, decl: DeclRef) -> &Symbol {
        self.symbol(self.decl(decl).name)
    }

    /// The predefined `bool` definition of the top environment.
    pub fn bool_def(&self) -> DeclRef {
        self.bool_def
    }

    /// The predefined `int` definition of the top environment.
    pub fn int_def(&self) -> DeclRef {
        self.int_def
    }

    fn insert_decl(&mut self, name: IdRef, ty: TypeRef, init: Option<ExprRef>) -> DeclRef {
        let symbol = self.symbol(name).clone();
        let index = u32::try_from(self.decls.len()).expect("declaration table exhausted");
        let decl = DeclRef(index);
        self.decls.push(Decl { name, ty, init });
        self.scopes
            .current_mut()
            .expect("the top environment is always present")
            .insert(symbol, decl);
        decl
    }

    /// Declare `name : ty` in the innermost environment.
    ///
    /// # Panics
    /// If `name` is already bound in the innermost environment.
    pub fn declare(&mut self, name: &str, ty: TypeRef) -> DeclRef {
        let id = self.make_id(name);
        self.declare_id(id, ty)
    }

    /// Like [`Context::declare`], reusing an existing `Id` node as the declared name.
    pub fn declare_id(&mut self, name: IdRef, ty: TypeRef) -> DeclRef {
        self.insert_decl(name, ty, None)
    }

    /// Define `name : ty = init` in the innermost environment.
    ///
    /// # Panics
    /// If `name` is already bound in the innermost environment.
    pub fn define(&mut self, name: &str, ty: TypeRef, init: ExprRef) -> DeclRef {
        let id = self.make_id(name);
        self.define_id(id, ty, init)
    }

    pub fn define_id(&mut self, name: IdRef, ty: TypeRef, init: ExprRef) -> DeclRef {
        self.insert_decl(name, ty, Some(init))
    }

    /// Resolve `name` innermost to outermost.
    pub fn lookup(&self, name: &str) -> Option<DeclRef> {
        let symbol = self.interner.get(name)?;
        self.scopes.lookup(&symbol)
    }

    /// Whether `name` is bound in the innermost environment.
    pub fn is_declared_locally(&self, name: &str) -> bool {
        match (self.interner.get(name), self.scopes.current()) {
            (Some(symbol), Some(env)) => env.contains(&symbol),
            _ => false,
        }
    }

    // ------------------------------ Scopes ------------------------------

    /// Number of active environments (1 when only the top environment is active).
    pub fn scope_depth(&self) -> usize {
        self.scopes.depth()
    }

    /// Push a fresh, empty environment.
    pub fn push_scope(&mut self) {
        self.scopes.push(Environment::new());
        debug!("entered scope (depth {})", self.scopes.depth());
    }

    /// Pop the innermost environment.
    ///
    /// # Panics
    /// If only the top environment remains.
    pub fn pop_scope(&mut self) {
        assert!(self.scopes.depth() > 1, "the top environment cannot be popped");
        self.scopes.pop();
        debug!("left scope (depth {})", self.scopes.depth());
    }

    /// Push an environment that is popped when the returned guard is dropped.
    pub fn scoped(&mut self) -> ScopeGuard<'_, Context> {
        ScopeGuard::new(self)
    }

    // ------------------------- Structural equality -------------------------

    /// Syntactic identity of two expressions of this context.
    ///
    /// Nodes match when they share a kind and their children match pairwise. Literals compare
    /// by value, identifiers by symbol, variables by declaration identity (not by spelling)
    /// and types by singleton identity. This is not semantic equivalence: `a and b` and
    /// `b and a` differ.
    pub fn same(&self, lhs: ExprRef, rhs: ExprRef) -> bool {
        let mut stack: SmallVec<[(ExprRef, ExprRef); 16]> = SmallVec::new();
        stack.push((lhs, rhs));

        while let Some((a, b)) = stack.pop() {
            // Quick path: the very same node
            if a == b {
                continue;
            }

            let matched = match (self.get(a), self.get(b)) {
                (Expr::Id(x), Expr::Id(y)) => x == y,
                (Expr::Bool(x), Expr::Bool(y)) => x == y,
                (Expr::Int(x), Expr::Int(y)) => x == y,
                (Expr::Var { decl: x, .. }, Expr::Var { decl: y, .. }) => x == y,
                // Distinct handles to types are distinct singletons
                (Expr::Type(_), Expr::Type(_)) => false,
                (x, y) if ExprKind::from(x) == ExprKind::from(y) => {
                    let (xs, ys) = (x.children(), y.children());
                    debug_assert_eq!(xs.len(), ys.len());
                    stack.extend(xs.into_iter().zip(ys));
                    true
                }
                _ => false,
            };

            if !matched {
                return false;
            }
        }

        true
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            debug_assert_eq!(self.scopes.depth(), 1, "unbalanced scope stack");
        }
        self.scopes.pop();
        debug!(
            "released context ({} nodes, {} declarations)",
            self.nodes.len(),
            self.decls.len()
        );
    }
}

impl AsMut<Context> for Context {
    fn as_mut(&mut self) -> &mut Context {
        self
    }
}

/// Guard owning one pushed environment of a [`Context`] reachable through `T`.
///
/// The environment is pushed on creation and popped when the guard drops, on every exit path.
/// The guard dereferences to `T`, so work inside the scope goes through it.
pub struct ScopeGuard<'g, T: AsMut<Context>> {
    owner: &'g mut T,
}

impl<'g, T: AsMut<Context>> ScopeGuard<'g, T> {
    pub fn new(owner: &'g mut T) -> Self {
        owner.as_mut().push_scope();
        Self { owner }
    }
}

impl<T: AsMut<Context>> Deref for ScopeGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.owner
    }
}

impl<T: AsMut<Context>> DerefMut for ScopeGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.owner
    }
}

impl<T: AsMut<Context>> Drop for ScopeGuard<'_, T> {
    fn drop(&mut self) {
        self.owner.as_mut().pop_scope();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_singletons_are_unique() {
        let cx = Context::new();
        assert_eq!(cx.bool_type(), cx.type_of_kind(TypeKind::Bool));
        assert_ne!(cx.bool_type(), cx.int_type());
        assert_eq!(cx.type_kind(cx.kind_type()), TypeKind::Kind);
    }

    #[test]
    fn predefined_type_names_are_kind_typed_definitions() {
        let cx = Context::new();
        let int = cx.lookup("int").unwrap();
        assert_eq!(int, cx.int_def());
        let decl = cx.decl(int);
        assert_eq!(decl.ty, cx.kind_type());
        assert_eq!(decl.init, Some(cx.int_type().expr()));
        assert_eq!(cx.scope_depth(), 1);
    }

    #[test]
    fn guard_pops_on_drop() {
        let mut cx = Context::new();
        {
            let mut scope = cx.scoped();
            assert_eq!(scope.scope_depth(), 2);
            let bool_ty = scope.bool_type();
            scope.declare("p", bool_ty);
            assert!(scope.lookup("p").is_some());
        }
        assert_eq!(cx.scope_depth(), 1);
        assert!(cx.lookup("p").is_none());
    }

    #[test]
    fn same_compares_structure() {
        let mut cx = Context::new();
        let one = cx.make_int(1);
        let other_one = cx.make_int(1);
        let two = cx.make_int(2);
        let a = cx.make_lt(one.expr(), two.expr());
        let b = cx.make_lt(other_one.expr(), two.expr());
        let c = cx.make_gt(other_one.expr(), two.expr());
        assert!(cx.same(a, b));
        assert!(!cx.same(a, c));
        assert!(!cx.same(cx.bool_type().expr(), cx.int_type().expr()));
    }
}
