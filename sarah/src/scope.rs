//! Lexical environments and the scope stack.
//!
//! An [`Environment`] maps symbols to declarations with unique insertion. The
//! [`ScopeStack`] orders environments innermost last; lookups walk it from the innermost
//! environment outwards so inner bindings shadow outer ones.
//!
//! Declarations themselves live in the [`Context`](crate::context::Context); environments only
//! hold handles, so a `Var` built inside a scope stays valid after that scope is popped.
use std::collections::HashMap;

use crate::{expr::DeclRef, symbol::Symbol};

/// One lexical scope.
#[derive(Debug, Default)]
pub struct Environment {
    bindings: HashMap<Symbol, DeclRef>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `decl`.
    ///
    /// # Panics
    /// If `name` is already bound in this environment. Callers that accept user-written
    /// declarations check [`Environment::get`] first.
    pub fn insert(&mut self, name: Symbol, decl: DeclRef) {
        let previous = self.bindings.insert(name.clone(), decl);
        assert!(
            previous.is_none(),
            "`{name}` is already declared in this environment"
        );
    }

    /// The declaration bound to `name` in this environment only.
    pub fn get(&self, name: &Symbol) -> Option<DeclRef> {
        self.bindings.get(name).copied()
    }

    pub fn contains(&self, name: &Symbol) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Stack of environments, innermost last.
#[derive(Debug, Default)]
pub struct ScopeStack {
    environments: Vec<Environment>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, env: Environment) {
        self.environments.push(env);
    }

    /// Remove and return the innermost environment.
    pub fn pop(&mut self) -> Option<Environment> {
        self.environments.pop()
    }

    /// Number of active environments.
    pub fn depth(&self) -> usize {
        self.environments.len()
    }

    /// The innermost environment.
    pub fn current(&self) -> Option<&Environment> {
        self.environments.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut Environment> {
        self.environments.last_mut()
    }

    /// Search innermost to outermost; the first binding found wins.
    pub fn lookup(&self, name: &Symbol) -> Option<DeclRef> {
        self.environments
            .iter()
            .rev()
            .find_map(|env| env.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Interner;

    #[test]
    fn innermost_binding_wins() {
        let mut interner = Interner::new();
        let x = interner.intern("x");

        let mut stack = ScopeStack::new();
        let mut outer = Environment::new();
        outer.insert(x.clone(), DeclRef(0));
        stack.push(outer);

        let mut inner = Environment::new();
        inner.insert(x.clone(), DeclRef(1));
        stack.push(inner);
        assert_eq!(stack.lookup(&x), Some(DeclRef(1)));

        stack.pop();
        assert_eq!(stack.lookup(&x), Some(DeclRef(0)));
        stack.pop();
        assert_eq!(stack.lookup(&x), None);
    }

    #[test]
    #[should_panic(expected = "already declared")]
    fn duplicate_insertion_is_a_contract_violation() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let mut env = Environment::new();
        env.insert(x.clone(), DeclRef(0));
        env.insert(x, DeclRef(1));
    }
}
