//! Interned identifier text.
//!
//! Role
//! - Deduplicate identifier spellings so that each distinct spelling is stored once per
//!   [`Interner`].
//! - Compare and hash [`Symbol`]s by identity (the address of the shared allocation), never by
//!   their characters. Two symbols are equal iff they were produced by the same interner for
//!   the same spelling.
use std::{
    collections::HashSet,
    hash::{Hash, Hasher},
    rc::Rc,
};

/// An interned identifier.
///
/// Cloning is a reference-count bump. Equality and hashing use the pointer of the interned
/// string, so a symbol from one interner never equals a symbol from another.
#[derive(Clone)]
pub struct Symbol(Rc<str>);

impl Symbol {
    /// The spelling of this symbol.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    fn addr(&self) -> *const u8 {
        Rc::as_ptr(&self.0) as *const u8
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.addr(), state)
    }
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}`", self.as_str())
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduplicating store of identifier spellings.
#[derive(Debug, Default)]
pub struct Interner {
    strings: HashSet<Rc<str>>,
}

impl Interner {
    /// Create an empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `text`, returning the unique symbol for that spelling.
    pub fn intern(&mut self, text: &str) -> Symbol {
        if let Some(existing) = self.strings.get(text) {
            return Symbol(existing.clone());
        }
        let rc: Rc<str> = Rc::from(text);
        self.strings.insert(rc.clone());
        Symbol(rc)
    }

    /// Return the symbol for `text` if it was interned before, without interning it.
    pub fn get(&self, text: &str) -> Option<Symbol> {
        self.strings.get(text).map(|rc| Symbol(rc.clone()))
    }

    /// Number of distinct spellings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
