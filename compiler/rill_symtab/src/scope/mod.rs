//! Scope arena and symbol table.
//!
//! All scopes live in one [`SymbolTable`] arena and are addressed by
//! [`ScopeId`] handles; the symbol→scope back-reference is a handle too,
//! so resetting or reusing the table never leaves dangling references.
//! The table is an explicit, constructible object: one per compilation
//! session, never a process-wide singleton.
//!
//! # Shadowing
//!
//! `resolve` walks the parent chain innermost-first: a name defined in a
//! nested scope shadows the same name in any enclosing scope. Duplicate
//! detection in `define` is scope-local only, so the chain may reuse
//! names freely.

use rustc_hash::FxHashMap;

use crate::error::DefineError;
use crate::symbol::{Primitive, Symbol, SymbolId, SymbolKind, SymbolTag};
use crate::types::{Type, TypeRef};

/// Handle to a scope in a [`SymbolTable`] arena.
///
/// Ids are minted by [`SymbolTable::push_scope`] and are only valid for
/// the table that produced them.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct ScopeId(u32);

impl ScopeId {
    /// The root scope, present in every table.
    pub const GLOBAL: ScopeId = ScopeId(0);

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Ordered symbol storage: insertion order is observable (deterministic
/// member layout), name lookup is O(1).
#[derive(Default)]
struct Members {
    list: Vec<Symbol>,
    by_name: FxHashMap<String, usize>,
}

impl Members {
    fn insert(&mut self, symbol: Symbol) -> usize {
        let slot = self.list.len();
        self.by_name.insert(symbol.name().to_string(), slot);
        self.list.push(symbol);
        slot
    }

    fn get(&self, name: &str) -> Option<&Symbol> {
        self.by_name.get(name).map(|&slot| &self.list[slot])
    }

    fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }
}

struct ScopeData {
    name: String,
    /// Enclosing scope; `None` only for the global scope. Acyclic by
    /// construction: a child can only be pushed under an existing scope.
    parent: Option<ScopeId>,
    members: Members,
}

/// Arena of scopes plus the global scope's secondary indexes.
///
/// The global scope (scope 0) additionally maintains an identity index
/// (`SymbolId` → symbol) for name-free lookup, and the type-reference
/// cache used by [`SymbolTable::type_ref`].
///
/// [`SymbolTable::type_ref`]: SymbolTable::type_ref
pub struct SymbolTable {
    scopes: Vec<ScopeData>,
    /// Global members slot per identity, maintained by global defines.
    identity: FxHashMap<SymbolId, usize>,
    /// Descriptor string → memoized type reference.
    pub(crate) type_cache: FxHashMap<String, TypeRef>,
}

impl SymbolTable {
    /// Create a table with the global scope seeded with builtins:
    /// every [`Primitive`] plus the array-of-primitive types.
    pub fn new() -> Self {
        let mut table = SymbolTable {
            scopes: vec![ScopeData {
                name: "global".to_string(),
                parent: None,
                members: Members::default(),
            }],
            identity: FxHashMap::default(),
            type_cache: FxHashMap::default(),
        };

        for prim in Primitive::ALL {
            table.seed(Symbol::new(prim.name(), SymbolKind::Primitive(prim)));
        }
        // `void[]` is not a thing; every other primitive gets its array type.
        for prim in [
            Primitive::Int,
            Primitive::Float,
            Primitive::Bool,
            Primitive::Str,
            Primitive::Any,
        ] {
            let elem = TypeRef::resolved(Type::Primitive(prim));
            let name = format!("{}[]", prim.name());
            table.seed(Symbol::new(name, SymbolKind::ArrayType { elem }));
        }
        table
    }

    fn seed(&mut self, symbol: Symbol) {
        if self.define(ScopeId::GLOBAL, symbol).is_err() {
            unreachable!("builtin seeding cannot collide");
        }
    }

    /// Push a local scope under `parent`; a local scope always has one.
    pub fn push_scope(&mut self, name: impl Into<String>, parent: ScopeId) -> ScopeId {
        debug_assert!((parent.0 as usize) < self.scopes.len());
        let id = ScopeId(u32::try_from(self.scopes.len()).unwrap_or_else(|_| {
            unreachable!("scope arena exceeds u32::MAX entries")
        }));
        self.scopes.push(ScopeData {
            name: name.into(),
            parent: Some(parent),
            members: Members::default(),
        });
        id
    }

    /// The scope's diagnostic name (`"global"` for the root).
    pub fn scope_name(&self, scope: ScopeId) -> &str {
        &self.scope(scope).name
    }

    /// The enclosing scope; `None` for the global scope.
    ///
    /// Lexical nesting and shadowed-name lookup share this one relation;
    /// there is no separate "fallback" chain.
    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scope(scope).parent
    }

    /// Define `symbol` in `scope`.
    ///
    /// Collision detection is scope-local: enclosing or sibling scopes may
    /// already use the name (shadowing). A global define also registers
    /// the symbol in the identity index; a colliding identity is rejected
    /// rather than silently overwritten.
    pub fn define(&mut self, scope: ScopeId, mut symbol: Symbol) -> Result<SymbolId, DefineError> {
        if symbol.name().is_empty() {
            return Err(DefineError::EmptyName);
        }
        if self.scope(scope).members.contains(symbol.name()) {
            return Err(DefineError::Duplicate {
                name: symbol.name().to_string(),
                loc: symbol.loc(),
            });
        }
        let id = symbol.id();
        if scope == ScopeId::GLOBAL {
            if let Some(&slot) = self.identity.get(&id) {
                return Err(DefineError::IdentityClash {
                    name: symbol.name().to_string(),
                    existing: self.scopes[0].members.list[slot].name().to_string(),
                    id: id.raw(),
                });
            }
        }

        tracing::trace!(name = symbol.name(), scope = scope.raw(), "define");
        symbol.attach(scope);
        let slot = self.scope_mut(scope).members.insert(symbol);
        if scope == ScopeId::GLOBAL {
            self.identity.insert(id, slot);
        }
        Ok(id)
    }

    /// Look `name` up in `scope`, then in each enclosing scope out to the
    /// root. Returns the innermost definition; absence is a normal
    /// negative result, not an error.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let data = self.scope(id);
            if let Some(sym) = data.members.get(name) {
                return Some(sym);
            }
            current = data.parent;
        }
        None
    }

    /// Look `name` up in `scope` only, without walking the chain.
    pub fn resolve_local(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        self.scope(scope).members.get(name)
    }

    /// The scope's symbols in insertion order.
    pub fn members(&self, scope: ScopeId) -> impl Iterator<Item = &Symbol> {
        self.scope(scope).members.list.iter()
    }

    /// Copy every symbol of `src` into `dst`, in `src`'s insertion order,
    /// through [`define`], inheriting its duplicate detection.
    ///
    /// [`define`]: SymbolTable::define
    pub fn append(&mut self, dst: ScopeId, src: ScopeId) -> Result<(), DefineError> {
        let copies: Vec<Symbol> = self.scope(src).members.list.to_vec();
        for symbol in copies {
            self.define(dst, symbol)?;
        }
        Ok(())
    }

    /// Identity lookup in the global scope, filtered by expected kind.
    ///
    /// Deserialization-style callers address symbols by their stable
    /// numeric key; a kind mismatch is absence, not a panic.
    pub fn find_binding(&self, id: SymbolId, tag: SymbolTag) -> Option<&Symbol> {
        let &slot = self.identity.get(&id)?;
        let symbol = &self.scopes[0].members.list[slot];
        (symbol.kind().tag() == tag).then_some(symbol)
    }

    /// Remove every user-defined symbol from the global scope, keeping
    /// builtins, so the table can serve a fresh compilation session.
    ///
    /// Rebuilds the member list and identity index from the survivor set
    /// in one pass (no in-place removal), and drops cached type
    /// references that lean on removed symbols.
    pub fn remove_user_defines(&mut self) {
        let global = &mut self.scopes[0];
        let before = global.members.list.len();

        let survivors: Vec<Symbol> = global
            .members
            .list
            .iter()
            .filter(|s| s.is_builtin())
            .cloned()
            .collect();

        let mut members = Members::default();
        let mut identity = FxHashMap::default();
        for symbol in survivors {
            let id = symbol.id();
            let slot = members.insert(symbol);
            identity.insert(id, slot);
        }
        let after = members.list.len();
        global.members = members;
        self.identity = identity;

        self.type_cache.retain(|_, tr| tr.survives_reset());

        tracing::debug!(removed = before - after, "removed user defines");
    }

    fn scope(&self, id: ScopeId) -> &ScopeData {
        &self.scopes[id.0 as usize]
    }

    fn scope_mut(&mut self, id: ScopeId) -> &mut ScopeData {
        &mut self.scopes[id.0 as usize]
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
