//! Type references: memoized, possibly-deferred handles from textual
//! type descriptors.
//!
//! A descriptor like `"int"`, `"Color[]"` or `"func(int)string"` resolves
//! through [`SymbolTable::type_ref`] to a [`TypeRef`]. Resolution may be
//! deferred (a type name can syntactically precede its definition), in
//! which case the handle remembers the descriptor and the scope it must
//! eventually resolve in, and [`TypeRef::get`] completes (and memoizes)
//! the resolution once the named type exists.
//!
//! Compound descriptors are parsed by the external grammar parser behind
//! the [`TypeSyntaxParser`] collaborator trait; this crate only walks the
//! resulting nodes.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::TypeRefError;
use crate::loc::SourceLoc;
use crate::scope::{ScopeId, SymbolTable};
use crate::symbol::{Primitive, Symbol, SymbolKind};

/// Parameter and return types of a function type.
#[derive(Clone, Debug, PartialEq)]
pub struct FuncSignature {
    pub params: Vec<TypeRef>,
    pub ret: TypeRef,
}

/// A resolved type.
///
/// Closed sum over the type kinds the front end distinguishes; composite
/// kinds are built recursively from component [`TypeRef`]s.
#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    /// A builtin type such as `int`.
    Primitive(Primitive),
    /// An array of some element type.
    Array(TypeRef),
    /// A function type with a signature.
    Func(FuncSignature),
    /// Multiple return values.
    Multi(Vec<TypeRef>),
    /// A resolved user-defined type.
    Named { name: String, id: crate::SymbolId },
}

impl Type {
    /// Whether this type survives [`SymbolTable::remove_user_defines`]:
    /// it must bottom out in builtins only.
    pub(crate) fn survives_reset(&self) -> bool {
        match self {
            Type::Primitive(_) => true,
            Type::Array(elem) => elem.survives_reset(),
            Type::Func(sig) => {
                sig.params.iter().all(TypeRef::survives_reset) && sig.ret.survives_reset()
            }
            Type::Multi(items) => items.iter().all(TypeRef::survives_reset),
            Type::Named { .. } => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p) => write!(f, "{p}"),
            Type::Array(elem) => write!(f, "{}[]", elem.name()),
            Type::Func(sig) => {
                write!(f, "func(")?;
                for (i, p) in sig.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", p.name())?;
                }
                write!(f, "){}", sig.ret.name())
            }
            Type::Multi(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item.name())?;
                }
                Ok(())
            }
            Type::Named { name, .. } => f.write_str(name),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum TypeRefState {
    Resolved(Type),
    Deferred {
        descriptor: String,
        /// Scope the descriptor must eventually resolve in.
        scope: ScopeId,
        /// Declaration site, for diagnostics.
        origin: Option<SourceLoc>,
    },
}

/// Shared handle to a resolved-or-deferred type.
///
/// Cloning shares the handle; a deferred reference resolved through
/// [`TypeRef::get`] becomes resolved for every clone at once. Handle
/// identity ([`TypeRef::same_ref`]) is what the descriptor cache
/// guarantees stable across repeated lookups.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeRef {
    inner: Rc<RefCell<TypeRefState>>,
}

impl TypeRef {
    /// A reference that is already resolved.
    pub fn resolved(ty: Type) -> Self {
        TypeRef {
            inner: Rc::new(RefCell::new(TypeRefState::Resolved(ty))),
        }
    }

    /// A deferred reference: `descriptor` will be resolved in `scope`
    /// once the named type becomes available.
    pub fn deferred(descriptor: impl Into<String>, scope: ScopeId) -> Self {
        TypeRef {
            inner: Rc::new(RefCell::new(TypeRefState::Deferred {
                descriptor: descriptor.into(),
                scope,
                origin: None,
            })),
        }
    }

    /// Attach the declaration site of a deferred reference.
    #[must_use]
    pub fn with_origin(self, loc: SourceLoc) -> Self {
        if let TypeRefState::Deferred { origin, .. } = &mut *self.inner.borrow_mut() {
            *origin = Some(loc);
        }
        self
    }

    /// The descriptor (deferred) or rendered type name (resolved).
    pub fn name(&self) -> String {
        match &*self.inner.borrow() {
            TypeRefState::Resolved(ty) => ty.to_string(),
            TypeRefState::Deferred { descriptor, .. } => descriptor.clone(),
        }
    }

    /// Declaration site of a deferred reference, if recorded.
    pub fn origin(&self) -> Option<SourceLoc> {
        match &*self.inner.borrow() {
            TypeRefState::Resolved(_) => None,
            TypeRefState::Deferred { origin, .. } => *origin,
        }
    }

    /// Whether resolution has completed.
    pub fn is_resolved(&self) -> bool {
        matches!(&*self.inner.borrow(), TypeRefState::Resolved(_))
    }

    /// Whether this is a resolved primitive.
    pub fn is_primitive(&self) -> bool {
        matches!(
            &*self.inner.borrow(),
            TypeRefState::Resolved(Type::Primitive(_))
        )
    }

    /// The resolved type, resolving a deferred reference against its
    /// recorded scope first. Memoizes on success. `None` while the named
    /// type is still undefined.
    pub fn get(&self, table: &SymbolTable) -> Option<Type> {
        let (descriptor, scope) = match &*self.inner.borrow() {
            TypeRefState::Resolved(ty) => return Some(ty.clone()),
            TypeRefState::Deferred {
                descriptor, scope, ..
            } => (descriptor.clone(), *scope),
        };
        let ty = table
            .resolve(scope, &descriptor)
            .and_then(symbol_as_type)?;
        *self.inner.borrow_mut() = TypeRefState::Resolved(ty.clone());
        Some(ty)
    }

    /// Handle identity: do both references share one resolution slot?
    pub fn same_ref(&self, other: &TypeRef) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn survives_reset(&self) -> bool {
        match &*self.inner.borrow() {
            TypeRefState::Resolved(ty) => ty.survives_reset(),
            TypeRefState::Deferred { .. } => false,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// View a symbol as a type, if it declares one.
pub(crate) fn symbol_as_type(symbol: &Symbol) -> Option<Type> {
    match symbol.kind() {
        SymbolKind::Primitive(p) => Some(Type::Primitive(*p)),
        SymbolKind::ArrayType { elem } => Some(Type::Array(elem.clone())),
        SymbolKind::Class => Some(Type::Named {
            name: symbol.name().to_string(),
            id: symbol.id(),
        }),
        SymbolKind::Func { .. } | SymbolKind::Var { .. } => None,
    }
}

/// Structured form of a compound type descriptor, produced by the
/// external grammar parser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeSyntax {
    /// A bare type name.
    Name(String),
    /// An array marker over an element.
    Array(Box<TypeSyntax>),
    /// A function signature.
    Func {
        params: Vec<TypeSyntax>,
        ret: Box<TypeSyntax>,
    },
    /// A multi-value list (e.g. multiple return types).
    Multi(Vec<TypeSyntax>),
}

/// Collaborator interface to the grammar parser.
///
/// `parse_type` returns `None` for a descriptor it cannot parse; the
/// caller turns that into [`TypeRefError::Malformed`].
pub trait TypeSyntaxParser {
    fn parse_type(&self, descriptor: &str) -> Option<TypeSyntax>;
}

/// Simple descriptors are bare identifiers; anything else (array marker,
/// signature syntax, multi-value separator) is compound and goes through
/// the grammar parser.
fn is_simple(descriptor: &str) -> bool {
    descriptor
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl SymbolTable {
    /// Resolve a textual type descriptor to a [`TypeRef`], memoized by
    /// the exact descriptor string.
    ///
    /// Resolution order: the cache; then an already-defined type symbol
    /// in the chain from `scope`; then, for a simple descriptor, a
    /// deferred reference (forward references); for a compound one, the
    /// grammar parser plus recursive component resolution.
    ///
    /// Repeated calls with the identical descriptor return the identical
    /// handle and never re-invoke the parser.
    pub fn type_ref(
        &mut self,
        scope: ScopeId,
        descriptor: &str,
        parser: &dyn TypeSyntaxParser,
    ) -> Result<TypeRef, TypeRefError> {
        if descriptor.is_empty() {
            return Err(TypeRefError::Malformed {
                descriptor: String::new(),
            });
        }
        if let Some(cached) = self.type_cache.get(descriptor) {
            tracing::trace!(descriptor, "type cache hit");
            return Ok(cached.clone());
        }

        let tr = if let Some(ty) = self.resolve(scope, descriptor).and_then(symbol_as_type) {
            TypeRef::resolved(ty)
        } else if is_simple(descriptor) {
            TypeRef::deferred(descriptor, scope)
        } else {
            let node = parser
                .parse_type(descriptor)
                .ok_or_else(|| TypeRefError::Malformed {
                    descriptor: descriptor.to_string(),
                })?;
            self.syntax_ref(scope, &node, parser)?
        };

        self.type_cache.insert(descriptor.to_string(), tr.clone());
        Ok(tr)
    }

    /// Resolve one type-syntax node to a reference. Named components
    /// re-enter [`type_ref`] (sharing the cache and deferral machinery);
    /// structural components build composite types. A multi-value node
    /// with exactly one component degenerates to that component.
    ///
    /// [`type_ref`]: SymbolTable::type_ref
    fn syntax_ref(
        &mut self,
        scope: ScopeId,
        node: &TypeSyntax,
        parser: &dyn TypeSyntaxParser,
    ) -> Result<TypeRef, TypeRefError> {
        match node {
            TypeSyntax::Name(name) => self.type_ref(scope, name, parser),
            TypeSyntax::Array(elem) => {
                let elem = self.syntax_ref(scope, elem, parser)?;
                Ok(TypeRef::resolved(Type::Array(elem)))
            }
            TypeSyntax::Func { params, ret } => {
                let params = params
                    .iter()
                    .map(|p| self.syntax_ref(scope, p, parser))
                    .collect::<Result<Vec<_>, _>>()?;
                let ret = self.syntax_ref(scope, ret, parser)?;
                Ok(TypeRef::resolved(Type::Func(FuncSignature {
                    params,
                    ret,
                })))
            }
            TypeSyntax::Multi(items) if items.len() == 1 => {
                self.syntax_ref(scope, &items[0], parser)
            }
            TypeSyntax::Multi(items) => {
                let items = items
                    .iter()
                    .map(|item| self.syntax_ref(scope, item, parser))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(TypeRef::resolved(Type::Multi(items)))
            }
        }
    }
}
