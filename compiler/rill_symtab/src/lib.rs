//! Scope, symbol, and type-reference resolution for the Rill compiler.
//!
//! This crate answers the front end's two resolution questions:
//!
//! - [`SymbolTable`]: "what does this identifier refer to, given where it
//!   appears" — scope-local definition with duplicate detection, chain-walking
//!   lookup with shadowing, identity-keyed lookup for deserialization-style
//!   callers, and bulk reset of user-defined symbols between compilation
//!   sessions.
//! - [`TypeRef`]: "what type does this descriptor name" — memoized,
//!   possibly-deferred handles from textual type descriptors, so a type name
//!   may be used before its definition appears.
//!
//! # Architecture
//!
//! ```text
//! grammar parser (external, via TypeSyntaxParser)
//!         │ type-syntax nodes
//!         ▼
//! SymbolTable ── scopes (arena, ScopeId handles)
//!         │      symbols (closed SymbolKind variants)
//!         │      type cache (descriptor → TypeRef)
//!         ▼
//! type checker / code generator (external consumers)
//! ```
//!
//! # Thread Safety
//!
//! The table and its type references are single-threaded by design
//! (`Rc<RefCell<...>>` inside [`TypeRef`]): all mutation happens during one
//! sequential compilation pass. Compiling multiple units in parallel against
//! one shared table requires external synchronization; none is provided here.

mod error;
mod loc;
mod scope;
mod symbol;
mod types;

pub use error::{DefineError, TypeRefError};
pub use loc::SourceLoc;
pub use scope::{ScopeId, SymbolTable};
pub use symbol::{Primitive, Symbol, SymbolId, SymbolKind, SymbolTag};
pub use types::{FuncSignature, Type, TypeRef, TypeSyntax, TypeSyntaxParser};
