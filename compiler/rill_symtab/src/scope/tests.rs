use pretty_assertions::assert_eq;

use super::*;
use crate::loc::SourceLoc;
use crate::symbol::{Symbol, SymbolKind, SymbolTag};
use crate::types::{Type, TypeRef};

fn class(name: &str) -> Symbol {
    Symbol::new(name, SymbolKind::Class)
}

fn var(name: &str, ty: &str) -> Symbol {
    Symbol::new(
        name,
        SymbolKind::Var {
            ty: TypeRef::deferred(ty, ScopeId::GLOBAL),
        },
    )
}

#[test]
fn builtins_are_seeded() {
    let table = SymbolTable::new();
    for name in ["int", "float", "bool", "string", "void", "any", "int[]"] {
        assert!(
            table.resolve(ScopeId::GLOBAL, name).is_some(),
            "missing builtin {name}"
        );
    }
    assert!(table.resolve(ScopeId::GLOBAL, "void[]").is_none());
}

#[test]
fn shadowing_resolves_innermost() {
    let mut table = SymbolTable::new();
    let local = table.push_scope("local", ScopeId::GLOBAL);

    table.define(ScopeId::GLOBAL, var("x", "int")).unwrap();
    table.define(local, var("x", "float")).unwrap();

    let found = table.resolve(local, "x").unwrap();
    assert_eq!(found.scope(), Some(local));
    match found.kind() {
        SymbolKind::Var { ty } => assert_eq!(ty.name(), "float"),
        other => panic!("expected var, got {other:?}"),
    }

    // The global definition is untouched and still wins at global level.
    let outer = table.resolve(ScopeId::GLOBAL, "x").unwrap();
    assert_eq!(outer.scope(), Some(ScopeId::GLOBAL));
}

#[test]
fn duplicate_is_scope_local_only() {
    let mut table = SymbolTable::new();
    let local = table.push_scope("local", ScopeId::GLOBAL);

    table.define(ScopeId::GLOBAL, var("x", "int")).unwrap();
    let err = table
        .define(ScopeId::GLOBAL, var("x", "int"))
        .unwrap_err();
    assert!(matches!(err, DefineError::Duplicate { ref name, .. } if name == "x"));

    // Same name in a nested scope is shadowing, not a collision.
    assert!(table.define(local, var("x", "int")).is_ok());
}

#[test]
fn duplicate_error_carries_location() {
    let mut table = SymbolTable::new();
    table.define(ScopeId::GLOBAL, class("Color")).unwrap();
    let err = table
        .define(
            ScopeId::GLOBAL,
            class("Color").with_loc(SourceLoc::new(4, 1)),
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "4:1: already defined symbol `Color`");
}

#[test]
fn empty_name_rejected() {
    let mut table = SymbolTable::new();
    let err = table.define(ScopeId::GLOBAL, class("")).unwrap_err();
    assert_eq!(err, DefineError::EmptyName);
}

#[test]
fn resolution_walks_whole_chain() {
    let mut table = SymbolTable::new();
    let outer = table.push_scope("outer", ScopeId::GLOBAL);
    let inner = table.push_scope("inner", outer);

    table.define(ScopeId::GLOBAL, var("g", "int")).unwrap();
    table.define(outer, var("o", "int")).unwrap();

    assert!(table.resolve(inner, "g").is_some());
    assert!(table.resolve(inner, "o").is_some());
    assert!(table.resolve(inner, "missing").is_none());

    // Local lookup does not walk the chain.
    assert!(table.resolve_local(inner, "o").is_none());
}

#[test]
fn scope_accessors() {
    let mut table = SymbolTable::new();
    let local = table.push_scope("body", ScopeId::GLOBAL);

    assert_eq!(table.scope_name(ScopeId::GLOBAL), "global");
    assert_eq!(table.scope_name(local), "body");
    assert_eq!(table.parent(local), Some(ScopeId::GLOBAL));
    assert_eq!(table.parent(ScopeId::GLOBAL), None);
}

#[test]
fn identity_and_name_lookups_agree() {
    let mut table = SymbolTable::new();
    let id = table.define(ScopeId::GLOBAL, class("Color")).unwrap();

    let by_id = table.find_binding(id, SymbolTag::Class).unwrap();
    let by_name = table.resolve(ScopeId::GLOBAL, "Color").unwrap();
    assert_eq!(by_id.id(), by_name.id());
    assert_eq!(by_id.name(), "Color");

    // Wrong expected kind is absence, not a panic.
    assert!(table.find_binding(id, SymbolTag::Var).is_none());
}

#[test]
fn identity_clash_is_rejected() {
    let mut table = SymbolTable::new();
    let id = table.define(ScopeId::GLOBAL, class("Color")).unwrap();

    let err = table
        .define(ScopeId::GLOBAL, class("Shade").with_id(id))
        .unwrap_err();
    assert!(matches!(err, DefineError::IdentityClash { ref existing, .. } if existing == "Color"));
}

#[test]
fn remove_user_defines_keeps_builtins() {
    let mut table = SymbolTable::new();
    let color = table.define(ScopeId::GLOBAL, class("Color")).unwrap();
    table.define(ScopeId::GLOBAL, var("x", "int")).unwrap();

    table.remove_user_defines();

    assert!(table.resolve(ScopeId::GLOBAL, "int").is_some());
    assert!(table.resolve(ScopeId::GLOBAL, "int[]").is_some());
    assert!(table.resolve(ScopeId::GLOBAL, "Color").is_none());
    assert!(table.resolve(ScopeId::GLOBAL, "x").is_none());
    assert!(table.find_binding(color, SymbolTag::Class).is_none());

    // The table is reusable: the removed names can be defined again.
    assert!(table.define(ScopeId::GLOBAL, class("Color")).is_ok());
}

#[test]
fn remove_user_defines_rebuilds_identity_index() {
    let mut table = SymbolTable::new();
    table.define(ScopeId::GLOBAL, class("Color")).unwrap();

    table.remove_user_defines();

    // Every surviving builtin is still reachable through both indexes.
    for symbol in table
        .members(ScopeId::GLOBAL)
        .map(|s| (s.id(), s.kind().tag(), s.name().to_string()))
        .collect::<Vec<_>>()
    {
        let (id, tag, name) = symbol;
        let found = table.find_binding(id, tag).unwrap();
        assert_eq!(found.name(), name);
    }
}

#[test]
fn members_preserve_insertion_order() {
    let mut table = SymbolTable::new();
    let class_scope = table.push_scope("Color", ScopeId::GLOBAL);
    table.define(class_scope, var("r", "int")).unwrap();
    table.define(class_scope, var("g", "int")).unwrap();
    table.define(class_scope, var("b", "int")).unwrap();

    let names: Vec<&str> = table.members(class_scope).map(Symbol::name).collect();
    assert_eq!(names, ["r", "g", "b"]);
}

#[test]
fn append_copies_in_order() {
    let mut table = SymbolTable::new();
    let module = table.push_scope("module", ScopeId::GLOBAL);
    let importer = table.push_scope("importer", ScopeId::GLOBAL);

    table.define(module, var("a", "int")).unwrap();
    table.define(module, var("b", "int")).unwrap();

    table.append(importer, module).unwrap();

    let names: Vec<&str> = table.members(importer).map(Symbol::name).collect();
    assert_eq!(names, ["a", "b"]);
    // Copies are owned by the destination scope.
    assert_eq!(
        table.resolve_local(importer, "a").unwrap().scope(),
        Some(importer)
    );
}

#[test]
fn append_surfaces_duplicates() {
    let mut table = SymbolTable::new();
    let module = table.push_scope("module", ScopeId::GLOBAL);
    let importer = table.push_scope("importer", ScopeId::GLOBAL);

    table.define(module, var("a", "int")).unwrap();
    table.define(importer, var("a", "float")).unwrap();

    let err = table.append(importer, module).unwrap_err();
    assert!(matches!(err, DefineError::Duplicate { ref name, .. } if name == "a"));
}

#[test]
fn array_builtin_wraps_primitive() {
    let table = SymbolTable::new();
    let arr = table.resolve(ScopeId::GLOBAL, "int[]").unwrap();
    assert!(arr.is_builtin());
    match arr.kind() {
        SymbolKind::ArrayType { elem } => {
            assert_eq!(elem.get(&table), Some(Type::Primitive(Primitive::Int)));
        }
        other => panic!("expected array type, got {other:?}"),
    }
}
