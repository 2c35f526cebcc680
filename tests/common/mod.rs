//! Shared fixtures for the integration suites.
#![allow(dead_code)]

use lattice::diagnostics::FileId;
use lattice::symbols::well_known;
use lattice::{SymbolTable, Type};

pub const UNIT: FileId = FileId(0);

#[must_use]
pub fn frozen_core() -> SymbolTable {
    let mut table = SymbolTable::new();
    let diagnostics = table.freeze();
    assert!(
        diagnostics.is_empty(),
        "core table should freeze cleanly: {diagnostics:?}"
    );
    table
}

#[must_use]
pub fn integer() -> Type {
    Type::simple(well_known::INTEGER)
}

#[must_use]
pub fn float() -> Type {
    Type::simple(well_known::FLOAT)
}

#[must_use]
pub fn numeric() -> Type {
    Type::simple(well_known::NUMERIC)
}

#[must_use]
pub fn string() -> Type {
    Type::simple(well_known::STRING)
}

#[must_use]
pub fn object() -> Type {
    Type::simple(well_known::OBJECT)
}

#[must_use]
pub fn array_of(element: Type) -> Type {
    Type::applied(well_known::ARRAY, vec![element])
}
