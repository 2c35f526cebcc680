use std::collections::HashMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::symbols::{ClassId, SymbolTable, well_known};

use super::{Type, union_of};

/// Canonicalizing constructor for the frequently-built type shapes.
///
/// The pool is explicitly owned by one analysis run and passed by
/// reference to whoever builds types; there is no ambient global.
/// Interning is a fast path, not a requirement: two structurally equal
/// types compare and hash equal whether or not they share an allocation,
/// but repeated `simple`/`nilable` requests return referentially
/// identical handles so equality short-circuits on the pointer.
///
/// All interning happens through `&mut self` during the single-threaded
/// construction phase; once declarations are resolved the pool is only
/// read (or dropped), so no synchronization is needed for queries.
#[derive(Debug, Default)]
pub struct TypePool {
    simple: HashMap<ClassId, Type>,
    nilable: HashMap<Type, Type>,
    untyped: Option<Type>,
    noreturn: Option<Type>,
    anything: Option<Type>,
}

impl TypePool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The canonical handle for a concrete class reference.
    pub fn simple(&mut self, class: ClassId) -> Type {
        self.simple
            .entry(class)
            .or_insert_with(|| Type::simple(class))
            .clone()
    }

    /// The canonical `T.nilable(ty)` pair.
    ///
    /// `nilable(untyped)` is rejected: the result would be
    /// indistinguishable from `untyped` and almost always signals a
    /// mistake in the declaration.
    pub fn nilable(&mut self, table: &SymbolTable, ty: Type) -> Result<Type> {
        if ty.is_untyped() {
            return Err(Error::construction(
                "T.nilable(T.untyped) is the same as T.untyped",
            ));
        }
        if let Some(cached) = self.nilable.get(&ty) {
            return Ok(cached.clone());
        }
        let nil = self.simple(well_known::NIL_CLASS);
        let pair = union_of(table, [ty.clone(), nil]);
        debug!(interned = self.nilable.len() + 1, "interned nilable pair");
        self.nilable.insert(ty, pair.clone());
        Ok(pair)
    }

    pub fn untyped(&mut self) -> Type {
        self.untyped.get_or_insert_with(Type::untyped).clone()
    }

    pub fn noreturn(&mut self) -> Type {
        self.noreturn.get_or_insert_with(Type::noreturn).clone()
    }

    pub fn anything(&mut self) -> Type {
        self.anything.get_or_insert_with(Type::anything).clone()
    }

    /// `Array[T.untyped]`, the degraded element type for containers whose
    /// contents cannot be inspected.
    pub fn array_of_untyped(&mut self) -> Type {
        let untyped = self.untyped();
        Type::applied(well_known::ARRAY, vec![untyped])
    }

    /// `Hash[T.untyped, T.untyped]`.
    pub fn hash_of_untyped(&mut self) -> Type {
        let untyped = self.untyped();
        Type::applied(well_known::HASH, vec![untyped.clone(), untyped])
    }
}
