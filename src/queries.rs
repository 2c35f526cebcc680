//! Memoizing query façade over the validator.
//!
//! Re-running a full validation pass for every consumer is wasteful when
//! the symbol table is frozen: results cannot change within a run, so the
//! façade caches them per query. A fresh `CheckQueries` is built per
//! analysis run; dropping it drops the caches with it.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::debug;

use crate::diagnostics::Diagnostic;
use crate::symbols::{ClassId, SymbolTable};
use crate::validate::{ValidationResult, Validator};

pub struct CheckQueries<'a> {
    table: &'a SymbolTable,
    full_cache: RefCell<Option<ValidationResult>>,
    subclass_cache: RefCell<HashMap<ClassId, Vec<Diagnostic>>>,
    abstract_cache: RefCell<HashMap<ClassId, Vec<Diagnostic>>>,
}

impl<'a> CheckQueries<'a> {
    #[must_use]
    pub fn new(table: &'a SymbolTable) -> Self {
        Self {
            table,
            full_cache: RefCell::new(None),
            subclass_cache: RefCell::new(HashMap::new()),
            abstract_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Whole-table validation, computed once.
    #[must_use]
    pub fn check_all(&self) -> ValidationResult {
        if let Some(cached) = self.full_cache.borrow().clone() {
            return cached;
        }
        debug!("check_all cache miss");
        let result = Validator::new(self.table).check_all();
        self.full_cache.replace(Some(result.clone()));
        result
    }

    /// Per-class subclass validation, memoized by class id.
    #[must_use]
    pub fn validate_subclass(&self, class: ClassId) -> Vec<Diagnostic> {
        if let Some(cached) = self.subclass_cache.borrow().get(&class) {
            return cached.clone();
        }
        debug!(class = class.0, "validate_subclass cache miss");
        let diagnostics = Validator::validate_subclass(self.table, class);
        self.subclass_cache
            .borrow_mut()
            .insert(class, diagnostics.clone());
        diagnostics
    }

    /// Per-class interface/abstract shape validation, memoized.
    #[must_use]
    pub fn validate_abstract_module(&self, class: ClassId) -> Vec<Diagnostic> {
        if let Some(cached) = self.abstract_cache.borrow().get(&class) {
            return cached.clone();
        }
        debug!(class = class.0, "validate_abstract_module cache miss");
        let diagnostics = Validator::validate_abstract_module(self.table, class);
        self.abstract_cache
            .borrow_mut()
            .insert(class, diagnostics.clone());
        diagnostics
    }
}
