//! Definition-time validation over a frozen symbol table.
//!
//! One [`Validator`] instance runs one analysis pass. Violations are
//! collected, never fail-fast: a single pass reports every missing
//! abstract implementation, every override-shape problem, and every
//! sealed/final breach it can find, in a stable order.

mod abstractness;
pub mod diagnostics;
mod finality;
mod overrides;
mod tests;
mod variance;

use std::time::{Duration, Instant};

use tracing::debug;

use crate::diagnostics::{Diagnostic, Label, Span};
use crate::symbols::{ClassId, SymbolTable};

/// Counters for one validation pass.
#[derive(Clone, Debug)]
pub struct ValidatorMetrics {
    pub classes_checked: usize,
    pub methods_checked: usize,
    pub overrides_checked: usize,
    pub violations: usize,
    pub elapsed: Duration,
}

impl Default for ValidatorMetrics {
    fn default() -> Self {
        Self {
            classes_checked: 0,
            methods_checked: 0,
            overrides_checked: 0,
            violations: 0,
            elapsed: Duration::from_secs(0),
        }
    }
}

/// Result of validating a whole table.
#[derive(Clone, Debug, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub metrics: ValidatorMetrics,
}

impl ValidationResult {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity.is_error())
    }
}

/// Collects definition-time violations over a frozen [`SymbolTable`].
pub struct Validator<'a> {
    pub(super) table: &'a SymbolTable,
    pub diagnostics: Vec<Diagnostic>,
    pub(super) metrics: ValidatorMetrics,
}

impl<'a> Validator<'a> {
    #[must_use]
    pub fn new(table: &'a SymbolTable) -> Self {
        Self {
            table,
            diagnostics: Vec::new(),
            metrics: ValidatorMetrics::default(),
        }
    }

    /// Validate every class and module in the table.
    #[must_use]
    pub fn check_all(mut self) -> ValidationResult {
        let start = Instant::now();
        debug!(classes = self.table.len(), "starting validation pass");
        for id in self.table.ids() {
            self.check_class(id);
        }
        self.metrics.violations = self.diagnostics.len();
        self.metrics.elapsed = start.elapsed();
        ValidationResult {
            diagnostics: self.diagnostics,
            metrics: self.metrics,
        }
    }

    /// Interface and abstract shape problems for one type.
    #[must_use]
    pub fn validate_abstract_module(table: &'a SymbolTable, class: ClassId) -> Vec<Diagnostic> {
        let mut validator = Validator::new(table);
        validator.validate_abstract_shape(class);
        validator.diagnostics
    }

    /// Subclass-facing problems for one type: missing abstract
    /// implementations, override shape mismatches, finality, sealing,
    /// and type-member redeclaration.
    #[must_use]
    pub fn validate_subclass(table: &'a SymbolTable, class: ClassId) -> Vec<Diagnostic> {
        let mut validator = Validator::new(table);
        validator.validate_completeness(class);
        validator.validate_final(class);
        validator.validate_sealed(class);
        validator.validate_type_member_redeclarations(class);
        validator.validate_methods(class);
        validator.diagnostics
    }

    fn check_class(&mut self, class: ClassId) {
        if self.table.class(class).synthetic {
            return;
        }
        self.metrics.classes_checked += 1;
        self.validate_abstract_shape(class);
        self.validate_completeness(class);
        self.validate_final(class);
        self.validate_sealed(class);
        self.validate_type_member_redeclarations(class);
        self.validate_method_variance(class);
        self.validate_methods(class);
    }

    pub(super) fn emit_error(
        &mut self,
        code: &'static str,
        span: Option<Span>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(diagnostics::error(code, message, span));
    }

    pub(super) fn emit_error_with_context(
        &mut self,
        code: &'static str,
        span: Option<Span>,
        message: impl Into<String>,
        context: impl Into<String>,
        context_span: Option<Span>,
    ) {
        let mut diagnostic = diagnostics::error(code, message, span);
        match context_span {
            Some(context_span) => {
                diagnostic = diagnostic.with_secondary(Label::secondary(context_span, context));
            }
            None => diagnostic.add_note(context),
        }
        self.diagnostics.push(diagnostic);
    }

    /// Display form of a method: `Owner#name` for instance methods,
    /// `Owner.name` for singleton methods.
    pub(super) fn method_display(&self, owner: ClassId, name: &str, singleton: bool) -> String {
        let separator = if singleton { "." } else { "#" };
        format!("{}{separator}{name}", self.table.name(owner))
    }
}
