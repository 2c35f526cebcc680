//! Final and sealed hierarchy enforcement.

use crate::symbols::{ClassId, MethodSig};

use super::Validator;
use super::diagnostics::codes;

impl Validator<'_> {
    /// A final type bars all inheritance, inclusion, and extension, and
    /// every method it declares must itself be final. A final method can
    /// never be redefined, even within the declaring type.
    pub(super) fn validate_final(&mut self, class: ClassId) {
        let table = self.table;
        let def = table.class(class);

        if let Some(superclass) = def.superclass {
            let parent = table.class(superclass);
            if parent.flags.is_final {
                self.emit_error_with_context(
                    codes::FINAL_ANCESTOR,
                    def.span,
                    format!(
                        "`{}` was declared as final and cannot be inherited by `{}`",
                        parent.name, def.name
                    ),
                    format!("`{}` defined here", parent.name),
                    parent.span,
                );
            }
        }
        for mixin in &def.mixins {
            let parent = table.class(*mixin);
            if parent.flags.is_final {
                self.emit_error_with_context(
                    codes::FINAL_ANCESTOR,
                    def.span,
                    format!(
                        "`{}` was declared as final and cannot be included in `{}`",
                        parent.name, def.name
                    ),
                    format!("`{}` defined here", parent.name),
                    parent.span,
                );
            }
        }
        for mixin in &def.singleton_mixins {
            let parent = table.class(*mixin);
            if parent.flags.is_final {
                self.emit_error_with_context(
                    codes::FINAL_ANCESTOR,
                    def.span,
                    format!(
                        "`{}` was declared as final and cannot be extended in `{}`",
                        parent.name, def.name
                    ),
                    format!("`{}` defined here", parent.name),
                    parent.span,
                );
            }
        }

        if def.flags.is_final {
            for method in def.methods.iter().chain(def.singleton_methods.iter()) {
                if !method.is_final {
                    self.emit_error(
                        codes::FINAL_TYPE_NON_FINAL_METHOD,
                        method.span,
                        format!(
                            "`{}` was declared as final but its method `{}` was not declared as final",
                            def.name, method.name
                        ),
                    );
                }
            }
        }

        self.validate_final_redefinitions(class, &def.methods, false);
        self.validate_final_redefinitions(class, &def.singleton_methods, true);
    }

    fn validate_final_redefinitions(
        &mut self,
        class: ClassId,
        methods: &[MethodSig],
        singleton: bool,
    ) {
        for (index, method) in methods.iter().enumerate() {
            let redefined_final = methods[..index]
                .iter()
                .any(|earlier| earlier.name == method.name && earlier.is_final);
            if redefined_final {
                let display = self.method_display(class, &method.name, singleton);
                self.emit_error(
                    codes::FINAL_METHOD_REDEFINED,
                    method.span,
                    format!("`{display}` was declared as final and cannot be redefined"),
                );
            }
        }
    }

    /// Sealed types only admit direct subclasses, includers, and
    /// extenders declared in the units where `sealed!` appeared.
    pub(super) fn validate_sealed(&mut self, class: ClassId) {
        let table = self.table;
        let def = table.class(class);

        if let Some(superclass) = def.superclass {
            let parent = table.class(superclass);
            if parent.flags.is_sealed && !parent.sealed_units.contains(&def.unit) {
                self.emit_sealed_violation(class, superclass, "inherited");
            }
        }
        for mixin in &def.mixins {
            let parent = table.class(*mixin);
            if parent.flags.is_sealed && !parent.sealed_units.contains(&def.unit) {
                self.emit_sealed_violation(class, *mixin, "included");
            }
        }
        for mixin in &def.singleton_mixins {
            let parent = table.class(*mixin);
            if parent.flags.is_sealed && !parent.sealed_units.contains(&def.unit) {
                self.emit_sealed_violation(class, *mixin, "extended");
            }
        }
    }

    fn emit_sealed_violation(&mut self, class: ClassId, parent: ClassId, verb: &str) {
        let table = self.table;
        let def = table.class(class);
        let parent_def = table.class(parent);
        let mut diagnostic = super::diagnostics::error(
            codes::SEALED_ANCESTOR,
            format!(
                "`{}` is sealed and cannot be {verb} by `{}`",
                parent_def.name, def.name
            ),
            def.span,
        );
        for unit in &parent_def.sealed_units {
            diagnostic.add_note(format!(
                "`{}` was marked sealed and can only be {verb} in unit {}",
                parent_def.name, unit.0
            ));
        }
        self.diagnostics.push(diagnostic);
    }
}
