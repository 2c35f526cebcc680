//! Abstract-method and interface shape validation, plus the completeness
//! check that concrete types implement every inherited abstract method.

use crate::diagnostics::Span;
use crate::symbols::{ClassId, MethodSig};

use super::Validator;
use super::diagnostics::codes;

impl<'a> Validator<'a> {
    /// Declaration-shape problems on one type: abstract methods in
    /// concrete owners, abstract bodies, module static abstracts, and
    /// the interface rules (every method abstract, public, and signed).
    pub(super) fn validate_abstract_shape(&mut self, class: ClassId) {
        let table = self.table;
        let def = table.class(class);

        for method in &def.methods {
            if !method.mode.is_abstract() {
                continue;
            }
            if !def.flags.is_abstract {
                let display = self.method_display(class, &method.name, false);
                self.emit_error(
                    codes::ABSTRACT_OWNER_NOT_ABSTRACT,
                    method.span,
                    format!(
                        "method `{display}` is declared abstract but `{}` is not declared abstract or interface",
                        def.name
                    ),
                );
            }
            if method.has_body {
                let display = self.method_display(class, &method.name, false);
                self.emit_error(
                    codes::ABSTRACT_BODY_FORBIDDEN,
                    method.span,
                    format!("abstract method `{display}` must not have a body"),
                );
            }
        }

        for method in &def.singleton_methods {
            if !method.mode.is_abstract() {
                continue;
            }
            if def.is_module() {
                // A module's singleton methods are invoked on the module
                // object itself, which nothing can subclass.
                self.emit_error(
                    codes::MODULE_STATIC_ABSTRACT,
                    method.span,
                    format!(
                        "static method `{}` in module `{}` cannot be abstract",
                        method.name, def.name
                    ),
                );
            } else if !def.flags.is_abstract {
                let display = self.method_display(class, &method.name, true);
                self.emit_error(
                    codes::ABSTRACT_OWNER_NOT_ABSTRACT,
                    method.span,
                    format!(
                        "method `{display}` is declared abstract but `{}` is not declared abstract or interface",
                        def.name
                    ),
                );
            }
            if method.has_body {
                let display = self.method_display(class, &method.name, true);
                self.emit_error(
                    codes::ABSTRACT_BODY_FORBIDDEN,
                    method.span,
                    format!("abstract method `{display}` must not have a body"),
                );
            }
        }

        if def.flags.is_interface {
            self.validate_interface_shape(class);
        }
    }

    fn validate_interface_shape(&mut self, class: ClassId) {
        let table = self.table;
        let def = table.class(class);
        for method in &def.methods {
            let display = self.method_display(class, &method.name, false);
            if !method.mode.is_abstract() {
                self.emit_error(
                    codes::INTERFACE_NON_ABSTRACT,
                    method.span,
                    format!(
                        "interface method `{display}` must be declared abstract"
                    ),
                );
            }
            if method.visibility != crate::symbols::Visibility::Public {
                self.emit_error(
                    codes::INTERFACE_NON_PUBLIC,
                    method.span,
                    format!(
                        "interface method `{display}` cannot be {}",
                        method.visibility.as_str()
                    ),
                );
            }
            if !method.has_sig {
                self.emit_error(
                    codes::INTERFACE_MISSING_SIG,
                    method.span,
                    format!("interface method `{display}` must have a signature"),
                );
            }
        }
        for mixin in &def.mixins {
            let mixed = table.class(*mixin);
            if mixed.flags.is_interface || mixed.flags.is_abstract || mixed.is_fully_abstract() {
                continue;
            }
            self.emit_error_with_context(
                codes::INTERFACE_MIXIN_NOT_ABSTRACT,
                def.span,
                format!(
                    "interface `{}` includes `{}`, which has non-abstract methods",
                    def.name, mixed.name
                ),
                format!("`{}` defined here", mixed.name),
                mixed.span,
            );
        }
    }

    /// A concrete type must implement every abstract method declared
    /// anywhere in its ancestor chain. Failures are reported per missing
    /// method, instance methods first, in a stable name order, each
    /// naming the ancestor that declared the method abstract.
    pub(super) fn validate_completeness(&mut self, class: ClassId) {
        let table = self.table;
        let def = table.class(class);
        if def.flags.is_abstract {
            return;
        }

        let mut missing_instance = self.missing_abstract_instance_methods(class);
        missing_instance.sort_by(|(a, _), (b, _)| a.name.cmp(&b.name));
        missing_instance.dedup_by(|(a, _), (b, _)| a.name == b.name);
        for (proto, owner) in missing_instance {
            let display = self.method_display(owner, &proto.name, false);
            self.emit_error_with_context(
                codes::MISSING_IMPLEMENTATION,
                def.span,
                format!(
                    "missing definition for abstract method `{display}` in `{}`",
                    def.name
                ),
                format!("declared abstract in `{}` here", table.name(owner)),
                proto.span,
            );
        }

        let mut missing_singleton = self.missing_abstract_singleton_methods(class);
        missing_singleton.sort_by(|(a, _), (b, _)| a.name.cmp(&b.name));
        missing_singleton.dedup_by(|(a, _), (b, _)| a.name == b.name);
        for (proto, owner) in missing_singleton {
            let display = self.method_display(owner, &proto.name, true);
            self.emit_error_with_context(
                codes::MISSING_IMPLEMENTATION,
                def.span,
                format!(
                    "missing definition for abstract class method `{display}` in `{}`",
                    def.name
                ),
                format!("declared abstract in `{}` here", table.name(owner)),
                proto.span,
            );
        }
    }

    fn missing_abstract_instance_methods(&self, class: ClassId) -> Vec<(&'a MethodSig, ClassId)> {
        let table = self.table;
        let mut missing = Vec::new();
        for ancestor in table.ancestors(class) {
            let ancestor_def = table.class(*ancestor);
            if !ancestor_def.flags.is_abstract {
                continue;
            }
            for proto in &ancestor_def.methods {
                if !proto.mode.is_abstract() || *ancestor == class {
                    continue;
                }
                if table
                    .find_concrete_method_transitive(class, &proto.name)
                    .is_none()
                {
                    missing.push((proto, *ancestor));
                }
            }
        }
        missing
    }

    fn missing_abstract_singleton_methods(&self, class: ClassId) -> Vec<(&'a MethodSig, ClassId)> {
        let table = self.table;
        let mut missing = Vec::new();
        let mut current = table.class(class).superclass;
        while let Some(ancestor) = current {
            let ancestor_def = table.class(ancestor);
            if ancestor_def.flags.is_abstract {
                for proto in &ancestor_def.singleton_methods {
                    if proto.mode.is_abstract()
                        && table
                            .find_concrete_singleton_method_transitive(class, &proto.name)
                            .is_none()
                    {
                        missing.push((proto, ancestor));
                    }
                }
            }
            current = ancestor_def.superclass;
        }
        missing
    }

    /// Call-site check: instantiating an abstract type is an error unless
    /// a concrete factory overrides the default instantiation path.
    pub fn validate_instantiation(&mut self, class: ClassId, span: Option<Span>) {
        let table = self.table;
        let def = table.class(class);
        if !def.flags.is_abstract {
            return;
        }
        if table
            .find_concrete_singleton_method_transitive(class, "new")
            .is_some()
        {
            return;
        }
        self.emit_error_with_context(
            codes::ABSTRACT_INSTANTIATION,
            span,
            format!("attempt to instantiate abstract {} `{}`", def.kind.as_str(), def.name),
            format!("`{}` defined here", def.name),
            def.span,
        );
    }
}
