//! Override and mode validation for method declarations.

use crate::symbols::{ClassId, MethodSig, Param};
use crate::types::{Type, is_subtype, replace_self_type, resolve_attached_class, show};

use super::Validator;
use super::diagnostics::codes;

impl<'a> Validator<'a> {
    pub(super) fn validate_methods(&mut self, class: ClassId) {
        let table = self.table;
        let def = table.class(class);
        for method in &def.methods {
            self.validate_method(class, method, false);
        }
        for method in &def.singleton_methods {
            self.validate_method(class, method, true);
        }
    }

    fn validate_method(&mut self, class: ClassId, method: &MethodSig, singleton: bool) {
        self.metrics.methods_checked += 1;
        let overridden = self.overridden_methods(class, &method.name, singleton);

        if overridden.is_empty() && method.mode.is_override() {
            let display = self.method_display(class, &method.name, singleton);
            let mut diagnostic = super::diagnostics::error(
                codes::OVERRIDE_TARGET_MISSING,
                format!("method `{display}` is marked `override` but does not override anything"),
                method.span,
            );
            diagnostic.add_note(
                "if this method is meant to be overridden itself, declare it `overridable` or `abstract` instead"
                    .to_string(),
            );
            self.diagnostics.push(diagnostic);
            return;
        }

        let any_abstract = overridden.iter().any(|parent| parent.mode.is_abstract());
        for parent in &overridden {
            let parent_owner = parent.owner.unwrap_or(class);
            let parent_display = self.method_display(parent_owner, &parent.name, singleton);
            let display = self.method_display(class, &method.name, singleton);

            if parent.is_final {
                self.emit_error_with_context(
                    codes::FINAL_METHOD_OVERRIDE,
                    method.span,
                    format!(
                        "`{parent_display}` was declared as final and cannot be overridden by `{display}`"
                    ),
                    "original method defined here",
                    parent.span,
                );
            }

            if !method.mode.is_override()
                && method.has_sig
                && parent.has_sig
                && (parent.mode.is_overridable() || parent.mode.is_override())
                && !any_abstract
            {
                self.emit_error_with_context(
                    codes::UNDECLARED_OVERRIDE,
                    method.span,
                    format!(
                        "method `{display}` overrides an overridable method `{parent_display}` but is not declared with `override`"
                    ),
                    "defined here",
                    parent.span,
                );
            }

            if !method.mode.is_override()
                && !method.mode.is_abstract()
                && method.has_sig
                && parent.has_sig
                && parent.mode.is_abstract()
            {
                self.emit_error_with_context(
                    codes::UNDECLARED_OVERRIDE,
                    method.span,
                    format!(
                        "method `{display}` implements an abstract method `{parent_display}` but is not declared with `override`"
                    ),
                    "defined here",
                    parent.span,
                );
            }

            if parent.mode.is_abstract()
                || parent.mode.is_overridable()
                || (parent.has_sig && method.mode.is_override())
            {
                self.validate_compatible_override(class, parent, method, singleton);
            }
        }
    }

    /// Every method with the same name found through the ancestor
    /// linearization, most-derived first. The walk covers diamonds: a
    /// final method buried behind several mixin layers still surfaces.
    fn overridden_methods(
        &self,
        class: ClassId,
        name: &str,
        singleton: bool,
    ) -> Vec<&'a MethodSig> {
        let table = self.table;
        let mut found = Vec::new();
        if singleton {
            let mut current = table.class(class).superclass;
            while let Some(ancestor) = current {
                if let Some(method) = table.find_singleton_method(ancestor, name) {
                    found.push(method);
                }
                for mixin in table.class(ancestor).singleton_mixins.iter().rev() {
                    if let Some(method) = table.find_method_transitive(*mixin, name) {
                        found.push(method);
                    }
                }
                current = table.class(ancestor).superclass;
            }
            // Modules extended onto this class itself also supply
            // singleton methods the declaration may override.
            for mixin in table.class(class).singleton_mixins.iter().rev() {
                if let Some(method) = table.find_method_transitive(*mixin, name) {
                    found.push(method);
                }
            }
        } else {
            for ancestor in table.ancestors(class).iter().skip(1) {
                if let Some(method) = table.find_method(*ancestor, name) {
                    found.push(method);
                }
            }
        }
        found
    }

    /// Argument-shape and type compatibility between an override and the
    /// method it overrides. Each rule reports its own violation so a
    /// single bad override can surface several problems at once.
    fn validate_compatible_override(
        &mut self,
        class: ClassId,
        parent: &MethodSig,
        method: &MethodSig,
        singleton: bool,
    ) {
        self.metrics.overrides_checked += 1;
        let parent_owner = parent.owner.unwrap_or(class);
        let parent_display = self.method_display(parent_owner, &parent.name, singleton);
        let of_parent = format!(
            "{} method `{parent_display}`",
            parent_kind_word(parent)
        );

        if parent.type_parameters.len() != method.type_parameters.len() {
            let message = if parent.type_parameters.is_empty() {
                format!("override of {of_parent} must not declare type parameters")
            } else {
                format!(
                    "override of {of_parent} must declare the same number of type parameters as the base method"
                )
            };
            self.emit_error_with_context(
                codes::OVERRIDE_TYPE_PARAMETER_COUNT,
                method.span,
                message,
                "base method defined here",
                parent.span,
            );
        }

        if method.pos_rest.is_none() {
            let parent_total = parent.positional_total();
            if parent_total > method.positional_total() {
                self.emit_error_with_context(
                    codes::OVERRIDE_POSITIONAL_ARITY,
                    method.span,
                    format!(
                        "override of {of_parent} must accept at least {parent_total} positional argument(s)"
                    ),
                    "base method defined here",
                    parent.span,
                );
            }
        }

        if let Some(rest) = &parent.pos_rest {
            if method.pos_rest.is_none() {
                self.emit_error_with_context(
                    codes::OVERRIDE_MISSING_REST,
                    method.span,
                    format!("override of {of_parent} must accept *`{}`", rest.name),
                    "base method defined here",
                    parent.span,
                );
            }
        }

        if method.pos_required.len() > parent.pos_required.len() {
            self.emit_error_with_context(
                codes::OVERRIDE_EXTRA_REQUIRED,
                method.span,
                format!(
                    "override of {of_parent} must accept no more than {} required argument(s)",
                    parent.pos_required.len()
                ),
                "base method defined here",
                parent.span,
            );
        }

        self.match_positional(class, parent, &parent.pos_required, &method.pos_required, method, singleton);
        self.match_positional(class, parent, &parent.pos_optional, &method.pos_optional, method, singleton);

        if method.kw_rest.is_none() {
            for required in &parent.kw_required {
                match method.keyword(&required.name) {
                    Some(param) => {
                        self.check_parameter_type(class, parent, param, required, method, singleton);
                    }
                    None => {
                        self.emit_error_with_context(
                            codes::OVERRIDE_MISSING_KEYWORD,
                            method.span,
                            format!(
                                "override of {of_parent} is missing required keyword argument `{}`",
                                required.name
                            ),
                            "base method defined here",
                            parent.span,
                        );
                    }
                }
            }

            for optional in &parent.kw_optional {
                if method.has_optional_keyword(&optional.name) {
                    if let Some(param) = method.keyword(&optional.name) {
                        self.check_parameter_type(class, parent, param, optional, method, singleton);
                    }
                } else if method.has_required_keyword(&optional.name) {
                    self.emit_error_with_context(
                        codes::OVERRIDE_KEYWORD_MUST_BE_OPTIONAL,
                        method.span,
                        format!(
                            "override of {of_parent} must redeclare keyword parameter `{}` as optional",
                            optional.name
                        ),
                        "the optional parameter was declared here",
                        parent.span,
                    );
                } else {
                    self.emit_error_with_context(
                        codes::OVERRIDE_MISSING_OPTIONAL_KEYWORD,
                        method.span,
                        format!(
                            "override of {of_parent} must accept optional keyword parameter `{}`",
                            optional.name
                        ),
                        "the optional parameter was declared here",
                        parent.span,
                    );
                }
            }
        }

        if let Some(parent_rest) = &parent.kw_rest {
            match &method.kw_rest {
                None => {
                    self.emit_error_with_context(
                        codes::OVERRIDE_MISSING_KWREST,
                        method.span,
                        format!("override of {of_parent} must accept **`{}`", parent_rest.name),
                        "base method defined here",
                        parent.span,
                    );
                }
                Some(rest) => {
                    self.check_parameter_type(class, parent, rest, parent_rest, method, singleton);
                }
            }
        }

        for extra in &method.kw_required {
            if parent.keyword(&extra.name).is_some() {
                continue;
            }
            self.emit_error_with_context(
                codes::OVERRIDE_EXTRA_REQUIRED_KEYWORD,
                method.span,
                format!(
                    "override of {of_parent} contains extra required keyword argument `{}`",
                    extra.name
                ),
                "base method defined here",
                parent.span,
            );
        }

        match (&parent.block, &method.block) {
            (Some(_), None) => {
                self.emit_error_with_context(
                    codes::OVERRIDE_MISSING_BLOCK,
                    method.span,
                    format!("override of {of_parent} must accept a block parameter"),
                    "base method defined here",
                    parent.span,
                );
            }
            (Some(parent_block), Some(block)) => {
                self.check_parameter_type(class, parent, block, parent_block, method, singleton);
            }
            _ => {}
        }

        // Return types compare covariantly: the override must return a
        // subtype of what the base method promises.
        if !self.types_exempt(&method.return_type, &parent.return_type) {
            let child_return = self.as_seen_from(&method.return_type, class);
            let parent_return = self.as_seen_from(&parent.return_type, class);
            if !is_subtype(self.table, &child_return, &parent_return) {
                self.emit_error_with_context(
                    codes::OVERRIDE_RETURN_TYPE,
                    method.span,
                    format!(
                        "return type `{}` does not match return type of {of_parent}",
                        show(self.table, &method.return_type)
                    ),
                    format!(
                        "base method defined here with return type `{}`",
                        show(self.table, &parent.return_type)
                    ),
                    parent.span,
                );
            }
        }

        if !method.visibility.at_least(parent.visibility) && !method.allow_incompatible {
            self.emit_error_with_context(
                codes::OVERRIDE_VISIBILITY,
                method.span,
                format!(
                    "override of {of_parent} narrows visibility from {} to {}",
                    parent.visibility.as_str(),
                    method.visibility.as_str()
                ),
                "base method defined here",
                parent.span,
            );
        }
    }

    /// Walk two positional parameter lists index-by-index, checking that
    /// each override parameter accepts at least what the base accepts.
    fn match_positional(
        &mut self,
        class: ClassId,
        parent: &MethodSig,
        parent_params: &[Param],
        method_params: &[Param],
        method: &MethodSig,
        singleton: bool,
    ) {
        for (parent_param, method_param) in parent_params.iter().zip(method_params.iter()) {
            self.check_parameter_type(class, parent, method_param, parent_param, method, singleton);
        }
    }

    /// Parameters compare contravariantly: the override's parameter type
    /// must be a supertype of the base parameter's type, observed from
    /// the overriding class. Positions mentioning an unbound generic
    /// placeholder are exempt; erasure makes them unverifiable here.
    fn check_parameter_type(
        &mut self,
        class: ClassId,
        parent: &MethodSig,
        method_param: &Param,
        parent_param: &Param,
        method: &MethodSig,
        singleton: bool,
    ) {
        if self.types_exempt(&method_param.ty, &parent_param.ty) {
            return;
        }
        let child_ty = self.as_seen_from(&method_param.ty, class);
        let parent_ty = self.as_seen_from(&parent_param.ty, class);
        if is_subtype(self.table, &parent_ty, &child_ty) {
            return;
        }
        let parent_owner = parent.owner.unwrap_or(class);
        let parent_display = self.method_display(parent_owner, &parent.name, singleton);
        let mut diagnostic = super::diagnostics::error(
            codes::OVERRIDE_PARAMETER_TYPE,
            format!(
                "parameter `{}` of type `{}` is not compatible with type of {} method `{parent_display}`",
                method_param.name,
                show(self.table, &method_param.ty),
                parent_kind_word(parent)
            ),
            method.span,
        );
        diagnostic.add_note(format!(
            "the base parameter `{}` was declared with type `{}`; an override parameter's type must be a supertype of it",
            parent_param.name,
            show(self.table, &parent_param.ty)
        ));
        self.diagnostics.push(diagnostic);
    }

    fn types_exempt(&self, a: &Type, b: &Type) -> bool {
        a.has_generic_placeholder() || b.has_generic_placeholder()
    }

    /// Substitute self and attached-class placeholders with the
    /// overriding class before comparing, so both signatures are observed
    /// from the same receiver.
    fn as_seen_from(&self, ty: &Type, class: ClassId) -> Type {
        let receiver = Type::simple(class);
        let substituted = replace_self_type(ty, &receiver);
        resolve_attached_class(&substituted, &receiver)
    }
}

fn parent_kind_word(parent: &MethodSig) -> &'static str {
    if parent.mode.is_abstract() {
        "abstract"
    } else if parent.mode.is_overridable() {
        "overridable"
    } else {
        "overridden"
    }
}
