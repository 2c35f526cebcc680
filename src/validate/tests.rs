#![cfg(test)]

use std::fmt::Write;

use expect_test::expect;

use crate::diagnostics::{Diagnostic, FileId};
use crate::symbols::{
    Checked, ClassId, MethodSig, Mode, Param, SymbolTable, TypeMemberDef, Variance, Visibility,
    well_known,
};
use crate::types::Type;

use super::Validator;

const UNIT: FileId = FileId(0);

fn object() -> Type {
    Type::simple(well_known::OBJECT)
}

fn integer() -> Type {
    Type::simple(well_known::INTEGER)
}

fn numeric() -> Type {
    Type::simple(well_known::NUMERIC)
}

fn string() -> Type {
    Type::simple(well_known::STRING)
}

fn param(name: &str) -> Param {
    Param::new(name, object())
}

fn sig(name: &str) -> MethodSig {
    MethodSig::simple(name, object())
}

fn freeze(table: &mut SymbolTable) {
    let diagnostics = table.freeze();
    assert!(
        diagnostics.is_empty(),
        "unexpected freeze diagnostics: {diagnostics:?}"
    );
}

fn codes_of(diagnostics: &[Diagnostic]) -> Vec<&str> {
    diagnostics
        .iter()
        .filter_map(Diagnostic::code_str)
        .collect()
}

fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut buffer = String::new();
    for diagnostic in diagnostics {
        writeln!(buffer, "[{:?}]: {}", diagnostic.severity, diagnostic.message)
            .unwrap_or_default();
        for note in &diagnostic.notes {
            writeln!(buffer, "  note: {note}").unwrap_or_default();
        }
    }
    buffer
}

/// `Base#foo(req, opt = _, kwreq:, kwopt: _, &blk)`, overridable.
fn override_shape_parent() -> MethodSig {
    MethodSig {
        mode: Mode::Overridable,
        pos_required: vec![param("req")],
        pos_optional: vec![param("opt")],
        kw_required: vec![param("kwreq")],
        kw_optional: vec![param("kwopt")],
        block: Some(param("blk")),
        ..sig("foo")
    }
}

fn validate_override_shape(child_sig: MethodSig) -> Vec<Diagnostic> {
    let mut table = SymbolTable::new();
    let base = table.define_class("Base", None, UNIT).unwrap();
    table.add_method(base, override_shape_parent()).unwrap();
    let child = table.define_class("Child", Some(base), UNIT).unwrap();
    table
        .add_method(
            child,
            MethodSig {
                mode: Mode::Override,
                ..child_sig
            },
        )
        .unwrap();
    freeze(&mut table);
    Validator::validate_subclass(&table, child)
}

#[test]
fn override_matching_the_shape_is_accepted() {
    let diagnostics = validate_override_shape(MethodSig {
        pos_required: vec![param("req")],
        pos_optional: vec![param("opt")],
        kw_required: vec![param("kwreq")],
        kw_optional: vec![param("kwopt")],
        block: Some(param("blk")),
        ..sig("foo")
    });
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn override_with_extra_optionals_is_accepted() {
    let diagnostics = validate_override_shape(MethodSig {
        pos_required: vec![param("req")],
        pos_optional: vec![param("opt"), param("opt2")],
        kw_required: vec![param("kwreq")],
        kw_optional: vec![param("kwopt"), param("kwopt2")],
        block: Some(param("blk")),
        ..sig("foo")
    });
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn override_may_make_required_parameters_optional() {
    let diagnostics = validate_override_shape(MethodSig {
        pos_optional: vec![param("req"), param("opt")],
        kw_optional: vec![param("kwreq"), param("kwopt")],
        block: Some(param("blk")),
        ..sig("foo")
    });
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn override_dropping_a_positional_is_rejected() {
    let diagnostics = validate_override_shape(MethodSig {
        pos_required: vec![param("req")],
        kw_required: vec![param("kwreq")],
        kw_optional: vec![param("kwopt")],
        block: Some(param("blk")),
        ..sig("foo")
    });
    expect![[r#"
        [Error]: [OVR201] override of overridable method `Base#foo` must accept at least 2 positional argument(s)
          note: base method defined here
    "#]]
    .assert_eq(&render_diagnostics(&diagnostics));
}

#[test]
fn override_missing_a_block_parameter_is_rejected() {
    let diagnostics = validate_override_shape(MethodSig {
        pos_required: vec![param("req")],
        pos_optional: vec![param("opt")],
        kw_required: vec![param("kwreq")],
        kw_optional: vec![param("kwopt")],
        ..sig("foo")
    });
    assert_eq!(codes_of(&diagnostics), vec!["OVR209"]);
}

#[test]
fn override_with_extra_required_positionals_is_rejected() {
    let diagnostics = validate_override_shape(MethodSig {
        pos_required: vec![param("req"), param("opt")],
        kw_required: vec![param("kwreq")],
        kw_optional: vec![param("kwopt")],
        block: Some(param("blk")),
        ..sig("foo")
    });
    assert_eq!(codes_of(&diagnostics), vec!["OVR202"]);
}

#[test]
fn override_missing_a_required_keyword_is_rejected() {
    let diagnostics = validate_override_shape(MethodSig {
        pos_required: vec![param("req")],
        pos_optional: vec![param("opt")],
        kw_optional: vec![param("kwopt")],
        block: Some(param("blk")),
        ..sig("foo")
    });
    assert_eq!(codes_of(&diagnostics), vec!["OVR205"]);
}

#[test]
fn override_missing_an_optional_keyword_is_rejected() {
    let diagnostics = validate_override_shape(MethodSig {
        pos_required: vec![param("req")],
        pos_optional: vec![param("opt")],
        kw_required: vec![param("kwreq")],
        block: Some(param("blk")),
        ..sig("foo")
    });
    assert_eq!(codes_of(&diagnostics), vec!["OVR208"]);
}

#[test]
fn override_tightening_an_optional_keyword_is_rejected() {
    let diagnostics = validate_override_shape(MethodSig {
        pos_required: vec![param("req")],
        pos_optional: vec![param("opt")],
        kw_required: vec![param("kwreq"), param("kwopt")],
        block: Some(param("blk")),
        ..sig("foo")
    });
    // The redeclare-as-optional diagnostic subsumes the extra-required
    // one for the same keyword.
    assert_eq!(codes_of(&diagnostics), vec!["OVR207"]);
}

#[test]
fn override_adding_a_new_required_keyword_is_rejected() {
    let diagnostics = validate_override_shape(MethodSig {
        pos_required: vec![param("req")],
        pos_optional: vec![param("opt")],
        kw_required: vec![param("kwreq"), param("brand_new")],
        kw_optional: vec![param("kwopt")],
        block: Some(param("blk")),
        ..sig("foo")
    });
    assert_eq!(codes_of(&diagnostics), vec!["OVR206"]);
}

#[test]
fn override_with_keyword_rest_skips_keyword_checks() {
    let diagnostics = validate_override_shape(MethodSig {
        pos_required: vec![param("req")],
        pos_optional: vec![param("opt")],
        kw_rest: Some(param("opts")),
        block: Some(param("blk")),
        ..sig("foo")
    });
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn override_must_carry_forward_rest_parameters() {
    let mut table = SymbolTable::new();
    let base = table.define_class("Base", None, UNIT).unwrap();
    table
        .add_method(
            base,
            MethodSig {
                mode: Mode::Overridable,
                pos_rest: Some(param("args")),
                kw_rest: Some(param("opts")),
                ..sig("each")
            },
        )
        .unwrap();
    let child = table.define_class("Child", Some(base), UNIT).unwrap();
    table
        .add_method(
            child,
            MethodSig {
                mode: Mode::Override,
                ..sig("each")
            },
        )
        .unwrap();
    freeze(&mut table);
    let diagnostics = Validator::validate_subclass(&table, child);
    assert_eq!(codes_of(&diagnostics), vec!["OVR203", "OVR204"]);
}

#[test]
fn override_without_a_parent_method_is_rejected() {
    let mut table = SymbolTable::new();
    let class = table.define_class("Orphan", None, UNIT).unwrap();
    table
        .add_method(
            class,
            MethodSig {
                mode: Mode::Override,
                ..sig("lonely")
            },
        )
        .unwrap();
    freeze(&mut table);
    let diagnostics = Validator::validate_subclass(&table, class);
    expect![[r#"
        [Error]: [OVR200] method `Orphan#lonely` is marked `override` but does not override anything
          note: if this method is meant to be overridden itself, declare it `overridable` or `abstract` instead
    "#]]
    .assert_eq(&render_diagnostics(&diagnostics));
}

#[test]
fn overriding_an_unannotated_method_is_accepted() {
    let mut table = SymbolTable::new();
    let base = table.define_module("Plain", UNIT).unwrap();
    table
        .add_method(
            base,
            MethodSig {
                has_sig: false,
                ..sig("foo")
            },
        )
        .unwrap();
    let class = table.define_class("User", None, UNIT).unwrap();
    table.add_mixin(class, base).unwrap();
    table
        .add_method(
            class,
            MethodSig {
                mode: Mode::Override,
                ..sig("foo")
            },
        )
        .unwrap();
    freeze(&mut table);
    let diagnostics = Validator::validate_subclass(&table, class);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn silently_overriding_an_overridable_method_is_flagged() {
    let mut table = SymbolTable::new();
    let base = table.define_class("Base", None, UNIT).unwrap();
    table
        .add_method(
            base,
            MethodSig {
                mode: Mode::Overridable,
                ..sig("foo")
            },
        )
        .unwrap();
    let child = table.define_class("Child", Some(base), UNIT).unwrap();
    table.add_method(child, sig("foo")).unwrap();
    freeze(&mut table);
    let diagnostics = Validator::validate_subclass(&table, child);
    assert_eq!(codes_of(&diagnostics), vec!["OVR213"]);
}

#[test]
fn silently_implementing_an_abstract_method_is_flagged() {
    let mut table = SymbolTable::new();
    let base = table.define_module("Iface", UNIT).unwrap();
    table.mark_abstract(base).unwrap();
    table
        .add_method(
            base,
            MethodSig {
                mode: Mode::Abstract,
                has_body: false,
                ..sig("foo")
            },
        )
        .unwrap();
    let child = table.define_class("Impl", None, UNIT).unwrap();
    table.add_mixin(child, base).unwrap();
    table.add_method(child, sig("foo")).unwrap();
    freeze(&mut table);
    let diagnostics = Validator::validate_subclass(&table, child);
    assert_eq!(codes_of(&diagnostics), vec!["OVR213"]);
}

#[test]
fn legacy_implementation_mode_counts_as_override() {
    let mut table = SymbolTable::new();
    let base = table.define_module("Iface", UNIT).unwrap();
    table.mark_abstract(base).unwrap();
    table
        .add_method(
            base,
            MethodSig {
                mode: Mode::Abstract,
                has_body: false,
                ..sig("foo")
            },
        )
        .unwrap();
    let child = table.define_class("Impl", None, UNIT).unwrap();
    table.add_mixin(child, base).unwrap();
    table
        .add_method(
            child,
            MethodSig {
                mode: Mode::Implementation,
                ..sig("foo")
            },
        )
        .unwrap();
    freeze(&mut table);
    let diagnostics = Validator::validate_subclass(&table, child);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn override_parameters_compare_contravariantly() {
    let mut table = SymbolTable::new();
    let base = table.define_class("Base", None, UNIT).unwrap();
    table
        .add_method(
            base,
            MethodSig {
                mode: Mode::Overridable,
                pos_required: vec![Param::new("value", integer())],
                ..sig("push")
            },
        )
        .unwrap();
    let widening = table.define_class("Widening", Some(base), UNIT).unwrap();
    table
        .add_method(
            widening,
            MethodSig {
                mode: Mode::Override,
                pos_required: vec![Param::new("value", numeric())],
                ..sig("push")
            },
        )
        .unwrap();
    let narrowing = table.define_class("Narrowing", Some(base), UNIT).unwrap();
    table
        .add_method(
            narrowing,
            MethodSig {
                mode: Mode::Override,
                pos_required: vec![Param::new("value", string())],
                ..sig("push")
            },
        )
        .unwrap();
    freeze(&mut table);

    assert!(Validator::validate_subclass(&table, widening).is_empty());
    let diagnostics = Validator::validate_subclass(&table, narrowing);
    assert_eq!(codes_of(&diagnostics), vec!["OVR210"]);
}

#[test]
fn override_return_types_compare_covariantly() {
    let mut table = SymbolTable::new();
    let base = table.define_class("Base", None, UNIT).unwrap();
    table
        .add_method(
            base,
            MethodSig {
                mode: Mode::Overridable,
                ..MethodSig::simple("value", numeric())
            },
        )
        .unwrap();
    let narrowing = table.define_class("Narrowing", Some(base), UNIT).unwrap();
    table
        .add_method(
            narrowing,
            MethodSig {
                mode: Mode::Override,
                ..MethodSig::simple("value", integer())
            },
        )
        .unwrap();
    let widening = table.define_class("Widening", Some(base), UNIT).unwrap();
    table
        .add_method(
            widening,
            MethodSig {
                mode: Mode::Override,
                ..MethodSig::simple("value", string())
            },
        )
        .unwrap();
    freeze(&mut table);

    assert!(Validator::validate_subclass(&table, narrowing).is_empty());
    let diagnostics = Validator::validate_subclass(&table, widening);
    assert_eq!(codes_of(&diagnostics), vec!["OVR211"]);
}

#[test]
fn generic_placeholder_positions_are_exempt_from_type_checks() {
    let mut table = SymbolTable::new();
    let base = table.define_class("Container", None, UNIT).unwrap();
    table
        .add_type_member(base, TypeMemberDef::new("Elem", Variance::Invariant))
        .unwrap();
    table
        .add_method(
            base,
            MethodSig {
                mode: Mode::Overridable,
                pos_required: vec![Param::new("value", Type::type_member(base, "Elem"))],
                ..sig("push")
            },
        )
        .unwrap();
    let child = table.define_class("IntContainer", Some(base), UNIT).unwrap();
    table
        .add_type_member(child, TypeMemberDef::new("Elem", Variance::Invariant))
        .unwrap();
    table
        .add_method(
            child,
            MethodSig {
                mode: Mode::Override,
                pos_required: vec![Param::new("value", integer())],
                ..sig("push")
            },
        )
        .unwrap();
    freeze(&mut table);
    let diagnostics = Validator::validate_subclass(&table, child);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn override_type_parameter_counts_must_match() {
    let mut table = SymbolTable::new();
    let base = table.define_class("Base", None, UNIT).unwrap();
    table
        .add_method(
            base,
            MethodSig {
                mode: Mode::Overridable,
                type_parameters: vec!["U".to_string()],
                ..sig("map")
            },
        )
        .unwrap();
    let child = table.define_class("Child", Some(base), UNIT).unwrap();
    table
        .add_method(
            child,
            MethodSig {
                mode: Mode::Override,
                ..sig("map")
            },
        )
        .unwrap();
    freeze(&mut table);
    let diagnostics = Validator::validate_subclass(&table, child);
    assert_eq!(codes_of(&diagnostics), vec!["OVR214"]);
}

#[test]
fn visibility_narrowing_is_rejected_unless_opted_out() {
    let mut table = SymbolTable::new();
    let base = table.define_class("Base", None, UNIT).unwrap();
    table
        .add_method(
            base,
            MethodSig {
                mode: Mode::Overridable,
                pos_required: vec![Param::new("value", integer())],
                ..sig("handle")
            },
        )
        .unwrap();
    let narrowed = table.define_class("Narrowed", Some(base), UNIT).unwrap();
    table
        .add_method(
            narrowed,
            MethodSig {
                mode: Mode::Override,
                visibility: Visibility::Private,
                pos_required: vec![Param::new("value", integer())],
                ..sig("handle")
            },
        )
        .unwrap();
    // The opt-out suppresses only the visibility check; the incompatible
    // parameter type must still be reported.
    let opted_out = table.define_class("OptedOut", Some(base), UNIT).unwrap();
    table
        .add_method(
            opted_out,
            MethodSig {
                mode: Mode::Override,
                visibility: Visibility::Private,
                allow_incompatible: true,
                pos_required: vec![Param::new("value", string())],
                ..sig("handle")
            },
        )
        .unwrap();
    freeze(&mut table);

    assert_eq!(
        codes_of(&Validator::validate_subclass(&table, narrowed)),
        vec!["OVR212"]
    );
    assert_eq!(
        codes_of(&Validator::validate_subclass(&table, opted_out)),
        vec!["OVR210"]
    );
}

#[test]
fn missing_abstract_implementations_are_reported_per_method() {
    let mut table = SymbolTable::new();
    let mixin = table.define_module("Runnable", UNIT).unwrap();
    table.mark_abstract(mixin).unwrap();
    for name in ["foo", "bar"] {
        table
            .add_method(
                mixin,
                MethodSig {
                    mode: Mode::Abstract,
                    has_body: false,
                    ..sig(name)
                },
            )
            .unwrap();
    }
    let class = table.define_class("Impl", None, UNIT).unwrap();
    table.add_mixin(class, mixin).unwrap();
    table
        .add_method(
            class,
            MethodSig {
                mode: Mode::Override,
                ..sig("foo")
            },
        )
        .unwrap();
    freeze(&mut table);
    let diagnostics = Validator::validate_subclass(&table, class);
    expect![[r#"
        [Error]: [ABS106] missing definition for abstract method `Runnable#bar` in `Impl`
          note: declared abstract in `Runnable` here
    "#]]
    .assert_eq(&render_diagnostics(&diagnostics));
}

#[test]
fn abstract_types_may_leave_abstract_methods_unimplemented() {
    let mut table = SymbolTable::new();
    let mixin = table.define_module("Runnable", UNIT).unwrap();
    table.mark_abstract(mixin).unwrap();
    table
        .add_method(
            mixin,
            MethodSig {
                mode: Mode::Abstract,
                has_body: false,
                ..sig("run")
            },
        )
        .unwrap();
    let class = table.define_class("StillAbstract", None, UNIT).unwrap();
    table.mark_abstract(class).unwrap();
    table.add_mixin(class, mixin).unwrap();
    freeze(&mut table);
    assert!(Validator::validate_subclass(&table, class).is_empty());
}

#[test]
fn missing_singleton_abstracts_are_grouped_after_instance_ones() {
    let mut table = SymbolTable::new();
    let base = table.define_class("AbstractBase", None, UNIT).unwrap();
    table.mark_abstract(base).unwrap();
    table
        .add_method(
            base,
            MethodSig {
                mode: Mode::Abstract,
                has_body: false,
                ..sig("instance_hook")
            },
        )
        .unwrap();
    table
        .add_singleton_method(
            base,
            MethodSig {
                mode: Mode::Abstract,
                has_body: false,
                ..sig("class_hook")
            },
        )
        .unwrap();
    let child = table.define_class("Concrete", Some(base), UNIT).unwrap();
    freeze(&mut table);
    let diagnostics = Validator::validate_subclass(&table, child);
    expect![[r#"
        [Error]: [ABS106] missing definition for abstract method `AbstractBase#instance_hook` in `Concrete`
          note: declared abstract in `AbstractBase` here
        [Error]: [ABS106] missing definition for abstract class method `AbstractBase.class_hook` in `Concrete`
          note: declared abstract in `AbstractBase` here
    "#]]
    .assert_eq(&render_diagnostics(&diagnostics));
}

#[test]
fn abstract_methods_require_an_abstract_owner() {
    let mut table = SymbolTable::new();
    let class = table.define_class("Concrete", None, UNIT).unwrap();
    table
        .add_method(
            class,
            MethodSig {
                mode: Mode::Abstract,
                has_body: false,
                ..sig("foo")
            },
        )
        .unwrap();
    freeze(&mut table);
    let diagnostics = Validator::validate_abstract_module(&table, class);
    assert_eq!(codes_of(&diagnostics), vec!["ABS100"]);
}

#[test]
fn abstract_methods_must_not_have_bodies() {
    let mut table = SymbolTable::new();
    let class = table.define_class("Base", None, UNIT).unwrap();
    table.mark_abstract(class).unwrap();
    table
        .add_method(
            class,
            MethodSig {
                mode: Mode::Abstract,
                has_body: true,
                ..sig("foo")
            },
        )
        .unwrap();
    freeze(&mut table);
    let diagnostics = Validator::validate_abstract_module(&table, class);
    assert_eq!(codes_of(&diagnostics), vec!["ABS102"]);
}

#[test]
fn module_static_methods_cannot_be_abstract() {
    let mut table = SymbolTable::new();
    let module = table.define_module("Helpers", UNIT).unwrap();
    table.mark_abstract(module).unwrap();
    table
        .add_singleton_method(
            module,
            MethodSig {
                mode: Mode::Abstract,
                has_body: false,
                ..sig("configure")
            },
        )
        .unwrap();
    freeze(&mut table);
    let diagnostics = Validator::validate_abstract_module(&table, module);
    assert_eq!(codes_of(&diagnostics), vec!["ABS101"]);
}

#[test]
fn interface_methods_must_be_abstract_public_and_signed() {
    let mut table = SymbolTable::new();
    let iface = table.define_module("Queue", UNIT).unwrap();
    table.mark_interface(iface).unwrap();
    table
        .add_method(
            iface,
            MethodSig {
                mode: Mode::Abstract,
                has_body: false,
                visibility: Visibility::Private,
                ..sig("pop")
            },
        )
        .unwrap();
    table.add_method(iface, sig("push")).unwrap();
    table
        .add_method(
            iface,
            MethodSig {
                mode: Mode::Abstract,
                has_body: false,
                has_sig: false,
                ..sig("peek")
            },
        )
        .unwrap();
    freeze(&mut table);
    let diagnostics = Validator::validate_abstract_module(&table, iface);
    assert_eq!(
        codes_of(&diagnostics),
        vec!["ABS104", "ABS103", "ABS105"]
    );
}

#[test]
fn interfaces_reject_concrete_mixins() {
    let mut table = SymbolTable::new();
    let helpers = table.define_module("Helpers", UNIT).unwrap();
    table.add_method(helpers, sig("help")).unwrap();
    let iface = table.define_module("Queue", UNIT).unwrap();
    table.mark_interface(iface).unwrap();
    table.add_mixin(iface, helpers).unwrap();
    freeze(&mut table);
    let diagnostics = Validator::validate_abstract_module(&table, iface);
    assert_eq!(codes_of(&diagnostics), vec!["ABS108"]);
}

#[test]
fn fully_abstract_mixins_are_welcome_in_interfaces() {
    let mut table = SymbolTable::new();
    let helpers = table.define_module("AbstractHelpers", UNIT).unwrap();
    table.mark_abstract(helpers).unwrap();
    table
        .add_method(
            helpers,
            MethodSig {
                mode: Mode::Abstract,
                has_body: false,
                ..sig("help")
            },
        )
        .unwrap();
    let iface = table.define_module("Queue", UNIT).unwrap();
    table.mark_interface(iface).unwrap();
    table.add_mixin(iface, helpers).unwrap();
    freeze(&mut table);
    assert!(Validator::validate_abstract_module(&table, iface).is_empty());
}

#[test]
fn abstract_types_cannot_be_instantiated_without_a_factory() {
    let mut table = SymbolTable::new();
    let class = table.define_class("AbstractBase", None, UNIT).unwrap();
    table.mark_abstract(class).unwrap();
    let with_factory = table.define_class("WithFactory", None, UNIT).unwrap();
    table.mark_abstract(with_factory).unwrap();
    table
        .add_singleton_method(with_factory, sig("new"))
        .unwrap();
    freeze(&mut table);

    let mut validator = Validator::new(&table);
    validator.validate_instantiation(class, None);
    assert_eq!(codes_of(&validator.diagnostics), vec!["ABS107"]);

    let mut validator = Validator::new(&table);
    validator.validate_instantiation(with_factory, None);
    assert!(validator.diagnostics.is_empty());
}

#[test]
fn final_methods_cannot_be_overridden_through_a_diamond() {
    let mut table = SymbolTable::new();
    let bottom = table.define_module("Bottom", UNIT).unwrap();
    table
        .add_method(
            bottom,
            MethodSig {
                is_final: true,
                ..sig("locked")
            },
        )
        .unwrap();
    let left = table.define_module("Left", UNIT).unwrap();
    table.add_mixin(left, bottom).unwrap();
    let right = table.define_module("Right", UNIT).unwrap();
    table.add_mixin(right, bottom).unwrap();
    let class = table.define_class("Diamond", None, UNIT).unwrap();
    table.add_mixin(class, left).unwrap();
    table.add_mixin(class, right).unwrap();
    table.add_method(class, sig("locked")).unwrap();
    freeze(&mut table);
    let diagnostics = Validator::validate_subclass(&table, class);
    assert_eq!(codes_of(&diagnostics), vec!["FIN300"]);
}

#[test]
fn final_methods_cannot_be_redefined_in_the_same_type() {
    let mut table = SymbolTable::new();
    let class = table.define_class("Settings", None, UNIT).unwrap();
    table
        .add_method(
            class,
            MethodSig {
                is_final: true,
                ..sig("load")
            },
        )
        .unwrap();
    table.add_method(class, sig("load")).unwrap();
    freeze(&mut table);
    let diagnostics = Validator::validate_subclass(&table, class);
    assert_eq!(codes_of(&diagnostics), vec!["FIN301"]);
}

#[test]
fn final_types_bar_inheritance_inclusion_and_extension() {
    let mut table = SymbolTable::new();
    let sealed_class = table.define_class("Locked", None, UNIT).unwrap();
    table.mark_final(sealed_class).unwrap();
    let final_module = table.define_module("LockedMixin", UNIT).unwrap();
    table.mark_final(final_module).unwrap();

    let heir = table.define_class("Heir", Some(sealed_class), UNIT).unwrap();
    table.add_mixin(heir, final_module).unwrap();
    table.add_singleton_mixin(heir, final_module).unwrap();
    freeze(&mut table);
    let diagnostics = Validator::validate_subclass(&table, heir);
    assert_eq!(codes_of(&diagnostics), vec!["FIN302", "FIN302", "FIN302"]);
}

#[test]
fn final_types_require_final_methods() {
    let mut table = SymbolTable::new();
    let class = table.define_class("Locked", None, UNIT).unwrap();
    table.mark_final(class).unwrap();
    table.add_method(class, sig("open")).unwrap();
    freeze(&mut table);
    let diagnostics = Validator::validate_subclass(&table, class);
    assert_eq!(codes_of(&diagnostics), vec!["FIN303"]);
}

#[test]
fn sealed_types_reject_out_of_unit_subclasses() {
    let elsewhere = FileId(7);
    let mut table = SymbolTable::new();
    let parent = table.define_class("Shape", None, UNIT).unwrap();
    table.mark_sealed(parent, UNIT).unwrap();
    let ok = table.define_class("Circle", Some(parent), UNIT).unwrap();
    let rogue = table.define_class("Rogue", Some(parent), elsewhere).unwrap();
    freeze(&mut table);

    assert!(Validator::validate_subclass(&table, ok).is_empty());
    let diagnostics = Validator::validate_subclass(&table, rogue);
    assert_eq!(codes_of(&diagnostics), vec!["SEA310"]);
}

#[test]
fn covariant_members_cannot_appear_in_parameter_positions() {
    let mut table = SymbolTable::new();
    let class = table.define_class("Producer", None, UNIT).unwrap();
    table
        .add_type_member(class, TypeMemberDef::new("Elem", Variance::Covariant))
        .unwrap();
    table
        .add_method(
            class,
            MethodSig {
                pos_required: vec![Param::new("value", Type::type_member(class, "Elem"))],
                ..sig("push")
            },
        )
        .unwrap();
    freeze(&mut table);
    let result = Validator::new(&table).check_all();
    assert!(
        codes_of(&result.diagnostics).contains(&"VAR500"),
        "{:?}",
        result.diagnostics
    );
}

#[test]
fn contravariant_members_cannot_appear_in_return_positions() {
    let mut table = SymbolTable::new();
    let class = table.define_class("Consumer", None, UNIT).unwrap();
    table
        .add_type_member(class, TypeMemberDef::new("Input", Variance::Contravariant))
        .unwrap();
    table
        .add_method(
            class,
            MethodSig::simple("last_input", Type::type_member(class, "Input")),
        )
        .unwrap();
    freeze(&mut table);
    let result = Validator::new(&table).check_all();
    assert!(
        codes_of(&result.diagnostics).contains(&"VAR500"),
        "{:?}",
        result.diagnostics
    );
}

#[test]
fn contravariant_applications_flip_polarity() {
    // A covariant member inside the parameter of a proc parameter sits in
    // a doubly-negated, hence positive, position.
    let mut table = SymbolTable::new();
    let class = table.define_class("Mapper", None, UNIT).unwrap();
    table
        .add_type_member(class, TypeMemberDef::new("Elem", Variance::Covariant))
        .unwrap();
    table
        .add_method(
            class,
            MethodSig {
                pos_required: vec![Param::new(
                    "callback",
                    Type::proc_type(vec![Type::type_member(class, "Elem")], object()),
                )],
                ..sig("each")
            },
        )
        .unwrap();
    freeze(&mut table);
    let result = Validator::new(&table).check_all();
    assert!(
        !codes_of(&result.diagnostics).contains(&"VAR500"),
        "{:?}",
        result.diagnostics
    );
}

#[test]
fn subtypes_must_redeclare_inherited_type_members() {
    let mut table = SymbolTable::new();
    let base = table.define_class("Container", None, UNIT).unwrap();
    table
        .add_type_member(base, TypeMemberDef::new("Elem", Variance::Invariant))
        .unwrap();
    let missing = table.define_class("Missing", Some(base), UNIT).unwrap();
    let kind_change = table.define_class("KindChange", Some(base), UNIT).unwrap();
    table
        .add_type_member(
            kind_change,
            TypeMemberDef::template("Elem", Variance::Invariant),
        )
        .unwrap();
    let variance_change = table
        .define_class("VarianceChange", Some(base), UNIT)
        .unwrap();
    table
        .add_type_member(
            variance_change,
            TypeMemberDef::new("Elem", Variance::Covariant),
        )
        .unwrap();
    freeze(&mut table);

    assert_eq!(
        codes_of(&Validator::validate_subclass(&table, missing)),
        vec!["GEN400"]
    );
    assert_eq!(
        codes_of(&Validator::validate_subclass(&table, kind_change)),
        vec!["GEN401"]
    );
    assert_eq!(
        codes_of(&Validator::validate_subclass(&table, variance_change)),
        vec!["GEN402"]
    );
}

#[test]
fn checked_levels_gate_call_time_checking_only() {
    let always = sig("a");
    let tests_only = MethodSig {
        checked: Checked::Tests,
        ..sig("b")
    };
    let never = MethodSig {
        checked: Checked::Never,
        ..sig("c")
    };
    assert!(always.should_check(false));
    assert!(tests_only.should_check(true));
    assert!(!tests_only.should_check(false));
    assert!(!never.should_check(true));
}

#[test]
fn whole_table_pass_collects_everything_in_one_run() {
    let mut table = SymbolTable::new();
    let mixin = table.define_module("Jobs", UNIT).unwrap();
    table.mark_abstract(mixin).unwrap();
    for name in ["perform", "retry_limit"] {
        table
            .add_method(
                mixin,
                MethodSig {
                    mode: Mode::Abstract,
                    has_body: false,
                    ..sig(name)
                },
            )
            .unwrap();
    }
    let incomplete = table.define_class("NullJob", None, UNIT).unwrap();
    table.add_mixin(incomplete, mixin).unwrap();
    freeze(&mut table);

    let result = Validator::new(&table).check_all();
    // Both missing methods surface in a single pass, not just the first.
    let codes = codes_of(&result.diagnostics);
    assert_eq!(codes, vec!["ABS106", "ABS106"]);
    assert_eq!(result.metrics.violations, 2);
    assert!(result.metrics.classes_checked >= 2);
    assert!(result.has_errors());
}

fn class_with_sealed_parent() -> (SymbolTable, ClassId) {
    let mut table = SymbolTable::new();
    let parent = table.define_class("Event", None, UNIT).unwrap();
    table.mark_sealed(parent, UNIT).unwrap();
    let child = table.define_class("Click", Some(parent), UNIT).unwrap();
    freeze(&mut table);
    (table, child)
}

#[test]
fn query_facade_memoizes_results() {
    let (table, child) = class_with_sealed_parent();
    let queries = crate::queries::CheckQueries::new(&table);
    let first = queries.validate_subclass(child);
    let second = queries.validate_subclass(child);
    assert_eq!(first.len(), second.len());
    let full_a = queries.check_all();
    let full_b = queries.check_all();
    assert_eq!(full_a.diagnostics.len(), full_b.diagnostics.len());
}
