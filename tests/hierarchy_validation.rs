//! End-to-end hierarchy scenarios: abstract completeness, sealed
//! exhaustiveness, and finality across mixin chains.

mod common;

use common::{UNIT, object};
use lattice::diagnostics::FileId;
use lattice::symbols::{MethodSig, Mode};
use lattice::{CheckQueries, SymbolTable, Validator};

fn abstract_sig(name: &str) -> MethodSig {
    MethodSig {
        mode: Mode::Abstract,
        has_body: false,
        ..MethodSig::simple(name, object())
    }
}

#[test]
fn concrete_includer_must_implement_every_abstract_method() {
    let mut table = SymbolTable::new();
    let mixin = table.define_module("Worker", UNIT).unwrap();
    table.mark_abstract(mixin).unwrap();
    table.add_method(mixin, abstract_sig("foo")).unwrap();
    table.add_method(mixin, abstract_sig("bar")).unwrap();

    let includer = table.define_class("Printer", None, UNIT).unwrap();
    table.add_mixin(includer, mixin).unwrap();
    table
        .add_method(
            includer,
            MethodSig {
                mode: Mode::Override,
                ..MethodSig::simple("foo", object())
            },
        )
        .unwrap();
    assert!(table.freeze().is_empty());

    let diagnostics = Validator::validate_subclass(&table, includer);
    assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
    let message = &diagnostics[0].message;
    assert!(message.contains("bar"), "should name the missing method");
    assert!(message.contains("Worker"), "should name the declaring module");
    assert!(!message.contains("foo"), "implemented methods are not reported");
}

#[test]
fn sealed_case_analysis_can_prove_exhaustiveness() {
    let mut table = SymbolTable::new();
    let parent = table.define_class("Event", None, UNIT).unwrap();
    table.mark_abstract(parent).unwrap();
    table.mark_sealed(parent, UNIT).unwrap();
    let click = table.define_class("Click", Some(parent), UNIT).unwrap();
    let scroll = table.define_class("Scroll", Some(parent), UNIT).unwrap();
    assert!(table.freeze().is_empty());

    // A case construct handling only Click is non-exhaustive and the
    // report names the uncovered subclass.
    let unhandled = table.unhandled_sealed_cases(parent, &[click]);
    assert_eq!(unhandled, vec![scroll]);
    assert_eq!(table.name(unhandled[0]), "Scroll");

    // Covering every declared subclass proves the fallthrough impossible.
    assert!(table.unhandled_sealed_cases(parent, &[click, scroll]).is_empty());
}

#[test]
fn sealed_hierarchies_reject_subclasses_from_other_units() {
    let other_unit = FileId(3);
    let mut table = SymbolTable::new();
    let parent = table.define_module("Serializer", UNIT).unwrap();
    table.mark_sealed(parent, UNIT).unwrap();
    let inside = table.define_class("JsonSerializer", None, UNIT).unwrap();
    table.add_mixin(inside, parent).unwrap();
    let outside = table.define_class("YamlSerializer", None, other_unit).unwrap();
    table.add_mixin(outside, parent).unwrap();
    assert!(table.freeze().is_empty());

    assert!(Validator::validate_subclass(&table, inside).is_empty());
    let diagnostics = Validator::validate_subclass(&table, outside);
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("sealed"));
    // The permitted-includer registry never contains the outsider.
    assert_eq!(table.sealed_subclasses(parent), &[inside]);
}

#[test]
fn final_methods_survive_arbitrarily_long_mixin_chains() {
    let mut table = SymbolTable::new();
    let root = table.define_module("Layer0", UNIT).unwrap();
    table
        .add_method(
            root,
            MethodSig {
                is_final: true,
                ..MethodSig::simple("checksum", object())
            },
        )
        .unwrap();
    let mut previous = root;
    for depth in 1..6 {
        let layer = table.define_module(format!("Layer{depth}"), UNIT).unwrap();
        table.add_mixin(layer, previous).unwrap();
        previous = layer;
    }
    let class = table.define_class("Leaf", None, UNIT).unwrap();
    table.add_mixin(class, previous).unwrap();
    table
        .add_method(class, MethodSig::simple("checksum", object()))
        .unwrap();
    assert!(table.freeze().is_empty());

    let diagnostics = Validator::validate_subclass(&table, class);
    assert_eq!(diagnostics.len(), 1, "{diagnostics:?}");
    assert!(diagnostics[0].message.contains("final"));
}

#[test]
fn one_pass_reports_all_violations_together() {
    let other_unit = FileId(9);
    let mut table = SymbolTable::new();
    let sealed = table.define_class("Base", None, UNIT).unwrap();
    table.mark_sealed(sealed, UNIT).unwrap();
    let abstract_mixin = table.define_module("Hooks", UNIT).unwrap();
    table.mark_abstract(abstract_mixin).unwrap();
    table.add_method(abstract_mixin, abstract_sig("on_start")).unwrap();
    table.add_method(abstract_mixin, abstract_sig("on_stop")).unwrap();

    let rogue = table.define_class("Rogue", Some(sealed), other_unit).unwrap();
    table.add_mixin(rogue, abstract_mixin).unwrap();
    assert!(table.freeze().is_empty());

    let queries = CheckQueries::new(&table);
    let result = queries.check_all();
    // Two missing implementations and one sealed violation, collected in
    // a single pass rather than stopping at the first failure.
    assert_eq!(result.diagnostics.len(), 3, "{:?}", result.diagnostics);
    assert_eq!(result.metrics.violations, 3);
}
