//! End-to-end subtyping properties over a shared fixture table.

mod common;

use once_cell::sync::Lazy;

use common::{array_of, float, integer, numeric, string};
use lattice::symbols::well_known;
use lattice::types::{equiv, lub, show, union_of};
use lattice::{SymbolTable, Type, is_subtype};

static TABLE: Lazy<SymbolTable> = Lazy::new(common::frozen_core);

fn sample_types(table: &SymbolTable) -> Vec<Type> {
    vec![
        integer(),
        numeric(),
        string(),
        Type::simple(well_known::NIL_CLASS),
        union_of(table, [integer(), string()]),
        union_of(table, [integer(), Type::simple(well_known::NIL_CLASS)]),
        array_of(integer()),
        array_of(Type::untyped()),
        Type::tuple(vec![]),
        Type::tuple(vec![integer(), string()]),
        Type::proc_type(vec![integer()], string()),
        Type::class_of(integer()),
        Type::untyped(),
        Type::noreturn(),
        Type::anything(),
    ]
}

#[test]
fn every_type_is_a_subtype_of_itself() {
    let table = &*TABLE;
    for ty in sample_types(table) {
        assert!(
            is_subtype(table, &ty, &ty),
            "{} should be reflexive",
            show(table, &ty)
        );
    }
}

#[test]
fn every_type_reaches_the_top_and_absorbs_untyped() {
    let table = &*TABLE;
    for ty in sample_types(table) {
        assert!(is_subtype(table, &ty, &Type::anything()));
        assert!(is_subtype(table, &ty, &Type::untyped()));
        assert!(is_subtype(table, &Type::untyped(), &ty));
        assert!(is_subtype(table, &Type::noreturn(), &ty));
    }
}

#[test]
fn noreturn_admits_only_untyped_from_below() {
    let table = &*TABLE;
    assert!(is_subtype(table, &Type::noreturn(), &Type::untyped()));
    assert!(is_subtype(table, &Type::untyped(), &Type::noreturn()));
    assert!(!is_subtype(table, &integer(), &Type::noreturn()));
    assert!(!is_subtype(table, &Type::anything(), &Type::noreturn()));
}

#[test]
fn union_members_absorb_duplicates() {
    let table = &*TABLE;
    let doubled = union_of(table, [integer(), integer()]);
    assert!(is_subtype(table, &doubled, &integer()));
    assert!(is_subtype(table, &integer(), &doubled));
}

#[test]
fn arrays_are_covariant_in_their_element() {
    let table = &*TABLE;
    assert!(is_subtype(table, &array_of(integer()), &array_of(numeric())));
    assert!(!is_subtype(table, &array_of(numeric()), &array_of(integer())));
}

#[test]
fn tuples_upcast_to_arrays_of_their_join() {
    let table = &*TABLE;
    assert!(is_subtype(table, &Type::tuple(vec![]), &array_of(integer())));
    assert!(is_subtype(
        table,
        &Type::tuple(vec![integer(), string()]),
        &array_of(union_of(table, [integer(), string()]))
    ));
    assert!(!is_subtype(
        table,
        &Type::tuple(vec![integer()]),
        &array_of(string())
    ));
}

#[test]
fn nilable_unions_accept_both_sides() {
    let table = &*TABLE;
    let nilable_int = union_of(table, [integer(), Type::simple(well_known::NIL_CLASS)]);
    assert!(is_subtype(table, &integer(), &nilable_int));
    assert!(is_subtype(
        table,
        &Type::simple(well_known::NIL_CLASS),
        &nilable_int
    ));
    assert!(!is_subtype(table, &string(), &nilable_int));
    assert_eq!(show(table, &nilable_int), "T.nilable(Integer)");
}

#[test]
fn joins_are_upper_bounds() {
    let table = &*TABLE;
    let samples = sample_types(table);
    for a in &samples {
        for b in &samples {
            let join = lub(table, a, b);
            assert!(
                is_subtype(table, a, &join),
                "{} should reach its join with {}",
                show(table, a),
                show(table, b)
            );
            assert!(
                is_subtype(table, b, &join),
                "{} should reach its join with {}",
                show(table, b),
                show(table, a)
            );
        }
    }
}

#[test]
fn equivalence_is_symmetric_on_reordered_unions() {
    let table = &*TABLE;
    let forward = union_of(table, [integer(), float(), string()]);
    let backward = union_of(table, [string(), float(), integer()]);
    assert!(equiv(table, &forward, &backward));
    assert_eq!(forward, backward);
    assert_eq!(show(table, &forward), show(table, &backward));
}

#[test]
fn same_inputs_always_produce_the_same_verdict() {
    let table = &*TABLE;
    let samples = sample_types(table);
    for a in &samples {
        for b in &samples {
            let first = is_subtype(table, a, b);
            for _ in 0..3 {
                assert_eq!(first, is_subtype(table, a, b));
            }
        }
    }
}
