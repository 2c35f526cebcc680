//! The subtype engine.
//!
//! `is_subtype` is total over constructed types: an absent relationship is
//! `false`, never an error. The decomposition order of union and
//! intersection cases matters and must not be reordered: union sources
//! and intersection targets are universally quantified and checked first;
//! the cross case (intersection source vs union target) has to try all
//! four decompositions before giving up.

use crate::symbols::{ClassId, SymbolTable, Variance, well_known};

use super::{ShapeKey, Type, TypeData, intersection_of, union_of};

/// Is every value of `t1` usable where `t2` is expected?
#[must_use]
pub fn is_subtype(table: &SymbolTable, t1: &Type, t2: &Type) -> bool {
    let t1 = t1.dealias();
    let t2 = t2.dealias();
    if t1 == t2 {
        return true;
    }
    // Untyped (and the unresolved sentinel) absorbs both directions.
    if t1.is_untyped() || t2.is_untyped() {
        return true;
    }

    if let TypeData::Union(members) = t1.data() {
        return members.iter().all(|member| is_subtype(table, member, t2));
    }
    if let TypeData::Intersection(members) = t2.data() {
        return members.iter().all(|member| is_subtype(table, t1, member));
    }
    if let TypeData::Union(members2) = t2.data() {
        if let TypeData::Intersection(members1) = t1.data() {
            // Dropping either side eagerly makes the test too strict; all
            // four decompositions have to be tried.
            return members2.iter().any(|member| is_subtype(table, t1, member))
                || members1.iter().any(|member| is_subtype(table, member, t2));
        }
        return members2.iter().any(|member| is_subtype(table, t1, member));
    }
    if let TypeData::Intersection(members1) = t1.data() {
        return members1.iter().any(|member| is_subtype(table, member, t2));
    }

    is_subtype_single(table, t1, t2)
}

/// Mutual subtyping.
#[must_use]
pub fn equiv(table: &SymbolTable, t1: &Type, t2: &Type) -> bool {
    is_subtype(table, t1, t2) && is_subtype(table, t2, t1)
}

/// Least upper bound: the narrowest type that is a supertype of both.
/// Absorbing when one side already subsumes the other; otherwise a
/// normalized union.
#[must_use]
pub fn lub(table: &SymbolTable, t1: &Type, t2: &Type) -> Type {
    if is_subtype(table, t1, t2) {
        t2.clone()
    } else if is_subtype(table, t2, t1) {
        t1.clone()
    } else {
        union_of(table, [t1.clone(), t2.clone()])
    }
}

/// Join of arbitrarily many types; the empty join is the bottom type.
#[must_use]
pub fn lub_all(table: &SymbolTable, types: impl IntoIterator<Item = Type>) -> Type {
    types
        .into_iter()
        .fold(Type::noreturn(), |acc, ty| lub(table, &acc, &ty))
}

/// Greatest lower bound: the widest type that is a subtype of both.
#[must_use]
pub fn glb(table: &SymbolTable, t1: &Type, t2: &Type) -> Type {
    if is_subtype(table, t1, t2) {
        t1.clone()
    } else if is_subtype(table, t2, t1) {
        t2.clone()
    } else {
        intersection_of(table, [t1.clone(), t2.clone()])
    }
}

/// Ground comparison once unions and intersections are decomposed away.
fn is_subtype_single(table: &SymbolTable, t1: &Type, t2: &Type) -> bool {
    if t1.is_noreturn() {
        return true;
    }
    if t2.is_noreturn() {
        // Only Untyped reaches below NoReturn, and that is handled above.
        return false;
    }
    if t2.is_anything() {
        return true;
    }
    if t1.is_anything() {
        return false;
    }

    // Unbound generic placeholders compare as subtype and supertype of
    // everything. This is the documented escape hatch that avoids full
    // parametric subtyping; it is intentionally unsound.
    if matches!(
        t1.data(),
        TypeData::TypeMember { .. } | TypeData::TypeParameter(_)
    ) || matches!(
        t2.data(),
        TypeData::TypeMember { .. } | TypeData::TypeParameter(_)
    ) {
        return true;
    }

    // Unsubstituted placeholders only ever equal themselves; equality was
    // checked by the caller.
    if matches!(t1.data(), TypeData::SelfType | TypeData::AttachedClass)
        || matches!(t2.data(), TypeData::SelfType | TypeData::AttachedClass)
    {
        return false;
    }

    match t1.data() {
        TypeData::Applied { base, args } => match t2.data() {
            TypeData::Applied {
                base: base2,
                args: args2,
            } => applied_subtype(table, *base, args, *base2, args2),
            TypeData::Simple(class2) => table.derives_from(*base, *class2),
            _ => false,
        },
        TypeData::Tuple(elements) => match t2.data() {
            TypeData::Tuple(elements2) => {
                elements.len() == elements2.len()
                    && elements
                        .iter()
                        .zip(elements2.iter())
                        .all(|(el1, el2)| is_subtype(table, el1, el2))
            }
            TypeData::Applied { .. } | TypeData::Simple(_) => {
                is_subtype(table, &tuple_underlying(table, elements), t2)
            }
            _ => false,
        },
        TypeData::Shape(fields) => match t2.data() {
            TypeData::Shape(fields2) => shape_subtype(table, fields, fields2),
            TypeData::Applied { .. } | TypeData::Simple(_) => {
                is_subtype(table, &shape_underlying(table, fields), t2)
            }
            _ => false,
        },
        TypeData::Proc { params, ret, .. } => match t2.data() {
            TypeData::Proc {
                params: params2,
                ret: ret2,
                ..
            } => {
                // Exact arity; parameters contravariant, return covariant;
                // self-binding is ignored for subtyping.
                params.len() == params2.len()
                    && params
                        .iter()
                        .zip(params2.iter())
                        .all(|(p1, p2)| is_subtype(table, p2, p1))
                    && is_subtype(table, ret, ret2)
            }
            TypeData::Simple(class2) => table.derives_from(well_known::PROC, *class2),
            _ => false,
        },
        TypeData::ClassOf(inner) => match t2.data() {
            TypeData::ClassOf(inner2) => is_subtype(table, inner, inner2),
            TypeData::Simple(class2) => table.derives_from(well_known::CLASS, *class2),
            _ => false,
        },
        TypeData::Simple(class1) => match t2.data() {
            TypeData::Simple(class2) => table.derives_from(*class1, *class2),
            _ => false,
        },
        _ => false,
    }
}

/// Per-parameter comparison of two generic applications, aligned by
/// member name and judged under the target's declared variance.
fn applied_subtype(
    table: &SymbolTable,
    base1: ClassId,
    args1: &[Type],
    base2: ClassId,
    args2: &[Type],
) -> bool {
    if !table.derives_from(base1, base2) {
        return false;
    }
    let members1 = &table.class(base1).type_members;
    let members2 = &table.class(base2).type_members;
    if args2.len() != members2.len() {
        return false;
    }
    for (member, arg2) in members2.iter().zip(args2.iter()) {
        let Some(index1) = members1.iter().position(|m| m.name == member.name) else {
            return false;
        };
        let Some(arg1) = args1.get(index1) else {
            return false;
        };
        let compatible = match member.variance {
            Variance::Covariant => is_subtype(table, arg1, arg2),
            Variance::Contravariant => is_subtype(table, arg2, arg1),
            Variance::Invariant => {
                is_subtype(table, arg1, arg2) && is_subtype(table, arg2, arg1)
            }
        };
        if !compatible {
            return false;
        }
    }
    true
}

/// Target fields must all be present on the source with covariant value
/// types; extra source fields are permitted.
fn shape_subtype(
    table: &SymbolTable,
    fields1: &[(ShapeKey, Type)],
    fields2: &[(ShapeKey, Type)],
) -> bool {
    fields2.iter().all(|(key2, value2)| {
        fields1
            .iter()
            .find(|(key1, _)| key1 == key2)
            .is_some_and(|(_, value1)| is_subtype(table, value1, value2))
    })
}

/// The generic array a tuple decays into: `Array[join of elements]`.
/// The empty tuple decays into `Array[T.noreturn]`, vacuously a subtype
/// of any `Array[E]`.
fn tuple_underlying(table: &SymbolTable, elements: &[Type]) -> Type {
    let element = lub_all(table, elements.iter().cloned());
    Type::applied(well_known::ARRAY, vec![element])
}

/// The generic hash a shape decays into, with key and value joins
/// computed independently.
fn shape_underlying(table: &SymbolTable, fields: &[(ShapeKey, Type)]) -> Type {
    let key = lub_all(
        table,
        fields.iter().map(|(key, _)| Type::simple(key.key_class())),
    );
    let value = lub_all(table, fields.iter().map(|(_, value)| value.clone()));
    Type::applied(well_known::HASH, vec![key, value])
}
