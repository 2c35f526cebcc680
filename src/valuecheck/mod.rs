//! Call-time value-shape checking.
//!
//! Two entry depths share one traversal: a shallow check that inspects
//! only a value's own runtime class or container kind, and a deep check
//! that walks container elements, computes the actual element join, and
//! compares recursively. Shallow checking is monotonic with respect to
//! deep checking: whenever the shallow check rejects a value the deep
//! check rejects it too, and when the two disagree the deep verdict is
//! authoritative.

use serde::Serialize;

use crate::symbols::{ClassId, SymbolTable, well_known};
use crate::types::{ShapeKey, Type, TypeData, is_subtype, lub_all, show};

/// How far a check descends into container values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Depth {
    Shallow,
    Deep,
}

impl Depth {
    #[must_use]
    pub fn is_deep(self) -> bool {
        matches!(self, Depth::Deep)
    }
}

/// Outcome of attempting to iterate an enumerable value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Elements {
    /// Iteration succeeded and yielded these shapes.
    Items(Vec<ValueShape>),
    /// Iteration raised; the element type degrades to `T.untyped`.
    RaisesOnIteration,
    /// Lazy, chained, cyclic, or otherwise unrewindable; deep checking
    /// skips these entirely.
    Unrewindable,
}

/// The runtime shape of a candidate value, as observed by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueShape {
    /// An ordinary object instance.
    Instance(ClassId),
    /// A class or module object.
    ClassObject(ClassId),
    Array(Elements),
    Hash(Vec<(ShapeKey, ValueShape)>),
    Proc { arity: usize },
}

impl ValueShape {
    #[must_use]
    pub fn nil() -> Self {
        ValueShape::Instance(well_known::NIL_CLASS)
    }

    /// The runtime class of the value's outermost container or instance.
    #[must_use]
    pub fn outer_class(&self) -> ClassId {
        match self {
            ValueShape::Instance(class) => *class,
            ValueShape::ClassObject(_) => well_known::CLASS,
            ValueShape::Array(_) => well_known::ARRAY,
            ValueShape::Hash(_) => well_known::HASH,
            ValueShape::Proc { .. } => well_known::PROC,
        }
    }
}

/// Why a mismatch was reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    TypeMismatch,
    /// The value's class has the same fully-qualified name as the
    /// expected class but a different identity: the constant was
    /// redefined (reloaded) after the signature captured it.
    ReloadedConstant,
}

/// Structured description of an expected-vs-actual failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub kind: MismatchKind,
    pub expected: String,
    pub actual: String,
}

impl Mismatch {
    fn types(table: &SymbolTable, expected: &Type, actual: &Type) -> Self {
        Self {
            kind: MismatchKind::TypeMismatch,
            expected: show(table, expected),
            actual: show(table, actual),
        }
    }
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            MismatchKind::TypeMismatch => {
                write!(f, "expected {}, got {}", self.expected, self.actual)
            }
            MismatchKind::ReloadedConstant => write!(
                f,
                "expected {}, got {} (the constant was reloaded; the two share a name but are distinct)",
                self.expected, self.actual
            ),
        }
    }
}

/// Check a value shape against a declared type, returning `None` when the
/// value is acceptable at the requested depth.
#[must_use]
pub fn check_value(
    table: &SymbolTable,
    expected: &Type,
    value: &ValueShape,
    depth: Depth,
) -> Option<Mismatch> {
    let expected = expected.dealias();
    match expected.data() {
        // Absorbing and placeholder positions accept anything at runtime.
        TypeData::Untyped
        | TypeData::Unresolved
        | TypeData::Anything
        | TypeData::TypeMember { .. }
        | TypeData::TypeParameter(_)
        | TypeData::SelfType
        | TypeData::AttachedClass => None,
        TypeData::NoReturn => Some(Mismatch::types(
            table,
            expected,
            &infer_shape_type(table, value),
        )),
        TypeData::Union(members) => {
            if members
                .iter()
                .any(|member| check_value(table, member, value, depth).is_none())
            {
                None
            } else {
                Some(mismatch_against(table, expected, value))
            }
        }
        TypeData::Intersection(members) => members
            .iter()
            .find_map(|member| check_value(table, member, value, depth))
            .map(|_| mismatch_against(table, expected, value)),
        TypeData::Simple(class) => check_simple(table, expected, *class, value),
        TypeData::Tuple(elements) => match value {
            ValueShape::Array(items) => match (depth, items) {
                (Depth::Shallow, _) | (Depth::Deep, Elements::Unrewindable) => None,
                (Depth::Deep, Elements::RaisesOnIteration) => None,
                (Depth::Deep, Elements::Items(values)) => {
                    if values.len() != elements.len() {
                        return Some(mismatch_against(table, expected, value));
                    }
                    elements
                        .iter()
                        .zip(values.iter())
                        .find_map(|(element, item)| check_value(table, element, item, depth))
                        .map(|_| mismatch_against(table, expected, value))
                }
            },
            _ => Some(mismatch_against(table, expected, value)),
        },
        TypeData::Shape(fields) => match value {
            ValueShape::Hash(entries) => {
                if !depth.is_deep() {
                    return None;
                }
                fields
                    .iter()
                    .find_map(|(key, field_ty)| {
                        let entry = entries.iter().find(|(entry_key, _)| entry_key == key);
                        match entry {
                            Some((_, entry_value)) => {
                                check_value(table, field_ty, entry_value, depth)
                            }
                            None => Some(mismatch_against(table, expected, value)),
                        }
                    })
                    .map(|_| mismatch_against(table, expected, value))
            }
            _ => Some(mismatch_against(table, expected, value)),
        },
        TypeData::Applied { base, args } => check_applied(table, expected, *base, args, value, depth),
        TypeData::Proc { params, .. } => match value {
            ValueShape::Proc { arity } => {
                if depth.is_deep() && *arity != params.len() {
                    Some(mismatch_against(table, expected, value))
                } else {
                    None
                }
            }
            _ => Some(mismatch_against(table, expected, value)),
        },
        TypeData::ClassOf(instance) => match value {
            ValueShape::ClassObject(class) => {
                if is_subtype(table, &Type::simple(*class), instance) {
                    None
                } else {
                    Some(mismatch_against(table, expected, value))
                }
            }
            _ => Some(mismatch_against(table, expected, value)),
        },
        TypeData::Alias { target, .. } => check_value(table, target, value, depth),
    }
}

fn check_simple(
    table: &SymbolTable,
    expected: &Type,
    class: ClassId,
    value: &ValueShape,
) -> Option<Mismatch> {
    let value_class = value.outer_class();
    if table.derives_from(value_class, class) {
        return None;
    }
    // Same fully-qualified name under different ids means the constant
    // was reloaded; surface that instead of a generic type error.
    if table.name(value_class) == table.name(class) {
        return Some(Mismatch {
            kind: MismatchKind::ReloadedConstant,
            expected: format!("{} (id {})", table.name(class), class.0),
            actual: format!("{} (id {})", table.name(value_class), value_class.0),
        });
    }
    Some(Mismatch::types(
        table,
        expected,
        &infer_shape_type(table, value),
    ))
}

fn check_applied(
    table: &SymbolTable,
    expected: &Type,
    base: ClassId,
    args: &[Type],
    value: &ValueShape,
    depth: Depth,
) -> Option<Mismatch> {
    let outer = value.outer_class();
    if !table.derives_from(outer, base) {
        return Some(mismatch_against(table, expected, value));
    }
    if !depth.is_deep() {
        return None;
    }
    match value {
        ValueShape::Array(Elements::Items(items)) => {
            let element = args.first()?;
            if items
                .iter()
                .all(|item| check_value(table, element, item, depth).is_none())
            {
                None
            } else {
                Some(mismatch_against(table, expected, value))
            }
        }
        // Iteration failures degrade the element type to untyped; lazy
        // and unrewindable enumerables are skipped outright.
        ValueShape::Array(Elements::RaisesOnIteration | Elements::Unrewindable) => None,
        ValueShape::Hash(entries) => {
            if base != well_known::HASH || args.len() != 2 {
                return None;
            }
            let (key_ty, value_ty) = (&args[0], &args[1]);
            let keys_ok = entries
                .iter()
                .all(|(key, _)| is_subtype(table, &Type::simple(key.key_class()), key_ty));
            let values_ok = entries
                .iter()
                .all(|(_, entry)| check_value(table, value_ty, entry, depth).is_none());
            if keys_ok && values_ok {
                None
            } else {
                Some(mismatch_against(table, expected, value))
            }
        }
        _ => None,
    }
}

fn mismatch_against(table: &SymbolTable, expected: &Type, value: &ValueShape) -> Mismatch {
    Mismatch::types(table, expected, &infer_shape_type(table, value))
}

/// The most specific type the checker can reconstruct for a value shape.
/// Deep mismatches report this as the actual type, e.g.
/// `Array[T.any(Float, TrueClass)]` against an expected `Array[Integer]`.
#[must_use]
pub fn infer_shape_type(table: &SymbolTable, value: &ValueShape) -> Type {
    match value {
        ValueShape::Instance(class) => Type::simple(*class),
        ValueShape::ClassObject(class) => Type::class_of(Type::simple(*class)),
        ValueShape::Array(Elements::Items(items)) => {
            let element = lub_all(table, items.iter().map(|item| infer_shape_type(table, item)));
            let element = if items.is_empty() {
                Type::untyped()
            } else {
                element
            };
            Type::applied(well_known::ARRAY, vec![element])
        }
        ValueShape::Array(Elements::RaisesOnIteration | Elements::Unrewindable) => {
            Type::applied(well_known::ARRAY, vec![Type::untyped()])
        }
        ValueShape::Hash(entries) => {
            let key = lub_all(
                table,
                entries.iter().map(|(key, _)| Type::simple(key.key_class())),
            );
            let value_ty = lub_all(
                table,
                entries
                    .iter()
                    .map(|(_, entry)| infer_shape_type(table, entry)),
            );
            let (key, value_ty) = if entries.is_empty() {
                (Type::untyped(), Type::untyped())
            } else {
                (key, value_ty)
            };
            Type::applied(well_known::HASH, vec![key, value_ty])
        }
        ValueShape::Proc { .. } => Type::simple(well_known::PROC),
    }
}
