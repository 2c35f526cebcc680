//! Placeholder substitution.
//!
//! Signatures are built with unresolved `T.self_type` /
//! `T.attached_class` markers; the concrete receiver type is substituted
//! immediately before any subtype or override comparison. No comparison
//! result computed against an unsubstituted placeholder is ever cached.

use super::{Type, TypeData};

/// Replace every `T.self_type` in `ty` with `receiver`.
#[must_use]
pub fn replace_self_type(ty: &Type, receiver: &Type) -> Type {
    map_placeholders(ty, Some(receiver), None)
}

/// Replace every `T.attached_class` in `ty` with `attached`.
#[must_use]
pub fn resolve_attached_class(ty: &Type, attached: &Type) -> Type {
    map_placeholders(ty, None, Some(attached))
}

fn map_placeholders(ty: &Type, self_ty: Option<&Type>, attached: Option<&Type>) -> Type {
    match ty.data() {
        TypeData::SelfType => self_ty.cloned().unwrap_or_else(|| ty.clone()),
        TypeData::AttachedClass => attached.cloned().unwrap_or_else(|| ty.clone()),
        TypeData::Simple(_)
        | TypeData::TypeMember { .. }
        | TypeData::TypeParameter(_)
        | TypeData::Untyped
        | TypeData::NoReturn
        | TypeData::Anything
        | TypeData::Unresolved => ty.clone(),
        TypeData::Union(members) => {
            map_members(ty, members, |member| {
                map_placeholders(member, self_ty, attached)
            })
        }
        TypeData::Intersection(members) => map_members(ty, members, |member| {
            map_placeholders(member, self_ty, attached)
        }),
        TypeData::Tuple(elements) => {
            let mapped: Vec<Type> = elements
                .iter()
                .map(|el| map_placeholders(el, self_ty, attached))
                .collect();
            if mapped == *elements {
                ty.clone()
            } else {
                Type::tuple(mapped)
            }
        }
        TypeData::Shape(fields) => {
            let mapped: Vec<_> = fields
                .iter()
                .map(|(key, value)| (key.clone(), map_placeholders(value, self_ty, attached)))
                .collect();
            if mapped
                .iter()
                .zip(fields.iter())
                .all(|((_, mapped), (_, orig))| mapped == orig)
            {
                ty.clone()
            } else {
                Type::shape_unchecked(mapped)
            }
        }
        TypeData::Applied { base, args } => {
            let mapped: Vec<Type> = args
                .iter()
                .map(|arg| map_placeholders(arg, self_ty, attached))
                .collect();
            if mapped == *args {
                ty.clone()
            } else {
                Type::applied(*base, mapped)
            }
        }
        TypeData::Proc { params, ret, bind } => {
            let mapped_params: Vec<Type> = params
                .iter()
                .map(|param| map_placeholders(param, self_ty, attached))
                .collect();
            let mapped_ret = map_placeholders(ret, self_ty, attached);
            let mapped_bind = bind
                .as_ref()
                .map(|bind| map_placeholders(bind, self_ty, attached));
            if mapped_params == *params && mapped_ret == *ret && mapped_bind.as_ref() == bind.as_ref()
            {
                ty.clone()
            } else {
                match mapped_bind {
                    Some(bind) => Type::proc_bound(mapped_params, mapped_ret, bind),
                    None => Type::proc_type(mapped_params, mapped_ret),
                }
            }
        }
        TypeData::ClassOf(inner) => {
            let mapped = map_placeholders(inner, self_ty, attached);
            if mapped == *inner {
                ty.clone()
            } else {
                Type::class_of(mapped)
            }
        }
        TypeData::Alias { name, target } => {
            let mapped = map_placeholders(target, self_ty, attached);
            if mapped == *target {
                ty.clone()
            } else {
                Type::alias(name.clone(), mapped)
            }
        }
    }
}

fn map_members(original: &Type, members: &[Type], f: impl Fn(&Type) -> Type) -> Type {
    let mapped: Vec<Type> = members.iter().map(f).collect();
    if mapped == members {
        original.clone()
    } else {
        match original.data() {
            TypeData::Union(_) => Type::union_unchecked(mapped),
            _ => Type::intersection_unchecked(mapped),
        }
    }
}
