use std::fmt::Write;

use crate::symbols::SymbolTable;

use super::{ShapeKey, Type, TypeData};

/// Render the stable, user-facing form of a type.
///
/// Union and intersection members print sorted by their rendered names so
/// the same type always names itself identically, however it was built.
/// Alias wrappers are unwrapped; a `{T, NilClass}` pair prints as
/// `T.nilable(T)`.
#[must_use]
pub fn show(table: &SymbolTable, ty: &Type) -> String {
    match ty.data() {
        TypeData::Simple(class) => {
            let def = table.class(*class);
            if def.anonymous {
                format!("<anonymous {}>", def.kind.as_str())
            } else {
                def.name.clone()
            }
        }
        TypeData::Union(members) => {
            if let Some(inner) = ty.nilable_inner() {
                return format!("T.nilable({})", show(table, inner));
            }
            format!("T.any({})", show_sorted_members(table, members))
        }
        TypeData::Intersection(members) => {
            format!("T.all({})", show_sorted_members(table, members))
        }
        TypeData::Tuple(elements) => {
            let rendered: Vec<String> = elements.iter().map(|el| show(table, el)).collect();
            format!("[{}]", rendered.join(", "))
        }
        TypeData::Shape(fields) => {
            let mut out = String::from("{");
            for (index, (key, value)) in fields.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                match key {
                    ShapeKey::Sym(name) => {
                        let _ = write!(out, "{name}: {}", show(table, value));
                    }
                    ShapeKey::Str(name) => {
                        let _ = write!(out, "{name:?} => {}", show(table, value));
                    }
                }
            }
            out.push('}');
            out
        }
        TypeData::Applied { base, args } => {
            let rendered: Vec<String> = args.iter().map(|arg| show(table, arg)).collect();
            format!("{}[{}]", table.name(*base), rendered.join(", "))
        }
        TypeData::Proc { params, ret, .. } => {
            if params.is_empty() {
                format!("T.proc.returns({})", show(table, ret))
            } else {
                let rendered: Vec<String> = params.iter().map(|p| show(table, p)).collect();
                format!(
                    "T.proc.params({}).returns({})",
                    rendered.join(", "),
                    show(table, ret)
                )
            }
        }
        TypeData::ClassOf(inner) => format!("T.class_of({})", show(table, inner)),
        TypeData::SelfType => "T.self_type".to_string(),
        TypeData::AttachedClass => "T.attached_class".to_string(),
        TypeData::TypeMember { name, .. } => name.clone(),
        TypeData::TypeParameter(name) => format!("T.type_parameter(:{name})"),
        TypeData::Untyped => "T.untyped".to_string(),
        TypeData::NoReturn => "T.noreturn".to_string(),
        TypeData::Anything => "T.anything".to_string(),
        TypeData::Unresolved => "T.untyped (unresolved)".to_string(),
        TypeData::Alias { target, .. } => show(table, target),
    }
}

fn show_sorted_members(table: &SymbolTable, members: &[Type]) -> String {
    let mut rendered: Vec<String> = members.iter().map(|member| show(table, member)).collect();
    rendered.sort();
    rendered.dedup();
    rendered.join(", ")
}
