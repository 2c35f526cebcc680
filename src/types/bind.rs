use crate::error::{Error, Result};
use crate::symbols::{ClassId, SymbolTable};

use super::Type;

/// Bind a generic class to concrete type arguments, producing the applied
/// instantiation.
///
/// Arity must match the declared non-fixed type parameters exactly; a
/// parameter declared with a concrete `fixed:` bound takes that bound and
/// may not be re-specified at use sites, whatever the argument count
/// otherwise looks like.
pub fn bind(table: &SymbolTable, base: ClassId, args: &[Type]) -> Result<Type> {
    let def = table.class(base);
    let members = &def.type_members;
    if members.is_empty() {
        return Err(Error::binding(format!("type `{}` is not generic", def.name)));
    }

    let fixed_count = members.iter().filter(|m| m.fixed.is_some()).count();
    let expected = members.len() - fixed_count;

    if fixed_count > 0 && args.len() == members.len() {
        if let Some(member) = members.iter().find(|m| m.fixed.is_some()) {
            return Err(Error::binding(format!(
                "type member `{}` of `{}` is fixed and cannot be re-specified",
                member.name, def.name
            )));
        }
    }
    if args.len() < expected {
        return Err(Error::binding(format!(
            "not enough type arguments for `{}`: expected {expected}, got {}",
            def.name,
            args.len()
        )));
    }
    if args.len() > expected {
        return Err(Error::binding(format!(
            "too many type arguments for `{}`: expected {expected}, got {}",
            def.name,
            args.len()
        )));
    }

    let mut bound = Vec::with_capacity(members.len());
    let mut supplied = args.iter();
    for member in members {
        if let Some(fixed) = &member.fixed {
            bound.push(fixed.clone());
        } else if let Some(arg) = supplied.next() {
            bound.push(arg.clone());
        }
    }
    Ok(Type::applied(base, bound))
}
