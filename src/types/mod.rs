//! Immutable, structurally-hashable type values.
//!
//! Types are constructed once during resolution and shared behind [`Arc`];
//! equality and hashing are structural, with a pointer-identity fast path
//! for interned handles. Normalization (alias unwrapping, union
//! flattening, deduplication) happens at construction so every query sees
//! canonical values.

mod bind;
mod pool;
mod show;
mod subtype;
mod substitute;

pub use bind::bind;
pub use pool::TypePool;
pub use show::show;
pub use subtype::{equiv, glb, is_subtype, lub, lub_all};
pub use substitute::{replace_self_type, resolve_attached_class};

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::symbols::{ClassId, SymbolTable};

/// Literal key of a shape field. The symbol and string forms of the same
/// spelling are distinct keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKey {
    Sym(String),
    Str(String),
}

impl ShapeKey {
    #[must_use]
    pub fn sym(name: impl Into<String>) -> Self {
        ShapeKey::Sym(name.into())
    }

    #[must_use]
    pub fn str(name: impl Into<String>) -> Self {
        ShapeKey::Str(name.into())
    }

    /// The class of values this key matches at runtime.
    #[must_use]
    pub fn key_class(&self) -> ClassId {
        match self {
            ShapeKey::Sym(_) => crate::symbols::well_known::SYMBOL,
            ShapeKey::Str(_) => crate::symbols::well_known::STRING,
        }
    }
}

/// The constructors of the type lattice.
#[derive(Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    /// A concrete class or module reference.
    Simple(ClassId),
    /// Normalized disjunction: flattened, deduplicated, no nested unions.
    Union(Vec<Type>),
    /// Normalized conjunction with the same flattening invariant.
    Intersection(Vec<Type>),
    /// Fixed-length positional array type.
    Tuple(Vec<Type>),
    /// Fixed-field hash type; keys unique per literal form.
    Shape(Vec<(ShapeKey, Type)>),
    /// Instantiation of a generic at its declared arity.
    Applied { base: ClassId, args: Vec<Type> },
    /// Callable type; arity is exact, self-binding is advisory only.
    Proc {
        params: Vec<Type>,
        ret: Type,
        bind: Option<Type>,
    },
    /// The metatype of a class/module value.
    ClassOf(Type),
    /// Placeholder for the lexical receiver type; must be substituted
    /// before any cached subtype judgment.
    SelfType,
    /// Placeholder for the concrete receiver class at a call site.
    AttachedClass,
    /// Class-level generic placeholder, unbound unless applied.
    TypeMember { owner: ClassId, name: String },
    /// Method-level generic placeholder.
    TypeParameter(String),
    /// Transparent name for another type; unwrapped by normalization.
    Alias { name: String, target: Type },
    /// Top and bottom at once; absorbs every comparison.
    Untyped,
    /// Bottom type.
    NoReturn,
    /// Top type. Subtype only of `Untyped`.
    Anything,
    /// Sentinel substituted for cyclic type-member bounds; behaves like
    /// `Untyped` in queries but renders distinctly.
    Unresolved,
}

/// Shared handle to an immutable type value.
#[derive(Clone, Debug)]
pub struct Type(Arc<TypeData>);

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl Type {
    fn new(data: TypeData) -> Self {
        Self(Arc::new(data))
    }

    #[must_use]
    pub fn data(&self) -> &TypeData {
        &self.0
    }

    /// Whether two handles share the same allocation.
    #[must_use]
    pub fn ptr_eq(a: &Type, b: &Type) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    #[must_use]
    pub fn simple(class: ClassId) -> Self {
        Self::new(TypeData::Simple(class))
    }

    #[must_use]
    pub fn untyped() -> Self {
        Self::new(TypeData::Untyped)
    }

    #[must_use]
    pub fn noreturn() -> Self {
        Self::new(TypeData::NoReturn)
    }

    #[must_use]
    pub fn anything() -> Self {
        Self::new(TypeData::Anything)
    }

    #[must_use]
    pub fn self_type() -> Self {
        Self::new(TypeData::SelfType)
    }

    #[must_use]
    pub fn attached_class() -> Self {
        Self::new(TypeData::AttachedClass)
    }

    #[must_use]
    pub fn unresolved() -> Self {
        Self::new(TypeData::Unresolved)
    }

    #[must_use]
    pub fn tuple(elements: Vec<Type>) -> Self {
        Self::new(TypeData::Tuple(elements))
    }

    /// A fixed-field hash type. Duplicate keys of the same literal form
    /// are a construction error; the symbol and string spellings of one
    /// name are distinct keys.
    pub fn shape(fields: Vec<(ShapeKey, Type)>) -> Result<Self> {
        for (index, (key, _)) in fields.iter().enumerate() {
            if fields[..index].iter().any(|(seen, _)| seen == key) {
                return Err(Error::construction(format!(
                    "duplicate shape key {key:?}"
                )));
            }
        }
        Ok(Self::new(TypeData::Shape(fields)))
    }

    /// Rebuild a shape whose keys were already validated.
    pub(crate) fn shape_unchecked(fields: Vec<(ShapeKey, Type)>) -> Self {
        Self::new(TypeData::Shape(fields))
    }

    /// Rebuild a union from members that are already normalized.
    pub(crate) fn union_unchecked(members: Vec<Type>) -> Self {
        Self::new(TypeData::Union(members))
    }

    /// Rebuild an intersection from members that are already normalized.
    pub(crate) fn intersection_unchecked(members: Vec<Type>) -> Self {
        Self::new(TypeData::Intersection(members))
    }

    #[must_use]
    pub fn applied(base: ClassId, args: Vec<Type>) -> Self {
        Self::new(TypeData::Applied { base, args })
    }

    #[must_use]
    pub fn proc_type(params: Vec<Type>, ret: Type) -> Self {
        Self::new(TypeData::Proc {
            params,
            ret,
            bind: None,
        })
    }

    #[must_use]
    pub fn proc_bound(params: Vec<Type>, ret: Type, bind: Type) -> Self {
        Self::new(TypeData::Proc {
            params,
            ret,
            bind: Some(bind),
        })
    }

    #[must_use]
    pub fn class_of(instance: Type) -> Self {
        Self::new(TypeData::ClassOf(instance))
    }

    #[must_use]
    pub fn type_member(owner: ClassId, name: impl Into<String>) -> Self {
        Self::new(TypeData::TypeMember {
            owner,
            name: name.into(),
        })
    }

    #[must_use]
    pub fn type_parameter(name: impl Into<String>) -> Self {
        Self::new(TypeData::TypeParameter(name.into()))
    }

    #[must_use]
    pub fn alias(name: impl Into<String>, target: Type) -> Self {
        Self::new(TypeData::Alias {
            name: name.into(),
            target,
        })
    }

    /// Follow alias indirections to the underlying type.
    #[must_use]
    pub fn dealias(&self) -> &Type {
        let mut current = self;
        while let TypeData::Alias { target, .. } = current.data() {
            current = target;
        }
        current
    }

    #[must_use]
    pub fn is_untyped(&self) -> bool {
        matches!(
            self.dealias().data(),
            TypeData::Untyped | TypeData::Unresolved
        )
    }

    #[must_use]
    pub fn is_noreturn(&self) -> bool {
        matches!(self.dealias().data(), TypeData::NoReturn)
    }

    #[must_use]
    pub fn is_anything(&self) -> bool {
        matches!(self.dealias().data(), TypeData::Anything)
    }

    #[must_use]
    pub fn is_nil_class(&self) -> bool {
        matches!(
            self.dealias().data(),
            TypeData::Simple(class) if *class == crate::symbols::well_known::NIL_CLASS
        )
    }

    /// Whether the type mentions an unbound generic placeholder anywhere.
    /// Such positions are exempt from override type-compatibility checks.
    #[must_use]
    pub fn has_generic_placeholder(&self) -> bool {
        match self.dealias().data() {
            TypeData::TypeMember { .. } | TypeData::TypeParameter(_) => true,
            TypeData::Simple(_)
            | TypeData::SelfType
            | TypeData::AttachedClass
            | TypeData::Untyped
            | TypeData::NoReturn
            | TypeData::Anything
            | TypeData::Unresolved => false,
            TypeData::Union(members) | TypeData::Intersection(members) | TypeData::Tuple(members) => {
                members.iter().any(Type::has_generic_placeholder)
            }
            TypeData::Shape(fields) => fields.iter().any(|(_, ty)| ty.has_generic_placeholder()),
            TypeData::Applied { args, .. } => args.iter().any(Type::has_generic_placeholder),
            TypeData::Proc { params, ret, bind } => {
                params.iter().any(Type::has_generic_placeholder)
                    || ret.has_generic_placeholder()
                    || bind.as_ref().is_some_and(Type::has_generic_placeholder)
            }
            TypeData::ClassOf(inner) => inner.has_generic_placeholder(),
            TypeData::Alias { .. } => false,
        }
    }

    /// Collect every `TypeMember` reference in the type, used by the
    /// symbol table's bound-cycle detection.
    pub fn collect_type_member_refs(&self, out: &mut Vec<(ClassId, String)>) {
        match self.dealias().data() {
            TypeData::TypeMember { owner, name } => out.push((*owner, name.clone())),
            TypeData::Simple(_)
            | TypeData::TypeParameter(_)
            | TypeData::SelfType
            | TypeData::AttachedClass
            | TypeData::Untyped
            | TypeData::NoReturn
            | TypeData::Anything
            | TypeData::Unresolved => {}
            TypeData::Union(members) | TypeData::Intersection(members) | TypeData::Tuple(members) => {
                for member in members {
                    member.collect_type_member_refs(out);
                }
            }
            TypeData::Shape(fields) => {
                for (_, ty) in fields {
                    ty.collect_type_member_refs(out);
                }
            }
            TypeData::Applied { args, .. } => {
                for arg in args {
                    arg.collect_type_member_refs(out);
                }
            }
            TypeData::Proc { params, ret, bind } => {
                for param in params {
                    param.collect_type_member_refs(out);
                }
                ret.collect_type_member_refs(out);
                if let Some(bind) = bind {
                    bind.collect_type_member_refs(out);
                }
            }
            TypeData::ClassOf(inner) => inner.collect_type_member_refs(out),
            TypeData::Alias { .. } => {}
        }
    }

    /// For a two-member union of `T` and `NilClass`, the non-nil member.
    #[must_use]
    pub fn nilable_inner(&self) -> Option<&Type> {
        let TypeData::Union(members) = self.dealias().data() else {
            return None;
        };
        if members.len() != 2 {
            return None;
        }
        let nil_at = members.iter().position(Type::is_nil_class)?;
        members.get(1 - nil_at)
    }
}

/// Build a normalized union: aliases unwrapped, nested unions flattened,
/// members structurally deduplicated and sorted into canonical order,
/// anonymous class members dropped when a named alternative remains. A
/// union of one effective member collapses to that member; an empty union
/// is the bottom type. Canonical ordering makes equivalent unions
/// structurally equal however they were assembled.
#[must_use]
pub fn union_of(table: &SymbolTable, members: impl IntoIterator<Item = Type>) -> Type {
    let mut flat = flatten(members, union_members);
    let has_named = flat.iter().any(|member| !is_anonymous_simple(table, member));
    if has_named {
        flat.retain(|member| !is_anonymous_simple(table, member));
    }
    flat.sort_by_cached_key(|member| show::show(table, member));
    match flat.len() {
        0 => Type::noreturn(),
        1 => flat.remove(0),
        _ => Type::new(TypeData::Union(flat)),
    }
}

/// Build a normalized intersection with the same flattening,
/// deduplication, and canonical-ordering invariants as [`union_of`]. An
/// empty intersection is the top type.
#[must_use]
pub fn intersection_of(table: &SymbolTable, members: impl IntoIterator<Item = Type>) -> Type {
    let mut flat = flatten(members, intersection_members);
    flat.sort_by_cached_key(|member| show::show(table, member));
    match flat.len() {
        0 => Type::anything(),
        1 => flat.remove(0),
        _ => Type::new(TypeData::Intersection(flat)),
    }
}

fn union_members(data: &TypeData) -> Option<&Vec<Type>> {
    match data {
        TypeData::Union(inner) => Some(inner),
        _ => None,
    }
}

fn intersection_members(data: &TypeData) -> Option<&Vec<Type>> {
    match data {
        TypeData::Intersection(inner) => Some(inner),
        _ => None,
    }
}

fn flatten(
    members: impl IntoIterator<Item = Type>,
    nested: fn(&TypeData) -> Option<&Vec<Type>>,
) -> Vec<Type> {
    let mut flat: Vec<Type> = Vec::new();
    let mut queue: Vec<Type> = members.into_iter().collect();
    queue.reverse();
    while let Some(member) = queue.pop() {
        let member = member.dealias().clone();
        if let Some(inner) = nested(member.data()) {
            for nested_member in inner.iter().rev() {
                queue.push(nested_member.clone());
            }
            continue;
        }
        if !flat.contains(&member) {
            flat.push(member);
        }
    }
    flat
}

fn is_anonymous_simple(table: &SymbolTable, ty: &Type) -> bool {
    matches!(ty.data(), TypeData::Simple(class) if table.class(*class).anonymous)
}
