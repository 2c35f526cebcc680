//! Variance-position validation and type-member redeclaration checks.
//!
//! Method parameters sit in negative (input) positions and return types
//! in positive (output) positions; a type member may only appear where
//! its declared variance allows. Contravariant applications flip the
//! polarity of their arguments: `-(-a -> +b) -> +c` reads the same as
//! `(+a -> -b) -> +c`.

use crate::diagnostics::Span;
use crate::symbols::{ClassId, MemberKind, MethodSig, Variance};
use crate::types::{Type, TypeData};

use super::Validator;
use super::diagnostics::codes;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    fn negate(self) -> Self {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Polarity::Positive => ":out",
            Polarity::Negative => ":in",
        }
    }

    fn permits(self, variance: Variance) -> bool {
        match self {
            Polarity::Positive => variance != Variance::Contravariant,
            Polarity::Negative => variance != Variance::Covariant,
        }
    }
}

impl Validator<'_> {
    pub(super) fn validate_method_variance(&mut self, class: ClassId) {
        let table = self.table;
        let def = table.class(class);
        if def.synthetic || def.type_members.is_empty() {
            return;
        }
        for method in &def.methods {
            self.validate_signature_variance(method);
        }
        for method in &def.singleton_methods {
            self.validate_signature_variance(method);
        }
    }

    fn validate_signature_variance(&mut self, method: &MethodSig) {
        let params = method
            .pos_required
            .iter()
            .chain(method.pos_optional.iter())
            .chain(method.pos_rest.iter())
            .chain(method.kw_required.iter())
            .chain(method.kw_optional.iter())
            .chain(method.kw_rest.iter())
            .chain(method.block.iter());
        for param in params {
            self.validate_polarity(&param.ty, Polarity::Negative, method.span);
        }
        self.validate_polarity(&method.return_type, Polarity::Positive, method.span);
    }

    fn validate_polarity(&mut self, ty: &Type, polarity: Polarity, span: Option<Span>) {
        match ty.data() {
            TypeData::Simple(_)
            | TypeData::SelfType
            | TypeData::AttachedClass
            | TypeData::TypeParameter(_)
            | TypeData::Untyped
            | TypeData::NoReturn
            | TypeData::Anything
            | TypeData::Unresolved => {}
            TypeData::Union(members) | TypeData::Intersection(members) | TypeData::Tuple(members) => {
                for member in members {
                    self.validate_polarity(member, polarity, span);
                }
            }
            TypeData::Shape(fields) => {
                for (_, value) in fields {
                    self.validate_polarity(value, polarity, span);
                }
            }
            TypeData::Applied { base, args } => {
                let table = self.table;
                let members = &table.class(*base).type_members;
                for (index, arg) in args.iter().enumerate() {
                    let arg_polarity = match members.get(index).map(|member| member.variance) {
                        Some(Variance::Contravariant) => polarity.negate(),
                        _ => polarity,
                    };
                    self.validate_polarity(arg, arg_polarity, span);
                }
            }
            TypeData::Proc { params, ret, .. } => {
                for param in params {
                    self.validate_polarity(param, polarity.negate(), span);
                }
                self.validate_polarity(ret, polarity, span);
            }
            TypeData::ClassOf(inner) => self.validate_polarity(inner, polarity, span),
            TypeData::Alias { target, .. } => self.validate_polarity(target, polarity, span),
            TypeData::TypeMember { owner, name } => {
                let Some(member) = self.table.type_member(*owner, name) else {
                    return;
                };
                if !polarity.permits(member.variance) {
                    let (kind, variance, member_name) =
                        (member.kind.as_str(), member.variance.as_str(), member.name.clone());
                    self.emit_error(
                        codes::INVALID_VARIANCE,
                        span,
                        format!(
                            "{kind} `{member_name}` was defined as `{variance}` but is used in an `{}` context",
                            polarity.as_str()
                        ),
                    );
                }
            }
        }
    }

    /// A generic parent's type members must be redeclared by every
    /// subtype: same count, same order, same kind, same variance.
    pub(super) fn validate_type_member_redeclarations(&mut self, class: ClassId) {
        let table = self.table;
        let def = table.class(class);
        let parents = def
            .superclass
            .into_iter()
            .chain(def.mixins.iter().copied());
        for parent_id in parents {
            let parent = table.class(parent_id);
            if parent.type_members.is_empty() {
                continue;
            }
            for (index, inherited) in parent.type_members.iter().enumerate() {
                let Some(declared) = def.type_members.get(index) else {
                    self.emit_error(
                        codes::TYPE_MEMBER_REDECLARATION,
                        def.span,
                        format!(
                            "`{}` must re-declare the type member `{}` inherited from `{}`",
                            def.name, inherited.name, parent.name
                        ),
                    );
                    continue;
                };
                if declared.name != inherited.name {
                    self.emit_error(
                        codes::TYPE_MEMBER_REDECLARATION,
                        def.span,
                        format!(
                            "`{}` must re-declare the type members of `{}` in the same order: expected `{}` at position {index}, found `{}`",
                            def.name, parent.name, inherited.name, declared.name
                        ),
                    );
                    continue;
                }
                if declared.kind != inherited.kind {
                    self.emit_error(
                        codes::TYPE_MEMBER_KIND_MISMATCH,
                        def.span,
                        format!(
                            "`{}` re-declares `{}` as a {} but `{}` declared it as a {}",
                            def.name,
                            inherited.name,
                            kind_word(declared.kind),
                            parent.name,
                            kind_word(inherited.kind)
                        ),
                    );
                }
                if declared.variance != inherited.variance {
                    self.emit_error(
                        codes::TYPE_MEMBER_VARIANCE_MISMATCH,
                        def.span,
                        format!(
                            "`{}` re-declares `{}` as `{}` but `{}` declared it as `{}`",
                            def.name,
                            inherited.name,
                            declared.variance.as_str(),
                            parent.name,
                            inherited.variance.as_str()
                        ),
                    );
                }
            }
        }
    }
}

fn kind_word(kind: MemberKind) -> &'static str {
    match kind {
        MemberKind::Member => "type_member",
        MemberKind::Template => "type_template",
    }
}
