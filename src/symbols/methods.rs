use crate::diagnostics::Span;
use crate::types::Type;

use super::{ClassId, Visibility};

/// Declaration mode attached to a method signature.
///
/// `Implementation` and `OverridableImplementation` are the legacy
/// spellings of an override that implements an abstract parent; they
/// validate the same way `Override` does (the latter additionally stays
/// overridable for further subclasses).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Standard,
    Abstract,
    Override,
    Overridable,
    Implementation,
    OverridableImplementation,
}

impl Mode {
    #[must_use]
    pub fn is_override(self) -> bool {
        matches!(
            self,
            Mode::Override | Mode::Implementation | Mode::OverridableImplementation
        )
    }

    #[must_use]
    pub fn is_overridable(self) -> bool {
        matches!(self, Mode::Overridable | Mode::OverridableImplementation)
    }

    #[must_use]
    pub fn is_abstract(self) -> bool {
        matches!(self, Mode::Abstract)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Standard => "standard",
            Mode::Abstract => "abstract",
            Mode::Override => "override",
            Mode::Overridable => "overridable",
            Mode::Implementation => "implementation",
            Mode::OverridableImplementation => "overridable implementation",
        }
    }
}

/// When call-time value checking runs for a signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Checked {
    Always,
    Tests,
    Never,
}

/// A single declared parameter.
#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

impl Param {
    #[must_use]
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A resolved method signature, already decomposed by parameter kind.
///
/// The decomposition (positional/keyword crossed with required/optional,
/// plus at most one rest of each kind and one block parameter) is the form
/// the override validator consumes directly; the resolver performs the
/// split while walking the declaration.
#[derive(Clone, Debug)]
pub struct MethodSig {
    pub name: String,
    /// Filled in when the signature is attached to a class.
    pub owner: Option<ClassId>,
    pub pos_required: Vec<Param>,
    pub pos_optional: Vec<Param>,
    pub pos_rest: Option<Param>,
    pub kw_required: Vec<Param>,
    pub kw_optional: Vec<Param>,
    pub kw_rest: Option<Param>,
    pub block: Option<Param>,
    pub return_type: Type,
    /// Method-level type parameters, by name.
    pub type_parameters: Vec<String>,
    pub mode: Mode,
    pub checked: Checked,
    pub is_final: bool,
    pub visibility: Visibility,
    /// Suppresses only the visibility-monotonicity check on overrides.
    pub allow_incompatible: bool,
    /// Whether the definition carries executable statements.
    pub has_body: bool,
    /// Unannotated methods participate in resolution but skip most checks.
    pub has_sig: bool,
    pub span: Option<Span>,
}

impl MethodSig {
    /// A public, standard, always-checked signature with no parameters.
    #[must_use]
    pub fn simple(name: impl Into<String>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            owner: None,
            pos_required: Vec::new(),
            pos_optional: Vec::new(),
            pos_rest: None,
            kw_required: Vec::new(),
            kw_optional: Vec::new(),
            kw_rest: None,
            block: None,
            return_type,
            type_parameters: Vec::new(),
            mode: Mode::Standard,
            checked: Checked::Always,
            is_final: false,
            visibility: Visibility::Public,
            allow_incompatible: false,
            has_body: true,
            has_sig: true,
            span: None,
        }
    }

    /// Total positional capacity excluding the rest parameter.
    #[must_use]
    pub fn positional_total(&self) -> usize {
        self.pos_required.len() + self.pos_optional.len()
    }

    /// Whether call-time checking applies for this signature.
    #[must_use]
    pub fn should_check(&self, in_test_env: bool) -> bool {
        match self.checked {
            Checked::Always => true,
            Checked::Tests => in_test_env,
            Checked::Never => false,
        }
    }

    #[must_use]
    pub fn keyword(&self, name: &str) -> Option<&Param> {
        self.kw_required
            .iter()
            .chain(self.kw_optional.iter())
            .find(|param| param.name == name)
    }

    #[must_use]
    pub fn has_required_keyword(&self, name: &str) -> bool {
        self.kw_required.iter().any(|param| param.name == name)
    }

    #[must_use]
    pub fn has_optional_keyword(&self, name: &str) -> bool {
        self.kw_optional.iter().any(|param| param.name == name)
    }
}
