use crate::diagnostics::{Diagnostic, DiagnosticCode, Span};

pub mod codes {
    // Construction-time degradations.
    pub const TYPE_MEMBER_CYCLE: &str = "TYP005";

    // Override shape and compatibility.
    pub const OVERRIDE_TARGET_MISSING: &str = "OVR200";
    pub const OVERRIDE_POSITIONAL_ARITY: &str = "OVR201";
    pub const OVERRIDE_EXTRA_REQUIRED: &str = "OVR202";
    pub const OVERRIDE_MISSING_REST: &str = "OVR203";
    pub const OVERRIDE_MISSING_KWREST: &str = "OVR204";
    pub const OVERRIDE_MISSING_KEYWORD: &str = "OVR205";
    pub const OVERRIDE_EXTRA_REQUIRED_KEYWORD: &str = "OVR206";
    pub const OVERRIDE_KEYWORD_MUST_BE_OPTIONAL: &str = "OVR207";
    pub const OVERRIDE_MISSING_OPTIONAL_KEYWORD: &str = "OVR208";
    pub const OVERRIDE_MISSING_BLOCK: &str = "OVR209";
    pub const OVERRIDE_PARAMETER_TYPE: &str = "OVR210";
    pub const OVERRIDE_RETURN_TYPE: &str = "OVR211";
    pub const OVERRIDE_VISIBILITY: &str = "OVR212";
    pub const UNDECLARED_OVERRIDE: &str = "OVR213";
    pub const OVERRIDE_TYPE_PARAMETER_COUNT: &str = "OVR214";

    // Abstract and interface shape.
    pub const ABSTRACT_OWNER_NOT_ABSTRACT: &str = "ABS100";
    pub const MODULE_STATIC_ABSTRACT: &str = "ABS101";
    pub const ABSTRACT_BODY_FORBIDDEN: &str = "ABS102";
    pub const INTERFACE_NON_ABSTRACT: &str = "ABS103";
    pub const INTERFACE_NON_PUBLIC: &str = "ABS104";
    pub const INTERFACE_MISSING_SIG: &str = "ABS105";
    pub const MISSING_IMPLEMENTATION: &str = "ABS106";
    pub const ABSTRACT_INSTANTIATION: &str = "ABS107";
    pub const INTERFACE_MIXIN_NOT_ABSTRACT: &str = "ABS108";

    // Finality and sealing.
    pub const FINAL_METHOD_OVERRIDE: &str = "FIN300";
    pub const FINAL_METHOD_REDEFINED: &str = "FIN301";
    pub const FINAL_ANCESTOR: &str = "FIN302";
    pub const FINAL_TYPE_NON_FINAL_METHOD: &str = "FIN303";
    pub const SEALED_ANCESTOR: &str = "SEA310";

    // Generic declarations.
    pub const TYPE_MEMBER_REDECLARATION: &str = "GEN400";
    pub const TYPE_MEMBER_KIND_MISMATCH: &str = "GEN401";
    pub const TYPE_MEMBER_VARIANCE_MISMATCH: &str = "GEN402";
    pub const INVALID_VARIANCE: &str = "VAR500";
}

#[must_use]
pub fn error(code: &'static str, message: impl Into<String>, span: Option<Span>) -> Diagnostic {
    let mut message = message.into();
    if !message.starts_with('[') {
        message = format!("[{code}] {message}");
    }
    Diagnostic::error(message, span)
        .with_code(DiagnosticCode::new(code.to_string(), Some("validate".into())))
}

#[must_use]
pub fn warning(code: &'static str, message: impl Into<String>, span: Option<Span>) -> Diagnostic {
    let mut message = message.into();
    if !message.starts_with('[') {
        message = format!("[{code}] {message}");
    }
    Diagnostic::warning(message, span)
        .with_code(DiagnosticCode::new(code.to_string(), Some("validate".into())))
}

#[must_use]
pub fn note(message: impl Into<String>, span: Option<Span>) -> Diagnostic {
    Diagnostic::note(message.into(), span)
}
