/// Error types for the mixin compiler

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompileError>;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {file}: {message}")]
    Parse { file: PathBuf, message: String },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Header not found: \"{include}\" imported from {from}")]
    IncludeNotFound { include: String, from: PathBuf },

    #[error("{owner}.{member}: {error}")]
    Mixin {
        owner: String,
        member: String,
        #[source]
        error: MixinError,
    },

    #[error("Multiple errors occurred:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Multiple(Vec<CompileError>),

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("Manifest serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CompileError {
    pub fn parse(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        CompileError::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn mixin(owner: impl Into<String>, member: impl Into<String>, error: MixinError) -> Self {
        CompileError::Mixin {
            owner: owner.into(),
            member: member.into(),
            error,
        }
    }

    /// Collapse a list of errors, unwrapping a single one
    pub fn from_many(mut errors: Vec<CompileError>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            CompileError::Multiple(errors)
        }
    }

    /// The per-member failure, if this error carries one
    pub fn mixin_error(&self) -> Option<&MixinError> {
        match self {
            CompileError::Mixin { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Failures that abort generation for one annotated member
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MixinError {
    #[error("invalid directive `{token}`: {reason}")]
    InvalidDirective {
        token: String,
        reason: InvalidDirectiveReason,
    },

    #[error("directive `{directive}`: {kind_label} `{name}` is not declared anywhere in the hierarchy of `{source_type}`")]
    MemberNotFound {
        directive: String,
        kind_label: String,
        name: String,
        source_type: String,
    },

    #[error("malformed declaration: {reason}")]
    MalformedDeclaration { reason: String },

    #[error("selector `{selector}` has {labels} label(s) but {params} parameter(s)")]
    SelectorArityMismatch {
        selector: String,
        labels: usize,
        params: usize,
    },

    #[error("unsupported: {reason}")]
    Unsupported { reason: String },
}

impl MixinError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        MixinError::MalformedDeclaration {
            reason: reason.into(),
        }
    }

    pub fn unsupported(reason: impl Into<String>) -> Self {
        MixinError::Unsupported {
            reason: reason.into(),
        }
    }
}

/// Why a directive token was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidDirectiveReason {
    /// First character is not `-`, `+` or `@`
    UnknownSigil,
    /// Sigil without a name
    EmptyName,
    /// `@*`, `-*`, `+*`
    Wildcard,
}

impl std::fmt::Display for InvalidDirectiveReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            InvalidDirectiveReason::UnknownSigil => "expected a `-`, `+` or `@` sigil",
            InvalidDirectiveReason::EmptyName => "missing member name after the sigil",
            InvalidDirectiveReason::Wildcard => "wildcard directives are not supported",
        };
        f.write_str(text)
    }
}
