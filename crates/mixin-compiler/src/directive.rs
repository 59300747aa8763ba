/// Provide directive parsing
///
/// An annotation payload is a whitespace separated list of tokens. Each
/// token is a sigil followed by a member name:
///
/// - `-selector` forwards an instance method
/// - `+selector` forwards a class method
/// - `@name` forwards a property

use crate::error::{InvalidDirectiveReason, MixinError};
use crate::model::MemberKind;
use std::fmt;

/// Which kind of member a directive names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    InstanceMethod,
    ClassMethod,
    Property,
}

impl DirectiveKind {
    pub fn from_sigil(sigil: char) -> Option<Self> {
        match sigil {
            '-' => Some(DirectiveKind::InstanceMethod),
            '+' => Some(DirectiveKind::ClassMethod),
            '@' => Some(DirectiveKind::Property),
            _ => None,
        }
    }

    pub fn sigil(self) -> char {
        match self {
            DirectiveKind::InstanceMethod => '-',
            DirectiveKind::ClassMethod => '+',
            DirectiveKind::Property => '@',
        }
    }

    /// Kind of member the resolver looks for
    pub fn member_kind(self) -> MemberKind {
        match self {
            DirectiveKind::InstanceMethod => MemberKind::InstanceMethod,
            DirectiveKind::ClassMethod => MemberKind::ClassMethod,
            DirectiveKind::Property => MemberKind::InstanceProperty,
        }
    }
}

/// One parsed directive token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvideDirective {
    pub kind: DirectiveKind,
    pub name: String,
}

impl ProvideDirective {
    pub fn new(kind: DirectiveKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Prints the token the directive was parsed from
impl fmt::Display for ProvideDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.sigil(), self.name)
    }
}

/// Parse a single directive token
pub fn parse_token(token: &str) -> Result<ProvideDirective, MixinError> {
    let invalid = |reason| MixinError::InvalidDirective {
        token: token.to_string(),
        reason,
    };

    let mut chars = token.chars();
    let kind = chars
        .next()
        .and_then(DirectiveKind::from_sigil)
        .ok_or_else(|| invalid(InvalidDirectiveReason::UnknownSigil))?;

    let name = chars.as_str();
    if name.is_empty() {
        return Err(invalid(InvalidDirectiveReason::EmptyName));
    }
    if name == "*" {
        return Err(invalid(InvalidDirectiveReason::Wildcard));
    }

    Ok(ProvideDirective::new(kind, name))
}

/// Parse every payload of an annotated member, in order
///
/// Empty tokens produced by repeated whitespace are dropped. All invalid
/// tokens are reported, not only the first.
pub fn parse_directives<'a>(
    payloads: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<ProvideDirective>, Vec<MixinError>> {
    let mut directives = Vec::new();
    let mut errors = Vec::new();

    for token in payloads.into_iter().flat_map(str::split_whitespace) {
        match parse_token(token) {
            Ok(directive) => directives.push(directive),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(directives)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_payload() {
        let directives = parse_directives(["-foo:bar: @baz +qux"]).unwrap();
        assert_eq!(
            directives,
            vec![
                ProvideDirective::new(DirectiveKind::InstanceMethod, "foo:bar:"),
                ProvideDirective::new(DirectiveKind::Property, "baz"),
                ProvideDirective::new(DirectiveKind::ClassMethod, "qux"),
            ]
        );
    }

    #[test]
    fn test_display_reproduces_token() {
        for token in ["-concatenateWithPrefix:suffix:", "@length", "+sharedInstance"] {
            assert_eq!(parse_token(token).unwrap().to_string(), token);
        }
    }

    #[test]
    fn test_repeated_whitespace_and_multiple_payloads() {
        let directives = parse_directives(["  @length\t\t-invertName  ", "", "-reset"]).unwrap();
        let names: Vec<_> = directives.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["length", "invertName", "reset"]);
    }

    #[test]
    fn test_empty_payload_is_no_directives() {
        assert!(parse_directives(["   "]).unwrap().is_empty());
        assert!(parse_directives(std::iter::empty()).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_tokens_all_reported() {
        let errors = parse_directives(["@length *nope - @*"]).unwrap_err();
        assert_eq!(
            errors,
            vec![
                MixinError::InvalidDirective {
                    token: "*nope".to_string(),
                    reason: InvalidDirectiveReason::UnknownSigil,
                },
                MixinError::InvalidDirective {
                    token: "-".to_string(),
                    reason: InvalidDirectiveReason::EmptyName,
                },
                MixinError::InvalidDirective {
                    token: "@*".to_string(),
                    reason: InvalidDirectiveReason::Wildcard,
                },
            ]
        );
    }

    #[test]
    fn test_property_directive_targets_instance_property() {
        assert_eq!(DirectiveKind::Property.member_kind(), MemberKind::InstanceProperty);
        assert_eq!(DirectiveKind::ClassMethod.member_kind(), MemberKind::ClassMethod);
    }
}
