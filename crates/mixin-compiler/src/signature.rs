/// Declaration and forwarding-body text for resolved members

use crate::error::MixinError;
use crate::model::{Member, MemberKind};
use mixin_lexer::lex_str;
use mixin_parser::default_setter;

/// Receiver of a forwarded message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardTarget {
    /// Expression reaching the field, `self.mws` or `self->_helper`
    Instance(String),
    /// Class name, for class methods
    Class(String),
}

impl ForwardTarget {
    pub fn receiver(&self) -> &str {
        match self {
            ForwardTarget::Instance(expr) => expr,
            ForwardTarget::Class(name) => name,
        }
    }
}

fn sigil(kind: MemberKind) -> char {
    if kind.is_class_scoped() { '+' } else { '-' }
}

/// Fail for members whose calls cannot be spelled
pub fn ensure_forwardable(member: &Member) -> Result<(), MixinError> {
    if member.variadic {
        return Err(MixinError::unsupported(format!(
            "variadic method `{}` cannot be forwarded",
            member.name
        )));
    }
    Ok(())
}

/// Split a selector into one label per parameter
///
/// A selector without parameters has no labels; its name is used as is.
pub fn selector_labels(member: &Member) -> Result<Vec<&str>, MixinError> {
    let name = member.name.as_str();
    if member.params.is_empty() && !name.contains(':') {
        return Ok(Vec::new());
    }

    let labels: Vec<&str> = name.strip_suffix(':').unwrap_or(name).split(':').collect();
    if labels.len() != member.params.len() {
        return Err(MixinError::SelectorArityMismatch {
            selector: member.name.clone(),
            labels: labels.len(),
            params: member.params.len(),
        });
    }
    Ok(labels)
}

/// Method declaration without the trailing `;`, or the property
/// declaration for properties
pub fn build_signature(member: &Member) -> Result<String, MixinError> {
    if !member.kind.is_method() {
        return Ok(build_property_declaration(member, &member.name));
    }

    let labels = selector_labels(member)?;
    let mut signature = format!("{} ({})", sigil(member.kind), member.value_type);
    if labels.is_empty() {
        signature.push_str(&member.name);
    } else {
        let parts: Vec<String> = labels
            .iter()
            .zip(&member.params)
            .map(|(label, param)| format!("{}:({}){}", label, param.ty, param.name))
            .collect();
        signature.push_str(&parts.join(" "));
    }
    Ok(signature)
}

/// Message body: `reset` or `foo:x bar:y`
pub fn build_call_body(member: &Member) -> Result<String, MixinError> {
    let labels = selector_labels(member)?;
    if labels.is_empty() {
        return Ok(member.name.clone());
    }

    let parts: Vec<String> = labels
        .iter()
        .zip(&member.params)
        .map(|(label, param)| format!("{}:{}", label, param.name))
        .collect();
    Ok(parts.join(" "))
}

/// `void`, `oneway void`; not `void *` or a block returning void
fn returns_void(return_type: &str) -> bool {
    lex_str(return_type).last().is_some_and(|t| t.is_ident("void"))
}

fn body(signature: &str, statement: &str) -> String {
    format!("{}\n{{\n    {}\n}}\n", signature, statement)
}

/// Method definition forwarding to `target`
pub fn build_forwarding_definition(
    member: &Member,
    signature: &str,
    target: &ForwardTarget,
) -> Result<String, MixinError> {
    let call = format!("[{} {}];", target.receiver(), build_call_body(member)?);
    let statement = if returns_void(&member.value_type) {
        call
    } else {
        format!("return {}", call)
    };
    Ok(body(signature, &statement))
}

/// Original property declaration with its name replaced by `alias`
///
/// Text after the name is kept, so `void (^handler)(int)` stays a block.
pub fn build_property_declaration(member: &Member, alias: &str) -> String {
    let text = member.source_text.as_str();
    let name_end = member.name_offset + member.name.len();
    let prefix = text.get(..member.name_offset).unwrap_or_default();
    let suffix = text.get(name_end..).unwrap_or_default();
    format!("{}{}{}", prefix, alias, suffix)
}

/// Accessor definitions forwarding to `target`: the getter, then the
/// setter when the property has one
pub fn build_property_definitions(member: &Member, alias: &str, target: &ForwardTarget) -> Vec<String> {
    let sigil = sigil(member.kind);
    let receiver = target.receiver();
    let mut definitions = Vec::new();

    if let Some(getter) = &member.accessors.getter {
        let local = if *getter == member.name { alias } else { getter.as_str() };
        definitions.push(body(
            &format!("{} ({}){}", sigil, member.value_type, local),
            &format!("return [{} {}];", receiver, getter),
        ));
    }

    if let Some(setter) = &member.accessors.setter {
        let local = if *setter == default_setter(&member.name) {
            default_setter(alias)
        } else {
            setter.clone()
        };
        definitions.push(body(
            &format!("{} (void){}({})value", sigil, local, member.value_type),
            &format!("[{} {}value];", receiver, setter),
        ));
    }

    definitions
}
