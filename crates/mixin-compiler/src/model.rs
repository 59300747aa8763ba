/// Declaration model the engine resolves against
///
/// The engine never reads source itself. It asks a [`SourceModel`] for the
/// members, categories, protocols and superclass of a type. The model is
/// fully built before the first lookup and is read-only afterwards.

use crate::error::MixinError;
use mixin_lexer::{TokenKind, lex_str};
use mixin_parser::{MethodDecl, PropertyDecl, default_setter};
use std::fmt;

/// Handle of a class in a [`SourceModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) usize);

/// Handle of a protocol in a [`SourceModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContractId(pub(crate) usize);

/// Kind of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    InstanceMethod,
    ClassMethod,
    InstanceProperty,
    ClassProperty,
}

impl MemberKind {
    pub fn is_method(self) -> bool {
        matches!(self, MemberKind::InstanceMethod | MemberKind::ClassMethod)
    }

    /// Dispatched on the class rather than an instance
    pub fn is_class_scoped(self) -> bool {
        matches!(self, MemberKind::ClassMethod | MemberKind::ClassProperty)
    }

    pub fn label(self) -> &'static str {
        match self {
            MemberKind::InstanceMethod => "instance method",
            MemberKind::ClassMethod => "class method",
            MemberKind::InstanceProperty => "property",
            MemberKind::ClassProperty => "class property",
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One labeled method parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub label: String,
    pub ty: String,
    pub name: String,
}

/// Accessor selectors of a property; `None` when the accessor does not exist
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Accessors {
    pub getter: Option<String>,
    pub setter: Option<String>,
}

/// A method or property of a class or protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub kind: MemberKind,
    /// Full selector for methods, identifier for properties
    pub name: String,
    pub params: Vec<Param>,
    /// Return type for methods, value type for properties
    pub value_type: String,
    /// Verbatim declaration text
    pub source_text: String,
    /// Offset of the property name inside `source_text`
    pub name_offset: usize,
    pub accessors: Accessors,
    pub variadic: bool,
}

impl Member {
    /// A method without parameters; add them with [`Member::param`]
    pub fn method(kind: MemberKind, name: &str, return_type: &str) -> Self {
        let sigil = if kind.is_class_scoped() { '+' } else { '-' };
        Self {
            kind,
            name: name.to_string(),
            params: Vec::new(),
            value_type: return_type.to_string(),
            source_text: format!("{} ({}){}", sigil, return_type, name),
            name_offset: 0,
            accessors: Accessors::default(),
            variadic: false,
        }
    }

    pub fn param(mut self, label: &str, ty: &str, name: &str) -> Self {
        self.params.push(Param {
            label: label.to_string(),
            ty: ty.to_string(),
            name: name.to_string(),
        });
        self
    }

    /// A readwrite instance property
    pub fn property(name: &str, value_type: &str) -> Self {
        let prefix = format!("@property {} ", value_type);
        Self {
            kind: MemberKind::InstanceProperty,
            name: name.to_string(),
            params: Vec::new(),
            value_type: value_type.to_string(),
            source_text: format!("{}{}", prefix, name),
            name_offset: prefix.len(),
            accessors: Accessors {
                getter: Some(name.to_string()),
                setter: Some(default_setter(name)),
            },
            variadic: false,
        }
    }

    /// Drop the setter and mark the declaration `readonly`
    pub fn readonly(mut self) -> Self {
        let prefix = format!("@property (readonly) {} ", self.value_type);
        self.source_text = format!("{}{}", prefix, self.name);
        self.name_offset = prefix.len();
        self.accessors.setter = None;
        self
    }
}

impl From<&MethodDecl> for Member {
    fn from(decl: &MethodDecl) -> Self {
        Self {
            kind: if decl.is_class {
                MemberKind::ClassMethod
            } else {
                MemberKind::InstanceMethod
            },
            name: decl.selector.clone(),
            params: decl
                .params
                .iter()
                .map(|p| Param {
                    label: p.label.clone(),
                    ty: p.ty.clone(),
                    name: p.name.clone(),
                })
                .collect(),
            value_type: decl.return_type.clone(),
            source_text: decl.text.clone(),
            name_offset: 0,
            accessors: Accessors::default(),
            variadic: decl.variadic,
        }
    }
}

impl From<&PropertyDecl> for Member {
    fn from(decl: &PropertyDecl) -> Self {
        Self {
            kind: if decl.is_class() {
                MemberKind::ClassProperty
            } else {
                MemberKind::InstanceProperty
            },
            name: decl.name.clone(),
            params: Vec::new(),
            value_type: decl.ty.clone(),
            source_text: decl.text.clone(),
            name_offset: decl.name_offset,
            accessors: Accessors {
                getter: Some(decl.getter()),
                setter: decl.setter(),
            },
            variadic: false,
        }
    }
}

/// A named category or class extension attached to a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionBlock {
    /// Empty for a class extension
    pub name: String,
    pub members: Vec<Member>,
}

/// Read-only queries over a fully populated declaration graph
pub trait SourceModel {
    fn lookup_type(&self, name: &str) -> Option<TypeId>;

    fn lookup_contract(&self, name: &str) -> Option<ContractId>;

    fn type_name(&self, ty: TypeId) -> &str;

    fn contract_name(&self, contract: ContractId) -> &str;

    /// Members of the primary `@interface`
    fn own_members(&self, ty: TypeId) -> &[Member];

    /// Categories and class extensions in declaration order
    fn extensions(&self, ty: TypeId) -> &[ExtensionBlock];

    /// Protocols the class adopts, in declaration order
    fn conformed_contracts(&self, ty: TypeId) -> &[ContractId];

    fn contract_members(&self, contract: ContractId) -> &[Member];

    fn parent_contracts(&self, contract: ContractId) -> &[ContractId];

    /// `None` for a root class or a superclass outside the model
    fn superclass(&self, ty: TypeId) -> Option<TypeId>;

    /// Declared with lightweight generic parameters
    fn is_parameterized(&self, ty: TypeId) -> bool;
}

/// Whether the annotated field is a property or an instance variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Property,
    Ivar,
}

impl FieldKind {
    pub fn label(self) -> &'static str {
        match self {
            FieldKind::Property => "property",
            FieldKind::Ivar => "ivar",
        }
    }
}

/// A property or ivar carrying provide annotations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedMember {
    /// Class that declares the field and receives the generated category
    pub owner: String,
    pub name: String,
    pub field_kind: FieldKind,
    /// Type spelling as written, e.g. `Helper*`
    pub declared_type: String,
    /// Annotation payloads with the provide tag removed, in attribute order
    pub payloads: Vec<String>,
}

impl AnnotatedMember {
    /// Receiver expression used by instance forwarding bodies
    pub fn forward_target(&self) -> String {
        match self.field_kind {
            FieldKind::Property => format!("self.{}", self.name),
            FieldKind::Ivar => format!("self->{}", self.name),
        }
    }
}

const TYPE_QUALIFIERS: &[&str] = &[
    "const",
    "volatile",
    "__kindof",
    "__strong",
    "__weak",
    "__unsafe_unretained",
    "__autoreleasing",
    "_Nonnull",
    "_Nullable",
    "_Null_unspecified",
    "__nullable",
    "__nonnull",
    "__null_unspecified",
    "nonnull",
    "nullable",
    "null_unspecified",
];

/// A field type spelled as an object pointer: `Name<P1, P2> *`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectTypeRef {
    pub class_name: String,
    /// Protocols qualifying the pointer
    pub qualifiers: Vec<String>,
}

impl ObjectTypeRef {
    pub fn parse(spelling: &str) -> Result<Self, MixinError> {
        let tokens: Vec<_> = lex_str(spelling)
            .filter(|t| !(t.kind == TokenKind::Ident && TYPE_QUALIFIERS.contains(&t.text)))
            .collect();

        let not_object = || {
            MixinError::malformed(format!("`{}` is not an object pointer type", spelling))
        };

        let (head, rest) = tokens.split_first().ok_or_else(not_object)?;
        if head.is_ident("id") {
            return Err(MixinError::unsupported(format!(
                "`{}` has no declared class to forward to",
                spelling
            )));
        }

        let (last, middle) = rest.split_last().ok_or_else(not_object)?;
        if head.kind != TokenKind::Ident || last.kind != TokenKind::Star {
            return Err(not_object());
        }

        let mut qualifiers = Vec::new();
        if let Some((open, inner)) = middle.split_first() {
            let Some((close, inner)) = inner.split_last() else {
                return Err(not_object());
            };
            if open.kind != TokenKind::Lt || close.kind != TokenKind::Gt {
                return Err(not_object());
            }

            for token in inner {
                match token.kind {
                    TokenKind::Ident => qualifiers.push(token.text.to_string()),
                    TokenKind::Comma => {}
                    _ => {
                        return Err(MixinError::unsupported(format!(
                            "parameterized type `{}` cannot be forwarded",
                            spelling
                        )));
                    }
                }
            }
        }

        Ok(Self {
            class_name: head.text.to_string(),
            qualifiers,
        })
    }
}
