/// Declaration tree for Objective-C headers
///
/// Only declarations are modelled. Method bodies, C declarations and
/// everything else the parser does not need are skipped while parsing.

use std::ops::Range;

/// Byte range into the parsed source
pub type Span = Range<usize>;

/// A parsed header or implementation file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranslationUnit {
    pub items: Vec<Item>,
}

impl TranslationUnit {
    pub fn imports(&self) -> impl Iterator<Item = &ImportDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Import(import) => Some(import),
            _ => None,
        })
    }
}

/// Top-level item
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Import(ImportDecl),
    Interface(InterfaceDecl),
    Category(CategoryDecl),
    Protocol(ProtocolDecl),
    Implementation(ImplementationDecl),
}

/// `#import "Foo.h"` or `#include <Foundation/Foundation.h>`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub path: String,
    /// Angle-bracket import, resolved against system headers
    pub system: bool,
    pub span: Span,
}

/// Primary `@interface Name<Generics> : Super <Protocols>`
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDecl {
    pub name: String,
    /// Lightweight generic parameters (`@interface Box<ObjectType>`)
    pub generic_params: Vec<String>,
    pub superclass: Option<String>,
    pub protocols: Vec<String>,
    pub ivars: Vec<IvarDecl>,
    pub members: Vec<MemberDecl>,
    pub span: Span,
}

/// `@interface Name (Category)`; an empty name is a class extension
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDecl {
    pub class_name: String,
    pub name: String,
    pub protocols: Vec<String>,
    pub ivars: Vec<IvarDecl>,
    pub members: Vec<MemberDecl>,
    pub span: Span,
}

impl CategoryDecl {
    pub fn is_class_extension(&self) -> bool {
        self.name.is_empty()
    }
}

/// `@protocol Name <Parents> ... @end`
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolDecl {
    pub name: String,
    pub parents: Vec<String>,
    pub members: Vec<MemberDecl>,
    pub span: Span,
}

/// `@implementation Name` with its optional ivar block; bodies are skipped
#[derive(Debug, Clone, PartialEq)]
pub struct ImplementationDecl {
    pub class_name: String,
    pub category: Option<String>,
    pub ivars: Vec<IvarDecl>,
    pub span: Span,
}

/// Member declared inside an interface, category or protocol
#[derive(Debug, Clone, PartialEq)]
pub enum MemberDecl {
    Method(MethodDecl),
    Property(PropertyDecl),
}

impl MemberDecl {
    pub fn name(&self) -> &str {
        match self {
            MemberDecl::Method(m) => &m.selector,
            MemberDecl::Property(p) => &p.name,
        }
    }
}

/// `- (Ret)label:(Type)name label2:(Type)name2;`
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub is_class: bool,
    pub return_type: String,
    /// Full selector, e.g. `concatenateWithPrefix:suffix:`
    pub selector: String,
    pub params: Vec<ParamDecl>,
    pub variadic: bool,
    /// Declared under `@optional` in a protocol
    pub optional: bool,
    /// Verbatim declaration text, trailing attributes excluded
    pub text: String,
    pub span: Span,
}

/// One labeled method parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub label: String,
    pub ty: String,
    pub name: String,
}

/// `@property (attrs) Type name ANNOTATIONS;`
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub attributes: Vec<PropertyAttribute>,
    pub ty: String,
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub optional: bool,
    /// Verbatim text from `@property` to the end of the declarator,
    /// annotations excluded
    pub text: String,
    /// Offset of the name inside `text`
    pub name_offset: usize,
    pub span: Span,
}

impl PropertyDecl {
    pub fn is_class(&self) -> bool {
        self.attributes.contains(&PropertyAttribute::Class)
    }

    pub fn is_readonly(&self) -> bool {
        self.attributes.contains(&PropertyAttribute::Readonly)
    }

    pub fn getter(&self) -> String {
        self.attributes
            .iter()
            .find_map(|attr| match attr {
                PropertyAttribute::Getter(name) => Some(name.clone()),
                _ => None,
            })
            .unwrap_or_else(|| self.name.clone())
    }

    pub fn setter(&self) -> Option<String> {
        if self.is_readonly() {
            return None;
        }

        let custom = self.attributes.iter().find_map(|attr| match attr {
            PropertyAttribute::Setter(name) => Some(name.clone()),
            _ => None,
        });

        Some(custom.unwrap_or_else(|| default_setter(&self.name)))
    }
}

/// `setFoo:` for a property named `foo`
pub fn default_setter(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("set{}{}:", first.to_uppercase(), chars.as_str()),
        None => "set:".to_string(),
    }
}

/// Entry of a property attribute list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyAttribute {
    Readonly,
    Readwrite,
    Class,
    Getter(String),
    Setter(String),
    Other(String),
}

/// Instance variable in an ivar block
#[derive(Debug, Clone, PartialEq)]
pub struct IvarDecl {
    pub ty: String,
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub span: Span,
}

/// Payload of an `annotate("...")` attribute, or of the annotation macro
/// stringized the way the preprocessor would
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub value: String,
    pub span: Span,
}
