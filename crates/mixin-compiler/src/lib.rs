/// Mixin compiler
///
/// Reads Objective-C headers whose properties and ivars carry provide
/// annotations and generates categories that forward the named methods and
/// properties to those fields.

pub mod compose;
pub mod directive;
pub mod driver;
pub mod error;
pub mod headers;
pub mod index;
pub mod manifest;
pub mod model;
pub mod resolve;
pub mod signature;

pub use compose::{ExtensionBuilder, ExtensionComposer, GeneratedExtension, extension_identifier};
pub use directive::{DirectiveKind, ProvideDirective, parse_directives};
pub use driver::{CompileOptions, CompileOutput, Compiler};
pub use error::{CompileError, InvalidDirectiveReason, MixinError, Result};
pub use headers::{Header, HeaderResolver};
pub use index::{DeclarationIndex, annotated_members};
pub use manifest::{ExtensionEntry, MixinManifest};
pub use model::{
    Accessors, AnnotatedMember, ContractId, ExtensionBlock, FieldKind, Member, MemberKind,
    ObjectTypeRef, Param, SourceModel, TypeId,
};
pub use resolve::{MemberResolver, Origin, Resolved};
pub use signature::{
    ForwardTarget, build_call_body, build_forwarding_definition, build_property_declaration,
    build_property_definitions, build_signature, selector_labels,
};
