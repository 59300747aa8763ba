/// Category generation for annotated members
///
/// Each annotated property or ivar yields at most one category on its
/// owning class. The category redeclares every member the directives name
/// and forwards each of them to the field.

use crate::directive::{DirectiveKind, ProvideDirective, parse_directives};
use crate::error::{CompileError, MixinError, Result};
use crate::model::{AnnotatedMember, ContractId, FieldKind, ObjectTypeRef, SourceModel, TypeId};
use crate::resolve::MemberResolver;
use crate::signature::{
    ForwardTarget, build_forwarding_definition, build_property_declaration,
    build_property_definitions, build_signature, ensure_forwardable,
};
use tracing::{debug, warn};

/// A finished category: interface text and implementation text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedExtension {
    pub owner: String,
    pub source_type: String,
    pub member: String,
    pub identifier: String,
    pub declaration: String,
    pub definition: String,
}

/// Category name for `member` forwarding to `source_type`
pub fn extension_identifier(field_kind: FieldKind, member: &str, source_type: &str) -> String {
    format!("mixin_{}_{}_{}", field_kind.label(), member, source_type)
}

/// Accumulates one category; only a closed builder yields output
pub struct ExtensionBuilder {
    owner: String,
    source_type: String,
    member: String,
    identifier: String,
    declaration: String,
    definition: String,
}

impl ExtensionBuilder {
    pub fn open(owner: &str, identifier: &str, source_type: &str, member: &str) -> Self {
        Self {
            owner: owner.to_string(),
            source_type: source_type.to_string(),
            member: member.to_string(),
            identifier: identifier.to_string(),
            declaration: format!("@interface {} ({})\n\n", owner, identifier),
            definition: format!("@implementation {} ({})\n\n", owner, identifier),
        }
    }

    pub fn push_declaration(&mut self, declaration: &str) {
        self.declaration.push_str(declaration);
        self.declaration.push_str(";\n\n");
    }

    pub fn push_definition(&mut self, definition: &str) {
        self.definition.push_str(definition);
        self.definition.push('\n');
    }

    pub fn close(mut self) -> GeneratedExtension {
        self.declaration.push_str("@end\n");
        self.definition.push_str("@end\n");
        GeneratedExtension {
            owner: self.owner,
            source_type: self.source_type,
            member: self.member,
            identifier: self.identifier,
            declaration: self.declaration,
            definition: self.definition,
        }
    }
}

/// Field type of an annotated member, resolved in the model
struct SourceType {
    id: TypeId,
    name: String,
    qualifiers: Vec<ContractId>,
}

pub struct ExtensionComposer<'m, M: SourceModel + ?Sized> {
    model: &'m M,
    resolver: MemberResolver<'m, M>,
}

impl<'m, M: SourceModel + ?Sized> ExtensionComposer<'m, M> {
    pub fn new(model: &'m M) -> Self {
        Self {
            model,
            resolver: MemberResolver::new(model),
        }
    }

    /// Generate the category for one annotated member
    ///
    /// Returns `Ok(None)` when the annotations hold no directives. Any
    /// failing directive fails the whole member and nothing is emitted for
    /// it; every failure is reported.
    pub fn compose(&self, annotated: &AnnotatedMember) -> Result<Option<GeneratedExtension>> {
        let fail = |error: MixinError| CompileError::mixin(&annotated.owner, &annotated.name, error);

        let directives = parse_directives(annotated.payloads.iter().map(String::as_str))
            .map_err(|errors| CompileError::from_many(errors.into_iter().map(|e| fail(e)).collect()))?;
        if directives.is_empty() {
            debug!(owner = %annotated.owner, member = %annotated.name, "no directives");
            return Ok(None);
        }

        if self.model.lookup_type(&annotated.owner).is_none() {
            return Err(fail(MixinError::malformed(format!(
                "owning class `{}` is not declared",
                annotated.owner
            ))));
        }
        let source = self.source_type(annotated).map_err(|e| fail(e))?;

        let identifier = extension_identifier(annotated.field_kind, &annotated.name, &source.name);
        let mut builder = ExtensionBuilder::open(&annotated.owner, &identifier, &source.name, &annotated.name);
        let mut errors = Vec::new();

        for directive in &directives {
            if let Err(e) = self.emit(&mut builder, directive, &source, annotated) {
                errors.push(fail(e));
            }
        }

        if !errors.is_empty() {
            return Err(CompileError::from_many(errors));
        }

        debug!(owner = %annotated.owner, %identifier, directives = directives.len(), "composed category");
        Ok(Some(builder.close()))
    }

    fn source_type(&self, annotated: &AnnotatedMember) -> std::result::Result<SourceType, MixinError> {
        let reference = ObjectTypeRef::parse(&annotated.declared_type)?;

        let id = self.model.lookup_type(&reference.class_name).ok_or_else(|| {
            MixinError::malformed(format!(
                "field type `{}` is not a declared class",
                reference.class_name
            ))
        })?;
        if self.model.is_parameterized(id) {
            return Err(MixinError::unsupported(format!(
                "`{}` is a parameterized class",
                reference.class_name
            )));
        }

        let qualifiers = reference
            .qualifiers
            .iter()
            .filter_map(|name| {
                let contract = self.model.lookup_contract(name);
                if contract.is_none() {
                    warn!(protocol = %name, member = %annotated.name, "qualifying protocol is not declared");
                }
                contract
            })
            .collect();

        Ok(SourceType {
            id,
            name: reference.class_name,
            qualifiers,
        })
    }

    fn emit(
        &self,
        builder: &mut ExtensionBuilder,
        directive: &ProvideDirective,
        source: &SourceType,
        annotated: &AnnotatedMember,
    ) -> std::result::Result<(), MixinError> {
        let kind = directive.kind.member_kind();
        let resolved = self
            .resolver
            .resolve_qualified(source.id, &source.qualifiers, kind, &directive.name)
            .ok_or_else(|| MixinError::MemberNotFound {
                directive: directive.to_string(),
                kind_label: kind.label().to_string(),
                name: directive.name.clone(),
                source_type: source.name.clone(),
            })?;
        let member = resolved.member;

        match directive.kind {
            DirectiveKind::InstanceMethod | DirectiveKind::ClassMethod => {
                ensure_forwardable(member)?;
                let target = if kind.is_class_scoped() {
                    ForwardTarget::Class(source.name.clone())
                } else {
                    ForwardTarget::Instance(annotated.forward_target())
                };
                let signature = build_signature(member)?;
                let definition = build_forwarding_definition(member, &signature, &target)?;
                builder.push_declaration(&signature);
                builder.push_definition(&definition);
            }
            DirectiveKind::Property => {
                let target = ForwardTarget::Instance(annotated.forward_target());
                builder.push_declaration(&build_property_declaration(member, &directive.name));
                for definition in build_property_definitions(member, &directive.name, &target) {
                    builder.push_definition(&definition);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{DeclarationIndex, annotated_members};
    use mixin_parser::parse;

    const HELPER: &str = r#"
@protocol Concatenating
- (NSString*)concatenateWithPrefix:(NSString*)prefix suffix:(NSString*)suffix;
@end

@interface Helper : NSObject <Concatenating>
@property (readonly) NSNumber* length;
- (NSString*)invertName;
- (void)reset;
+ (instancetype)shared;
@end
"#;

    fn compose_one(user: &str) -> Result<Option<GeneratedExtension>> {
        let helper = parse(HELPER).unwrap();
        let user = parse(user).unwrap();
        let index = DeclarationIndex::build([&helper, &user]);
        let annotated = annotated_members(&user);
        ExtensionComposer::new(&index).compose(&annotated[0])
    }

    #[test]
    fn test_builder_wraps_members() {
        let mut builder = ExtensionBuilder::open("User", "mixin_property_mws_Helper", "Helper", "mws");
        builder.push_declaration("- (void)reset");
        builder.push_definition("- (void)reset\n{\n    [self.mws reset];\n}\n");
        let extension = builder.close();

        assert_eq!(
            extension.declaration,
            "@interface User (mixin_property_mws_Helper)\n\n- (void)reset;\n\n@end\n"
        );
        assert_eq!(
            extension.definition,
            "@implementation User (mixin_property_mws_Helper)\n\n- (void)reset\n{\n    [self.mws reset];\n}\n\n@end\n"
        );
    }

    #[test]
    fn test_compose_property_methods_and_protocol_member() {
        let extension = compose_one(
            r#"
@interface User : NSObject
@property Helper* mws PROVIDE(@length -invertName -concatenateWithPrefix:suffix:);
@end
"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(extension.identifier, "mixin_property_mws_Helper");
        assert_eq!(
            extension.declaration,
            "@interface User (mixin_property_mws_Helper)\n\n\
             @property (readonly) NSNumber* length;\n\n\
             - (NSString*)invertName;\n\n\
             - (NSString*)concatenateWithPrefix:(NSString*)prefix suffix:(NSString*)suffix;\n\n\
             @end\n"
        );
        assert!(extension.definition.contains("return [self.mws length];"));
        assert!(!extension.definition.contains("setLength:"));
        assert!(extension.definition.contains("return [self.mws invertName];"));
        assert!(extension.definition.contains("return [self.mws concatenateWithPrefix:prefix suffix:suffix];"));
    }

    #[test]
    fn test_compose_ivar_and_class_method() {
        let extension = compose_one(
            r#"
@interface User : NSObject {
    Helper* _helper PROVIDE(-reset +shared);
}
@end
"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(extension.identifier, "mixin_ivar__helper_Helper");
        assert!(extension.definition.contains("    [self->_helper reset];\n"));
        assert!(extension.definition.contains("    return [Helper shared];\n"));
    }

    #[test]
    fn test_empty_annotation_is_noop() {
        let result = compose_one(
            r#"
@interface User : NSObject
@property Helper* mws PROVIDE();
@end
"#,
        );
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_missing_member_fails_whole_member() {
        let error = compose_one(
            r#"
@interface User : NSObject
@property Helper* mws PROVIDE(-invertName -missing @absent);
@end
"#,
        )
        .unwrap_err();

        let CompileError::Multiple(errors) = error else {
            panic!("expected two failures, got {error:?}");
        };
        assert_eq!(errors.len(), 2);
        assert!(errors[0].to_string().contains("directive `-missing`"));
        assert!(errors[1].to_string().contains("property `absent`"));
    }

    #[test]
    fn test_invalid_directive_fails_before_resolution() {
        let error = compose_one(
            r#"
@interface User : NSObject
@property Helper* mws PROVIDE(-*);
@end
"#,
        )
        .unwrap_err();
        assert!(matches!(
            error.mixin_error(),
            Some(MixinError::InvalidDirective { .. })
        ));
    }

    #[test]
    fn test_field_type_preconditions() {
        let undeclared = compose_one(
            r#"
@interface User : NSObject
@property Stranger* s PROVIDE(-reset);
@end
"#,
        )
        .unwrap_err();
        assert!(matches!(
            undeclared.mixin_error(),
            Some(MixinError::MalformedDeclaration { .. })
        ));

        let scalar = compose_one(
            r#"
@interface User : NSObject
@property int count PROVIDE(-reset);
@end
"#,
        )
        .unwrap_err();
        assert!(matches!(
            scalar.mixin_error(),
            Some(MixinError::MalformedDeclaration { .. })
        ));
    }
}
