pub mod ast;
pub mod ast_dump;
mod parser;

pub use ast::*;
pub use parser::{PROVIDE_TAG, ParseError, ParseOptions, parse_with};

/// Parse an Objective-C header (or implementation file) from a string
pub fn parse(input: &str) -> Result<TranslationUnit, ParseError> {
    parse_with(input, &ParseOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interface(unit: &TranslationUnit, index: usize) -> &InterfaceDecl {
        match &unit.items[index] {
            Item::Interface(decl) => decl,
            other => panic!("Expected Interface item, got {:?}", other),
        }
    }

    fn method(member: &MemberDecl) -> &MethodDecl {
        match member {
            MemberDecl::Method(m) => m,
            other => panic!("Expected method, got {:?}", other),
        }
    }

    fn property(member: &MemberDecl) -> &PropertyDecl {
        match member {
            MemberDecl::Property(p) => p,
            other => panic!("Expected property, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty() {
        let unit = parse("").expect("empty input parses");
        assert!(unit.items.is_empty());
    }

    #[test]
    fn test_parse_imports() {
        let unit = parse("#import \"Helper.h\"\n#import <Foundation/Foundation.h>\n").unwrap();
        assert_eq!(unit.items.len(), 2);
        match &unit.items[0] {
            Item::Import(import) => {
                assert_eq!(import.path, "Helper.h");
                assert!(!import.system);
            }
            other => panic!("Expected Import item, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_interface_header() {
        let unit = parse("@interface Helper : NSObject <Greeter, NSCopying>\n@end").unwrap();
        let decl = interface(&unit, 0);
        assert_eq!(decl.name, "Helper");
        assert_eq!(decl.superclass.as_deref(), Some("NSObject"));
        assert_eq!(decl.protocols, vec!["Greeter", "NSCopying"]);
        assert!(decl.generic_params.is_empty());
    }

    #[test]
    fn test_parse_root_class_and_generics() {
        let unit = parse(
            "@interface Root <Base>\n@end\n@interface Box<__covariant ObjectType> : Root\n@end",
        )
        .unwrap();
        let root = interface(&unit, 0);
        assert_eq!(root.superclass, None);
        assert_eq!(root.protocols, vec!["Base"]);

        let boxed = interface(&unit, 1);
        assert_eq!(boxed.generic_params, vec!["ObjectType"]);
        assert_eq!(boxed.superclass.as_deref(), Some("Root"));
    }

    #[test]
    fn test_parse_methods() {
        let input = r#"
@interface Helper : NSObject
- (instancetype)initWithName:(NSString*)name;
- (NSString*)invertName;
- (NSString*)concatenateWithPrefix:(NSString*)prefix
                            suffix:(NSString *)suffix NS_SWIFT_NAME(concat(prefix:suffix:));
+ (BOOL)isValid:(id)value;
- (void)log:(NSString*)format, ...;
@end
"#;
        let unit = parse(input).unwrap();
        let decl = interface(&unit, 0);
        assert_eq!(decl.members.len(), 5);

        let concat = method(&decl.members[2]);
        assert_eq!(concat.selector, "concatenateWithPrefix:suffix:");
        assert_eq!(concat.return_type, "NSString*");
        assert_eq!(concat.params.len(), 2);
        assert_eq!(concat.params[1].label, "suffix");
        assert_eq!(concat.params[1].ty, "NSString *");
        assert_eq!(concat.params[1].name, "suffix");
        assert!(!concat.text.contains("NS_SWIFT_NAME"));

        let invert = method(&decl.members[1]);
        assert_eq!(invert.selector, "invertName");
        assert!(invert.params.is_empty());

        let class_method = method(&decl.members[3]);
        assert!(class_method.is_class);

        let variadic = method(&decl.members[4]);
        assert!(variadic.variadic);
        assert_eq!(variadic.selector, "log:");
    }

    #[test]
    fn test_parse_properties() {
        let input = r#"
@interface Helper : NSObject
@property (readonly) NSNumber* length;
@property (nonatomic, getter=isEnabled, setter=setOn:) BOOL enabled;
@property (class, copy) NSString* sharedName;
@property NSURL* URL NS_REQUIRES_SUPER;
@property (copy) void (^completion)(int);
@end
"#;
        let unit = parse(input).unwrap();
        let decl = interface(&unit, 0);
        assert_eq!(decl.members.len(), 5);

        let length = property(&decl.members[0]);
        assert_eq!(length.name, "length");
        assert_eq!(length.ty, "NSNumber*");
        assert!(length.is_readonly());
        assert_eq!(length.text, "@property (readonly) NSNumber* length");
        assert_eq!(&length.text[..length.name_offset], "@property (readonly) NSNumber* ");
        assert_eq!(length.setter(), None);

        let enabled = property(&decl.members[1]);
        assert_eq!(enabled.getter(), "isEnabled");
        assert_eq!(enabled.setter().as_deref(), Some("setOn:"));

        assert!(property(&decl.members[2]).is_class());

        let url = property(&decl.members[3]);
        assert_eq!(url.name, "URL");
        assert_eq!(url.setter().as_deref(), Some("setURL:"));
        assert_eq!(url.text, "@property NSURL* URL");


        let completion = property(&decl.members[4]);
        assert_eq!(completion.name, "completion");
        assert_eq!(completion.ty, "void (^)(int)");
        assert_eq!(completion.text, "@property (copy) void (^completion)(int)");
        assert_eq!(&completion.text[..completion.name_offset], "@property (copy) void (^");
    }

    #[test]
    fn test_parse_provide_annotations() {
        let input = r#"
@interface User : NSObject
{
    NSDictionary* lookup PROVIDE(-objectForKey:);
}
@property (readonly) Helper* mws
    PROVIDE(@length   -concatenateWithPrefix:suffix:)
    PROVIDE(+sharedHelper)
    /* PROVIDE(-ignored) */;
@property Helper* other __attribute__((annotate("__provide__ -invertName"), annotate("unrelated")));
@end
"#;
        let unit = parse(input).unwrap();
        let decl = interface(&unit, 0);

        assert_eq!(decl.ivars.len(), 1);
        assert_eq!(decl.ivars[0].name, "lookup");
        assert_eq!(decl.ivars[0].ty, "NSDictionary*");
        assert_eq!(decl.ivars[0].annotations[0].value, "__provide__ -objectForKey:");

        let mws = property(&decl.members[0]);
        assert_eq!(mws.name, "mws");
        let values: Vec<_> = mws.annotations.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(
            values,
            vec![
                "__provide__ @length -concatenateWithPrefix:suffix:",
                "__provide__ +sharedHelper",
            ]
        );

        let other = property(&decl.members[1]);
        let values: Vec<_> = other.annotations.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(values, vec!["__provide__ -invertName", "unrelated"]);
    }

    #[test]
    fn test_parse_custom_annotation_macro() {
        let options = ParseOptions::default().annotation_macro("MIXIN");
        let unit = parse_with(
            "@interface User\n@property Helper* h MIXIN(-invertName);\n@end",
            &options,
        )
        .unwrap();
        let h = property(&interface(&unit, 0).members[0]);
        assert_eq!(h.annotations[0].value, "__provide__ -invertName");
    }

    #[test]
    fn test_parse_categories_and_extensions() {
        let input = r#"
@interface Helper (Extras) <Greeter>
- (void)extra;
@end
@interface Helper ()
@property int hidden;
@end
"#;
        let unit = parse(input).unwrap();
        match &unit.items[0] {
            Item::Category(category) => {
                assert_eq!(category.class_name, "Helper");
                assert_eq!(category.name, "Extras");
                assert_eq!(category.protocols, vec!["Greeter"]);
                assert_eq!(category.members.len(), 1);
            }
            other => panic!("Expected Category item, got {:?}", other),
        }
        match &unit.items[1] {
            Item::Category(category) => assert!(category.is_class_extension()),
            other => panic!("Expected Category item, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_protocols() {
        let input = r#"
@protocol Forward;
@protocol Greeter <Base, Other>
- (NSString*)greet;
@optional
@property (readonly) NSNumber* count;
@required
- (void)wave;
@end
"#;
        let unit = parse(input).unwrap();
        assert_eq!(unit.items.len(), 1);
        match &unit.items[0] {
            Item::Protocol(protocol) => {
                assert_eq!(protocol.name, "Greeter");
                assert_eq!(protocol.parents, vec!["Base", "Other"]);
                assert!(!method(&protocol.members[0]).optional);
                assert!(property(&protocol.members[1]).optional);
                assert!(!method(&protocol.members[2]).optional);
            }
            other => panic!("Expected Protocol item, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_implementation_ivars() {
        let input = r#"
@implementation User
{
    Helper* _helper PROVIDE(-invertName);
}
- (void)dealloc { NSLog(@"@end"); [super dealloc]; }
@end
"#;
        let unit = parse(input).unwrap();
        match &unit.items[0] {
            Item::Implementation(implementation) => {
                assert_eq!(implementation.class_name, "User");
                assert_eq!(implementation.ivars.len(), 1);
                assert_eq!(implementation.ivars[0].name, "_helper");
            }
            other => panic!("Expected Implementation item, got {:?}", other),
        }
    }

    #[test]
    fn test_skips_c_declarations() {
        let input = r#"
typedef struct { int a; int b; } SomeStruct;
extern NSString* const SomeKey;
@interface Helper : NSObject
@property SomeStruct value;
void helper_function(void);
@end
"#;
        let unit = parse(input).unwrap();
        assert_eq!(unit.items.len(), 1);
        assert_eq!(interface(&unit, 0).members.len(), 1);
    }

    #[test]
    fn test_missing_end_is_error() {
        let result = parse("@interface Helper : NSObject\n- (void)foo;\n");
        assert_eq!(
            result,
            Err(ParseError::UnexpectedEof {
                expected: "`@end`".to_string()
            })
        );
    }

    #[test]
    fn test_unexpected_token_reports_position() {
        match parse("@interface 42") {
            Err(ParseError::UnexpectedToken { found, line, column, .. }) => {
                assert_eq!(found, "42");
                assert_eq!((line, column), (1, 12));
            }
            other => panic!("Expected UnexpectedToken, got {:?}", other),
        }
    }
}
