/// Declaration tree dumping for testing and debugging

use crate::ast::*;
use std::fmt::Write as FmtWrite;

/// Dump a translation unit as a pretty-printed tree
pub fn dump_unit(unit: &TranslationUnit) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_unit(&mut out, unit);
    out
}

fn write_unit(out: &mut String, unit: &TranslationUnit) -> std::fmt::Result {
    writeln!(out, "TranslationUnit:")?;
    for item in &unit.items {
        write_item(out, item, 1)?;
    }
    Ok(())
}

fn write_item(out: &mut String, item: &Item, indent: usize) -> std::fmt::Result {
    let prefix = "  ".repeat(indent);
    match item {
        Item::Import(decl) => {
            let (open, close) = if decl.system { ('<', '>') } else { ('"', '"') };
            writeln!(out, "{}Import: {}{}{}", prefix, open, decl.path, close)?;
        }
        Item::Interface(decl) => {
            write!(out, "{}Interface: {}", prefix, decl.name)?;
            if !decl.generic_params.is_empty() {
                write!(out, "<{}>", decl.generic_params.join(", "))?;
            }
            if let Some(superclass) = &decl.superclass {
                write!(out, " : {}", superclass)?;
            }
            write_protocols(out, &decl.protocols)?;
            writeln!(out)?;
            write_ivars(out, &decl.ivars, indent + 1)?;
            write_members(out, &decl.members, indent + 1)?;
        }
        Item::Category(decl) => {
            write!(out, "{}Category: {} ({})", prefix, decl.class_name, decl.name)?;
            write_protocols(out, &decl.protocols)?;
            writeln!(out)?;
            write_ivars(out, &decl.ivars, indent + 1)?;
            write_members(out, &decl.members, indent + 1)?;
        }
        Item::Protocol(decl) => {
            write!(out, "{}Protocol: {}", prefix, decl.name)?;
            write_protocols(out, &decl.parents)?;
            writeln!(out)?;
            write_members(out, &decl.members, indent + 1)?;
        }
        Item::Implementation(decl) => {
            match &decl.category {
                Some(category) => writeln!(out, "{}Implementation: {} ({})", prefix, decl.class_name, category)?,
                None => writeln!(out, "{}Implementation: {}", prefix, decl.class_name)?,
            }
            write_ivars(out, &decl.ivars, indent + 1)?;
        }
    }
    Ok(())
}

fn write_protocols(out: &mut String, protocols: &[String]) -> std::fmt::Result {
    if !protocols.is_empty() {
        write!(out, " <{}>", protocols.join(", "))?;
    }
    Ok(())
}

fn write_ivars(out: &mut String, ivars: &[IvarDecl], indent: usize) -> std::fmt::Result {
    let prefix = "  ".repeat(indent);
    for ivar in ivars {
        writeln!(out, "{}Ivar: {} {}", prefix, ivar.ty, ivar.name)?;
        write_annotations(out, &ivar.annotations, indent + 1)?;
    }
    Ok(())
}

fn write_members(out: &mut String, members: &[MemberDecl], indent: usize) -> std::fmt::Result {
    let prefix = "  ".repeat(indent);
    for member in members {
        match member {
            MemberDecl::Method(method) => {
                let sigil = if method.is_class { '+' } else { '-' };
                write!(out, "{}Method: {}({}){}", prefix, sigil, method.return_type, method.selector)?;
                if method.variadic {
                    write!(out, " [variadic]")?;
                }
                if method.optional {
                    write!(out, " [optional]")?;
                }
                writeln!(out)?;
                for param in &method.params {
                    writeln!(out, "{}  Param: {}:({}){}", prefix, param.label, param.ty, param.name)?;
                }
            }
            MemberDecl::Property(property) => {
                write!(out, "{}Property: {} {}", prefix, property.ty, property.name)?;
                if property.is_class() {
                    write!(out, " [class]")?;
                }
                if property.is_readonly() {
                    write!(out, " [readonly]")?;
                }
                if property.optional {
                    write!(out, " [optional]")?;
                }
                writeln!(out)?;
                write_annotations(out, &property.annotations, indent + 1)?;
            }
        }
    }
    Ok(())
}

fn write_annotations(out: &mut String, annotations: &[Annotation], indent: usize) -> std::fmt::Result {
    let prefix = "  ".repeat(indent);
    for annotation in annotations {
        writeln!(out, "{}Annotation: {:?}", prefix, annotation.value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn test_dump_interface() {
        let unit = parse(
            "#import \"Helper.h\"\n@interface User : NSObject <Greeter>\n@property (readonly) Helper* helper PROVIDE(-invertName);\n+ (id)make:(int)count;\n@end",
        )
        .unwrap();

        let dump = dump_unit(&unit);
        let expected = "\
TranslationUnit:
  Import: \"Helper.h\"
  Interface: User : NSObject <Greeter>
    Property: Helper* helper [readonly]
      Annotation: \"__provide__ -invertName\"
    Method: +(id)make:
      Param: make:(int)count
";
        assert_eq!(dump, expected);
    }
}
