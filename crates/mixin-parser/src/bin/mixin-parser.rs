use mixin_parser::{ast_dump::dump_unit, parse};
use std::env;
use std::fs;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <file.h>", args[0]);
        eprintln!();
        eprintln!("Parse an Objective-C header and dump its declarations");
        process::exit(1);
    }

    let filename = &args[1];

    let input = match fs::read_to_string(filename) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", filename, e);
            process::exit(1);
        }
    };

    let unit = match parse(&input) {
        Ok(unit) => unit,
        Err(e) => {
            eprintln!("Parse error in '{}': {}", filename, e);
            process::exit(1);
        }
    };

    print!("{}", dump_unit(&unit));
}
