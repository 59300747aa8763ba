use mixin_lexer::{LineIndex, lex_with_trivia};
use std::env;
use std::fs;
use std::io::{self, Read};

fn main() {
    let args: Vec<String> = env::args().collect();

    let input = if args.len() > 1 {
        // Read from file
        let filename = &args[1];
        fs::read_to_string(filename).unwrap_or_else(|e| {
            eprintln!("Error reading file '{}': {}", filename, e);
            std::process::exit(1);
        })
    } else {
        // Read from stdin
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).unwrap_or_else(|e| {
            eprintln!("Error reading stdin: {}", e);
            std::process::exit(1);
        });
        buffer
    };

    let lines = LineIndex::new(&input);

    for token in lex_with_trivia(&input) {
        let (start_line, start_col) = lines.line_col(token.span.start);
        let (end_line, end_col) = lines.line_col(token.span.end);
        println!(
            "{:?} @ {}:{}-{}:{} = {:?}",
            token.kind, start_line, start_col, end_line, end_col, token.text
        );
    }
}
