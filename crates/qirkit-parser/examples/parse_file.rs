use qirkit_emit::print_module;
use qirkit_parser::parse_file;
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <file.ll>", args[0]);
        std::process::exit(1);
    }

    let filename = &args[1];

    match parse_file(filename) {
        Ok(module) => match print_module(&module) {
            Ok(text) => print!("{}", text),
            Err(e) => {
                eprintln!("Failed to print {}: {}", filename, e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Parse error in {}: {}", filename, e);
            std::process::exit(1);
        }
    }
}
