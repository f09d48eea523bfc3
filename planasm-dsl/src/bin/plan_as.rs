//! Assemble planasm source into a JSON plan document.

use std::env;
use std::fs;
use std::process;

use planasm_dsl::assemble_source;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <source file>", args[0]);
        process::exit(1);
    }

    let source = match fs::read_to_string(&args[1]) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error reading {}: {}", args[1], err);
            process::exit(1);
        }
    };

    let plan = match assemble_source(&source) {
        Ok(plan) => plan,
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&plan) {
        Ok(text) => println!("{}", text),
        Err(err) => {
            eprintln!("Error serializing plan: {}", err);
            process::exit(1);
        }
    }
}
