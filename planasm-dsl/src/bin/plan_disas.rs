//! Disassemble a JSON plan document into planasm source.

use std::env;
use std::fs;
use std::process;

use planasm_dsl::disassemble_to_source;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <plan json file>", args[0]);
        process::exit(1);
    }

    let text = match fs::read_to_string(&args[1]) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("Error reading {}: {}", args[1], err);
            process::exit(1);
        }
    };

    let plan: serde_json::Value = match serde_json::from_str(&text) {
        Ok(plan) => plan,
        Err(err) => {
            eprintln!("Error parsing JSON: {}", err);
            process::exit(1);
        }
    };

    match disassemble_to_source(&plan) {
        Ok(source) => print!("{}", source),
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    }
}
