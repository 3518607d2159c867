use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use lliq_interpreter::Interpreter;

mod repl;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    match args.len() {
        1 => repl::repl(),
        2 => run_file(&args[1]),
        _ => {
            eprintln!("Usage: lliq_repl [script]");
            process::exit(64);
        }
    }
}

fn run_file(file: &str) {
    let source = match fs::read_to_string(file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("could not read {}: {}", file, err);
            process::exit(66);
        }
    };

    let mut interpreter = match Interpreter::new(base_path(), Box::new(print_line)) {
        Ok(interpreter) => interpreter,
        Err(err) => {
            eprintln!("could not set up search roots: {}", err);
            process::exit(65);
        }
    };
    interpreter.run(&source);
}

fn print_line(line: &str) {
    println!("{}", line);
}

pub(crate) fn base_path() -> PathBuf {
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
