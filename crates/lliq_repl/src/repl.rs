use rustyline::error::ReadlineError;
use rustyline::Editor;

use lliq_interpreter::Interpreter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn repl() {
    println!("LangLowIQ v{}", VERSION);

    let mut interpreter = match Interpreter::new(
        crate::base_path(),
        Box::new(|line: &str| println!("{}", line)),
    ) {
        Ok(interpreter) => interpreter,
        Err(err) => {
            eprintln!("could not set up search roots: {}", err);
            return;
        }
    };

    // `()` can be used when no completer is required
    let mut rl = Editor::<()>::new();
    // lines ending in ':' buffer a block until a blank line closes it
    let mut pending = String::new();
    loop {
        let prompt = if pending.is_empty() { ">> " } else { ".. " };
        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                if !pending.is_empty() {
                    if trimmed.is_empty() {
                        let program = std::mem::take(&mut pending);
                        rl.add_history_entry(program.as_str());
                        interpreter.run(&program);
                    } else {
                        pending.push_str(&line);
                        pending.push('\n');
                    }
                    continue;
                }

                if trimmed.is_empty() {
                    continue;
                }
                if trimmed == "exit" || trimmed == "quit" {
                    break;
                }
                if trimmed.ends_with(':') {
                    pending.push_str(&line);
                    pending.push('\n');
                    continue;
                }

                rl.add_history_entry(line.as_str());
                interpreter.run(&line);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
}
