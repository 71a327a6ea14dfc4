use std::io::{self, Write};
use std::rc::Rc;

use owo_colors::OwoColorize;

use kaze_interpreter::{Environment, Interpreter, MemoryStats, Value};
use kaze_lexer::Lexer;
use kaze_parser::Parser;
use kaze_syntax::error::Error;
use kaze_syntax::token::TokenKind;

pub fn start_repl() {
    println!(
        "{}",
        "Kaze REPL. Type :help for help, :quit to exit.".bold().green()
    );

    let mut interpreter = Interpreter::new();
    let mut env = Environment::new();

    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() {
            "kaze> ".cyan().to_string()
        } else {
            " ...> ".cyan().to_string()
        };
        print!("{}", prompt);
        let _ = io::stdout().flush();

        let mut line = String::new();
        let n = match io::stdin().read_line(&mut line) {
            Ok(n) => n,
            Err(_) => {
                println!("<input error>");
                break;
            }
        };
        if n == 0 {
            // EOF
            println!("\nGoodbye.");
            break;
        }
        let trimmed = line.trim_end();

        if buffer.is_empty() && trimmed.starts_with(':') {
            match trimmed {
                ":quit" | ":q" | ":exit" => {
                    println!("Goodbye.");
                    break;
                }
                ":help" | ":h" => {
                    print_help();
                    continue;
                }
                ":vars" => {
                    print_vars(&env);
                    continue;
                }
                ":mem" => {
                    print_mem(&interpreter);
                    continue;
                }
                ":reset" => {
                    interpreter.reset();
                    env = Environment::new();
                    println!("{}", "State reset.".yellow());
                    continue;
                }
                _ => {
                    println!("{}", "Unknown command. Type :help.".red());
                    continue;
                }
            }
        }

        buffer.push_str(&line);

        if !is_complete(&buffer) {
            continue;
        }

        let mut parser = Parser::from_source(&buffer);
        let program = parser.parse_program();
        if parser.errors().is_empty() {
            match interpreter.run_with_env(&program, &env) {
                Ok(value) => {
                    if !matches!(value, Value::Null) {
                        println!("{}", value.inspect().bright_blue());
                    }
                }
                Err(e) => render_error("runtime error", &e),
            }
        } else {
            for err in parser.errors() {
                render_error("parse error", err);
            }
        }

        buffer.clear();
    }
}

fn print_help() {
    println!(
        "{}\n  {}  {}\n  {}  {}\n  {}  {}\n  {}  {}",
        "Commands:".bold(),
        ":help".yellow(),
        "Show this help",
        ":quit".yellow(),
        "Exit the REPL",
        ":vars".yellow(),
        "List top-level variables",
        ":mem".yellow(),
        "Show allocation stats",
    );
    println!("  {}  {}", ":reset".yellow(), "Clear state (env and stats)");
    println!("Type code to evaluate; input is buffered until brackets balance.");
}

fn print_vars(env: &Rc<Environment>) {
    let mut vars = env.snapshot();
    vars.sort_by(|a, b| a.0.cmp(&b.0));
    if vars.is_empty() {
        println!("{}", "<no vars>".dimmed());
        return;
    }
    for (name, value) in vars {
        println!("{} = {}", name.yellow(), value.inspect().bright_blue());
    }
}

fn print_mem(interp: &Interpreter) {
    let MemoryStats {
        strings_allocated,
        bytes_allocated,
    } = interp.memory_stats();
    println!("{}: {}", "strings".yellow(), strings_allocated);
    println!("{}: {} bytes", "bytes".yellow(), bytes_allocated);
}

fn render_error(kind: &str, err: &Error) {
    eprintln!("{}: {}", kind.red().bold(), err.msg.red());
}

/// A buffered REPL entry is submitted once every bracket pair balances.
fn is_complete(input: &str) -> bool {
    let tokens = Lexer::new(input).tokenize();
    let mut depth = 0i32;
    for tk in &tokens {
        match tk.kind {
            TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => depth += 1,
            TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket => depth -= 1,
            _ => {}
        }
    }
    depth <= 0
}

#[cfg(test)]
mod tests {
    use super::is_complete;

    #[test]
    fn test_is_complete() {
        assert!(is_complete("1 + 2"));
        assert!(is_complete("fun f(x) { x }"));
        assert!(!is_complete("fun f(x) {"));
        assert!(!is_complete("[1, 2,"));
        assert!(is_complete("if a { 1 } else { 2 }"));
    }
}
