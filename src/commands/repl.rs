use std::io::{self, BufRead, Write};
use calculator_core::{format_number, Session};
use log::debug;

const BANNER: &str = "\
Calculator
Examples: 2+3*4, (1+2)**3, sqrt(9), sin(pi/2)
Constants: pi, e, tau
Commands: :q (quit), :h (help), :c (clear last)";

const HELP: &str = "\
Enter a math expression.
Allowed: + - * / % ** ( ) and functions like sqrt(x), log(x, base), round(x, digits).
Use '_' to refer to the previous result.";

const PROMPT: &str = "> ";

#[derive(Debug, PartialEq)]
enum Input<'a> {
    Empty,
    Quit,
    Help,
    Clear,
    Expression(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Empty,
        ":q" | "q" | "quit" | "exit" => Input::Quit,
        ":h" | "help" | "?" => Input::Help,
        ":c" | "clear" => Input::Clear,
        expression => Input::Expression(expression),
    }
}

/// Runs the interactive loop until a quit command or end of input.
pub fn run_repl<R: BufRead, W: Write>(input: R, output: &mut W) -> io::Result<()> {
    let mut session = Session::new();
    let mut lines = input.lines();

    writeln!(output, "{}", BANNER)?;

    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            return Ok(());
        };
        let line = line?;

        match classify(&line) {
            Input::Empty => continue,
            Input::Quit => return Ok(()),
            Input::Help => writeln!(output, "{}", HELP)?,
            Input::Clear => {
                session.clear();
                writeln!(output, "Cleared.")?;
            }
            Input::Expression(expression) => match session.evaluate(expression) {
                Ok(value) => writeln!(output, "{}", format_number(value))?,
                Err(e) => {
                    debug!("Rejected {:?}: {:?}", expression, e);
                    writeln!(output, "Error: {}", e)?;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn session(input: &str) -> Vec<String> {
        let mut output = Vec::new();
        run_repl(Cursor::new(input), &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        text.strip_prefix(BANNER)
            .unwrap()
            .split(PROMPT)
            .map(|chunk| chunk.trim().to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }

    #[test]
    fn previous_result_is_substituted() {
        assert_eq!(session("3 + 4\n_ * 2\n"), vec!["7", "14"]);
    }

    #[test]
    fn errors_do_not_end_the_session() {
        assert_eq!(
            session("1 / 0\nfoo(1)\n2 ** 3 ** 2\n"),
            vec!["Error: division by zero", "Error: unknown identifier: foo", "512"]
        );
    }

    #[test]
    fn clear_forgets_the_previous_result() {
        assert_eq!(
            session("5\n:c\n_ + 1\n"),
            vec!["5", "Cleared.", "Error: unknown identifier: _ (no previous result)"]
        );
    }

    #[test]
    fn quit_stops_reading() {
        assert_eq!(session("1\nquit\n2\n"), vec!["1"]);
        assert_eq!(session(":q\n1\n"), Vec::<String>::new());
    }

    #[test]
    fn help_and_blank_lines() {
        assert_eq!(session("\n   \n:h\n"), vec![HELP.to_string()]);
    }

    #[test]
    fn classifies_commands() {
        assert_eq!(classify("  exit "), Input::Quit);
        assert_eq!(classify("?"), Input::Help);
        assert_eq!(classify("clear"), Input::Clear);
        assert_eq!(classify(" 1 + 1 "), Input::Expression("1 + 1"));
    }
}
