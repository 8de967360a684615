//! Line-oriented terminal input.

use std::io::{BufRead, Write};

const EXIT_WORDS: [&str; 4] = ["exit", "quit", "/exit", "/quit"];

/// Print `label`, then read one line from stdin.
///
/// Returns `None` at end of input or when the user types an exit word.
pub fn read_line(label: &str) -> std::io::Result<Option<String>> {
    print!("  {label} > ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(parse_line(&line))
}

fn parse_line(line: &str) -> Option<String> {
    let line = line.trim();
    if EXIT_WORDS.iter().any(|w| line.eq_ignore_ascii_case(w)) {
        None
    } else {
        Some(line.to_string())
    }
}

/// Print a reply with a visible speaker prefix on every line.
pub fn print_reply(speaker: &str, text: &str) {
    println!();
    for line in text.lines() {
        println!("  {speaker} > {line}");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_words_end_input() {
        assert_eq!(parse_line("exit\n"), None);
        assert_eq!(parse_line("  QUIT "), None);
        assert_eq!(parse_line("/exit"), None);
        assert_eq!(parse_line("exit now").as_deref(), Some("exit now"));
        assert_eq!(parse_line("  hello \n").as_deref(), Some("hello"));
    }
}
