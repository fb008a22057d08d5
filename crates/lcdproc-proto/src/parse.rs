//! Command line tokenizer.
//!
//! A small character-class state machine splits one line into arguments.
//! Arguments are separated by spaces, tabs or carriage returns; a line ends at
//! `\n`, `\0` or the end of input. Quotes come in two styles, `"..."` and
//! `{...}`, and a quote is closed only by its own closer. A backslash escapes
//! the next character anywhere in the line, translating `\n`, `\r` and `\t`.
//!
//! A closing quote always ends the current argument, so `""` is an empty
//! argument and `"a"b` is two arguments.

use thiserror::Error;

/// Size of the argument table. One slot is reserved, so a line may carry at
/// most `MAX_ARGUMENTS - 1` arguments.
pub const MAX_ARGUMENTS: usize = 40;

/// Reasons a line cannot be tokenized.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// A quote was left open, or the line ended in a lone backslash
    #[error("unterminated quote or escape")]
    UnterminatedQuote,

    /// The line has more arguments than the table holds
    #[error("more than {} arguments", MAX_ARGUMENTS - 1)]
    TooManyArguments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Whitespace,
    Argument,
    Final,
}

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r')
}

fn is_final(ch: char) -> bool {
    matches!(ch, '\n' | '\0')
}

fn closes(quote: Option<char>, ch: char) -> bool {
    matches!((quote, ch), (Some('{'), '}') | (Some('"'), '"'))
}

struct Args {
    args: Vec<String>,
    current: String,
}

impl Args {
    fn push(&mut self) -> Result<(), ParseError> {
        if self.args.len() >= MAX_ARGUMENTS - 1 {
            return Err(ParseError::TooManyArguments);
        }
        self.args.push(std::mem::take(&mut self.current));
        Ok(())
    }
}

/// Split one protocol line into its arguments.
///
/// Returns an empty vector for a blank line. Never returns partial results:
/// on error the whole line is rejected.
pub fn tokenize(line: &str) -> Result<Vec<String>, ParseError> {
    let mut state = State::Whitespace;
    let mut quote: Option<char> = None;
    let mut out = Args { args: Vec::new(), current: String::new() };
    let mut chars = line.chars();

    while state != State::Final {
        // End of input behaves like a NUL terminator.
        let ch = chars.next().unwrap_or('\0');

        if state == State::Whitespace {
            if is_whitespace(ch) {
                continue;
            }
            if is_final(ch) {
                state = State::Final;
                continue;
            }
            state = State::Argument;
        }

        if is_final(ch) {
            if quote.is_some() {
                return Err(ParseError::UnterminatedQuote);
            }
            out.push()?;
            state = State::Final;
        } else if ch == '\\' {
            match chars.next() {
                Some(next) if next != '\0' => out.current.push(match next {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    other => other,
                }),
                _ => return Err(ParseError::UnterminatedQuote),
            }
        } else if quote.is_none() && (ch == '"' || ch == '{') {
            quote = Some(ch);
        } else if closes(quote, ch) {
            quote = None;
            out.push()?;
            state = State::Whitespace;
        } else if quote.is_none() && is_whitespace(ch) {
            out.push()?;
            state = State::Whitespace;
        } else {
            out.current.push(ch);
        }
    }

    Ok(out.args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(line: &str) -> Vec<String> {
        tokenize(line).unwrap()
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(toks("widget_set s1 w1 1 1 hi"), ["widget_set", "s1", "w1", "1", "1", "hi"]);
        assert_eq!(toks("  hello \t "), ["hello"]);
    }

    #[test]
    fn blank_line_has_no_arguments() {
        assert!(toks("").is_empty());
        assert!(toks("   \r").is_empty());
    }

    #[test]
    fn quoted_arguments_keep_spaces() {
        assert_eq!(toks("a \"b c\" d"), ["a", "b c", "d"]);
        assert_eq!(toks("a {b c} d"), ["a", "b c", "d"]);
    }

    #[test]
    fn other_quote_style_is_literal_inside_quotes() {
        assert_eq!(toks("{say \"hi\"}"), ["say \"hi\""]);
        assert_eq!(toks("\"{x}\""), ["{x}"]);
    }

    #[test]
    fn empty_quotes_give_empty_argument() {
        assert_eq!(toks("menu_goto \"\""), ["menu_goto", ""]);
    }

    #[test]
    fn closing_quote_ends_argument() {
        assert_eq!(toks("\"a\"b"), ["a", "b"]);
    }

    #[test]
    fn quote_can_open_mid_argument() {
        assert_eq!(toks("ab\"c d\""), ["abc d"]);
    }

    #[test]
    fn escapes_are_translated() {
        assert_eq!(toks(r"a\tb c\\d e\q"), ["a\tb", "c\\d", "eq"]);
        assert_eq!(toks(r#""x\"y""#), ["x\"y"]);
        assert_eq!(toks(r"\n\r"), ["\n\r"]);
    }

    #[test]
    fn newline_terminates_line() {
        assert_eq!(toks("noop\nbye"), ["noop"]);
    }

    #[test]
    fn unterminated_quote_is_error() {
        assert_eq!(tokenize("a \"b c"), Err(ParseError::UnterminatedQuote));
        assert_eq!(tokenize("a {b"), Err(ParseError::UnterminatedQuote));
    }

    #[test]
    fn trailing_backslash_is_error() {
        assert_eq!(tokenize("abc\\"), Err(ParseError::UnterminatedQuote));
    }

    #[test]
    fn argument_limit() {
        let ok = vec!["x"; MAX_ARGUMENTS - 1].join(" ");
        assert_eq!(toks(&ok).len(), MAX_ARGUMENTS - 1);

        let too_many = vec!["x"; MAX_ARGUMENTS].join(" ");
        assert_eq!(tokenize(&too_many), Err(ParseError::TooManyArguments));
    }

    #[test]
    fn error_display() {
        assert_eq!(ParseError::TooManyArguments.to_string(), "more than 39 arguments");
    }
}
