//! Quote-aware SQL tokenizer.
//!
//! A single pass over the text with two states, normal and inside a quoted
//! string or identifier. In the normal state whitespace separates tokens and
//! `, ; ( ) =` are tokens of their own. Single-quoted literals and
//! double-quoted identifiers are opaque: nothing inside them is split, and a
//! doubled quote stays part of the token. A `--` comment runs to the end of
//! its line and is kept as one token.

/// Characters that always form a token of their own outside literals.
const PUNCTUATION: [char; 5] = [',', ';', '(', ')', '='];

/// Characters that open a literal or a quoted identifier.
const QUOTES: [char; 2] = ['\'', '"'];

/// Characters that combine with a following `=` into one operator.
const COMPARISON_PREFIX: [char; 4] = ['<', '>', '!', ':'];

fn flush(current: &mut String, tokens: &mut Vec<String>) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}

/// Split SQL text into tokens.
pub fn tokenize(sql: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            current.push(c);
            if c == q {
                if chars.peek() == Some(&q) {
                    current.push(q);
                    chars.next();
                } else {
                    quote = None;
                }
            }
            continue;
        }

        match c {
            c if QUOTES.contains(&c) => {
                current.push(c);
                quote = Some(c);
            }
            '-' if chars.peek() == Some(&'-') => {
                flush(&mut current, &mut tokens);
                let mut comment = String::from("-");
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    comment.push(next);
                    chars.next();
                }
                tokens.push(comment.trim_end().to_string());
            }
            '=' if current.ends_with(COMPARISON_PREFIX) => current.push(c),
            '=' if chars.peek() == Some(&'>') => {
                flush(&mut current, &mut tokens);
                chars.next();
                tokens.push("=>".to_string());
            }
            c if c.is_whitespace() => flush(&mut current, &mut tokens),
            c if PUNCTUATION.contains(&c) => {
                flush(&mut current, &mut tokens);
                tokens.push(c.to_string());
            }
            c => current.push(c),
        }
    }
    flush(&mut current, &mut tokens);
    tokens
}

/// Join tokens back into SQL text.
///
/// Tokens are separated by single spaces, except after `(` and before `)`
/// or `;`. A comment token is followed by a line break.
pub fn join_tokens<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut out = String::new();
    let mut previous: Option<&str> = None;
    for token in tokens {
        let token = token.as_ref();
        if let Some(previous) = previous {
            if previous.starts_with("--") {
                out.push('\n');
            } else if previous != "(" && token != ")" && token != ";" {
                out.push(' ');
            }
        }
        out.push_str(token);
        previous = Some(token);
    }
    out
}

/// Collapse whitespace runs outside literals and quoted identifiers into
/// one space and trim the result.
pub fn collapse_whitespace(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut quote: Option<char> = None;
    let mut pending_space = false;
    for c in sql.chars() {
        if quote.is_none() && c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        match quote {
            Some(q) if c == q => quote = None,
            None if QUOTES.contains(&c) => quote = Some(c),
            _ => {}
        }
        out.push(c);
    }
    out
}

/// Whether a token is the given keyword, ignoring case.
pub fn is_word(token: &str, word: &str) -> bool {
    token.eq_ignore_ascii_case(word)
}
