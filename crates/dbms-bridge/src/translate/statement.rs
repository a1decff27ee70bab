//! Statement classification and the rewrite pipeline shared by the
//! tokenizing rewriters.

use super::tokens::{is_word, join_tokens, tokenize};

/// Shape of a statement, decided from its leading keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementClass {
    Select,
    Insert,
    Update,
    Delete,
    CreateSequence,
    CreateTable,
    CreateIndex,
    AlterTable,
    /// `CREATE TRIGGER` and `ALTER TRIGGER`.
    Trigger,
    Drop,
    /// SQL*Plus client commands such as `SET DEFINE OFF` or `EXIT`.
    SqlPlus,
    Other,
}

/// SQL*Plus commands that never reach the server.
const SQLPLUS_COMMANDS: &[&str] = &[
    "EXIT", "QUIT", "PROMPT", "SPOOL", "WHENEVER", "REM", "REMARK", "/",
];

/// `SET` options that belong to SQL*Plus rather than to SQL.
const SQLPLUS_SETTINGS: &[&str] = &[
    "DEFINE",
    "ECHO",
    "FEEDBACK",
    "HEADING",
    "LINESIZE",
    "PAGESIZE",
    "SERVEROUTPUT",
    "SQLBLANKLINES",
    "TERMOUT",
    "TIMING",
    "VERIFY",
];

/// Modifiers that may sit between `CREATE` and the object type.
const CREATE_MODIFIERS: &[&str] = &[
    "OR",
    "REPLACE",
    "EDITIONABLE",
    "NONEDITIONABLE",
    "GLOBAL",
    "PRIVATE",
    "TEMPORARY",
    "UNIQUE",
    "BITMAP",
];

/// Classify a statement from its tokens.
pub fn classify<S: AsRef<str>>(tokens: &[S]) -> StatementClass {
    let word = |i: usize| {
        tokens
            .get(i)
            .map(|t| t.as_ref().to_ascii_uppercase())
            .unwrap_or_default()
    };

    match word(0).as_str() {
        "SELECT" => StatementClass::Select,
        "INSERT" if word(1) == "INTO" => StatementClass::Insert,
        "UPDATE" => StatementClass::Update,
        "DELETE" => StatementClass::Delete,
        "DROP" => StatementClass::Drop,
        "ALTER" => match word(1).as_str() {
            "TABLE" => StatementClass::AlterTable,
            "TRIGGER" => StatementClass::Trigger,
            _ => StatementClass::Other,
        },
        "CREATE" => {
            let mut i = 1;
            while CREATE_MODIFIERS.contains(&word(i).as_str()) {
                i += 1;
            }
            match word(i).as_str() {
                "SEQUENCE" => StatementClass::CreateSequence,
                "TABLE" => StatementClass::CreateTable,
                "INDEX" => StatementClass::CreateIndex,
                "TRIGGER" => StatementClass::Trigger,
                _ => StatementClass::Other,
            }
        }
        "SET" if SQLPLUS_SETTINGS.contains(&word(1).as_str()) => StatementClass::SqlPlus,
        first if SQLPLUS_COMMANDS.contains(&first) => StatementClass::SqlPlus,
        _ => StatementClass::Other,
    }
}

/// Outcome of applying a class rule to a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    Unchanged,
    Rewritten(Vec<String>),
    Dropped,
}

/// A statement prepared for rewriting.
#[derive(Debug, Clone)]
pub struct Statement {
    comments: Vec<String>,
    tokens: Vec<String>,
    terminated: bool,
    class: StatementClass,
}

impl Statement {
    /// Separate leading `--` comment lines, tokenize the rest and classify it.
    ///
    /// A trailing `;` is held apart from the tokens so rules see only the
    /// statement body.
    pub fn parse(text: &str) -> Self {
        let mut comments = Vec::new();
        let mut lines = text.lines().peekable();
        while let Some(line) = lines.peek() {
            let trimmed = line.trim();
            if trimmed.starts_with("--") {
                comments.push(trimmed.to_string());
            } else if !trimmed.is_empty() {
                break;
            }
            lines.next();
        }
        let body: Vec<&str> = lines.collect();

        let mut tokens = tokenize(&body.join("\n"));
        let mut terminated = false;
        while tokens.last().map_or(false, |t| t == ";") {
            tokens.pop();
            terminated = true;
        }
        let class = classify(&tokens);

        Statement {
            comments,
            tokens,
            terminated,
            class,
        }
    }

    pub fn class(&self) -> StatementClass {
        self.class
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Render rewritten tokens with the original comments and terminator.
    pub fn render(&self, mut tokens: Vec<String>) -> String {
        if self.terminated {
            tokens.push(";".to_string());
        }
        let body = join_tokens(&tokens);
        if self.comments.is_empty() {
            body
        } else {
            format!("{}\n{}", self.comments.join("\n"), body)
        }
    }
}

/// Run a class rule over one statement.
///
/// Unchanged statements come back exactly as given, dropped ones as `None`.
pub fn rewrite_with<F>(text: &str, rule: F) -> Option<String>
where
    F: FnOnce(&Statement) -> Rewrite,
{
    let statement = Statement::parse(text);
    if statement.tokens().is_empty() {
        return Some(text.to_string());
    }
    match rule(&statement) {
        Rewrite::Unchanged => Some(text.to_string()),
        Rewrite::Rewritten(tokens) => Some(statement.render(tokens)),
        Rewrite::Dropped => None,
    }
}

/// Index of the first token equal to `word` at parenthesis depth zero.
pub fn find_top_level(tokens: &[String], word: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        match token.as_str() {
            "(" => depth += 1,
            ")" => depth = depth.saturating_sub(1),
            t if depth == 0 && is_word(t, word) => return Some(i),
            _ => {}
        }
    }
    None
}

/// Whether the tokens end with the given keywords.
pub fn ends_with_words(tokens: &[String], words: &[&str]) -> bool {
    tokens.len() >= words.len()
        && tokens[tokens.len() - words.len()..]
            .iter()
            .zip(words)
            .all(|(token, word)| is_word(token, word))
}
