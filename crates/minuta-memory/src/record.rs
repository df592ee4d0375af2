// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical text encoding of a stored exchange.
//!
//! Records are stored as `User: <question>\nAssistant: <answer>`, optionally
//! prefixed with `[<session_id>] `. Parsing takes the question up to the
//! first line break after `User:` and the answer as everything after
//! `Assistant:`, so multi-line answers survive.

use std::sync::LazyLock;

use regex::Regex;

static QUESTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"User:[ \t]*([^\n]*)").expect("static pattern compiles")
});
static ANSWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Assistant:\s*(.+)").expect("static pattern compiles")
});

/// How a backend wants exchange text laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// `[<session_id>] User: ...\nAssistant: ...`
    SessionPrefixed,
    /// `User: ...\nAssistant: ...`
    Plain,
}

impl RecordFormat {
    pub fn render(self, session_id: &str, question: &str, answer: &str) -> String {
        match self {
            RecordFormat::SessionPrefixed => {
                format!("[{session_id}] User: {question}\nAssistant: {answer}")
            }
            RecordFormat::Plain => format!("User: {question}\nAssistant: {answer}"),
        }
    }
}

/// A question/answer pair recovered from record text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

impl Exchange {
    /// Parses record text; `None` when either half is missing or blank.
    pub fn parse(text: &str) -> Option<Self> {
        let question = QUESTION_RE.captures(text)?.get(1)?.as_str().trim();
        let answer = ANSWER_RE.captures(text)?.get(1)?.as_str().trim();
        if question.is_empty() || answer.is_empty() {
            return None;
        }
        Some(Self {
            question: question.to_string(),
            answer: answer.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_both_formats() {
        assert_eq!(
            RecordFormat::SessionPrefixed.render("s1", "Q?", "A."),
            "[s1] User: Q?\nAssistant: A."
        );
        assert_eq!(RecordFormat::Plain.render("s1", "Q?", "A."), "User: Q?\nAssistant: A.");
    }

    #[test]
    fn parses_rendered_records() {
        for format in [RecordFormat::SessionPrefixed, RecordFormat::Plain] {
            let text = format.render("20260101T000000_session-abc123", "Who owns QA?", "Dana.");
            let exchange = Exchange::parse(&text).unwrap();
            assert_eq!(exchange.question, "Who owns QA?");
            assert_eq!(exchange.answer, "Dana.");
        }
    }

    #[test]
    fn multi_line_answer_is_kept_whole() {
        let text = "User: List the actions\nAssistant: 1. Ship\n2. Review\n3. Retro";
        let exchange = Exchange::parse(text).unwrap();
        assert_eq!(exchange.question, "List the actions");
        assert_eq!(exchange.answer, "1. Ship\n2. Review\n3. Retro");
    }

    #[test]
    fn missing_or_blank_halves_do_not_parse() {
        assert_eq!(Exchange::parse("just some notes"), None);
        assert_eq!(Exchange::parse("User: question only"), None);
        assert_eq!(Exchange::parse("Assistant: answer only"), None);
        assert_eq!(Exchange::parse("User:   \nAssistant: a"), None);
        assert_eq!(Exchange::parse("User: q\nAssistant:   "), None);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let exchange = Exchange::parse("User:   spaced q  \nAssistant:  spaced a \n").unwrap();
        assert_eq!(exchange.question, "spaced q");
        assert_eq!(exchange.answer, "spaced a");
    }
}
