//! Reading and writing flat stylesheet variable files.
//!
//! One variable per line: `$name: value;`, optionally followed by a
//! `// comment`.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

pub const HEADER: &str = "// Do not edit directly, this file was auto-generated.";

static VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$([a-zA-Z0-9_-]+)\s*:\s*(.+?)\s*(?:;\s*(?://\s*(.*?))?)?\s*$").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatVariable {
    /// Variable name without the leading `$`.
    pub name: String,
    /// Raw textual value, without the terminating `;`.
    pub value: String,
    pub comment: Option<String>,
}
impl FlatVariable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            comment: None,
        }
    }
    /// One line of stylesheet; line breaks in the value or comment are
    /// folded into spaces.
    pub fn to_scss(&self) -> String {
        let value = single_line(&self.value);
        match self.comment.as_deref().map(single_line) {
            Some(comment) if !comment.is_empty() => {
                format!("${}: {value}; // {comment}", self.name)
            }
            _ => format!("${}: {value};", self.name),
        }
    }
}

fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .join(" ")
}

pub fn render_variables(variables: &[FlatVariable]) -> String {
    format!(
        "\n{HEADER}\n\n{}\n",
        variables.iter().map(FlatVariable::to_scss).join("\n")
    )
}

pub fn parse_variables(content: &str) -> Result<Vec<FlatVariable>> {
    let mut variables = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_comment(trimmed) {
            continue;
        }
        let caps = VARIABLE
            .captures(trimmed)
            .ok_or_else(|| Error::MalformedLine {
                line: index + 1,
                content: trimmed.to_string(),
            })?;
        variables.push(FlatVariable {
            name: caps[1].to_string(),
            value: caps[2].to_string(),
            comment: caps
                .get(3)
                .map(|comment| comment.as_str().to_string())
                .filter(|comment| !comment.is_empty()),
        });
    }
    Ok(variables)
}

fn is_comment(line: &str) -> bool {
    line.starts_with("//") || line.starts_with("/*") || line.starts_with('*')
}

#[test]
fn parses_generated_file() {
    let content = render_variables(&[
        FlatVariable::new("button-color-background-default", "#FFFFFF"),
        FlatVariable {
            comment: Some("Primary action".to_string()),
            ..FlatVariable::new("button-radius", "4px")
        },
    ]);
    assert_eq!(
        parse_variables(&content).unwrap(),
        vec![
            FlatVariable::new("button-color-background-default", "#FFFFFF"),
            FlatVariable {
                comment: Some("Primary action".to_string()),
                ..FlatVariable::new("button-radius", "4px")
            },
        ]
    );
}

#[test]
fn accepts_block_comments_and_missing_terminator() {
    let content = "/**\n * Do not edit directly\n */\n\n$font-family: Inter, sans-serif\n$shadow: 0 1px 2px rgba(0, 0, 0, 0.2);\n";
    let variables = parse_variables(content).unwrap();
    assert_eq!(
        variables,
        vec![
            FlatVariable::new("font-family", "Inter, sans-serif"),
            FlatVariable::new("shadow", "0 1px 2px rgba(0, 0, 0, 0.2)"),
        ]
    );
}

#[test]
fn multi_line_comments_stay_on_one_line() {
    let variable = FlatVariable {
        comment: Some("Gap between\nchips\r\n".to_string()),
        ..FlatVariable::new("chip-gap", "4px")
    };
    assert_eq!(variable.to_scss(), "$chip-gap: 4px; // Gap between chips");
    assert_eq!(
        parse_variables(&render_variables(&[variable])).unwrap(),
        vec![FlatVariable {
            comment: Some("Gap between chips".to_string()),
            ..FlatVariable::new("chip-gap", "4px")
        }]
    );
    let stack = FlatVariable::new("font-family", "Inter,\n  sans-serif");
    assert_eq!(stack.to_scss(), "$font-family: Inter, sans-serif;");
}

#[test]
fn rejects_lines_that_are_not_variables() {
    let err = parse_variables("$ok: 1;\n.button { color: red; }\n").unwrap_err();
    assert!(matches!(err, Error::MalformedLine { line: 2, .. }));
}
