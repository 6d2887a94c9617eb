use std::borrow::Cow;

use crate::error::Result;
use crate::markdown::Plugin;

/// Two ideographic spaces, the conventional first-line indent of Chinese prose.
pub const FULL_WIDTH_INDENT: &str = "\u{3000}\u{3000}";

/// Indents the first line of every prose paragraph with
/// [`FULL_WIDTH_INDENT`].
///
/// A line starts a paragraph when the previous line is blank or a heading.
/// Headings, list items, quotes, tables, fenced code, and lines that are
/// already indented with an ideographic space are left alone.
///
/// ```rust
/// use guidebook::markdown::{Indent, Plugin};
///
/// let src = "# 雷峰塔\n雷峰塔位于西湖南岸。\n夕照山上。\n\n- 列表\n";
/// let out = Indent.preprocess(src).unwrap();
/// assert_eq!(out, "# 雷峰塔\n\u{3000}\u{3000}雷峰塔位于西湖南岸。\n夕照山上。\n\n- 列表\n");
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Indent;

fn is_structural(trimmed: &str) -> bool {
    trimmed.is_empty() || ["#", "-", "*", ">", "```", "|"].iter().any(|p| trimmed.starts_with(p))
}

impl Plugin for Indent {
    fn preprocess<'a>(&self, input: &'a str) -> Result<Cow<'a, str>> {
        let mut output = String::with_capacity(input.len() + 64);
        let mut previous = "";
        let mut in_fence = false;
        let mut changed = false;

        for line in input.split_inclusive('\n') {
            let trimmed = line.trim();
            let starts_paragraph = previous.is_empty() || previous.starts_with('#');
            previous = trimmed;

            if trimmed.starts_with("```") {
                in_fence = !in_fence;
            }

            if in_fence || is_structural(trimmed) || !starts_paragraph || line.starts_with('\u{3000}') {
                output.push_str(line);
                continue;
            }

            output.push_str(FULL_WIDTH_INDENT);
            output.push_str(trimmed);
            if line.ends_with('\n') {
                output.push('\n');
            }

            changed = true;
        }

        match changed {
            true => Ok(Cow::Owned(output)),
            false => Ok(Cow::Borrowed(input)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indent(s: &str) -> String {
        Indent.preprocess(s).unwrap().into_owned()
    }

    #[test]
    fn first_line_is_a_paragraph_start() {
        assert_eq!(indent("苏州"), "\u{3000}\u{3000}苏州");
    }

    #[test]
    fn already_indented_is_untouched() {
        let src = "\u{3000}\u{3000}拙政园\n";
        assert!(matches!(Indent.preprocess(src).unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn fenced_code_is_untouched() {
        let src = "```\n\ncode\n```\n\ntext\n";
        assert_eq!(indent(src), "```\n\ncode\n```\n\n\u{3000}\u{3000}text\n");
    }

    #[test]
    fn structural_lines_are_skipped() {
        let src = "> quote\n\n| a | b |\n\n* item\n";
        assert_eq!(indent(src), src);
    }
}
