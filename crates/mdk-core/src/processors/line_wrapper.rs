//! Line wrapping of fully minified scripts

use tracing::{debug, warn};

use crate::cst::lex_with_trivia;
use crate::pipeline::{ComposedProcessor, PackContext, Processor};
use crate::result::Result;

/// Breaks long lines at token boundaries so that no line is wider than
/// `line_width` unless a single token is. Never breaks inside a token, a
/// comment or a directive line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineWrapper;

impl Processor for LineWrapper {
    fn name(&self) -> &str {
        "line-wrapper"
    }

    fn run_before(&self) -> &[&str] {
        &["script-size-check"]
    }
}

impl ComposedProcessor for LineWrapper {
    fn process(&self, script: String, context: &PackContext) -> Result<String> {
        let width = context.options().line_width;
        if width == 0 {
            return Ok(script);
        }
        let (tokens, errors) = lex_with_trivia(&script, context.symbols());
        if !errors.is_empty() {
            warn!("Script does not lex cleanly; skipping line wrapping");
            return Ok(script);
        }

        let mut out = String::with_capacity(script.len() + script.len() / width);
        let mut column = 0usize;
        let mut breaks = 0usize;
        for token in &tokens {
            let length = first_line_width(&token.text);
            let breakable = token.kind.is_significant() && column > 0;
            if breakable && column + length > width {
                let trimmed = out.trim_end_matches([' ', '\t']).len();
                out.truncate(trimmed);
                out.push('\n');
                column = 0;
                breaks += 1;
            }
            out.push_str(&token.text);
            column = match token.text.rfind('\n') {
                Some(index) => token.text[index + 1..].chars().count(),
                None => column + length,
            };
        }

        debug!("Inserted {} line break(s)", breaks);
        Ok(out)
    }
}

fn first_line_width(text: &str) -> usize {
    text.split('\n').next().unwrap_or_default().chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackOptions;

    fn wrap(script: &str, line_width: usize) -> String {
        let options = PackOptions {
            line_width,
            ..PackOptions::default()
        };
        let context = PackContext::new("Demo", "/tmp/demo", options);
        LineWrapper.process(script.to_string(), &context).unwrap()
    }

    #[test]
    fn test_long_line_is_broken_between_tokens() {
        let wrapped = wrap("class P{int alpha=1;int beta=2;int gamma=3;}", 20);
        for line in wrapped.lines() {
            assert!(line.chars().count() <= 20, "{line:?}");
        }
        assert_eq!(wrapped.replace('\n', ""), "class P{int alpha=1;int beta=2;int gamma=3;}");
    }

    #[test]
    fn test_strings_are_not_split() {
        let script = "var s=\"a very long string literal that is wider than the limit\";";
        let wrapped = wrap(script, 16);
        assert!(wrapped.contains("\"a very long string literal that is wider than the limit\""));
    }

    #[test]
    fn test_short_script_is_unchanged() {
        let script = "class P{}\n";
        assert_eq!(wrap(script, 120), script);
    }

    #[test]
    fn test_space_before_break_is_dropped() {
        assert_eq!(wrap("int alpha beta", 10), "int alpha\nbeta");
    }
}
