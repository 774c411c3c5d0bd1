//! Prompt templates with positional placeholders.

use std::fmt::Display;

/// A prompt with positional `{}` placeholders.
///
/// Use `{{` and `}}` to write literal braces.
/// Any other brace is kept as is, so JSON snippets in prompts survive
/// without escaping as long as they don't contain `{}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PromptTemplate {
    template: String,
}

enum Segment<'a> {
    Literal(&'a str),
    Escaped(char),
    Placeholder,
}

impl PromptTemplate {
    /// Creates a template from its source text.
    #[inline]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Returns the source text of the template.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Returns the number of placeholders in the template.
    pub fn placeholders(&self) -> usize {
        self.segments()
            .filter(|segment| matches!(segment, Segment::Placeholder))
            .count()
    }

    /// Fills the placeholders in order with the given arguments.
    ///
    /// Placeholders without a matching argument are kept verbatim and extra
    /// arguments are ignored. Both cases are logged as warnings.
    pub fn bind<I, A>(&self, args: I) -> String
    where
        I: IntoIterator<Item = A>,
        A: Display,
    {
        let mut args = args.into_iter();
        let mut output = String::with_capacity(self.template.len());
        let mut missing = 0;
        for segment in self.segments() {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Escaped(ch) => output.push(ch),
                Segment::Placeholder => match args.next() {
                    Some(arg) => output.push_str(&arg.to_string()),
                    None => {
                        missing += 1;
                        output.push_str("{}");
                    }
                },
            }
        }
        if missing > 0 {
            warn!("template has {missing} placeholder(s) without arguments");
        }
        let extra = args.count();
        if extra > 0 {
            warn!("{extra} template argument(s) were not used");
        }
        output
    }

    fn segments(&self) -> impl Iterator<Item = Segment<'_>> {
        let src = self.template.as_str();
        let mut pos = 0;
        std::iter::from_fn(move || {
            let rest = &src[pos..];
            if rest.is_empty() {
                return None;
            }
            for token in ["{{", "}}", "{}"] {
                if rest.starts_with(token) {
                    pos += 2;
                    return Some(match token {
                        "{}" => Segment::Placeholder,
                        _ => Segment::Escaped(token.as_bytes()[0] as char),
                    });
                }
            }
            // Consume up to the next brace, but at least one character so a
            // lone brace becomes a literal.
            let first = rest.chars().next().map_or(1, char::len_utf8);
            let end = rest[first..]
                .find(['{', '}'])
                .map_or(rest.len(), |idx| idx + first);
            pos += end;
            Some(Segment::Literal(&rest[..end]))
        })
    }
}

impl From<&str> for PromptTemplate {
    #[inline]
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind() {
        let tpl = PromptTemplate::new("Translate {} into {}.");
        assert_eq!(tpl.placeholders(), 2);
        assert_eq!(
            tpl.bind(["I love programming.", "Russian"]),
            "Translate I love programming. into Russian."
        );
    }

    #[test]
    fn test_escapes_and_literals() {
        let tpl = PromptTemplate::new(r#"Reply as {{"answer": {}}} {x} }"#);
        assert_eq!(tpl.placeholders(), 1);
        assert_eq!(tpl.bind([42]), r#"Reply as {"answer": 42} {x} }"#);
    }

    #[test]
    fn test_argument_mismatch() {
        let tpl = PromptTemplate::new("{} and {}");
        assert_eq!(tpl.bind(["cats"]), "cats and {}");
        assert_eq!(tpl.bind(["a", "b", "c"]), "a and b");
        assert_eq!(
            PromptTemplate::new("café {}").bind(["crème"]),
            "café crème"
        );
    }
}
