//! `${name}` placeholder scanning for tag templates.

use std::borrow::Cow;

/// Placeholder that expands to the tag content.
pub(crate) const CONTENT_PLACEHOLDER: &str = "content";

/// Iterate over placeholder names in a template, in order of appearance.
///
/// An unterminated `${` is not a placeholder.
pub(crate) fn placeholders(template: &str) -> impl Iterator<Item = &str> {
    Segments { rest: template }.filter_map(|segment| match segment {
        Segment::Placeholder(name) => Some(name),
        Segment::Literal(_) => None,
    })
}

/// Expand a template, asking `resolve` for the value of each placeholder.
///
/// Placeholders `resolve` returns `None` for are written back unchanged.
pub(crate) fn expand<'a, F>(template: &str, mut resolve: F, out: &mut String)
where
    F: FnMut(&str) -> Option<Cow<'a, str>>,
{
    for segment in (Segments { rest: template }) {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder(name) => match resolve(name) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push_str("${");
                    out.push_str(name);
                    out.push('}');
                }
            },
        }
    }
}

enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

struct Segments<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        let Some(start) = self.rest.find("${") else {
            let literal = self.rest;
            self.rest = "";
            return Some(Segment::Literal(literal));
        };

        if start > 0 {
            let literal = &self.rest[..start];
            self.rest = &self.rest[start..];
            return Some(Segment::Literal(literal));
        }

        match self.rest[2..].find('}') {
            Some(end) => {
                let name = &self.rest[2..end + 2];
                self.rest = &self.rest[end + 3..];
                Some(Segment::Placeholder(name))
            }
            None => {
                let literal = self.rest;
                self.rest = "";
                Some(Segment::Literal(literal))
            }
        }
    }
}
