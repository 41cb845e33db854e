//! `forum tags` command implementation.

use forum_markup::{AttributeBinding, TagDefinition, TagGrammar};

use crate::output::Output;

/// Print every tag of the forum grammar, sorted by name.
pub(crate) fn execute() {
    let output = Output::new();
    let grammar = TagGrammar::forum();

    let mut names: Vec<&str> = grammar.names().collect();
    names.sort_unstable();

    output.highlight(&format!("{} tags", names.len()));
    for name in names {
        if let Some(definition) = grammar.get(name) {
            output.result(&describe(definition));
        }
    }
}

/// One-line summary such as `url [url=... href=...]`.
fn describe(definition: &TagDefinition) -> String {
    let name = definition.name();
    let mut line = name.to_owned();

    let mut usage = format!("[{name}");
    for attribute in definition.attributes() {
        match attribute.binding() {
            AttributeBinding::OwnValue => usage.push_str("=..."),
            AttributeBinding::Named(key) => {
                usage.push(' ');
                usage.push_str(key);
                usage.push_str("=...");
            }
        }
    }
    usage.push(']');
    line.push(' ');
    line.push_str(&usage);

    if definition.is_content_as_attribute() {
        line.push_str(" (content as attribute)");
    } else if !definition.allows_nested_tags() {
        line.push_str(" (literal)");
    }
    line
}
