//! Tag grammar: the table of recognized tags.
//!
//! A [`TagDefinition`] describes how one tag is written and rendered. A
//! [`TagGrammar`] is an immutable, validated set of definitions that can be
//! shared freely between threads.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, LazyLock};

use crate::template::{CONTENT_PLACEHOLDER, placeholders};

/// How an attribute value is written in the opening construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeBinding {
    /// The tag's own value: `[tag=value]`.
    OwnValue,
    /// A named sub-attribute: `[tag name=value]`.
    Named(String),
}

/// Value used when an attribute is absent from the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeDefault {
    /// A fixed string.
    Value(String),
    /// The plain-text content of the tag.
    Content,
}

/// One attribute rule of a tag.
///
/// Several definitions may share an `id` to accept the same value through
/// different bindings (`[url=x]` and `[url href=x]` both bind `href`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDefinition {
    id: String,
    binding: AttributeBinding,
    default: AttributeDefault,
}

impl AttributeDefinition {
    /// Attribute bound to the tag's own value, defaulting to an empty string.
    #[must_use]
    pub fn own_value(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            binding: AttributeBinding::OwnValue,
            default: AttributeDefault::Value(String::new()),
        }
    }

    /// Attribute bound to `name=value` inside the opening construct.
    #[must_use]
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            binding: AttributeBinding::Named(name.into()),
            default: AttributeDefault::Value(String::new()),
        }
    }

    /// Set the value used when the attribute is absent.
    #[must_use]
    pub fn with_default(mut self, default: AttributeDefault) -> Self {
        self.default = default;
        self
    }

    /// Placeholder name used in templates (`${id}`).
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn binding(&self) -> &AttributeBinding {
        &self.binding
    }

    pub fn default(&self) -> &AttributeDefault {
        &self.default
    }
}

/// Definition of one markup tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDefinition {
    name: String,
    open_template: String,
    close_template: String,
    attributes: Vec<AttributeDefinition>,
    allows_nested_tags: bool,
    content_as_attribute: bool,
}

impl TagDefinition {
    /// Create a tag rendered by wrapping its content in the two templates.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        open_template: impl Into<String>,
        close_template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            open_template: open_template.into(),
            close_template: close_template.into(),
            attributes: Vec::new(),
            allows_nested_tags: true,
            content_as_attribute: false,
        }
    }

    /// Add an attribute rule.
    #[must_use]
    pub fn with_attribute(mut self, attribute: AttributeDefinition) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Render content verbatim instead of parsing nested tags (code blocks).
    #[must_use]
    pub fn literal_content(mut self) -> Self {
        self.allows_nested_tags = false;
        self
    }

    /// Treat the content as the value of the `${content}` placeholder.
    ///
    /// Such tags never have child nodes.
    #[must_use]
    pub fn content_as_attribute(mut self) -> Self {
        self.content_as_attribute = true;
        self.allows_nested_tags = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn open_template(&self) -> &str {
        &self.open_template
    }

    pub fn close_template(&self) -> &str {
        &self.close_template
    }

    pub fn attributes(&self) -> &[AttributeDefinition] {
        &self.attributes
    }

    pub fn allows_nested_tags(&self) -> bool {
        self.allows_nested_tags
    }

    pub fn is_content_as_attribute(&self) -> bool {
        self.content_as_attribute
    }

    /// The attribute bound by `[tag=value]`, if the tag declares one.
    pub fn own_value_attribute(&self) -> Option<&AttributeDefinition> {
        self.attributes
            .iter()
            .find(|a| a.binding == AttributeBinding::OwnValue)
    }

    /// The attribute bound by `[tag name=value]`.
    pub fn named_attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attributes
            .iter()
            .find(|a| matches!(&a.binding, AttributeBinding::Named(n) if n == name))
    }

    fn validate(&self) -> Result<(), GrammarError> {
        if self.name.is_empty() || !self.name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(GrammarError::InvalidName(self.name.clone()));
        }

        let own_values = self
            .attributes
            .iter()
            .filter(|a| a.binding == AttributeBinding::OwnValue)
            .count();
        if own_values > 1 {
            return Err(GrammarError::MultipleOwnValues(self.name.clone()));
        }

        let templates = [self.open_template.as_str(), self.close_template.as_str()];
        for placeholder in templates.into_iter().flat_map(placeholders) {
            let declared = placeholder == CONTENT_PLACEHOLDER
                || self.attributes.iter().any(|a| a.id == placeholder);
            if !declared {
                return Err(GrammarError::UndeclaredPlaceholder {
                    tag: self.name.clone(),
                    placeholder: placeholder.to_owned(),
                });
            }
        }

        Ok(())
    }
}

/// Grammar construction error.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GrammarError {
    /// Two definitions share a name.
    #[error("duplicate tag definition: {0}")]
    DuplicateTag(String),
    /// Tag name is empty or not ASCII alphanumeric.
    #[error("invalid tag name: {0:?}")]
    InvalidName(String),
    /// More than one attribute bound to `[tag=value]`.
    #[error("tag {0} declares more than one own-value attribute")]
    MultipleOwnValues(String),
    /// Template refers to an attribute the tag does not declare.
    #[error("tag {tag} uses undeclared placeholder ${{{placeholder}}}")]
    UndeclaredPlaceholder { tag: String, placeholder: String },
}

/// Immutable set of tag definitions, keyed by case-sensitive name.
#[derive(Debug, Clone, Default)]
pub struct TagGrammar {
    tags: HashMap<String, Arc<TagDefinition>>,
}

static FORUM_GRAMMAR: LazyLock<TagGrammar> = LazyLock::new(|| {
    TagGrammar::new(forum_tags()).expect("built-in forum grammar is valid")
});

impl TagGrammar {
    /// Build a grammar from definitions.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError`] for duplicate names, invalid names, more than
    /// one own-value attribute on a tag, or undeclared template placeholders.
    pub fn new(definitions: impl IntoIterator<Item = TagDefinition>) -> Result<Self, GrammarError> {
        let mut tags = HashMap::new();
        for definition in definitions {
            definition.validate()?;
            match tags.entry(definition.name.clone()) {
                Entry::Occupied(_) => return Err(GrammarError::DuplicateTag(definition.name)),
                Entry::Vacant(slot) => {
                    slot.insert(Arc::new(definition));
                }
            }
        }
        Ok(Self { tags })
    }

    /// The built-in forum tag set.
    pub fn forum() -> &'static TagGrammar {
        &FORUM_GRAMMAR
    }

    /// Look up a tag by name. `None` means the tag is unknown.
    pub fn get(&self, name: &str) -> Option<&Arc<TagDefinition>> {
        self.tags.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterate over tag names in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }
}

fn forum_tags() -> Vec<TagDefinition> {
    vec![
        TagDefinition::new("b", r#"<span class="bbc-bold">"#, "</span>"),
        TagDefinition::new("s", r#"<span class="bbc-strike">"#, "</span>"),
        TagDefinition::new("i", r#"<span class="bbc-italic">"#, "</span>"),
        TagDefinition::new("u", r#"<span class="bbc-underline">"#, "</span>"),
        TagDefinition::new("code", r#"<div class="bbc-code">"#, "</div>").literal_content(),
        TagDefinition::new("img", r#"<img class="bbc-image" src="${content}" />"#, "")
            .content_as_attribute(),
        TagDefinition::new("quote", r#"<blockquote class="bbc-quote">"#, "</blockquote>"),
        TagDefinition::new("ul", r#"<ul class="bbc-list">"#, "</ul>"),
        TagDefinition::new("ol", r#"<ol class="bbc-list">"#, "</ol>"),
        TagDefinition::new("li", r#"<li class="bbc-list-item">"#, "</li>"),
        TagDefinition::new(
            "url",
            r#"<a class="bbc-anchor" href="${href}" target="_blank">"#,
            "</a>",
        )
        .with_attribute(AttributeDefinition::own_value("href").with_default(AttributeDefault::Content))
        .with_attribute(
            AttributeDefinition::named("href", "href").with_default(AttributeDefault::Content),
        ),
        TagDefinition::new("color", r#"<span style="color: ${color};">"#, "</span>")
            .with_attribute(AttributeDefinition::own_value("color"))
            .with_attribute(AttributeDefinition::named("color", "color")),
    ]
}
