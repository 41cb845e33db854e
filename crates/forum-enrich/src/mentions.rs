//! `@name` mention resolution.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::spans::MarkupSpans;

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@([^\s<>]+)").unwrap());

/// Read-only user lookup used to resolve mentions.
///
/// Implementations are shared between concurrent pipeline runs and must not
/// mutate during a lookup.
pub trait UserDirectory: Send + Sync {
    /// User whose display name equals `name`, ignoring case.
    fn find_by_display_name(&self, name: &str) -> Option<String>;

    /// First user whose login contains `fragment`, ignoring case.
    fn find_by_login_fragment(&self, fragment: &str) -> Option<String>;

    /// Resolve a mention token: exact display name first, then login guess.
    fn resolve(&self, token: &str) -> Option<String> {
        self.find_by_display_name(token)
            .or_else(|| self.find_by_login_fragment(token))
    }
}

/// One known user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryUser {
    pub id: String,
    pub display_name: String,
    pub login: String,
}

impl DirectoryUser {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        login: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            login: login.into(),
        }
    }
}

/// [`UserDirectory`] over an in-memory list, searched in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserDirectory {
    users: Vec<DirectoryUser>,
}

impl MemoryUserDirectory {
    #[must_use]
    pub fn new(users: Vec<DirectoryUser>) -> Self {
        Self { users }
    }

    #[must_use]
    pub fn with_user(mut self, user: DirectoryUser) -> Self {
        self.users.push(user);
        self
    }

    pub fn users(&self) -> &[DirectoryUser] {
        &self.users
    }
}

impl UserDirectory for MemoryUserDirectory {
    fn find_by_display_name(&self, name: &str) -> Option<String> {
        let name = name.to_lowercase();
        self.users
            .iter()
            .find(|u| u.display_name.to_lowercase() == name)
            .map(|u| u.id.clone())
    }

    fn find_by_login_fragment(&self, fragment: &str) -> Option<String> {
        let fragment = fragment.to_lowercase();
        self.users
            .iter()
            .find(|u| u.login.to_lowercase().contains(&fragment))
            .map(|u| u.id.clone())
    }
}

/// Resolve up to `max_matches` `@name` tokens in `html` to user ids.
///
/// Tokens matching no user are ignored, and `author` is never reported as
/// mentioning themselves. The cap counts tokens, resolved or not. Tokens
/// inside tags, such as an `@` in an attribute value, are not mentions.
pub fn scan_mentions(
    html: &str,
    author: Option<&str>,
    directory: &dyn UserDirectory,
    max_matches: usize,
) -> BTreeSet<String> {
    let mut mentioned = BTreeSet::new();
    let tags = MarkupSpans::tags(html);
    let tokens = MENTION_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .filter(|m| !tags.contains(m.start()));

    for m in tokens.take(max_matches) {
        let token = m.as_str();
        let Some(id) = directory.resolve(token) else {
            tracing::debug!(token, "Mention matched no user");
            continue;
        };
        if author == Some(id.as_str()) {
            continue;
        }
        mentioned.insert(id);
    }

    mentioned
}
