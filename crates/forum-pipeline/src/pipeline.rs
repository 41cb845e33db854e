//! Pipeline orchestrator.

use std::sync::Arc;

use forum_enrich::{
    DEFAULT_MAX_MATCHES, MemoryUserDirectory, PageFetcher, UserDirectory, enrich_links,
    scan_mentions,
};
use forum_markup::{Parser, RenderTarget, TagGrammar};

use crate::clean::{force_new_window, pre_clean, preview};
use crate::error::PipelineError;
use crate::message::ProcessedMessage;
use crate::smiley::SmileyTable;
use crate::stage::Stage;

/// Tuning knobs for [`MessagePipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// URLs and mentions handled per message.
    pub max_matches: usize,
    /// Character limit of the single-line preview.
    pub short_preview_length: usize,
    /// Character limit of the multi-line preview.
    pub long_preview_length: usize,
    /// Preview used when nothing is left after stripping.
    pub empty_preview_text: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_matches: DEFAULT_MAX_MATCHES,
            short_preview_length: 100,
            long_preview_length: 500,
            empty_preview_text: "No text".to_owned(),
        }
    }
}

/// Runs messages through every [`Stage`] in order.
///
/// The pipeline holds only read-only lookup data and can be shared between
/// threads; each [`process`](Self::process) call owns its message.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use forum_enrich::HttpFetcher;
/// use forum_pipeline::MessagePipeline;
///
/// let pipeline = MessagePipeline::new(Arc::new(HttpFetcher::default()));
/// let message = pipeline.process("[b]hello[/b]", None)?;
/// assert_eq!(message.display, r#"<span class="bbc-bold">hello</span>"#);
/// ```
pub struct MessagePipeline {
    grammar: TagGrammar,
    smileys: SmileyTable,
    users: Arc<dyn UserDirectory>,
    fetcher: Arc<dyn PageFetcher>,
    options: PipelineOptions,
}

impl MessagePipeline {
    /// Pipeline with the forum grammar, no smileys and no known users.
    #[must_use]
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            grammar: TagGrammar::forum().clone(),
            smileys: SmileyTable::default(),
            users: Arc::new(MemoryUserDirectory::default()),
            fetcher,
            options: PipelineOptions::default(),
        }
    }

    #[must_use]
    pub fn with_grammar(mut self, grammar: TagGrammar) -> Self {
        self.grammar = grammar;
        self
    }

    #[must_use]
    pub fn with_smileys(mut self, smileys: SmileyTable) -> Self {
        self.smileys = smileys;
        self
    }

    #[must_use]
    pub fn with_users(mut self, users: Arc<dyn UserDirectory>) -> Self {
        self.users = users;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Process a raw message body written by `author`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyBody`] if the body is blank. No partial
    /// result is produced.
    pub fn process(
        &self,
        raw: &str,
        author: Option<&str>,
    ) -> Result<ProcessedMessage, PipelineError> {
        let mut message = ProcessedMessage::new(raw);
        let mut stage = Stage::Raw;

        while let Some(next) = stage.next() {
            tracing::debug!(stage = ?next, "Running pipeline stage");
            self.run_stage(next, &mut message, author)?;
            message.stages.push(next);
            stage = next;
        }

        tracing::info!(
            cards = message.cards.len(),
            mentions = message.mentioned_users.len(),
            "Message processed"
        );
        Ok(message)
    }

    fn run_stage(
        &self,
        stage: Stage,
        message: &mut ProcessedMessage,
        author: Option<&str>,
    ) -> Result<(), PipelineError> {
        match stage {
            Stage::Raw | Stage::Done => {}
            Stage::PreClean => {
                message.display = pre_clean(&message.original)?;
            }
            Stage::SmileyTokenize => {
                message.display = self.smileys.tokenize(&message.display).into_owned();
            }
            Stage::Parsed => {
                let tree = Parser::new(&self.grammar).parse(&message.display);
                message.markup = self
                    .smileys
                    .detokenize(&tree.render(RenderTarget::Markup))
                    .into_owned();
                message.text = self
                    .smileys
                    .detokenize(&tree.render(RenderTarget::Text))
                    .into_owned();
                message.display = tree.render(RenderTarget::Html);
                message.tree = Some(tree);
            }
            Stage::SmileyResolve => {
                if let Some(tree) = message.tree.take() {
                    let resolved = self.smileys.resolve(&tree);
                    message.display = resolved.render(RenderTarget::Html);
                    message.tree = Some(resolved);
                }
            }
            Stage::UrlEnrich => {
                let enrichment = enrich_links(
                    &message.display,
                    self.fetcher.as_ref(),
                    self.options.max_matches,
                );
                message.display = enrichment.html;
                message.cards.extend(enrichment.cards);
            }
            Stage::MentionScan => {
                message.mentioned_users = scan_mentions(
                    &message.display,
                    author,
                    self.users.as_ref(),
                    self.options.max_matches,
                );
            }
            Stage::PostClean => {
                // Raw HTML in the body is escaped, so anchors exist only after rendering.
                message.display = force_new_window(message.display.trim()).into_owned();
                message.short_preview = preview(
                    &message.display,
                    self.options.short_preview_length,
                    false,
                    &self.options.empty_preview_text,
                );
                message.long_preview = preview(
                    &message.display,
                    self.options.long_preview_length,
                    true,
                    &self.options.empty_preview_text,
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use forum_enrich::{DirectoryUser, MockFetcher};
    use forum_markup::{AttributeDefinition, Node, RenderTarget, TagDefinition};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::smiley::{PLACEHOLDER_OPEN, Smiley};

    fn pipeline(fetcher: &Arc<MockFetcher>) -> MessagePipeline {
        let users = MemoryUserDirectory::default()
            .with_user(DirectoryUser::new("u1", "alice", "alice"))
            .with_user(DirectoryUser::new("u2", "Bob", "bobby"));
        MessagePipeline::new(Arc::clone(fetcher) as Arc<dyn PageFetcher>)
            .with_smileys(SmileyTable::new(vec![
                Smiley::new(":)", "/s/smile.png"),
                Smiley::new("<3", "/s/heart.png"),
            ]))
            .with_users(Arc::new(users))
    }

    #[test]
    fn test_stages_run_in_order() {
        let fetcher = Arc::new(MockFetcher::new());
        let message = pipeline(&fetcher).process("hello", None).unwrap();
        assert_eq!(message.stages(), Stage::ORDER);
    }

    #[test]
    fn test_empty_body_halts() {
        let fetcher = Arc::new(MockFetcher::new());
        let err = pipeline(&fetcher).process(" \n ", None).unwrap_err();
        assert_eq!(err, PipelineError::EmptyBody);
    }

    #[test]
    fn test_full_message() {
        let fetcher = Arc::new(MockFetcher::new().with_page(
            "https://a.example",
            r#"<meta property="og:title" content="A"><meta property="og:description" content="About A">"#,
        ));
        let raw = "  [b]Hi[/b] @Bob :)\nsee https://a.example  ";

        let message = pipeline(&fetcher).process(raw, Some("u1")).unwrap();

        assert_eq!(message.original, raw);
        assert_eq!(
            message.display,
            concat!(
                r#"<span class="bbc-bold">Hi</span> @Bob <img class="smiley" src="/s/smile.png" alt=":)" />"#,
                "\n",
                r#"see <a target="_blank" href="https://a.example">A</a>"#
            )
        );
        assert_eq!(message.markup, "[b]Hi[/b] @Bob :)\nsee https://a.example");
        assert_eq!(message.text, "Hi @Bob :)\nsee https://a.example");
        assert_eq!(message.cards.len(), 1);
        assert!(message.cards_html().contains("About A"));
        assert_eq!(message.mentioned_users.iter().collect::<Vec<_>>(), vec!["u2"]);
        assert_eq!(message.short_preview, "Hi @Bob");
        assert_eq!(message.long_preview, "Hi @Bob \nsee A");
    }

    #[test]
    fn test_url_cap_bounds_fetches() {
        let fetcher = Arc::new(MockFetcher::new());
        let body = (0..50)
            .map(|i| format!("https://h{i}.example/"))
            .collect::<Vec<_>>()
            .join("\n");

        let message = pipeline(&fetcher).process(&body, None).unwrap();

        assert_eq!(fetcher.request_count(), 10);
        assert_eq!(message.display.matches("<a ").count(), 10);
        assert!(message.display.ends_with("https://h49.example/"));
    }

    #[test]
    fn test_preview_truncation() {
        let fetcher = Arc::new(MockFetcher::new());
        let body = "x".repeat(600);

        let message = pipeline(&fetcher).process(&body, None).unwrap();

        assert_eq!(message.long_preview, format!("{}…", "x".repeat(500)));
        assert_eq!(message.short_preview, format!("{}…", "x".repeat(100)));
    }

    #[test]
    fn test_self_mention_excluded() {
        let fetcher = Arc::new(MockFetcher::new());
        let message = pipeline(&fetcher).process("@alice hi", Some("u1")).unwrap();
        assert!(message.mentioned_users.is_empty());
    }

    #[test]
    fn test_smileys_tokenized_before_parse() {
        let fetcher = Arc::new(MockFetcher::new());
        let message = pipeline(&fetcher).process("[b] <3 [/b]", None).unwrap();
        assert_eq!(
            message.display,
            r#"<span class="bbc-bold"> <img class="smiley" src="/s/heart.png" alt="&lt;3" /> </span>"#
        );
        assert!(!message.display.contains(PLACEHOLDER_OPEN));
        assert!(!message.text.contains(PLACEHOLDER_OPEN));
    }

    #[test]
    fn test_heart_legacy_code() {
        let fetcher = Arc::new(MockFetcher::new());
        let message = pipeline(&fetcher).process("love *heartsmiley*", None).unwrap();
        assert!(message.display.contains("/s/heart.png"));
    }

    #[test]
    fn test_user_placeholder_characters_removed() {
        let fetcher = Arc::new(MockFetcher::new());
        let message = pipeline(&fetcher).process("a\u{E000}0\u{E001}b", None).unwrap();
        assert_eq!(message.display, "a0b");
    }

    #[test]
    fn test_markup_degrades_without_failing() {
        let fetcher = Arc::new(MockFetcher::new());
        let message = pipeline(&fetcher).process("[b]bold", None).unwrap();
        assert_eq!(message.display, "[b]bold");
        assert_eq!(message.short_preview, "bold");
    }

    #[test]
    fn test_url_inside_tag_markup_not_rescanned() {
        let fetcher = Arc::new(MockFetcher::new());
        let message = pipeline(&fetcher)
            .process("[url=https://a.example]site[/url]", None)
            .unwrap();
        assert_eq!(fetcher.request_count(), 0);
        assert_eq!(
            message.display,
            r#"<a class="bbc-anchor" href="https://a.example" target="_blank">site</a>"#
        );
    }

    #[test]
    fn test_urls_in_attribute_values_not_enriched() {
        let fetcher = Arc::new(MockFetcher::new());
        let message = pipeline(&fetcher)
            .process(
                r#"[url="see https://a.example"]x[/url] [img]a https://b.example/p.png[/img]"#,
                None,
            )
            .unwrap();
        assert_eq!(fetcher.request_count(), 0);
        assert!(message.cards.is_empty());
        assert_eq!(
            message.display,
            concat!(
                r#"<a class="bbc-anchor" href="see https://a.example" target="_blank">x</a> "#,
                r#"<img class="bbc-image" src="a https://b.example/p.png" />"#
            )
        );
    }

    #[test]
    fn test_anchors_from_custom_tags_open_in_new_window() {
        let grammar = TagGrammar::new([TagDefinition::new("link", r#"<a href="${href}">"#, "</a>")
            .with_attribute(AttributeDefinition::own_value("href"))])
        .unwrap();
        let fetcher = Arc::new(MockFetcher::new());
        let message = pipeline(&fetcher)
            .with_grammar(grammar)
            .process("[link=https://a.example]go[/link]", None)
            .unwrap();
        assert_eq!(fetcher.request_count(), 0);
        assert_eq!(
            message.display,
            r#"<a target="_blank" href="https://a.example">go</a>"#
        );
    }

    #[test]
    fn test_tree_kept_with_smileys_resolved() {
        let fetcher = Arc::new(MockFetcher::new());
        let message = pipeline(&fetcher).process(":)", None).unwrap();
        let tree = message.tree().unwrap();
        assert!(matches!(&tree.children()[0], Node::Tag(tag) if tag.name() == "smiley"));
        assert_eq!(tree.render(RenderTarget::Text), "");
    }

    #[test]
    fn test_json_shape() {
        let fetcher = Arc::new(MockFetcher::new());
        let message = pipeline(&fetcher).process("hi", None).unwrap();
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["display"], "hi");
        assert_eq!(json["short_preview"], "hi");
        assert!(json.get("tree").is_none());
        assert!(json.get("stages").is_none());
    }
}
