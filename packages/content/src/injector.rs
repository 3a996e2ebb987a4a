//! # Content Injector
//!
//! Writes a [`ContentDocument`] into an HTML template.
//!
//! ## Rules
//!
//! - Metadata is written first, then each section in document order
//! - A section's root is its own selector, else the structural class of its kind
//! - `None` fields leave markup alone; writing an equal value changes no bytes
//! - Repeated items are paired with existing nodes; nothing is ever cloned,
//!   inserted or removed (excess content items are dropped with a warning)
//! - Values containing newlines become text separated by `<br>` elements
//! - `featured` flags toggle a class on the item and `hidden` on its badge
//!
//! Selector and type problems never fail the call; they come back as
//! [`InjectWarning`]s. Only a template that cannot be parsed is an error.

use crate::error::InjectError;
use crate::live::{Annotate, LiveDocument};
use crate::model::{
    BannerContent, BodyContent, ContactContent, ContentDocument, EventsContent, FaqContent,
    FooterContent, FormContent, HeroContent, InfoContent, Keyed, Metadata, Section,
    SectionContent, TeamContent,
};
use pagesmith_parser::{HtmlDocument, NodeId};
use serde::Serialize;
use std::fmt;

/// Attribute that opts a repeated node into id-based pairing
pub const ITEM_ID_ATTR: &str = "data-item-id";

/// Class toggled on featured team members and events
pub const FEATURED_CLASS: &str = "featured";

const FEATURED_BADGE: &str = ".featured-badge";
const METADATA_SCOPE: &str = "metadata";

/// Non-fatal problem encountered while injecting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InjectWarning {
    #[serde(rename_all = "camelCase")]
    SectionNotFound { section_id: String, selector: String },

    #[serde(rename_all = "camelCase")]
    SelectorNotFound { section_id: String, selector: String },

    #[serde(rename_all = "camelCase")]
    UnknownSectionType { section_id: String, type_name: String },

    #[serde(rename_all = "camelCase")]
    ItemsDropped {
        section_id: String,
        selector: String,
        supplied: usize,
        available: usize,
    },
}

impl fmt::Display for InjectWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InjectWarning::SectionNotFound {
                section_id,
                selector,
            } => write!(
                f,
                "Section \"{}\" skipped: selector \"{}\" not found",
                section_id, selector
            ),
            InjectWarning::SelectorNotFound {
                section_id,
                selector,
            } => write!(
                f,
                "Selector \"{}\" not found in section \"{}\"",
                selector, section_id
            ),
            InjectWarning::UnknownSectionType {
                section_id,
                type_name,
            } => write!(
                f,
                "Section \"{}\" skipped: unknown section type \"{}\"",
                section_id, type_name
            ),
            InjectWarning::ItemsDropped {
                section_id,
                selector,
                supplied,
                available,
            } => write!(
                f,
                "Section \"{}\": {} items supplied but only {} \"{}\" nodes exist; extra items dropped",
                section_id, supplied, available, selector
            ),
        }
    }
}

/// Rendered HTML plus the warnings raised while producing it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InjectReport {
    pub html: String,
    pub warnings: Vec<InjectWarning>,
}

/// Render `content` into `template`.
///
/// The output never carries editor highlighting, even when the template does.
pub fn inject_content_into_html(
    template: &str,
    content: &ContentDocument,
) -> Result<String, InjectError> {
    inject_with_report(template, content).map(|report| report.html)
}

#[tracing::instrument(skip_all, fields(sections = content.sections.len()))]
pub fn inject_with_report(
    template: &str,
    content: &ContentDocument,
) -> Result<InjectReport, InjectError> {
    let mut live = LiveDocument::new(template)?;
    let warnings = live.apply(content);
    let html = live.render(Annotate::None);
    tracing::debug!(
        warnings = warnings.len(),
        changed = live.changed().len(),
        "content injected"
    );
    Ok(InjectReport { html, warnings })
}

/// Applies content to a parsed document, recording what it touched
pub(crate) struct Injector<'d> {
    doc: &'d mut HtmlDocument,
    warnings: Vec<InjectWarning>,
    changed: Vec<NodeId>,
}

impl<'d> Injector<'d> {
    pub(crate) fn new(doc: &'d mut HtmlDocument) -> Self {
        Self {
            doc,
            warnings: Vec::new(),
            changed: Vec::new(),
        }
    }

    /// Apply everything and return `(warnings, changed element ids)`
    pub(crate) fn run(mut self, content: &ContentDocument) -> (Vec<InjectWarning>, Vec<NodeId>) {
        self.metadata(&content.metadata);
        for section in &content.sections {
            self.section(section);
        }
        (self.warnings, self.changed)
    }

    // ------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------

    fn metadata(&mut self, meta: &Metadata) {
        let root = self.doc.root();
        self.text(root, "title", meta.title.as_deref(), METADATA_SCOPE);
        self.meta(r#"meta[name="description"]"#, meta.description.as_deref(), true);

        if !meta.keywords.is_empty() {
            let keywords = meta.keywords.join(", ");
            self.meta(r#"meta[name="keywords"]"#, Some(&keywords), true);
        }

        self.meta(r#"meta[property="og:title"]"#, meta.resolved_og_title(), false);
        self.meta(
            r#"meta[property="og:description"]"#,
            meta.resolved_og_description(),
            false,
        );
        self.meta(r#"meta[property="og:image"]"#, meta.og_image.as_deref(), false);
        self.meta(r#"meta[name="twitter:title"]"#, meta.resolved_twitter_title(), false);
        self.meta(
            r#"meta[name="twitter:description"]"#,
            meta.resolved_twitter_description(),
            false,
        );
        self.meta(r#"meta[name="twitter:image"]"#, meta.resolved_twitter_image(), false);
    }

    /// Write a meta tag's `content`; social tags are optional in templates
    fn meta(&mut self, selector: &str, value: Option<&str>, required: bool) {
        let Some(value) = value else {
            return;
        };
        match self.doc.query_selector(selector) {
            Some(id) => self.write_attr(id, "content", value),
            None if required => self.missing(METADATA_SCOPE, selector),
            None => tracing::debug!(selector, "optional meta tag absent from template"),
        }
    }

    // ------------------------------------------------------------------
    // Sections
    // ------------------------------------------------------------------

    fn section(&mut self, section: &Section) {
        let id = section.id.as_str();

        if let SectionContent::Unknown { type_name, .. } = &section.content {
            tracing::warn!(section_id = id, type_name, "unknown section type, skipping");
            self.warnings.push(InjectWarning::UnknownSectionType {
                section_id: id.to_string(),
                type_name: type_name.clone(),
            });
            return;
        }

        let Some(root) = self.locate_root(section) else {
            tracing::warn!(
                section_id = id,
                selector = section.selector.as_str(),
                "section selector not found, skipping"
            );
            self.warnings.push(InjectWarning::SectionNotFound {
                section_id: id.to_string(),
                selector: section.selector.clone(),
            });
            return;
        };

        match &section.content {
            SectionContent::Hero(c) => self.hero(root, c, id),
            SectionContent::Banner(c) => self.banner(root, c, id),
            SectionContent::Content(c) => self.body(root, c, id),
            SectionContent::Team(c) => self.team(root, c, id),
            SectionContent::Events(c) => self.events(root, c, id),
            SectionContent::Form(c) => self.form(root, c, id),
            SectionContent::Info(c) => self.info(root, c, id),
            SectionContent::Faq(c) => self.faq(root, c, id),
            SectionContent::Contact(c) => self.contact(root, c, id),
            SectionContent::Footer(c) => self.footer(root, c, id),
            SectionContent::Unknown { .. } => {}
        }
    }

    fn locate_root(&self, section: &Section) -> Option<NodeId> {
        if !section.selector.trim().is_empty() {
            if let Some(root) = self.doc.query_selector(&section.selector) {
                return Some(root);
            }
        }
        let fallback = section.content.structural_selector()?;
        let root = self.doc.query_selector(fallback)?;
        tracing::debug!(
            section_id = section.id.as_str(),
            fallback,
            "using structural selector for section"
        );
        Some(root)
    }

    fn hero(&mut self, root: NodeId, c: &HeroContent, id: &str) {
        self.text(root, "h1", c.heading.as_deref(), id);
        self.text(root, ".hero-subtitle", c.subheading.as_deref(), id);
        self.text(root, ".hero-cta", c.cta_text.as_deref(), id);
        self.attr(root, ".hero-cta", "href", c.cta_link.as_deref(), id);
        self.attr(root, ".hero-image", "src", c.image.as_deref(), id);
        self.attr(root, ".hero-image", "alt", c.image_alt.as_deref(), id);
    }

    fn banner(&mut self, root: NodeId, c: &BannerContent, id: &str) {
        if let Some(visible) = c.visible {
            if self.doc.set_visible_of(root, visible) {
                self.changed.push(root);
            }
        }
        self.text(root, ".banner-text", c.text.as_deref(), id);
        self.text(root, ".banner-link", c.link_text.as_deref(), id);
        self.attr(root, ".banner-link", "href", c.link_url.as_deref(), id);
    }

    fn body(&mut self, root: NodeId, c: &BodyContent, id: &str) {
        self.text(root, "h2", c.heading.as_deref(), id);
        self.text(root, ".content-body", c.body.as_deref(), id);
        self.attr(root, ".content-image", "src", c.image.as_deref(), id);
        self.attr(root, ".content-image", "alt", c.image_alt.as_deref(), id);
    }

    fn team(&mut self, root: NodeId, c: &TeamContent, id: &str) {
        self.text(root, "h2", c.heading.as_deref(), id);
        for (node, member) in self.items(root, ".team-member", &c.members, id) {
            self.text(node, ".member-name", member.name.as_deref(), id);
            self.text(node, ".member-role", member.role.as_deref(), id);
            self.text(node, ".member-bio", member.bio.as_deref(), id);
            self.attr(node, ".member-photo", "src", member.photo.as_deref(), id);
            self.attr(node, ".member-photo", "alt", member.name.as_deref(), id);
            self.featured(node, member.featured);
        }
    }

    fn events(&mut self, root: NodeId, c: &EventsContent, id: &str) {
        self.text(root, "h2", c.heading.as_deref(), id);
        for (node, event) in self.items(root, ".event-item", &c.events, id) {
            self.text(node, ".event-title", event.title.as_deref(), id);
            self.text(node, ".event-date", event.date.as_deref(), id);
            self.text(node, ".event-time", event.time.as_deref(), id);
            self.text(node, ".event-location", event.location.as_deref(), id);
            self.text(node, ".event-description", event.description.as_deref(), id);
            self.attr(node, ".event-link", "href", event.link.as_deref(), id);
            self.featured(node, event.featured);
        }
    }

    fn form(&mut self, root: NodeId, c: &FormContent, id: &str) {
        self.text(root, "h2", c.heading.as_deref(), id);
        self.text(root, ".form-description", c.description.as_deref(), id);
        self.text(root, r#"button[type="submit"]"#, c.submit_label.as_deref(), id);
        self.attr(root, "form", "action", c.action.as_deref(), id);
    }

    fn info(&mut self, root: NodeId, c: &InfoContent, id: &str) {
        self.text(root, "h2", c.heading.as_deref(), id);
        for (node, item) in self.items(root, ".info-item", &c.items, id) {
            self.text(node, ".info-title", item.title.as_deref(), id);
            self.text(node, ".info-text", item.text.as_deref(), id);
        }
    }

    fn faq(&mut self, root: NodeId, c: &FaqContent, id: &str) {
        self.text(root, "h2", c.heading.as_deref(), id);
        for (node, item) in self.items(root, ".faq-item", &c.items, id) {
            self.text(node, ".faq-question", item.question.as_deref(), id);
            self.text(node, ".faq-answer", item.answer.as_deref(), id);
        }
    }

    fn contact(&mut self, root: NodeId, c: &ContactContent, id: &str) {
        self.text(root, "h2", c.heading.as_deref(), id);
        self.text(root, ".contact-address", c.address.as_deref(), id);

        let tel = c.phone.as_deref().map(phone_href);
        self.text(root, ".contact-phone", c.phone.as_deref(), id);
        self.link_href(root, ".contact-phone", tel.as_deref());

        let mailto = c.email.as_deref().map(|email| format!("mailto:{}", email.trim()));
        self.text(root, ".contact-email", c.email.as_deref(), id);
        self.link_href(root, ".contact-email", mailto.as_deref());

        for (node, button) in self.items(root, ".contact-button", &c.buttons, id) {
            self.write_text(node, button.label.as_deref());
            if let Some(href) = button.href.as_deref() {
                self.write_attr(node, "href", href);
            }
        }
    }

    fn footer(&mut self, root: NodeId, c: &FooterContent, id: &str) {
        self.text(root, ".footer-text", c.text.as_deref(), id);
        self.text(root, ".footer-copyright", c.copyright.as_deref(), id);
        for (node, link) in self.items(root, ".footer-link", &c.links, id) {
            self.write_text(node, link.label.as_deref());
            if let Some(href) = link.href.as_deref() {
                self.write_attr(node, "href", href);
            }
        }
    }

    // ------------------------------------------------------------------
    // Field helpers
    // ------------------------------------------------------------------

    fn missing(&mut self, section_id: &str, selector: &str) {
        tracing::warn!(section_id, selector, "selector not found, field left unchanged");
        self.warnings.push(InjectWarning::SelectorNotFound {
            section_id: section_id.to_string(),
            selector: selector.to_string(),
        });
    }

    fn find(&mut self, scope: NodeId, selector: &str, section_id: &str) -> Option<NodeId> {
        let found = self.doc.first_within(scope, selector);
        if found.is_none() {
            self.missing(section_id, selector);
        }
        found
    }

    fn text(&mut self, scope: NodeId, selector: &str, value: Option<&str>, section_id: &str) {
        if value.is_none() {
            return;
        }
        if let Some(node) = self.find(scope, selector, section_id) {
            self.write_text(node, value);
        }
    }

    fn attr(
        &mut self,
        scope: NodeId,
        selector: &str,
        name: &str,
        value: Option<&str>,
        section_id: &str,
    ) {
        let Some(value) = value else {
            return;
        };
        if let Some(node) = self.find(scope, selector, section_id) {
            self.write_attr(node, name, value);
        }
    }

    /// `href` only makes sense on anchors; other elements are left alone
    fn link_href(&mut self, scope: NodeId, selector: &str, href: Option<&str>) {
        let Some(href) = href else {
            return;
        };
        let Some(node) = self.doc.first_within(scope, selector) else {
            return;
        };
        if self.doc.node(node).local_name() == Some("a") {
            self.write_attr(node, "href", href);
        }
    }

    fn write_text(&mut self, node: NodeId, value: Option<&str>) {
        let Some(value) = value else {
            return;
        };
        let changed = if value.contains('\n') {
            self.doc.set_multiline_text_of(node, value)
        } else {
            self.doc.set_text_of(node, value)
        };
        if changed {
            tracing::debug!(node = node.index(), "text updated");
            self.changed.push(node);
        }
    }

    fn write_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if self.doc.set_attribute_of(node, name, value) {
            tracing::debug!(node = node.index(), attribute = name, "attribute updated");
            self.changed.push(node);
        }
    }

    fn featured(&mut self, item: NodeId, featured: Option<bool>) {
        let Some(featured) = featured else {
            return;
        };
        let mut changed = self.doc.toggle_class(item, FEATURED_CLASS, featured);
        if let Some(badge) = self.doc.first_within(item, FEATURED_BADGE) {
            changed |= self.doc.set_visible_of(badge, featured);
        }
        if changed {
            self.changed.push(item);
        }
    }

    /// Pair content items with existing repeated nodes.
    ///
    /// When every item has an id and every node carries `data-item-id`, items
    /// are matched by id; otherwise the i-th item goes to the i-th node.
    fn items<'i, T: Keyed>(
        &mut self,
        root: NodeId,
        selector: &str,
        items: &'i [T],
        section_id: &str,
    ) -> Vec<(NodeId, &'i T)> {
        let nodes = self.doc.select_within(root, selector);

        let keyed = !items.is_empty()
            && !nodes.is_empty()
            && items.iter().all(|item| item.item_id().is_some())
            && nodes
                .iter()
                .all(|node| self.doc.attribute(*node, ITEM_ID_ATTR).is_some());

        let pairs: Vec<(NodeId, &'i T)> = if keyed {
            items
                .iter()
                .filter_map(|item| {
                    nodes
                        .iter()
                        .find(|node| self.doc.attribute(**node, ITEM_ID_ATTR) == item.item_id())
                        .map(|node| (*node, item))
                })
                .collect()
        } else {
            nodes.iter().copied().zip(items.iter()).collect()
        };

        if pairs.len() < items.len() {
            tracing::warn!(
                section_id,
                selector,
                supplied = items.len(),
                available = nodes.len(),
                "more items than nodes, extra items dropped"
            );
            self.warnings.push(InjectWarning::ItemsDropped {
                section_id: section_id.to_string(),
                selector: selector.to_string(),
                supplied: items.len(),
                available: nodes.len(),
            });
        }

        pairs
    }
}

/// `tel:` link for a human-formatted number
fn phone_href(phone: &str) -> String {
    let dialable: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    format!("tel:{}", dialable)
}
