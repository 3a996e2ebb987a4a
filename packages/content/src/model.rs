//! # Content model
//!
//! A [`ContentDocument`] is the markup-independent description of a page:
//! page metadata plus an ordered list of [`Section`]s. Each section carries a
//! typed payload ([`SectionContent`]) selected by its `type` tag on the wire.
//!
//! ```json
//! {
//!   "metadata": { "title": "Home", "ogTitle": "Welcome" },
//!   "sections": [
//!     { "id": "hero", "label": "Hero", "type": "hero", "selector": "#hero",
//!       "content": { "heading": "New" } }
//!   ]
//! }
//! ```
//!
//! Section types this build does not know are kept as
//! [`SectionContent::Unknown`] so they survive a load/save cycle untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDocument {
    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default)]
    pub sections: Vec<Section>,
}

impl ContentDocument {
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn section_mut(&mut self, id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    /// First section id that appears more than once
    pub fn duplicate_section_id(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.sections
            .iter()
            .map(|s| s.id.as_str())
            .find(|id| !seen.insert(*id))
    }
}

/// Page-level metadata written into `<head>`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_image: Option<String>,
}

impl Metadata {
    pub fn resolved_og_title(&self) -> Option<&str> {
        self.og_title.as_deref().or(self.title.as_deref())
    }

    pub fn resolved_og_description(&self) -> Option<&str> {
        self.og_description
            .as_deref()
            .or(self.description.as_deref())
    }

    pub fn resolved_twitter_title(&self) -> Option<&str> {
        self.twitter_title
            .as_deref()
            .or_else(|| self.resolved_og_title())
    }

    pub fn resolved_twitter_description(&self) -> Option<&str> {
        self.twitter_description
            .as_deref()
            .or_else(|| self.resolved_og_description())
    }

    pub fn resolved_twitter_image(&self) -> Option<&str> {
        self.twitter_image.as_deref().or(self.og_image.as_deref())
    }
}

/// A typed slice of the page bound to one markup location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSection", into = "RawSection")]
pub struct Section {
    pub id: String,
    pub label: String,
    /// Root of the section in the page; empty means "use the structural class"
    pub selector: String,
    pub content: SectionContent,
}

impl Section {
    pub fn new(id: impl Into<String>, selector: impl Into<String>, content: SectionContent) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            selector: selector.into(),
            content,
        }
    }

    pub fn type_name(&self) -> &str {
        self.content.type_name()
    }

    /// Wire form of the section as a JSON value
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// Section as it appears on the wire, before the payload is typed
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSection {
    id: String,
    #[serde(default)]
    label: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    selector: String,
    #[serde(default)]
    content: Value,
}

impl TryFrom<RawSection> for Section {
    type Error = serde_json::Error;

    fn try_from(raw: RawSection) -> Result<Self, Self::Error> {
        let content = SectionContent::from_tagged(&raw.type_name, raw.content)?;
        Ok(Section {
            id: raw.id,
            label: raw.label,
            selector: raw.selector,
            content,
        })
    }
}

impl From<Section> for RawSection {
    fn from(section: Section) -> Self {
        let type_name = section.content.type_name().to_string();
        RawSection {
            id: section.id,
            label: section.label,
            type_name,
            selector: section.selector,
            content: section.content.into_payload(),
        }
    }
}

/// Typed section payload
#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent {
    Hero(HeroContent),
    Banner(BannerContent),
    Content(BodyContent),
    Team(TeamContent),
    Events(EventsContent),
    Form(FormContent),
    Info(InfoContent),
    Faq(FaqContent),
    Contact(ContactContent),
    Footer(FooterContent),
    Unknown { type_name: String, payload: Value },
}

impl SectionContent {
    pub fn type_name(&self) -> &str {
        match self {
            SectionContent::Hero(_) => "hero",
            SectionContent::Banner(_) => "banner",
            SectionContent::Content(_) => "content",
            SectionContent::Team(_) => "team",
            SectionContent::Events(_) => "events",
            SectionContent::Form(_) => "form",
            SectionContent::Info(_) => "info",
            SectionContent::Faq(_) => "faq",
            SectionContent::Contact(_) => "contact",
            SectionContent::Footer(_) => "footer",
            SectionContent::Unknown { type_name, .. } => type_name,
        }
    }

    /// Fixed structural class used when a section's own selector is missing
    pub fn structural_selector(&self) -> Option<&'static str> {
        match self {
            SectionContent::Hero(_) => Some(".hero"),
            SectionContent::Banner(_) => Some(".banner"),
            SectionContent::Content(_) => Some(".content-section"),
            SectionContent::Team(_) => Some(".team"),
            SectionContent::Events(_) => Some(".events"),
            SectionContent::Form(_) => Some(".form-section"),
            SectionContent::Info(_) => Some(".info"),
            SectionContent::Faq(_) => Some(".faq"),
            SectionContent::Contact(_) => Some(".contact"),
            SectionContent::Footer(_) => Some(".footer"),
            SectionContent::Unknown { .. } => None,
        }
    }

    fn from_tagged(type_name: &str, payload: Value) -> Result<Self, serde_json::Error> {
        // A missing payload is an empty one
        let payload = match payload {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        Ok(match type_name {
            "hero" => SectionContent::Hero(serde_json::from_value(payload)?),
            "banner" => SectionContent::Banner(serde_json::from_value(payload)?),
            "content" => SectionContent::Content(serde_json::from_value(payload)?),
            "team" => SectionContent::Team(serde_json::from_value(payload)?),
            "events" => SectionContent::Events(serde_json::from_value(payload)?),
            "form" => SectionContent::Form(serde_json::from_value(payload)?),
            "info" => SectionContent::Info(serde_json::from_value(payload)?),
            "faq" => SectionContent::Faq(serde_json::from_value(payload)?),
            "contact" => SectionContent::Contact(serde_json::from_value(payload)?),
            "footer" => SectionContent::Footer(serde_json::from_value(payload)?),
            other => SectionContent::Unknown {
                type_name: other.to_string(),
                payload,
            },
        })
    }

    fn into_payload(self) -> Value {
        let encoded = match self {
            SectionContent::Hero(c) => serde_json::to_value(c),
            SectionContent::Banner(c) => serde_json::to_value(c),
            SectionContent::Content(c) => serde_json::to_value(c),
            SectionContent::Team(c) => serde_json::to_value(c),
            SectionContent::Events(c) => serde_json::to_value(c),
            SectionContent::Form(c) => serde_json::to_value(c),
            SectionContent::Info(c) => serde_json::to_value(c),
            SectionContent::Faq(c) => serde_json::to_value(c),
            SectionContent::Contact(c) => serde_json::to_value(c),
            SectionContent::Footer(c) => serde_json::to_value(c),
            SectionContent::Unknown { payload, .. } => return payload,
        };
        // Payload structs only hold strings, bools and vectors of those
        encoded.unwrap_or(Value::Null)
    }
}

/// Repeated sub-items that may carry a stable id
pub trait Keyed {
    fn item_id(&self) -> Option<&str>;
}

macro_rules! keyed {
    ($($ty:ty),* $(,)?) => {
        $(impl Keyed for $ty {
            fn item_id(&self) -> Option<&str> {
                self.id.as_deref()
            }
        })*
    };
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeroContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subheading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BannerContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

/// Payload of a generic `content` section
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BodyContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    pub members: Vec<TeamMember>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamMember {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventsContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    pub events: Vec<EventItem>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InfoContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    pub items: Vec<InfoItem>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InfoItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FaqContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    pub items: Vec<FaqItem>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FaqItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub buttons: Vec<ContactButton>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactButton {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FooterContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    pub links: Vec<FooterLink>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FooterLink {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

keyed!(TeamMember, EventItem, InfoItem, FaqItem, ContactButton, FooterLink);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_section_roundtrip_through_wire_form() {
        let value = json!({
            "id": "hero",
            "label": "Hero",
            "type": "hero",
            "selector": "#hero",
            "content": { "heading": "New", "ctaText": "Go" }
        });
        let section = Section::from_value(value.clone()).unwrap();
        let SectionContent::Hero(hero) = &section.content else {
            panic!("expected hero content");
        };
        assert_eq!(hero.heading.as_deref(), Some("New"));
        assert_eq!(hero.cta_text.as_deref(), Some("Go"));
        assert_eq!(section.to_value().unwrap(), value);
    }

    #[test]
    fn test_unknown_type_is_preserved() {
        let value = json!({
            "id": "gallery",
            "type": "gallery",
            "content": { "images": ["a.png"] }
        });
        let section = Section::from_value(value).unwrap();
        assert_eq!(section.type_name(), "gallery");
        assert!(section.content.structural_selector().is_none());
        let back = section.to_value().unwrap();
        assert_eq!(back["content"]["images"][0], "a.png");
    }

    #[test]
    fn test_invalid_payload_is_rejected() {
        let value = json!({ "id": "faq", "type": "faq", "content": { "items": "nope" } });
        assert!(Section::from_value(value).is_err());
    }

    #[test]
    fn test_social_fallbacks() {
        let meta = Metadata {
            title: Some("Home".into()),
            og_title: None,
            og_image: Some("/og.png".into()),
            ..Default::default()
        };
        assert_eq!(meta.resolved_og_title(), Some("Home"));
        assert_eq!(meta.resolved_twitter_title(), Some("Home"));
        assert_eq!(meta.resolved_twitter_image(), Some("/og.png"));
        assert_eq!(meta.resolved_twitter_description(), None);
    }

    #[test]
    fn test_duplicate_section_ids() {
        let doc = ContentDocument {
            metadata: Metadata::default(),
            sections: vec![
                Section::new("a", "", SectionContent::Hero(HeroContent::default())),
                Section::new("a", "", SectionContent::Faq(FaqContent::default())),
            ],
        };
        assert_eq!(doc.duplicate_section_id(), Some("a"));
    }
}
