use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{MarketError, Role};

pub const ADVERTISER_CATEGORY: &str = "Barter Requests";
pub const MEDIA_OWNER_CATEGORY: &str = "Available Barters";

const MEDIA_OWNER_KEYWORDS: [&str; 3] = ["available", "media", "owner"];
const ADVERTISER_KEYWORDS: [&str; 3] = ["request", "advertis", "seeking"];

/// Role a listing was authored under
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingOwner {
    Advertiser,
    MediaOwner,
}

impl ListingOwner {
    /// Media owners publish offers; everyone else (admins and unknown roles included)
    /// publishes as an advertiser.
    pub fn for_role(role: Option<Role>) -> Self {
        match role {
            Some(Role::MediaOwner) => Self::MediaOwner,
            _ => Self::Advertiser,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match Role::parse(value)? {
            Role::Advertiser => Some(Self::Advertiser),
            Role::MediaOwner => Some(Self::MediaOwner),
            Role::Admin => None,
        }
    }

    pub fn category_label(&self) -> &'static str {
        match self {
            Self::Advertiser => ADVERTISER_CATEGORY,
            Self::MediaOwner => MEDIA_OWNER_CATEGORY,
        }
    }

    fn legacy_keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Advertiser => &ADVERTISER_KEYWORDS,
            Self::MediaOwner => &MEDIA_OWNER_KEYWORDS,
        }
    }
}

/// A validated marketplace listing. Only constructed through [`Listing::from_raw`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub location: String,
    pub description: String,
    pub seeking: String,
    pub contact: String,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_role: Option<ListingOwner>,
    #[serde(rename = "type")]
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Listing as it arrives from the backend: every field optional, a few spellings accepted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawListing {
    pub id: Option<Value>,
    #[serde(rename = "_id")]
    pub mongo_id: Option<Value>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub seeking: Option<String>,
    /// Phone numbers sometimes arrive as JSON numbers
    pub contact: Option<Value>,
    pub verified: Option<bool>,
    #[serde(rename = "ownerRole")]
    pub owner_role: Option<String>,
    #[serde(rename = "owner_role")]
    pub owner_role_snake: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn scalar_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_blank(Some(s)),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Listing {
    /// Validation boundary: `None` when the record has no id or misses one of
    /// `title`, `location`, `description`, `contact`.
    pub fn from_raw(raw: RawListing) -> Option<Self> {
        let id = scalar_text(raw.id).or_else(|| scalar_text(raw.mongo_id))?;
        Some(Self {
            id,
            title: non_blank(raw.title)?,
            location: non_blank(raw.location)?,
            description: non_blank(raw.description)?,
            contact: scalar_text(raw.contact)?,
            seeking: raw.seeking.map(|s| s.trim().to_string()).unwrap_or_default(),
            verified: raw.verified.unwrap_or(false),
            owner_role: raw
                .owner_role
                .or(raw.owner_role_snake)
                .as_deref()
                .and_then(ListingOwner::parse),
            category: raw.kind.or(raw.category).unwrap_or_default(),
            image: non_blank(raw.image),
        })
    }

    pub fn from_json(value: Value) -> Option<Self> {
        serde_json::from_value::<RawListing>(value)
            .ok()
            .and_then(Self::from_raw)
    }

    /// Text searched by the marketplace search box, lowercased
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.title, self.location, self.description, self.seeking
        )
        .to_lowercase()
    }

    /// Whether this listing belongs under `owner`. Legacy records without `ownerRole`
    /// fall back to a loose match on the category label.
    pub fn is_owned_by(&self, owner: ListingOwner) -> bool {
        match self.owner_role {
            Some(role) => role == owner,
            None => {
                let label = self.category.to_lowercase();
                owner
                    .legacy_keywords()
                    .iter()
                    .any(|keyword| label.contains(keyword))
            }
        }
    }

    /// Folds a confirmed server copy into this record, keeping optional fields
    /// the server left out.
    pub fn merge_from(&mut self, server: Listing) {
        let owner_role = server.owner_role.or(self.owner_role);
        let image = server.image.or_else(|| self.image.take());
        let category = if server.category.is_empty() {
            std::mem::take(&mut self.category)
        } else {
            server.category
        };

        self.title = server.title;
        self.location = server.location;
        self.description = server.description;
        self.seeking = server.seeking;
        self.contact = server.contact;
        self.verified = server.verified;
        self.owner_role = owner_role;
        self.category = category;
        self.image = image;
    }
}

/// Validates a batch of loosely typed records and keeps the valid ones in order
pub fn ingest(values: Vec<Value>) -> Vec<Listing> {
    let total = values.len();
    let listings: Vec<Listing> = values.into_iter().filter_map(Listing::from_json).collect();
    if listings.len() < total {
        log::warn!(
            "⚠️ {} listing(s) dropped: missing id, title, location, description or contact",
            total - listings.len()
        );
    }
    listings
}

/// Unsaved listing form contents
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub title: String,
    pub location: String,
    pub description: String,
    #[serde(default)]
    pub seeking: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl ListingDraft {
    pub fn validate(&self) -> Result<(), MarketError> {
        let missing: Vec<&str> = [
            ("title", &self.title),
            ("location", &self.location),
            ("description", &self.description),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MarketError::validation(format!(
                "Please fill in: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Body of `POST /listings`
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewListing {
    pub title: String,
    pub location: String,
    pub description: String,
    pub seeking: String,
    pub contact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub owner_role: ListingOwner,
    #[serde(rename = "type")]
    pub category: String,
}

impl NewListing {
    /// Tags a draft with the acting role. An empty contact falls back to `fallback_contact`.
    pub fn from_draft(
        draft: &ListingDraft,
        owner: ListingOwner,
        fallback_contact: Option<String>,
    ) -> Self {
        let contact = match draft.contact.trim() {
            "" => fallback_contact.unwrap_or_default(),
            contact => contact.to_string(),
        };
        Self {
            title: draft.title.trim().to_string(),
            location: draft.location.trim().to_string(),
            description: draft.description.trim().to_string(),
            seeking: draft.seeking.trim().to_string(),
            contact,
            image: non_blank(draft.image.clone()),
            owner_role: owner,
            category: owner.category_label().to_string(),
        }
    }
}

/// Body of `PUT /listings/{id}`; only the changed fields are sent
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl ListingPatch {
    pub fn verified(verified: bool) -> Self {
        Self {
            verified: Some(verified),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.location.is_none()
            && self.verified.is_none()
    }

    pub fn validate(&self) -> Result<(), MarketError> {
        if self.is_empty() {
            return Err(MarketError::validation("Nothing to update"));
        }
        let blank = [
            ("title", &self.title),
            ("description", &self.description),
            ("location", &self.location),
        ]
        .into_iter()
        .find(|(_, value)| value.as_deref().is_some_and(|v| v.trim().is_empty()));

        match blank {
            Some((name, _)) => Err(MarketError::validation(format!("The {} cannot be empty", name))),
            None => Ok(()),
        }
    }

    pub fn apply_to(&self, listing: &mut Listing) {
        if let Some(title) = &self.title {
            listing.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            listing.description = description.trim().to_string();
        }
        if let Some(category) = &self.category {
            listing.category = category.clone();
        }
        if let Some(location) = &self.location {
            listing.location = location.trim().to_string();
        }
        if let Some(verified) = self.verified {
            listing.verified = verified;
        }
    }
}

/// Which listings a view loads
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListingScope {
    /// Whole marketplace, no token needed
    Public,
    /// Listings authored by the current session
    Mine,
}

/// Category tabs of the marketplace browser
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Advertisers,
    MediaOwners,
    /// Any other tag: substring match on the category label
    Label(String),
}

impl CategoryFilter {
    pub fn from_tag(tag: &str) -> Self {
        let normalized = tag.trim().to_lowercase();
        match normalized.as_str() {
            "" | "all" => Self::All,
            "advertisers" | "advertiser" => Self::Advertisers,
            "media owners" | "media owner" | "media_owner" => Self::MediaOwners,
            _ => Self::Label(normalized),
        }
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        match self {
            Self::All => true,
            Self::Advertisers => listing.is_owned_by(ListingOwner::Advertiser),
            Self::MediaOwners => listing.is_owned_by(ListingOwner::MediaOwner),
            Self::Label(label) => listing.category.to_lowercase().contains(label.as_str()),
        }
    }
}
