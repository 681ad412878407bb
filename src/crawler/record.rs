//! Listing records as they flow from extraction to output

/// One listing harvested from a category page
///
/// Created by card extraction, optionally enriched from the listing's own
/// detail page, then handed to the output and never touched again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    pub title: Option<String>,

    /// Absolute listing URL; doubles as the identity key
    pub url: String,

    pub price: Option<String>,

    /// Location and posting date text, as shown on the card
    pub location: Option<String>,

    /// Absolute thumbnail URL
    pub image: Option<String>,

    /// Fields only present after enrichment
    pub details: Option<ListingDetails>,
}

impl ListingRecord {
    /// Creates a record carrying only its identity key
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            title: None,
            url: url.into(),
            price: None,
            location: None,
            image: None,
            details: None,
        }
    }

    /// The key used to detect the same listing across pages
    pub fn identity_key(&self) -> &str {
        &self.url
    }

    /// Attaches detail-page fields; base fields are left untouched
    pub fn enrich(&mut self, details: ListingDetails) {
        self.details = Some(details);
    }

    pub fn is_enriched(&self) -> bool {
        self.details.is_some()
    }
}

/// Extended fields scraped from a listing's detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingDetails {
    pub description: Option<String>,

    /// Parameter line without a `key: value` shape (private person, business, ...)
    pub seller_type: Option<String>,

    /// `key: value` parameters in page order
    pub parameters: Vec<(String, String)>,

    /// Gallery image URLs in page order
    pub gallery: Vec<String>,

    pub listing_id: Option<String>,
    pub views: Option<String>,
    pub trader_title: Option<String>,
    pub seller_name: Option<String>,
    pub seller_rating: Option<String>,
    pub seller_reviews: Option<String>,
    pub deliveries: Option<String>,
    pub member_since: Option<String>,
    pub last_seen: Option<String>,
}

impl ListingDetails {
    /// Serializes the parameters as a JSON object, keeping page order
    ///
    /// Returns an empty string when the page had no parameters.
    pub fn parameters_json(&self) -> String {
        if self.parameters.is_empty() {
            return String::new();
        }

        let map: serde_json::Map<String, serde_json::Value> = self
            .parameters
            .iter()
            .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
            .collect();

        serde_json::Value::Object(map).to_string()
    }

    /// Gallery URLs joined with `;`
    pub fn gallery_joined(&self) -> String {
        self.gallery.join(";")
    }
}
