//! Field extraction from listing, detail and home pages
//!
//! Selectors are keyed to the site's markup and compiled once per run. All
//! references found in markup are resolved against the site origin before
//! they leave this module.

use crate::catalog::Category;
use crate::crawler::record::{ListingDetails, ListingRecord};
use crate::url::absolutize;
use crate::ExtractError;
use scraper::{ElementRef, Html, Selector};

const CARD: &str = r#"div[data-testid="l-card"]"#;
const CARD_TITLE: &str = "h4";
const CARD_LINK: &str = "a.css-1tqlkj0[href]";
const ANY_LINK: &str = "a[href]";
const CARD_PRICE: &str = r#"p[data-testid="ad-price"]"#;
const CARD_LOCATION: &str = r#"p[data-testid="location-date"]"#;
const IMAGE: &str = "img";

const DESCRIPTION: &str = r#"div[data-testid="ad_description"]"#;
const PARAMETERS: &str = r#"div[data-testid="ad-parameters-container"] p"#;
const GALLERY: &str = r#"img[data-testid="ad-photo"]"#;
const FOOTER: &str = r#"div[data-cy="ad-footer-bar-section"]"#;
const FOOTER_ID: &str = "span.css-w85dhy";
const FOOTER_VIEWS: &str = r#"span[data-testid="page-view-counter"]"#;
const SELLER_CARD: &str = r#"div[data-testid="seller_card"]"#;
const TRADER_TITLE: &str = r#"p[data-testid="trader-title"]"#;
const SELLER_NAME: &str = r#"h4[data-testid="user-profile-user-name"]"#;
const SELLER_RATING: &str = r#"div[data-testid="score-widget"] p"#;
const SELLER_REVIEWS: &str = "p.css-1rgx7in";
const DELIVERY_BADGE: &str = r#"div[data-testid="delivery-badge"]"#;
const MEMBER_SINCE: &str = r#"p[data-testid="member-since"]"#;
const LAST_SEEN: &str = r#"p[data-testid="lastSeenBox"]"#;

const CATEGORY_MENU: &str = r#"div[data-testid="home-categories-menu-row"]"#;
const CATEGORY_TITLE: &str = "p.css-1h1uzh8";

/// Compiled selectors plus the origin used to resolve references
#[derive(Debug)]
pub struct Extractor {
    origin: String,
    card: Selector,
    card_title: Selector,
    card_link: Selector,
    any_link: Selector,
    card_price: Selector,
    card_location: Selector,
    image: Selector,
    description: Selector,
    parameters: Selector,
    gallery: Selector,
    footer: Selector,
    footer_id: Selector,
    footer_views: Selector,
    seller_card: Selector,
    trader_title: Selector,
    seller_name: Selector,
    seller_rating: Selector,
    seller_reviews: Selector,
    delivery_badge: Selector,
    member_since: Selector,
    last_seen: Selector,
    category_menu: Selector,
    category_title: Selector,
}

impl Extractor {
    /// Compiles every selector for a site rooted at `origin`
    pub fn new(origin: impl Into<String>) -> Result<Self, ExtractError> {
        Ok(Self {
            origin: origin.into(),
            card: compile(CARD)?,
            card_title: compile(CARD_TITLE)?,
            card_link: compile(CARD_LINK)?,
            any_link: compile(ANY_LINK)?,
            card_price: compile(CARD_PRICE)?,
            card_location: compile(CARD_LOCATION)?,
            image: compile(IMAGE)?,
            description: compile(DESCRIPTION)?,
            parameters: compile(PARAMETERS)?,
            gallery: compile(GALLERY)?,
            footer: compile(FOOTER)?,
            footer_id: compile(FOOTER_ID)?,
            footer_views: compile(FOOTER_VIEWS)?,
            seller_card: compile(SELLER_CARD)?,
            trader_title: compile(TRADER_TITLE)?,
            seller_name: compile(SELLER_NAME)?,
            seller_rating: compile(SELLER_RATING)?,
            seller_reviews: compile(SELLER_REVIEWS)?,
            delivery_badge: compile(DELIVERY_BADGE)?,
            member_since: compile(MEMBER_SINCE)?,
            last_seen: compile(LAST_SEEN)?,
            category_menu: compile(CATEGORY_MENU)?,
            category_title: compile(CATEGORY_TITLE)?,
        })
    }

    /// Extracts candidate records from one listing page, in page order
    ///
    /// # Returns
    ///
    /// * `Ok(vec![])` - The page has no listing cards: the category is exhausted
    /// * `Ok(records)` - Cards without a usable link are skipped
    /// * `Err(ExtractError::Malformed)` - Cards exist but none carries a link,
    ///   which means the markup changed rather than the listings ran out
    pub fn extract_listing_cards(&self, html: &str) -> Result<Vec<ListingRecord>, ExtractError> {
        let document = Html::parse_document(html);

        let mut card_count = 0;
        let mut records = Vec::new();

        for card in document.select(&self.card) {
            card_count += 1;
            match self.extract_card(card) {
                Some(record) => records.push(record),
                None => tracing::debug!("Skipping listing card #{} without a link", card_count),
            }
        }

        if card_count > 0 && records.is_empty() {
            return Err(ExtractError::Malformed(format!(
                "{} listing cards found but none has a link",
                card_count
            )));
        }

        Ok(records)
    }

    fn extract_card(&self, card: ElementRef<'_>) -> Option<ListingRecord> {
        let title_element = card.select(&self.card_title).next();

        let link = title_element
            .and_then(enclosing_link)
            .or_else(|| card.select(&self.card_link).next())
            .or_else(|| card.select(&self.any_link).next())?;

        let url = absolutize(&self.origin, link.value().attr("href")?).ok()?;

        Some(ListingRecord {
            title: title_element.and_then(|e| text_of(e, "")),
            url,
            price: self.first_text(card, &self.card_price, ""),
            location: self.first_text(card, &self.card_location, ""),
            image: card
                .select(&self.image)
                .next()
                .and_then(image_source)
                .and_then(|src| absolutize(&self.origin, src).ok()),
            details: None,
        })
    }

    /// Extracts the extended fields of one listing's detail page
    ///
    /// Missing sections leave their fields empty, so a page with none of the
    /// known sections yields empty details rather than an error.
    pub fn extract_listing_details(&self, html: &str) -> ListingDetails {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let mut details = ListingDetails {
            description: self.first_text(root, &self.description, " "),
            ..Default::default()
        };

        for parameter in root.select(&self.parameters) {
            let Some(text) = text_of(parameter, "") else {
                continue;
            };
            match text.split_once(':') {
                Some((key, value)) => details
                    .parameters
                    .push((key.trim().to_string(), value.trim().to_string())),
                None => details.seller_type = Some(text),
            }
        }

        details.gallery = root
            .select(&self.gallery)
            .filter_map(|img| img.value().attr("src"))
            .filter_map(|src| absolutize(&self.origin, src).ok())
            .collect();

        if let Some(footer) = root.select(&self.footer).next() {
            details.listing_id = self
                .first_text(footer, &self.footer_id, "")
                .and_then(|text| strip_label(&text, "ID:"));
            details.views = self
                .first_text(footer, &self.footer_views, "")
                .and_then(|text| strip_label(&text, "Views:"));
        }

        if let Some(seller) = root.select(&self.seller_card).next() {
            details.trader_title = self.first_text(seller, &self.trader_title, "");
            details.seller_name = self.first_text(seller, &self.seller_name, "");
            details.seller_rating = self.first_text(seller, &self.seller_rating, "");
            details.seller_reviews = self.first_text(seller, &self.seller_reviews, "");
            details.deliveries = self.first_text(seller, &self.delivery_badge, " ");
            details.member_since = self.first_text(seller, &self.member_since, "");
            details.last_seen = self.first_text(seller, &self.last_seen, "");
        }

        details
    }

    /// Extracts the category menu from the site's home page
    pub fn extract_categories(&self, html: &str) -> Vec<Category> {
        let document = Html::parse_document(html);

        let Some(menu) = document.select(&self.category_menu).next() else {
            tracing::warn!("Category menu not found on home page");
            return Vec::new();
        };

        menu.select(&self.any_link)
            .filter_map(|link| {
                let href = link.value().attr("href")?.trim().to_string();
                let id = link.value().attr("data-testid").unwrap_or_default().to_string();
                let title = self
                    .first_text(link, &self.category_title, "")
                    .unwrap_or_else(|| id.clone());
                let image = link
                    .select(&self.image)
                    .next()
                    .and_then(image_source)
                    .unwrap_or_default()
                    .to_string();

                Some(Category {
                    id,
                    title,
                    href,
                    image,
                })
            })
            .collect()
    }

    fn first_text(&self, scope: ElementRef<'_>, selector: &Selector, separator: &str) -> Option<String> {
        scope
            .select(selector)
            .next()
            .and_then(|element| text_of(element, separator))
    }
}

fn compile(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|_| ExtractError::Selector(css.to_string()))
}

/// Joins the trimmed, non-empty text nodes under `element`
fn text_of(element: ElementRef<'_>, separator: &str) -> Option<String> {
    let text = element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(separator);

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Nearest `<a href>` ancestor of an element
fn enclosing_link(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "a" && ancestor.value().attr("href").is_some())
}

/// `src`, or the first candidate of `srcset`
fn image_source(img: ElementRef<'_>) -> Option<&str> {
    img.value()
        .attr("src")
        .filter(|src| !src.trim().is_empty())
        .or_else(|| {
            img.value()
                .attr("srcset")
                .and_then(|srcset| srcset.split_whitespace().next())
        })
}

fn strip_label(text: &str, label: &str) -> Option<String> {
    let value = text.replace(label, "").trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
