// ---------------------------------------------------------------------------
// Search queries
// ---------------------------------------------------------------------------

/// One watched model with its inclusive price band (EUR).
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    pub min_price: u32,
    pub max_price: u32,
}

impl SearchQuery {
    pub fn new(query: &str, min_price: u32, max_price: u32) -> Self {
        Self {
            query: query.to_string(),
            min_price,
            max_price,
        }
    }
}

/// The compiled-in watch list. Editing this list changes what is monitored.
pub fn watch_list() -> Vec<SearchQuery> {
    vec![
        SearchQuery::new("iPhone 12", 100, 180),
        SearchQuery::new("iPhone 13", 100, 200),
        SearchQuery::new("iPhone 13 Pro", 120, 240),
        SearchQuery::new("iPhone 14", 150, 250),
        SearchQuery::new("iPhone 14 Pro", 120, 290),
        SearchQuery::new("iPad 10", 50, 230),
        SearchQuery::new("iPad Air 5", 50, 270),
        SearchQuery::new("iPad Air 6", 50, 300),
        SearchQuery::new("iPad Mini 6", 50, 220),
        SearchQuery::new("iPad Mini 7", 50, 350),
        SearchQuery::new("iPad Pro 11", 50, 400),
        SearchQuery::new("iPad Pro 12.9", 50, 380),
    ]
}

// ---------------------------------------------------------------------------
// Ads
// ---------------------------------------------------------------------------

/// Raw extraction result for a single listing tile. Every field is
/// independently optional — the site renders placeholder tiles without a
/// title, and real listings may omit price or description.
#[derive(Debug, Clone, Default)]
pub struct AdCandidate {
    /// Site-assigned listing id; empty when the tile carries none.
    pub id: String,
    pub title: Option<String>,
    pub price_text: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
}

impl AdCandidate {
    /// Finalize a candidate that passed all filters into a record fit for
    /// notification and dedup.
    pub fn into_record(self) -> AdRecord {
        AdRecord {
            id: self.id,
            title: self.title.unwrap_or_else(|| "Kein Titel".to_string()),
            price: self.price_text.unwrap_or_else(|| "Kein Preis".to_string()),
            description: self
                .description
                .unwrap_or_else(|| "Keine Beschreibung".to_string()),
            link: self.link.unwrap_or_default(),
        }
    }
}

/// A listing that passed all filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdRecord {
    pub id: String,
    pub title: String,
    pub price: String,
    pub description: String,
    pub link: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_list_bands_are_ordered() {
        for q in watch_list() {
            assert!(
                q.min_price <= q.max_price,
                "{} has inverted price band",
                q.query
            );
        }
    }

    #[test]
    fn into_record_fills_placeholders() {
        let record = AdCandidate {
            id: "123".to_string(),
            title: Some("iPad 10".to_string()),
            ..Default::default()
        }
        .into_record();
        assert_eq!(record.price, "Kein Preis");
        assert_eq!(record.description, "Keine Beschreibung");
        assert_eq!(record.link, "");
    }
}
