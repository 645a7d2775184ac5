use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::config::{EXCLUDE_KEYWORDS, NEGOTIABLE_MARKER, SITE_BASE_URL};
use crate::types::{AdCandidate, AdRecord, SearchQuery};

/// Extract every listing tile from a rendered results page and return the
/// ones matching `query`, in page order.
///
/// The selectors below are the single site-coupled piece of this crate: they
/// describe whatever markup currently identifies one ad tile and its fields,
/// and they are expected to break when the site changes.
pub fn extract_matching(html: &str, query: &SearchQuery) -> Vec<AdRecord> {
    let document = Html::parse_document(html);
    let tile_sel = Selector::parse("article.aditem").unwrap();
    let title_sel = Selector::parse("a.ellipsis").unwrap();
    let price_sel = Selector::parse("p[class*=\"aditem-main--middle--price\"]").unwrap();
    let desc_sel = Selector::parse("p.aditem-main--middle--description").unwrap();

    let mut records = Vec::new();
    let mut total = 0usize;

    for tile in document.select(&tile_sel) {
        total += 1;

        let id = tile.value().attr("data-adid").unwrap_or("").to_string();
        let title_node = tile.select(&title_sel).next();
        let candidate = AdCandidate {
            id,
            title: title_node.map(|n| collect_text(&n)),
            link: title_node
                .and_then(|n| n.value().attr("href"))
                .map(|href| format!("{SITE_BASE_URL}{href}")),
            price_text: tile.select(&price_sel).next().map(|n| collect_text(&n)),
            description: tile.select(&desc_sel).next().map(|n| collect_text(&n)),
        };

        if passes_filters(&candidate, query) {
            records.push(candidate.into_record());
        }
    }

    info!(
        "{}: {} matching of {} listings on page",
        query.query,
        records.len(),
        total
    );
    records
}

fn collect_text(node: &scraper::ElementRef<'_>) -> String {
    node.text().collect::<String>().trim().to_string()
}

fn passes_filters(candidate: &AdCandidate, query: &SearchQuery) -> bool {
    // Titleless tiles are placeholder/ad-slot markup, not listings.
    let Some(title) = candidate.title.as_deref().filter(|t| !t.is_empty()) else {
        debug!("skipping listing without title");
        return false;
    };
    let title_lower = title.to_lowercase();

    if let Some(keyword) = EXCLUDE_KEYWORDS.iter().find(|k| title_lower.contains(*k)) {
        debug!("excluded \"{title_lower}\" (stoplist match: {keyword})");
        return false;
    }

    // The marketplace search is fuzzy; for phone/tablet queries narrow it to
    // near-exact model mentions in title or description.
    let query_lower = query.query.to_lowercase();
    if (query_lower.contains("ipad") || query_lower.contains("iphone"))
        && !mentions_model(&query_lower, &title_lower, candidate.description.as_deref())
    {
        debug!("excluded \"{title_lower}\" (no exact model mention)");
        return false;
    }

    price_in_band(candidate.price_text.as_deref(), query, &title_lower)
}

/// Whitespace-stripped containment check: "iphone 13" matches a title
/// "iphone13 128gb wie neu".
fn mentions_model(query_lower: &str, title_lower: &str, description: Option<&str>) -> bool {
    let needle: String = query_lower.split_whitespace().collect();
    let title_stripped: String = title_lower.split_whitespace().collect();
    if title_stripped.contains(&needle) {
        return true;
    }
    description.is_some_and(|d| {
        let desc_stripped: String = d.to_lowercase().split_whitespace().collect();
        desc_stripped.contains(&needle)
    })
}

/// Negotiable ("VB") and missing prices always count as in range. Anything
/// else is normalized to digits plus separators, comma treated as the
/// decimal separator, and compared inclusively against the query's band.
fn price_in_band(price_text: Option<&str>, query: &SearchQuery, title_lower: &str) -> bool {
    let raw = price_text.unwrap_or("").trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case(NEGOTIABLE_MARKER) {
        return true;
    }

    let cleaned: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == ',' || *ch == '.')
        .collect();
    let normalized = cleaned.replace(',', ".");
    let price = if normalized.is_empty() {
        0.0
    } else {
        match normalized.parse::<f64>() {
            Ok(p) => p,
            Err(_) => {
                debug!("excluded \"{title_lower}\" (unparseable price \"{raw}\")");
                return false;
            }
        }
    };

    f64::from(query.min_price) <= price && price <= f64::from(query.max_price)
}
