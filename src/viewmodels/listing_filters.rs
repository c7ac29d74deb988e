// Pure derived views over a listing collection. Debouncing belongs to the view.

use crate::models::{CategoryFilter, Listing};

/// Case-insensitive substring match over title, location, description and
/// seeking. A blank query matches everything.
pub fn search<'a>(listings: &'a [Listing], query: &str) -> Vec<&'a Listing> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return listings.iter().collect();
    }
    listings
        .iter()
        .filter(|listing| listing.search_text().contains(&needle))
        .collect()
}

pub fn filter_by_category<'a>(listings: &'a [Listing], tag: &str) -> Vec<&'a Listing> {
    let filter = CategoryFilter::from_tag(tag);
    listings
        .iter()
        .filter(|listing| filter.matches(listing))
        .collect()
}
