// ============================================================================
// VIEWS - JS-facing wrappers, no business logic
// ============================================================================

pub mod marketplace;
pub mod search_debouncer;

pub use marketplace::MarketplaceView;
pub use search_debouncer::SearchDebouncer;
