//! Category matching domain constants
//!
//! Vocabularies and bounds shared by extraction and comparison.

/// Category label shape rules
pub mod labels {
    /// Shortest label kept after cleanup
    pub const MIN_LABEL_LEN: usize = 3;

    /// Longest label kept in a category set
    pub const MAX_LABEL_LEN: usize = 30;

    /// Maximum labels kept per URL, in discovery order
    pub const MAX_CATEGORIES: usize = 20;
}

/// Extraction heuristics vocabulary
pub mod extraction {
    /// Anchor text containing any of these is never a category
    pub const EXCLUDED_LINK_TERMS: &[&str] = &[
        "home", "about", "contact", "privacy", "terms", "shipping", "login", "signup", "search",
        "cart", "wishlist",
    ];

    /// Anchor text length window used by navigation and generic link tiers
    pub const LINK_TEXT_MIN_LEN: usize = 3;
    pub const LINK_TEXT_MAX_LEN: usize = 50;

    /// Breadcrumb text window
    pub const BREADCRUMB_MIN_LEN: usize = 3;
    pub const BREADCRUMB_MAX_LEN: usize = 30;

    /// Filter/facet text window
    pub const FACET_MIN_LEN: usize = 3;
    pub const FACET_MAX_LEN: usize = 25;

    /// Href path segments that point at category listings
    pub const CATEGORY_PATH_SEGMENTS: &[&str] = &[
        "/category", "/collection", "/shop", "/products", "/store", "/dept",
    ];

    /// Vertical keywords that mark an href as category-like
    pub const VERTICAL_URL_KEYWORDS: &[&str] = &[
        "electronics", "clothing", "fashion", "books", "grocery", "beauty", "home", "garden",
        "auto", "moto", "sport",
    ];

    /// JSON-LD `@type` values that can carry categories
    pub const STRUCTURED_DATA_TYPES: &[&str] =
        &["Product", "ProductGroup", "Collection", "WebPage", "Breadcrumb"];
}

/// Similarity scoring constants
pub mod scoring {
    /// Client labels containing one of these get the category weight boost
    pub const HIGH_VALUE_TERMS: &[&str] = &[
        "electronics", "clothing", "fashion", "books", "beauty", "home", "garden", "sports",
        "automotive", "toys",
    ];

    pub const HIGH_VALUE_CATEGORY_WEIGHT: f64 = 1.2;
    pub const DEFAULT_CATEGORY_WEIGHT: f64 = 1.0;

    pub const COSINE_METHOD_WEIGHT: f64 = 1.2;
    pub const EDIT_DISTANCE_METHOD_WEIGHT: f64 = 1.1;
    pub const FUZZY_METHOD_WEIGHT: f64 = 1.0;
}
