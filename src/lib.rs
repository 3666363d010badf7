//! Competitor Overlap - classifies client/competitor site pairs by the
//! product categories they share.
//!
//! Categories are scraped from each site with tiered heuristics, cached in
//! SQLite, compared with fuzzy, edit-distance and token-cosine probes, and
//! every spreadsheet row is labelled PASS, MARGINAL, FAIL or SKIPPED.

// Module declarations
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod cli;
pub mod commands;

#[cfg(test)]
pub mod test_utils;
