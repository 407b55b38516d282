//! Term counting, corpus statistics and TF-IDF weighting.

pub mod analyzer;
pub mod corpus;
pub mod stem;
pub mod tfidf;
pub mod token;
