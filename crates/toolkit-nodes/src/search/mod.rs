//! Retrieval nodes

pub mod keyword_search;
