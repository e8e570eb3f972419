//! Keyword Search node
//!
//! Ranks documents against a query with Okapi BM25 and returns the best
//! `top_k`. Terms are lowercased runs of alphanumeric characters.

use std::collections::{HashMap, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use toolkit_sdk::{Component, NodeFactory, PortModel, Result, Tag, ToolkitNode};

pub const NODE_NAME: &str = "keyword_search";

const K1: f64 = 1.5;
const B: f64 = 0.75;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Inputs {
    /// Input Documents.
    pub docs: Vec<String>,
    /// Query or the Question to compare against the input text.
    pub query: String,
}

impl PortModel for Inputs {}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Params {
    /// Number of top results to consider (default=3).
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    3
}

impl PortModel for Params {
    fn components() -> Vec<(&'static str, Component)> {
        vec![("top_k", Component::slider(1, 20, 1.0))]
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Outputs {
    /// Top K results.
    pub result: Vec<String>,
}

impl PortModel for Outputs {}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// BM25 score of every document, in input order
pub fn bm25_scores(docs: &[String], query: &str) -> Vec<f64> {
    let tokenized: Vec<Vec<String>> = docs.iter().map(|d| tokenize(d)).collect();
    if tokenized.is_empty() {
        return Vec::new();
    }

    let n = tokenized.len() as f64;
    let avg_len = tokenized.iter().map(Vec::len).sum::<usize>() as f64 / n;

    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    for tokens in &tokenized {
        let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
        for term in unique {
            *doc_freq.entry(term).or_default() += 1;
        }
    }

    let query_terms = tokenize(query);
    tokenized
        .iter()
        .map(|tokens| {
            let len = tokens.len() as f64;
            query_terms
                .iter()
                .map(|term| {
                    let tf = tokens.iter().filter(|t| *t == term).count() as f64;
                    if tf == 0.0 {
                        return 0.0;
                    }
                    let df = doc_freq.get(term.as_str()).copied().unwrap_or(0) as f64;
                    let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
                    let norm = if avg_len > 0.0 { len / avg_len } else { 0.0 };
                    idf * tf * (K1 + 1.0) / (tf + K1 * (1.0 - B + B * norm))
                })
                .sum()
        })
        .collect()
}

/// The `top_k` best documents, best first; ties keep input order
pub fn top_documents(docs: &[String], query: &str, top_k: usize) -> Vec<String> {
    let scores = bm25_scores(docs, query);
    let mut ranked: Vec<usize> = (0..docs.len()).collect();
    ranked.sort_by(|a, b| scores[*b].total_cmp(&scores[*a]));
    ranked
        .into_iter()
        .take(top_k)
        .map(|i| docs[i].clone())
        .collect()
}

pub fn node() -> Result<ToolkitNode> {
    let mut node = ToolkitNode::new(
        NODE_NAME,
        "Perform BM25 retrieval on a list of documents based on a given query.",
    )
    .with_tag(Tag::Ai)
    .with_cost(1);
    node.set_input::<Inputs>()?
        .set_param::<Params>()?
        .set_output::<Outputs>()?;
    node.on_call(|inputs: Inputs, params: Params| async move {
        log::debug!(
            "Ranking {} document(s), keeping {}",
            inputs.docs.len(),
            params.top_k
        );
        Ok(Outputs {
            result: top_documents(&inputs.docs, &inputs.query, params.top_k),
        })
    });
    Ok(node)
}

inventory::submit!(NodeFactory(node));
