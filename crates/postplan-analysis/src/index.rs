//! In-process similarity index over post captions.
//!
//! Captions are embedded with TF-IDF. The vocabulary and IDF weights are fit
//! on the first batch added and frozen afterwards; later batches and queries
//! are projected through the same weights, so unseen terms simply contribute
//! nothing. [`SimilarityIndex::reset`] drops both the documents and the
//! fitted vocabulary.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use postplan_core::Post;
use regex::Regex;
use serde::{Deserialize, Serialize};

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid regex"));

/// Scalar attributes stored alongside each indexed caption.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMetadata {
    pub engagement: u64,
    pub likes: u64,
    pub comments: u64,
    pub timestamp: String,
    /// Space-joined hashtags.
    pub hashtags: String,
}

/// One query result, nearest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryHit {
    pub id: String,
    pub document: String,
    pub metadata: DocMetadata,
    /// Squared Euclidean distance between unit embeddings.
    pub distance: f64,
}

#[derive(Debug, Clone)]
struct IndexedDoc {
    id: String,
    document: String,
    metadata: DocMetadata,
    embedding: Vec<f64>,
}

/// Term-frequency × smoothed inverse-document-frequency weights.
#[derive(Debug, Clone)]
struct TfidfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

fn tokenize(text: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

impl TfidfVectorizer {
    /// Fits on `docs`. `None` if no document yields a token.
    #[allow(clippy::cast_precision_loss)]
    fn fit(docs: &[&str]) -> Option<Self> {
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for doc in docs {
            let unique: HashSet<String> = tokenize(doc).into_iter().collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }
        if document_frequency.is_empty() {
            return None;
        }

        let n = docs.len() as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(document_frequency.len());
        for (position, (term, df)) in document_frequency.into_iter().enumerate() {
            vocabulary.insert(term, position);
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
        }
        Some(Self { vocabulary, idf })
    }

    /// Unit-length embedding of `text`. All-zero if no term is known.
    #[allow(clippy::cast_precision_loss)]
    fn transform(&self, text: &str) -> Vec<f64> {
        let mut counts: HashMap<usize, usize> = HashMap::new();
        for token in tokenize(text) {
            if let Some(&column) = self.vocabulary.get(&token) {
                *counts.entry(column).or_insert(0) += 1;
            }
        }

        let mut embedding = vec![0.0; self.idf.len()];
        for (column, count) in counts {
            embedding[column] = count as f64 * self.idf[column];
        }

        let mut norm = embedding.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm <= 0.0 {
            norm = 1.0;
        }
        for x in &mut embedding {
            *x /= norm;
        }
        embedding
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Caption index owned by the orchestrator and lent to each stage that
/// needs retrieval context.
#[derive(Debug, Clone, Default)]
pub struct SimilarityIndex {
    vectorizer: Option<TfidfVectorizer>,
    docs: Vec<IndexedDoc>,
}

impl SimilarityIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Number of frozen vocabulary terms, 0 before the first fit.
    #[must_use]
    pub fn vocabulary_len(&self) -> usize {
        self.vectorizer.as_ref().map_or(0, |v| v.vocabulary.len())
    }

    /// Drops every document and the fitted vocabulary.
    pub fn reset(&mut self) {
        let dropped = self.docs.len();
        self.docs.clear();
        self.vectorizer = None;
        tracing::info!(dropped, "similarity index reset");
    }

    /// Indexes the captions of `posts`, returning how many were added.
    ///
    /// Posts with empty captions are skipped. Ids are `post_{id}`; adding an
    /// id that is already present replaces the earlier document. A first
    /// batch with no tokenizable text leaves the index unfitted and adds
    /// nothing.
    pub fn add_posts(&mut self, posts: &[Post]) -> usize {
        let batch: Vec<&Post> = posts.iter().filter(|p| !p.caption.is_empty()).collect();
        if batch.is_empty() {
            tracing::warn!("no posts with captions to index");
            return 0;
        }

        if self.vectorizer.is_none() {
            let captions: Vec<&str> = batch.iter().map(|p| p.caption.as_str()).collect();
            match TfidfVectorizer::fit(&captions) {
                Some(vectorizer) => {
                    tracing::info!(
                        terms = vectorizer.vocabulary.len(),
                        docs = captions.len(),
                        "fitted caption vocabulary"
                    );
                    self.vectorizer = Some(vectorizer);
                }
                None => {
                    tracing::warn!("captions produced an empty vocabulary; nothing indexed");
                    return 0;
                }
            }
        }
        let Some(vectorizer) = self.vectorizer.as_ref() else {
            return 0;
        };

        let mut added = 0;
        for post in batch {
            let doc = IndexedDoc {
                id: format!("post_{}", post.id),
                document: post.caption.clone(),
                metadata: DocMetadata {
                    engagement: post.engagement,
                    likes: post.likes,
                    comments: post.comments,
                    timestamp: post.timestamp.clone(),
                    hashtags: post.hashtags.join(" "),
                },
                embedding: vectorizer.transform(&post.caption),
            };
            match self.docs.iter_mut().find(|d| d.id == doc.id) {
                Some(existing) => *existing = doc,
                None => self.docs.push(doc),
            }
            added += 1;
        }

        tracing::info!(added, total = self.docs.len(), "indexed post captions");
        added
    }

    /// The `k` documents nearest to `text`, nearest first. Ties keep
    /// insertion order. Empty if nothing has been indexed.
    #[must_use]
    pub fn query(&self, text: &str, k: usize) -> Vec<QueryHit> {
        let Some(vectorizer) = self.vectorizer.as_ref() else {
            return Vec::new();
        };
        let probe = vectorizer.transform(text);

        let mut scored: Vec<(f64, &IndexedDoc)> = self
            .docs
            .iter()
            .map(|doc| (squared_distance(&probe, &doc.embedding), doc))
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        scored
            .into_iter()
            .take(k)
            .map(|(distance, doc)| QueryHit {
                id: doc.id.clone(),
                document: doc.document.clone(),
                metadata: doc.metadata.clone(),
                distance,
            })
            .collect()
    }
}
