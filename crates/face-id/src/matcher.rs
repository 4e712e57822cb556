//! Nearest-neighbour identity matching against enrolled embeddings

use crate::{Detection, Embedding, Label, RawFace};
use tracing::debug;

/// Default maximum embedding distance for a match
pub const DEFAULT_MATCH_TOLERANCE: f32 = 0.6;

/// Enrolled identities and their reference embeddings
#[derive(Debug, Clone)]
pub struct KnownFaces {
    names: Vec<String>,
    encodings: Vec<Embedding>,
    /// Maximum distance accepted as the same person
    tolerance: f32,
}

impl KnownFaces {
    pub fn new(tolerance: f32) -> Self {
        Self {
            names: Vec::new(),
            encodings: Vec::new(),
            tolerance,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Append an enrolled identity
    pub fn insert(&mut self, name: impl Into<String>, embedding: Embedding) {
        self.names.push(name.into());
        self.encodings.push(embedding);
    }

    /// Euclidean distance to every enrolled embedding, in enrollment order
    pub fn distances(&self, embedding: &Embedding) -> Vec<f32> {
        self.encodings
            .iter()
            .map(|known| euclidean(known, embedding))
            .collect()
    }

    /// Resolve an embedding to the nearest enrolled identity, if it is close enough
    pub fn identify(&self, embedding: &Embedding) -> Label {
        let best = self
            .distances(embedding)
            .into_iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(&b.1));

        match best {
            Some((index, distance)) if distance <= self.tolerance => {
                debug!("Matched {} at distance {:.3}", self.names[index], distance);
                Label::Known(self.names[index].clone())
            }
            Some((_, distance)) => {
                debug!("Nearest identity at distance {:.3} exceeds tolerance", distance);
                Label::Unknown
            }
            None => Label::Unknown,
        }
    }

    /// Label every detected face, keeping detector order
    pub fn label_faces(&self, faces: &[RawFace]) -> Vec<Detection> {
        faces
            .iter()
            .map(|face| Detection::new(face.bbox, self.identify(&face.embedding)))
            .collect()
    }
}

impl Default for KnownFaces {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_TOLERANCE)
    }
}

fn euclidean(a: &Embedding, b: &Embedding) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    (a - b).mapv(|d| d * d).sum().sqrt()
}
