//! CDN invalidation request.

/// Paths to refresh plus the token that makes the request unique.
///
/// `quantity` always equals `items.len()`; the CDN API wants both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidationBatch {
    pub paths: InvalidationPaths,

    /// Uniqueness token; a repeated token with the same paths is a no-op.
    pub caller_reference: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidationPaths {
    pub quantity: usize,
    pub items: Vec<String>,
}

impl InvalidationBatch {
    pub fn new(paths: Vec<String>, caller_reference: impl Into<String>) -> Self {
        Self {
            paths: InvalidationPaths {
                quantity: paths.len(),
                items: paths,
            },
            caller_reference: caller_reference.into(),
        }
    }
}
