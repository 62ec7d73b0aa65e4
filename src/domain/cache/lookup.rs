//! Outcome of a read against an optional cache

/// Result of looking something up in a best-effort cache.
///
/// All three variants mean "carry on without the cache" to the caller; they are
/// kept apart so metrics and tests can tell an empty cache from a broken one.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    /// The value was found
    Hit(T),
    /// The cache answered and had nothing
    Miss,
    /// The cache is not configured, unreachable, timed out or returned garbage
    Unavailable,
}

impl<T> CacheLookup<T> {
    /// Collapses the lookup to an optional value
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Hit(value) => Some(value),
            Self::Miss | Self::Unavailable => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    /// Label used for the `outcome` metric dimension
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Hit(_) => "hit",
            Self::Miss => "miss",
            Self::Unavailable => "unavailable",
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheLookup<U> {
        match self {
            Self::Hit(value) => CacheLookup::Hit(f(value)),
            Self::Miss => CacheLookup::Miss,
            Self::Unavailable => CacheLookup::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_option() {
        assert_eq!(CacheLookup::Hit(3).into_option(), Some(3));
        assert_eq!(CacheLookup::<i32>::Miss.into_option(), None);
        assert_eq!(CacheLookup::<i32>::Unavailable.into_option(), None);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(CacheLookup::Hit(()).outcome(), "hit");
        assert_eq!(CacheLookup::<()>::Miss.outcome(), "miss");
        assert_eq!(CacheLookup::<()>::Unavailable.outcome(), "unavailable");
    }

    #[test]
    fn test_map_preserves_variant() {
        assert_eq!(CacheLookup::Hit(2).map(|v| v * 2), CacheLookup::Hit(4));
        assert_eq!(CacheLookup::<i32>::Unavailable.map(|v| v * 2), CacheLookup::Unavailable);
    }
}
