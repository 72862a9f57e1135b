//! Comparison helpers shared by both version kinds.

use std::cmp::Ordering;

/// Compare two possibly-absent versions. Absence sorts below every value:
/// "nothing qualified" must never win against a real release.
pub fn cmp_optional<T: Ord>(a: Option<&T>, b: Option<&T>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.cmp(b),
    }
}

/// `true` when `a` is present and not older than `b`, or `b` is absent.
pub fn is_at_least<T: Ord>(a: Option<&T>, b: Option<&T>) -> bool {
    cmp_optional(a, b) != Ordering::Less
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_sorts_low() {
        assert_eq!(cmp_optional::<u32>(None, None), Ordering::Equal);
        assert_eq!(cmp_optional(None, Some(&0u32)), Ordering::Less);
        assert_eq!(cmp_optional(Some(&0u32), None), Ordering::Greater);
        assert_eq!(cmp_optional(Some(&1u32), Some(&2u32)), Ordering::Less);
    }

    #[test]
    fn test_is_at_least() {
        assert!(is_at_least(Some(&3u32), Some(&3u32)));
        assert!(is_at_least(Some(&3u32), None));
        assert!(!is_at_least(None, Some(&3u32)));
    }
}
