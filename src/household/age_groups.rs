//! Adult/child classification of age-group codes.
//!
//! The two sets are disjoint. Codes outside both (for example the single-year
//! `20` and `21` buckets some census tables use) belong to neither class.

/// Age-group codes counted as adults.
pub const ADULT_CODES: [&str; 17] = [
    "20t21", "22t24", "25t29", "30t34", "35t39", "40t44", "45t49", "50t54", "55t59", "60t61",
    "62t64", "65t66", "67t69", "70t74", "75t79", "80t84", "85plus",
];

/// Age-group codes counted as children.
pub const CHILD_CODES: [&str; 5] = ["U5", "5t9", "10t14", "15t17", "18t19"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeClass {
    Adult,
    Child,
}

/// Classify an age-group code; `None` for codes in neither set.
pub fn classify(code: &str) -> Option<AgeClass> {
    if ADULT_CODES.contains(&code) {
        Some(AgeClass::Adult)
    } else if CHILD_CODES.contains(&code) {
        Some(AgeClass::Child)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sets_are_disjoint() {
        assert!(ADULT_CODES.iter().all(|c| !CHILD_CODES.contains(c)));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("U5"), Some(AgeClass::Child));
        assert_eq!(classify("18t19"), Some(AgeClass::Child));
        assert_eq!(classify("20t21"), Some(AgeClass::Adult));
        assert_eq!(classify("85plus"), Some(AgeClass::Adult));
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(classify("20"), None);
        assert_eq!(classify("21"), None);
        assert_eq!(classify("u5"), None);
        assert_eq!(classify(""), None);
    }
}
