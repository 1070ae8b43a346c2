//! Keyword relevance filter for Syria coverage.
//!
//! A headline is relevant when it contains any topic keyword, compared
//! case-insensitively. Missing an article is cheap (the next run sees the page
//! again), a false positive is published to the channel, so the list is kept
//! to names that rarely appear outside Syria coverage.

use once_cell::sync::Lazy;

/// Place names, entity names and aliases that mark a headline as Syria news.
pub const TOPIC_KEYWORDS: &[&str] = &[
    // Country and cities
    "سوريا",
    "سورية",
    "دمشق",
    "حلب",
    "حمص",
    "حماة",
    "اللاذقية",
    "طرطوس",
    "درعا",
    "السويداء",
    "القامشلي",
    "الحسكة",
    "إدلب",
    "الرقة",
    "دير الزور",
    // Political and armed actors
    "بشار الأسد",
    "الأسد",
    "نظام دمشق",
    "المعارضة السورية",
    "الثورة السورية",
    "اللاجئين السوريين",
    "النازحين السوريين",
    "هيئة تحرير الشام",
    "الجيش الحر",
    "قوات سوريا الديمقراطية",
    "كردستان سوريا",
    "شمال شرق سوريا",
    // Latin-script aliases
    "syria",
    "damascus",
    "aleppo",
    "idlib",
    "latakia",
    "deir ez-zor",
    "raqqa",
];

static LOWERED_KEYWORDS: Lazy<Vec<String>> =
    Lazy::new(|| TOPIC_KEYWORDS.iter().map(|k| k.to_lowercase()).collect());

/// Returns `true` when `title` contains any of [`TOPIC_KEYWORDS`], ignoring case.
pub fn is_relevant(title: &str) -> bool {
    let title = title.to_lowercase();
    LOWERED_KEYWORDS.iter().any(|k| title.contains(k.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_list_is_large_enough() {
        assert!(TOPIC_KEYWORDS.len() >= 20);
    }

    #[test]
    fn test_every_keyword_matches_inside_a_headline() {
        for keyword in TOPIC_KEYWORDS {
            let title = format!("عاجل: تطورات جديدة حول {keyword} هذا المساء");
            assert!(is_relevant(&title), "expected {keyword:?} to match");
        }
    }

    #[test]
    fn test_latin_keywords_ignore_case() {
        assert!(is_relevant("UN envoy arrives in DAMASCUS for talks"));
        assert!(is_relevant("Aid convoy reaches Idlib province"));
        assert!(is_relevant("Syrian refugees return home"));
    }

    #[test]
    fn test_unrelated_titles_are_rejected() {
        assert!(!is_relevant("Stock markets rally after rate decision"));
        assert!(!is_relevant("ارتفاع أسعار النفط في الأسواق العالمية"));
        assert!(!is_relevant(""));
    }
}
