use serde::{Deserialize, Serialize};

/// Scam-indicative Vietnamese phrases: prize winnings, fraud, scam ring,
/// wire transfer, bank account.
pub const DEFAULT_SCAM_KEYWORDS: [&str; 5] = [
    "trúng thưởng",
    "lừa đảo",
    "đường dây",
    "chuyển tiền",
    "tài khoản ngân hàng",
];

/// True iff the lowercased utterance contains any lowercased keyword.
/// Empty keywords never match.
pub fn detect<K: AsRef<str>>(utterance: &str, keywords: &[K]) -> bool {
    if utterance.is_empty() {
        return false;
    }
    let haystack = utterance.to_lowercase();
    keywords.iter().any(|k| {
        let k = k.as_ref();
        !k.is_empty() && haystack.contains(&k.to_lowercase())
    })
}

/// A keyword list lowered once up front, for repeated checks during a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordDetector {
    keywords: Vec<String>,
}

impl KeywordDetector {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn detect(&self, utterance: &str) -> bool {
        detect(utterance, &self.keywords)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl Default for KeywordDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SCAM_KEYWORDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uppercase_utterance_still_matches() {
        assert!(detect("CHUYỂN TIỀN ngay", &DEFAULT_SCAM_KEYWORDS));
    }

    #[test]
    fn empty_keyword_is_ignored() {
        assert!(!detect("xin chào", &[""]));
        assert!(KeywordDetector::new([""]).keywords().is_empty());
    }
}
