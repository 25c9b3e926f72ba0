//! Keyword and pattern extraction
//!
//! The offline pass over a narrative or an answer. Everything here is total: any
//! input, however odd, yields a (possibly empty) result.

use crate::catalog::{ClaimTypeInfo, CLAIM_TYPES};
use regex::Regex;
use std::sync::LazyLock;

const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec";

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:(?:{m})\.?\s+\d{{1,2}}(?:st|nd|rd|th)?,?\s+\d{{4}}|(?:{m})\.?\s+\d{{4}}|\d{{4}}-\d{{2}}-\d{{2}}|\d{{1,2}}/\d{{1,2}}/\d{{2,4}})\b",
        m = MONTHS
    ))
    .unwrap()
});

static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$\s?\d[\d,]*(?:\.\d{1,2})?(?:\s?(?:k|thousand|million)\b)?").unwrap()
});

static ORGANIZATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[A-Z][\w&'-]*\s+){0,3}[A-Z][\w&'-]*,?\s+(?:Inc|LLC|L\.L\.C|Corp|Corporation|Co|Company|Ltd|LLP|Group)\b\.?").unwrap()
});

static TITLED_PERSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:Mr|Ms|Mrs|Dr)\.?\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?").unwrap());

static SENTENCE_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?;\n]+").unwrap());

/// Role words recognised as parties, with whether the role is an organization
const ROLES: &[(&str, bool)] = &[
    ("employee", false),
    ("employer", true),
    ("manager", false),
    ("supervisor", false),
    ("boss", false),
    ("coworker", false),
    ("co-worker", false),
    ("human resources", true),
    ("hr", true),
    ("company", true),
    ("landlord", false),
    ("tenant", false),
    ("contractor", false),
    ("client", false),
];

/// A claim type detected in text
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimMatch {
    /// Catalog entry
    pub info: &'static ClaimTypeInfo,
    /// Keywords that fired, catalog order
    pub keywords: Vec<&'static str>,
    /// Sentences containing any of the keywords, in text order
    pub sentences: Vec<String>,
}

impl ClaimMatch {
    /// Claim type name
    pub fn claim_type(&self) -> &'static str {
        self.info.claim_type
    }

    /// Matched sentences joined into one description
    pub fn description(&self) -> String {
        self.sentences.join(". ")
    }
}

/// A party mentioned in text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyMention {
    /// Name as written (role words are title-cased)
    pub name: String,
    /// Whether the party is an organization
    pub organization: bool,
}

/// Split text into trimmed, non-empty sentences
pub fn sentences(text: &str) -> Vec<String> {
    SENTENCE_SPLIT_RE
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Claim types signalled by keywords, catalog order
pub fn detect_claim_types(text: &str) -> Vec<ClaimMatch> {
    let sentences = sentences(text);
    let lowered: Vec<String> = sentences.iter().map(|s| s.to_lowercase()).collect();

    CLAIM_TYPES
        .iter()
        .filter_map(|info| {
            let keywords: Vec<&'static str> = info
                .keywords
                .iter()
                .copied()
                .filter(|k| lowered.iter().any(|s| s.contains(k)))
                .collect();
            if keywords.is_empty() {
                return None;
            }
            let matched = sentences
                .iter()
                .zip(&lowered)
                .filter(|(_, low)| keywords.iter().any(|k| low.contains(k)))
                .map(|(s, _)| s.clone())
                .collect();
            Some(ClaimMatch {
                info,
                keywords,
                sentences: matched,
            })
        })
        .collect()
}

/// Dates in order of appearance, deduplicated
pub fn extract_dates(text: &str) -> Vec<String> {
    dedup(DATE_RE.find_iter(text).map(|m| m.as_str().trim().to_string()))
}

/// Monetary amounts in order of appearance, deduplicated
pub fn extract_amounts(text: &str) -> Vec<String> {
    dedup(AMOUNT_RE.find_iter(text).map(|m| m.as_str().trim().to_string()))
}

/// Parse the numeric value of an amount such as "$1,250.50" or "$40k"
pub fn amount_value(amount: &str) -> Option<f64> {
    let lower = amount.to_lowercase();
    let digits: String = lower
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let base: f64 = digits.parse().ok()?;
    let multiplier = if lower.contains("million") {
        1_000_000.0
    } else if lower.contains("thousand") || lower.trim_end().ends_with('k') {
        1_000.0
    } else {
        1.0
    };
    Some(base * multiplier)
}

/// Parties: named organizations, titled people, then role words
pub fn extract_parties(text: &str) -> Vec<PartyMention> {
    let mut parties: Vec<PartyMention> = Vec::new();
    let mut push = |name: String, organization: bool| {
        if !parties.iter().any(|p| p.name.eq_ignore_ascii_case(&name)) {
            parties.push(PartyMention { name, organization });
        }
    };

    for m in ORGANIZATION_RE.find_iter(text) {
        push(m.as_str().trim().trim_end_matches(',').to_string(), true);
    }
    for m in TITLED_PERSON_RE.find_iter(text) {
        push(m.as_str().trim().to_string(), false);
    }

    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|w| !w.is_empty())
        .collect();
    for (role, organization) in ROLES {
        let role = *role;
        let found = if role.contains(' ') {
            lower.contains(role)
        } else {
            words.iter().any(|w| *w == role || w.strip_suffix('s') == Some(role))
        };
        if found {
            push(title_case(role), *organization);
        }
    }

    parties
}

/// Whether an answer carries content: at least three words and not a refusal
pub fn is_substantive(answer: &str) -> bool {
    const NON_ANSWERS: &[&str] = &[
        "no", "none", "n/a", "na", "unknown", "i don't know", "i dont know", "don't know",
        "not sure", "i'm not sure", "skip", "pass",
    ];
    let normalized = answer
        .trim()
        .trim_end_matches(['.', '!', '?'])
        .to_lowercase();
    if NON_ANSWERS.contains(&normalized.as_str()) {
        return false;
    }
    normalized.split_whitespace().count() >= 3
}

fn title_case(s: &str) -> String {
    if s.len() <= 2 {
        return s.to_uppercase();
    }
    s.split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn dedup(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fired_after_complaining_about_unequal_pay() {
        let matches = detect_claim_types("Employee fired after complaining about unequal pay");
        let types: Vec<_> = matches.iter().map(|m| m.claim_type()).collect();
        assert_eq!(types, vec!["discrimination", "retaliation", "wrongful_termination"]);
        assert!(matches[0].keywords.contains(&"unequal pay"));
        assert_eq!(matches[1].sentences, vec!["Employee fired after complaining about unequal pay"]);
    }

    #[test]
    fn test_no_claims_in_neutral_text() {
        assert!(detect_claim_types("The weather was nice and I went for a walk.").is_empty());
        assert!(detect_claim_types("").is_empty());
    }

    #[test]
    fn test_extract_dates() {
        let text = "On March 3, 2023 I complained. I was fired 2023-04-15, and again 4/20/2023. March 3, 2023 again.";
        assert_eq!(extract_dates(text), vec!["March 3, 2023", "2023-04-15", "4/20/2023"]);
        assert_eq!(extract_dates("Sometime in June 2022"), vec!["June 2022"]);
    }

    #[test]
    fn test_extract_amounts() {
        let text = "I was owed $1,250.50 in overtime and lost $40k in salary.";
        let amounts = extract_amounts(text);
        assert_eq!(amounts, vec!["$1,250.50", "$40k"]);
        assert_eq!(amount_value(&amounts[0]), Some(1250.50));
        assert_eq!(amount_value(&amounts[1]), Some(40_000.0));
        assert_eq!(amount_value("$"), None);
    }

    #[test]
    fn test_extract_parties() {
        let text = "My manager Mr. Smith at Acme Widgets Inc. told HR that employees complain too much.";
        let parties = extract_parties(text);
        let names: Vec<_> = parties.iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"Acme Widgets Inc."));
        assert!(names.contains(&"Mr. Smith"));
        assert!(names.contains(&"Manager"));
        assert!(names.contains(&"Employee"));
        assert!(names.contains(&"HR"));
        assert!(parties.iter().find(|p| p.name == "HR").unwrap().organization);
    }

    #[test]
    fn test_is_substantive() {
        assert!(is_substantive("It happened on March 3, 2023"));
        assert!(!is_substantive("No."));
        assert!(!is_substantive("I don't know"));
        assert!(!is_substantive("yes please"));
        assert!(!is_substantive("   "));
    }

    #[test]
    fn test_adversarial_input_is_harmless() {
        let junk = "\u{0}\u{FFFF}$$$ ,,, ''' ```json {[ 99/99/9999 ---";
        let _ = detect_claim_types(junk);
        let _ = extract_dates(junk);
        let _ = extract_amounts(junk);
        let _ = extract_parties(junk);
        assert!(sentences("...!!!").is_empty());
    }
}
