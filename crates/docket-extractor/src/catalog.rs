//! Claim types, their elements, and the default authorities
//!
//! The dependency graph builder and the legal graph builder both derive
//! requirements from [`requirements_for`], so a dependency requirement and a
//! legal requirement for the same claim type share a `requirement_key`. That
//! key is what the matcher joins on.

/// One element a claim type must establish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequirementTemplate {
    /// Symbolic key, unique within a claim type
    pub key: &'static str,
    /// Display name
    pub name: &'static str,
    /// What the element means
    pub description: &'static str,
}

const fn req(key: &'static str, name: &'static str, description: &'static str) -> RequirementTemplate {
    RequirementTemplate { key, name, description }
}

/// A recognised claim type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimTypeInfo {
    /// Machine name, e.g. "wage_violation"
    pub claim_type: &'static str,
    /// Display name
    pub display_name: &'static str,
    /// Lower-case keywords that signal the claim in free text
    pub keywords: &'static [&'static str],
    /// Elements the claim must establish
    pub requirements: &'static [RequirementTemplate],
}

/// Every claim type the builders recognise, in detection priority order
pub const CLAIM_TYPES: &[ClaimTypeInfo] = &[
    ClaimTypeInfo {
        claim_type: "discrimination",
        display_name: "Employment Discrimination",
        keywords: &[
            "discriminat",
            "unequal pay",
            "equal pay",
            "paid less",
            "pay gap",
            "because of my race",
            "because of my gender",
            "because of my age",
            "because i am",
            "because i'm",
            "pregnan",
            "disability",
            "religio",
            "national origin",
        ],
        requirements: &[
            req("protected_class", "Protected class", "Plaintiff belongs to a class protected by law"),
            req("adverse_action", "Adverse employment action", "Plaintiff suffered a materially adverse action"),
            req("causal_connection", "Causal connection", "The adverse action was because of the protected characteristic"),
        ],
    },
    ClaimTypeInfo {
        claim_type: "retaliation",
        display_name: "Retaliation",
        keywords: &[
            "retaliat",
            "complain",
            "reported",
            "whistleblow",
            "filed a grievance",
            "filed a charge",
            "spoke up",
            "after i raised",
        ],
        requirements: &[
            req("protected_activity", "Protected activity", "Plaintiff engaged in activity protected by law"),
            req("adverse_action", "Adverse employment action", "Plaintiff suffered a materially adverse action"),
            req("causal_connection", "Causal connection", "The adverse action followed because of the protected activity"),
        ],
    },
    ClaimTypeInfo {
        claim_type: "wrongful_termination",
        display_name: "Wrongful Termination",
        keywords: &["fired", "terminated", "let go", "dismissed", "laid off", "termination"],
        requirements: &[
            req("employment_relationship", "Employment relationship", "Plaintiff was employed by defendant"),
            req("termination", "Termination", "Defendant ended plaintiff's employment"),
            req("unlawful_reason", "Unlawful reason", "The termination violated statute, contract or public policy"),
        ],
    },
    ClaimTypeInfo {
        claim_type: "harassment",
        display_name: "Hostile Work Environment",
        keywords: &["harass", "hostile work environment", "bullied", "slur", "inappropriate comment", "groped"],
        requirements: &[
            req("protected_class", "Protected class", "Plaintiff belongs to a class protected by law"),
            req("unwelcome_conduct", "Unwelcome conduct", "Plaintiff was subjected to unwelcome conduct"),
            req("severe_or_pervasive", "Severe or pervasive", "The conduct was severe or pervasive enough to alter working conditions"),
            req("employer_liability", "Employer liability", "The employer knew or should have known and failed to act"),
        ],
    },
    ClaimTypeInfo {
        claim_type: "wage_violation",
        display_name: "Wage and Hour Violation",
        keywords: &["overtime", "unpaid wage", "minimum wage", "not paid", "withheld pay", "off the clock", "final paycheck"],
        requirements: &[
            req("employment_relationship", "Employment relationship", "Plaintiff was a covered, non-exempt employee"),
            req("hours_worked", "Hours worked", "Plaintiff worked the hours claimed"),
            req("unpaid_compensation", "Unpaid compensation", "Defendant failed to pay wages owed"),
        ],
    },
    ClaimTypeInfo {
        claim_type: "breach_of_contract",
        display_name: "Breach of Contract",
        keywords: &["breach", "contract", "agreement", "broke their promise", "failed to deliver"],
        requirements: &[
            req("contract_existence", "Existence of a contract", "A valid contract existed between the parties"),
            req("plaintiff_performance", "Plaintiff's performance", "Plaintiff performed or was excused from performing"),
            req("defendant_breach", "Defendant's breach", "Defendant failed to perform a contractual obligation"),
            req("damages", "Damages", "Plaintiff was damaged by the breach"),
        ],
    },
];

/// Elements required of a claim type the catalog does not know
pub const GENERIC_REQUIREMENTS: &[RequirementTemplate] = &[
    req("factual_basis", "Factual basis", "Specific facts supporting each element of the claim"),
    req("damages", "Damages", "Harm suffered as a result of defendant's conduct"),
];

/// Look up a claim type
pub fn claim_type_info(claim_type: &str) -> Option<&'static ClaimTypeInfo> {
    CLAIM_TYPES.iter().find(|c| c.claim_type == claim_type)
}

/// Elements required for a claim type (generic elements for unknown types)
pub fn requirements_for(claim_type: &str) -> &'static [RequirementTemplate] {
    claim_type_info(claim_type)
        .map(|c| c.requirements)
        .unwrap_or(GENERIC_REQUIREMENTS)
}

/// Display name for a claim type; unknown types are title-cased
pub fn display_name(claim_type: &str) -> String {
    match claim_type_info(claim_type) {
        Some(info) => info.display_name.to_string(),
        None => claim_type
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// A statute or other authority to load into the legal graph
#[derive(Debug, Clone, PartialEq)]
pub struct Statute {
    /// Name, e.g. "Title VII of the Civil Rights Act of 1964"
    pub name: String,
    /// Citation (may be empty for common-law causes of action)
    pub citation: String,
    /// Jurisdiction tag
    pub jurisdiction: String,
    /// What the authority provides
    pub description: String,
    /// Claim types the authority supports; empty means "every requested type"
    pub claim_types: Vec<String>,
}

impl Statute {
    /// Create a statute with no claim-type restriction
    pub fn new(name: impl Into<String>, citation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            citation: citation.into(),
            jurisdiction: "federal".to_string(),
            description: String::new(),
            claim_types: Vec::new(),
        }
    }

    /// Set the jurisdiction
    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.jurisdiction = jurisdiction.into();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Restrict to the given claim types
    pub fn for_claim_types<I, S>(mut self, claim_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.claim_types = claim_types.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the statute supports a claim type
    pub fn covers(&self, claim_type: &str) -> bool {
        self.claim_types.is_empty() || self.claim_types.iter().any(|t| t == claim_type)
    }
}

struct AuthorityRow {
    name: &'static str,
    citation: &'static str,
    jurisdiction: &'static str,
    description: &'static str,
    claim_types: &'static [&'static str],
}

const AUTHORITIES: &[AuthorityRow] = &[
    AuthorityRow {
        name: "Title VII of the Civil Rights Act of 1964",
        citation: "42 U.S.C. § 2000e-2",
        jurisdiction: "federal",
        description: "Prohibits employment discrimination based on race, color, religion, sex and national origin",
        claim_types: &["discrimination", "harassment"],
    },
    AuthorityRow {
        name: "Title VII Anti-Retaliation Provision",
        citation: "42 U.S.C. § 2000e-3(a)",
        jurisdiction: "federal",
        description: "Prohibits retaliation for opposing discrimination or participating in an investigation",
        claim_types: &["retaliation"],
    },
    AuthorityRow {
        name: "Equal Pay Act of 1963",
        citation: "29 U.S.C. § 206(d)",
        jurisdiction: "federal",
        description: "Requires equal pay for equal work regardless of sex",
        claim_types: &["discrimination", "wage_violation"],
    },
    AuthorityRow {
        name: "Age Discrimination in Employment Act",
        citation: "29 U.S.C. § 621 et seq.",
        jurisdiction: "federal",
        description: "Protects employees 40 and older from age discrimination",
        claim_types: &["discrimination"],
    },
    AuthorityRow {
        name: "Americans with Disabilities Act, Title I",
        citation: "42 U.S.C. § 12112",
        jurisdiction: "federal",
        description: "Prohibits discrimination against qualified individuals with disabilities",
        claim_types: &["discrimination"],
    },
    AuthorityRow {
        name: "Fair Labor Standards Act",
        citation: "29 U.S.C. § 201 et seq.",
        jurisdiction: "federal",
        description: "Minimum wage, overtime and anti-retaliation protections",
        claim_types: &["wage_violation", "retaliation"],
    },
    AuthorityRow {
        name: "Wrongful Discharge in Violation of Public Policy",
        citation: "",
        jurisdiction: "state",
        description: "Common-law tort for terminations that contravene public policy",
        claim_types: &["wrongful_termination"],
    },
    AuthorityRow {
        name: "Common Law Breach of Contract",
        citation: "",
        jurisdiction: "state",
        description: "Cause of action for failure to perform a contractual obligation",
        claim_types: &["breach_of_contract"],
    },
];

/// Default authorities covering any of the given claim types, table order
pub fn default_statutes<S: AsRef<str>>(claim_types: &[S]) -> Vec<Statute> {
    AUTHORITIES
        .iter()
        .filter(|row| {
            claim_types
                .iter()
                .any(|t| row.claim_types.contains(&t.as_ref()))
        })
        .map(|row| {
            Statute::new(row.name, row.citation)
                .with_jurisdiction(row.jurisdiction)
                .with_description(row.description)
                .for_claim_types(row.claim_types.iter().copied())
        })
        .collect()
}
