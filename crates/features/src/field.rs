use iplandscape_model::OTHER;
use std::sync::OnceLock;

/// A technology field and the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub label: String,
    /// Lowercased, never empty
    keywords: Vec<String>,
}

impl FieldRule {
    pub fn new<S: AsRef<str>>(label: impl Into<String>, keywords: &[S]) -> Self {
        Self {
            label: label.into(),
            keywords: keywords
                .iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// `text` must already be lowercased.
    fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| contains_at_word_start(text, k))
    }
}

/// Ordered keyword table. The first rule that matches wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTaxonomy {
    rules: Vec<FieldRule>,
}

impl FieldTaxonomy {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    /// Field labels in declaration order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.label.as_str())
    }

    /// Assign a technology field from title and abstract.
    ///
    /// Returns `"Other"` when nothing matches, including when both inputs
    /// are absent or empty.
    pub fn classify(&self, title: Option<&str>, abstract_text: Option<&str>) -> &str {
        let text = format!(
            "{} {}",
            title.unwrap_or_default(),
            abstract_text.unwrap_or_default()
        )
        .to_lowercase();

        self.rules
            .iter()
            .find(|rule| rule.matches(&text))
            .map_or(OTHER, |rule| rule.label.as_str())
    }
}

impl Default for FieldTaxonomy {
    fn default() -> Self {
        Self::new(vec![
            FieldRule::new(
                "AI/ML",
                &[
                    "artificial intelligence",
                    "machine learning",
                    "neural network",
                    "deep learning",
                    "ai",
                    "ml",
                    "algorithm",
                    "model",
                ],
            ),
            FieldRule::new(
                "Blockchain",
                &[
                    "blockchain",
                    "cryptocurrency",
                    "distributed ledger",
                    "smart contract",
                    "bitcoin",
                    "ethereum",
                ],
            ),
            FieldRule::new(
                "Cybersecurity",
                &[
                    "security",
                    "cybersecurity",
                    "encryption",
                    "authentication",
                    "firewall",
                    "malware",
                    "privacy",
                    "secure",
                ],
            ),
            FieldRule::new(
                "IoT",
                &[
                    "internet of things",
                    "iot",
                    "sensor",
                    "smart device",
                    "connected device",
                    "embedded system",
                ],
            ),
            FieldRule::new(
                "Quantum Computing",
                &["quantum", "qubit", "quantum computing", "quantum algorithm"],
            ),
            FieldRule::new(
                "Biotechnology",
                &[
                    "biotech",
                    "biotechnology",
                    "pharmaceutical",
                    "drug",
                    "medical",
                    "genetic",
                    "dna",
                    "protein",
                    "biological",
                ],
            ),
            FieldRule::new(
                "Software",
                &["software", "application", "system", "program", "code", "framework", "api"],
            ),
            FieldRule::new(
                "Hardware",
                &["hardware", "device", "circuit", "processor", "chip", "semiconductor"],
            ),
            FieldRule::new(
                "Telecommunications",
                &["telecom", "communication", "network", "wireless", "5g", "lte", "mobile"],
            ),
            FieldRule::new(
                "Energy",
                &["energy", "power", "battery", "solar", "renewable", "fuel cell"],
            ),
            FieldRule::new(
                "Manufacturing",
                &["manufacturing", "production", "assembly", "fabrication", "industrial"],
            ),
        ])
    }
}

/// Classify against the built-in taxonomy.
pub fn classify_field(title: Option<&str>, abstract_text: Option<&str>) -> &'static str {
    static DEFAULT: OnceLock<FieldTaxonomy> = OnceLock::new();
    DEFAULT
        .get_or_init(FieldTaxonomy::default)
        .classify(title, abstract_text)
}

/// Substring match anchored at the start of a word, so short keywords such
/// as "ai" or "ml" do not fire inside "blockchain" or "html".
fn contains_at_word_start(text: &str, keyword: &str) -> bool {
    text.match_indices(keyword).any(|(i, _)| {
        text[..i]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}
