//! Word completion for the page editor.
//!
//! Candidates are the union of a curated vocabulary and the distinct words
//! already present on the page. The index is rebuilt from scratch for every
//! keystroke and is never cached.

use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;

/// The maximum number of suggestions offered at once.
pub const MAX_SUGGESTIONS: usize = 5;

/// The minimum token length for which suggestions are offered.
pub const MIN_TOKEN_LEN: usize = 2;

/// Words taken from the page must be longer than this to become candidates.
const MIN_HISTORY_WORD_LEN: usize = 3;

/// A page word: a run of ASCII letters, digits and underscores.
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9A-Za-z_]+").expect("word pattern is valid"));

/// The curated vocabulary offered on every page.
pub const VOCABULARY: &[&str] = &[
    // greetings and classroom
    "Hello", "Hi", "Assalamualaikum", "Wa Alaikum Assalam", "Sir", "Mam", "Ma’am",
    "Attendance", "Roll Number", "Assignment", "Project", "Presentation", "Submit", "Deadline",
    "Class cancelled", "Lab", "Group", "Discussion", "Viva", "Pass", "Fail",
    // computing
    "Computer", "Programming", "Algorithm", "Data Structure", "Database", "Software", "Hardware",
    "Operating System", "Compiler", "Code", "Coding", "Debug", "Loop", "Variable", "Function",
    "Output", "Input", "Error", "Network", "Internet", "AI", "Artificial Intelligence",
    "Machine Learning", "Cyber Security", "Cloud", "Python", "C++", "Java", "SQL", "HTML", "CSS",
    "API",
    // engineering
    "Engineering", "Circuit", "Voltage", "Current", "Resistance", "Design", "Structure",
    "Material", "CAD", "Tools", "Workshop", "Measurement", "Analysis", "Mechanics",
    "Thermodynamics", "PLC", "Microcontroller", "Presentation Board", "Model", "Practical",
    "Experiment", "Blueprint", "Architecture", "Drafting", "Calibration", "Prototype",
    "Simulation", "Efficiency", "Force", "Torque", "Load", "Beam", "Stress", "Strain",
    "Controller", "Sensor", "Actuator", "Soldering", "PCB", "Renewable Energy",
    "Fluid Mechanics", "Heat Transfer", "CNC Machine", "3D Printing",
    // administration
    "Semester", "Credit Hour", "GPA", "Transcript", "Midterm", "Final", "Performa", "ID Card",
    "Admin Office", "Hostel", "Transport", "Library", "Wi-Fi", "Canteen", "Fees", "Challan",
    "Scholarship", "Attendance Short",
    // general academic
    "abstract", "academic", "analysis", "analyze", "argument", "assessment", "background",
    "bibliography", "business", "calculate", "category", "characterize", "chronological",
    "citation", "conclusion", "concept", "context", "correlation", "critical", "data",
    "definition", "demonstrate", "describe", "description", "development", "discussion",
    "distinction", "education", "effect", "element", "environment", "evaluation", "evidence",
    "experiment", "explanation", "explore", "factor", "feature", "finance", "foundation",
    "framework", "function", "generation", "global", "hypothesis", "identify", "illustration",
    "impact", "implication", "importance", "indication", "information", "interaction",
    "interpretation", "introduction", "investigation", "journalism", "justification",
    "knowledge", "literature", "logical", "maintenance", "management", "measurement",
    "mechanism", "methodology", "motivation", "narrative", "necessary", "objective",
    "observation", "occurrence", "opportunity", "organization", "outcome", "participation",
    "perspective", "phenomenon", "philosophy", "potential", "prediction", "preparation",
    "principle", "probability", "problem", "procedure", "process", "production",
    "professional", "proposal", "psychology", "qualitative", "quantitative", "questionnaire",
    "reaction", "recommendation", "reference", "regulation", "relationship", "relevance",
    "reliability", "requirement", "research", "resource", "response", "result", "review",
    "significance", "simulation", "solution", "source", "specific", "specification",
    "statistics", "strategy", "structure", "subjective", "summary", "survey", "systematic",
    "technique", "technology", "theoretical", "theory", "thesis", "traditional",
    "transmission", "understanding", "university", "validity", "variable", "variation",
    "writing",
];

/// Whether `c` can be part of an autocomplete token.
///
/// Only ASCII letters and digits count, so accented letters split a token.
#[must_use]
pub const fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '\'' | '’')
}

/// The candidate words for one autocomplete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutocompleteIndex {
    candidates: Vec<String>,
}

impl AutocompleteIndex {
    /// Build the index for `token` from a vocabulary and the page's plain text.
    ///
    /// Page words shorter than four characters, and page words equal to the
    /// token itself (ignoring case), are left out. Vocabulary entries come
    /// first, then page words in order of first appearance.
    pub fn build<S: AsRef<str>>(vocabulary: &[S], page_text: &str, token: &str) -> Self {
        let lower_token = token.to_lowercase();
        let mut seen = HashSet::new();

        let vocabulary = vocabulary.iter().map(AsRef::<str>::as_ref);
        let history = WORD
            .find_iter(page_text)
            .map(|m| m.as_str())
            .filter(|word| word.chars().count() > MIN_HISTORY_WORD_LEN)
            .filter(|word| word.to_lowercase() != lower_token);

        let candidates = vocabulary
            .chain(history)
            .filter(|word| seen.insert(*word))
            .map(str::to_string)
            .collect();

        Self { candidates }
    }

    /// All candidates, in priority order.
    #[must_use]
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Up to [`MAX_SUGGESTIONS`] candidates starting with `prefix`, ignoring
    /// case.
    ///
    /// Prefixes shorter than [`MIN_TOKEN_LEN`] characters never match.
    #[must_use]
    pub fn suggest(&self, prefix: &str) -> Vec<String> {
        if prefix.chars().count() < MIN_TOKEN_LEN {
            return Vec::new();
        }
        let prefix = prefix.to_lowercase();
        self.candidates
            .iter()
            .filter(|candidate| candidate.to_lowercase().starts_with(&prefix))
            .take(MAX_SUGGESTIONS)
            .cloned()
            .collect()
    }
}

/// Suggestions for `token` given a vocabulary and the page's plain text.
pub fn suggestions<S: AsRef<str>>(vocabulary: &[S], page_text: &str, token: &str) -> Vec<String> {
    if token.chars().count() < MIN_TOKEN_LEN {
        return Vec::new();
    }
    AutocompleteIndex::build(vocabulary, page_text, token).suggest(token)
}

/// The token ending at byte offset `caret` in `text`.
///
/// Returns the byte offset at which the token starts. The token may be empty.
#[must_use]
pub fn token_start(text: &str, caret: usize) -> usize {
    text[..caret]
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_word_char(*c))
        .last()
        .map_or(caret, |(i, _)| i)
}
