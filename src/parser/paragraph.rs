use std::sync::LazyLock;

use regex::Regex;

static EXERCISE_INTRO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)quest(ões|ão).{0,20}exerc").unwrap());
static ANSWER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)alternativa correta|gabarito|resposta|correto").unwrap());
static OPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[(\[]?[A-Ea-e][)\].]|^•").unwrap());

/// Truth literals used by CERTO/ERRADO items; always options, never subjects.
const CHOICE_LITERALS: &[&str] = &["CERTO", "ERRADO"];

/// One source paragraph: text plus the style tag the container carried.
/// Never mutated; all extraction scans over these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
    pub style: StyleTag,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, style: StyleTag) -> Self {
        Paragraph {
            text: text.into(),
            style,
        }
    }

    /// Style-less paragraph, the common case for body text.
    pub fn plain(text: impl Into<String>) -> Self {
        Paragraph::new(text, StyleTag::Normal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleTag {
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Normal,
    /// No style element in the container, or an unknown style id.
    Unstyled,
}

impl StyleTag {
    pub fn from_style_id(id: &str) -> StyleTag {
        match id {
            "Heading1" => StyleTag::Heading1,
            "Heading2" => StyleTag::Heading2,
            "Heading3" => StyleTag::Heading3,
            "Heading4" => StyleTag::Heading4,
            "Normal" => StyleTag::Normal,
            _ => StyleTag::Unstyled,
        }
    }

    fn is_styleless(self) -> bool {
        matches!(self, StyleTag::Normal | StyleTag::Unstyled)
    }
}

/// Semantic role of one paragraph, decided without looking at neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    CourseTitle,
    NotebookTitle,
    SubjectPrimary,
    TheorySlide,
    ExerciseIntro,
    Answer,
    Option,
    Content,
}

/// Classify one paragraph. Precedence: CERTO/ERRADO literal, heading style,
/// all-caps subject fallback, keyword patterns, plain content.
pub fn classify(p: &Paragraph) -> Role {
    let text = p.text.trim();

    if CHOICE_LITERALS.contains(&text) {
        return Role::Option;
    }

    match p.style {
        StyleTag::Heading1 => return Role::CourseTitle,
        StyleTag::Heading2 => return Role::NotebookTitle,
        StyleTag::Heading3 => return Role::SubjectPrimary,
        StyleTag::Heading4 => return Role::TheorySlide,
        _ => {}
    }

    // Exports (Google Docs in particular) often drop heading styles; short
    // all-caps lines still mark a subject.
    if p.style.is_styleless() && is_all_caps(text) && text.chars().count() < 60 {
        return Role::SubjectPrimary;
    }

    if EXERCISE_INTRO_RE.is_match(text) {
        return Role::ExerciseIntro;
    }
    if ANSWER_RE.is_match(text) {
        return Role::Answer;
    }
    if OPTION_RE.is_match(text) {
        return Role::Option;
    }

    Role::Content
}

/// Normalize an answer line: drop the keyword, a leading colon, and
/// surrounding whitespace. "Gabarito: B" -> "B".
pub fn normalize_answer(text: &str) -> String {
    let stripped = ANSWER_RE.replace(text.trim(), "");
    stripped
        .trim()
        .trim_start_matches(':')
        .trim()
        .to_string()
}

fn is_all_caps(text: &str) -> bool {
    !text.is_empty()
        && text.chars().any(|c| c.is_alphabetic())
        && !text.chars().any(|c| c.is_lowercase())
}

// ── Tests ──
