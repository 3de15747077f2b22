use serde::Serialize;

/// Top-level output record. The two extraction conventions share this slot
/// but not their shapes; serialization is untagged so each convention emits
/// exactly its own schema.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ParsedDocument {
    Styled(StyledDocument),
    Marked(MarkedDocument),
}

impl ParsedDocument {
    pub fn warnings(&self) -> &[String] {
        match self {
            ParsedDocument::Styled(d) => &d.warnings,
            ParsedDocument::Marked(d) => &d.warnings,
        }
    }

    /// The record returned when the container itself cannot be read: a single
    /// warning and nothing else populated.
    pub fn read_failure(err: &anyhow::Error) -> Self {
        ParsedDocument::Styled(StyledDocument {
            course_title: String::new(),
            notebook_title: String::new(),
            sections: Vec::new(),
            warnings: vec![format!("Failed to read DOCX file: {err:#}")],
        })
    }
}

// ── Styled convention ──

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyledDocument {
    pub course_title: String,
    pub notebook_title: String,
    pub sections: Vec<Section>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub subject_primary: String,
    pub subject_secondary: Option<String>,
    pub theory_slides: Vec<String>,
    pub exercise_intros: Vec<String>,
    pub exercises: Vec<StyledExercise>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyledExercise {
    pub id: u32,
    pub statement: String,
    pub options: Vec<String>,
    pub answer: String,
}

// ── Marked convention ──

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkedDocument {
    pub course_title: String,
    pub notebook_title: String,
    pub programmatic_content: String,
    pub subjects: Vec<Subject>,
    pub contest_questions: Vec<ContestQuestion>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub subject_name: String,
    pub theory_slides: Vec<TheorySlide>,
    pub exercises: Vec<MarkedExercise>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TheorySlide {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkedExercise {
    pub statement: String,
    pub questions: Vec<ExerciseQuestion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseQuestion {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestQuestion {
    pub id: u32,
    pub statement: String,
    pub text: String,
    pub source: String,
    pub options: Vec<String>,
    pub answer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styled_field_names_are_camel_case() {
        let doc = StyledDocument {
            course_title: "C".into(),
            notebook_title: "N".into(),
            sections: vec![Section {
                subject_primary: "S".into(),
                ..Default::default()
            }],
            warnings: vec![],
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["courseTitle"], "C");
        assert_eq!(json["sections"][0]["subjectPrimary"], "S");
        assert!(json["sections"][0]["theorySlides"].is_array());
    }

    #[test]
    fn marked_field_names_are_camel_case() {
        let doc = MarkedDocument {
            programmatic_content: "p".into(),
            contest_questions: vec![ContestQuestion {
                id: 3,
                ..Default::default()
            }],
            ..Default::default()
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["programmaticContent"], "p");
        assert_eq!(json["contestQuestions"][0]["id"], 3);
    }

    #[test]
    fn read_failure_has_single_warning_only() {
        let err = anyhow::anyhow!("no such file");
        let doc = ParsedDocument::read_failure(&err);
        assert_eq!(doc.warnings().len(), 1);
        assert!(doc.warnings()[0].starts_with("Failed to read DOCX file:"));
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["courseTitle"], "");
        assert!(json["sections"].as_array().unwrap().is_empty());
    }
}
