use crate::parser::exercises::extract_exercises;
use crate::parser::paragraph::{classify, Paragraph, Role, StyleTag};
use crate::schema::{Section, StyledDocument};

/// Assembler states for the style-driven convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SearchingSection,
    InSection,
    InTheory,
    InExerciseIntro,
    InExercises,
}

/// Parse a paragraph stream using the heading-style convention: the first two
/// paragraphs carry the titles, Heading-3 (or all-caps) paragraphs open
/// sections, Heading-4 paragraphs open theory slides, and exercise runs are
/// buffered until the section closes.
pub fn parse_styled(paragraphs: &[Paragraph]) -> StyledDocument {
    let mut warnings = Vec::new();

    let course_title = extract_title(
        paragraphs.first(),
        StyleTag::Heading1,
        "Course",
        "Heading 1",
        &mut warnings,
    );
    let notebook_title = extract_title(
        paragraphs.get(1),
        StyleTag::Heading2,
        "Notebook",
        "Heading 2",
        &mut warnings,
    );

    let body = if paragraphs.len() > 2 { &paragraphs[2..] } else { &[] };
    let sections = assemble_sections(body, &mut warnings);

    StyledDocument {
        course_title,
        notebook_title,
        sections,
        warnings,
    }
}

/// Titles are positional: the paragraph is kept as the title regardless of
/// style, with a warning when the expected heading tag is absent.
fn extract_title(
    paragraph: Option<&Paragraph>,
    expected: StyleTag,
    label: &str,
    style_name: &str,
    warnings: &mut Vec<String>,
) -> String {
    match paragraph {
        Some(p) => {
            let text = p.text.trim().to_string();
            if p.style != expected {
                warnings.push(format!(
                    "{label} title might be incorrect: '{text}' is not styled as {style_name}."
                ));
            }
            text
        }
        None => {
            warnings.push(format!("{label} title not found."));
            String::new()
        }
    }
}

fn assemble_sections(paragraphs: &[Paragraph], warnings: &mut Vec<String>) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<Section> = None;
    let mut exercise_buffer: Vec<String> = Vec::new();
    let mut state = State::SearchingSection;

    for p in paragraphs {
        let text = p.text.trim();
        let role = classify(p);

        // A new primary subject closes the open section from any state except
        // the unconditional buffering right after an intro line.
        if role == Role::SubjectPrimary && state != State::InExerciseIntro {
            flush_section(&mut current, &mut exercise_buffer, &mut sections, warnings);
            current = Some(Section {
                subject_primary: text.to_string(),
                ..Default::default()
            });
            state = State::InSection;
            continue;
        }

        // Every state past SearchingSection has an open section.
        let Some(open) = current.as_mut() else {
            // Leading paragraphs without a subject belong to title extraction
            // upstream; drop them.
            continue;
        };

        match state {
            State::SearchingSection => {}

            State::InSection => match role {
                Role::TheorySlide => {
                    open.theory_slides.push(text.to_string());
                    state = State::InTheory;
                }
                Role::ExerciseIntro => {
                    open.exercise_intros.push(text.to_string());
                    state = State::InExerciseIntro;
                }
                _ => {
                    // At most one secondary-subject line per section
                    if open.subject_secondary.is_none() {
                        open.subject_secondary = Some(text.to_string());
                    }
                }
            },

            State::InTheory => match role {
                Role::TheorySlide => {
                    open.theory_slides.push(text.to_string());
                }
                Role::ExerciseIntro => {
                    open.exercise_intros.push(text.to_string());
                    state = State::InExerciseIntro;
                }
                _ => {
                    // Concatenated theory content under the open slide
                    if let Some(slide) = open.theory_slides.last_mut() {
                        slide.push('\n');
                        slide.push_str(text);
                    }
                }
            },

            State::InExerciseIntro => {
                exercise_buffer.push(text.to_string());
                state = State::InExercises;
            }

            State::InExercises => {
                exercise_buffer.push(text.to_string());
            }
        }
    }

    flush_section(&mut current, &mut exercise_buffer, &mut sections, warnings);
    sections
}


fn flush_section(
    current: &mut Option<Section>,
    exercise_buffer: &mut Vec<String>,
    sections: &mut Vec<Section>,
    warnings: &mut Vec<String>,
) {
    let Some(mut section) = current.take() else {
        exercise_buffer.clear();
        return;
    };

    let buffer = std::mem::take(exercise_buffer);
    section.exercises = extract_exercises(&buffer, &section.subject_primary, warnings);

    if section.theory_slides.is_empty() && section.exercises.is_empty() {
        warnings.push(format!(
            "Section '{}' has no theory slides or exercises.",
            section.subject_primary
        ));
    }
    sections.push(section);
}

// ── Tests ──
