use std::sync::LazyLock;

use regex::Regex;

use crate::parser::paragraph::{classify, normalize_answer, Paragraph, Role};
use crate::schema::StyledExercise;

static EXERCISE_START_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[.)]").unwrap());

/// Extract exercises from a buffered run of paragraph texts (the intro line
/// has already been consumed by the section assembler).
///
/// A line matching `^\d+[.)]` opens a new exercise and keeps the whole line
/// as the first statement line. Option lines are kept verbatim; answer lines
/// are keyword-stripped. Everything else extends the statement. Ids restart
/// at 1 per section.
pub fn extract_exercises(
    buffer: &[String],
    subject: &str,
    warnings: &mut Vec<String>,
) -> Vec<StyledExercise> {
    let mut exercises: Vec<StyledExercise> = Vec::new();
    let mut current: Option<StyledExercise> = None;
    let mut next_id: u32 = 1;

    for line in buffer {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if EXERCISE_START_RE.is_match(line) {
            if let Some(done) = current.take() {
                flush(done, subject, warnings, &mut exercises);
            }
            current = Some(StyledExercise {
                id: next_id,
                statement: line.to_string(),
                options: Vec::new(),
                answer: String::new(),
            });
            next_id += 1;
            continue;
        }

        // Lines before the first numbered statement ("Resolva as questões a
        // seguir:" and the like) have no exercise to attach to.
        let Some(exercise) = current.as_mut() else {
            continue;
        };

        match classify(&Paragraph::plain(line)) {
            Role::Option => exercise.options.push(line.to_string()),
            Role::Answer => exercise.answer = normalize_answer(line),
            _ => {
                // Wrapped statement line
                exercise.statement.push('\n');
                exercise.statement.push_str(line);
            }
        }
    }

    if let Some(done) = current.take() {
        flush(done, subject, warnings, &mut exercises);
    }

    exercises
}

fn flush(
    exercise: StyledExercise,
    subject: &str,
    warnings: &mut Vec<String>,
    exercises: &mut Vec<StyledExercise>,
) {
    if exercise.options.is_empty() {
        warnings.push(format!(
            "Exercise {} in section '{}' is missing options.",
            exercise.id, subject
        ));
    }
    if exercise.answer.is_empty() {
        warnings.push(format!(
            "Exercise {} in section '{}' is missing an answer.",
            exercise.id, subject
        ));
    }
    exercises.push(exercise);
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn single_exercise_with_options_and_answer() {
        let buffer = lines(&[
            "Resolva as questões a seguir:",
            "1) (CESPE/2024) O texto 10A2-I é predominantemente...",
            "A) Narrativo",
            "B) Expositivo",
            "C) Descritivo",
            "Gabarito: B",
        ]);
        let mut warnings = Vec::new();
        let ex = extract_exercises(&buffer, "Interpretação", &mut warnings);
        assert_eq!(ex.len(), 1);
        assert_eq!(ex[0].id, 1);
        assert_eq!(ex[0].statement, "1) (CESPE/2024) O texto 10A2-I é predominantemente...");
        assert_eq!(ex[0].options, vec!["A) Narrativo", "B) Expositivo", "C) Descritivo"]);
        assert_eq!(ex[0].answer, "B");
        assert!(warnings.is_empty());
    }

    #[test]
    fn certo_errado_items() {
        let buffer = lines(&["2) Julgue o item a seguir", "CERTO", "ERRADO", "Gabarito: CERTO"]);
        let mut warnings = Vec::new();
        let ex = extract_exercises(&buffer, "S", &mut warnings);
        assert_eq!(ex[0].options, vec!["CERTO", "ERRADO"]);
        assert_eq!(ex[0].answer, "CERTO");
        assert!(warnings.is_empty());
    }

    #[test]
    fn back_to_back_statements_warn_in_order() {
        let buffer = lines(&["1) First statement", "2) Second statement", "A) opt", "Gabarito: A"]);
        let mut warnings = Vec::new();
        let ex = extract_exercises(&buffer, "S", &mut warnings);
        assert_eq!(ex.len(), 2);
        assert!(ex[0].options.is_empty());
        assert!(ex[0].answer.is_empty());
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("Exercise 1") && warnings[0].contains("missing options"));
        assert!(warnings[1].contains("Exercise 1") && warnings[1].contains("is missing an answer"));
    }

    #[test]
    fn missing_answer_only() {
        let buffer = lines(&["1) Statement", "A) Narrativo", "B) Expositivo"]);
        let mut warnings = Vec::new();
        let ex = extract_exercises(&buffer, "Gêneros", &mut warnings);
        assert_eq!(ex[0].answer, "");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Exercise 1"));
        assert!(warnings[0].contains("is missing an answer"));
    }

    #[test]
    fn alternate_markers() {
        let buffer = lines(&[
            "1. A statement.",
            "(A) Option 1",
            "[B] Option 2",
            "C. Option 3",
            "Alternativa Correta: B",
        ]);
        let mut warnings = Vec::new();
        let ex = extract_exercises(&buffer, "S", &mut warnings);
        assert_eq!(ex[0].statement, "1. A statement.");
        assert_eq!(ex[0].options.len(), 3);
        assert_eq!(ex[0].answer, "B");
    }

    #[test]
    fn wrapped_statement_lines_join() {
        let buffer = lines(&["1) A statement that", "wraps onto a second line", "A) opt", "Gabarito: A"]);
        let mut warnings = Vec::new();
        let ex = extract_exercises(&buffer, "S", &mut warnings);
        assert_eq!(ex[0].statement, "1) A statement that\nwraps onto a second line");
    }

    #[test]
    fn ids_are_sequential_per_call() {
        let buffer = lines(&["1) a", "A) x", "Gabarito: A", "7) b", "B) y", "Gabarito: B"]);
        let mut warnings = Vec::new();
        let ex = extract_exercises(&buffer, "S", &mut warnings);
        assert_eq!(ex.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn empty_buffer_yields_nothing() {
        let mut warnings = Vec::new();
        assert!(extract_exercises(&[], "S", &mut warnings).is_empty());
        assert!(warnings.is_empty());
    }
}
