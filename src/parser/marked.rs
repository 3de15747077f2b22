use std::sync::LazyLock;

use regex::Regex;

use crate::parser::paragraph::Paragraph;
use crate::schema::{ContestQuestion, ExerciseQuestion, MarkedDocument, MarkedExercise, Subject, TheorySlide};

static COURSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s*Curso:\s*\[?([^\]]+)\]?$").unwrap());
static NOTEBOOK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s*Caderno:\s*\[?([^\]]+)\]?$").unwrap());
static PROGRAMMATIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s*Conteúdo Programático:$").unwrap());
static SUBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s*Assunto\s*\d+:\s*\[?([^\]]+)\]?$").unwrap());
static THEORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^###\s*Título do Slide \(Teoria\):$").unwrap());
static EXERCISE_STATEMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^###\s*Enunciado do Exercício:$").unwrap());
static EXERCISE_QUESTIONS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^###\s*Questões do Exercício:$").unwrap());
static SIMPLE_QUESTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z]\)\s*(.+)$").unwrap());
static SIMPLE_ANSWER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^>(\w+)$").unwrap());
static CONTEST_SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s*Questões de Concurso$").unwrap());
static CONTEST_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^###\s*Questão\s*(\d+)$").unwrap());
static CONTEST_STATEMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*Enunciado da Questão:\*\*\s*(.+)$").unwrap());
static CONTEST_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*Texto:\*\*\s*(.*)$").unwrap());
static CONTEST_ALTERNATIVES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^###\s*Alternativas:$").unwrap());
static OPTION_ANSWER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-\s*([A-E])\)\s*(.+?)\s*\(gabarito\)$").unwrap());
static OPTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-\s*([A-E])\)\s*(.+)$").unwrap());
static EMPTY_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[\]$").unwrap());
static EXAM_SOURCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^)]+)\)").unwrap());

/// Parse a paragraph stream using the explicit-marker convention: `# Curso:`,
/// `## Assunto N:`, `### Enunciado do Exercício:` and friends delimit every
/// block, so extraction is span search over line indices rather than a
/// streaming state machine.
pub fn parse_marked(paragraphs: &[Paragraph]) -> MarkedDocument {
    let lines: Vec<&str> = paragraphs.iter().map(|p| p.text.trim()).collect();
    let mut warnings = Vec::new();

    let course_title = extract_course_title(&lines, &mut warnings);
    let notebook_title = extract_notebook_title(&lines, &mut warnings);
    let programmatic_content = extract_programmatic_content(&lines, &mut warnings);
    let subjects = extract_subjects(&lines, &mut warnings);
    let contest_questions = extract_contest_questions(&lines, &mut warnings);

    MarkedDocument {
        course_title,
        notebook_title,
        programmatic_content,
        subjects,
        contest_questions,
        warnings,
    }
}

/// Lightweight sniff used by format auto-detection: a document is in the
/// marked convention when any paragraph carries one of its title or subject
/// markers.
pub(crate) fn looks_marked(paragraphs: &[Paragraph]) -> bool {
    paragraphs.iter().any(|p| {
        let l = p.text.trim();
        COURSE_RE.is_match(l) || NOTEBOOK_RE.is_match(l) || SUBJECT_RE.is_match(l)
    })
}

/// Index of the first line at or after `start` matching any given pattern.
fn find_from(lines: &[&str], start: usize, patterns: &[&Regex]) -> Option<usize> {
    (start..lines.len()).find(|&i| patterns.iter().any(|re| re.is_match(lines[i])))
}

/// Strip surrounding whitespace and bracket characters.
fn clean_text(text: &str) -> String {
    text.trim()
        .trim_matches(|c| c == '[' || c == ']')
        .trim()
        .to_string()
}

/// First 30 characters, for warning messages quoting long text.
fn preview(text: &str) -> String {
    text.chars().take(30).collect()
}

fn extract_course_title(lines: &[&str], warnings: &mut Vec<String>) -> String {
    match lines.iter().find_map(|l| COURSE_RE.captures(l)) {
        Some(caps) => clean_text(&caps[1]),
        None => {
            warnings.push("Course title not found.".to_string());
            String::new()
        }
    }
}

fn extract_notebook_title(lines: &[&str], warnings: &mut Vec<String>) -> String {
    match lines.iter().find_map(|l| NOTEBOOK_RE.captures(l)) {
        Some(caps) => clean_text(&caps[1]),
        None => {
            warnings.push("Notebook title not found.".to_string());
            String::new()
        }
    }
}

fn extract_programmatic_content(lines: &[&str], warnings: &mut Vec<String>) -> String {
    let Some(marker) = find_from(lines, 0, &[&PROGRAMMATIC_RE]) else {
        warnings.push("Programmatic content section not found.".to_string());
        return String::new();
    };
    let start = marker + 1;
    let end = find_from(lines, start, &[&SUBJECT_RE, &CONTEST_SECTION_RE]).unwrap_or(lines.len());
    let content = lines[start..end].join("\n").trim().to_string();
    if content.is_empty() {
        warnings.push("Programmatic content is empty.".to_string());
    }
    content
}

fn extract_subjects(lines: &[&str], warnings: &mut Vec<String>) -> Vec<Subject> {
    let subject_indices: Vec<usize> = (0..lines.len())
        .filter(|&i| SUBJECT_RE.is_match(lines[i]))
        .collect();

    let mut subjects = Vec::new();
    for (i, &start) in subject_indices.iter().enumerate() {
        let subject_name = SUBJECT_RE
            .captures(lines[start])
            .map(|caps| clean_text(&caps[1]))
            .unwrap_or_default();

        let end = match subject_indices.get(i + 1) {
            Some(&next) => next,
            None => find_from(lines, start + 1, &[&CONTEST_SECTION_RE]).unwrap_or(lines.len()),
        };
        let span = &lines[start + 1..end];

        let theory_slides = extract_theory_slides(span, warnings);
        let exercises = extract_exercises(span, warnings);

        if theory_slides.is_empty() && exercises.is_empty() {
            warnings.push(format!(
                "Subject '{subject_name}' has no theory slides or exercises."
            ));
        }

        subjects.push(Subject {
            subject_name,
            theory_slides,
            exercises,
        });
    }
    subjects
}

fn extract_theory_slides(lines: &[&str], warnings: &mut Vec<String>) -> Vec<TheorySlide> {
    let mut slides = Vec::new();
    let mut cursor = 0;

    while let Some(marker) = find_from(lines, cursor, &[&THEORY_RE]) {
        // The line right after the marker is the single-line title
        let title = lines.get(marker + 1).map(|l| l.trim()).unwrap_or("").to_string();
        let content_start = (marker + 2).min(lines.len());
        let content_end =
            find_from(lines, content_start, &[&THEORY_RE, &EXERCISE_STATEMENT_RE]).unwrap_or(lines.len());
        let content = lines[content_start..content_end].join("\n").trim().to_string();

        if title.is_empty() {
            warnings.push("Theory slide found with empty title.".to_string());
        }
        if content.is_empty() {
            warnings.push(format!("Theory slide '{title}' has empty content."));
        }

        slides.push(TheorySlide { title, content });
        cursor = content_end;
    }
    slides
}

fn extract_exercises(lines: &[&str], warnings: &mut Vec<String>) -> Vec<MarkedExercise> {
    let mut exercises = Vec::new();
    let mut cursor = 0;

    loop {
        let Some(statement_marker) = find_from(lines, cursor, &[&EXERCISE_STATEMENT_RE]) else {
            break;
        };
        let statement_start = statement_marker + 1;
        // A statement with no questions marker behind it is dropped
        let Some(questions_marker) = find_from(lines, statement_start, &[&EXERCISE_QUESTIONS_RE])
        else {
            break;
        };
        let statement = lines[statement_start..questions_marker]
            .join("\n")
            .trim()
            .to_string();

        let questions_start = questions_marker + 1;
        let questions_end =
            find_from(lines, questions_start, &[&THEORY_RE, &EXERCISE_STATEMENT_RE]).unwrap_or(lines.len());
        let block = &lines[questions_start..questions_end];

        let mut questions = Vec::new();
        for (i, line) in block.iter().enumerate() {
            if !SIMPLE_QUESTION_RE.is_match(line) {
                continue;
            }
            let question = clean_text(line);
            let answer = block
                .get(i + 1)
                .and_then(|next| SIMPLE_ANSWER_RE.captures(next))
                .map(|caps| caps[1].to_string())
                .unwrap_or_default();
            if answer.is_empty() {
                warnings.push(format!(
                    "Answer not found for question: '{}...'",
                    preview(&question)
                ));
            }
            questions.push(ExerciseQuestion { question, answer });
        }

        if statement.is_empty() {
            warnings.push("Exercise found with empty statement.".to_string());
        }
        if questions.is_empty() {
            warnings.push(format!(
                "No questions found for exercise with statement: '{}...'",
                preview(&statement)
            ));
        }

        exercises.push(MarkedExercise {
            statement,
            questions,
        });
        cursor = questions_end;
    }
    exercises
}

fn extract_contest_questions(lines: &[&str], warnings: &mut Vec<String>) -> Vec<ContestQuestion> {
    // No contest section, no questions and no warning
    if find_from(lines, 0, &[&CONTEST_SECTION_RE]).is_none() {
        return Vec::new();
    }

    let question_indices: Vec<usize> = (0..lines.len())
        .filter(|&i| CONTEST_ID_RE.is_match(lines[i]))
        .collect();

    let mut questions = Vec::new();
    for (i, &q_start) in question_indices.iter().enumerate() {
        let Some(id) = CONTEST_ID_RE
            .captures(lines[q_start])
            .and_then(|caps| caps[1].parse::<u32>().ok())
        else {
            continue;
        };

        let q_end = question_indices.get(i + 1).copied().unwrap_or(lines.len());
        let span = &lines[q_start + 1..q_end];

        // The statement is mandatory; anything else in the span is optional.
        let Some(statement) = span
            .iter()
            .find_map(|l| CONTEST_STATEMENT_RE.captures(l))
            .map(|caps| clean_text(&caps[1]))
        else {
            warnings.push(format!("Could not parse all parts of Contest Question ID {id}."));
            continue;
        };

        let text = span
            .iter()
            .find_map(|l| CONTEST_TEXT_RE.captures(l))
            .map(|caps| caps[1].trim().to_string())
            .map(|t| if EMPTY_TEXT_RE.is_match(&t) { String::new() } else { t })
            .unwrap_or_default();

        let mut options = Vec::new();
        let mut answer = String::new();
        if let Some(alt_start) = find_from(span, 0, &[&CONTEST_ALTERNATIVES_RE]) {
            for line in &span[alt_start + 1..] {
                if let Some(caps) = OPTION_ANSWER_RE.captures(line) {
                    answer = caps[1].to_string();
                    options.push(format!("{}) {}", &caps[1], &caps[2]));
                } else if let Some(caps) = OPTION_RE.captures(line) {
                    options.push(format!("{}) {}", &caps[1], &caps[2]));
                }
            }
        }

        let source = EXAM_SOURCE_RE
            .captures(&statement)
            .map(|caps| caps[1].to_string())
            .unwrap_or_default();

        if statement.is_empty() {
            warnings.push(format!("Contest Question ID {id} is missing a statement."));
        }
        if options.is_empty() {
            warnings.push(format!("Contest Question ID {id} is missing options."));
        }
        if answer.is_empty() {
            warnings.push(format!("Contest Question ID {id} is missing an answer."));
        }

        questions.push(ContestQuestion {
            id,
            statement,
            text,
            source,
            options,
            answer,
        });
    }
    questions
}

// ── Tests ──
