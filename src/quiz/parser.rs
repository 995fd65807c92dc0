//! Extract multiple-choice questions from free-form model output
//!
//! Expected shape, one question per blank-line separated block:
//!
//! ```text
//! 1. What is the capital of France?
//! A) Berlin
//! B) Paris
//! C) Rome
//! D) Madrid
//! Correct answer: B) Paris
//! ```

use super::QuizQuestion;

const OPTIONS_PER_QUESTION: usize = 4;
/// Question line, four options, answer line
const MIN_BLOCK_LINES: usize = 2 + OPTIONS_PER_QUESTION;

/// Parse every well-formed block; short blocks are skipped.
pub fn parse_quiz(content: &str) -> Vec<QuizQuestion> {
    blocks(content)
        .into_iter()
        .filter(|lines| lines.len() >= MIN_BLOCK_LINES)
        .map(|lines| {
            let options: Vec<String> = lines[1..=OPTIONS_PER_QUESTION].to_vec();
            let correct_answer = strip_answer_label(&lines[OPTIONS_PER_QUESTION + 1]).to_string();
            let answer_index = resolve_answer(&options, &correct_answer);
            QuizQuestion {
                question: strip_numbering(&lines[0]).to_string(),
                options,
                correct_answer,
                answer_index,
            }
        })
        .collect()
}

/// Group non-blank lines into blocks separated by blank lines
fn blocks(content: &str) -> Vec<Vec<String>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in content.lines() {
        let cleaned = line.replace("**", "");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(cleaned.to_string());
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

/// "Correct answer: B) Paris" -> "B) Paris"
fn strip_answer_label(line: &str) -> &str {
    let lower = line.to_ascii_lowercase();
    if lower.starts_with("correct answer") || lower.starts_with("answer") {
        if let Some((_, rest)) = line.split_once(':') {
            return rest.trim();
        }
    }
    line.trim()
}

/// "3. Why?" / "3) Why?" -> "Why?"
fn strip_numbering(line: &str) -> &str {
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == line.len() {
        return line;
    }
    rest.strip_prefix('.')
        .or_else(|| rest.strip_prefix(')'))
        .map_or(line, str::trim_start)
}

/// Option letter of "B) Paris", "(b)", "C." or a bare "D"
fn option_letter(text: &str) -> Option<usize> {
    let text = text.trim();
    let text = text.strip_prefix('(').unwrap_or(text);
    let mut chars = text.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let index = match letter {
        'A' => 0,
        'B' => 1,
        'C' => 2,
        'D' => 3,
        _ => return None,
    };
    match chars.next() {
        None | Some(')' | '.' | ':') => Some(index),
        _ => None,
    }
}

/// Option text with any letter prefix removed
fn option_body(text: &str) -> &str {
    let text = text.trim();
    if option_letter(text).is_none() {
        return text;
    }
    let unwrapped = text.strip_prefix('(').unwrap_or(text);
    let mut chars = unwrapped.chars();
    chars.next();
    let rest = chars.as_str();
    rest.strip_prefix(|c: char| matches!(c, ')' | '.' | ':'))
        .unwrap_or(rest)
        .trim()
}

/// Locate the correct answer among the options
fn resolve_answer(options: &[String], answer: &str) -> Option<usize> {
    let answer = answer.trim();
    if answer.is_empty() {
        return None;
    }

    if let Some(i) = options.iter().position(|o| o.eq_ignore_ascii_case(answer)) {
        return Some(i);
    }

    if let Some(letter) = option_letter(answer) {
        let labelled = options.iter().position(|o| option_letter(o) == Some(letter));
        return labelled.or_else(|| (letter < options.len()).then_some(letter));
    }

    let body = option_body(answer);
    options
        .iter()
        .position(|o| option_body(o).eq_ignore_ascii_case(body))
}
