/// Markers after which a model writes its answer, English and Arabic.
pub const ANSWER_MARKERS: [&str; 2] = ["Answer:", "الإجابة:"];

const TERMINATORS: [char; 4] = ['?', '.', '!', '\n'];

/// Reduce raw model output to a one-sentence answer.
///
/// Drops an echoed `prompt`, keeps only the text after the last answer
/// marker, then cuts at the earliest `?`, `.`, `!` or newline that follows
/// more than two characters of text. Punctuation is kept, a newline is not.
pub fn clean_generated_text(raw: &str, prompt: &str) -> String {
    let without_prompt = if prompt.is_empty() { raw.to_string() } else { raw.replace(prompt, " ") };
    let answer = after_last_marker(&without_prompt).trim();

    for (i, c) in answer.char_indices() {
        if !TERMINATORS.contains(&c) { continue; }
        let head = answer[..i].trim();
        if head.chars().count() > 2 {
            return if c == '\n' { head.to_string() } else { format!("{head}{c}") };
        }
    }
    answer.to_string()
}

fn after_last_marker(text: &str) -> &str {
    ANSWER_MARKERS
        .iter()
        .filter_map(|m| text.rfind(m).map(|at| at + m.len()))
        .max()
        .map_or(text, |from| &text[from..])
}

/// Cap `answer` at `max_chars` characters, backing off to the last whole
/// word and appending `...`. Shorter answers are returned trimmed.
pub fn truncate_answer(answer: &str, max_chars: usize) -> String {
    let answer = answer.trim();
    let Some((cut, _)) = answer.char_indices().nth(max_chars) else { return answer.to_string() };
    let head = &answer[..cut];
    let head = head.rsplit_once(' ').map_or(head, |(words, _)| words);
    format!("{}...", head.trim_end())
}
