
/// Split document text into sections on blank-line boundaries.
///
/// One or more blank (whitespace-only) lines separate sections. Each
/// section is trimmed; sections that are empty after trimming are
/// dropped. Pure function: the same input always yields the same
/// sequence, and zero sections is a valid result for blank input.
#[inline]
pub fn split_sections(content: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            flush_section(&mut current, &mut sections);
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }
    flush_section(&mut current, &mut sections);

    sections
}

fn flush_section(current: &mut String, sections: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sections.push(trimmed.to_string());
    }
    current.clear();
}
