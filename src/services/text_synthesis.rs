use crate::models::MovieText;

/// At most this many review excerpts contribute to the semantic text
const MAX_REVIEW_EXCERPTS: usize = 3;

/// Character cap per review excerpt, so one long review cannot dominate
const MAX_EXCERPT_CHARS: usize = 300;

/// Merges a movie's free-text fields into one canonical string for embedding.
///
/// Each present field becomes a labeled section and sections are joined with
/// blank lines, giving the embedding model structured context. Absent or empty
/// fields are omitted entirely. Returns the empty string when every input is
/// empty; the caller must treat that movie as having no embedding.
pub fn synthesize_semantic_text(overview: Option<&str>, text: &MovieText) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(overview) = overview {
        if !overview.trim().is_empty() {
            sections.push(format!("Overview: {}", overview.trim()));
        }
    }

    if let Some(tagline) = &text.tagline {
        if !tagline.trim().is_empty() {
            sections.push(format!("Tagline: {}", tagline.trim()));
        }
    }

    let keywords: Vec<&str> = text
        .keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();
    if !keywords.is_empty() {
        sections.push(format!("Themes: {}", keywords.join(", ")));
    }

    let excerpts: Vec<String> = text
        .review_excerpts
        .iter()
        .filter(|r| !r.trim().is_empty())
        .take(MAX_REVIEW_EXCERPTS)
        .map(|r| truncate_chars(r.trim(), MAX_EXCERPT_CHARS))
        .collect();
    if !excerpts.is_empty() {
        sections.push(format!("Audience Reviews: {}", excerpts.join(" | ")));
    }

    sections.join("\n\n")
}

/// Truncates to a character count, not a byte count, so multi-byte text
/// never gets split mid-character.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.chars().take(max_chars).collect()
}
