//! Prompt assembly for draft generation.
//!
//! The prompt carries the topic plus whatever context the profile and series
//! provide. Sections are omitted entirely when absent so the model never sees
//! empty headings.

/// Context fed into prompt assembly for one post.
#[derive(Debug, Clone, Default)]
pub struct PromptInputs<'a> {
    pub topic: &'a str,
    pub notes: Option<&'a str>,
    pub persona: Option<&'a str>,
    pub series_title: Option<&'a str>,
    pub category: Option<&'a str>,
    /// Body of the previous published post in the same series, for continuity.
    pub previous_post_summary: Option<&'a str>,
}

/// Build the prompt for a text/image/video draft.
#[must_use]
pub fn build_draft_prompt(inputs: &PromptInputs<'_>) -> String {
    let mut prompt = String::new();

    prompt.push_str("Write a LinkedIn post on the following topic.\n\n");
    prompt.push_str(&format!("Topic: {}\n", inputs.topic));

    if let Some(notes) = non_empty(inputs.notes) {
        prompt.push_str(&format!("Notes from the author: {notes}\n"));
    }
    if let Some(series) = non_empty(inputs.series_title) {
        prompt.push_str(&format!("This post is part of the series \"{series}\""));
        if let Some(category) = non_empty(inputs.category) {
            prompt.push_str(&format!(" ({category})"));
        }
        prompt.push('\n');
    }
    if let Some(previous) = non_empty(inputs.previous_post_summary) {
        prompt.push_str(&format!(
            "\nThe previous post in this series said:\n---\n{previous}\n---\n\
             Continue the narrative without repeating it.\n"
        ));
    }
    if let Some(persona) = non_empty(inputs.persona) {
        prompt.push_str(&format!("\nVoice and style guidance:\n{persona}\n"));
    }

    prompt.push_str("\nReturn only the post body, no preamble.");
    prompt
}

/// Build the prompt for an html carousel draft.
///
/// The template itself travels in the request's `template_html` field; the
/// prompt only explains how to fill it.
#[must_use]
pub fn build_html_prompt(inputs: &PromptInputs<'_>, page_count: u32) -> String {
    let mut prompt = build_draft_prompt(inputs);
    prompt.push_str(&format!(
        "\n\nProduce a {page_count}-page carousel using the supplied HTML template. \
         Each page must stand alone; the first page is the hook, the last page \
         is the call to action."
    ));
    prompt
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
