//! Prompts for relevance, extraction and resume customization, plus the
//! response cleanup each one needs.

/// Separator between the configured relevance prompt and the post.
pub const POST_SEPARATOR: &str = "\n\nPOST:\n";

/// Prompt for extracting structured job fields.
pub const EXTRACT_PROMPT: &str = r#"Extract the following fields from the job post, and return in JSON format:
{
  "company": "company name",
  "role": "job role/title",
  "location": "job location",
  "url": "application URL or company URL",
  "salary": "salary information",
  "rawSnippet": "a short snippet from the post (max 200 chars)"
}
If any field is missing, return empty string for that field.
Return ONLY valid JSON, no additional text.

POST:
{post}"#;

/// Prompt for tailoring a LaTeX resume template to a job.
pub const RESUME_PROMPT: &str = r#"You are a professional resume writer. Customize this LaTeX resume template for a specific job application.

JOB DETAILS:
- Company: {company}
- Role: {role}
- Location: {location}
- Salary: {salary}
- Description: {description}

RESUME TEMPLATE TO CUSTOMIZE:
{template}

INSTRUCTIONS:
1. Change only the parts that matter for this role.
2. Keep it to a single page; do not pad it with extra lines.
3. Keep the resume ATS-friendly and professional.

Return ONLY the complete, customized LaTeX document. Do not include any explanations or additional text outside the LaTeX document."#;

/// Markers every compilable resume document must contain.
pub const REQUIRED_MARKERS: &[&str] = &["\\documentclass", "\\begin{document}", "\\end{document}"];

pub fn format_relevance_prompt(prompt: &str, post: &str) -> String {
    format!("{}{}{}", prompt, POST_SEPARATOR, post)
}

pub fn format_extract_prompt(post: &str) -> String {
    EXTRACT_PROMPT.replace("{post}", post)
}

/// Format the resume prompt. Empty job fields get neutral placeholders.
pub fn format_resume_prompt(
    company: &str,
    role: &str,
    location: &str,
    salary: &str,
    description: &str,
    template: &str,
) -> String {
    fn or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
        if value.trim().is_empty() {
            fallback
        } else {
            value
        }
    }

    RESUME_PROMPT
        .replace("{company}", company)
        .replace("{role}", role)
        .replace("{location}", or(location, "Remote"))
        .replace("{salary}", or(salary, "Competitive"))
        .replace("{description}", or(description, "Software development position"))
        .replace("{template}", template)
}

/// A relevance answer counts only if it starts with "yes".
pub fn is_affirmative(response: &str) -> bool {
    response.trim().to_lowercase().starts_with("yes")
}

/// Remove a surrounding ```json fence.
pub fn strip_json_fences(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Remove a surrounding ```latex fence.
pub fn strip_latex_fences(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```latex")
        .trim_start_matches("```tex")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Name of the first required marker missing from `markup`, if any.
pub fn missing_marker(markup: &str) -> Option<&'static str> {
    REQUIRED_MARKERS
        .iter()
        .copied()
        .find(|marker| !markup.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relevance_prompt_layout() {
        let formatted = format_relevance_prompt("Is this a job?", "We are hiring");
        assert_eq!(formatted, "Is this a job?\n\nPOST:\nWe are hiring");
    }

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative("  Yes, this is a job post"));
        assert!(is_affirmative("YES"));
        assert!(!is_affirmative("No"));
        assert!(!is_affirmative("Maybe yes"));
    }

    #[test]
    fn test_strip_json_fences() {
        assert_eq!(strip_json_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_json_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_strip_latex_fences() {
        assert_eq!(strip_latex_fences("```latex\n\\documentclass{x}\n```"), "\\documentclass{x}");
    }

    #[test]
    fn test_resume_prompt_placeholders() {
        let formatted = format_resume_prompt("Acme", "Engineer", "", " ", "", "TEMPLATE");
        assert!(formatted.contains("- Location: Remote"));
        assert!(formatted.contains("- Salary: Competitive"));
        assert!(formatted.contains("TEMPLATE"));
    }

    #[test]
    fn test_missing_marker() {
        let doc = "\\documentclass{article}\\begin{document}hi\\end{document}";
        assert_eq!(missing_marker(doc), None);
        assert_eq!(missing_marker("\\documentclass{article}"), Some("\\begin{document}"));
    }
}
