use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

/// Headings extracted from a disease explanation, in display order.
pub const DETAIL_HEADINGS: [&str; 5] =
    ["Symptoms", "Causes", "Diagnosis", "Treatment", "Prevention"];

/// Key used for the whole text when no heading is found.
pub const SUMMARY_KEY: &str = "summary";

lazy_static! {
    static ref HEADING_PATTERNS: Vec<(&'static str, Regex)> = DETAIL_HEADINGS
        .iter()
        .map(|&heading| {
            let pattern = format!(r"(?i){}[:\n]?", regex::escape(heading));
            (heading, Regex::new(&pattern).unwrap())
        })
        .collect();
    static ref NEXT_HEADING: Regex = Regex::new(r"(?i)\n[a-z]+:").unwrap();
}

/// Splits generated text into its known sections.
///
/// Each section runs from the first case-insensitive occurrence of its
/// heading (with an optional `:` or newline after it) to the next line that
/// starts with a single word followed by `:`, or the end of the text.
pub fn section_details(text: &str) -> BTreeMap<String, String> {
    let text = text.trim();
    let mut sections = BTreeMap::new();

    for (heading, pattern) in HEADING_PATTERNS.iter() {
        let Some(found) = pattern.find(text) else {
            continue;
        };
        let rest = &text[found.end()..];
        let body = match NEXT_HEADING.find(rest) {
            Some(next) => &rest[..next.start()],
            None => rest,
        };
        sections.insert(heading.to_string(), body.trim().to_string());
    }

    if sections.is_empty() {
        sections.insert(SUMMARY_KEY.to_string(), text.to_string());
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_split_on_headings() {
        let text = "Symptoms:\n- Fever\n- Chills\nCauses:\n- Parasite spread by mosquitoes\n\
                    Treatment:\n- Antimalarial drugs\n";
        let sections = section_details(text);
        assert_eq!(sections["Symptoms"], "- Fever\n- Chills");
        assert_eq!(sections["Causes"], "- Parasite spread by mosquitoes");
        assert_eq!(sections["Treatment"], "- Antimalarial drugs");
        assert!(!sections.contains_key("Diagnosis"));
        assert!(!sections.contains_key(SUMMARY_KEY));
    }

    #[test]
    fn test_headings_are_case_insensitive() {
        let sections = section_details("PREVENTION:\nUse bed nets");
        assert_eq!(sections["Prevention"], "Use bed nets");
    }

    #[test]
    fn test_section_stops_at_unknown_heading() {
        let sections = section_details("Causes: a virus\nOutlook: good");
        assert_eq!(sections["Causes"], "a virus");
        assert_eq!(sections.len(), 1);
    }

    #[test]
    fn test_summary_fallback() {
        let sections = section_details("  Malaria is a disease.  ");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[SUMMARY_KEY], "Malaria is a disease.");
    }
}
