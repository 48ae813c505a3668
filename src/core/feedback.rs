use crate::domain::model::ReviewFinding;
use regex::Regex;

/// Parse the model's ISSUE/LINE/SUGGESTION feedback blocks.
///
/// Blocks are separated by `---` or blank lines. A block survives only if
/// it carries an issue body and a LINE directive; line numbers outside the
/// changed set are clamped to the first changed line.
pub fn parse_feedback(text: &str, valid_lines: &[u64]) -> Vec<ReviewFinding> {
    let number_re = Regex::new(r"\d+").expect("line number regex");

    let mut findings = Vec::new();
    let mut issue: Option<String> = None;
    let mut line: Option<u64> = None;
    let mut suggestion: Option<String> = None;

    let mut flush = |issue: &mut Option<String>,
                     line: &mut Option<u64>,
                     suggestion: &mut Option<String>| {
        if let (Some(body), Some(num)) = (issue.take(), line.take()) {
            if !body.is_empty() {
                findings.push(ReviewFinding {
                    issue: body,
                    line: num,
                    suggestion: suggestion.take(),
                });
            }
        }
        *issue = None;
        *line = None;
        *suggestion = None;
    };

    for raw in text.split('\n') {
        let trimmed = raw.trim();

        if trimmed.is_empty() || trimmed == "---" {
            flush(&mut issue, &mut line, &mut suggestion);
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("ISSUE:") {
            issue = Some(rest.trim().to_string());
        } else if let Some(rest) = trimmed.strip_prefix("LINE:") {
            let claimed = number_re
                .find(rest)
                .and_then(|m| m.as_str().parse::<u64>().ok());
            line = match claimed {
                Some(num) if valid_lines.contains(&num) => Some(num),
                _ => valid_lines.first().copied(),
            };
        } else if let Some(rest) = trimmed.strip_prefix("SUGGESTION:") {
            suggestion = Some(rest.trim().to_string());
        }
    }

    flush(&mut issue, &mut line, &mut suggestion);
    findings
}

/// Render the posted comment body for one finding.
///
/// Lines the model prefixed with `+` are grouped under a positive heading
/// and `-` lines under an issues heading, followed by the full feedback.
pub fn render_comment(finding: &ReviewFinding) -> String {
    let mut body = finding.issue.clone();
    if let Some(suggestion) = &finding.suggestion {
        body.push_str("\n\nSuggestion: ");
        body.push_str(suggestion);
    }

    let mut sections: Vec<String> = Vec::new();

    let positives: Vec<String> = body
        .lines()
        .filter(|l| l.starts_with('+'))
        .map(|l| format!("`{}`", l))
        .collect();
    if !positives.is_empty() {
        sections.push("🟢 **Positive Suggestions:**".to_string());
        sections.push(positives.join("\n"));
    }

    let negatives: Vec<String> = body
        .lines()
        .filter(|l| l.starts_with('-'))
        .map(|l| format!("`{}`", l))
        .collect();
    if !negatives.is_empty() {
        sections.push("🔴 **Potential Issues:**".to_string());
        sections.push(negatives.join("\n"));
    }

    sections.push(format!("\n{}", body));
    sections.join("\n")
}
