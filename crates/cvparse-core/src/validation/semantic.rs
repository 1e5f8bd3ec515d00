//! Parsing of the model's semantic verdict.

/// A parsed `True`/`False` verdict with whatever followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub diagnostic: String,
}

/// Parse a verdict reply. The first word decides; `None` when it is neither
/// `true` nor `false`.
pub fn parse_verdict(reply: &str) -> Option<Verdict> {
    let reply = reply.trim();
    let (head, rest) = match reply.find(char::is_whitespace) {
        Some(idx) => reply.split_at(idx),
        None => (reply, ""),
    };

    let word = head
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_ascii_lowercase();
    let passed = match word.as_str() {
        "true" => true,
        "false" => false,
        _ => return None,
    };

    let diagnostic = rest
        .trim()
        .trim_start_matches(|c: char| matches!(c, ':' | '-' | '.' | ','))
        .trim()
        .to_string();

    Some(Verdict { passed, diagnostic })
}
