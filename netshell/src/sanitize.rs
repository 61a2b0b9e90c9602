//! Output sanitization.
//!
//! Raw capture from an interactive shell carries the command echo, the
//! trailing prompt, pager markers, ANSI sequences, and vendor context
//! decorations. The functions here peel those off so `CommandResult.output`
//! is just the command's own text. The default vendor hook composes
//! [`clean_output`]; vendors with extra decorations call the specific
//! helpers on top.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::channel::PROMPT_TERMINATORS;

static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

static PAGER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mi)^[ \t]*(?:-+\s?\(?more\s?\d*%?\)?\s?-+|--More--|Press ENTER to continue.*|Press any key to continue.*)[ \t]*\r?\n?").unwrap()
});

static CONTEXT_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:\{(?:master|backup):\d+\}(?:\[edit[^\]\n]*\])?|\[edit[^\]\n]*\])[ \t]*\n?",
    )
    .unwrap()
});

/// Normalize line endings to LF and collapse runs of blank lines.
pub fn normalize_newlines(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    BLANK_RUN_RE.replace_all(&unified, "\n\n").into_owned()
}

/// Remove ANSI CSI/OSC sequences and stray backspaces.
pub fn strip_ansi(raw: &str) -> String {
    let cleaned = strip_ansi_escapes::strip(raw.as_bytes());
    String::from_utf8_lossy(&cleaned).replace('\u{8}', "")
}

/// Remove the first occurrence of the command echo at the head of the output.
pub fn strip_command_echo(output: &str, command: &str) -> String {
    let command = command.trim();
    if command.is_empty() {
        return output.to_string();
    }

    let (first_line, rest) = match output.split_once('\n') {
        Some((f, r)) => (f, r),
        None => (output, ""),
    };

    if first_line.contains(command) {
        return rest.to_string();
    }

    // Echo without a newline yet (device echoed, output followed inline).
    if let Some(stripped) = output.trim_start().strip_prefix(command) {
        return stripped.to_string();
    }

    output.to_string()
}

/// Drop the trailing prompt line when it matches the learned base prompt.
pub fn strip_trailing_prompt(output: &str, base: &str, terminators: &str) -> String {
    if base.is_empty() {
        return output.to_string();
    }

    let trimmed = output.trim_end();
    let (head, last_line) = match trimmed.rsplit_once('\n') {
        Some((h, l)) => (h, l),
        None => ("", trimmed),
    };

    let line = last_line.trim();
    let terminated = line
        .chars()
        .last()
        .map(|c| terminators.contains(c))
        .unwrap_or(false);

    if line.contains(base) && terminated {
        head.to_string()
    } else {
        output.to_string()
    }
}

/// Remove pager continuation markers.
pub fn strip_pager_markers(output: &str) -> String {
    PAGER_RE.replace_all(output, "").into_owned()
}

/// Remove configuration context lines: `[edit ...]`, `{master:N}`,
/// `{backup:N}`, and their combined forms.
pub fn strip_context_lines(output: &str) -> String {
    let stripped = CONTEXT_LINE_RE.replace_all(output, "").into_owned();
    // Removing whole lines can leave blank runs behind.
    BLANK_RUN_RE.replace_all(&stripped, "\n\n").into_owned()
}

/// Remove inline tokens such as Arista's `(s1)`/`(s2)` config stages.
pub fn strip_tokens(output: &str, tokens: &[&str]) -> String {
    let mut cleaned = output.to_string();
    for token in tokens {
        cleaned = cleaned.replace(token, "");
    }
    cleaned
}

/// Remove mid-output occurrences of a bracketed prompt (`<HOST>`, `[HOST]`).
pub fn strip_bracketed_prompt(output: &str, base: &str) -> String {
    if base.is_empty() {
        return output.to_string();
    }
    output
        .replace(&format!("<{}>", base), "")
        .replace(&format!("[{}]", base), "")
}

/// The default sanitization pipeline: ANSI, line endings, echo, pager
/// markers, trailing prompt, surrounding whitespace.
pub fn clean_output(raw: &str, command: &str, base: &str, terminators: &str) -> String {
    let cleaned = strip_ansi(raw);
    let cleaned = normalize_newlines(&cleaned);
    let cleaned = strip_command_echo(&cleaned, command);
    let cleaned = strip_pager_markers(&cleaned);
    let cleaned = strip_trailing_prompt(&cleaned, base, terminators);
    cleaned.trim().to_string()
}

/// `clean_output` with the default terminator set.
pub fn clean_output_default(raw: &str, command: &str, base: &str) -> String {
    clean_output(raw, command, base, PROMPT_TERMINATORS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_newlines() {
        assert_eq!(normalize_newlines("a\r\nb\rc"), "a\nb\nc");
        assert_eq!(normalize_newlines("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_strip_command_echo_first_line() {
        let raw = "show version\nCisco IOS Software\nmore";
        assert_eq!(
            strip_command_echo(raw, "show version"),
            "Cisco IOS Software\nmore"
        );
    }

    #[test]
    fn test_strip_command_echo_absent() {
        let raw = "Cisco IOS Software";
        assert_eq!(strip_command_echo(raw, "show version"), raw);
    }

    #[test]
    fn test_strip_trailing_prompt() {
        let raw = "line one\nline two\nRouter# ";
        assert_eq!(
            strip_trailing_prompt(raw, "Router", PROMPT_TERMINATORS),
            "line one\nline two"
        );
    }

    #[test]
    fn test_trailing_prompt_kept_when_base_absent() {
        let raw = "line one\nSwitch# ";
        assert_eq!(
            strip_trailing_prompt(raw, "Router", PROMPT_TERMINATORS),
            raw
        );
    }

    #[test]
    fn test_strip_pager_markers() {
        let raw = "line one\n ---- More ----\nline two\n--More--\nline three";
        let cleaned = strip_pager_markers(raw);
        assert!(!cleaned.contains("More"));
        assert!(cleaned.contains("line two"));
        assert!(cleaned.contains("line three"));
    }

    #[test]
    fn test_strip_context_lines() {
        let raw = "[edit]\nset interfaces ge-0/0/0\n{master:0}\ncommit complete\n{master:0}[edit]\n";
        let cleaned = strip_context_lines(raw);
        assert!(!cleaned.contains("[edit"));
        assert!(!cleaned.contains("{master"));
        assert!(cleaned.contains("set interfaces ge-0/0/0"));
        assert!(cleaned.contains("commit complete"));
    }

    #[test]
    fn test_strip_tokens() {
        let raw = "host(s1)(config)# something";
        assert_eq!(strip_tokens(raw, &["(s1)", "(s2)"]), "host(config)# something");
    }

    #[test]
    fn test_strip_bracketed_prompt() {
        let raw = "Info: saving\n<HUAWEI>\ndone [HUAWEI]";
        let cleaned = strip_bracketed_prompt(raw, "HUAWEI");
        assert!(!cleaned.contains("<HUAWEI>"));
        assert!(!cleaned.contains("[HUAWEI]"));
    }

    #[test]
    fn test_clean_output_round_trip() {
        // sanitize(echo + body + prompt) == body for a Cisco-style prompt
        let raw = "show version\r\nCisco IOS Software, Version 15.2\r\nuptime is 1 day\r\nRouter#";
        assert_eq!(
            clean_output_default(raw, "show version", "Router"),
            "Cisco IOS Software, Version 15.2\nuptime is 1 day"
        );
    }

    #[test]
    fn test_clean_output_strips_ansi() {
        let raw = "ls\n\x1b[0m\x1b[01;34mdir\x1b[0m file\nhost$ ";
        assert_eq!(clean_output_default(raw, "ls", "host"), "dir file");
    }
}
