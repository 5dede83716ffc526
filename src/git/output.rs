use regex::Regex;
use std::sync::LazyLock;

/// Maximum diff lines returned to the caller
pub const MAX_DIFF_LINES: usize = 500;
/// Maximum blame lines returned to the caller
pub const MAX_BLAME_LINES: usize = 500;
/// Maximum log lines returned to the caller
pub const MAX_LOG_LINES: usize = 200;

pub const BINARY_SKIPPED_SUFFIX: &str = " [binary — skipped]";

const TRUNCATION_MARKER_PREFIX: &str = "… truncated (";

static BINARY_DIFF_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Binary files .+ differ$").expect("binary diff pattern is valid")
});

/// Keep the first `max_lines` lines of `output` and note how many were dropped.
///
/// `kind` names the output in the marker, e.g. `… truncated (50 more lines
/// of log)`. Applying it again with the same limit leaves the result as is.
pub fn truncate_lines(output: &str, max_lines: usize, kind: &str) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        return output.to_string();
    }
    if lines.len() == max_lines + 1 && is_truncation_marker(lines[max_lines]) {
        return output.to_string();
    }

    let dropped = lines.len() - max_lines;
    let mut kept = lines[..max_lines].join("\n");
    if !kept.is_empty() {
        kept.push('\n');
    }
    kept.push_str(&truncation_marker(dropped, kind));
    kept
}

fn truncation_marker(dropped: usize, kind: &str) -> String {
    format!("{}{} more lines of {})", TRUNCATION_MARKER_PREFIX, dropped, kind)
}

fn is_truncation_marker(line: &str) -> bool {
    line.starts_with(TRUNCATION_MARKER_PREFIX) && line.ends_with(')')
}

/// Flag `Binary files ... differ` lines instead of passing them through bare
pub fn mark_binary_files(output: &str) -> String {
    let mut marked = String::with_capacity(output.len());

    for line in output.split_inclusive('\n') {
        let (content, ending) = match line.strip_suffix('\n') {
            Some(content) => (content, "\n"),
            None => (line, ""),
        };
        marked.push_str(content);
        if BINARY_DIFF_LINE.is_match(content) && !content.ends_with(BINARY_SKIPPED_SUFFIX) {
            marked.push_str(BINARY_SKIPPED_SUFFIX);
        }
        marked.push_str(ending);
    }

    marked
}
