use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Characters that carry meaning to a shell or to git revision syntax.
///
/// Tokens are never handed to a shell, but values that end up inside a single
/// flag argument (`--author=...`, `--label a,b`) or that name refs must still
/// be free of them.
pub const SHELL_METACHARACTERS: &[char] = &[
    ';', '&', '|', '`', '$', '(', ')', '{', '}', '!', '#', '~', '<', '>', '*', '?', '[', ']',
    '\n', '\r', '\\', '\'', '"',
];

const DASH_PREFIX_REASON: &str = "must not start with '-' (would be parsed as a flag)";

/// A token rejected by one of the validators.
///
/// `reason` is written for the operator and is surfaced verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result of validating a single token
pub type ValidationOutcome = Result<(), ValidationError>;

fn reject(field: &str, reason: impl Into<String>) -> ValidationOutcome {
    Err(ValidationError::new(field, reason))
}

/// Checks shared by every validator: non-empty, no leading dash.
fn check_common(field: &str, value: &str) -> ValidationOutcome {
    if value.is_empty() {
        return reject(field, "must not be empty");
    }
    if value.starts_with('-') {
        return reject(field, DASH_PREFIX_REASON);
    }
    Ok(())
}

fn check_metacharacters(field: &str, value: &str) -> ValidationOutcome {
    if let Some(c) = value.chars().find(|c| SHELL_METACHARACTERS.contains(c)) {
        return reject(
            field,
            format!("contains forbidden character {:?}", c),
        );
    }
    Ok(())
}

/// Validate a branch name.
///
/// Accepts conventional hierarchical names (`feature/x-1`) and rejects
/// revision-range syntax, lock files and anything outside
/// `[A-Za-z0-9._/-]`.
pub fn validate_branch_name(name: &str) -> ValidationOutcome {
    const FIELD: &str = "branch name";

    check_common(FIELD, name)?;

    if name.starts_with('.') || name.ends_with('.') {
        return reject(FIELD, "must not start or end with '.'");
    }
    if name.ends_with(".lock") {
        return reject(FIELD, "must not end with '.lock'");
    }
    for pattern in ["..", "@{", "~", "^"] {
        if name.contains(pattern) {
            return reject(FIELD, format!("must not contain '{}'", pattern));
        }
    }
    if name.chars().any(char::is_whitespace) {
        return reject(FIELD, "must not contain whitespace");
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/' | '-')))
    {
        return reject(
            FIELD,
            format!(
                "contains {:?}; only ASCII letters, digits, '.', '_', '/' and '-' are allowed",
                c
            ),
        );
    }

    Ok(())
}

/// Validate a commit-ish: commit refs, diff endpoints, pull targets, PR bases.
pub fn validate_ref(reference: &str) -> ValidationOutcome {
    const FIELD: &str = "ref";

    check_common(FIELD, reference)?;
    check_metacharacters(FIELD, reference)
}

/// Validate a path inside the repository.
///
/// Paths are always passed after a `--` separator, so anything except a
/// leading dash is tolerated, including spaces and shell metacharacters.
pub fn validate_file_path(path: &str) -> ValidationOutcome {
    const FIELD: &str = "file path";

    check_common(FIELD, path)?;

    if path.contains('\0') {
        return reject(FIELD, "must not contain NUL bytes");
    }

    Ok(())
}

/// Validate a remote name.
pub fn validate_remote_name(remote: &str) -> ValidationOutcome {
    const FIELD: &str = "remote name";

    check_common(FIELD, remote)?;
    check_metacharacters(FIELD, remote)?;

    if remote.contains("..") {
        return reject(FIELD, "must not contain '..'");
    }
    if let Some(c) = remote
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return reject(
            FIELD,
            format!(
                "contains {:?}; only ASCII letters, digits, '.', '_' and '-' are allowed",
                c
            ),
        );
    }

    Ok(())
}

/// Validate a free-text log filter such as `author`, `since` or `grep`.
///
/// The value is interpolated into a single `--field=value` argument.
pub fn validate_log_filter(value: &str, field_name: &str) -> ValidationOutcome {
    let field = format!("log filter '{}'", field_name);

    check_common(&field, value)?;
    check_metacharacters(&field, value)
}

/// Validate a pull request label.
///
/// Labels are joined with commas into one flag value, so a comma would smuggle
/// in an extra label.
pub fn validate_label(label: &str) -> ValidationOutcome {
    const FIELD: &str = "label";

    check_common(FIELD, label)?;
    check_metacharacters(FIELD, label)?;

    if label.contains(',') {
        return reject(FIELD, "must not contain ','");
    }

    Ok(())
}

macro_rules! validated_token {
    ($(#[$meta:meta])* $name:ident, $check:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
        #[serde(try_from = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate `value` and wrap it
            pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                let check: fn(&str) -> ValidationOutcome = $check;
                check(&value)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

validated_token!(
    /// A branch name that passed [`validate_branch_name`]
    BranchName,
    validate_branch_name
);
validated_token!(
    /// A commit-ish that passed [`validate_ref`]
    GitRef,
    validate_ref
);
validated_token!(
    /// A repository path that passed [`validate_file_path`]
    RepoPath,
    validate_file_path
);
validated_token!(
    /// A remote name that passed [`validate_remote_name`]
    RemoteName,
    validate_remote_name
);
validated_token!(
    /// A pull request label that passed [`validate_label`]
    Label,
    validate_label
);

impl From<BranchName> for GitRef {
    // Every valid branch name is a valid ref: the branch character class is a
    // subset of what refs allow.
    fn from(branch: BranchName) -> Self {
        GitRef(branch.0)
    }
}

/// A free-text log filter that passed [`validate_log_filter`].
///
/// Unlike the other tokens the field name is part of the check, so this one
/// is built with [`LogFilter::parse`] by the request that owns the field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogFilter(String);

impl LogFilter {
    pub fn parse(value: impl Into<String>, field_name: &str) -> Result<Self, ValidationError> {
        let value = value.into();
        validate_log_filter(&value, field_name)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_name_accepts_conventional_names() {
        for name in ["main", "feature/x-1", "release-v1.0", "user_name/fix.bug", "a"] {
            assert!(validate_branch_name(name).is_ok(), "should accept {}", name);
        }
    }

    #[test]
    fn test_branch_name_rejects_dash_prefix() {
        let err = validate_branch_name("-rf").unwrap_err();
        assert_eq!(err.field, "branch name");
        assert!(err.reason.contains("must not start with '-'"));
    }

    #[test]
    fn test_branch_name_rejects_empty() {
        assert!(validate_branch_name("").is_err());
    }

    #[test]
    fn test_branch_name_rejects_revision_syntax() {
        for name in ["main..evil", "main@{1}", "main~1", "main^", "HEAD^2"] {
            assert!(validate_branch_name(name).is_err(), "should reject {}", name);
        }
    }

    #[test]
    fn test_branch_name_rejects_dots_and_lock() {
        assert!(validate_branch_name(".hidden").is_err());
        assert!(validate_branch_name("trailing.").is_err());
        let err = validate_branch_name("refs/heads/main.lock").unwrap_err();
        assert!(err.reason.contains(".lock"));
    }

    #[test]
    fn test_branch_name_rejects_whitespace() {
        for name in ["has space", "tab\there", "new\nline"] {
            let err = validate_branch_name(name).unwrap_err();
            assert!(err.reason.contains("whitespace"), "{}: {}", name, err);
        }
    }

    #[test]
    fn test_branch_name_rejects_outside_character_class() {
        for name in ["feat;rm", "x$y", "caf\u{e9}", "a:b", "a*b", "a\\b"] {
            assert!(validate_branch_name(name).is_err(), "should reject {:?}", name);
        }
    }

    #[test]
    fn test_ref_accepts_common_refs() {
        for r in ["HEAD", "HEAD^", "abc1234", "origin/main", "v1.2.3", "main"] {
            assert!(validate_ref(r).is_ok(), "should accept {}", r);
        }
    }

    #[test]
    fn test_ref_rejects_every_metacharacter() {
        for c in SHELL_METACHARACTERS {
            let candidate = format!("main{}x", c);
            assert!(validate_ref(&candidate).is_err(), "should reject {:?}", candidate);
        }
    }

    #[test]
    fn test_ref_rejects_dash_prefix() {
        assert!(validate_ref("--output=/etc/passwd").is_err());
    }

    #[test]
    fn test_file_path_is_permissive() {
        for p in ["src/main.rs", "docs/my file.md", "weird;name.txt", "a$b", "dir/-file"] {
            assert!(validate_file_path(p).is_ok(), "should accept {}", p);
        }
    }

    #[test]
    fn test_file_path_rejects_dash_empty_and_nul() {
        assert!(validate_file_path("-rf").is_err());
        assert!(validate_file_path("").is_err());
        assert!(validate_file_path("a\0b").is_err());
    }

    #[test]
    fn test_remote_name() {
        assert!(validate_remote_name("origin").is_ok());
        assert!(validate_remote_name("upstream-2").is_ok());
        assert!(validate_remote_name("my.fork").is_ok());

        assert!(validate_remote_name("-origin").is_err());
        assert!(validate_remote_name("origin;ls").is_err());
        assert!(validate_remote_name("a/b").is_err());
        assert!(validate_remote_name("a..b").is_err());
        assert!(validate_remote_name("").is_err());
    }

    #[test]
    fn test_log_filter() {
        assert!(validate_log_filter("Jane Doe", "author").is_ok());
        assert!(validate_log_filter("2 weeks ago", "since").is_ok());
        assert!(validate_log_filter("fix: parser", "grep").is_ok());

        let err = validate_log_filter("--exec=sh", "grep").unwrap_err();
        assert!(err.field.contains("grep"));
        assert!(validate_log_filter("$(whoami)", "author").is_err());
        assert!(validate_log_filter("a`b`", "author").is_err());
    }

    #[test]
    fn test_label() {
        assert!(validate_label("bug").is_ok());
        assert!(validate_label("good first issue").is_ok());

        assert!(validate_label("bug,wontfix").is_err());
        assert!(validate_label("-x").is_err());
        assert!(validate_label("a|b").is_err());
    }

    #[test]
    fn test_remote_label_and_log_filter_reject_every_metacharacter() {
        for c in SHELL_METACHARACTERS {
            let candidate = format!("ok{}x", c);
            assert!(validate_remote_name(&candidate).is_err(), "remote {:?}", candidate);
            assert!(validate_label(&candidate).is_err(), "label {:?}", candidate);
            for field in ["author", "since", "grep"] {
                let err = validate_log_filter(&candidate, field).unwrap_err();
                assert!(err.field.contains(field), "{} {:?}", field, candidate);
            }
        }
    }

    #[test]
    fn test_every_token_validator_rejects_dash_prefix() {
        let validators: [(&str, fn(&str) -> ValidationOutcome); 5] = [
            ("branch", validate_branch_name),
            ("ref", validate_ref),
            ("remote", validate_remote_name),
            ("label", validate_label),
            ("log filter", |v| validate_log_filter(v, "author")),
        ];

        for value in ["-x", "--force", "-", "--output=/tmp/x"] {
            for (name, validate) in &validators {
                let err = validate(value).unwrap_err();
                assert_eq!(err.reason, DASH_PREFIX_REASON, "{} {:?}", name, value);
            }
            let err = validate_file_path(value).unwrap_err();
            assert_eq!(err.reason, DASH_PREFIX_REASON, "file path {:?}", value);
        }
    }

    #[test]
    fn test_file_path_rejects_only_dash_prefix_among_metacharacters() {
        for c in SHELL_METACHARACTERS {
            let candidate = format!("dir/a{}b.txt", c);
            assert!(validate_file_path(&candidate).is_ok(), "should accept {:?}", candidate);
        }
        assert!(validate_file_path("-a;b.txt").is_err());
    }

    #[test]
    fn test_newtype_parse_and_display() {
        let branch = BranchName::parse("feature/x").unwrap();
        assert_eq!(branch.as_str(), "feature/x");
        assert_eq!(branch.to_string(), "feature/x");

        assert!(BranchName::parse("-x").is_err());
        assert!(RemoteName::parse("origin").is_ok());
        assert!(Label::parse("a,b").is_err());
    }

    #[test]
    fn test_newtype_deserialize_validates() {
        let ok: Result<BranchName, _> = serde_json::from_str("\"feature/x\"");
        assert!(ok.is_ok());

        let err = serde_json::from_str::<BranchName>("\"-rf\"").unwrap_err();
        assert!(err.to_string().contains("must not start with '-'"));
    }

    #[test]
    fn test_branch_name_converts_to_ref() {
        let branch = BranchName::parse("feature/x-1").unwrap();
        let reference: GitRef = branch.into();
        assert!(validate_ref(reference.as_str()).is_ok());
    }
}
