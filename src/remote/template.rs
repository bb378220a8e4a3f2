//! Helm template wrappers around YAML documents
//!
//! ArgoCD application templates are often a plain YAML document guarded by
//! a `{{ if ... }}` / `{{ end }}` pair, which a YAML parser rejects. The
//! wrapper is cut off before editing and put back unchanged afterwards.

use std::sync::LazyLock;

use regex::Regex;

static WRAPPED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(\{\{.*?\}\})\n(.+?)\n(\{\{.*?\}\})").expect("wrapper pattern is valid")
});

/// A YAML body with the template text around it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateWrapper {
    /// Text before the opening marker (usually empty)
    leading: String,
    /// Opening marker, e.g. `{{ if .Values.loki.enabled }}`
    begin: String,
    /// Closing marker, e.g. `{{ end }}`
    end: String,
    /// Text after the closing marker (usually a trailing newline)
    trailing: String,
}

impl TemplateWrapper {
    /// Split `content` into its wrapper and the YAML body between the markers.
    ///
    /// Returns `None` when no `{{ ... }}` / body / `{{ ... }}` block is found.
    pub fn strip(content: &str) -> Option<(Self, &str)> {
        let captures = WRAPPED_BLOCK.captures(content)?;
        let whole = captures.get(0)?;
        let begin = captures.get(1)?;
        let body = captures.get(2)?;
        let end = captures.get(3)?;

        let wrapper = Self {
            leading: content[..whole.start()].to_string(),
            begin: begin.as_str().to_string(),
            end: end.as_str().to_string(),
            trailing: content[whole.end()..].to_string(),
        };

        Some((wrapper, body.as_str()))
    }

    /// Put `body` back between the original markers, each on its own line.
    pub fn rewrap(&self, body: &str) -> String {
        format!(
            "{}{}\n{}\n{}{}",
            self.leading, self.begin, body, self.end, self.trailing
        )
    }

    pub fn begin(&self) -> &str {
        &self.begin
    }

    pub fn end(&self) -> &str {
        &self.end
    }
}
