//! Text preprocessors applied to file content before hashing and upload.
//!
//! The pipeline runs every registered preprocessor in order, feeding each
//! one's output to the next, so the transformed text is what gets hashed,
//! compared and uploaded. An empty pipeline passes raw bytes through
//! untouched, which keeps binary files safe.

use std::collections::BTreeMap;

use regex::Regex;

use tidemark_core::{path, Session, UpgradeLog};

use crate::error::PreprocessError;

/// Transforms text content before hashing and upload.
pub trait Preprocessor {
    fn process(
        &self,
        session: &dyn Session,
        log: &dyn UpgradeLog,
        content: &str,
    ) -> Result<String, PreprocessError>;
}

/// Runs `content` through each preprocessor in registration order.
pub fn preprocess(
    session: &dyn Session,
    log: &dyn UpgradeLog,
    preprocessors: &[Box<dyn Preprocessor>],
    content: Vec<u8>,
) -> Result<Vec<u8>, PreprocessError> {
    if preprocessors.is_empty() {
        return Ok(content);
    }
    let mut text = String::from_utf8_lossy(&content).into_owned();
    for preprocessor in preprocessors {
        text = preprocessor.process(session, log, &text)?;
    }
    Ok(text.into_bytes())
}

/// Replaces `~site/` and `~sitecollection/` tokens with the session's
/// resolved roots, slash-terminated. Matching is case-insensitive.
pub struct PathTokenPreprocessor {
    token: Regex,
}

impl PathTokenPreprocessor {
    pub fn new() -> Self {
        Self {
            token: Regex::new(r"(?i)~sitecollection/|~site/").unwrap(),
        }
    }
}

impl Default for PathTokenPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor for PathTokenPreprocessor {
    fn process(
        &self,
        session: &dyn Session,
        _log: &dyn UpgradeLog,
        content: &str,
    ) -> Result<String, PreprocessError> {
        let web = path::ensure_trailing_slash(session.web_path());
        let site = path::ensure_trailing_slash(session.site_path());
        let mut result = String::with_capacity(content.len());
        let mut last = 0;
        for found in self.token.find_iter(content) {
            let replacement = if found.as_str().eq_ignore_ascii_case(path::SITE_TOKEN) {
                &web
            } else {
                &site
            };
            result.push_str(&content[last..found.start()]);
            result.push_str(replacement);
            last = found.end();
        }
        result.push_str(&content[last..]);
        Ok(result)
    }
}

/// Replaces `$name$` references with supplied values.
///
/// A referenced name with no supplied value fails the file; an unresolved
/// reference never reaches the target.
pub struct VariablePreprocessor {
    variables: BTreeMap<String, String>,
    token: Regex,
}

impl VariablePreprocessor {
    pub fn new(variables: BTreeMap<String, String>) -> Self {
        Self {
            variables,
            token: Regex::new(r"\$(\w+)\$").unwrap(),
        }
    }
}

impl Preprocessor for VariablePreprocessor {
    fn process(
        &self,
        _session: &dyn Session,
        _log: &dyn UpgradeLog,
        content: &str,
    ) -> Result<String, PreprocessError> {
        let mut result = String::with_capacity(content.len());
        let mut last = 0;
        for found in self.token.find_iter(content) {
            let name = found.as_str().trim_matches('$');
            let value =
                self.variables
                    .get(name)
                    .ok_or_else(|| PreprocessError::MissingVariable {
                        name: name.to_string(),
                    })?;
            result.push_str(&content[last..found.start()]);
            result.push_str(value);
            last = found.end();
        }
        result.push_str(&content[last..]);
        Ok(result)
    }
}
