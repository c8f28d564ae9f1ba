// src/services/matcher.rs

//! Keyword matching engine.
//!
//! Every configured keyword is compiled once into a case-insensitive,
//! multi-line pattern that captures the whole line the keyword appears on.
//! Keywords are always literal text: regex metacharacters are escaped.

use std::collections::{BTreeMap, HashMap};

use regex::{Regex, RegexBuilder};

use crate::error::{AppError, Result};
use crate::models::KeywordConfig;

/// A keyword's compiled line matcher plus its exception substrings.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub keyword: String,
    regex: Regex,
    pub exceptions: Vec<String>,
}

impl CompiledPattern {
    /// Compile a single keyword.
    pub fn compile(config: &KeywordConfig) -> Result<Self> {
        let pattern = format!(r"^(.*\b{}.*)$", regex::escape(&config.keyword));
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .map_err(|e| AppError::pattern(&config.keyword, e))?;

        Ok(Self {
            keyword: config.keyword.clone(),
            regex,
            exceptions: config.exceptions.clone(),
        })
    }

    /// First line of `body` containing the keyword, trimmed.
    pub fn find_line<'a>(&self, body: &'a str) -> Option<&'a str> {
        self.regex
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
    }

    /// Returns the exception contained in `line`, if any.
    pub fn exception_in(&self, line: &str) -> Option<&str> {
        self.exceptions
            .iter()
            .find(|x| line.contains(x.as_str()))
            .map(String::as_str)
    }
}

/// Immutable set of compiled keyword patterns.
#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    patterns: HashMap<String, CompiledPattern>,
}

impl KeywordMatcher {
    /// Compile all configured keywords.
    ///
    /// A keyword listed twice keeps the last definition.
    pub fn compile(keywords: &[KeywordConfig]) -> Result<Self> {
        let mut patterns = HashMap::with_capacity(keywords.len());
        for config in keywords {
            let compiled = CompiledPattern::compile(config)?;
            patterns.insert(compiled.keyword.clone(), compiled);
        }
        Ok(Self { patterns })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Evaluate `body` against every keyword.
    ///
    /// Returns whether anything matched and the keyword to line mapping.
    pub fn evaluate(&self, body: &str) -> (bool, BTreeMap<String, String>) {
        let mut hits = BTreeMap::new();

        for (keyword, pattern) in &self.patterns {
            let Some(line) = pattern.find_line(body) else {
                continue;
            };

            if let Some(exception) = pattern.exception_in(line) {
                log::debug!("Line {line:?} contains exception {exception:?}");
                continue;
            }

            hits.insert(keyword.clone(), line.to_string());
        }

        (!hits.is_empty(), hits)
    }
}
