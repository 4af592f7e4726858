use crate::error::EdgeConnectionError;
use crate::ir::ElementKind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

static TERM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(node|edge|\*)?((?:\.[A-Za-z0-9_-]+)*)$").unwrap());

/// Class selector of the form `edge`, `node.hub`, `.dashed` or `*`, with
/// comma-separated alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    terms: Vec<SelectorTerm>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectorTerm {
    kind: Option<ElementKind>,
    classes: Vec<String>,
}

impl SelectorTerm {
    fn matches(&self, kind: ElementKind, classes: &[String]) -> bool {
        if self.kind.is_some_and(|want| want != kind) {
            return false;
        }
        self.classes
            .iter()
            .all(|want| classes.iter().any(|class| class == want))
    }
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, EdgeConnectionError> {
        let invalid = |reason: &str| EdgeConnectionError::InvalidSelector {
            selector: input.to_string(),
            reason: reason.to_string(),
        };
        let mut terms = Vec::new();
        for raw in input.split(',') {
            let raw = raw.trim();
            if raw.is_empty() {
                return Err(invalid("empty selector term"));
            }
            let caps = TERM_RE
                .captures(raw)
                .ok_or_else(|| invalid("expected `node`, `edge`, `*` and/or `.class` parts"))?;
            let kind = match caps.get(1).map(|m| m.as_str()) {
                Some("node") => Some(ElementKind::Node),
                Some("edge") => Some(ElementKind::Edge),
                _ => None,
            };
            let classes = caps
                .get(2)
                .map(|m| m.as_str())
                .unwrap_or("")
                .split('.')
                .filter(|class| !class.is_empty())
                .map(str::to_string)
                .collect();
            terms.push(SelectorTerm { kind, classes });
        }
        Ok(Self {
            source: input.trim().to_string(),
            terms,
        })
    }

    pub fn nodes() -> Self {
        Self::of_kind("node", ElementKind::Node)
    }

    pub fn edges() -> Self {
        Self::of_kind("edge", ElementKind::Edge)
    }

    fn of_kind(source: &str, kind: ElementKind) -> Self {
        Self {
            source: source.to_string(),
            terms: vec![SelectorTerm {
                kind: Some(kind),
                classes: Vec::new(),
            }],
        }
    }

    pub fn matches(&self, kind: ElementKind, classes: &[String]) -> bool {
        self.terms.iter().any(|term| term.matches(kind, classes))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::edges()
    }
}

impl FromStr for Selector {
    type Err = EdgeConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
