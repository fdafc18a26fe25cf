//! # Built-in Rule Extractor
//!
//! Deterministic regex extraction producing `FileBatch`es for the merge
//! engine. This is intentionally a shallow rule system, not NLP: every
//! match is a pure function of the source text, so extraction output is
//! identical across runs and machines.
//!
//! Rules:
//! - `capitalized-noun`: runs of capitalized tokens become entities
//! - `lexicon`: known technology names (case-insensitive)
//! - `founded-by` / `works-at` / `uses`: relation patterns
//!
//! All rule matches carry confidence 100. Spans are byte offsets into
//! the source text.

use crate::config::ExtractorConfig;
use crate::discover::SourceFile;
use regex::Regex;
use signalgraph_core::{
    Confidence, EndpointRef, EntityCandidate, EntityKind, FileBatch, RelationCandidate,
    SignalGraphError, Span,
};
use std::collections::BTreeSet;

/// A capitalized token run: "OpenAI", "Sam Altman", "Acme Labs".
const CAPITALIZED_RUN: &str = r"[A-Z][A-Za-z0-9]*(?: [A-Z][A-Za-z0-9]*)*";

/// One relation rule: a regex with source and target capture groups.
struct RelationPattern {
    label: &'static str,
    rule: &'static str,
    regex: Regex,
}

/// The configured extractor.
pub struct Extractor {
    /// Lowercased technology vocabulary.
    technologies: BTreeSet<String>,
    org_suffixes: BTreeSet<String>,
    entity_pattern: Regex,
    lexicon_pattern: Option<Regex>,
    relation_patterns: Vec<RelationPattern>,
}

impl Extractor {
    /// Build an extractor from configuration.
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, SignalGraphError> {
        let technologies: BTreeSet<String> = config
            .technologies
            .iter()
            .map(|t| t.to_lowercase())
            .collect();

        let lexicon_pattern = if technologies.is_empty() {
            None
        } else {
            let alternation = technologies
                .iter()
                .map(|t| regex::escape(t))
                .collect::<Vec<_>>()
                .join("|");
            Some(compile(&format!(r"(?i)\b(?:{alternation})\b"))?)
        };

        let relation_patterns = vec![
            RelationPattern {
                label: "FOUNDED_BY",
                rule: "founded-by",
                regex: compile(&format!(
                    r"({CAPITALIZED_RUN})(?:,? which)? (?:was |were )?founded by ({CAPITALIZED_RUN})"
                ))?,
            },
            RelationPattern {
                label: "WORKS_AT",
                rule: "works-at",
                regex: compile(&format!(
                    r"({CAPITALIZED_RUN}) works at ({CAPITALIZED_RUN})"
                ))?,
            },
            RelationPattern {
                label: "USES",
                rule: "uses",
                regex: compile(&format!(
                    r"({CAPITALIZED_RUN}) uses ([A-Za-z][A-Za-z0-9+#]*)"
                ))?,
            },
        ];

        Ok(Self {
            technologies,
            org_suffixes: config.org_suffixes.iter().cloned().collect(),
            entity_pattern: compile(CAPITALIZED_RUN)?,
            lexicon_pattern,
            relation_patterns,
        })
    }

    /// Extract all candidates from one source file.
    #[must_use]
    pub fn extract(&self, source: &SourceFile) -> FileBatch {
        let text = source.text.as_str();
        let mut entities = Vec::new();
        let mut relations = Vec::new();

        for found in self.entity_pattern.find_iter(text) {
            entities.push(EntityCandidate {
                text: found.as_str().to_string(),
                kind: self.classify(found.as_str()),
                span: Span::new(found.start() as u64, found.end() as u64),
                rule: "capitalized-noun".to_string(),
                confidence: Confidence::CERTAIN,
            });
        }

        if let Some(lexicon) = &self.lexicon_pattern {
            for found in lexicon.find_iter(text) {
                entities.push(EntityCandidate {
                    text: found.as_str().to_string(),
                    kind: EntityKind::Technology,
                    span: Span::new(found.start() as u64, found.end() as u64),
                    rule: "lexicon".to_string(),
                    confidence: Confidence::CERTAIN,
                });
            }
        }

        for pattern in &self.relation_patterns {
            for caps in pattern.regex.captures_iter(text) {
                let (Some(whole), Some(source_match), Some(target_match)) =
                    (caps.get(0), caps.get(1), caps.get(2))
                else {
                    continue;
                };
                relations.push(RelationCandidate {
                    source: EndpointRef {
                        text: source_match.as_str().to_string(),
                        kind: self.classify(source_match.as_str()),
                    },
                    target: EndpointRef {
                        text: target_match.as_str().to_string(),
                        kind: self.classify(target_match.as_str()),
                    },
                    label: pattern.label.to_string(),
                    span: Span::new(whole.start() as u64, whole.end() as u64),
                    rule: pattern.rule.to_string(),
                    confidence: Confidence::CERTAIN,
                    directed: true,
                });
            }
        }

        FileBatch {
            file: source.path.clone(),
            checksum: source.checksum.clone(),
            entities,
            relations,
        }
    }

    /// Kind heuristic, shared by the entity pass and relation endpoints
    /// so both resolve a surface form to the same node.
    fn classify(&self, text: &str) -> EntityKind {
        if self.technologies.contains(&text.to_lowercase()) {
            return EntityKind::Technology;
        }
        let words: Vec<&str> = text.split_whitespace().collect();
        if words
            .last()
            .is_some_and(|last| self.org_suffixes.contains(*last))
        {
            return EntityKind::Org;
        }
        if words.len() >= 2 {
            return EntityKind::Person;
        }
        EntityKind::Other
    }
}

fn compile(pattern: &str) -> Result<Regex, SignalGraphError> {
    Regex::new(pattern)
        .map_err(|e| SignalGraphError::Io(format!("invalid extraction pattern: {}", e)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractorConfig;

    fn source(text: &str) -> SourceFile {
        SourceFile {
            path: "docs/a.txt".to_string(),
            checksum: "sum-a".to_string(),
            text: text.to_string(),
        }
    }

    fn extractor() -> Extractor {
        Extractor::from_config(&ExtractorConfig::default()).expect("build extractor")
    }

    #[test]
    fn capitalized_runs_become_entities_with_byte_spans() {
        let batch = extractor().extract(&source("Ada Lovelace visited Acme Labs."));

        let texts: Vec<&str> = batch.entities.iter().map(|e| e.text.as_str()).collect();
        assert!(texts.contains(&"Ada Lovelace"));
        assert!(texts.contains(&"Acme Labs"));

        let ada = batch
            .entities
            .iter()
            .find(|e| e.text == "Ada Lovelace")
            .expect("ada");
        assert_eq!(ada.span, Span::new(0, 12));
        assert_eq!(ada.kind, EntityKind::Person);
        assert_eq!(ada.rule, "capitalized-noun");

        let acme = batch
            .entities
            .iter()
            .find(|e| e.text == "Acme Labs")
            .expect("acme");
        assert_eq!(acme.kind, EntityKind::Org);
    }

    #[test]
    fn lexicon_matches_lowercase_technologies() {
        let batch = extractor().extract(&source("We deploy rust services on kubernetes."));

        let lexicon: Vec<&EntityCandidate> = batch
            .entities
            .iter()
            .filter(|e| e.rule == "lexicon")
            .collect();
        assert_eq!(lexicon.len(), 2);
        assert!(lexicon.iter().all(|e| e.kind == EntityKind::Technology));
    }

    #[test]
    fn founded_by_pattern_extracts_relation() {
        let batch = extractor().extract(&source("Acme Labs was founded by Ada Lovelace."));

        assert_eq!(batch.relations.len(), 1);
        let relation = &batch.relations[0];
        assert_eq!(relation.label, "FOUNDED_BY");
        assert_eq!(relation.source.text, "Acme Labs");
        assert_eq!(relation.source.kind, EntityKind::Org);
        assert_eq!(relation.target.text, "Ada Lovelace");
        assert_eq!(relation.target.kind, EntityKind::Person);
        assert!(relation.directed);
    }

    #[test]
    fn uses_pattern_resolves_technology_target() {
        let batch = extractor().extract(&source("Acme Labs uses rust in production."));

        let uses = batch
            .relations
            .iter()
            .find(|r| r.label == "USES")
            .expect("uses relation");
        assert_eq!(uses.target.text, "rust");
        assert_eq!(uses.target.kind, EntityKind::Technology);
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "Grace Hopper works at Acme Labs. Acme Labs uses python.";
        let a = extractor().extract(&source(text));
        let b = extractor().extract(&source(text));
        assert_eq!(a, b);
    }
}
