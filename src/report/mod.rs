use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::notes::{NoteWriter, Notes};
use crate::types::*;

/// Success note written when a run produces no findings.
pub const NO_FINDINGS_NOTE: &str = "No known PruningCronjobError cause detected";

/// Findings grouped by recommended action. Buckets render in action order,
/// findings in insertion order. Nothing is deduplicated or removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecommendationTable {
    buckets: BTreeMap<RecommendedAction, Vec<Finding>>,
}

impl RecommendationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<O, N>(&mut self, action: RecommendedAction, object: O, notes: N)
    where
        O: Into<String>,
        N: Into<String>,
    {
        self.add_finding(Finding::new(object, action, notes));
    }

    pub fn add_finding(&mut self, finding: Finding) {
        self.buckets.entry(finding.action).or_default().push(finding);
    }

    pub fn render(&self) -> Vec<(RecommendedAction, &[Finding])> {
        self.buckets
            .iter()
            .filter(|(_, findings)| !findings.is_empty())
            .map(|(action, findings)| (*action, findings.as_slice()))
            .collect()
    }

    /// One text block per non-empty action: the header, then one line per finding.
    pub fn summarize(&self) -> Vec<String> {
        self.render()
            .into_iter()
            .map(|(action, findings)| {
                let mut section = format!("{}:", action.header());
                for finding in findings {
                    section.push_str(&format!("\n- {}", finding));
                }
                section
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Extend<Finding> for RecommendationTable {
    fn extend<T: IntoIterator<Item = Finding>>(&mut self, iter: T) {
        for finding in iter {
            self.add_finding(finding);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationSection {
    pub action: RecommendedAction,
    pub header: String,
    pub findings: Vec<Finding>,
}

/// Final output of a completed investigation run.
#[derive(Debug, Clone, Serialize)]
pub struct InvestigationResult {
    pub investigation: String,
    pub cluster_id: String,
    pub classification: ErrorClassification,
    pub warnings: Vec<String>,
    pub recommendations: Vec<RecommendationSection>,
    pub notes: String,
    pub generated_at: DateTime<Utc>,
}

impl InvestigationResult {
    pub fn finding_count(&self) -> usize {
        self.recommendations.iter().map(|s| s.findings.len()).sum()
    }

    pub fn has_findings(&self) -> bool {
        self.finding_count() > 0
    }

    pub fn section(&self, action: RecommendedAction) -> Option<&RecommendationSection> {
        self.recommendations.iter().find(|s| s.action == action)
    }
}

pub struct ReportBuilder {
    investigation: String,
    cluster_id: String,
    classification: ErrorClassification,
    warnings: Vec<String>,
    recommendations: RecommendationTable,
}

impl ReportBuilder {
    pub fn new<I, C>(investigation: I, cluster_id: C, classification: ErrorClassification) -> Self
    where
        I: Into<String>,
        C: Into<String>,
    {
        Self {
            investigation: investigation.into(),
            cluster_id: cluster_id.into(),
            classification,
            warnings: Vec::new(),
            recommendations: RecommendationTable::new(),
        }
    }

    pub fn warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn recommendations(mut self, table: RecommendationTable) -> Self {
        self.recommendations = table;
        self
    }

    /// Render notes (warnings first, then one section per action) and freeze the result.
    pub fn build(self) -> InvestigationResult {
        let mut notes = Notes::new(self.investigation.clone());
        for warning in &self.warnings {
            notes.append_warning(warning);
        }
        for section in self.recommendations.summarize() {
            notes.append_info(&section);
        }
        if self.recommendations.is_empty() {
            notes.append_success(NO_FINDINGS_NOTE);
        }

        let recommendations = self
            .recommendations
            .render()
            .into_iter()
            .map(|(action, findings)| RecommendationSection {
                action,
                header: action.header().to_string(),
                findings: findings.to_vec(),
            })
            .collect();

        InvestigationResult {
            investigation: self.investigation,
            cluster_id: self.cluster_id,
            classification: self.classification,
            warnings: self.warnings,
            recommendations,
            notes: notes.render(),
            generated_at: Utc::now(),
        }
    }
}
