//! Non-fatal issues collected while mapping a network or evaluating a
//! Hessian.
//!
//! Network validation reports structural problems here, and the Hessian
//! evaluation records a `"hessian"` warning when a flow-limit formulation
//! has no curvature in the requested coordinates and is skipped.
//!
//! ```
//! use branchlim_core::diagnostics::Diagnostics;
//!
//! let mut diag = Diagnostics::new();
//! diag.add_warning("hessian", "current limit has no cartesian curvature");
//! diag.add_error_with_entity("validation", "zero impedance", "Branch 4");
//!
//! assert_eq!(diag.warning_count(), 1);
//! assert!(diag.has_errors());
//! ```

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    /// Grouping key, e.g. "structure", "physical", "hessian"
    pub category: String,
    pub message: String,
    /// Element the issue refers to, e.g. "Branch 3"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, severity: Severity, category: &str, message: &str, entity: Option<&str>) {
        self.issues.push(DiagnosticIssue {
            severity,
            category: category.to_owned(),
            message: message.to_owned(),
            entity: entity.map(str::to_owned),
        });
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.push(Severity::Warning, category, message, None);
    }

    pub fn add_warning_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.push(Severity::Warning, category, message, Some(entity));
    }

    pub fn add_error(&mut self, category: &str, message: &str) {
        self.push(Severity::Error, category, message, None);
    }

    pub fn add_error_with_entity(&mut self, category: &str, message: &str, entity: &str) {
        self.push(Severity::Error, category, message, Some(entity));
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.with_severity(Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.with_severity(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}
