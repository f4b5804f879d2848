//! Bids and negotiation domains.
//!
//! A [`Domain`] is a finite set of issues, each with a discrete list of legal
//! values. A [`Bid`] assigns exactly one value to every issue.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A complete assignment of one value to every issue of a domain.
///
/// Bids are immutable once built; equality and hashing follow the
/// issue/value mapping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bid {
    values: BTreeMap<String, String>,
}

impl Bid {
    /// Creates a bid from `(issue, value)` pairs.
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the value chosen for `issue`, if any.
    #[must_use]
    pub fn value(&self, issue: &str) -> Option<&str> {
        self.values.get(issue).map(String::as_str)
    }

    /// Iterates `(issue, value)` pairs in issue-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of issues assigned by this bid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the bid assigns no issue.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (issue, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{issue}={value}")?;
        }
        f.write_str("}")
    }
}

/// One negotiable issue and its legal values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSpec {
    /// Issue name, unique within a domain.
    pub name: String,
    /// Legal values, in declaration order.
    pub values: Vec<String>,
}

impl IssueSpec {
    /// Creates an issue from a name and its values.
    pub fn new<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if `value` is legal for this issue.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

/// A multi-issue negotiation domain with discrete values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Domain name.
    pub name: String,
    /// Issues in declaration order.
    pub issues: Vec<IssueSpec>,
}

impl Domain {
    /// Creates and validates a domain.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDomain`] if an issue name repeats, an issue
    /// has no values, or an issue lists the same value twice.
    pub fn new(name: impl Into<String>, issues: Vec<IssueSpec>) -> Result<Self, CoreError> {
        let domain = Self {
            name: name.into(),
            issues,
        };
        domain.validate()?;
        Ok(domain)
    }

    /// Checks the structural invariants of the domain.
    ///
    /// # Errors
    ///
    /// See [`Domain::new`].
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut seen = HashSet::new();
        for issue in &self.issues {
            if !seen.insert(issue.name.as_str()) {
                return Err(CoreError::InvalidDomain(format!(
                    "duplicate issue '{}'",
                    issue.name
                )));
            }
            if issue.values.is_empty() {
                return Err(CoreError::InvalidDomain(format!(
                    "issue '{}' has no values",
                    issue.name
                )));
            }
            let distinct: HashSet<&str> = issue.values.iter().map(String::as_str).collect();
            if distinct.len() != issue.values.len() {
                return Err(CoreError::InvalidDomain(format!(
                    "issue '{}' lists a value twice",
                    issue.name
                )));
            }
        }
        Ok(())
    }

    /// Looks up an issue by name.
    #[must_use]
    pub fn issue(&self, name: &str) -> Option<&IssueSpec> {
        self.issues.iter().find(|i| i.name == name)
    }

    /// Number of distinct bids in the domain.
    #[must_use]
    pub fn size(&self) -> usize {
        if self.issues.is_empty() {
            return 0;
        }
        self.issues
            .iter()
            .map(|i| i.values.len())
            .fold(1usize, usize::saturating_mul)
    }

    /// Enumerates every bid of the domain.
    ///
    /// The first issue varies slowest, so the order is stable for a given
    /// domain definition.
    #[must_use]
    pub fn all_bids(&self) -> Vec<Bid> {
        if self.issues.is_empty() {
            return Vec::new();
        }
        let mut partial: Vec<Vec<(&str, &str)>> = vec![Vec::with_capacity(self.issues.len())];
        for issue in &self.issues {
            let mut next = Vec::with_capacity(partial.len() * issue.values.len());
            for prefix in &partial {
                for value in &issue.values {
                    let mut assignment = prefix.clone();
                    assignment.push((issue.name.as_str(), value.as_str()));
                    next.push(assignment);
                }
            }
            partial = next;
        }
        partial.into_iter().map(Bid::new).collect()
    }

    /// Checks that `bid` assigns a legal value to every issue and nothing else.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownIssue`] or [`CoreError::UnknownValue`].
    pub fn check_bid(&self, bid: &Bid) -> Result<(), CoreError> {
        for (issue, value) in bid.iter() {
            let spec = self
                .issue(issue)
                .ok_or_else(|| CoreError::UnknownIssue(issue.to_string()))?;
            if !spec.contains(value) {
                return Err(CoreError::UnknownValue {
                    issue: issue.to_string(),
                    value: value.to_string(),
                });
            }
        }
        if let Some(missing) = self.issues.iter().find(|i| bid.value(&i.name).is_none()) {
            return Err(CoreError::UnknownIssue(format!("{} (missing)", missing.name)));
        }
        Ok(())
    }
}
