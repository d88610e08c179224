//! Declarative content rule sets
//!
//! A [`Ruleset`] describes which records contribute content and is immutable
//! once built, so it can be registered once and reused across requests.
//! Specifications are ordered; when several contribute the same field name,
//! the first declaration wins.

use serde::{Deserialize, Serialize};

/// An immutable, reusable set of content rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruleset {
    pub id: String,
    pub rules: Vec<Rule>,
}

impl Ruleset {
    pub fn new(id: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            id: id.into(),
            rules,
        }
    }

    /// All content specifications in declaration order.
    pub fn content_specifications(&self) -> impl Iterator<Item = &ContentSpecification> {
        self.rules
            .iter()
            .filter(|rule| rule.rule_type == RuleType::Content)
            .flat_map(|rule| rule.specifications.iter())
    }
}

/// A single rule within a set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub rule_type: RuleType,
    pub specifications: Vec<ContentSpecification>,
}

impl Rule {
    pub fn content(specifications: Vec<ContentSpecification>) -> Self {
        Self {
            rule_type: RuleType::Content,
            specifications,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum RuleType {
    Content,
}

/// How a specification picks the records it contributes content for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "specType", rename_all = "PascalCase")]
pub enum ContentSpecification {
    /// Contribute content for every selected record.
    SelectedInstances,
    /// Contribute content only for selected records of the named class.
    InstancesOfClass { class_name: String },
}

/// A content request names its rules inline or by registered id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RulesetOrId {
    Ruleset(Ruleset),
    Id(String),
}

impl From<Ruleset> for RulesetOrId {
    fn from(ruleset: Ruleset) -> Self {
        Self::Ruleset(ruleset)
    }
}

impl From<&str> for RulesetOrId {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}
