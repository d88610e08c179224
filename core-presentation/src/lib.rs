//! # Presentation Module
//!
//! Resolves a raw record selection into displayable content.
//!
//! ## Overview
//!
//! Content resolution is a two-phase flow against an open snapshot:
//!
//! 1. [`PresentationEngine::compute_selection`] widens raw record
//!    identifiers under a named [`SelectionScope`] into a normalized,
//!    order-independent [`SelectionKeySet`].
//! 2. [`PresentationEngine::get_content`] evaluates a [`Ruleset`] against
//!    that selection and produces a [`Content`] response, or `None` when
//!    nothing matches.
//!
//! Rule sets are declarative and reusable; specifications contribute fields
//! in declaration order with the first declaration of a field name winning.
//! [`DescriptorOverrides`] bias which fields a response carries, never which
//! records belong to it.

pub mod content;
pub mod engine;
pub mod error;
pub mod ruleset;
pub mod selection;

pub use content::{
    Content, ContentItem, Descriptor, DescriptorOverrides, DisplayType, Field, ValueKind,
};
pub use engine::PresentationEngine;
pub use error::{PresentationError, Result};
pub use ruleset::{ContentSpecification, Rule, RuleType, Ruleset, RulesetOrId};
pub use selection::{SelectionKey, SelectionKeySet, SelectionScope};
