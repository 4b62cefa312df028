//! Vocabulary shared by the scenario core and its collaborators.

use serde::{Deserialize, Serialize};

/// Name of the tag delimiting the metadata block of a scenario.
pub const META_TAG: &str = "rasaeco-meta";

// ---------------------------------------------------------------------------
// Axis
// ---------------------------------------------------------------------------

/// One of the three fixed, totally ordered axes of the scenario space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Phase,
    Level,
    Aspect,
}

const PHASES: &[&str] = &[
    "planning",
    "design",
    "construction",
    "operation",
    "renovation",
    "demolition",
];

const LEVELS: &[&str] = &[
    "city",
    "district",
    "site",
    "building",
    "storey",
    "room",
    "component",
];

const ASPECTS: &[&str] = &[
    "architecture",
    "structure",
    "building_services",
    "energy",
    "cost",
    "schedule",
    "regulation",
];

impl Axis {
    /// All axes in the order phase, level, aspect.
    pub const ALL: [Axis; 3] = [Axis::Phase, Axis::Level, Axis::Aspect];

    /// Canonical ordered values of the axis.
    pub fn values(self) -> &'static [&'static str] {
        match self {
            Self::Phase => PHASES,
            Self::Level => LEVELS,
            Self::Aspect => ASPECTS,
        }
    }

    /// Position of `value` on the axis, if it is a member.
    pub fn index_of(self, value: &str) -> Option<usize> {
        self.values().iter().position(|v| *v == value)
    }

    /// Whether `value` is a member of the axis.
    pub fn contains(self, value: &str) -> bool {
        self.index_of(value).is_some()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Phase => "phase",
            Self::Level => "level",
            Self::Aspect => "aspect",
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which end of a range a value was declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::End => f.write_str("end"),
        }
    }
}

// ---------------------------------------------------------------------------
// TagKind
// ---------------------------------------------------------------------------

/// The custom tags a scenario may use in its body. All of them require a
/// `name` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Definition,
    Reference,
    Model,
    ModelReference,
    Phase,
    Level,
}

impl TagKind {
    pub const ALL: [TagKind; 6] = [
        TagKind::Definition,
        TagKind::Reference,
        TagKind::Model,
        TagKind::ModelReference,
        TagKind::Phase,
        TagKind::Level,
    ];

    /// Classify an element name, accepting the long aliases
    /// `definition`, `reference` and `model-reference`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "def" | "definition" => Some(Self::Definition),
            "ref" | "reference" => Some(Self::Reference),
            "model" => Some(Self::Model),
            "modelref" | "model-reference" => Some(Self::ModelReference),
            "phase" => Some(Self::Phase),
            "level" => Some(Self::Level),
            _ => None,
        }
    }

    /// Canonical element name.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Definition => "def",
            Self::Reference => "ref",
            Self::Model => "model",
            Self::ModelReference => "modelref",
            Self::Phase => "phase",
            Self::Level => "level",
        }
    }
}
