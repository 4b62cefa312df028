//! Ranges over the scenario axes and the cubelets they span.

use rasaeco_shared::{Axis, Bound, Issue};

use crate::meta::VolumetricEntry;

/// An inclusive, non-empty interval of one axis, stored as value indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    axis: Axis,
    first: usize,
    last: usize,
}

impl Range {
    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn first(&self) -> &'static str {
        self.axis.values()[self.first]
    }

    pub fn last(&self) -> &'static str {
        self.axis.values()[self.last]
    }

    pub fn first_index(&self) -> usize {
        self.first
    }

    pub fn last_index(&self) -> usize {
        self.last
    }

    /// Whether the axis value at `index` lies within the range.
    pub fn contains(&self, index: usize) -> bool {
        (self.first..=self.last).contains(&index)
    }

    /// The covered values, in axis order.
    pub fn values(&self) -> &'static [&'static str] {
        &self.axis.values()[self.first..=self.last]
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}..{}", self.axis, self.first(), self.last())
    }
}

/// Check `first..last` against `axis`.
///
/// Unknown values are reported before ordering; only the first unknown bound
/// is named.
pub fn validate_range(axis: Axis, first: &str, last: &str) -> Result<Range, Issue> {
    let unknown = |bound, value: &str| Issue::UnknownAxisValue {
        axis,
        bound,
        value: value.to_string(),
    };
    let first_index = axis
        .index_of(first)
        .ok_or_else(|| unknown(Bound::Start, first))?;
    let last_index = axis
        .index_of(last)
        .ok_or_else(|| unknown(Bound::End, last))?;

    if first_index > last_index {
        return Err(Issue::InvertedRange {
            axis,
            first: first.to_string(),
            last: last.to_string(),
        });
    }

    Ok(Range {
        axis,
        first: first_index,
        last: last_index,
    })
}

/// A box in phase x level x aspect space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cubelet {
    pub phase: Range,
    pub level: Range,
    pub aspect: Range,
}

impl Cubelet {
    /// Validate all three ranges of a declared cubelet, reporting every
    /// malformed axis rather than stopping at the first.
    pub fn from_entry(entry: &VolumetricEntry) -> Result<Self, Vec<Issue>> {
        let phase = validate_range(Axis::Phase, &entry.phase_from, &entry.phase_to);
        let level = validate_range(Axis::Level, &entry.level_from, &entry.level_to);
        let aspect = validate_range(Axis::Aspect, &entry.aspect_from, &entry.aspect_to);

        match (phase, level, aspect) {
            (Ok(phase), Ok(level), Ok(aspect)) => Ok(Self {
                phase,
                level,
                aspect,
            }),
            (phase, level, aspect) => Err([phase.err(), level.err(), aspect.err()]
                .into_iter()
                .flatten()
                .collect()),
        }
    }

    pub fn range(&self, axis: Axis) -> &Range {
        match axis {
            Axis::Phase => &self.phase,
            Axis::Level => &self.level,
            Axis::Aspect => &self.aspect,
        }
    }

    /// Whether the projection of the cubelet onto the `(x, y)` plane covers
    /// the cell at value indices `(xi, yi)`.
    pub fn covers(&self, x: Axis, xi: usize, y: Axis, yi: usize) -> bool {
        self.range(x).contains(xi) && self.range(y).contains(yi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(phase: (&str, &str), level: (&str, &str), aspect: (&str, &str)) -> VolumetricEntry {
        VolumetricEntry {
            phase_from: phase.0.into(),
            phase_to: phase.1.into(),
            level_from: level.0.into(),
            level_to: level.1.into(),
            aspect_from: aspect.0.into(),
            aspect_to: aspect.1.into(),
        }
    }

    #[test]
    fn single_value_range() {
        let range = validate_range(Axis::Level, "room", "room").unwrap();
        assert_eq!(range.first(), "room");
        assert_eq!(range.last(), "room");
        assert_eq!(range.values(), &["room"]);
    }

    #[test]
    fn range_covers_values_in_between() {
        let range = validate_range(Axis::Phase, "design", "operation").unwrap();
        assert_eq!(range.values(), &["design", "construction", "operation"]);
        assert!(range.contains(Axis::Phase.index_of("construction").unwrap()));
        assert!(!range.contains(Axis::Phase.index_of("planning").unwrap()));
        assert_eq!(range.to_string(), "phase design..operation");
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert_eq!(
            validate_range(Axis::Phase, "operation", "design"),
            Err(Issue::InvertedRange {
                axis: Axis::Phase,
                first: "operation".into(),
                last: "design".into(),
            })
        );
    }

    #[test]
    fn every_ordered_pair_validates_and_every_inverted_pair_fails() {
        for axis in Axis::ALL {
            let values = axis.values();
            for (i, first) in values.iter().enumerate() {
                for (j, last) in values.iter().enumerate() {
                    let result = validate_range(axis, first, last);
                    if i <= j {
                        let range = result.unwrap();
                        assert_eq!((range.first_index(), range.last_index()), (i, j));
                    } else {
                        assert!(matches!(result, Err(Issue::InvertedRange { .. })));
                    }
                }
            }
        }
    }

    #[test]
    fn first_unknown_bound_is_reported() {
        assert_eq!(
            validate_range(Axis::Aspect, "colour", "smell"),
            Err(Issue::UnknownAxisValue {
                axis: Axis::Aspect,
                bound: Bound::Start,
                value: "colour".into(),
            })
        );
        assert_eq!(
            validate_range(Axis::Aspect, "cost", "smell"),
            Err(Issue::UnknownAxisValue {
                axis: Axis::Aspect,
                bound: Bound::End,
                value: "smell".into(),
            })
        );
    }

    #[test]
    fn cubelet_reports_every_bad_axis() {
        let bad = entry(("operation", "design"), ("site", "site"), ("cost", "smell"));
        let issues = Cubelet::from_entry(&bad).unwrap_err();
        assert_eq!(issues.len(), 2);
        assert!(matches!(issues[0], Issue::InvertedRange { axis: Axis::Phase, .. }));
        assert!(matches!(
            issues[1],
            Issue::UnknownAxisValue { axis: Axis::Aspect, .. }
        ));
    }

    #[test]
    fn cubelet_projection_coverage() {
        let cubelet = Cubelet::from_entry(&entry(
            ("design", "construction"),
            ("building", "room"),
            ("energy", "energy"),
        ))
        .unwrap();
        let design = Axis::Phase.index_of("design").unwrap();
        let storey = Axis::Level.index_of("storey").unwrap();
        let energy = Axis::Aspect.index_of("energy").unwrap();
        let cost = Axis::Aspect.index_of("cost").unwrap();
        assert!(cubelet.covers(Axis::Phase, design, Axis::Level, storey));
        assert!(cubelet.covers(Axis::Level, storey, Axis::Aspect, energy));
        assert!(!cubelet.covers(Axis::Phase, design, Axis::Aspect, cost));
    }
}
