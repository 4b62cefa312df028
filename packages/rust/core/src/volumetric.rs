//! SVG rendering of the region a scenario covers.
//!
//! The union of the cubelets is shown as three orthogonal projections,
//! phase x level, phase x aspect and level x aspect, side by side.

use rasaeco_shared::Axis;

use crate::cube::Cubelet;
use crate::ontology::Scenario;

const CELL: usize = 18;
const LABEL: usize = 130;
const TITLE: usize = 24;
const GAP: usize = 40;
const MARGIN: usize = 10;

const PROJECTIONS: [(Axis, Axis); 3] = [
    (Axis::Phase, Axis::Level),
    (Axis::Phase, Axis::Aspect),
    (Axis::Level, Axis::Aspect),
];

const COVERED: &str = "#4a7bd0";
const EMPTY: &str = "#ffffff";

/// Render the projections of `scenario`'s cubelets as a standalone SVG.
pub fn render_volumetric_svg(scenario: &Scenario) -> String {
    let width = 2 * MARGIN
        + PROJECTIONS
            .iter()
            .map(|(x, _)| panel_width(*x))
            .sum::<usize>()
        + GAP * (PROJECTIONS.len() - 1);
    let height = 2 * MARGIN
        + PROJECTIONS
            .iter()
            .map(|(_, y)| panel_height(*y))
            .max()
            .unwrap_or_default();

    let mut svg = String::new();
    line(&mut svg, format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif" font-size="11">"#
    ));
    line(&mut svg, format!("<title>{}</title>", escape(&scenario.title)));

    let mut left = MARGIN;
    for (x, y) in PROJECTIONS {
        write_panel(&mut svg, &scenario.cubelets, x, y, left, MARGIN);
        left += panel_width(x) + GAP;
    }

    svg.push_str("</svg>\n");
    svg
}

fn panel_width(x: Axis) -> usize {
    LABEL + x.values().len() * CELL
}

fn panel_height(y: Axis) -> usize {
    TITLE + y.values().len() * CELL + LABEL
}

fn write_panel(svg: &mut String, cubelets: &[Cubelet], x: Axis, y: Axis, left: usize, top: usize) {
    let grid_left = left + LABEL;
    let grid_top = top + TITLE;
    let rows = y.values().len();

    line(svg, format!(r#"<g class="projection" data-x="{x}" data-y="{y}">"#));
    line(svg, format!(
        r#"<text x="{grid_left}" y="{}" font-weight="bold">{x} / {y}</text>"#,
        top + TITLE / 2
    ));

    for (yi, value) in y.values().iter().enumerate() {
        line(svg, format!(
            r#"<text x="{}" y="{}" text-anchor="end">{}</text>"#,
            grid_left - 4,
            grid_top + yi * CELL + CELL * 2 / 3,
            label(value)
        ));
    }

    for (xi, value) in x.values().iter().enumerate() {
        line(svg, format!(
            r#"<text transform="translate({} {}) rotate(90)">{}</text>"#,
            grid_left + xi * CELL + CELL / 3,
            grid_top + rows * CELL + 4,
            label(value)
        ));
    }

    for yi in 0..rows {
        for xi in 0..x.values().len() {
            let covered = cubelets.iter().any(|c| c.covers(x, xi, y, yi));
            line(svg, format!(
                r##"<rect x="{}" y="{}" width="{CELL}" height="{CELL}" fill="{}" stroke="#cccccc"/>"##,
                grid_left + xi * CELL,
                grid_top + yi * CELL,
                if covered { COVERED } else { EMPTY }
            ));
        }
    }

    svg.push_str("</g>\n");
}

fn line(svg: &mut String, text: String) {
    svg.push_str(&text);
    svg.push('\n');
}

fn label(value: &str) -> String {
    value.replace('_', " ")
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::definitions::Definitions;
    use crate::meta::VolumetricEntry;

    fn scenario(cubelets: Vec<Cubelet>) -> Scenario {
        Scenario {
            identifier: "s".into(),
            title: "Pumps & valves".into(),
            contact: String::new(),
            path: PathBuf::from("s.md"),
            cubelets,
            definitions: Definitions::default(),
        }
    }

    fn cubelet(phase: &str, level: &str, aspect: &str) -> Cubelet {
        Cubelet::from_entry(&VolumetricEntry {
            phase_from: phase.into(),
            phase_to: phase.into(),
            level_from: level.into(),
            level_to: level.into(),
            aspect_from: aspect.into(),
            aspect_to: aspect.into(),
        })
        .unwrap()
    }

    fn cells() -> usize {
        PROJECTIONS
            .iter()
            .map(|(x, y)| x.values().len() * y.values().len())
            .sum()
    }

    #[test]
    fn empty_region_has_no_covered_cells() {
        let svg = render_volumetric_svg(&scenario(Vec::new()));
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<rect").count(), cells());
        assert_eq!(svg.matches(COVERED).count(), 0);
        assert!(svg.contains("<title>Pumps &amp; valves</title>"));
    }

    #[test]
    fn single_point_covers_one_cell_per_projection() {
        let svg = render_volumetric_svg(&scenario(vec![cubelet("design", "room", "energy")]));
        assert_eq!(svg.matches(COVERED).count(), 3);
    }

    #[test]
    fn overlapping_cubelets_are_a_union() {
        let both = vec![
            cubelet("design", "room", "energy"),
            cubelet("design", "room", "energy"),
        ];
        let svg = render_volumetric_svg(&scenario(both));
        assert_eq!(svg.matches(COVERED).count(), 3);
    }

    #[test]
    fn output_is_deterministic_and_labelled() {
        let s = scenario(vec![cubelet("operation", "building", "building_services")]);
        let svg = render_volumetric_svg(&s);
        assert_eq!(svg, render_volumetric_svg(&s));
        assert!(svg.contains(">building services</text>"));
        assert!(svg.contains(">phase / level</text>"));
    }
}
