use dioxus::prelude::*;
use foodtour_shared::models::{Position, Stop, StopId};

use crate::coords::{Projection, PADDING, VIEW_H, VIEW_W};

const STOP_COLOR: &str = "#e07a2f";
const CURRENT_COLOR: &str = "#c43030";
const USER_COLOR: &str = "#f2c230";
const ROUTE_STROKE: &str = "rgba(224,122,47,0.6)";
const LEAD_STROKE: &str = "rgba(196,48,48,0.9)";
const ACCURACY_FILL: &str = "rgba(74,143,212,0.18)";

const MARKER_R: f64 = 14.0;

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Build the map overlay as an SVG fragment in projected pixel space.
fn build_svg_content(
    stops: &[Stop],
    position: Option<&Position>,
    current: Option<StopId>,
    proj: &Projection,
) -> String {
    let mut svg = String::with_capacity(4096);
    build_route_path(&mut svg, stops, proj);
    if let Some(pos) = position {
        build_lead_line(&mut svg, pos, stops, current, proj);
    }
    build_stop_markers(&mut svg, stops, current, proj);
    if let Some(pos) = position {
        build_user_marker(&mut svg, pos, proj);
    }
    svg
}

/// Dashed polyline through the stops in visiting order.
fn build_route_path(svg: &mut String, stops: &[Stop], proj: &Projection) {
    let points: Vec<String> = stops
        .iter()
        .filter_map(|s| s.location)
        .map(|p| {
            let (x, y) = proj.project(p);
            format!("{x:.1},{y:.1}")
        })
        .collect();
    if points.len() < 2 {
        return;
    }
    svg.push_str(&format!(
        r#"<polyline points="{}" fill="none" stroke="{ROUTE_STROKE}" stroke-width="4" stroke-dasharray="10 8"/>"#,
        points.join(" ")
    ));
}

/// Solid line from the traveller to the current stop.
fn build_lead_line(svg: &mut String, pos: &Position, stops: &[Stop], current: Option<StopId>, proj: &Projection) {
    let Some(target) = current
        .and_then(|id| stops.iter().find(|s| s.id == id))
        .and_then(|s| s.location)
    else {
        return;
    };
    let (x1, y1) = proj.project(pos.point());
    let (x2, y2) = proj.project(target);
    svg.push_str(&format!(
        r#"<line class="lead-line" x1="{x1:.1}" y1="{y1:.1}" x2="{x2:.1}" y2="{y2:.1}" stroke="{LEAD_STROKE}" stroke-width="5" stroke-linecap="round"/>"#
    ));
}

fn build_stop_markers(svg: &mut String, stops: &[Stop], current: Option<StopId>, proj: &Projection) {
    for (i, stop) in stops.iter().enumerate() {
        let Some(loc) = stop.location else { continue };
        let (cx, cy) = proj.project(loc);
        let is_current = current == Some(stop.id);
        let (fill, r) = if is_current {
            (CURRENT_COLOR, MARKER_R * 1.3)
        } else {
            (STOP_COLOR, MARKER_R)
        };
        let name = xml_escape(&stop.name);
        svg.push_str(&format!(r##"<g role="img"><title>{name}</title>"##));
        svg.push_str(&format!(
            r##"<circle cx="{cx:.1}" cy="{cy:.1}" r="{r}" fill="{fill}" stroke="#fff" stroke-width="3"/>"##
        ));
        svg.push_str(&format!(
            r##"<text x="{cx:.1}" y="{:.1}" font-size="15" font-weight="bold" fill="#fff" text-anchor="middle">{}</text>"##,
            cy + 5.0,
            i + 1
        ));
        svg.push_str("</g>");
    }
}

fn build_user_marker(svg: &mut String, pos: &Position, proj: &Projection) {
    let (cx, cy) = proj.project(pos.point());
    let acc = proj.meters_to_px(pos.accuracy_meters);
    if acc > MARKER_R {
        svg.push_str(&format!(
            r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="{acc:.1}" fill="{ACCURACY_FILL}"/>"#
        ));
    }
    svg.push_str(&format!(
        r##"<g role="img"><title>You are here</title><circle cx="{cx:.1}" cy="{cy:.1}" r="10" fill="{USER_COLOR}" stroke="#333" stroke-width="3"/></g>"##
    ));
}

/// Schematic map of the route and, while navigating, the traveller.
#[component]
pub fn RouteMap(stops: Vec<Stop>, position: Option<Position>, current: Option<StopId>) -> Element {
    let mut points: Vec<_> = stops.iter().filter_map(|s| s.location).collect();
    points.extend(position.map(|p| p.point()));

    let Some(proj) = Projection::fit(&points, VIEW_W, VIEW_H, PADDING) else {
        return rsx! {
            div { class: "route-map empty", "No locations to show yet." }
        };
    };

    let svg_html = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {VIEW_W} {VIEW_H}" style="width:100%;height:auto;">{}</svg>"#,
        build_svg_content(&stops, position.as_ref(), current, &proj)
    );

    rsx! {
        div { class: "route-map", dangerous_inner_html: "{svg_html}" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodtour_shared::models::GeoPoint;

    fn stop(id: StopId, name: &str, loc: Option<(f64, f64)>) -> Stop {
        Stop {
            id,
            name: name.to_string(),
            location: loc.map(|(lat, lon)| GeoPoint::new(lat, lon)),
            address: None,
            tags: vec![],
            rating: None,
        }
    }

    fn route() -> Vec<Stop> {
        vec![
            stop(1, "Phở Hòa", Some((10.7891, 106.6886))),
            stop(2, "Street cart", None),
            stop(3, "Bánh Mì <Huỳnh Hoa>", Some((10.7714, 106.6922))),
        ]
    }

    fn here() -> Position {
        Position {
            latitude: 10.7800,
            longitude: 106.6950,
            accuracy_meters: 30.0,
        }
    }

    fn projection(stops: &[Stop], pos: Option<&Position>) -> Projection {
        let mut points: Vec<_> = stops.iter().filter_map(|s| s.location).collect();
        points.extend(pos.map(|p| p.point()));
        Projection::fit(&points, VIEW_W, VIEW_H, PADDING).unwrap()
    }

    #[test]
    fn test_markers_skip_stops_without_coordinates() {
        let stops = route();
        let svg = build_svg_content(&stops, None, None, &projection(&stops, None));
        assert_eq!(svg.matches("<title>").count(), 2);
        assert!(svg.contains(">1</text>"));
        assert!(svg.contains(">3</text>"));
        assert!(!svg.contains(">2</text>"));
    }

    #[test]
    fn test_stop_names_are_escaped() {
        let stops = route();
        let svg = build_svg_content(&stops, None, None, &projection(&stops, None));
        assert!(svg.contains("Bánh Mì &lt;Huỳnh Hoa&gt;"));
    }

    #[test]
    fn test_lead_line_only_with_position_and_located_current_stop() {
        let stops = route();
        let pos = here();
        let proj = projection(&stops, Some(&pos));

        let svg = build_svg_content(&stops, Some(&pos), Some(1), &proj);
        assert!(svg.contains("lead-line"));
        assert!(svg.contains("You are here"));

        let no_coords = build_svg_content(&stops, Some(&pos), Some(2), &proj);
        assert!(!no_coords.contains("lead-line"));

        let no_fix = build_svg_content(&stops, None, Some(1), &proj);
        assert!(!no_fix.contains("lead-line"));
    }

    #[test]
    fn test_route_path_needs_two_located_stops() {
        let one = vec![stop(1, "Only", Some((10.78, 106.69)))];
        let svg = build_svg_content(&one, None, None, &projection(&one, None));
        assert!(!svg.contains("polyline"));

        let stops = route();
        let svg = build_svg_content(&stops, None, None, &projection(&stops, None));
        assert!(svg.contains("polyline"));
    }

    #[test]
    fn test_current_stop_is_highlighted() {
        let stops = route();
        let svg = build_svg_content(&stops, None, Some(3), &projection(&stops, None));
        assert_eq!(svg.matches(CURRENT_COLOR).count(), 1);
    }
}
