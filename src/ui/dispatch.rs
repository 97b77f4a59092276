//! Dispatch Intelligence panel: structured cards derived from the aggregated
//! view. Cards render whatever normalized data is present and show a loading
//! marker while their source tools are in flight.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};
use serde_json::Value;

use super::{text, theme};
use crate::app::App;

pub fn render_dispatch_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER))
        .title(Span::styled(" Dispatch Intelligence ", Style::default().fg(theme::TEXT).bold()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width < 6 || inner.height == 0 {
        return;
    }
    let width = inner.width as usize - 1;

    let mut lines: Vec<Line> = Vec::new();
    if !app.view.has_any_data() {
        lines.push(Line::from(Span::styled(
            "Awaiting incident data.",
            Style::default().fg(theme::TEXT_MUTED).italic(),
        )));
    } else {
        address_card(app, &mut lines, width);
        building_card(app, &mut lines, width);
        hazards_card(app, &mut lines);
        contacts_card(app, &mut lines, width);
        route_card(app, &mut lines);
        narrative_card(app, &mut lines, width);
        follow_up_card(app, &mut lines, width);
    }

    let height = inner.height as usize;
    let visible: Vec<Line> = lines.into_iter().take(height).collect();
    frame.render_widget(Paragraph::new(visible), inner);
}

fn card_header(lines: &mut Vec<Line>, icon: &str, title: &str, loading: bool) {
    if !lines.is_empty() {
        lines.push(Line::default());
    }
    let mut spans = vec![Span::styled(
        format!("{} {}", icon, title),
        Style::default().fg(theme::ACCENT).bold(),
    )];
    if loading {
        spans.push(Span::styled("  ⋯ updating", Style::default().fg(theme::WARNING)));
    }
    lines.push(Line::from(spans));
}

fn field_line<'a>(label: &str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {:<12} ", label), Style::default().fg(theme::TEXT_MUTED)),
        Span::styled(value, Style::default().fg(theme::TEXT)),
    ])
}

// ── value helpers ──────────────────────────────────────────────

fn str_of(v: &Value, path: &[&str]) -> Option<String> {
    let mut cur = v;
    for key in path {
        cur = cur.get(key)?;
    }
    cur.as_str().filter(|s| !s.is_empty()).map(str::to_string)
}

fn num_of(v: &Value, path: &[&str]) -> Option<f64> {
    let mut cur = v;
    for key in path {
        cur = cur.get(key)?;
    }
    cur.as_f64()
}

fn fmt_num(n: f64) -> String {
    if n.fract() == 0.0 { format!("{}", n as i64) } else { format!("{:.1}", n) }
}

// ── cards ──────────────────────────────────────────────────────

fn address_card(app: &App, lines: &mut Vec<Line>, width: usize) {
    let verify = app.view.output("verify_address");
    let geocode = app.view.output("geocode_address");
    let loading = app.view.is_active("verify_address") || app.view.is_active("geocode_address");
    if verify.is_none() && geocode.is_none() && !loading {
        return;
    }
    card_header(lines, "📍", "Location", loading);

    if let Some(v) = verify {
        if let Some(addr) = str_of(v, &["formatted_address"]) {
            for wrapped in text::wrap(&addr, width.saturating_sub(2)) {
                lines.push(Line::from(Span::styled(format!("  {}", wrapped), Style::default().fg(theme::TEXT))));
            }
        }
        if let Some(conf) = num_of(v, &["confidence"]) {
            lines.push(field_line("Confidence", format!("{:.0}%", conf)));
        }
        if let Some(id) = str_of(v, &["precisely_id"]) {
            lines.push(field_line("PreciselyID", id));
        }
    }
    // Coordinates from verification, or the geocode fallback
    let coords = verify
        .and_then(|v| Some((num_of(v, &["latitude"])?, num_of(v, &["longitude"])?)))
        .or_else(|| geocode.and_then(|g| Some((num_of(g, &["latitude"])?, num_of(g, &["longitude"])?))));
    if let Some((lat, lon)) = coords {
        lines.push(field_line("Coordinates", format!("{:.5}, {:.5}", lat, lon)));
    }
}

fn building_card(app: &App, lines: &mut Vec<Line>, width: usize) {
    let loading = app.view.is_active("enrich_property");
    let Some(profile) = app.view.output("enrich_property") else {
        if loading {
            card_header(lines, "🏠", "Building & Business", true);
        }
        return;
    };
    card_header(lines, "🏠", "Building & Business", loading);

    if let Some(t) = str_of(profile, &["property", "building_type"]) {
        lines.push(field_line("Type", t));
    }
    let mut size = Vec::new();
    if let Some(area) = num_of(profile, &["property", "building_area"]) {
        size.push(format!("{} sq ft", fmt_num(area)));
    }
    if let Some(stories) = num_of(profile, &["property", "stories"]) {
        size.push(format!("{} stories", fmt_num(stories)));
    }
    if let Some(year) = num_of(profile, &["property", "year_built"]) {
        size.push(format!("built {}", fmt_num(year)));
    }
    if !size.is_empty() {
        lines.push(field_line("Structure", size.join(", ")));
    }
    if let Some(walls) = str_of(profile, &["property", "exterior_walls"]) {
        lines.push(field_line("Walls", walls));
    }
    if let Some(fuel) = str_of(profile, &["property", "heating_fuel"]) {
        lines.push(field_line("Heating fuel", fuel));
    }
    if let Some(name) = str_of(profile, &["business", "business_name"]) {
        let occupant = match num_of(profile, &["business", "employee_count"]) {
            Some(n) => format!("{} ({} employees)", name, fmt_num(n)),
            None => name,
        };
        for wrapped in text::wrap(&occupant, width.saturating_sub(15)) {
            lines.push(field_line("Business", wrapped));
        }
    }
}

fn hazards_card(app: &App, lines: &mut Vec<Line>) {
    let Some(profile) = app.view.output("enrich_property") else {
        return;
    };
    let flood_zone = str_of(profile, &["hazards", "flood_zone"]);
    let flood_risk = str_of(profile, &["hazards", "flood_risk"]);
    let quake = str_of(profile, &["hazards", "earthquake_risk"]);
    let wildfire = str_of(profile, &["hazards", "wildfire_risk"]);
    if flood_zone.is_none() && flood_risk.is_none() && quake.is_none() && wildfire.is_none() {
        return;
    }
    card_header(lines, "⚠", "Hazards", false);
    let flood = match (flood_zone, flood_risk) {
        (Some(z), Some(r)) => Some(format!("zone {} ({})", z, r)),
        (Some(z), None) => Some(format!("zone {}", z)),
        (None, r) => r,
    };
    if let Some(value) = flood {
        lines.push(field_line("Flood", value));
    }
    if let Some(q) = quake {
        lines.push(field_line("Earthquake", q));
    }
    if let Some(w) = wildfire {
        lines.push(field_line("Wildfire", w));
    }
}

fn contacts_card(app: &App, lines: &mut Vec<Line>, width: usize) {
    let by_address = app.view.output("lookup_emergency_contacts");
    let by_location = app.view.output("lookup_psap_by_location");
    let loading =
        app.view.is_active("lookup_emergency_contacts") || app.view.is_active("lookup_psap_by_location");
    if by_address.is_none() && by_location.is_none() && !loading {
        return;
    }
    card_header(lines, "📞", "Emergency Contacts", loading);

    // Address-based lookup wins; location lookup fills in when it is all we have
    let psap = by_address.and_then(|v| v.get("psap")).or_else(|| by_location.and_then(|v| v.get("psap")));
    if let Some(psap) = psap {
        let agency = str_of(psap, &["agency"]).unwrap_or_else(|| "Unknown".to_string());
        let phone = str_of(psap, &["phone"]).unwrap_or_else(|| "Unknown".to_string());
        lines.push(field_line("PSAP", format!("{} - {}", agency, phone)));
        if let Some(county) = str_of(psap, &["county"]) {
            lines.push(field_line("County", county));
        }
        if let Some(site) = str_of(psap, &["site_address"]) {
            for wrapped in text::wrap(&site, width.saturating_sub(15)) {
                lines.push(field_line("PSAP site", wrapped));
            }
        }
    }
    if let Some(ahjs) = by_address.and_then(|v| v.get("ahjs")).and_then(|a| a.as_array()) {
        for ahj in ahjs {
            let kind = str_of(ahj, &["type"]).unwrap_or_else(|| "AHJ".to_string());
            let agency = str_of(ahj, &["agency"]).unwrap_or_else(|| "Unknown".to_string());
            let phone = str_of(ahj, &["phone"]).unwrap_or_else(|| "Unknown".to_string());
            for wrapped in text::wrap(&format!("{} - {}", agency, phone), width.saturating_sub(15)) {
                lines.push(field_line(&kind, wrapped));
            }
        }
    }
}

fn route_card(app: &App, lines: &mut Vec<Line>) {
    let loading = app.view.is_active("calculate_route");
    let Some(route) = app.view.output("calculate_route") else {
        if loading {
            card_header(lines, "🚒", "Response Route", true);
        }
        return;
    };
    card_header(lines, "🚒", "Response Route", loading);
    if let Some(time) = num_of(route, &["total_time"]) {
        lines.push(field_line("ETA", format!("{:.0} min", time)));
    }
    if let Some(distance) = num_of(route, &["total_distance"]) {
        lines.push(field_line("Distance", format!("{:.1} mi", distance)));
    }
}

fn narrative_card(app: &App, lines: &mut Vec<Line>, width: usize) {
    let Some(narrative) = &app.view.narrative else {
        return;
    };
    if narrative.clean_text.is_empty() {
        return;
    }
    card_header(lines, "📋", "Dispatch Briefing", false);
    for wrapped in text::wrap(&narrative.clean_text, width.saturating_sub(2)) {
        lines.push(Line::from(Span::styled(format!("  {}", wrapped), Style::default().fg(theme::TEXT))));
    }
}

fn follow_up_card(app: &App, lines: &mut Vec<Line>, width: usize) {
    let Some(narrative) = &app.view.narrative else {
        return;
    };
    if narrative.follow_up_questions.is_empty() {
        return;
    }
    card_header(lines, "❓", "Suggested Questions", false);
    for (idx, question) in narrative.follow_up_questions.iter().enumerate() {
        let numbered = format!("{}. {}", idx + 1, question);
        for (i, wrapped) in text::wrap(&numbered, width.saturating_sub(2)).into_iter().enumerate() {
            let style = if i == 0 {
                Style::default().fg(theme::WARNING)
            } else {
                Style::default().fg(theme::TEXT)
            };
            lines.push(Line::from(Span::styled(format!("  {}", wrapped), style)));
        }
    }
    lines.push(Line::from(Span::styled(
        "  press the number to send a question to the caller",
        Style::default().fg(theme::TEXT_MUTED).italic(),
    )));
}
