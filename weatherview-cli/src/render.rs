use std::fmt::Write;

use chrono::{DateTime, TimeZone};
use weatherview_core::{Icon, View, ViewState, WeatherSnapshot};

pub fn glyph(icon: Icon) -> &'static str {
    match icon {
        Icon::Cloud => "☁",
        Icon::Haze => "🌫",
        Icon::Rain => "🌧",
        Icon::Sun => "☀",
        Icon::Drizzle => "🌦",
        Icon::Snow => "❄",
        Icon::Thunderstorm => "⛈",
        Icon::Unavailable => "⚠",
    }
}

/// One frame: optional error banner, search shake marker, then loading,
/// card, or the unavailable screen.
pub fn render<Tz>(state: &ViewState, now: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();

    if state.shaking {
        out.push_str("<~~ search rejected ~~>\n");
    }

    match state.view() {
        View::Loading => out.push_str("⟳ Loading...\n"),
        View::Unavailable { error } => {
            banner(&mut out, error);
            out.push_str("⚠ Service not available\n");
        }
        View::Card { snapshot, error } => {
            banner(&mut out, error);
            card(&mut out, snapshot, &now.format("%a %b %d %Y").to_string());
        }
    }

    out
}

fn banner(out: &mut String, error: Option<&str>) {
    if let Some(message) = error {
        let _ = writeln!(out, "[!] {}", capitalize_words(message));
        out.push('\n');
    }
}

fn card(out: &mut String, snap: &WeatherSnapshot, date: &str) {
    let visibility = snap
        .visibility_km()
        .map(|km| format!("{km:.1} km"))
        .unwrap_or_else(|| "No data".to_string());
    let place = if snap.country.is_empty() {
        snap.place.clone()
    } else {
        format!("{}, {}", snap.place, snap.country)
    };

    let _ = writeln!(out, "{}  {place}", glyph(snap.icon()));
    let _ = writeln!(out, "   {date}");
    out.push('\n');
    let _ = writeln!(out, "   {}°C", snap.temperature_rounded());
    let _ = writeln!(out, "   {}", capitalize_words(&snap.description));
    out.push('\n');
    let visibility = format!("Visibility {visibility}");
    let humidity = format!("Humidity {} %", snap.humidity_pct);
    let _ = writeln!(out, "{visibility:<24}Feels like {}°C", snap.feels_like_rounded());
    let _ = writeln!(out, "{humidity:<24}Wind {} m/s", snap.wind_speed_mps);
}

/// Upper-case the first letter of every word.
fn capitalize_words(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::{collections::HashSet, sync::Arc};
    use weatherview_core::{Condition, RequestStatus};

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            place: "Jakarta".into(),
            country: "ID".into(),
            condition: Condition::Haze,
            condition_label: "Haze".into(),
            description: "haze".into(),
            temperature_c: 31.2,
            feels_like_c: 37.1,
            humidity_pct: 66,
            visibility_m: Some(4000),
            wind_speed_mps: 3.6,
            fetched_at: Utc::now(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
    }

    fn state(status: RequestStatus, snap: Option<WeatherSnapshot>) -> ViewState {
        ViewState {
            status,
            snapshot: snap.map(Arc::new),
            location: None,
            shaking: false,
        }
    }

    #[test]
    fn glyphs_are_distinct() {
        let glyphs: HashSet<&str> = Icon::all().iter().map(|i| glyph(*i)).collect();
        assert_eq!(glyphs.len(), Icon::all().len());
    }

    #[test]
    fn card_contents() {
        let out = render(&state(RequestStatus::Idle, Some(snapshot())), now());

        assert!(out.starts_with("🌫  Jakarta, ID\n"));
        assert!(out.contains("Sun Oct 18 2026"));
        assert!(out.contains("31°C"));
        assert!(out.contains("Haze\n"));
        assert!(out.contains("Visibility 4.0 km"));
        assert!(out.contains("Feels like 37°C"));
        assert!(out.contains("Humidity 66 %"));
        assert!(out.contains("Wind 3.6 m/s"));
        assert!(!out.contains("[!]"));
    }

    #[test]
    fn missing_visibility_says_no_data() {
        let mut snap = snapshot();
        snap.visibility_m = None;
        let out = render(&state(RequestStatus::Idle, Some(snap)), now());
        assert!(out.contains("Visibility No data"));
    }

    #[test]
    fn loading_hides_card() {
        let out = render(&state(RequestStatus::Loading, Some(snapshot())), now());
        assert_eq!(out, "⟳ Loading...\n");
    }

    #[test]
    fn error_banner_above_card() {
        let out = render(
            &state(RequestStatus::Error("city not found".into()), Some(snapshot())),
            now(),
        );
        assert!(out.starts_with("[!] City Not Found\n"));
        assert!(out.contains("Jakarta, ID"));
    }

    #[test]
    fn nothing_to_show() {
        let out = render(&state(RequestStatus::Idle, None), now());
        assert_eq!(out, "⚠ Service not available\n");

        let out = render(
            &state(RequestStatus::Error("Error fetching data".into()), None),
            now(),
        );
        assert!(out.starts_with("[!] Error Fetching Data\n"));
        assert!(out.ends_with("⚠ Service not available\n"));
    }

    #[test]
    fn shake_marker() {
        let mut st = state(RequestStatus::Idle, Some(snapshot()));
        st.shaking = true;
        assert!(render(&st, now()).starts_with("<~~ search rejected ~~>\n"));
    }

    #[test]
    fn capitalize() {
        assert_eq!(capitalize_words("light intensity drizzle"), "Light Intensity Drizzle");
        assert_eq!(capitalize_words(""), "");
        assert_eq!(capitalize_words("a  b"), "A  B");
    }
}
