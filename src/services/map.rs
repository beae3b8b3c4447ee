//! Map presentation: marker colors, popup content, footer summary, and the
//! HTML page handed to the Leaflet map widget.
//!
//! Everything here is a pure mapping from enriched positions (or the current
//! [`LoadState`]) to display data; no I/O.

use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::helpers::round_fixed;
use crate::models::{EnrichedPosition, Weather};
use crate::services::loader::LoadState;

const MAP_CENTER_LAT: f64 = 20.0;
const MAP_CENTER_LON: f64 = 0.0;
const MAP_ZOOM: u8 = 2;
const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const TILE_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a>";

/// Altitude band of a balloon, which determines its marker color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AltitudeBand {
    /// Above 15 km
    High,
    /// Above 10 km, up to and including 15 km
    Medium,
    /// 10 km and below
    Low,
}

impl AltitudeBand {
    pub fn from_altitude(altitude_km: f64) -> Self {
        if altitude_km > 15.0 {
            AltitudeBand::High
        } else if altitude_km > 10.0 {
            AltitudeBand::Medium
        } else {
            AltitudeBand::Low
        }
    }

    /// Marker fill color.
    pub fn color(&self) -> &'static str {
        match self {
            AltitudeBand::High => "#ff4444",
            AltitudeBand::Medium => "#ffaa00",
            AltitudeBand::Low => "#44ff44",
        }
    }

    pub fn legend_label(&self) -> &'static str {
        match self {
            AltitudeBand::High => "High altitude (>15km)",
            AltitudeBand::Medium => "Medium altitude (10-15km)",
            AltitudeBand::Low => "Low altitude (<10km)",
        }
    }
}

/// Circle marker styling shared by every balloon.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
    pub radius: u32,
    pub border_color: String,
    pub border_weight: u32,
    pub fill_opacity: f64,
    pub stroke_opacity: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            radius: 6,
            border_color: "#fff".to_string(),
            border_weight: 1,
            fill_opacity: 0.6,
            stroke_opacity: 0.8,
        }
    }
}

/// Weather section of a popup, values printed as estimated.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WeatherPanel {
    /// e.g. "-5.8°C"
    pub temperature: String,
    pub conditions: String,
    /// e.g. "4.6 m/s"
    pub wind: String,
    /// e.g. "1011 hPa"
    pub pressure: String,
}

impl From<&Weather> for WeatherPanel {
    fn from(w: &Weather) -> Self {
        Self {
            temperature: format!("{}°C", w.temperature),
            conditions: w.description.clone(),
            wind: format!("{} m/s", w.wind_speed),
            pressure: format!("{} hPa", w.pressure),
        }
    }
}

/// Popup content shown when a marker is clicked.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Popup {
    /// "Balloon <id>"
    pub title: String,
    /// Latitude and longitude to 2 decimals
    pub position: String,
    /// Altitude to 1 decimal, in km
    pub altitude: String,
    /// "<hour>h ago"
    pub age: String,
    /// Omitted when the balloon has no weather estimate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherPanel>,
}

/// One balloon marker on the map.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Marker {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub band: AltitudeBand,
    pub color: String,
    pub popup: Popup,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LegendEntry {
    pub band: AltitudeBand,
    pub color: String,
    pub label: String,
}

/// Footer below the map: displayed balloon count and altitude legend.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MapSummary {
    pub count: usize,
    pub text: String,
    pub legend: Vec<LegendEntry>,
}

/// Everything the map widget needs to draw the current load result.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
    pub tile_url: String,
    pub attribution: String,
    pub marker_style: MarkerStyle,
    pub markers: Vec<Marker>,
    pub summary: MapSummary,
}

pub fn build_popup(balloon: &EnrichedPosition) -> Popup {
    let p = &balloon.position;
    Popup {
        title: format!("Balloon {}", p.id),
        position: format!(
            "{:.2}°, {:.2}°",
            round_fixed(p.lat, 2),
            round_fixed(p.lon, 2)
        ),
        altitude: format!("{:.1} km", round_fixed(p.altitude, 1)),
        age: format!("{}h ago", p.hour),
        weather: balloon.weather.as_ref().map(WeatherPanel::from),
    }
}

pub fn build_marker(balloon: &EnrichedPosition) -> Marker {
    let band = AltitudeBand::from_altitude(balloon.position.altitude);
    Marker {
        id: balloon.position.id.clone(),
        lat: balloon.position.lat,
        lon: balloon.position.lon,
        band,
        color: band.color().to_string(),
        popup: build_popup(balloon),
    }
}

pub fn build_summary(count: usize) -> MapSummary {
    let legend = [AltitudeBand::High, AltitudeBand::Medium, AltitudeBand::Low]
        .into_iter()
        .map(|band| LegendEntry {
            band,
            color: band.color().to_string(),
            label: band.legend_label().to_string(),
        })
        .collect();

    MapSummary {
        count,
        text: format!("Tracking {} balloons from the last 24 hours", count),
        legend,
    }
}

pub fn build_map_view(balloons: &[EnrichedPosition]) -> MapView {
    MapView {
        center_lat: MAP_CENTER_LAT,
        center_lon: MAP_CENTER_LON,
        zoom: MAP_ZOOM,
        tile_url: TILE_URL.to_string(),
        attribution: TILE_ATTRIBUTION.to_string(),
        marker_style: MarkerStyle::default(),
        markers: balloons.iter().map(build_marker).collect(),
        summary: build_summary(balloons.len()),
    }
}

// ---------------------------------------------------------------------------
// HTML rendering
// ---------------------------------------------------------------------------

const PAGE_TITLE: &str = "Balloon Constellation Tracker";

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    {{HEAD_EXTRA}}
    <title>{{TITLE}}</title>
    <style>
        html, body { margin: 0; height: 100%; font-family: system-ui, sans-serif; }
        .header { padding: 0.5rem 1rem; background: #1d3557; color: #fff; }
        .header h1 { margin: 0; font-size: 1.4rem; }
        .header p { margin: 0.2rem 0 0; font-size: 0.9rem; }
        .loading, .error { padding: 2rem; text-align: center; font-size: 1.2rem; }
        .error { color: #b00020; }
        .map-container { display: flex; flex-direction: column; height: calc(100% - 4rem); }
        #map { flex: 1; }
        .stats { padding: 0.5rem 1rem; background: #f1f1f1; }
        .stats p { margin: 0.2rem 0; }
        .legend-item { margin-right: 1rem; }
        .dot { display: inline-block; width: 10px; height: 10px; border-radius: 50%; }
        .popup-content h3 { margin: 0 0 0.3rem; }
        .popup-content p { margin: 0.1rem 0; }
        .weather-info { margin-top: 0.4rem; border-top: 1px solid #ddd; }
    </style>
</head>
<body>
    <header class="header">
        <h1>{{TITLE}}</h1>
        <p>Tracking weather balloons with local atmospheric conditions</p>
    </header>
{{BODY}}
</body>
</html>
"#;

const MAP_BODY: &str = r#"    <div class="map-container">
        <div id="map"></div>
        <div class="stats">
{{STATS}}
        </div>
    </div>
    <script type="application/json" id="map-data">{{MAP_DATA}}</script>
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
    <script>
        const view = JSON.parse(document.getElementById('map-data').textContent);
        const map = L.map('map', { scrollWheelZoom: true })
            .setView([view.centerLat, view.centerLon], view.zoom);
        L.tileLayer(view.tileUrl, { attribution: view.attribution }).addTo(map);

        function line(label, value) {
            const p = document.createElement('p');
            const strong = document.createElement('strong');
            strong.textContent = label + ': ';
            p.appendChild(strong);
            p.appendChild(document.createTextNode(value));
            return p;
        }

        function popupNode(popup) {
            const root = document.createElement('div');
            root.className = 'popup-content';
            const title = document.createElement('h3');
            title.textContent = popup.title;
            root.appendChild(title);
            root.appendChild(line('Position', popup.position));
            root.appendChild(line('Altitude', popup.altitude));
            root.appendChild(line('Time', popup.age));
            if (popup.weather) {
                const panel = document.createElement('div');
                panel.className = 'weather-info';
                const heading = document.createElement('h4');
                heading.textContent = 'Local Weather';
                panel.appendChild(heading);
                panel.appendChild(line('Temp', popup.weather.temperature));
                panel.appendChild(line('Conditions', popup.weather.conditions));
                panel.appendChild(line('Wind', popup.weather.wind));
                panel.appendChild(line('Pressure', popup.weather.pressure));
                root.appendChild(panel);
            }
            return root;
        }

        const style = view.markerStyle;
        for (const marker of view.markers) {
            L.circleMarker([marker.lat, marker.lon], {
                radius: style.radius,
                fillColor: marker.color,
                color: style.borderColor,
                weight: style.borderWeight,
                opacity: style.strokeOpacity,
                fillOpacity: style.fillOpacity,
            }).bindPopup(() => popupNode(marker.popup)).addTo(map);
        }
    </script>"#;

const LEAFLET_CSS: &str =
    r#"<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">"#;

/// Reload hint while a cycle is still running.
const LOADING_REFRESH: &str = r#"<meta http-equiv="refresh" content="3">"#;

/// Render the page for the current load state: a loading notice, an error
/// message, or the populated map. Never a partially loaded map.
pub fn render_page(state: &LoadState) -> Result<String, AppError> {
    let (head_extra, body) = match state {
        LoadState::Loading => (
            LOADING_REFRESH,
            r#"    <div class="loading">Loading balloon constellation data...</div>"#.to_string(),
        ),
        LoadState::Error { message } => (
            "",
            format!(r#"    <div class="error">{}</div>"#, escape_html(message)),
        ),
        LoadState::Loaded { balloons, .. } => {
            let view = build_map_view(balloons);
            (LEAFLET_CSS, render_map_body(&view)?)
        }
    };

    Ok(PAGE_TEMPLATE
        .replace("{{HEAD_EXTRA}}", head_extra)
        .replace("{{TITLE}}", PAGE_TITLE)
        .replace("{{BODY}}", &body))
}

fn render_map_body(view: &MapView) -> Result<String, AppError> {
    let data = serde_json::to_string(view)
        .map_err(|e| AppError::InternalError(format!("map view serialization failed: {}", e)))?;

    let mut stats = format!("            <p>{}</p>\n", escape_html(&view.summary.text));
    stats.push_str("            <p class=\"legend\">\n");
    for entry in &view.summary.legend {
        stats.push_str(&format!(
            "                <span class=\"legend-item\"><span class=\"dot\" style=\"background:{}\"></span> {}</span>\n",
            entry.color,
            escape_html(&entry.label)
        ));
    }
    stats.push_str("            </p>");

    // "</" inside the JSON would terminate the script element early
    Ok(MAP_BODY
        .replace("{{STATS}}", &stats)
        .replace("{{MAP_DATA}}", &data.replace("</", "<\\/")))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
