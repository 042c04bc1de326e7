//! The list of loaded tracks: uploads, generated routes, and their downloads.

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

use crate::error::UploadError;
use crate::gpx_types::{Track, Waypoint, waypoints_for};
use crate::parser::parse_gpx;
use crate::routing::{PlannedRoute, Profile};
use crate::writer::to_gpx_at;

pub const DEFAULT_TRACK_COLOR: &str = "#4561FF";
const GPX_EXTENSION: &str = ".gpx";

/// Characters not allowed in generated file names.
const FORBIDDEN_FILE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Summary of a generated route.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInfo {
    pub distance_km: f64,
    pub duration_secs: f64,
    pub waypoints: Vec<Waypoint>,
}

impl RouteInfo {
    /// `"2h 5m"`, or `"42m"` under an hour.
    pub fn format_duration(&self) -> String {
        let secs = self.duration_secs.max(0.0) as u64;
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        if hours > 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{minutes}m")
        }
    }

    pub fn format_distance(&self) -> String {
        format!("{:.2} km", self.distance_km)
    }
}

/// One entry of the library: an uploaded file or a generated route.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GpxFile {
    pub id: u64,
    pub name: String,
    pub data: Track,
    pub uploaded_at: DateTime<Utc>,
    pub color: String,
    /// GPX text offered for download; only generated routes carry it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_info: Option<RouteInfo>,
}

impl GpxFile {
    pub fn from_upload(id: u64, file_name: &str, data: Track, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: file_name.to_string(),
            data,
            uploaded_at: now,
            color: DEFAULT_TRACK_COLOR.to_string(),
            download_content: None,
            route_info: None,
        }
    }

    /// Wrap a planned route. `labels` are the addresses as the user typed
    /// them; when there are fewer than two (pinned points), the planner's
    /// labels are used instead.
    pub fn from_planned_route(
        id: u64,
        labels: &[String],
        planned: &PlannedRoute,
        profile: Profile,
        now: DateTime<Utc>,
    ) -> Self {
        let labels: Vec<String> = if labels.len() >= 2 {
            labels.to_vec()
        } else {
            planned.addresses.iter().map(|a| a.label.clone()).collect()
        };

        let name = route_name(
            labels.first().map(String::as_str).unwrap_or_default(),
            labels.last().map(String::as_str).unwrap_or_default(),
            profile,
        );
        let gpx = to_gpx_at(&planned.route.points, &name, Some(planned.addresses.as_slice()), now);

        Self {
            id,
            name: name.clone(),
            data: Track::new(name, planned.route.points.clone()),
            uploaded_at: now,
            color: DEFAULT_TRACK_COLOR.to_string(),
            download_content: Some(gpx),
            route_info: Some(RouteInfo {
                distance_km: planned.route.distance_km,
                duration_secs: planned.route.duration_secs,
                waypoints: waypoints_for(&planned.addresses, &labels),
            }),
        }
    }

    /// File name and GPX text to hand to the browser.
    pub fn download(&self) -> Result<(String, &str), UploadError> {
        let content = self
            .download_content
            .as_deref()
            .ok_or_else(|| UploadError::NothingToDownload(self.name.clone()))?;
        Ok((download_file_name(&self.name), content))
    }
}

/// Gate an uploaded file: `.gpx` extension (any case) and at least one point.
pub fn load_gpx_file(file_name: &str, text: &str) -> Result<Track, UploadError> {
    if !has_gpx_extension(file_name) {
        return Err(UploadError::NotGpx(file_name.to_string()));
    }

    let track = parse_gpx(text);
    if !track.is_displayable() {
        return Err(UploadError::NoTrackData(file_name.to_string()));
    }

    info!("loaded {file_name}: {} points", track.points.len());
    Ok(track)
}

/// `<start>_<end>_<mode>`, e.g. `Seoul_Station_Busan_Station_walking`.
pub fn route_name(start: &str, end: &str, profile: Profile) -> String {
    format!(
        "{}_{}_{}",
        sanitize_file_name(start),
        sanitize_file_name(end),
        profile.label()
    )
}

/// Strip characters file systems reject, turn whitespace runs into `_`, and
/// collapse repeated underscores.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if FORBIDDEN_FILE_CHARS.contains(&ch) {
            continue;
        }
        let ch = if ch.is_whitespace() { '_' } else { ch };
        if ch == '_' && out.ends_with('_') {
            continue;
        }
        out.push(ch);
    }
    out
}

/// Download name for an entry: anything but letters, digits and whitespace
/// becomes `_`, and the name ends in `.gpx` exactly once.
pub fn download_file_name(name: &str) -> String {
    let stem = if has_gpx_extension(name) {
        &name[..name.len() - GPX_EXTENSION.len()]
    } else {
        name
    };
    let stem: String = stem
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.gpx")
}

fn has_gpx_extension(name: &str) -> bool {
    name.get(name.len().saturating_sub(GPX_EXTENSION.len())..)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(GPX_EXTENSION))
}

/// Loaded entries in insertion order, plus the one shown on the map.
#[derive(Debug, Default)]
pub struct GpxLibrary {
    files: Vec<GpxFile>,
    active: Option<u64>,
    next_id: u64,
}

impl GpxLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate, parse and add an uploaded file, making it the active entry.
    pub fn add_upload(
        &mut self,
        file_name: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<&GpxFile, UploadError> {
        let track = load_gpx_file(file_name, text)?;
        let id = self.allocate_id();
        Ok(self.push_active(GpxFile::from_upload(id, file_name, track, now)))
    }

    /// Add a generated route and make it the active entry.
    pub fn add_route(
        &mut self,
        labels: &[String],
        planned: &PlannedRoute,
        profile: Profile,
        now: DateTime<Utc>,
    ) -> &GpxFile {
        let id = self.allocate_id();
        self.push_active(GpxFile::from_planned_route(id, labels, planned, profile, now))
    }

    pub fn select(&mut self, id: u64) -> Option<&GpxFile> {
        let file = self.files.iter().find(|f| f.id == id)?;
        self.active = Some(id);
        Some(file)
    }

    /// Remove an entry; removing the active one leaves nothing selected.
    pub fn remove(&mut self, id: u64) -> Option<GpxFile> {
        let index = self.files.iter().position(|f| f.id == id)?;
        if self.active == Some(id) {
            self.active = None;
        }
        Some(self.files.remove(index))
    }

    pub fn get(&self, id: u64) -> Option<&GpxFile> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn active(&self) -> Option<&GpxFile> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn files(&self) -> &[GpxFile] {
        &self.files
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn push_active(&mut self, file: GpxFile) -> &GpxFile {
        self.active = Some(file.id);
        self.files.push(file);
        &self.files[self.files.len() - 1]
    }
}
