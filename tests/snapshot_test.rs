use chrono::{DateTime, Duration, TimeZone, Utc};
use gpx_route_viewer::converter::track_to_feature_collection;
use gpx_route_viewer::gpx_types::{GeocodedAddress, Point};
use gpx_route_viewer::options::ConvertOptions;
use gpx_route_viewer::parser::parse_gpx;
use gpx_route_viewer::writer::to_gpx_at;
use std::path::Path;

fn load_fixture(path: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{path}")).unwrap()
}

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 15).unwrap() + Duration::milliseconds(250)
}

fn update_requested() -> bool {
    matches!(std::env::var("UPDATE_SNAPSHOTS").as_deref(), Ok("1"))
}

fn write_snapshot(path: &str, contents: &str) {
    let dir = Path::new(path).parent().unwrap();
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(path, contents.as_bytes()).unwrap();
    eprintln!("Updated snapshot: {path}");
}

fn read_snapshot(path: &str) -> String {
    std::fs::read_to_string(path)
        .unwrap_or_else(|_| panic!("Expected file not found: {path}. Run with UPDATE_SNAPSHOTS=1 to generate."))
}

/// Compare GeoJSON output against the expected snapshot file.
/// When `UPDATE_SNAPSHOTS=1` is set, write/overwrite the expected file instead.
fn assert_json_snapshot(actual: &serde_json::Value, expected_path: &str) {
    let path = format!("tests/fixtures/expected/{expected_path}");

    if update_requested() {
        write_snapshot(&path, &serde_json::to_string_pretty(actual).unwrap());
        return;
    }

    let expected: serde_json::Value = serde_json::from_str(&read_snapshot(&path))
        .unwrap_or_else(|e| panic!("Failed to parse {path}: {e}"));

    assert_eq!(
        *actual, expected,
        "Snapshot mismatch for {path}.\nRun with UPDATE_SNAPSHOTS=1 to update."
    );
}

/// Compare GPX text byte for byte, ignoring the file's trailing newline.
fn assert_text_snapshot(actual: &str, expected_path: &str) {
    let path = format!("tests/fixtures/expected/{expected_path}");

    if update_requested() {
        write_snapshot(&path, &format!("{actual}\n"));
        return;
    }

    let expected = read_snapshot(&path);
    assert_eq!(
        actual,
        expected.trim_end_matches('\n'),
        "Snapshot mismatch for {path}.\nRun with UPDATE_SNAPSHOTS=1 to update."
    );
}

fn assert_geojson_snapshot(fixture: &str, expected: &str) {
    let track = parse_gpx(&load_fixture(fixture));
    let fc = track_to_feature_collection(&track, &ConvertOptions::default());
    assert_json_snapshot(&serde_json::to_value(&fc).unwrap(), expected);
}

fn address(lat: f64, lng: f64, label: &str) -> GeocodedAddress {
    GeocodedAddress {
        lat,
        lng,
        label: label.to_string(),
    }
}

// ---- GeoJSON ----

#[test]
fn snapshot_01_route() {
    assert_geojson_snapshot("basic/01_route.gpx", "basic/01_route.geojson");
}

#[test]
fn snapshot_06_namespaced() {
    assert_geojson_snapshot(
        "edge_cases/06_namespaced.gpx",
        "edge_cases/06_namespaced.geojson",
    );
}

#[test]
fn snapshot_07_no_points() {
    assert_geojson_snapshot(
        "edge_cases/07_no_points.gpx",
        "edge_cases/07_no_points.geojson",
    );
}

// ---- GPX writer ----

#[test]
fn snapshot_writer_planned_route() {
    let points = [
        Point::new(37.5547, 126.9707),
        Point::new(36.3315, 127.4346),
        Point::new(35.1151, 129.0422),
    ];
    let addresses = [
        address(37.5547, 126.9707, "Seoul Station"),
        address(36.3315, 127.4346, "Daejeon Station"),
        address(35.1151, 129.0422, "Busan Station"),
    ];
    let gpx = to_gpx_at(
        &points,
        "서울역_부산역_driving",
        Some(&addresses[..]),
        fixed_time(),
    );
    assert_text_snapshot(&gpx, "writer/seoul_busan.gpx");
}

#[test]
fn snapshot_writer_escaped_without_keywords() {
    let points = [Point::new(-33.8568, 151.2153), Point::new(0.0, 0.0)];
    let gpx = to_gpx_at(&points, "A & B <loop>", Some(&[][..]), fixed_time());
    assert_text_snapshot(&gpx, "writer/escaped_no_keywords.gpx");
}
