use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use starsift::output::{read_csv_records, CsvSink};
use starsift::pipeline::{build_gravity_sources, extract_primary, join_coords, load_primary_table, CoordsJoinConfig, Provenance};
use starsift::{open_array, PipelineConfig, ScanOptions, StreamError};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

fn write_gz(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
    enc.write_all(body.as_bytes()).unwrap();
    enc.finish().unwrap();
    path
}

const BODIES: &str = r#"[
  {"id": 1, "id64": 900, "systemId": 27, "systemId64": 10477373803, "systemName": "Sol",
   "name": "Sol", "type": "Star", "subType": "G (White-Yellow) Star", "isMainStar": true,
   "distanceToArrival": 0, "updateTime": "2019-01-01 00:00:00"},
  {"id": 2, "systemId": 27, "systemName": "Sol", "name": "Earth", "type": "Planet",
   "subType": "Earth-like world", "distanceToArrival": 499},
  {"id": 3, "id64": 901, "systemId": 100, "systemName": "Sirius", "name": "Sirius B",
   "type": "Star", "subType": "White Dwarf (DA) Star", "isMainStar": false,
   "distanceToArrival": "12.5", "note": "binary {companion}"},
  {"id": 4, "systemId": 100, "systemName": "Sirius", "name": "Sirius", "type": "Star",
   "subType": "A (Blue-White) Star", "isMainStar": true, "distanceToArrival": 0},
  {"id": 5, "systemName": "Polaris", "name": "Polaris A", "type": "Star",
   "subType": "F (White) super giant Star", "parents": [{"Null": 0}]}
]"#;

const SYSTEMS: &str = r#"[
  {"id": 27, "id64": 10477373803, "name": "Sol", "coords": {"x": 0, "y": 0, "z": 0}, "date": "2015-05-12 15:29:33"},
  {"id": 100, "id64": 121, "name": "Sirius", "coords": {"x": 6.25, "y": -1.28125, "z": -5.75}},
  {"id": 555, "name": "Polaris", "coords": {"x": -22.4, "y": 321.5, "z": -1.2}},
  {"id": 556, "name": "Quote \" {brace}", "coords": {"x": 1, "y": 1, "z": 1}}
]"#;

#[test]
fn test_full_pipeline_over_gzip_dumps() {
    let dir = tempfile::tempdir().unwrap();
    let bodies_gz = write_gz(dir.path(), "bodies.json.gz", BODIES);
    let systems_gz = write_gz(dir.path(), "systems.json.gz", SYSTEMS);
    let config = PipelineConfig::default();

    // Pass 1: bodies
    let extract = extract_primary(open_array(&bodies_gz, &config.scan).unwrap(), &config).unwrap();
    assert_eq!(extract.summary.scanned, 5);
    assert_eq!(extract.primaries.len(), 3);
    assert_eq!(extract.grav_bodies.len(), 1);

    let primary_csv = dir.path().join("out/primary.csv");
    let interest_csv = dir.path().join("out/interest.csv");
    let mut sink = CsvSink::create(&primary_csv).unwrap();
    sink.write_rows(&extract.primaries).unwrap();
    sink.flush().unwrap();
    let mut sink = CsvSink::create(&interest_csv).unwrap();
    sink.write_rows(&extract.grav_bodies).unwrap();
    sink.flush().unwrap();

    // Pass 2: coordinate join, strict policy
    // Sorted by key kind, then key text: "100" sorts before "27"
    let rows = read_csv_records(&primary_csv).unwrap();
    let names: Vec<_> = rows.iter().map(|r| r["systemName"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Sirius", "Sol", "Polaris"]);
    assert_eq!(rows[0]["primaryStarName"], "Sirius");
    let (table, _) = load_primary_table(&rows);

    let joined_csv = dir.path().join("out/joined.csv");
    let mut sink = CsvSink::create(&joined_csv).unwrap();
    let systems = open_array(&systems_gz, &config.scan).unwrap();
    let report = join_coords(systems, &table, &config, &CoordsJoinConfig::default(), &mut sink).unwrap();
    drop(sink);

    assert_eq!(report.summary.scanned, 4);
    assert_eq!(report.join.via_id, 2);
    // Polaris carries id 555, which the primary table never saw
    assert_eq!(report.join.via_name, 0);
    assert_eq!(report.join.missed, 2);

    let joined = read_csv_records(&joined_csv).unwrap();
    assert_eq!(joined.len(), 4);
    assert_eq!(joined[1]["primary_star_name"], "Sirius");
    assert_eq!(joined[1]["primary_type"], "Star");
    assert_eq!(joined[3]["name"], "Quote \" {brace}");

    // Pass 3: gravity sources
    let interest = read_csv_records(&interest_csv).unwrap();
    let systems = open_array(&systems_gz, &config.scan).unwrap();
    let gravity = build_gravity_sources(&interest, systems, &config, Provenance::default()).unwrap();

    let sources = &gravity.document.sources;
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].id, "901");
    assert_eq!(sources[0].system, "Sirius");
    assert_eq!((sources[0].x, sources[0].y, sources[0].z), (6.25, -1.28125, -5.75));

    let json: Value = serde_json::to_value(&gravity.document).unwrap();
    assert_eq!(json["sources"][0]["kind"], "WD");
    assert_eq!(json["sources"][0]["weight"], 0.5);
}

#[test]
fn test_limit_caps_scanned_elements() {
    let dir = tempfile::tempdir().unwrap();
    let systems_gz = write_gz(dir.path(), "systems.json.gz", SYSTEMS);

    let options = ScanOptions::default().with_limit(2);
    let names: Vec<String> = open_array(&systems_gz, &options)
        .unwrap()
        .map(|r| r.unwrap()["name"].as_str().unwrap().to_string())
        .collect();

    assert_eq!(names, vec!["Sol", "Sirius"]);
}

#[test]
fn test_truncated_dump_aborts_pass() {
    let dir = tempfile::tempdir().unwrap();
    let cut = &BODIES[..BODIES.rfind('}').unwrap()];
    let bodies_gz = write_gz(dir.path(), "cut.json.gz", cut);

    let config = PipelineConfig::default();
    let err = extract_primary(open_array(&bodies_gz, &config.scan).unwrap(), &config).unwrap_err();

    match err.downcast_ref::<StreamError>() {
        Some(StreamError::Truncated { completed, .. }) => assert_eq!(*completed, 4),
        other => panic!("expected truncation, got {:?}", other),
    }
}

#[test]
fn test_non_array_dump_is_a_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gz(dir.path(), "object.json.gz", r#"{"systems": []}"#);

    let first = open_array(&path, &ScanOptions::default()).unwrap().next();
    assert!(matches!(first, Some(Err(StreamError::NotAnArray { found: Some(b'{') }))));
}

#[test]
fn test_plain_file_named_gz_fails_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fake.json.gz");
    std::fs::write(&path, SYSTEMS).unwrap();

    assert!(matches!(
        open_array(&path, &ScanOptions::default()),
        Err(StreamError::Gzip(_))
    ));
}

#[test]
fn test_corrupt_gzip_midstream_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_gz(dir.path(), "good.json.gz", SYSTEMS);
    let bytes = std::fs::read(&good).unwrap();

    // Keep the header and some deflate data, drop the rest (including the trailer)
    let path = dir.path().join("short.json.gz");
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    let result: Result<Vec<_>, _> = match open_array(&path, &ScanOptions::default()) {
        Ok(values) => values.collect(),
        Err(e) => Err(e),
    };
    // The codec fails before the scanner sees end of input, even mid-object
    assert!(matches!(result, Err(StreamError::Gzip(_))), "got {:?}", result.map(|v| v.len()));
}
