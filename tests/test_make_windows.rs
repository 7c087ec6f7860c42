mod common;
use common::{cfg, write_recording, write_seizures};
use exg_window::recording::Recording;
use exg_window::{
    dispatch, make_windows, open_raw, read_manifest, EdfOpener, FailureKind, RecordingRef,
    SafetensorsStore, WindowConfig, WindowStore,
};

#[test]
fn end_to_end_mixed_batch() {
    let tmp = tempfile::tempdir().unwrap();
    let raw_dir = tmp.path().join("raw");
    let out_dir = tmp.path().join("processed");
    let meta = tmp.path().join("metadata.csv");

    // 10 s @ 256 Hz → 7 windows, seizure 5–6 s labels windows 2..=5.
    let p1 = write_recording(&raw_dir.join("s01"), "p1", 3, 10, 256);
    write_seizures(&p1, &[(5.0, 6.0)]);
    // 8 s @ 200 Hz → 5 windows, no events.
    write_recording(&raw_dir.join("s02"), "n1", 2, 8, 200);
    // Unreadable.
    std::fs::write(raw_dir.join("bad.edf"), b"not an edf").unwrap();

    let summary = make_windows(&raw_dir, &out_dir, &meta, &cfg(2)).unwrap();
    let report = &summary.report;
    assert_eq!(summary.discovered, 3);
    assert_eq!((summary.positive, summary.negative), (1, 2));
    assert_eq!(report.processed, 2);
    assert_eq!(report.windows(), 12);
    assert_eq!(report.positives(), 4);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.failures[0].recording.id, "bad");
    assert_eq!(report.failures[0].kind, FailureKind::Read);
    assert!(!out_dir.join("bad").exists());

    let header = std::fs::read_to_string(&meta).unwrap();
    assert!(header.starts_with("filepath,label,recording,start,end\n"));
    assert!(!tmp.path().join("metadata.csv.tmp").exists());

    let rows = read_manifest(&meta).unwrap();
    assert_eq!(rows.len(), 12);
    let p1_labels: Vec<u8> = rows.iter().filter(|r| r.recording == "p1").map(|r| r.label).collect();
    assert_eq!(p1_labels, vec![0, 0, 1, 1, 1, 1, 0]);

    let store = SafetensorsStore::new(&out_dir);
    for row in &rows {
        let w = store.load(&row.filepath).unwrap();
        let n_ch = if row.recording == "p1" { 3 } else { 2 };
        assert_eq!(w.dim(), (n_ch, 800), "{}", row.filepath);
        approx::assert_abs_diff_eq!(row.end - row.start, 4.0, epsilon = 1e-9);
    }
}

#[test]
fn decimated_windows_keep_every_other_sample() {
    let tmp = tempfile::tempdir().unwrap();
    let raw_dir = tmp.path().join("raw");
    let out_dir = tmp.path().join("out");
    let path = write_recording(&raw_dir, "fast", 2, 5, 400);

    let summary = make_windows(&raw_dir, &out_dir, &tmp.path().join("m.csv"), &cfg(1)).unwrap();
    assert_eq!(summary.report.windows(), 2);

    let raw = open_raw(&path).unwrap();
    let seg = raw.read_slice(400, 400 + 1600).unwrap();
    let w = SafetensorsStore::new(&out_dir).load(&summary.report.rows[1].filepath).unwrap();
    assert_eq!(w.dim(), (2, 800));
    for c in 0..2 {
        for k in 0..800 {
            assert_eq!(w[[c, k]], seg[[c, 2 * k]] as f32);
        }
    }
}

#[test]
fn recording_shorter_than_a_window_yields_no_rows() {
    let tmp = tempfile::tempdir().unwrap();
    let raw_dir = tmp.path().join("raw");
    write_recording(&raw_dir, "short", 1, 3, 256);
    let meta = tmp.path().join("m.csv");

    let summary = make_windows(&raw_dir, &tmp.path().join("out"), &meta, &cfg(1)).unwrap();
    assert_eq!(summary.report.processed, 1);
    assert_eq!(summary.report.windows(), 0);
    assert!(read_manifest(&meta).unwrap().is_empty());
}

#[test]
fn empty_directory_is_error() {
    let tmp = tempfile::tempdir().unwrap();
    let raw_dir = tmp.path().join("raw");
    std::fs::create_dir_all(&raw_dir).unwrap();
    let meta = tmp.path().join("m.csv");
    assert!(make_windows(&raw_dir, &tmp.path().join("out"), &meta, &cfg(1)).is_err());
    assert!(!meta.exists());
}

#[test]
fn zero_per_class_cap_is_error_without_manifest() {
    let tmp = tempfile::tempdir().unwrap();
    let raw_dir = tmp.path().join("raw");
    write_recording(&raw_dir, "r", 1, 4, 200);
    let meta = tmp.path().join("m.csv");
    let cfg = WindowConfig { max_per_class: 0, ..cfg(1) };
    assert!(make_windows(&raw_dir, &tmp.path().join("out"), &meta, &cfg).is_err());
    assert!(!meta.exists());
}

#[test]
fn all_failures_is_error_without_manifest() {
    let tmp = tempfile::tempdir().unwrap();
    let raw_dir = tmp.path().join("raw");
    std::fs::create_dir_all(&raw_dir).unwrap();
    std::fs::write(raw_dir.join("a.edf"), b"junk").unwrap();
    std::fs::write(raw_dir.join("b.edf"), b"junk").unwrap();
    let meta = tmp.path().join("m.csv");
    assert!(make_windows(&raw_dir, &tmp.path().join("out"), &meta, &cfg(2)).is_err());
    assert!(!meta.exists());
}

#[test]
fn expired_deadline_abandons_recording() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_recording(&tmp.path().join("raw"), "slow", 1, 10, 256);
    let out_dir = tmp.path().join("out");
    let cfg = WindowConfig { recording_timeout_secs: Some(1e-9), ..cfg(1) };

    let store = SafetensorsStore::new(&out_dir);
    let report = dispatch(vec![RecordingRef::from_path(path)], &EdfOpener, &store, &cfg);
    assert_eq!(report.processed, 0);
    assert_eq!(report.failures[0].kind, FailureKind::Timeout);
    assert!(!out_dir.join("slow").exists());
}

#[test]
fn per_class_cap_limits_selection() {
    let tmp = tempfile::tempdir().unwrap();
    let raw_dir = tmp.path().join("raw");
    for i in 0..3 {
        let p = write_recording(&raw_dir, &format!("p{i}"), 1, 4, 200);
        write_seizures(&p, &[(1.0, 2.0)]);
        write_recording(&raw_dir, &format!("n{i}"), 1, 4, 200);
    }
    let cfg = WindowConfig { max_per_class: 2, ..cfg(2) };
    let summary = make_windows(&raw_dir, &tmp.path().join("out"), &tmp.path().join("m.csv"), &cfg).unwrap();
    assert_eq!((summary.positive, summary.negative), (2, 2));

    let mut ids: Vec<String> = summary.report.rows.iter().map(|r| r.recording.clone()).collect();
    ids.sort();
    assert_eq!(ids, vec!["n0", "n1", "p0", "p1"]);
    assert_eq!(summary.report.positives(), 2);
}
