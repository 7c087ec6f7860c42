mod common;
use common::{cfg, write_recording, write_seizures};
use exg_window::{make_windows, SafetensorsStore, WindowDataset, WindowStore};
use ndarray::s;

#[test]
fn loaded_windows_match_persisted_values() {
    let tmp = tempfile::tempdir().unwrap();
    let raw_dir = tmp.path().join("raw");
    let out_dir = tmp.path().join("processed");
    let meta = tmp.path().join("metadata.csv");
    let p = write_recording(&raw_dir, "chb01_03", 19, 6, 256);
    write_seizures(&p, &[(0.5, 1.5)]);
    make_windows(&raw_dir, &out_dir, &meta, &cfg(1)).unwrap();

    let ds = WindowDataset::open(&meta, 1.0, 64, SafetensorsStore::new(&out_dir)).unwrap();
    assert_eq!(ds.len(), 3);
    assert_eq!(ds.labels(), vec![1, 1, 0]);
    assert_eq!(ds.positive_count(), 2);

    let raw_store = SafetensorsStore::new(&out_dir);
    for i in 0..ds.len() {
        let (x, y) = ds.get(i).unwrap();
        assert_eq!(x.dim(), (64, 800));
        assert_eq!(y, f32::from(ds.rows()[i].label));
        let stored = raw_store.load(&ds.rows()[i].filepath).unwrap();
        assert_eq!(x.slice(s![..19, ..]), stored);
        assert!(x.slice(s![19.., ..]).iter().all(|&v| v == 0.0));
    }
}

#[test]
fn fewer_target_channels_truncates_tail() {
    let tmp = tempfile::tempdir().unwrap();
    let raw_dir = tmp.path().join("raw");
    let out_dir = tmp.path().join("processed");
    let meta = tmp.path().join("metadata.csv");
    write_recording(&raw_dir, "wide", 8, 4, 200);
    make_windows(&raw_dir, &out_dir, &meta, &cfg(1)).unwrap();

    let ds = WindowDataset::open(&meta, 1.0, 4, SafetensorsStore::new(&out_dir)).unwrap();
    let (x, y) = ds.get(0).unwrap();
    assert_eq!(x.dim(), (4, 800));
    assert_eq!(y, 0.0);
    let stored = SafetensorsStore::new(&out_dir).load(&ds.rows()[0].filepath).unwrap();
    assert_eq!(x, stored.slice(s![..4, ..]));
}

#[test]
fn subset_fraction_takes_leading_rows() {
    let tmp = tempfile::tempdir().unwrap();
    let raw_dir = tmp.path().join("raw");
    let out_dir = tmp.path().join("processed");
    let meta = tmp.path().join("metadata.csv");
    write_recording(&raw_dir, "r", 1, 10, 200);
    make_windows(&raw_dir, &out_dir, &meta, &cfg(1)).unwrap();

    let full = WindowDataset::open(&meta, 1.0, 64, SafetensorsStore::new(&out_dir)).unwrap();
    let half = WindowDataset::open(&meta, 0.5, 64, SafetensorsStore::new(&out_dir)).unwrap();
    assert_eq!(full.len(), 7);
    assert_eq!(half.len(), 3);
    assert_eq!(half.rows(), &full.rows()[..3]);
}

#[test]
fn missing_manifest_is_error() {
    let tmp = tempfile::tempdir().unwrap();
    let res = WindowDataset::open(&tmp.path().join("nope.csv"), 1.0, 64, SafetensorsStore::new(tmp.path()));
    assert!(res.is_err());
}
