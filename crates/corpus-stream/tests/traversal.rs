use std::{collections::BTreeMap, io::Write, path::Path};

use corpus_index::{ID_LEN, IndexRecord, IndexStore, Location, ObjectId};
use corpus_stream::{
    DEFAULT_TIMEOUT, Driver, Fetcher, IndexedProvider, JsonHandler, ObjectProvider, ObjectRecord,
    SequentialProvider, archive::archive_file_name, archive_urls, drive, fetch_object,
};
use flate2::{Compression, write::GzEncoder};

fn write_archive(dir: &Path, name: &str, lines: &[String]) {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    for l in lines {
        enc.write_all(l.as_bytes()).unwrap();
        enc.write_all(b"\n").unwrap();
    }
    std::fs::write(dir.join(name), enc.finish().unwrap()).unwrap();
}

fn id_for(archive: u32, offset: u32) -> ObjectId {
    // spread keys so index order differs from (archive, offset) order
    let mut b = [0u8; ID_LEN];
    b[0] = (offset.wrapping_mul(37) % 251) as u8;
    b[1..5].copy_from_slice(&archive.to_be_bytes());
    b[5..9].copy_from_slice(&offset.to_be_bytes());
    ObjectId(b)
}

/// Archives 0, 1 and 1000 with 4, 1 and 6 lines. Every line is indexed
/// except line 2 of archive 0.
fn corpus(dir: &Path) -> Vec<IndexRecord> {
    let layout = [(0u32, 4u32), (1, 1), (1000, 6)];
    let mut records = Vec::new();
    for (archive, n) in layout {
        let lines: Vec<String> = (0..n)
            .map(|o| format!("{{\"archive\":{archive},\"line\":{o}}}"))
            .collect();
        write_archive(dir, &archive_file_name(archive), &lines);
        for offset in 0..n {
            if archive == 0 && offset == 2 {
                continue;
            }
            records.push(IndexRecord {
                id: id_for(archive, offset),
                location: Location { archive, offset },
            });
        }
    }
    records.sort_by_key(|r| r.id);

    let mut bytes = Vec::new();
    for r in &records {
        bytes.extend_from_slice(&r.encode());
    }
    std::fs::write(dir.join("index.bin"), bytes).unwrap();
    records
}

#[test]
fn indexed_walk_visits_every_location_once() {
    let dir = tempfile::tempdir().unwrap();
    let records = corpus(dir.path());
    let index = IndexStore::load(&dir.path().join("index.bin")).unwrap();
    index.verify_sorted().unwrap();
    assert_eq!(index.len(), records.len());

    let span = index.span();
    assert_eq!(span, BTreeMap::from([(0, 3), (1, 1), (1000, 6)]));
    assert_eq!(span.values().sum::<u64>(), index.len() as u64);

    let fetcher = Fetcher::new(DEFAULT_TIMEOUT).unwrap();
    let root = dir.path().to_str().unwrap();
    let mut provider = IndexedProvider::new(&index, root, &fetcher);

    let mut visited = Vec::new();
    let mut handler = JsonHandler::new(|v: serde_json::Value, r: &ObjectRecord| {
        // the line we landed on must be the one the index named
        assert_eq!(v["archive"].as_u64(), r.archive.map(u64::from));
        assert_eq!(v["line"].as_u64(), Some(u64::from(r.offset)));
        visited.push(Location {
            archive: r.archive.unwrap(),
            offset: r.offset,
        });
        Ok(())
    });
    let summary = drive(&mut provider, &mut handler).unwrap();
    drop(handler);

    assert_eq!(summary.failed, 0);
    assert_eq!(summary.delivered as usize, records.len());

    let mut expected: Vec<Location> = records.iter().map(|r| r.location).collect();
    expected.sort();
    visited.sort();
    assert_eq!(visited, expected);
}

#[test]
fn lookup_matches_every_source_record() {
    let dir = tempfile::tempdir().unwrap();
    let records = corpus(dir.path());
    let index = IndexStore::load(&dir.path().join("index.bin")).unwrap();

    for r in &records {
        assert_eq!(index.lookup(&r.id), Some(r.location));
    }
    // the unindexed line
    assert_eq!(index.lookup(&id_for(0, 2)), None);

    let fetcher = Fetcher::new(DEFAULT_TIMEOUT).unwrap();
    let root = dir.path().to_str().unwrap();
    let hit = fetch_object(&index, root, &fetcher, &id_for(1000, 5))
        .unwrap()
        .unwrap();
    assert_eq!(hit.payload, "{\"archive\":1000,\"line\":5}");
}

#[test]
fn sequential_walk_over_manifest() {
    let dir = tempfile::tempdir().unwrap();
    write_archive(dir.path(), "a1.gz", &["l0".to_string(), "l1".to_string()]);
    write_archive(
        dir.path(),
        "a2.gz",
        &["m0".to_string(), "m1".to_string(), "m2".to_string()],
    );
    std::fs::write(dir.path().join("manifest.txt"), "a1.gz\nREADME\na2.gz\n").unwrap();

    let fetcher = Fetcher::new(DEFAULT_TIMEOUT).unwrap();
    let root = dir.path().to_str().unwrap();
    let urls = archive_urls(&fetcher, root, r"\.gz$").unwrap();
    assert_eq!(urls.len(), 2);

    let mut provider = SequentialProvider::new(urls.clone(), &fetcher);
    let mut got = Vec::new();
    while let Some(r) = provider.next_object().unwrap() {
        got.push((r.source.to_string(), r.offset, r.payload));
    }
    let expected = vec![
        (urls[0].clone(), 0, "l0".to_string()),
        (urls[0].clone(), 1, "l1".to_string()),
        (urls[1].clone(), 0, "m0".to_string()),
        (urls[1].clone(), 1, "m1".to_string()),
        (urls[1].clone(), 2, "m2".to_string()),
    ];
    assert_eq!(got, expected);
    assert!(provider.next_object().unwrap().is_none());
    assert!(provider.next_object().unwrap().is_none());
}

#[test]
fn handler_failure_on_second_record_still_reaches_third() {
    let dir = tempfile::tempdir().unwrap();
    write_archive(
        dir.path(),
        "a.gz",
        &[
            "{\"n\":1}".to_string(),
            "not json".to_string(),
            "{\"n\":3}".to_string(),
        ],
    );

    let fetcher = Fetcher::new(DEFAULT_TIMEOUT).unwrap();
    let loc = dir.path().join("a.gz").to_str().unwrap().to_string();
    let mut provider = SequentialProvider::new([loc], &fetcher);

    let mut seen = Vec::new();
    let mut handler = JsonHandler::new(|v: serde_json::Value, _r: &ObjectRecord| {
        seen.push(v["n"].as_u64().unwrap());
        Ok(())
    });
    let summary = Driver::new()
        .progress_every(0)
        .run(&mut provider, &mut handler)
        .unwrap();
    drop(handler);

    assert_eq!(seen, vec![1, 3]);
    assert_eq!(summary.delivered, 3);
    assert_eq!(summary.failed, 1);
    assert!(provider.next_object().unwrap().is_none());
}

#[test]
fn archive_failure_policies_differ() {
    let dir = tempfile::tempdir().unwrap();
    write_archive(dir.path(), "good.gz", &["x".to_string()]);
    std::fs::write(dir.path().join("bad.gz"), b"not gzip at all").unwrap();
    let fetcher = Fetcher::new(DEFAULT_TIMEOUT).unwrap();
    let path = |n: &str| dir.path().join(n).to_str().unwrap().to_string();

    // sequential: the bad archive ends the stream, the good one after it is never read
    let mut seq = SequentialProvider::new([path("bad.gz"), path("good.gz")], &fetcher);
    let mut count = 0;
    let mut handler = |_: &ObjectRecord| -> anyhow::Result<()> {
        count += 1;
        Ok(())
    };
    let summary = drive(&mut seq, &mut handler).unwrap();
    assert_eq!(summary.delivered, 0);
    assert_eq!(count, 0);
    assert_eq!(seq.pending(), 1);

    // indexed: a missing archive is an error out of the driver
    let rec = IndexRecord {
        id: ObjectId([1; ID_LEN]),
        location: Location {
            archive: 7,
            offset: 0,
        },
    };
    let index = IndexStore::from_bytes(rec.encode().to_vec()).unwrap();
    let mut indexed = IndexedProvider::new(&index, dir.path().to_str().unwrap(), &fetcher);
    let mut noop = |_: &ObjectRecord| -> anyhow::Result<()> { Ok(()) };
    assert!(drive(&mut indexed, &mut noop).is_err());
}
