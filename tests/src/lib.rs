//! End-to-end tests driving the namespace through its public surface
//! only: create, write, flush, open, seek, slice, rename, delete.

#[cfg(test)]
mod namespace {
    use std::sync::Arc;
    use std::thread;

    use rand::{thread_rng, Rng};

    use kura_directory::{DirectoryConfig, MapDirectory};
    use kura_store::{open_store, SingleInstanceLockFactory};
    use kura_types::CHUNK_SIZE;
    use kura_utils::logger::install_fmt_log;

    fn fresh_directory(name: &str) -> MapDirectory {
        install_fmt_log();
        MapDirectory::open(&DirectoryConfig {
            store_dsn: format!("mem://:{name}"),
        })
        .unwrap()
    }

    fn random_payload(len: usize) -> Vec<u8> {
        let mut data = vec![0u8; len];
        thread_rng().fill(data.as_mut_slice());
        data
    }

    #[test]
    fn round_trip_across_chunk_boundaries() {
        let dir = fresh_directory("round-trip");
        for (i, len) in [
            0usize,
            1,
            CHUNK_SIZE - 1,
            CHUNK_SIZE,
            CHUNK_SIZE + 1,
            5 * CHUNK_SIZE,
            5 * CHUNK_SIZE + 321,
        ]
        .into_iter()
        .enumerate()
        {
            let name = format!("f{i}");
            let payload = random_payload(len);

            let mut writer = dir.create_output(&name).unwrap();
            writer.write_bytes(&payload);
            assert_eq!(writer.file_pointer(), len as u64);
            writer.close().unwrap();

            assert_eq!(dir.file_length(&name).unwrap(), len as u64);

            let mut reader = dir.open_input(&name).unwrap();
            assert_eq!(reader.length(), len as u64);
            let mut buf = vec![0u8; len];
            reader.read_bytes(&mut buf).unwrap();
            assert_eq!(buf, payload);
            assert!(reader.read_byte().is_err());
        }
    }

    #[test]
    fn round_trip_with_fragmented_writes() {
        let dir = fresh_directory("fragmented");
        let payload = random_payload(3 * CHUNK_SIZE + 11);

        let mut writer = dir.create_output("frag").unwrap();
        let mut rng = thread_rng();
        let mut written = 0;
        while written < payload.len() {
            let step = rng.gen_range(1..=257).min(payload.len() - written);
            writer.write_bytes(&payload[written..written + step]);
            written += step;
        }
        writer.close().unwrap();

        let mut reader = dir.open_input("frag").unwrap();
        let mut buf = vec![0u8; payload.len()];
        reader.read_bytes(&mut buf).unwrap();
        assert_eq!(buf, payload);
    }

    #[test]
    fn checksum_matches_reference_crc() {
        let dir = fresh_directory("crc");
        let payload = random_payload(2 * CHUNK_SIZE + 77);

        let mut one = dir.create_output("one").unwrap();
        one.write_bytes(&payload);

        let mut many = dir.create_output("many").unwrap();
        for b in &payload {
            many.write_byte(*b);
        }

        assert_eq!(one.checksum().unwrap(), many.checksum().unwrap());
        one.close().unwrap();
        many.close().unwrap();
    }

    // The scenario pinned by the storage contract: 2048 ascending bytes,
    // chunk size 1024.
    #[test]
    fn two_chunk_scenario() {
        let dir = fresh_directory("scenario");
        let payload: Vec<u8> = (0u32..2048).map(|i| (i % 256) as u8).collect();

        let mut writer = dir.create_output("seg").unwrap();
        writer.write_bytes(&payload);
        writer.close().unwrap();

        let mut reader = dir.open_input("seg").unwrap();
        reader.seek(1023);
        let mut pair = [0u8; 2];
        reader.read_bytes(&mut pair).unwrap();
        assert_eq!(pair, [(1023 % 256) as u8, (1024 % 256) as u8]);

        let mut tail = reader.slice("s", 1024, 1024).unwrap();
        assert_eq!(tail.read_byte().unwrap(), (1024 % 256) as u8);
    }

    #[test]
    fn rename_preserves_content_and_unmaps_source() {
        let dir = fresh_directory("rename");
        let payload = random_payload(CHUNK_SIZE + 13);

        let mut writer = dir.create_output("a").unwrap();
        writer.write_bytes(&payload);
        writer.close().unwrap();

        dir.rename_file("a", "b").unwrap();

        let mut reader = dir.open_input("b").unwrap();
        let mut buf = vec![0u8; payload.len()];
        reader.read_bytes(&mut buf).unwrap();
        assert_eq!(buf, payload);
        assert!(dir.open_input("a").is_err());
        assert_eq!(dir.list_all().unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn sliced_clones_share_one_snapshot() {
        let dir = fresh_directory("clones");
        let payload = random_payload(4 * CHUNK_SIZE);

        let mut writer = dir.create_output("shared").unwrap();
        writer.write_bytes(&payload);
        writer.close().unwrap();

        let reader = dir.open_input("shared").unwrap();
        let mut handles = Vec::new();
        for worker in 0..4 {
            let mut own = reader.clone();
            let expected = payload.clone();
            handles.push(thread::spawn(move || {
                let offset = worker * CHUNK_SIZE;
                own.seek(offset as u64);
                let mut buf = vec![0u8; CHUNK_SIZE];
                own.read_bytes(&mut buf).unwrap();
                assert_eq!(buf, expected[offset..offset + CHUNK_SIZE]);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn concurrent_writers_settle_the_counter() {
        let dir = Arc::new(fresh_directory("counter"));
        let per_file = CHUNK_SIZE + 1; // forces two chunks each

        let mut handles = Vec::new();
        for worker in 0..8 {
            let dir = dir.clone();
            handles.push(thread::spawn(move || {
                let name = format!("w{worker}");
                let mut writer = dir.create_output(&name).unwrap();
                writer.write_bytes(&vec![worker as u8; per_file]);
                writer.close().unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(dir.list_all().unwrap().len(), 8);
        assert_eq!(dir.ram_bytes_used().unwrap(), 8 * 2 * CHUNK_SIZE as i64);

        for worker in 0..8 {
            dir.delete_file(&format!("w{worker}")).unwrap();
        }
        assert_eq!(dir.ram_bytes_used().unwrap(), 0);
        assert!(dir.list_all().unwrap().is_empty());
    }

    #[test]
    fn two_handles_share_the_published_namespace() {
        let store = open_store("mem://:two-handles").unwrap();
        let producer =
            MapDirectory::new(store.clone(), Arc::new(SingleInstanceLockFactory::new()));
        let consumer = MapDirectory::new(store, Arc::new(SingleInstanceLockFactory::new()));

        let mut writer = producer.create_output("shared").unwrap();
        writer.write_bytes(b"visible after flush");
        // unflushed content stays private to the writer
        assert_eq!(consumer.file_length("shared").unwrap(), 0);

        writer.close().unwrap();
        assert_eq!(consumer.file_length("shared").unwrap(), 19);

        let mut reader = consumer.open_input("shared").unwrap();
        let mut buf = vec![0u8; 19];
        reader.read_bytes(&mut buf).unwrap();
        assert_eq!(&buf, b"visible after flush");
    }

    #[test]
    fn sync_is_a_no_op() {
        let dir = fresh_directory("sync");
        let mut writer = dir.create_output("f").unwrap();
        writer.write_bytes(b"x");
        writer.close().unwrap();
        dir.sync(&["f"]).unwrap();
        assert_eq!(dir.file_length("f").unwrap(), 1);
    }
}
