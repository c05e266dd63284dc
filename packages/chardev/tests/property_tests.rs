use std::sync::Arc;
use std::thread;

use proptest::prelude::*;

use chardev::{Chardev, ChardevClass, ChardevOpts, ChardevRegistry, StringChardev};

fn open_string(text: &str) -> Chardev {
    let dev = Chardev::new("serial0", Box::new(StringChardev::instantiate()));
    let backend = StringChardev::parse(&ChardevOpts::new("string").with("text", text)).unwrap();
    dev.open(&backend).unwrap();
    dev
}

fn read(dev: &Chardev, max_len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; max_len];
    let n = dev.sync_read(&mut buf).unwrap();
    assert!(n <= max_len);
    buf.truncate(n);
    buf
}

// Printable text without NUL, so the configured text is served in full
fn arb_text() -> impl Strategy<Value = String> {
    "[ -~\n\t]{0,200}"
}

// --- Sequential reads ---

proptest! {
    #[test]
    fn single_large_read_returns_everything(text in arb_text(), extra in 0usize..64) {
        let dev = open_string(&text);
        let got = read(&dev, text.len() + extra);
        prop_assert_eq!(got.as_slice(), text.as_bytes());
        prop_assert!(read(&dev, 16).is_empty());
    }

    #[test]
    fn reads_concatenate_to_prefix(text in arb_text(), sizes in prop::collection::vec(0usize..40, 0..20)) {
        let dev = open_string(&text);
        let mut collected = Vec::new();
        for &n in &sizes {
            collected.extend(read(&dev, n));
        }

        let expected = text.len().min(sizes.iter().sum());
        prop_assert_eq!(collected.as_slice(), &text.as_bytes()[..expected]);
        prop_assert_eq!(dev.as_string().unwrap().position().unwrap(), expected);
    }

    #[test]
    fn exhaustion_is_idempotent(text in arb_text(), max_len in 1usize..64, repeats in 1usize..8) {
        let dev = open_string(&text);
        read(&dev, text.len());
        let string = dev.as_string().unwrap();
        prop_assert!(string.is_exhausted().unwrap());

        for _ in 0..repeats {
            prop_assert!(read(&dev, max_len).is_empty());
            prop_assert_eq!(string.position().unwrap(), text.len());
        }
    }

    #[test]
    fn cursor_never_exceeds_text(text in arb_text(), sizes in prop::collection::vec(0usize..400, 1..10)) {
        let dev = open_string(&text);
        let string = dev.as_string().unwrap();
        for n in sizes {
            read(&dev, n);
            let pos = string.position().unwrap();
            prop_assert!(pos <= text.len());
            prop_assert_eq!(pos + string.remaining().unwrap(), text.len());
        }
    }
}

// --- Concurrent reads ---

// Text made of fixed-width record numbers, so any chunk-aligned piece
// identifies its own offset
fn numbered_text(records: usize) -> String {
    (0..records).map(|i| format!("{:04}", i)).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn concurrent_reads_partition_text(
        records in 0usize..200,
        readers in 2usize..6,
        chunk_records in 1usize..5,
    ) {
        let text = numbered_text(records);
        let chunk = chunk_records * 4;
        let dev = Arc::new(open_string(&text));

        let handles: Vec<_> = (0..readers)
            .map(|_| {
                let dev = dev.clone();
                thread::spawn(move || {
                    let mut pieces = Vec::new();
                    loop {
                        let mut buf = vec![0u8; chunk];
                        let n = dev.sync_read(&mut buf).unwrap();
                        if n == 0 {
                            break;
                        }
                        buf.truncate(n);
                        pieces.push(buf);
                    }
                    pieces
                })
            })
            .collect();

        let mut pieces: Vec<Vec<u8>> = Vec::new();
        for handle in handles {
            pieces.extend(handle.join().unwrap());
        }

        let total: usize = pieces.iter().map(Vec::len).sum();
        prop_assert_eq!(total, text.len());

        let mut spans = Vec::new();
        for piece in &pieces {
            let record: usize = std::str::from_utf8(&piece[..4]).unwrap().parse().unwrap();
            let start = record * 4;
            prop_assert_eq!(piece.as_slice(), &text.as_bytes()[start..start + piece.len()]);
            spans.push((start, piece.len()));
        }

        // No overlap, no gaps
        spans.sort();
        let mut expected = 0;
        for (start, len) in spans {
            prop_assert_eq!(start, expected);
            expected += len;
        }
        prop_assert_eq!(expected, text.len());
        prop_assert!(dev.as_string().unwrap().is_exhausted().unwrap());
    }
}

// --- Registry ---

proptest! {
    #[test]
    fn missing_text_never_registers(id in "[a-z][a-z0-9]{0,8}") {
        let registry = ChardevRegistry::with_builtin_types().unwrap();
        let opts = ChardevOpts::new("string").with("id", &id);
        prop_assert!(registry.create(&opts).is_err());
        prop_assert!(!registry.contains(&id));
    }
}
