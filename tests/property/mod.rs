//! Property-based testing for packstream
//!
//! Uses proptest to check round trips, determinism and restartability
//! across randomly generated chunkings and trees.

use crate::integration::{flatten, listing, read_archive};
use ::packstream::*;
use proptest::prelude::*;

/// Arbitrary chunking of arbitrary bytes
fn chunks_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..2048), 0..8)
}

/// Valid entry names; a leading alphanumeric rules out "." and ".."
fn name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z0-9][a-z0-9._-]{0,30}",
        "[a-z][a-z0-9]{100,200}",
        "[a-zé][a-zé]{0,60}",
    ]
}

/// Small trees up to three levels deep
fn tree_strategy() -> impl Strategy<Value = FileNode> {
    let leaf = (name_strategy(), prop::collection::vec(any::<u8>(), 0..1500)).prop_map(|(name, data)| {
        FileNode::from(File::named(&name, Content::of_bytes(data)).unwrap())
    });

    leaf.prop_recursive(3, 24, 6, |inner| {
        (name_strategy(), prop::collection::vec(inner, 0..6)).prop_map(|(name, children)| {
            let mut directory = Directory::named(&name).unwrap();
            for child in children {
                directory = directory.add(child);
            }
            FileNode::from(directory)
        })
    })
}

fn encoder() -> Encode {
    Tar::encode(FrozenClock::at_unix(1_600_000_000))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_gzip_round_trip(chunks in chunks_strategy()) {
        let expected: Vec<u8> = chunks.concat();
        let input = Chunks::of(chunks.clone());

        let compressed = Gzip::compress().chunks(&input);
        let restored = Gzip::decompress().chunks(&compressed).to_vec().unwrap();
        prop_assert_eq!(restored, expected);

        // One output chunk per input chunk plus the trailer
        prop_assert_eq!(compressed.iter().count(), chunks.len() + 1);
    }

    #[test]
    fn prop_gzip_unicode_text(text in "\\PC{0,2048}") {
        let data = Gzip::compress().bytes(text.as_bytes()).unwrap();
        let restored = Gzip::decompress().bytes(&data).unwrap();
        prop_assert_eq!(String::from_utf8(restored).unwrap(), text);
    }

    #[test]
    fn prop_gzip_is_restartable(chunks in chunks_strategy()) {
        let compressed = Gzip::compress().chunks(&Chunks::of(chunks));
        let mut first = compressed.iter();
        let mut second = compressed.iter();

        let mut a = Vec::new();
        let mut b = Vec::new();
        loop {
            let x = first.next();
            let y = second.next();
            match (x, y) {
                (None, None) => break,
                (x, y) => {
                    if let Some(chunk) = x { a.extend_from_slice(&chunk.unwrap()); }
                    if let Some(chunk) = y { b.extend_from_slice(&chunk.unwrap()); }
                }
            }
        }
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_tar_extracts_to_same_tree(tree in tree_strategy()) {
        let archive = encoder().content(&tree).to_vec().unwrap();
        prop_assert_eq!(archive.len() % 512, 0);
        prop_assert_eq!(archive.len() as u64, encoder().archive_len(&tree).unwrap());

        let entries = read_archive(&archive).unwrap();
        prop_assert_eq!(listing(&entries), flatten(&tree));
        prop_assert!(entries.iter().all(|e| e.mtime == 1_600_000_000));
    }

    #[test]
    fn prop_tar_is_deterministic(tree in tree_strategy()) {
        let first = encoder().content(&tree).to_vec().unwrap();
        let second = encoder().content(&tree).to_vec().unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_tar_gzip_round_trip(tree in tree_strategy()) {
        let archive = encoder().file(&tree).unwrap();
        let compressed = Gzip::compress().file(&archive).unwrap();
        let restored = Gzip::decompress().file(&compressed);

        prop_assert_eq!(restored.name(), archive.name());
        prop_assert_eq!(
            restored.content().to_vec().unwrap(),
            archive.content().to_vec().unwrap()
        );
    }
}
