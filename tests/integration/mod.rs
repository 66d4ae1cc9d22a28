//! Integration tests for packstream
//!
//! Archives are read back with the `tar` crate, an independent reader, so
//! these tests check what a standard tar tool would see rather than our own
//! view of the byte layout.

use ::packstream::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::io::Read;
use tempfile::TempDir;

/// Deterministic fixture content
pub struct FileGenerator {
    rng: StdRng,
}

impl FileGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Something shaped like a PDF: a text header then binary noise
    pub fn pdf(&mut self, len: usize) -> Vec<u8> {
        let mut data = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n".to_vec();
        let mut noise = vec![0u8; len.saturating_sub(data.len())];
        self.rng.fill(&mut noise[..]);
        data.extend_from_slice(&noise);
        data
    }

    /// Symfony-style application log
    pub fn log(&mut self, lines: usize) -> String {
        const LEVELS: &[&str] = &["DEBUG", "INFO", "NOTICE", "WARNING", "ERROR"];
        let mut out = String::new();
        for i in 0..lines {
            let level = LEVELS[self.rng.random_range(0..LEVELS.len())];
            let route = self.rng.random_range(0..200);
            out.push_str(&format!(
                "[2024-03-{:02} 12:{:02}:{:02}] request.{}: Matched route \"app_{}\". {{\"route\":\"app_{}\",\"method\":\"GET\"}} []\n",
                1 + i % 28,
                i % 60,
                (i * 7) % 60,
                level,
                route,
                route
            ));
        }
        out
    }
}

/// One entry as seen by an independent tar reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub is_directory: bool,
    pub mode: u32,
    pub mtime: u64,
    pub data: Vec<u8>,
}

/// Read every entry of `archive` with the `tar` crate
pub fn read_archive(archive: &[u8]) -> anyhow::Result<Vec<ArchiveEntry>> {
    let mut reader = ::tar::Archive::new(archive);
    let mut entries = Vec::new();

    for entry in reader.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.to_string_lossy().into_owned();
        let header = entry.header();
        let is_directory = header.entry_type().is_dir();
        let mode = header.mode()?;
        let mtime = header.mtime()?;

        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        entries.push(ArchiveEntry {
            path,
            is_directory,
            mode,
            mtime,
            data,
        });
    }

    Ok(entries)
}

/// Pre-order (path, file bytes) listing of a tree, `None` for directories
pub fn flatten(node: &FileNode) -> Vec<(String, Option<Vec<u8>>)> {
    fn walk(path: String, node: &FileNode, out: &mut Vec<(String, Option<Vec<u8>>)>) {
        match node {
            FileNode::File(file) => out.push((path, Some(file.content().to_vec().unwrap()))),
            FileNode::Directory(directory) => {
                out.push((path.clone(), None));
                for child in directory.iter() {
                    walk(format!("{}/{}", path, child.name()), child, out);
                }
            }
        }
    }

    let mut out = Vec::new();
    walk(node.name().to_string(), node, &mut out);
    out
}

/// Listing of an extracted archive in the same shape as [`flatten`]
pub fn listing(entries: &[ArchiveEntry]) -> Vec<(String, Option<Vec<u8>>)> {
    entries
        .iter()
        .map(|e| (e.path.clone(), if e.is_directory { None } else { Some(e.data.clone()) }))
        .collect()
}

/// Chain of directories with the given name lengths ending in a file
///
/// Each level uses a different letter so paths stay distinguishable.
pub fn nested(dir_lens: &[usize], leaf_len: usize, data: &str) -> FileNode {
    let letters = b"abcdefghijklmnopqrstuvwxyz";
    let leaf_name = "z".repeat(leaf_len);
    let mut node: FileNode = File::named(&leaf_name, Content::of_bytes(data.to_string()))
        .unwrap()
        .into();

    for (depth, len) in dir_lens.iter().enumerate().rev() {
        let letter = letters[depth % letters.len()] as char;
        let name = letter.to_string().repeat(*len);
        node = Directory::named(&name).unwrap().add(node).into();
    }
    node
}

fn encoder() -> Encode {
    Tar::encode(FrozenClock::at_unix(1_700_000_000))
}

fn fixtures(generator: &mut FileGenerator) -> Directory {
    Directory::named("fixtures")
        .unwrap()
        .add(File::named("amqp.pdf", Content::of_bytes(generator.pdf(120_000))).unwrap())
        .add(File::named("symfony.log", Content::of_bytes(generator.log(400))).unwrap())
}

#[test]
fn test_single_file_extracts() {
    let file = File::named("symfony.log", Content::of_bytes("[info] hello\n")).unwrap();
    let archive = encoder().content(&file.into()).to_vec().unwrap();
    let entries = read_archive(&archive).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, "symfony.log");
    assert_eq!(entries[0].data, b"[info] hello\n");
    assert_eq!(entries[0].mode, 0o644);
    assert_eq!(entries[0].mtime, 1_700_000_000);
}

#[test]
fn test_fixtures_directory_scenario() {
    let mut generator = FileGenerator::new(42);
    let tree: FileNode = fixtures(&mut generator).into();

    let archive = encoder().content(&tree).to_vec().unwrap();
    assert_eq!(archive.len() % 512, 0);
    assert_eq!(archive.len() as u64, encoder().archive_len(&tree).unwrap());

    let entries = read_archive(&archive).unwrap();
    let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["fixtures", "fixtures/amqp.pdf", "fixtures/symfony.log"]);
    assert!(entries[0].is_directory);
    assert_eq!(entries[0].mode, 0o755);
    assert_eq!(listing(&entries), flatten(&tree));
}

#[test]
fn test_tar_then_gzip_composes() {
    let mut generator = FileGenerator::new(7);
    let tree: FileNode = fixtures(&mut generator).into();

    let archive = encoder().file(&tree).unwrap();
    let compressed = Gzip::compress().file(&archive).unwrap();
    assert_eq!(compressed.name().as_str(), "fixtures.tar.gz");
    assert_eq!(compressed.media_type(), &MediaType::gzip());

    // Independent decoder
    let gz = compressed.content().to_vec().unwrap();
    let mut decoded = Vec::new();
    flate2::read::GzDecoder::new(&gz[..]).read_to_end(&mut decoded).unwrap();
    assert_eq!(decoded, archive.content().to_vec().unwrap());

    let restored = Gzip::decompress().file(&compressed);
    assert_eq!(restored.name().as_str(), "fixtures.tar");
    let entries = read_archive(&restored.content().to_vec().unwrap()).unwrap();
    assert_eq!(listing(&entries), flatten(&tree));
}

#[test]
fn test_long_file_names() {
    let mut directory = Directory::named("long").unwrap();
    for len in (101..=251).step_by(10) {
        let name = format!("{}.txt", "n".repeat(len - 4));
        directory = directory.add(File::named(&name, Content::of_bytes(format!("len {}", len))).unwrap());
    }
    let tree: FileNode = directory.into();

    let archive = encoder().content(&tree).to_vec().unwrap();
    let entries = read_archive(&archive).unwrap();
    assert_eq!(listing(&entries), flatten(&tree));
    assert!(entries.iter().skip(1).all(|e| e.path.len() > 100));
}

#[test]
fn test_nested_paths_beyond_512_bytes() {
    // 3 levels of 200-255 byte names give paths well over 512 bytes
    let tree = nested(&[200, 230, 255], 240, "deep");
    let archive = encoder().content(&tree).to_vec().unwrap();
    let entries = read_archive(&archive).unwrap();

    let leaf = entries.last().unwrap();
    assert_eq!(leaf.path.len(), 200 + 1 + 230 + 1 + 255 + 1 + 240);
    assert_eq!(leaf.data, b"deep");
    assert_eq!(listing(&entries), flatten(&tree));
}

#[test]
fn test_path_length_boundaries() {
    let cases: Vec<(FileNode, usize)> = vec![
        (nested(&[], 100, "a"), 100),
        (nested(&[], 101, "b"), 101),
        // 200 + 1 + 200 + 1 + 110
        (nested(&[200, 200], 110, "c"), 512),
        // 4 * (200 + 1) + 220
        (nested(&[200, 200, 200, 200], 220, "d"), 1024),
    ];

    for (tree, expected_len) in cases {
        let archive = encoder().content(&tree).to_vec().unwrap();
        assert_eq!(archive.len() % 512, 0);
        assert_eq!(archive.len() as u64, encoder().archive_len(&tree).unwrap());

        let entries = read_archive(&archive).unwrap();
        let leaf = entries.last().unwrap();
        assert_eq!(leaf.path.len(), expected_len);
        assert_eq!(listing(&entries), flatten(&tree));
    }
}

#[test]
fn test_filesystem_to_archive_and_back() {
    let source = TempDir::new().unwrap();
    let mut generator = FileGenerator::new(99);
    let dir = source.path().join("fixtures");
    fs::create_dir_all(dir.join("logs")).unwrap();
    fs::write(dir.join("amqp.pdf"), generator.pdf(50_000)).unwrap();
    fs::write(dir.join("logs").join("symfony.log"), generator.log(100)).unwrap();
    fs::write(dir.join("empty.txt"), "").unwrap();

    let config = PackConfig::default().with_read_chunk_size(4096);
    let fs_source = Filesystem::mount(source.path(), config.clone()).unwrap();
    let tree = fs_source.get(&Name::new("fixtures").unwrap()).unwrap().unwrap();

    let archive = Gzip::compress().file(&encoder().file(&tree).unwrap()).unwrap();
    let target = TempDir::new().unwrap();
    let fs_target = Filesystem::mount(target.path(), config).unwrap();
    fs_target.add(&archive.into()).unwrap();

    let gz = fs::read(target.path().join("fixtures.tar.gz")).unwrap();
    let unpacked = TempDir::new().unwrap();
    ::tar::Archive::new(flate2::read::GzDecoder::new(&gz[..]))
        .unpack(unpacked.path())
        .unwrap();

    for relative in ["amqp.pdf", "logs/symfony.log", "empty.txt"] {
        assert_eq!(
            fs::read(unpacked.path().join("fixtures").join(relative)).unwrap(),
            fs::read(dir.join(relative)).unwrap(),
            "{} differs",
            relative
        );
    }
}

#[test]
fn test_file_shrinking_on_disk_is_contract_violation() {
    let source = TempDir::new().unwrap();
    let path = source.path().join("symfony.log");
    fs::write(&path, "a".repeat(2048)).unwrap();

    let fs_source = Filesystem::mount(source.path(), PackConfig::default()).unwrap();
    let node = fs_source.get(&Name::new("symfony.log").unwrap()).unwrap().unwrap();
    fs::write(&path, "short").unwrap();

    let err = encoder().content(&node).to_vec().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ContractViolation);
}

#[test]
fn test_multi_chunk_content_stays_streamed() {
    let chunks: Vec<Vec<u8>> = (0..50).map(|i| vec![i as u8; 333]).collect();
    let expected: Vec<u8> = chunks.concat();
    let file = File::named("chunks.bin", Content::of_chunks(Chunks::of(chunks))).unwrap();

    let archive = encoder().content(&file.into());
    // No single chunk holds the whole archive
    assert!(archive.iter().all(|chunk| chunk.unwrap().len() < expected.len()));

    let entries = read_archive(&archive.to_vec().unwrap()).unwrap();
    assert_eq!(entries[0].data, expected);
}
