use flate2::read::GzDecoder;
use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Store file not found: {0}")]
    MissingFile(PathBuf),
    #[error("Invalid index entry on line {line}: '{content}'")]
    InvalidIndex { line: usize, content: String },
    #[error(
        "Entry '{identifier}' spans {length} bytes from offset {offset}, but the data file holds {available}"
    )]
    CorruptEntry {
        identifier: String,
        offset: u64,
        length: u64,
        available: u64,
    },
    #[error("Failed to decompress entry '{identifier}': {source}")]
    Decompress {
        identifier: String,
        source: io::Error,
    },
}

/// Locations of an index file and its data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub index: PathBuf,
    pub data: PathBuf,
}

impl StorePaths {
    pub fn new(index: impl Into<PathBuf>, data: impl Into<PathBuf>) -> Self {
        Self {
            index: index.into(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexEntry {
    offset: u64,
    length: u64,
}

/// A read-only view of an append-only flat-file store.
///
/// The index maps identifiers to byte ranges of the data file. Byte ranges are never
/// rewritten, so any number of readers may share a store while a single writer appends.
#[derive(Debug, Clone)]
pub struct ContentStore {
    paths: StorePaths,
    entries: HashMap<String, IndexEntry>,
    order: Vec<String>,
}

impl ContentStore {
    /// Loads the index of a store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingFile`] if either file is absent and
    /// [`StoreError::InvalidIndex`] for any line without an identifier, offset and length.
    pub fn open(paths: StorePaths) -> Result<Self, StoreError> {
        for path in [&paths.index, &paths.data] {
            if !path.is_file() {
                return Err(StoreError::MissingFile(path.clone()));
            }
        }

        let reader = BufReader::new(File::open(&paths.index)?);
        let mut entries = HashMap::new();
        let mut order = Vec::new();
        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let entry = parse_index_line(&line).ok_or_else(|| StoreError::InvalidIndex {
                line: line_num + 1,
                content: line.clone(),
            })?;
            let (identifier, entry) = entry;
            if entries.insert(identifier.to_string(), entry).is_none() {
                order.push(identifier.to_string());
            }
        }
        debug!(entries = entries.len(), index = %paths.index.display(), "Opened content store");

        Ok(Self {
            paths,
            entries,
            order,
        })
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifiers in the order they first appear in the index.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }

    /// Reads the raw bytes of an entry, `None` if the identifier is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CorruptEntry`] when the indexed byte range does not lie
    /// within the data file.
    pub fn read(&self, identifier: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let Some(entry) = self.entries.get(identifier) else {
            return Ok(None);
        };
        let mut file = File::open(&self.paths.data)?;
        let available = file.metadata()?.len();
        let fits = entry
            .offset
            .checked_add(entry.length)
            .is_some_and(|end| end <= available);
        if !fits {
            warn!(
                identifier,
                offset = entry.offset,
                length = entry.length,
                available,
                "Index entry exceeds the data file"
            );
            return Err(StoreError::CorruptEntry {
                identifier: identifier.to_string(),
                offset: entry.offset,
                length: entry.length,
                available,
            });
        }

        file.seek(SeekFrom::Start(entry.offset))?;
        let mut content = Vec::new();
        file.take(entry.length).read_to_end(&mut content)?;
        Ok(Some(content))
    }

    /// Copies an entry to `output`, returning `false` if the identifier is unknown.
    pub fn retrieve(&self, identifier: &str, output: &Path) -> Result<bool, StoreError> {
        match self.read(identifier)? {
            Some(content) => {
                fs::write(output, content)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Looks up `<identifier>.<suffix>`, gunzips it, and writes the result to `output`.
    pub fn retrieve_compressed(
        &self,
        identifier: &str,
        suffix: &str,
        output: &Path,
    ) -> Result<bool, StoreError> {
        let stored = format!("{}.{}", identifier, suffix);
        let Some(compressed) = self.read(&stored)? else {
            return Ok(false);
        };
        let mut content = Vec::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_end(&mut content)
            .map_err(|source| StoreError::Decompress {
                identifier: stored.clone(),
                source,
            })?;
        fs::write(output, content)?;
        Ok(true)
    }

    /// Appends the content of `source` as a new entry of the store at `paths`.
    ///
    /// Empty or missing sources are rejected with `false` and nothing is written.
    pub fn append(identifier: &str, source: &Path, paths: &StorePaths) -> Result<bool, StoreError> {
        if !source.is_file() {
            return Ok(false);
        }
        let content = fs::read(source)?;
        Self::append_bytes(identifier, &content, paths)
    }

    /// Appends raw bytes as a new entry; empty content is rejected with `false`.
    pub fn append_bytes(
        identifier: &str,
        content: &[u8],
        paths: &StorePaths,
    ) -> Result<bool, StoreError> {
        if content.is_empty() {
            return Ok(false);
        }
        let offset = match fs::metadata(&paths.data) {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        let mut data = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&paths.data)?;
        data.write_all(content)?;

        let mut index = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&paths.index)?;
        writeln!(index, "{}\t{}\t{}", identifier, offset, content.len())?;
        Ok(true)
    }

    /// Merges two stores into `output`.
    ///
    /// The store with the larger index is copied verbatim; every entry of the other one
    /// not already present is appended. Returns the number of entries added.
    pub fn merge(
        first: &StorePaths,
        second: &StorePaths,
        output: &StorePaths,
    ) -> Result<usize, StoreError> {
        let (base, extra) = if file_size(&first.index)? > file_size(&second.index)? {
            (first, second)
        } else {
            (second, first)
        };
        let base_store = Self::open(base.clone())?;
        let extra_store = Self::open(extra.clone())?;

        fs::copy(&base.index, &output.index)?;
        fs::copy(&base.data, &output.data)?;
        info!(entries = base_store.len(), "Copied base store");

        let mut added = 0;
        for identifier in extra_store.identifiers() {
            if base_store.contains(identifier) {
                debug!(identifier, "Skipping existing entry");
                continue;
            }
            if let Some(content) = extra_store.read(identifier)? {
                if Self::append_bytes(identifier, &content, output)? {
                    added += 1;
                }
            }
        }
        info!(added, "Merged stores");
        Ok(added)
    }

    /// Copies the listed entries, in sorted order, into the store at `output`.
    ///
    /// Unknown identifiers are skipped with a warning. Returns the number of entries copied.
    pub fn extract<'a>(
        &self,
        identifiers: impl IntoIterator<Item = &'a str>,
        output: &StorePaths,
    ) -> Result<usize, StoreError> {
        let sorted: BTreeSet<&str> = identifiers.into_iter().collect();
        let mut copied = 0;
        for identifier in sorted {
            match self.read(identifier)? {
                Some(content) => {
                    if Self::append_bytes(identifier, &content, output)? {
                        copied += 1;
                    }
                }
                None => warn!(identifier, "Entry not found in store"),
            }
        }
        info!(copied, "Extracted entries");
        Ok(copied)
    }
}

fn parse_index_line(line: &str) -> Option<(&str, IndexEntry)> {
    let mut cols = line.split_whitespace();
    let identifier = cols.next()?;
    let offset = cols.next()?.parse().ok()?;
    let length = cols.next()?.parse().ok()?;
    Some((identifier, IndexEntry { offset, length }))
}

fn file_size(path: &Path) -> Result<u64, StoreError> {
    if !path.is_file() {
        return Err(StoreError::MissingFile(path.to_path_buf()));
    }
    Ok(fs::metadata(path)?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tempfile::tempdir;

    fn store_in(dir: &Path, name: &str) -> StorePaths {
        StorePaths::new(dir.join(format!("{name}.index")), dir.join(format!("{name}.data")))
    }

    fn write_store(paths: &StorePaths, entries: &[(&str, &[u8])]) {
        for (identifier, content) in entries {
            assert!(ContentStore::append_bytes(identifier, content, paths).unwrap());
        }
    }

    #[test]
    fn retrieve_copies_exact_byte_range() {
        let dir = tempdir().unwrap();
        let paths = store_in(dir.path(), "db");
        let content: Vec<u8> = (0..120u8).collect();
        fs::write(&paths.index, "1ABC.pdb 0 120\n").unwrap();
        fs::write(&paths.data, &content).unwrap();

        let store = ContentStore::open(paths).unwrap();
        let output = dir.path().join("out.pdb");
        assert!(store.retrieve("1ABC.pdb", &output).unwrap());
        assert_eq!(fs::read(&output).unwrap(), content);
    }

    #[test]
    fn retrieve_reports_unknown_identifier() {
        let dir = tempdir().unwrap();
        let paths = store_in(dir.path(), "db");
        write_store(&paths, &[("a", b"alpha")]);

        let store = ContentStore::open(paths).unwrap();
        let output = dir.path().join("missing.out");
        assert!(!store.retrieve("b", &output).unwrap());
        assert!(!output.exists());
        assert_eq!(store.read("b").unwrap(), None);
    }

    #[test]
    fn append_records_offsets_and_tab_separated_index() {
        let dir = tempdir().unwrap();
        let paths = store_in(dir.path(), "db");
        write_store(&paths, &[("first", b"12345"), ("second", b"abc")]);

        let index = fs::read_to_string(&paths.index).unwrap();
        assert_eq!(index, "first\t0\t5\nsecond\t5\t3\n");

        let store = ContentStore::open(paths).unwrap();
        assert_eq!(store.read("second").unwrap(), Some(b"abc".to_vec()));
        assert_eq!(store.identifiers().collect::<Vec<_>>(), vec!["first", "second"]);
    }

    #[test]
    fn append_rejects_empty_or_missing_sources() {
        let dir = tempdir().unwrap();
        let paths = store_in(dir.path(), "db");
        let empty = dir.path().join("empty.txt");
        fs::write(&empty, b"").unwrap();

        assert!(!ContentStore::append("empty", &empty, &paths).unwrap());
        assert!(!ContentStore::append("missing", &dir.path().join("nope"), &paths).unwrap());
        assert!(!paths.index.exists());
        assert!(!paths.data.exists());
    }

    #[test]
    fn retrieved_content_round_trips_through_append() {
        let dir = tempdir().unwrap();
        let paths = store_in(dir.path(), "db");
        write_store(&paths, &[("orig", b"ATOM record\nTER\n")]);
        let store = ContentStore::open(paths.clone()).unwrap();

        let extracted = dir.path().join("orig.pdb");
        assert!(store.retrieve("orig", &extracted).unwrap());
        assert!(ContentStore::append("copy", &extracted, &paths).unwrap());

        let reopened = ContentStore::open(paths).unwrap();
        assert_eq!(
            reopened.read("copy").unwrap(),
            reopened.read("orig").unwrap()
        );
    }

    #[test]
    fn malformed_index_line_is_fatal() {
        let dir = tempdir().unwrap();
        let paths = store_in(dir.path(), "db");
        fs::write(&paths.index, "good\t0\t1\nbad\tx\t1\n").unwrap();
        fs::write(&paths.data, b"z").unwrap();

        match ContentStore::open(paths) {
            Err(StoreError::InvalidIndex { line, content }) => {
                assert_eq!(line, 2);
                assert_eq!(content, "bad\tx\t1");
            }
            other => panic!("unexpected result: {:?}", other.map(|s| s.len())),
        }
    }

    #[test]
    fn out_of_range_entries_are_corrupt() {
        let dir = tempdir().unwrap();
        let paths = store_in(dir.path(), "db");
        fs::write(
            &paths.index,
            format!("huge\t0\t{}\npast-end\t8\t4\nwraps\t{}\t2\nfits\t6\t4\n", u64::MAX, u64::MAX),
        )
        .unwrap();
        fs::write(&paths.data, b"0123456789").unwrap();

        let store = ContentStore::open(paths).unwrap();
        let output = dir.path().join("huge.out");
        match store.retrieve("huge", &output) {
            Err(StoreError::CorruptEntry {
                identifier,
                length,
                available,
                ..
            }) => {
                assert_eq!(identifier, "huge");
                assert_eq!(length, u64::MAX);
                assert_eq!(available, 10);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!output.exists());
        assert!(matches!(store.read("past-end"), Err(StoreError::CorruptEntry { .. })));
        assert!(matches!(store.read("wraps"), Err(StoreError::CorruptEntry { .. })));
        assert_eq!(store.read("fits").unwrap(), Some(b"6789".to_vec()));
    }

    #[test]
    fn open_requires_both_files() {
        let dir = tempdir().unwrap();
        let paths = store_in(dir.path(), "db");
        fs::write(&paths.index, "").unwrap();
        assert!(matches!(
            ContentStore::open(paths),
            Err(StoreError::MissingFile(_))
        ));
    }

    #[test]
    fn retrieve_compressed_gunzips_suffixed_entry() {
        let dir = tempdir().unwrap();
        let paths = store_in(dir.path(), "db");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"HEADER plain text\n").unwrap();
        let compressed = encoder.finish().unwrap();
        write_store(&paths, &[("pdb1abc.ent.gz", compressed.as_slice())]);

        let store = ContentStore::open(paths).unwrap();
        let output = dir.path().join("pdb1abc.ent");
        assert!(store.retrieve_compressed("pdb1abc.ent", "gz", &output).unwrap());
        assert_eq!(fs::read(&output).unwrap(), b"HEADER plain text\n");
        assert!(!store.retrieve_compressed("pdb9zzz.ent", "gz", &output).unwrap());
    }

    #[test]
    fn retrieve_compressed_rejects_corrupt_payload() {
        let dir = tempdir().unwrap();
        let paths = store_in(dir.path(), "db");
        write_store(&paths, &[("x.gz", b"not gzip at all")]);

        let store = ContentStore::open(paths).unwrap();
        let result = store.retrieve_compressed("x", "gz", &dir.path().join("x"));
        assert!(matches!(result, Err(StoreError::Decompress { .. })));
    }

    #[test]
    fn merge_copies_larger_store_and_appends_missing_entries() {
        let dir = tempdir().unwrap();
        let small = store_in(dir.path(), "small");
        let large = store_in(dir.path(), "large");
        let output = store_in(dir.path(), "merged");
        write_store(&small, &[("shared", b"small-version"), ("only-small", b"s")]);
        write_store(
            &large,
            &[("shared", b"large-version"), ("only-large", b"l"), ("another", b"a")],
        );

        let added = ContentStore::merge(&small, &large, &output).unwrap();
        assert_eq!(added, 1);

        let merged = ContentStore::open(output).unwrap();
        assert_eq!(merged.len(), 4);
        assert_eq!(merged.read("shared").unwrap(), Some(b"large-version".to_vec()));
        assert_eq!(merged.read("only-small").unwrap(), Some(b"s".to_vec()));
        assert_eq!(
            merged.identifiers().collect::<Vec<_>>(),
            vec!["shared", "only-large", "another", "only-small"]
        );
    }

    #[test]
    fn extract_copies_listed_entries_in_sorted_order() {
        let dir = tempdir().unwrap();
        let source = store_in(dir.path(), "source");
        let output = store_in(dir.path(), "subset");
        write_store(&source, &[("c", b"3"), ("a", b"1"), ("b", b"2")]);
        let store = ContentStore::open(source).unwrap();

        let copied = store.extract(["c", "a", "zz", "a"], &output).unwrap();
        assert_eq!(copied, 2);

        let subset = ContentStore::open(output).unwrap();
        assert_eq!(subset.identifiers().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(subset.read("c").unwrap(), Some(b"3".to_vec()));
    }
}
