use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::bullet_serializer::BulletSerializer;
use crate::diagnostics::DiagnosticSink;
use crate::errors::{AmmoError, DestinationError, DestinationErrorKind};
use crate::request_record::RequestRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub bullets: usize,
    pub bytes: u64,
}

/// Lazy, single pass sequence of bullets, one record serialized per step.
pub struct Bullets<'s, I> {
    serializer: BulletSerializer<'s>,
    records: std::iter::Enumerate<I>,
}

impl<'s, 'r, I> Iterator for Bullets<'s, I>
where
    I: Iterator<Item = &'r RequestRecord>,
{
    type Item = Result<String, AmmoError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (index, record) = self.records.next()?;
        Some(
            self.serializer
                .bullet(record)
                .map_err(|source| AmmoError::Serialization { index, source }),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

/// Writes the bullets of a request list to one ammo file.
///
/// The file is replaced atomically: bullets are streamed into a hidden
/// sibling file which is renamed over the destination (the symlink target,
/// if the destination is a link) once every record has been written. On failure the sibling is removed and the destination keeps
/// its previous content.
pub struct AmmoWriter<'a> {
    path: PathBuf,
    sink: Option<&'a dyn DiagnosticSink>,
}

impl<'a> AmmoWriter<'a> {
    pub fn new(path: impl Into<PathBuf>) -> AmmoWriter<'a> {
        AmmoWriter {
            path: path.into(),
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: &'a dyn DiagnosticSink) -> AmmoWriter<'a> {
        self.sink = Some(sink);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn check_destination(&self) -> Result<(), DestinationError> {
        check_writable(&self.path)
    }

    pub fn bullets<'r, I>(&self, records: I) -> Bullets<'a, I::IntoIter>
    where
        I: IntoIterator<Item = &'r RequestRecord>,
    {
        let serializer = match self.sink {
            Some(sink) => BulletSerializer::with_sink(sink),
            None => BulletSerializer::new(),
        };
        Bullets {
            serializer,
            records: records.into_iter().enumerate(),
        }
    }

    pub fn write<'r, I>(&self, records: I) -> Result<WriteSummary, AmmoError>
    where
        I: IntoIterator<Item = &'r RequestRecord>,
    {
        self.write_bullets(self.bullets(records))
    }

    /// Persists already framed bullets. The first `Err` aborts the batch and
    /// leaves the destination as it was.
    ///
    /// An existing destination is written through: symlinks are followed and
    /// the file keeps its permissions.
    pub fn write_bullets<I>(&self, bullets: I) -> Result<WriteSummary, AmmoError>
    where
        I: IntoIterator<Item = Result<String, AmmoError>>,
    {
        self.check_destination()?;
        let target = resolve_destination(&self.path)?;

        let part = part_path(&target);
        debug!("writing bullets to {}", part.display());
        let summary = match self.write_part(&part, bullets) {
            Ok(summary) => summary,
            Err(err) => {
                remove_part(&part);
                return Err(err);
            }
        };

        if let Ok(meta) = fs::metadata(&target) {
            fs::set_permissions(&part, meta.permissions()).map_err(|err| {
                remove_part(&part);
                DestinationError::io(&target, err)
            })?;
        }
        fs::rename(&part, &target).map_err(|err| {
            remove_part(&part);
            DestinationError::io(&target, err)
        })?;
        info!(
            bullets = summary.bullets,
            bytes = summary.bytes,
            "ammo saved to {}",
            self.path.display()
        );
        Ok(summary)
    }

    fn write_part<I>(&self, part: &Path, bullets: I) -> Result<WriteSummary, AmmoError>
    where
        I: IntoIterator<Item = Result<String, AmmoError>>,
    {
        let io_error = |err: std::io::Error| AmmoError::from(DestinationError::io(part, err));
        let file = File::create(part).map_err(io_error)?;
        let mut out = BufWriter::new(file);
        let mut summary = WriteSummary::default();

        for bullet in bullets {
            let bullet = bullet?;
            out.write_all(bullet.as_bytes()).map_err(io_error)?;
            summary.bullets += 1;
            summary.bytes += bullet.len() as u64;
        }

        let file = out.into_inner().map_err(|err| io_error(err.into_error()))?;
        file.sync_all().map_err(io_error)?;
        Ok(summary)
    }
}

impl std::fmt::Debug for AmmoWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmmoWriter")
            .field("path", &self.path)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

/// Fails unless `path` names a file that can be created or overwritten.
pub fn check_writable(path: &Path) -> Result<(), DestinationError> {
    if path.as_os_str().is_empty() {
        return Err(DestinationError::new(path, DestinationErrorKind::ParentMissing));
    }
    if path.is_dir() {
        return Err(DestinationError::new(path, DestinationErrorKind::IsDirectory));
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let parent_meta = match fs::metadata(parent) {
        Ok(meta) if meta.is_dir() => meta,
        Ok(_) => return Err(DestinationError::new(path, DestinationErrorKind::ParentMissing)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(DestinationError::new(path, DestinationErrorKind::ParentMissing))
        }
        Err(err) => return Err(DestinationError::io(path, err)),
    };
    if parent_meta.permissions().readonly() {
        return Err(DestinationError::new(path, DestinationErrorKind::NotWritable));
    }

    match fs::metadata(path) {
        Ok(meta) if meta.permissions().readonly() => {
            Err(DestinationError::new(path, DestinationErrorKind::NotWritable))
        }
        Ok(_) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(DestinationError::io(path, err)),
    }
}

/// The file that actually gets replaced: an existing destination is resolved
/// through symlinks, a missing one is used as given.
fn resolve_destination(path: &Path) -> Result<PathBuf, DestinationError> {
    match fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(err) => Err(DestinationError::io(path, err)),
    }
}

fn part_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ammo".to_string());
    path.with_file_name(format!(".{}.{}.part", name, Uuid::new_v4().simple()))
}

fn remove_part(part: &Path) {
    if let Err(err) = fs::remove_file(part) {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!("couldn't remove {}: {}", part.display(), err);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::errors::SerializationError;
    use crate::request_record::HttpMethod;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("phantom-ammo-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn records(count: usize) -> Vec<RequestRecord> {
        (0..count)
            .map(|i| {
                RequestRecord::new("localhost", format!("/item/{}", i), HttpMethod::Get)
                    .unwrap()
                    .with_case(format!("case{}", i))
            })
            .collect()
    }

    #[test]
    fn bullets_are_lazy_and_ordered() {
        let records = records(3);
        let writer = AmmoWriter::new("unused");
        let mut bullets = writer.bullets(&records);
        assert_eq!(bullets.size_hint(), (3, Some(3)));
        let first = bullets.next().unwrap().unwrap();
        assert!(first.contains(" case0\nGET /item/0 HTTP/1.1\r\n"));
        let rest: Vec<String> = bullets.map(Result::unwrap).collect();
        assert_eq!(rest.len(), 2);
        assert!(rest[1].contains(" case2\n"));
    }

    #[test]
    fn writes_all_bullets_in_order() {
        let dir = scratch_dir();
        let path = dir.join("ammo");
        let records = records(5);
        let summary = AmmoWriter::new(&path).write(&records).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let expected: String = AmmoWriter::new(&path)
            .bullets(&records)
            .map(Result::unwrap)
            .collect();
        assert_eq!(content, expected);
        assert_eq!(summary.bullets, 5);
        assert_eq!(summary.bytes, content.len() as u64);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn overwrites_previous_content() {
        let dir = scratch_dir();
        let path = dir.join("ammo");
        fs::write(&path, "stale content that is longer than nothing").unwrap();
        AmmoWriter::new(&path).write(&Vec::<RequestRecord>::new()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn no_part_file_is_left_behind() {
        let dir = scratch_dir();
        AmmoWriter::new(dir.join("ammo")).write(&records(2)).unwrap();
        let names: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["ammo"]);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_parent_is_rejected() {
        let dir = scratch_dir();
        let err = AmmoWriter::new(dir.join("missing").join("ammo"))
            .write(&records(1))
            .unwrap_err();
        match err {
            AmmoError::Destination(err) => assert_eq!(err.kind, DestinationErrorKind::ParentMissing),
            other => panic!("unexpected error {:?}", other),
        }
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn directory_destination_is_rejected() {
        let dir = scratch_dir();
        let err = check_writable(&dir).unwrap_err();
        assert_eq!(err.kind, DestinationErrorKind::IsDirectory);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn bare_file_name_uses_current_directory() {
        assert!(check_writable(Path::new("some-ammo-file-that-does-not-exist")).is_ok());
    }

    #[test]
    fn sink_sees_every_bullet() {
        let dir = scratch_dir();
        let lines = RefCell::new(Vec::new());
        let sink = |line: &str| lines.borrow_mut().push(line.to_string());
        AmmoWriter::new(dir.join("ammo"))
            .with_sink(&sink)
            .write(&records(4))
            .unwrap();
        let lines = lines.into_inner();
        assert_eq!(lines.len(), 4);
        assert!(lines[3].contains("case3, GET /item/3 HTTP/1.1, "));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn failure_mid_batch_keeps_previous_file() {
        let dir = scratch_dir();
        let path = dir.join("ammo");
        fs::write(&path, "previous ammo").unwrap();
        let writer = AmmoWriter::new(&path);
        let records = records(3);
        let broken = SerializationError {
            case: "case1".to_string(),
            source: serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        };
        let bullets = writer
            .bullets(&records[..1])
            .chain([Err(AmmoError::Serialization { index: 1, source: broken })])
            .chain(writer.bullets(&records[2..]));

        let err = writer.write_bullets(bullets).unwrap_err();

        match &err {
            AmmoError::Serialization { index, source } => {
                assert_eq!(*index, 1);
                assert_eq!(source.case, "case1");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.to_string().starts_with("request #1: body of case `case1`"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous ammo");
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);
        fs::remove_dir_all(dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_destination_is_written_through() {
        let dir = scratch_dir();
        let real = dir.join("real_ammo");
        let link = dir.join("ammo");
        fs::write(&real, "old").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        AmmoWriter::new(&link).write(&records(2)).unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        let content = fs::read_to_string(&real).unwrap();
        assert!(content.contains(" case1\nGET /item/1 HTTP/1.1\r\n"));
        assert_eq!(fs::read_to_string(&link).unwrap(), content);
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 2);
        fs::remove_dir_all(dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn existing_permissions_are_kept() {
        use std::os::unix::fs::PermissionsExt;

        let dir = scratch_dir();
        let path = dir.join("ammo");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        AmmoWriter::new(&path).write(&records(1)).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
        fs::remove_dir_all(dir).unwrap();
    }
}
