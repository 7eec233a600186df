use clipstitch_pipeline::fsops::{LocalFs, MediaFs};
use clipstitch_pipeline::naming::FilePattern;
use clipstitch_pipeline::{organize, StitchError};
use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn touch(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, contents).expect("write file");
}

#[test]
fn organize_moves_camera_files_into_day_tree() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    touch(&root.join("DJI_20240315103000_0001_D.MP4"), "a");
    touch(&root.join("DJI_20240316081500_0002_D.mkv"), "b");
    touch(&root.join("notes.txt"), "keep");
    touch(&root.join("DJI_20240315103000_0003_D.mov"), "keep");

    let report = organize(root, &FilePattern::default(), &LocalFs::new()).expect("organize");

    assert_eq!(report.count(), 2);
    assert_eq!(
        fs::read_to_string(root.join("2024/03/15/103000.mp4")).expect("read"),
        "a"
    );
    assert_eq!(
        fs::read_to_string(root.join("2024/03/16/081500.mkv")).expect("read"),
        "b"
    );
    assert!(!root.join("DJI_20240315103000_0001_D.MP4").exists());
    assert!(root.join("notes.txt").exists());
    assert!(root.join("DJI_20240315103000_0003_D.mov").exists());
}

#[test]
fn organize_resolves_collisions_in_walk_order() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    touch(&root.join("DJI_20240315103000_0001_D.mp4"), "first");
    touch(&root.join("DJI_20240315103000_0002_D.MP4"), "second");
    touch(&root.join("sub/DJI_20240315103000_0003_D.mp4"), "third");

    let report = organize(root, &FilePattern::default(), &LocalFs::new()).expect("organize");

    let destinations: Vec<PathBuf> = report.moved.iter().map(|moved| moved.to.clone()).collect();
    let day = root.join("2024/03/15");
    assert_eq!(
        destinations,
        vec![
            day.join("103000.mp4"),
            day.join("103000_1.mp4"),
            day.join("103000_2.mp4"),
        ]
    );
    assert_eq!(fs::read_to_string(day.join("103000.mp4")).expect("read"), "first");
    assert_eq!(fs::read_to_string(day.join("103000_1.mp4")).expect("read"), "second");
    assert_eq!(fs::read_to_string(day.join("103000_2.mp4")).expect("read"), "third");
}

#[test]
fn organize_never_overwrites_existing_day_files() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    touch(&root.join("2024/03/15/103000.mp4"), "already here");
    touch(&root.join("DJI_20240315103000_0001_D.mp4"), "new");

    organize(root, &FilePattern::default(), &LocalFs::new()).expect("organize");

    let day = root.join("2024/03/15");
    assert_eq!(fs::read_to_string(day.join("103000.mp4")).expect("read"), "already here");
    assert_eq!(fs::read_to_string(day.join("103000_1.mp4")).expect("read"), "new");
}

#[test]
fn organize_is_idempotent() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    touch(&root.join("DJI_20240315103000_0001_D.mp4"), "a");

    let fs_ops = LocalFs::new();
    assert_eq!(organize(root, &FilePattern::default(), &fs_ops).expect("first").count(), 1);
    assert_eq!(organize(root, &FilePattern::default(), &fs_ops).expect("second").count(), 0);
    assert!(root.join("2024/03/15/103000.mp4").exists());
}

#[test]
fn organize_respects_glob_pattern() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    touch(&root.join("DJI_20240315103000_0001_D.mp4"), "a");
    touch(&root.join("DJI_20240315104000_0002_D.mkv"), "b");

    let pattern = FilePattern::new("DJI_*.[mM][pP]4").expect("pattern");
    let report = organize(root, &pattern, &LocalFs::new()).expect("organize");

    assert_eq!(report.count(), 1);
    assert!(root.join("2024/03/15/103000.mp4").exists());
    assert!(root.join("DJI_20240315104000_0002_D.mkv").exists());
}

struct FailSecondMove {
    inner: LocalFs,
    moves: Cell<usize>,
}

impl MediaFs for FailSecondMove {
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        self.inner.list_files(dir)
    }

    fn list_dirs(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        self.inner.list_dirs(dir)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        self.inner.create_dir_all(dir)
    }

    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        let count = self.moves.get() + 1;
        self.moves.set(count);
        if count == 2 {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        self.inner.move_file(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<bool> {
        self.inner.remove_file(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.inner.rename(from, to)
    }
}

#[test]
fn organize_stops_at_first_failed_move_without_rollback() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    touch(&root.join("DJI_20240315103000_0001_D.mp4"), "a");
    touch(&root.join("DJI_20240315104000_0002_D.mp4"), "b");
    touch(&root.join("DJI_20240315105000_0003_D.mp4"), "c");

    let fs_ops = FailSecondMove {
        inner: LocalFs::new(),
        moves: Cell::new(0),
    };
    let err = organize(root, &FilePattern::default(), &fs_ops).expect_err("second move fails");

    assert!(matches!(err, StitchError::Move { .. }));
    assert!(err.to_string().contains("DJI_20240315104000_0002_D.mp4"));
    assert!(root.join("2024/03/15/103000.mp4").exists());
    assert!(root.join("DJI_20240315104000_0002_D.mp4").exists());
    assert!(root.join("DJI_20240315105000_0003_D.mp4").exists());
}
