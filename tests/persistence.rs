mod common;

use common::*;
use fluxfox_stx::{
    persistence::{sidecar::encode_sidecar, sidecar_path},
    DiskCh,
    DiskChsn,
    DriveNotice,
    FdcBuffer,
    MemorySnapshot,
    OverlaySector,
    OverlayStore,
    SectorIdField,
    StxDrive,
    StxError,
    WriteKind,
};
use std::path::{Path, PathBuf};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, StxBuilder::new().track(two_sector_track()).build()).unwrap();
    path
}

#[test]
fn test_sidecar_round_trip() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let image_path = write_image(dir.path(), "game.stx");
    let overlay_path = dir.path().join("game.wd1772");

    let written: Vec<u8> = (0..512).map(|i| (i * 7) as u8).collect();

    let mut drive = StxDrive::new();
    drive.insert_path(&image_path).unwrap();
    assert!(drive.overlays().is_empty());

    locate_at_bit(&mut drive, 0, 0, 5000);
    assert!(drive.write_sector(0, 0, &written).is_ok());
    assert_eq!(
        drive.take_notices(),
        vec![DriveNotice::ChangesWillBeSaved {
            kind: WriteKind::Sector,
            path: overlay_path.clone(),
        }]
    );

    let image = drive.eject().unwrap();
    assert!(image.is_some());
    assert!(!drive.is_inserted());
    assert!(overlay_path.exists());

    // The image file itself is never written.
    let original = std::fs::read(&image_path).unwrap();
    assert_eq!(
        compute_slice_hash(&original),
        compute_slice_hash(&StxBuilder::new().track(two_sector_track()).build())
    );

    drive.insert_path(&image_path).unwrap();
    assert_eq!(drive.overlays().live_sector_count(), 1);
    assert!(!drive.contents_changed());

    locate_at_bit(&mut drive, 0, 0, 5000);
    let (data, status) = read_sector_bytes(&mut drive, 0, 0);
    assert!(status.is_ok());
    assert_eq!(compute_slice_hash(&data), compute_slice_hash(&written));

    // Sector A was not written.
    locate_at_bit(&mut drive, 0, 0, 100);
    let (data, _) = read_sector_bytes(&mut drive, 0, 0);
    assert_eq!(data, vec![0xAA; 512]);
}

#[test]
fn test_sidecar_saves_written_tracks() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let image_path = write_image(dir.path(), "track.stx");
    let formatted = format_track_bytes(0, 0, &[(1, 0x31), (2, 0x32)]);

    let mut drive = StxDrive::new();
    drive.insert_path(&image_path).unwrap();
    assert!(drive.write_track(0, 0, &formatted).is_ok());
    let mut before = FdcBuffer::new();
    drive.read_track(0, 0, &mut before);
    drive.eject().unwrap();

    drive.insert_path(&image_path).unwrap();
    assert_eq!(drive.overlays().track_count(), 1);
    assert_eq!(drive.overlays().tracks()[0].written, formatted);

    let mut after = FdcBuffer::new();
    drive.read_track(0, 0, &mut after);
    assert_eq!(after.values(), before.values());

    locate_at_bit(&mut drive, 0, 0, 5000);
    let (data, _) = read_sector_bytes(&mut drive, 0, 0);
    assert_eq!(data, vec![0x32; 512]);
}

#[test]
fn test_no_sidecar_without_changes() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let image_path = write_image(dir.path(), "clean.stx");

    let mut drive = StxDrive::new();
    drive.insert_path(&image_path).unwrap();
    let mut buf = FdcBuffer::new();
    drive.read_track(0, 0, &mut buf);
    drive.eject().unwrap();

    assert!(!dir.path().join("clean.wd1772").exists());
}

#[test]
fn test_invalid_sidecar_is_ignored() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let image_path = write_image(dir.path(), "bad.stx");
    std::fs::write(dir.path().join("bad.wd1772"), b"not an overlay file").unwrap();

    let mut drive = StxDrive::new();
    drive.insert_path(&image_path).unwrap();
    assert!(drive.is_inserted());
    assert!(drive.overlays().is_empty());

    locate_at_bit(&mut drive, 0, 0, 100);
    let (data, _) = read_sector_bytes(&mut drive, 0, 0);
    assert_eq!(data, vec![0xAA; 512]);
}

#[test]
fn test_sidecar_for_other_image_is_ignored() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let image_path = write_image(dir.path(), "other.stx");

    let mut store = OverlayStore::new();
    store
        .add_sector(OverlaySector {
            ch: DiskCh::new(0, 0),
            bit_position: 100,
            id: SectorIdField::with_valid_crc(DiskChsn::new(0, 0, 1, 2)),
            data: vec![0x11; 512],
        })
        .unwrap();
    store
        .add_sector(OverlaySector {
            ch: DiskCh::new(0, 0),
            bit_position: 1234,
            id: SectorIdField::with_valid_crc(DiskChsn::new(0, 0, 3, 2)),
            data: vec![0x33; 512],
        })
        .unwrap();
    std::fs::write(dir.path().join("other.wd1772"), encode_sidecar(&store).unwrap()).unwrap();

    let mut drive = StxDrive::new();
    drive.insert_path(&image_path).unwrap();
    assert!(drive.overlays().is_empty());
    assert!(drive.image().unwrap().tracks()[0].sectors().iter().all(|s| s.overlay().is_none()));

    // Even the matching entry is dropped.
    locate_at_bit(&mut drive, 0, 0, 100);
    let (data, _) = read_sector_bytes(&mut drive, 0, 0);
    assert_eq!(data, vec![0xAA; 512]);
}

#[test]
fn test_changes_without_sidecar_path() {
    init();
    let mut drive = StxDrive::new();
    let image = StxBuilder::new().track(two_sector_track()).image();
    drive.insert(image, Some(Path::new("archive/disk.msa")));

    locate_at_bit(&mut drive, 0, 0, 100);
    assert!(drive.write_sector(0, 0, &[0; 512]).is_ok());
    assert_eq!(
        drive.take_notices(),
        vec![DriveNotice::ChangesCannotBeSaved { kind: WriteKind::Sector }]
    );
    assert!(!drive.save_overlays().unwrap());
    assert!(drive.eject().unwrap().is_some());
}

#[test]
fn test_sidecar_naming() {
    init();
    assert_eq!(
        sidecar_path(Path::new("disks/Game.STX.gz")),
        Some(PathBuf::from("disks/Game.wd1772"))
    );
    assert_eq!(sidecar_path(Path::new("game.stx")), Some(PathBuf::from("game.wd1772")));
    assert_eq!(sidecar_path(Path::new("game.st")), None);
}

#[cfg(feature = "gzip")]
#[test]
fn test_gzip_image_sidecar() {
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    init();
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("packed.stx.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&StxBuilder::new().track(two_sector_track()).build())
        .unwrap();
    std::fs::write(&image_path, encoder.finish().unwrap()).unwrap();

    let mut drive = StxDrive::new();
    drive.insert_path(&image_path).unwrap();
    locate_at_bit(&mut drive, 0, 0, 100);
    assert!(drive.write_sector(0, 0, &[0x5A; 512]).is_ok());
    drive.eject().unwrap();

    assert!(dir.path().join("packed.wd1772").exists());
}

#[test]
fn test_memory_snapshot_round_trip() {
    init();
    let mut drive = StxBuilder::new().track(two_sector_track()).drive();
    locate_at_bit(&mut drive, 0, 0, 5000);
    assert!(drive.write_sector(0, 0, &[0x44; 512]).is_ok());

    let mut snapshot = MemorySnapshot::new_save();
    drive.memory_snapshot_capture(&mut snapshot).unwrap();
    let bytes = snapshot.into_bytes();

    // Restore into a fresh drive holding the same image.
    let mut restored = StxBuilder::new().track(two_sector_track()).drive();
    let mut snapshot = MemorySnapshot::from_bytes(bytes);
    restored.memory_snapshot_capture(&mut snapshot).unwrap();

    assert_eq!(restored.located(), drive.located());
    assert_eq!(restored.next_sector_id_sr(), 2);
    assert_eq!(restored.overlays().live_sector_count(), 1);

    // The located sector is read without locating again.
    let (data, status) = read_sector_bytes(&mut restored, 0, 0);
    assert!(status.is_ok());
    assert_eq!(data, vec![0x44; 512]);
}

#[test]
fn test_memory_snapshot_without_image() {
    init();
    let mut drive = StxBuilder::new().track(two_sector_track()).drive();
    locate_at_bit(&mut drive, 0, 0, 100);
    assert!(drive.write_sector(0, 0, &[0x44; 512]).is_ok());
    let mut snapshot = MemorySnapshot::new_save();
    drive.memory_snapshot_capture(&mut snapshot).unwrap();

    let mut empty = StxDrive::new();
    let mut snapshot = MemorySnapshot::from_bytes(snapshot.into_bytes());
    assert!(matches!(
        empty.memory_snapshot_capture(&mut snapshot),
        Err(StxError::OrphanedSector { c: 0, h: 0, bit_position: 100 })
    ));

    // A snapshot of an empty drive restores into an empty drive.
    let mut snapshot = MemorySnapshot::new_save();
    StxDrive::new().memory_snapshot_capture(&mut snapshot).unwrap();
    let mut snapshot = MemorySnapshot::from_bytes(snapshot.into_bytes());
    empty.memory_snapshot_capture(&mut snapshot).unwrap();
    assert!(empty.located().is_none());
    assert!(empty.overlays().is_empty());
}

#[test]
fn test_truncated_snapshot_is_rejected() {
    init();
    let mut drive = StxBuilder::new().track(two_sector_track()).drive();
    let mut snapshot = MemorySnapshot::new_save();
    drive.memory_snapshot_capture(&mut snapshot).unwrap();

    let mut bytes = snapshot.into_bytes();
    bytes.truncate(bytes.len() - 3);
    let mut snapshot = MemorySnapshot::from_bytes(bytes);
    assert!(drive.memory_snapshot_capture(&mut snapshot).is_err());
}
