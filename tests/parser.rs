mod common;

use common::*;
use fluxfox_stx::{image::TimingSource, DiskCh, DiskChsn, ImagingTool, StxError, StxImage, TrackFlags};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_parse_two_sector_track() {
    init();
    let image = StxBuilder::new().track(two_sector_track()).image();

    assert_eq!(image.version(), 3);
    assert_eq!(image.revision(), 2);
    assert_eq!(image.imaging_tool(), ImagingTool::AtariTool);
    assert_eq!(image.tracks().len(), 1);

    let track = image.track(DiskCh::new(0, 0)).unwrap();
    assert!(track.flags().contains(TrackFlags::SECTOR_BLOCK));
    assert!(!track.is_simple());
    assert_eq!(track.byte_length(), 6250);
    assert!(track.track_image().is_none());

    let sectors = track.sectors();
    assert_eq!(sectors.len(), 2);
    assert_eq!(sectors[0].bit_position(), 100);
    assert_eq!(sectors[1].bit_position(), 5000);
    assert_eq!(sectors[0].id().chsn, DiskChsn::new(0, 0, 1, 2));
    assert!(sectors[0].id().crc_valid());
    assert_eq!(sectors[0].size(), 512);

    let a = image.original_data(&sectors[0]).unwrap();
    let b = image.original_data(&sectors[1]).unwrap();
    assert!(a.bytes().iter().all(|&x| x == 0xAA));
    assert!(b.bytes().iter().all(|&x| x == 0xBB));
    assert!(!a.is_overlay());
}

#[test]
fn test_sectors_are_sorted_by_position() {
    init();
    let track = TestTrack::new(
        1,
        1,
        vec![
            TestSector::new(5000, DiskChsn::new(1, 1, 2, 2), 0x22),
            TestSector::new(100, DiskChsn::new(1, 1, 1, 2), 0x11),
            TestSector::new(3000, DiskChsn::new(1, 1, 9, 2), 0x99),
        ],
    );
    let image = StxBuilder::new().track(track).image();
    let track = image.track(DiskCh::new(1, 1)).unwrap();

    let positions: Vec<u16> = track.sectors().iter().map(|s| s.bit_position()).collect();
    assert_eq!(positions, vec![100, 3000, 5000]);

    // Data still follows its sector after sorting.
    let first = image.original_data(&track.sectors()[0]).unwrap();
    assert_eq!(first.bytes()[0], 0x11);
    let middle = image.original_data(&track.sectors()[1]).unwrap();
    assert_eq!(middle.bytes()[0], 0x99);
}

#[test]
fn test_bad_magic_is_unknown_format() {
    init();
    let mut buf = StxBuilder::new().track(two_sector_track()).build();
    buf[0] = b'X';
    assert!(matches!(StxImage::from_bytes(buf), Err(StxError::UnknownFormat)));

    assert!(matches!(StxImage::from_bytes(b"RSY".to_vec()), Err(StxError::UnknownFormat)));
    assert!(matches!(StxImage::from_bytes(Vec::new()), Err(StxError::UnknownFormat)));
}

#[test]
fn test_truncated_image_is_corrupt() {
    init();
    let buf = StxBuilder::new().track(two_sector_track()).build();

    // Header cut short.
    assert!(matches!(
        StxImage::from_bytes(buf[..10].to_vec()),
        Err(StxError::ImageCorrupt(_))
    ));

    // Track block cut short.
    let cut = buf[..buf.len() - 100].to_vec();
    assert!(matches!(StxImage::from_bytes(cut), Err(StxError::ImageCorrupt(_))));
}

#[test]
fn test_data_offset_out_of_range_is_corrupt() {
    init();
    let mut buf = StxBuilder::new().track(two_sector_track()).build();
    // The first sector record follows the file header and the track header.
    buf[32..36].copy_from_slice(&0x0000_FFFFu32.to_le_bytes());
    assert!(matches!(StxImage::from_bytes(buf), Err(StxError::ImageCorrupt(_))));
}

#[test]
fn test_block_size_too_small_is_corrupt() {
    init();
    let mut buf = StxBuilder::new().track(two_sector_track()).build();
    buf[16..20].copy_from_slice(&8u32.to_le_bytes());
    assert!(matches!(StxImage::from_bytes(buf), Err(StxError::ImageCorrupt(_))));
}

#[test]
fn test_simple_track_layout() {
    init();
    let raw: Vec<Vec<u8>> = (0..9u8).map(|i| vec![i; 512]).collect();
    let image = StxBuilder::new().track(TestTrack::simple(4, 1, raw)).image();
    let track = image.track(DiskCh::new(4, 1)).unwrap();

    assert!(track.is_simple());
    // The MFM size of a simple track is stored in bits.
    assert_eq!(track.byte_length(), 6250);
    assert_eq!(track.sectors().len(), 9);

    for (i, sector) in track.sectors().iter().enumerate() {
        assert_eq!(sector.bit_position() as usize, (76 + i * 614) * 8);
        assert_eq!(sector.id().chsn, DiskChsn::new(4, 1, i as u8 + 1, 2));
        assert!(sector.id().crc_valid());
        assert!(sector.status().is_empty());

        let data = image.original_data(sector).unwrap();
        assert_eq!(data.bytes().len(), 512);
        assert!(data.bytes().iter().all(|&b| b == i as u8));
    }
}

#[test]
fn test_simple_track_position_overflow() {
    init();
    let fits: Vec<Vec<u8>> = vec![vec![0; 512]; 14];
    let image = StxBuilder::new().track(TestTrack::simple(0, 0, fits)).image();
    assert_eq!(image.tracks()[0].sectors().last().unwrap().bit_position(), 64464);

    let too_many: Vec<Vec<u8>> = vec![vec![0; 512]; 15];
    let buf = StxBuilder::new().track(TestTrack::simple(0, 0, too_many)).build();
    assert!(matches!(StxImage::from_bytes(buf), Err(StxError::ImageCorrupt(_))));
}

#[test]
fn test_unexpected_version_still_parses() {
    init();
    let image = StxBuilder::new().version(2).track(two_sector_track()).image();
    assert_eq!(image.version(), 2);
    assert_eq!(image.tracks()[0].sectors().len(), 2);
}

#[test]
fn test_timing_table_sources() {
    init();
    let words: Vec<u16> = (0..32).map(|i| 0x7F + i).collect();
    let track = TestTrack::new(
        0,
        0,
        vec![
            TestSector::new(100, DiskChsn::new(0, 0, 1, 2), 0x00).with_timing(&words),
            TestSector::new(5000, DiskChsn::new(0, 0, 2, 2), 0x00),
        ],
    );

    let image = StxBuilder::new().revision(2).track(track.clone()).image();
    let sectors = image.tracks()[0].sectors();
    match sectors[0].timing_source() {
        TimingSource::Table(range) => {
            assert_eq!(range.len(), 64);
            let table = &image.buffer()[range.clone()];
            assert_eq!(u16::from_be_bytes([table[0], table[1]]), 0x7F);
            assert_eq!(u16::from_be_bytes([table[62], table[63]]), 0x7F + 31);
        }
        other => panic!("Expected a timing table, got {:?}", other),
    }
    assert_eq!(sectors[1].timing_source(), &TimingSource::None);

    // Older revisions carry no table, so the built-in one applies.
    let image = StxBuilder::new().revision(0).track(track).image();
    let sectors = image.tracks()[0].sectors();
    assert_eq!(sectors[0].timing_source(), &TimingSource::Default);
    assert_eq!(sectors[1].timing_source(), &TimingSource::None);
}

#[test]
fn test_track_image_with_sync() {
    init();
    let dump: Vec<u8> = (0..6256).map(|i| (i % 251) as u8).collect();
    let track = two_sector_track().with_image(Some(0x0123), dump.clone());
    let image = StxBuilder::new().track(track).image();
    let track = &image.tracks()[0];

    assert!(track.flags().contains(TrackFlags::TRACK_IMAGE | TrackFlags::TRACK_IMAGE_SYNC));
    let track_image = track.track_image().unwrap();
    assert_eq!(track_image.sync_position(), 0x0123);
    assert_eq!(track_image.len(), 6256);
    assert_eq!(track.byte_length(), 6256);
    assert_eq!(image.track_image_bytes(track).unwrap(), &dump[..]);

    // Sector data is found after the track image.
    let a = image.original_data(&track.sectors()[0]).unwrap();
    assert!(a.bytes().iter().all(|&x| x == 0xAA));
}

#[test]
fn test_track_image_without_sectors() {
    init();
    let dump = vec![0x4E; 6000];
    let track = TestTrack::new(2, 0, Vec::new()).with_image(None, dump);
    let image = StxBuilder::new().track(track).image();
    let track = &image.tracks()[0];

    assert!(track.sectors().is_empty());
    assert_eq!(track.track_image().unwrap().sync_position(), 0);
    assert_eq!(track.byte_length(), 6000);
}

#[test]
fn test_fuzzy_and_no_data_sectors() {
    init();
    let track = TestTrack::new(
        0,
        0,
        vec![
            TestSector::new(100, DiskChsn::new(0, 0, 1, 2), 0x55).with_fuzzy(vec![0xF0; 512]),
            TestSector::no_data(5000, DiskChsn::new(0, 0, 2, 2), 0),
        ],
    );
    let image = StxBuilder::new().track(track).image();
    let track = &image.tracks()[0];

    assert_eq!(track.fuzzy_size(), 512);
    assert!(track.sectors()[0].has_fuzzy_mask());
    assert!(!track.sectors()[1].status().has_data());
    assert_eq!(track.sectors()[1].size(), 0);
    assert!(image.original_data(&track.sectors()[1]).is_none());
}

#[cfg(feature = "gzip")]
#[test]
fn test_gzip_image() {
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    init();
    let raw = StxBuilder::new().track(two_sector_track()).build();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw).unwrap();
    let gz = encoder.finish().unwrap();

    let image = StxImage::from_bytes(gz).unwrap();
    assert_eq!(compute_slice_hash(image.buffer()), compute_slice_hash(&raw));
    assert_eq!(image.tracks()[0].sectors().len(), 2);
}

#[test]
fn test_dump_info() {
    init();
    let image = StxBuilder::new()
        .track(two_sector_track())
        .track(TestTrack::new(1, 0, Vec::new()))
        .image();

    let mut out = Vec::new();
    image.dump_info(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("tracks=2"));
    assert!(text.contains("sectors=2"));
    assert!(text.contains("bit_position=5000"));
    assert!(text.contains("empty / not formatted"));
}
