use std::{fs, io::Write, path::Path};

use rand::{rngs::StdRng, Rng, SeedableRng};
use sigfil_core::{
    create, create_header_only, read_header_file, write_header, AccessMode, FieldValue, FilError,
    FilHeader, FilterbankFile, FilterbankWriter, OpenConfig, Sample, SampleValue,
};
use tempfile::{tempdir, NamedTempFile};

// ===========================================================================
// Helpers — детерминированные тест-данные
// ===========================================================================

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Заголовок с полным набором полей геометрии и парой сквозных полей.
fn geometry_header(
    nchans: i64,
    nbits: i64,
) -> FilHeader {
    FilHeader::new()
        .with("telescope_id", 4)
        .unwrap()
        .with("source_name", "B0329+54")
        .unwrap()
        .with("tstart", 56_000.125)
        .unwrap()
        .with("fch1", 1400.0)
        .unwrap()
        .with("foff", -1.0)
        .unwrap()
        .with("nchans", nchans)
        .unwrap()
        .with("nbits", nbits)
        .unwrap()
        .with("tsamp", 0.001)
        .unwrap()
}

fn write_raw(
    path: &Path,
    parts: &[&[u8]],
) {
    let mut f = fs::File::create(path).unwrap();
    for part in parts {
        f.write_all(part).unwrap();
    }
}

fn push_str(
    raw: &mut Vec<u8>,
    s: &str,
) {
    raw.extend_from_slice(&(s.len() as i32).to_le_bytes());
    raw.extend_from_slice(s.as_bytes());
}

fn round_trip<T: Sample>(
    nbits: i64,
    samples: &[T],
    nchans: i64,
) {
    let tmp = NamedTempFile::new().unwrap();
    let header = geometry_header(nchans, nbits);

    create(tmp.path(), &header, Some(samples)).unwrap();

    let fil = FilterbankFile::open_read_only(tmp.path()).unwrap();
    assert_eq!(fil.header(), &header);
    assert_eq!(fil.spectra_count(), samples.len() / nchans as usize);
    assert!(!fil.has_partial_spectrum());

    let all = fil.spectrum_range(0, fil.spectra_count() as i64);
    assert_eq!(all.to_vec::<T>().unwrap(), samples);

    let on_disk = fs::read(tmp.path()).unwrap();
    assert_eq!(all.as_bytes(), &on_disk[fil.header_size()..]);
}

// ===========================================================================
// Round-trip
// ===========================================================================

#[test]
fn test_round_trip_uint8() {
    init_logging();
    let samples: Vec<u8> = (0..64).map(|i| (i * 7 % 256) as u8).collect();
    round_trip(8, &samples, 8);
}

#[test]
fn test_round_trip_uint16() {
    init_logging();
    let samples: Vec<u16> = (0..60).map(|i| i * 1_000).collect();
    round_trip(16, &samples, 5);
}

#[test]
fn test_round_trip_float32() {
    init_logging();
    let samples: Vec<f32> = (0..48).map(|i| i as f32 * -0.5 + 0.25).collect();
    round_trip(32, &samples, 16);
}

#[test]
fn test_random_round_trips() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(0x5167_F11);

    for _ in 0..20 {
        let nchans = rng.gen_range(1..=32i64);
        let nspec = rng.gen_range(0..=20usize);
        let n = nchans as usize * nspec;

        match rng.gen_range(0..3) {
            0 => {
                let s: Vec<u8> = (0..n).map(|_| rng.gen()).collect();
                round_trip(8, &s, nchans);
            }
            1 => {
                let s: Vec<u16> = (0..n).map(|_| rng.gen()).collect();
                round_trip(16, &s, nchans);
            }
            _ => {
                let s: Vec<f32> = (0..n).map(|_| rng.gen_range(-1e6..1e6)).collect();
                round_trip(32, &s, nchans);
            }
        }
    }
}

#[test]
fn test_header_order_preserved_on_disk() {
    let tmp = NamedTempFile::new().unwrap();
    let header = FilHeader::new()
        .with("nbits", 8)
        .unwrap()
        .with("rawdatafile", "")
        .unwrap()
        .with("nchans", 2)
        .unwrap()
        .with("az_start", 12.5)
        .unwrap();

    create_header_only(tmp.path(), &header).unwrap();

    let decoded = read_header_file(tmp.path()).unwrap();
    let names: Vec<_> = decoded.iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["nbits", "rawdatafile", "nchans", "az_start"]);
    assert_eq!(decoded.get_str("rawdatafile").unwrap(), "");
}

// ===========================================================================
// Геометрия
// ===========================================================================

#[test]
fn test_header_size_is_first_data_byte() {
    let tmp = NamedTempFile::new().unwrap();
    let header = geometry_header(4, 8);
    create(tmp.path(), &header, Some(&[9u8; 12][..])).unwrap();

    // Независимый подсчёт: строка = 4 + len, int = 4, double = 8
    let s = |name: &str| 4 + name.len();
    let expected = s("HEADER_START")
        + s("telescope_id") + 4
        + s("source_name") + s("B0329+54")
        + s("tstart") + 8
        + s("fch1") + 8
        + s("foff") + 8
        + s("nchans") + 4
        + s("nbits") + 4
        + s("tsamp") + 8
        + s("HEADER_END");

    let fil = FilterbankFile::open_read_only(tmp.path()).unwrap();
    let file_size = fs::metadata(tmp.path()).unwrap().len() as usize;

    assert_eq!(fil.header_size(), expected);
    assert_eq!(fil.header_size(), file_size - 12);
    assert_eq!(fil.data_size(), 12);
    assert_eq!(write_header(&header).unwrap().len(), expected);
}

#[test]
fn test_descending_frequency_scenario() {
    let tmp = NamedTempFile::new().unwrap();
    create_header_only(tmp.path(), &geometry_header(4, 8)).unwrap();

    let fil = FilterbankFile::open_read_only(tmp.path()).unwrap();

    assert_eq!(fil.channel_frequencies(), &[1400.0, 1399.0, 1398.0, 1397.0]);
    assert!(fil.is_descending_frequency());
    assert_eq!(fil.fch1(), 1400.0);
    assert_eq!(fil.foff(), -1.0);
    assert_eq!(fil.nbits(), 8);
    assert_eq!(fil.sample_width_bytes(), 1);
    assert_eq!(fil.bytes_per_spectrum(), 4);
    assert_eq!(fil.spectra_count(), 0);
    assert!(fil.spectra().is_empty());
}

#[test]
fn test_partial_spectrum_scenario() {
    init_logging();
    let tmp = NamedTempFile::new().unwrap();
    let header = write_header(&geometry_header(4, 8)).unwrap();
    let data: Vec<u8> = (1..=10).collect();
    write_raw(tmp.path(), &[&header, &data]);

    let fil = FilterbankFile::open_read_only(tmp.path()).unwrap();

    assert_eq!(fil.data_size(), 10);
    assert_eq!(fil.spectra_count(), 2);
    assert!(fil.has_partial_spectrum());

    let view = fil.spectrum_range(0, 2);
    assert_eq!(view.len(), 2);
    assert_eq!(view.as_bytes(), &data[..8]);

    // Хвост не адресуется даже при запросе за границей
    assert_eq!(fil.spectrum_range(0, 3).len(), 2);
}

#[test]
fn test_ragged_create_is_truncated_on_open() {
    let tmp = NamedTempFile::new().unwrap();
    create(tmp.path(), &geometry_header(3, 16), Some(&[1u16, 2, 3, 4, 5][..])).unwrap();

    let fil = FilterbankFile::open_read_only(tmp.path()).unwrap();
    assert_eq!(fil.data_size(), 10);
    assert_eq!(fil.spectra_count(), 1);
    assert_eq!(fil.spectra().to_vec::<u16>().unwrap(), vec![1, 2, 3]);
}

// ===========================================================================
// Доступ по индексам и времени
// ===========================================================================

fn ten_spectra_file() -> (NamedTempFile, Vec<u8>) {
    let tmp = NamedTempFile::new().unwrap();
    let samples: Vec<u8> = (0..40).collect();
    create(tmp.path(), &geometry_header(4, 8), Some(&samples[..])).unwrap();
    (tmp, samples)
}

#[test]
fn test_spectrum_range_rows() {
    let (tmp, samples) = ten_spectra_file();
    let fil = FilterbankFile::open_read_only(tmp.path()).unwrap();

    let view = fil.spectrum_range(3, 6);
    assert_eq!(view.len(), 3);
    assert_eq!(view.start(), 3);
    assert_eq!(view.as_bytes(), &samples[12..24]);
    assert_eq!(view.sample(0, 1), Some(SampleValue::UInt8(13)));

    let rows: Vec<Vec<u8>> = view.iter().map(|s| s.to_vec::<u8>().unwrap()).collect();
    assert_eq!(rows, vec![vec![12, 13, 14, 15], vec![16, 17, 18, 19], vec![20, 21, 22, 23]]);

    // u8 всегда выровнен
    assert_eq!(view.as_slice::<u8>(), Some(&samples[12..24]));
}

#[test]
fn test_spectrum_range_clamps() {
    let (tmp, samples) = ten_spectra_file();
    let fil = FilterbankFile::open_read_only(tmp.path()).unwrap();

    assert_eq!(fil.spectrum_range(8, 100).len(), 2);
    assert_eq!(fil.spectrum_range(-2, 10).as_bytes(), &samples[32..40]);
    assert_eq!(fil.spectrum_range(-100, 1).len(), 1);
    assert_eq!(fil.spectrum_range(0, -1).len(), 9);
    assert!(fil.spectrum_range(6, 3).is_empty());
    assert!(fil.spectrum_range(50, 60).is_empty());
}

#[test]
fn test_time_range_matches_index_range() {
    let (tmp, _) = ten_spectra_file();
    let fil = FilterbankFile::open_read_only(tmp.path()).unwrap();
    let tsamp = fil.tsamp().unwrap();

    let cases = [(0.0, 0.004), (0.0011, 0.0069), (0.0026, 0.0101), (0.003, 0.003), (0.0, 1.0)];

    for (start, stop) in cases {
        let by_time = fil.time_range(start, stop).unwrap();
        let by_index = fil.spectrum_range(
            (start / tsamp).round() as i64,
            (stop / tsamp).round() as i64,
        );

        assert_eq!(by_time.start(), by_index.start(), "{start}..{stop}");
        assert_eq!(by_time.as_bytes(), by_index.as_bytes(), "{start}..{stop}");
    }

    assert_eq!(fil.time_range(0.0011, 0.0069).unwrap().indices(), 1..7);
    assert_eq!(fil.duration_secs(), Some(10.0 * tsamp));
}

#[test]
fn test_time_range_without_tsamp() {
    let tmp = NamedTempFile::new().unwrap();
    let header = FilHeader::new()
        .with("fch1", 1400.0)
        .unwrap()
        .with("foff", 0.25)
        .unwrap()
        .with("nchans", 2)
        .unwrap()
        .with("nbits", 8)
        .unwrap();
    create(tmp.path(), &header, Some(&[0u8; 8][..])).unwrap();

    let fil = FilterbankFile::open_read_only(tmp.path()).unwrap();

    assert_eq!(fil.spectra_count(), 4);
    assert!(matches!(fil.time_range(0.0, 1.0), Err(FilError::UnknownField(n)) if n == "tsamp"));
    assert!(matches!(fil.tsamp(), Err(FilError::UnknownField(_))));
}

// ===========================================================================
// Поля заголовка
// ===========================================================================

#[test]
fn test_field_access() {
    let (tmp, _) = ten_spectra_file();
    let fil = FilterbankFile::open(
        tmp.path(),
        OpenConfig::read_only().trace_level(log::Level::Debug),
    )
    .unwrap();

    assert_eq!(fil.get("source_name").unwrap(), &FieldValue::from("B0329+54"));
    assert_eq!(fil.get("telescope_id").unwrap().as_int(), Some(4));
    assert_eq!(fil.get("tstart").unwrap().as_double(), Some(56_000.125));
    assert!(matches!(fil.get("refdm"), Err(FilError::UnknownField(n)) if n == "refdm"));
    assert!(matches!(fil.get("HEADER_START"), Err(FilError::UnknownField(_))));
}

#[test]
fn test_print_header_sorted() {
    let (tmp, _) = ten_spectra_file();
    let fil = FilterbankFile::open_read_only(tmp.path()).unwrap();

    let mut out = Vec::new();
    fil.print_header(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert_eq!(
        text,
        "fch1: 1400.0\n\
         foff: -1.0\n\
         nbits: 8\n\
         nchans: 4\n\
         source_name: B0329+54\n\
         telescope_id: 4\n\
         tsamp: 0.001\n\
         tstart: 56000.125\n"
    );
    assert!(!text.contains("HEADER_"));
}

// ===========================================================================
// Ошибки
// ===========================================================================

#[test]
fn test_open_missing_path() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.fil");

    assert!(matches!(
        FilterbankFile::open_read_only(&missing),
        Err(FilError::NotFound(p)) if p == missing
    ));
    assert!(matches!(
        FilterbankFile::open_read_only(dir.path()),
        Err(FilError::NotFound(_))
    ));
    assert!(matches!(read_header_file(&missing), Err(FilError::NotFound(_))));
}

#[test]
fn test_open_unknown_field_name() {
    let tmp = NamedTempFile::new().unwrap();
    let mut raw = Vec::new();
    push_str(&mut raw, "HEADER_START");
    push_str(&mut raw, "npol");
    raw.extend_from_slice(&2i32.to_le_bytes());
    push_str(&mut raw, "HEADER_END");
    write_raw(tmp.path(), &[&raw]);

    assert!(matches!(
        FilterbankFile::open_read_only(tmp.path()),
        Err(FilError::MalformedHeader(_))
    ));
}

#[test]
fn test_open_without_start_sentinel() {
    let tmp = NamedTempFile::new().unwrap();
    let mut raw = Vec::new();
    push_str(&mut raw, "nchans");
    raw.extend_from_slice(&4i32.to_le_bytes());
    write_raw(tmp.path(), &[&raw]);

    assert!(matches!(
        FilterbankFile::open_read_only(tmp.path()),
        Err(FilError::MalformedHeader(_))
    ));
}

#[test]
fn test_open_truncated_header() {
    let tmp = NamedTempFile::new().unwrap();
    let header = write_header(&geometry_header(4, 8)).unwrap();
    write_raw(tmp.path(), &[&header[..header.len() - 3]]);

    assert!(matches!(
        FilterbankFile::open_read_only(tmp.path()),
        Err(FilError::Io(_))
    ));
}

#[test]
fn test_open_unsupported_nbits() {
    for nbits in [1, 2, 4, 64] {
        let tmp = NamedTempFile::new().unwrap();
        create_header_only(tmp.path(), &geometry_header(4, nbits)).unwrap();

        assert!(matches!(
            FilterbankFile::open_read_only(tmp.path()),
            Err(FilError::UnsupportedSampleWidth(n)) if n == nbits
        ));
    }
}

#[test]
fn test_open_missing_geometry_field() {
    let tmp = NamedTempFile::new().unwrap();
    let header = FilHeader::new()
        .with("fch1", 1400.0)
        .unwrap()
        .with("foff", -1.0)
        .unwrap()
        .with("nbits", 8)
        .unwrap();

    // Заголовок без nchans читается, ошибка возникает только при открытии
    create_header_only(tmp.path(), &header).unwrap();
    assert_eq!(read_header_file(tmp.path()).unwrap(), header);

    assert!(matches!(
        FilterbankFile::open_read_only(tmp.path()),
        Err(FilError::UnknownField(n)) if n == "nchans"
    ));
}

#[test]
fn test_create_type_mismatch() {
    let tmp = NamedTempFile::new().unwrap();

    assert!(matches!(
        create(tmp.path(), &geometry_header(2, 32), Some(&[1u8, 2][..])),
        Err(FilError::TypeMismatch(_))
    ));
}

#[test]
fn test_failed_create_keeps_existing_file() {
    let (tmp, _) = ten_spectra_file();
    let before = fs::read(tmp.path()).unwrap();

    assert!(matches!(
        create(tmp.path(), &geometry_header(2, 32), Some(&[1u8, 2][..])),
        Err(FilError::TypeMismatch(_))
    ));
    let no_nchans = FilHeader::new().with("nbits", 8).unwrap();
    assert!(matches!(
        create(tmp.path(), &no_nchans, Some(&[1u8][..])),
        Err(FilError::UnknownField(_))
    ));

    let long_name = geometry_header(4, 8).with("source_name", "x".repeat(5000)).unwrap();
    assert!(matches!(
        create_header_only(tmp.path(), &long_name),
        Err(FilError::MalformedHeader(_))
    ));

    assert_eq!(fs::read(tmp.path()).unwrap(), before);
    assert_eq!(FilterbankFile::open_read_only(tmp.path()).unwrap().spectra_count(), 10);
}

#[test]
fn test_long_string_value_round_trip() {
    let tmp = NamedTempFile::new().unwrap();
    let header = geometry_header(4, 8)
        .with("rawdatafile", "r".repeat(4096))
        .unwrap();

    create_header_only(tmp.path(), &header).unwrap();
    let fil = FilterbankFile::open_read_only(tmp.path()).unwrap();

    assert_eq!(fil.header(), &header);
}

// ===========================================================================
// Запись через отображение
// ===========================================================================

#[test]
fn test_read_only_rejects_mutation() {
    let (tmp, _) = ten_spectra_file();
    let mut fil = FilterbankFile::open_read_only(tmp.path()).unwrap();

    assert_eq!(fil.mode(), AccessMode::ReadOnly);
    assert!(matches!(fil.spectrum_range_mut(0, 1), Err(FilError::ReadOnly)));
}

#[test]
fn test_read_write_persists_after_close() {
    let (tmp, samples) = ten_spectra_file();

    {
        let mut fil = FilterbankFile::open(tmp.path(), OpenConfig::read_write()).unwrap();
        let mut window = fil.spectrum_range_mut(2, 3).unwrap();

        window.set(0, 3, 200u8).unwrap();
        assert_eq!(window.as_view().sample(0, 3), Some(SampleValue::UInt8(200)));
    }

    let fil = FilterbankFile::open_read_only(tmp.path()).unwrap();
    let mut expected = samples.clone();
    expected[2 * 4 + 3] = 200;

    assert_eq!(fil.spectra().as_bytes(), &expected[..]);
    assert_eq!(fil.header(), &geometry_header(4, 8));
}

#[test]
fn test_read_write_header_only_file() {
    let tmp = NamedTempFile::new().unwrap();
    create_header_only(tmp.path(), &geometry_header(4, 8)).unwrap();

    let mut fil = FilterbankFile::open(tmp.path(), OpenConfig::default().mode(AccessMode::ReadWrite))
        .unwrap();

    let window = fil.spectrum_range_mut(0, 10).unwrap();
    assert!(window.is_empty());
    fil.flush().unwrap();
}

// ===========================================================================
// Потоковая запись и параллельное чтение
// ===========================================================================

#[test]
fn test_streaming_writer_to_file() {
    let tmp = NamedTempFile::new().unwrap();
    let header = geometry_header(3, 32);

    let mut writer = FilterbankWriter::new(fs::File::create(tmp.path()).unwrap(), header.clone())
        .unwrap();
    for i in 0..5 {
        let base = i as f32;
        writer.write_spectrum(&[base, base + 0.5, base + 0.75]).unwrap();
    }
    assert_eq!(writer.spectra_written(), 5);
    writer.finish().unwrap();

    let fil = FilterbankFile::open_read_only(tmp.path()).unwrap();
    assert_eq!(fil.spectra_count(), 5);

    let last = fil.spectrum_range(-1, 5).spectrum(0).unwrap();
    assert_eq!(last.index(), 4);
    assert_eq!(last.to_vec::<f32>().unwrap(), vec![4.0, 4.5, 4.75]);
}

#[test]
fn test_independent_read_only_handles() {
    let (tmp, samples) = ten_spectra_file();
    let path = tmp.path();

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                let fil = FilterbankFile::open_read_only(path).unwrap();
                assert_eq!(fil.spectra().as_bytes(), &samples[..]);
            });
        }
    });
}
