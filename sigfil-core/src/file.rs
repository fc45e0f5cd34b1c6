//! Открытый filterbank файл: заголовок, геометрия и отображение данных.

use std::{
    fs::{File, OpenOptions},
    io::{BufReader, Write},
    ops::Range,
    path::{Path, PathBuf},
};

use log::{debug, info, log, warn, Level};
use memmap2::{Mmap, MmapMut, MmapOptions};
use sigfil_types::{FieldValue, FilError, FilHeader, FilResult, SampleFormat};

use crate::{
    config::{AccessMode, OpenConfig},
    format::read_header_with,
    geometry::Geometry,
    view::{SpectraView, SpectraViewMut},
};

/// Область целых спектров, отображённая в память.
enum DataRegion {
    /// Нет ни одного целого спектра, отображение не создаётся
    Empty,
    ReadOnly(Mmap),
    ReadWrite(MmapMut),
}

/// Открытый filterbank файл.
///
/// Владеет отображением области данных; окна ([`SpectraView`]) заимствуют
/// файл и не могут его пережить. Заголовок и геометрия после открытия не
/// меняются. Файл, открытый на запись, сбрасывает изменения при закрытии.
pub struct FilterbankFile {
    path: PathBuf,
    mode: AccessMode,
    header: FilHeader,
    geometry: Geometry,
    data: DataRegion,
    trace_level: Option<Level>,
}

impl FilterbankFile {
    /// Открывает файл, читает заголовок и отображает область данных.
    pub fn open<P: AsRef<Path>>(
        path: P,
        config: OpenConfig,
    ) -> FilResult<Self> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(FilError::NotFound(path.to_path_buf()));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(config.mode.is_writable())
            .open(path)?;

        let header = read_header_with(BufReader::new(&file), &config.decode_options())?;
        let file_size = file.metadata()?.len();
        let geometry = Geometry::from_header(&header, file_size)?;

        if geometry.has_partial_spectrum() {
            warn!(
                "Not an integer number of spectra in {:?}: {} trailing bytes ignored",
                path,
                geometry.trailing_bytes()
            );
        }

        let data = map_region(&file, &geometry, config.mode)?;

        info!(
            "Opened {:?} ({}): {} spectra × {} channels, {}, header {} B",
            path,
            config.mode,
            geometry.spectra_count,
            geometry.layout.nchans,
            geometry.layout.format,
            geometry.header_size,
        );

        Ok(Self {
            path: path.to_path_buf(),
            mode: config.mode,
            header,
            geometry,
            data,
            trace_level: config.trace_level,
        })
    }

    /// Открывает файл только для чтения без трассировки.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> FilResult<Self> {
        Self::open(path, OpenConfig::read_only())
    }

    /// Значение поля заголовка по имени.
    pub fn get(
        &self,
        name: &str,
    ) -> FilResult<&FieldValue> {
        if let Some(level) = self.trace_level {
            log!(level, "Fetching header field '{name}'");
        }
        self.header.get(name)
    }

    /// Окно спектров `[start, stop)`.
    ///
    /// Индексы ведут себя как срез: отрицательные отсчитываются от конца,
    /// выход за границы обрезается, пустой диапазон даёт пустое окно.
    pub fn spectrum_range(
        &self,
        start: i64,
        stop: i64,
    ) -> SpectraView<'_> {
        let range = clamp_range(start, stop, self.geometry.spectra_count);
        let bps = self.geometry.layout.bytes_per_spectrum();
        let bytes = &self.bytes()[range.start * bps..range.end * bps];

        SpectraView::new(
            bytes,
            self.geometry.layout.nchans,
            self.geometry.layout.format,
            range.start,
        )
    }

    /// Окно спектров между моментами `start_secs` и `stop_secs`.
    ///
    /// Каждая граница переводится в индекс как `round(t / tsamp)`, половины
    /// округляются от нуля.
    pub fn time_range(
        &self,
        start_secs: f64,
        stop_secs: f64,
    ) -> FilResult<SpectraView<'_>> {
        let start = self.geometry.time_to_index(start_secs)?;
        let stop = self.geometry.time_to_index(stop_secs)?;

        Ok(self.spectrum_range(start, stop))
    }

    /// Все целые спектры файла.
    pub fn spectra(&self) -> SpectraView<'_> {
        self.spectrum_range(0, self.geometry.spectra_count as i64)
    }

    /// Изменяемое окно спектров; только для файлов, открытых на запись.
    pub fn spectrum_range_mut(
        &mut self,
        start: i64,
        stop: i64,
    ) -> FilResult<SpectraViewMut<'_>> {
        let range = clamp_range(start, stop, self.geometry.spectra_count);
        let bps = self.geometry.layout.bytes_per_spectrum();
        let nchans = self.geometry.layout.nchans;
        let format = self.geometry.layout.format;

        let bytes: &mut [u8] = match &mut self.data {
            DataRegion::ReadWrite(mmap) => &mut mmap[range.start * bps..range.end * bps],
            DataRegion::Empty if self.mode.is_writable() => &mut [],
            _ => return Err(FilError::ReadOnly),
        };

        Ok(SpectraViewMut::new(bytes, nchans, format, range.start))
    }

    /// Синхронно сбрасывает изменения области данных на диск.
    pub fn flush(&self) -> FilResult<()> {
        if let DataRegion::ReadWrite(mmap) = &self.data {
            mmap.flush()?;
        }
        Ok(())
    }

    /// Печатает поля заголовка по алфавиту, по одному `name: value` в строке.
    pub fn print_header<W: Write>(
        &self,
        out: &mut W,
    ) -> FilResult<()> {
        write!(out, "{}", self.header)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn header(&self) -> &FilHeader {
        &self.header
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn header_size(&self) -> usize {
        self.geometry.header_size
    }

    pub fn fch1(&self) -> f64 {
        self.geometry.fch1
    }

    pub fn foff(&self) -> f64 {
        self.geometry.foff
    }

    /// Интервал между спектрами; `UnknownField`, если поля нет в заголовке.
    pub fn tsamp(&self) -> FilResult<f64> {
        self.geometry
            .tsamp
            .ok_or_else(|| FilError::unknown_field("tsamp"))
    }

    pub fn nchans(&self) -> usize {
        self.geometry.layout.nchans
    }

    pub fn nbits(&self) -> u32 {
        self.geometry.layout.format.nbits()
    }

    pub fn sample_format(&self) -> SampleFormat {
        self.geometry.layout.format
    }

    pub fn sample_width_bytes(&self) -> usize {
        self.geometry.layout.sample_width_bytes()
    }

    pub fn bytes_per_spectrum(&self) -> usize {
        self.geometry.layout.bytes_per_spectrum()
    }

    pub fn data_size(&self) -> u64 {
        self.geometry.data_size
    }

    pub fn spectra_count(&self) -> usize {
        self.geometry.spectra_count
    }

    pub fn channel_frequencies(&self) -> &[f64] {
        &self.geometry.channel_frequencies
    }

    pub fn is_descending_frequency(&self) -> bool {
        self.geometry.is_descending_frequency()
    }

    pub fn has_partial_spectrum(&self) -> bool {
        self.geometry.has_partial_spectrum()
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.geometry.duration_secs()
    }

    fn bytes(&self) -> &[u8] {
        match &self.data {
            DataRegion::Empty => &[],
            DataRegion::ReadOnly(mmap) => &mmap[..],
            DataRegion::ReadWrite(mmap) => &mmap[..],
        }
    }
}

impl Drop for FilterbankFile {
    fn drop(&mut self) {
        if let DataRegion::ReadWrite(mmap) = &self.data {
            if let Err(e) = mmap.flush() {
                warn!("Failed to flush {:?} on close: {e}", self.path);
            }
        }
    }
}

impl std::fmt::Debug for FilterbankFile {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("FilterbankFile")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("header_size", &self.geometry.header_size)
            .field("spectra_count", &self.geometry.spectra_count)
            .field("nchans", &self.geometry.layout.nchans)
            .field("format", &self.geometry.layout.format)
            .finish()
    }
}

fn map_region(
    file: &File,
    geometry: &Geometry,
    mode: AccessMode,
) -> FilResult<DataRegion> {
    let len = geometry.mapped_len();

    if len == 0 {
        debug!("No whole spectra, data region not mapped");
        return Ok(DataRegion::Empty);
    }

    let mut options = MmapOptions::new();
    options.offset(geometry.header_size as u64).len(len);

    debug!(
        "Mapping {len} bytes at offset {} ({mode})",
        geometry.header_size
    );

    // SAFETY: отображение принадлежит FilterbankFile, все срезы заимствуют
    // его и не переживают файл.
    let region = match mode {
        AccessMode::ReadOnly => DataRegion::ReadOnly(unsafe { options.map(file)? }),
        AccessMode::ReadWrite => DataRegion::ReadWrite(unsafe { options.map_mut(file)? }),
    };

    Ok(region)
}

/// Переводит индексы в стиле среза в допустимый диапазон `0..len`.
fn clamp_range(
    start: i64,
    stop: i64,
    len: usize,
) -> Range<usize> {
    let len_i = len as i64;
    let clamp = |i: i64| -> usize {
        let i = if i < 0 { i + len_i } else { i };
        i.clamp(0, len_i) as usize
    };

    let start = clamp(start);
    let stop = clamp(stop).max(start);

    start..stop
}
