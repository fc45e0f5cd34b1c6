use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use log::{info, warn};
use sigfil_types::{FilError, FilHeader, FilResult};

use crate::{
    format::{write_header, write_header_to},
    geometry::SpectrumLayout,
    sample::{samples_to_bytes, Sample},
};

/// Потоковый писатель filterbank файлов.
///
/// Заголовок пишется сразу при создании, затем спектры добавляются по одному
/// или пачками.
pub struct FilterbankWriter<W: Write> {
    writer: BufWriter<W>,
    header: FilHeader,
    layout: SpectrumLayout,
    samples_written: u64,
}

impl<W: Write> FilterbankWriter<W> {
    /// Создаёт писатель, немедленно записывая заголовок в поток.
    ///
    /// Заголовок должен содержать `nchans` и `nbits`.
    pub fn new(
        inner: W,
        header: FilHeader,
    ) -> FilResult<Self> {
        let layout = SpectrumLayout::from_header(&header)?;
        let mut writer = BufWriter::new(inner);

        write_header_to(&mut writer, &header)?;

        Ok(Self {
            writer,
            header,
            layout,
            samples_written: 0,
        })
    }

    /// Записывает один спектр ровно из `nchans` выборок.
    pub fn write_spectrum<T: Sample>(
        &mut self,
        spectrum: &[T],
    ) -> FilResult<()> {
        if spectrum.len() != self.layout.nchans {
            return Err(FilError::ShapeMismatch {
                expected: self.layout.nchans,
                found: spectrum.len(),
            });
        }
        self.write_samples(spectrum)
    }

    /// Записывает несколько спектров, уложенных построчно.
    pub fn write_spectra<T: Sample>(
        &mut self,
        spectra: &[T],
    ) -> FilResult<()> {
        let nchans = self.layout.nchans;

        if spectra.len() % nchans != 0 {
            return Err(FilError::ShapeMismatch {
                expected: (spectra.len() / nchans + 1) * nchans,
                found: spectra.len(),
            });
        }
        self.write_samples(spectra)
    }

    /// Записывает выборки без проверки границ спектров.
    pub fn write_samples<T: Sample>(
        &mut self,
        samples: &[T],
    ) -> FilResult<()> {
        check_sample_format::<T>(&self.layout)?;

        self.writer.write_all(&samples_to_bytes(samples))?;
        self.samples_written += samples.len() as u64;

        Ok(())
    }

    /// Количество записанных выборок.
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// Количество записанных целых спектров.
    pub fn spectra_written(&self) -> u64 {
        self.samples_written / self.layout.nchans as u64
    }

    /// Заголовок, записанный в начало потока.
    pub fn header(&self) -> &FilHeader {
        &self.header
    }

    /// Завершает запись: сбрасывает буфер и возвращает внутренний поток.
    pub fn finish(mut self) -> FilResult<W> {
        self.writer.flush()?;

        if self.samples_written % self.layout.nchans as u64 != 0 {
            warn!(
                "Partial spectrum written: {} samples is not a multiple of nchans={}",
                self.samples_written, self.layout.nchans
            );
        }

        self.writer
            .into_inner()
            .map_err(|e| FilError::Io(e.into_error()))
    }
}

/// Создаёт filterbank файл из заголовка и, если заданы, выборок.
///
/// Выборки пишутся построчно в нативном формате `T`, который должен
/// соответствовать `nbits` заголовка.
pub fn create<P: AsRef<Path>, T: Sample>(
    path: P,
    header: &FilHeader,
    spectra: Option<&[T]>,
) -> FilResult<()> {
    let path = path.as_ref();

    let Some(spectra) = spectra else {
        return create_header_only(path, header);
    };

    // Заголовок и тип выборок проверяются до усечения существующего файла
    check_sample_format::<T>(&SpectrumLayout::from_header(header)?)?;
    write_header(header)?;

    let mut writer = FilterbankWriter::new(File::create(path)?, header.clone())?;
    writer.write_samples(spectra)?;

    let spectra_written = writer.spectra_written();
    writer.finish()?.sync_all()?;

    info!("Created {path:?}: {spectra_written} spectra");

    Ok(())
}

/// Создаёт файл, содержащий только заголовок.
pub fn create_header_only<P: AsRef<Path>>(
    path: P,
    header: &FilHeader,
) -> FilResult<()> {
    let path = path.as_ref();
    let encoded = write_header(header)?;

    let mut file = File::create(path)?;
    file.write_all(&encoded)?;
    file.sync_all()?;

    info!("Created {path:?}: header only, {} fields", header.len());

    Ok(())
}

fn check_sample_format<T: Sample>(layout: &SpectrumLayout) -> FilResult<()> {
    if T::FORMAT != layout.format {
        return Err(FilError::type_mismatch(format!(
            "header declares nbits={} ({}), samples are {}",
            layout.format.nbits(),
            layout.format,
            T::FORMAT
        )));
    }
    Ok(())
}
