//! Окна над отображённой в память областью данных.
//!
//! Окна заимствуют [`FilterbankFile`](crate::FilterbankFile) и не могут его
//! пережить. Данные не копируются, пока вызывающий явно не запросит
//! непрерывный буфер (`to_vec`).

use std::ops::Range;

use sigfil_types::{FilError, FilResult, SampleFormat};

use crate::sample::{Sample, SampleValue};

/// Окно `[start, start + len)` спектров только для чтения.
#[derive(Debug, Clone, Copy)]
pub struct SpectraView<'a> {
    data: &'a [u8],
    nchans: usize,
    format: SampleFormat,
    start: usize,
}

/// Один спектр: `nchans` выборок подряд.
#[derive(Debug, Clone, Copy)]
pub struct Spectrum<'a> {
    data: &'a [u8],
    format: SampleFormat,
    index: usize,
}

/// Изменяемое окно спектров файла, открытого на запись.
#[derive(Debug)]
pub struct SpectraViewMut<'a> {
    data: &'a mut [u8],
    nchans: usize,
    format: SampleFormat,
    start: usize,
}

/// Итератор по спектрам окна.
pub struct SpectraIter<'a> {
    view: SpectraView<'a>,
    next: usize,
}

impl<'a> SpectraView<'a> {
    pub(crate) fn new(
        data: &'a [u8],
        nchans: usize,
        format: SampleFormat,
        start: usize,
    ) -> Self {
        Self {
            data,
            nchans,
            format,
            start,
        }
    }

    /// Число спектров в окне.
    pub fn len(&self) -> usize {
        self.data.len() / self.bytes_per_spectrum()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn nchans(&self) -> usize {
        self.nchans
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Индекс первого спектра окна в файле.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Индексы спектров окна в файле.
    pub fn indices(&self) -> Range<usize> {
        self.start..self.start + self.len()
    }

    /// Сырые байты окна (без копирования).
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn spectrum(
        &self,
        i: usize,
    ) -> Option<Spectrum<'a>> {
        let bps = self.bytes_per_spectrum();
        let data = self.data.get(i * bps..(i + 1) * bps)?;

        Some(Spectrum {
            data,
            format: self.format,
            index: self.start + i,
        })
    }

    /// Выборка канала `chan` спектра `i` окна.
    pub fn sample(
        &self,
        i: usize,
        chan: usize,
    ) -> Option<SampleValue> {
        self.spectrum(i)?.get(chan)
    }

    pub fn iter(&self) -> SpectraIter<'a> {
        SpectraIter {
            view: *self,
            next: 0,
        }
    }

    /// Типизированный срез без копирования.
    ///
    /// `None`, если `T` не соответствует формату файла, платформа не
    /// little-endian или начало данных не выровнено под `T`.
    pub fn as_slice<T: Sample>(&self) -> Option<&'a [T]> {
        typed_slice(self.data, self.format)
    }

    /// Копирует окно в непрерывный буфер (построчно).
    pub fn to_vec<T: Sample>(&self) -> FilResult<Vec<T>> {
        decode_all(self.data, self.format)
    }

    fn bytes_per_spectrum(&self) -> usize {
        self.nchans * self.format.sample_size()
    }
}

impl<'a> Spectrum<'a> {
    /// Индекс спектра в файле.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn nchans(&self) -> usize {
        self.data.len() / self.format.sample_size()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn get(
        &self,
        chan: usize,
    ) -> Option<SampleValue> {
        let size = self.format.sample_size();
        let bytes = self.data.get(chan * size..(chan + 1) * size)?;

        Some(SampleValue::read(self.format, bytes))
    }

    pub fn as_slice<T: Sample>(&self) -> Option<&'a [T]> {
        typed_slice(self.data, self.format)
    }

    pub fn to_vec<T: Sample>(&self) -> FilResult<Vec<T>> {
        decode_all(self.data, self.format)
    }
}

impl<'a> Iterator for SpectraIter<'a> {
    type Item = Spectrum<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let spectrum = self.view.spectrum(self.next)?;
        self.next += 1;
        Some(spectrum)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.view.len().saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for SpectraIter<'_> {}

impl<'a> IntoIterator for &SpectraView<'a> {
    type Item = Spectrum<'a>;
    type IntoIter = SpectraIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> SpectraViewMut<'a> {
    pub(crate) fn new(
        data: &'a mut [u8],
        nchans: usize,
        format: SampleFormat,
        start: usize,
    ) -> Self {
        Self {
            data,
            nchans,
            format,
            start,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len() / (self.nchans * self.format.sample_size())
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn as_view(&self) -> SpectraView<'_> {
        SpectraView::new(&*self.data, self.nchans, self.format, self.start)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &*self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }

    /// Записывает выборку канала `chan` спектра `i` окна.
    pub fn set<T: Sample>(
        &mut self,
        i: usize,
        chan: usize,
        value: T,
    ) -> FilResult<()> {
        check_type::<T>(self.format)?;

        let len = self.len();
        if i >= len {
            return Err(FilError::OutOfRange { index: i, len });
        }
        if chan >= self.nchans {
            return Err(FilError::OutOfRange {
                index: chan,
                len: self.nchans,
            });
        }

        let size = self.format.sample_size();
        let at = (i * self.nchans + chan) * size;
        value.write_le(&mut self.data[at..at + size]);

        Ok(())
    }

    /// Перезаписывает всё окно выборками `samples` (построчно).
    pub fn copy_from<T: Sample>(
        &mut self,
        samples: &[T],
    ) -> FilResult<()> {
        check_type::<T>(self.format)?;

        let expected = self.len() * self.nchans;
        if samples.len() != expected {
            return Err(FilError::ShapeMismatch {
                expected,
                found: samples.len(),
            });
        }

        let size = self.format.sample_size();
        for (chunk, s) in self.data.chunks_exact_mut(size).zip(samples) {
            s.write_le(chunk);
        }

        Ok(())
    }
}

fn check_type<T: Sample>(format: SampleFormat) -> FilResult<()> {
    if T::FORMAT != format {
        return Err(FilError::type_mismatch(format!(
            "data is {format}, requested {}",
            T::FORMAT
        )));
    }
    Ok(())
}

fn typed_slice<T: Sample>(
    data: &[u8],
    format: SampleFormat,
) -> Option<&[T]> {
    if T::FORMAT != format {
        return None;
    }
    if cfg!(target_endian = "big") && format.sample_size() > 1 {
        return None;
    }
    bytemuck::try_cast_slice(data).ok()
}

fn decode_all<T: Sample>(
    data: &[u8],
    format: SampleFormat,
) -> FilResult<Vec<T>> {
    check_type::<T>(format)?;

    Ok(data
        .chunks_exact(format.sample_size())
        .map(T::read_le)
        .collect())
}
