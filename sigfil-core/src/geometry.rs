//! Геометрия области данных, выводимая из полей заголовка.

use sigfil_types::{FilError, FilHeader, FilResult, SampleFormat};

/// Раскладка одного спектра: число каналов и формат выборок.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpectrumLayout {
    pub nchans: usize,
    pub format: SampleFormat,
}

/// Геометрия файла, вычисляется один раз при открытии.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub layout: SpectrumLayout,
    /// Частота первого канала (МГц)
    pub fch1: f64,
    /// Шаг частоты между каналами (МГц), отрицательный при убывании
    pub foff: f64,
    /// Интервал между спектрами (с); нужен только для доступа по времени
    pub tsamp: Option<f64>,
    /// Смещение первого байта данных
    pub header_size: usize,
    /// Размер области данных: размер файла минус заголовок
    pub data_size: u64,
    /// Число целых спектров
    pub spectra_count: usize,
    /// Частоты каналов: `fch1 + foff * i`
    pub channel_frequencies: Vec<f64>,
}

impl SpectrumLayout {
    /// Читает `nchans` и `nbits` из заголовка.
    pub fn from_header(header: &FilHeader) -> FilResult<Self> {
        let nchans = header.get_int("nchans")?;
        let format = SampleFormat::from_nbits(header.get_int("nbits")?)?;

        let nchans = usize::try_from(nchans)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| FilError::malformed(format!("nchans must be positive, got {nchans}")))?;

        Ok(Self { nchans, format })
    }

    pub fn sample_width_bytes(&self) -> usize {
        self.format.sample_size()
    }

    pub fn bytes_per_spectrum(&self) -> usize {
        self.nchans * self.sample_width_bytes()
    }
}

impl Geometry {
    /// Выводит геометрию из заголовка и полного размера файла.
    pub fn from_header(
        header: &FilHeader,
        file_size: u64,
    ) -> FilResult<Self> {
        let layout = SpectrumLayout::from_header(header)?;
        let fch1 = header.get_double("fch1")?;
        let foff = header.get_double("foff")?;

        let tsamp = match header.get_double("tsamp") {
            Ok(v) => Some(v),
            Err(FilError::UnknownField(_)) => None,
            Err(e) => return Err(e),
        };

        let header_size = header.header_size();
        let data_size = file_size.saturating_sub(header_size as u64);
        let spectra_count = (data_size / layout.bytes_per_spectrum() as u64) as usize;

        let channel_frequencies = (0..layout.nchans)
            .map(|i| fch1 + foff * i as f64)
            .collect();

        Ok(Self {
            layout,
            fch1,
            foff,
            tsamp,
            header_size,
            data_size,
            spectra_count,
            channel_frequencies,
        })
    }

    /// Байт, занятых целыми спектрами.
    pub fn mapped_len(&self) -> usize {
        self.spectra_count * self.layout.bytes_per_spectrum()
    }

    /// Хвостовые байты, не составляющие целого спектра.
    pub fn trailing_bytes(&self) -> u64 {
        self.data_size % self.layout.bytes_per_spectrum() as u64
    }

    pub fn has_partial_spectrum(&self) -> bool {
        self.trailing_bytes() != 0
    }

    pub fn is_descending_frequency(&self) -> bool {
        self.foff < 0.0
    }

    /// Индекс спектра для момента `seconds`, округление половин от нуля.
    pub fn time_to_index(
        &self,
        seconds: f64,
    ) -> FilResult<i64> {
        let tsamp = self
            .tsamp
            .ok_or_else(|| FilError::unknown_field("tsamp"))?;

        if !(tsamp.is_finite() && tsamp > 0.0) {
            return Err(FilError::malformed(format!(
                "tsamp must be a positive number, got {tsamp}"
            )));
        }

        Ok((seconds / tsamp).round() as i64)
    }

    /// Длительность наблюдения в секундах.
    pub fn duration_secs(&self) -> Option<f64> {
        self.tsamp.map(|t| self.spectra_count as f64 * t)
    }
}
