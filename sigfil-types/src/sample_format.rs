use crate::{FilError, FilResult};

/// Формат выборок в области данных, определяется полем `nbits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// 8-битные беззнаковые целые
    UInt8,
    /// 16-битные беззнаковые целые
    UInt16,
    /// 32-битные числа с плавающей точкой (IEEE 754)
    Float32,
}

impl SampleFormat {
    /// Выбирает формат по числу бит на выборку.
    pub fn from_nbits(nbits: i64) -> FilResult<Self> {
        match nbits {
            8 => Ok(SampleFormat::UInt8),
            16 => Ok(SampleFormat::UInt16),
            32 => Ok(SampleFormat::Float32),
            _ => Err(FilError::UnsupportedSampleWidth(nbits)),
        }
    }

    pub fn nbits(&self) -> u32 {
        match self {
            SampleFormat::UInt8 => 8,
            SampleFormat::UInt16 => 16,
            SampleFormat::Float32 => 32,
        }
    }

    /// Размер одной выборки в байтах
    pub fn sample_size(&self) -> usize {
        self.nbits() as usize / 8
    }
}

impl std::fmt::Display for SampleFormat {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            SampleFormat::UInt8 => write!(f, "uint8"),
            SampleFormat::UInt16 => write!(f, "uint16"),
            SampleFormat::Float32 => write!(f, "float32"),
        }
    }
}
