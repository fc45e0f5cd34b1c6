use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use sigfil_types::SampleFormat;

/// Нативный тип выборки области данных.
///
/// Реализован для `u8`, `u16` и `f32`; `FORMAT` связывает тип с `nbits`.
pub trait Sample: bytemuck::Pod + PartialEq + fmt::Debug {
    const FORMAT: SampleFormat;

    /// Декодирует выборку из `FORMAT.sample_size()` байт little-endian.
    fn read_le(buf: &[u8]) -> Self;

    /// Кодирует выборку в `FORMAT.sample_size()` байт little-endian.
    fn write_le(
        self,
        buf: &mut [u8],
    );

    fn into_value(self) -> SampleValue;
}

/// Выборка произвольного формата.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleValue {
    UInt8(u8),
    UInt16(u16),
    Float32(f32),
}

impl SampleValue {
    /// Декодирует выборку указанного формата.
    pub fn read(
        format: SampleFormat,
        buf: &[u8],
    ) -> Self {
        match format {
            SampleFormat::UInt8 => u8::read_le(buf).into_value(),
            SampleFormat::UInt16 => u16::read_le(buf).into_value(),
            SampleFormat::Float32 => f32::read_le(buf).into_value(),
        }
    }

    pub fn format(&self) -> SampleFormat {
        match self {
            SampleValue::UInt8(_) => SampleFormat::UInt8,
            SampleValue::UInt16(_) => SampleFormat::UInt16,
            SampleValue::Float32(_) => SampleFormat::Float32,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            SampleValue::UInt8(v) => *v as f64,
            SampleValue::UInt16(v) => *v as f64,
            SampleValue::Float32(v) => *v as f64,
        }
    }
}

impl Sample for u8 {
    const FORMAT: SampleFormat = SampleFormat::UInt8;

    fn read_le(buf: &[u8]) -> Self {
        buf[0]
    }

    fn write_le(
        self,
        buf: &mut [u8],
    ) {
        buf[0] = self;
    }

    fn into_value(self) -> SampleValue {
        SampleValue::UInt8(self)
    }
}

impl Sample for u16 {
    const FORMAT: SampleFormat = SampleFormat::UInt16;

    fn read_le(buf: &[u8]) -> Self {
        LittleEndian::read_u16(buf)
    }

    fn write_le(
        self,
        buf: &mut [u8],
    ) {
        LittleEndian::write_u16(buf, self);
    }

    fn into_value(self) -> SampleValue {
        SampleValue::UInt16(self)
    }
}

impl Sample for f32 {
    const FORMAT: SampleFormat = SampleFormat::Float32;

    fn read_le(buf: &[u8]) -> Self {
        LittleEndian::read_f32(buf)
    }

    fn write_le(
        self,
        buf: &mut [u8],
    ) {
        LittleEndian::write_f32(buf, self);
    }

    fn into_value(self) -> SampleValue {
        SampleValue::Float32(self)
    }
}

/// Кодирует выборки подряд в little-endian.
pub fn samples_to_bytes<T: Sample>(samples: &[T]) -> Vec<u8> {
    let size = T::FORMAT.sample_size();
    let mut buf = vec![0u8; samples.len() * size];

    for (chunk, s) in buf.chunks_exact_mut(size).zip(samples) {
        s.write_le(chunk);
    }

    buf
}
