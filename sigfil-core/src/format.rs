//! Формат заголовка sigproc filterbank.
//!
//! Заголовок - последовательность записей `имя [значение]`. Имя хранится как
//! строка с префиксом длины i32, вид значения определяется закрытым словарём
//! полей ([`sigfil_types::FIELD_TABLE`]). Поток открывается записью `HEADER_START` и
//! закрывается `HEADER_END`; обе служебные записи значений не имеют. Все
//! числа хранятся в порядке little-endian.

use std::{
    fs::File,
    io::{BufReader, Read, Write},
    path::Path,
};

use log::log;
use sigfil_types::{
    is_sentinel, FieldKind, FieldValue, FilError, FilHeader, FilResult, HEADER_END, HEADER_START,
};

use crate::{
    binary::{
        read_f64_local, read_i32_local, read_string_local, string_encoded_len, write_f64_local,
        write_i32_local, write_string_local,
    },
    config::DecodeOptions,
};

/// Максимальная длина имени поля или строкового значения (байт)
pub const MAX_STRING_LEN: usize = 4096;

/// Одна запись потока заголовка.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// `HEADER_START`
    Start,
    /// `HEADER_END`
    End,
    /// Поле словаря со значением
    Field(String, FieldValue),
}

/// Состояние декодера заголовка.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// Ожидается `HEADER_START`
    ExpectStart,
    /// Читаются поля до `HEADER_END`
    ReadingFields,
    /// Заголовок прочитан, дальнейшее чтение не выполняется
    Done,
}

/// Пошаговый декодер заголовка поверх любого [`Read`].
///
/// Сам считает прочитанные байты, поэтому `Seek` не требуется.
pub struct HeaderDecoder<R: Read> {
    reader: R,
    state: DecodeState,
    header: FilHeader,
    offset: usize,
    options: DecodeOptions,
}

/// Расширение [`FilHeader`] методами кодирования.
pub trait FilHeaderExt: Sized {
    /// Кодирует заголовок вместе со служебными записями.
    fn serialize(&self) -> FilResult<Vec<u8>>;

    /// Декодирует заголовок из начала потока.
    fn deserialize<R: Read>(reader: R) -> FilResult<Self>;

    /// Размер закодированного заголовка в байтах.
    fn encoded_len(&self) -> usize;
}

impl Record {
    /// Читает одну запись. Вид значения берётся из словаря по имени.
    pub fn read<R: Read>(
        reader: &mut R,
        off: &mut usize,
    ) -> FilResult<Self> {
        let name = read_string_local(reader, off, 1, MAX_STRING_LEN)?;

        match name.as_str() {
            HEADER_START => return Ok(Record::Start),
            HEADER_END => return Ok(Record::End),
            _ => {}
        }

        let kind = FieldKind::of(&name)
            .ok_or_else(|| FilError::malformed(format!("unknown field name '{name}'")))?;

        let value = match kind {
            FieldKind::Int => FieldValue::Int(read_i32_local(reader, off)? as i64),
            FieldKind::Double => FieldValue::Double(read_f64_local(reader, off)?),
            FieldKind::Str => FieldValue::Str(read_string_local(reader, off, 0, MAX_STRING_LEN)?),
        };

        Ok(Record::Field(name, value))
    }

    /// Пишет запись, сверяя вид значения со словарём.
    pub fn write<W: Write>(
        &self,
        writer: &mut W,
    ) -> FilResult<()> {
        match self {
            Record::Start => write_string_local(writer, HEADER_START),
            Record::End => write_string_local(writer, HEADER_END),
            Record::Field(name, value) => {
                check_field(name, value)?;
                write_string_local(writer, name)?;

                match value {
                    FieldValue::Int(v) => write_i32_local(writer, int_to_wire(name, *v)?),
                    FieldValue::Double(v) => write_f64_local(writer, *v),
                    FieldValue::Str(v) => write_string_local(writer, v),
                }
            }
        }
    }

    /// Размер записи на диске.
    pub fn encoded_len(&self) -> usize {
        match self {
            Record::Start => string_encoded_len(HEADER_START),
            Record::End => string_encoded_len(HEADER_END),
            Record::Field(name, value) => field_encoded_len(name, value),
        }
    }
}

impl<R: Read> HeaderDecoder<R> {
    pub fn new(
        reader: R,
        options: DecodeOptions,
    ) -> Self {
        Self {
            reader,
            state: DecodeState::ExpectStart,
            header: FilHeader::new(),
            offset: 0,
            options,
        }
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Байт прочитано с начала потока.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Выполняет один переход автомата. Возвращает новое состояние.
    pub fn step(&mut self) -> FilResult<DecodeState> {
        if self.state == DecodeState::Done {
            return Ok(DecodeState::Done);
        }

        let at = self.offset;
        let record = Record::read(&mut self.reader, &mut self.offset)?;

        if let Some(level) = self.options.trace_level {
            log!(level, "header record at byte {at}: {record:?}");
        }

        self.state = match (self.state, record) {
            (DecodeState::ExpectStart, Record::Start) => DecodeState::ReadingFields,
            (DecodeState::ExpectStart, other) => {
                return Err(FilError::malformed(format!(
                    "stream must begin with {HEADER_START}, found {}",
                    record_name(&other)
                )));
            }
            (DecodeState::ReadingFields, Record::Start) => {
                return Err(FilError::malformed(format!(
                    "unexpected {HEADER_START} at byte {at}"
                )));
            }
            (DecodeState::ReadingFields, Record::End) => DecodeState::Done,
            (DecodeState::ReadingFields, Record::Field(name, value)) => {
                if let Some(prev) = self.header.insert(&name, value)? {
                    log::warn!("Duplicate header field '{name}' (previous value {prev} replaced)");
                }
                DecodeState::ReadingFields
            }
            (DecodeState::Done, _) => DecodeState::Done,
        };

        Ok(self.state)
    }

    /// Читает заголовок до `HEADER_END` включительно.
    pub fn finish(mut self) -> FilResult<FilHeader> {
        while self.step()? != DecodeState::Done {}

        Ok(self.header.with_header_size(self.offset))
    }
}

impl FilHeaderExt for FilHeader {
    fn serialize(&self) -> FilResult<Vec<u8>> {
        write_header(self)
    }

    fn deserialize<R: Read>(reader: R) -> FilResult<Self> {
        read_header(reader)
    }

    fn encoded_len(&self) -> usize {
        encoded_len(self)
    }
}

/// Декодирует заголовок из начала потока.
///
/// [`FilHeader::header_size`] результата равен числу байт, прочитанных до
/// конца записи `HEADER_END` включительно.
pub fn read_header<R: Read>(reader: R) -> FilResult<FilHeader> {
    read_header_with(reader, &DecodeOptions::default())
}

/// [`read_header`] с трассировкой записей.
pub fn read_header_with<R: Read>(
    reader: R,
    options: &DecodeOptions,
) -> FilResult<FilHeader> {
    HeaderDecoder::new(reader, *options).finish()
}

/// Открывает файл и декодирует его заголовок.
pub fn read_header_file<P: AsRef<Path>>(path: P) -> FilResult<FilHeader> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(FilError::NotFound(path.to_path_buf()));
    }

    read_header(BufReader::new(File::open(path)?))
}

/// Кодирует заголовок: `HEADER_START`, поля в порядке вставки, `HEADER_END`.
pub fn write_header(header: &FilHeader) -> FilResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(encoded_len(header));
    write_header_to(&mut buf, header)?;
    Ok(buf)
}

/// Пишет закодированный заголовок в `writer`.
pub fn write_header_to<W: Write>(
    writer: &mut W,
    header: &FilHeader,
) -> FilResult<()> {
    Record::Start.write(writer)?;

    for (name, value) in header.iter() {
        Record::Field(name.to_string(), value.clone()).write(writer)?;
    }

    Record::End.write(writer)
}

/// Размер закодированного заголовка без его построения.
pub fn encoded_len(header: &FilHeader) -> usize {
    let fields: usize = header
        .iter()
        .map(|(name, value)| field_encoded_len(name, value))
        .sum();

    Record::Start.encoded_len() + fields + Record::End.encoded_len()
}

fn field_encoded_len(
    name: &str,
    value: &FieldValue,
) -> usize {
    string_encoded_len(name)
        + match value {
            FieldValue::Int(_) => 4,
            FieldValue::Double(_) => 8,
            FieldValue::Str(v) => string_encoded_len(v),
        }
}

fn check_field(
    name: &str,
    value: &FieldValue,
) -> FilResult<()> {
    if is_sentinel(name) {
        return Err(FilError::malformed(format!(
            "sentinel '{name}' cannot carry a value"
        )));
    }

    let kind =
        FieldKind::of(name).ok_or_else(|| FilError::malformed(format!("unknown field name '{name}'")))?;

    if value.kind() != kind {
        return Err(FilError::type_mismatch(format!(
            "field '{name}' is declared {kind}, got {}",
            value.kind()
        )));
    }

    if let FieldValue::Str(v) = value {
        if v.len() > MAX_STRING_LEN {
            return Err(FilError::malformed(format!(
                "field '{name}': string length {} exceeds {MAX_STRING_LEN}",
                v.len()
            )));
        }
    }

    Ok(())
}

fn int_to_wire(
    name: &str,
    v: i64,
) -> FilResult<i32> {
    i32::try_from(v).map_err(|_| {
        FilError::type_mismatch(format!("field '{name}' value {v} does not fit in i32"))
    })
}

fn record_name(record: &Record) -> &str {
    match record {
        Record::Start => HEADER_START,
        Record::End => HEADER_END,
        Record::Field(name, _) => name,
    }
}
