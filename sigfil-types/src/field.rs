use std::fmt;

/// Служебная запись, открывающая заголовок.
pub const HEADER_START: &str = "HEADER_START";

/// Служебная запись, закрывающая заголовок.
pub const HEADER_END: &str = "HEADER_END";

/// Способ кодирования значения поля на диске.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 32-битное целое со знаком
    Int,
    /// 64-битное число с плавающей точкой
    Double,
    /// Строка с префиксом длины
    Str,
}

/// Закрытый словарь полей заголовка: имя → вид значения.
pub const FIELD_TABLE: &[(&str, FieldKind)] = &[
    ("telescope_id", FieldKind::Int),
    ("machine_id", FieldKind::Int),
    ("data_type", FieldKind::Int),
    ("rawdatafile", FieldKind::Str),
    ("source_name", FieldKind::Str),
    ("barycentric", FieldKind::Int),
    ("pulsarcentric", FieldKind::Int),
    ("az_start", FieldKind::Double),
    ("za_start", FieldKind::Double),
    ("src_raj", FieldKind::Double),
    ("src_dej", FieldKind::Double),
    ("tstart", FieldKind::Double),
    ("tsamp", FieldKind::Double),
    ("nbits", FieldKind::Int),
    ("nsamples", FieldKind::Int),
    ("nbeams", FieldKind::Int),
    ("ibeam", FieldKind::Int),
    ("fch1", FieldKind::Double),
    ("foff", FieldKind::Double),
    ("nchans", FieldKind::Int),
    ("nifs", FieldKind::Int),
    ("refdm", FieldKind::Double),
    ("period", FieldKind::Double),
    ("nbins", FieldKind::Int),
];

impl FieldKind {
    /// Вид значения для имени из словаря, `None` для неизвестных имён и
    /// служебных записей.
    pub fn of(name: &str) -> Option<Self> {
        FIELD_TABLE
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, kind)| *kind)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            FieldKind::Int => write!(f, "int"),
            FieldKind::Double => write!(f, "double"),
            FieldKind::Str => write!(f, "string"),
        }
    }
}

/// `true` для `HEADER_START` и `HEADER_END`.
pub fn is_sentinel(name: &str) -> bool {
    name == HEADER_START || name == HEADER_END
}
