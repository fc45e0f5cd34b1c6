use std::path::PathBuf;

use thiserror::Error;

/// Результат для операций sigfil
pub type FilResult<T> = std::result::Result<T, FilError>;

/// Типы ошибок чтения и записи filterbank файлов.
#[derive(Debug, Error)]
pub enum FilError {
    /// Путь не указывает на существующий файл
    #[error("File not found: {0:?}")]
    NotFound(PathBuf),

    /// Ошибки ввода/вывода, включая усечённый поток (автоконвертируются из
    /// std::io::Error)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Неизвестное имя поля или нарушен порядок служебных записей
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// Тип значения не совпадает с объявленным в словаре полей
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// `nbits` вне множества {8, 16, 32}
    #[error("Unsupported sample width: nbits={0} (supported: 8, 16, 32)")]
    UnsupportedSampleWidth(i64),

    /// Поле отсутствует в заголовке
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Размер спектра не совпадает с количеством каналов
    #[error("Shape mismatch: expected {expected} samples, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    /// Индекс спектра или канала вне окна
    #[error("Index {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },

    /// Попытка изменить данные файла, открытого только для чтения
    #[error("File is opened read-only")]
    ReadOnly,
}

impl FilError {
    /// Удобные конструкторы
    pub fn malformed<S: Into<String>>(s: S) -> Self {
        Self::MalformedHeader(s.into())
    }

    pub fn type_mismatch<S: Into<String>>(s: S) -> Self {
        Self::TypeMismatch(s.into())
    }

    pub fn unknown_field<S: Into<String>>(s: S) -> Self {
        Self::UnknownField(s.into())
    }
}
