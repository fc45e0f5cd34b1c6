use std::fmt;

use crate::{is_sentinel, FieldKind, FieldValue, FilError, FilResult};

/// Заголовок filterbank файла.
///
/// Упорядоченное отображение имя поля → значение (порядок вставки
/// сохраняется и повторяется при записи) и смещение первого байта данных
/// `header_size`, известное после декодирования.
#[derive(Debug, Clone, Default)]
pub struct FilHeader {
    fields: Vec<(String, FieldValue)>,
    header_size: usize,
}

impl FilHeader {
    /// Пустой заголовок.
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавляет поле, проверяя имя и вид значения по словарю.
    ///
    /// Повторная вставка того же имени заменяет значение, сохраняя позицию
    /// поля, и возвращает прежнее значение.
    pub fn insert<V: Into<FieldValue>>(
        &mut self,
        name: &str,
        value: V,
    ) -> FilResult<Option<FieldValue>> {
        let value = value.into();

        if is_sentinel(name) {
            return Err(FilError::malformed(format!(
                "sentinel '{name}' cannot be stored as a field"
            )));
        }

        let kind = FieldKind::of(name)
            .ok_or_else(|| FilError::malformed(format!("unknown field name '{name}'")))?;

        if value.kind() != kind {
            return Err(FilError::type_mismatch(format!(
                "field '{name}' is declared {kind}, got {}",
                value.kind()
            )));
        }

        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => Ok(Some(std::mem::replace(slot, value))),
            None => {
                self.fields.push((name.to_string(), value));
                Ok(None)
            }
        }
    }

    /// Builder-вариант [`insert`](Self::insert).
    pub fn with<V: Into<FieldValue>>(
        mut self,
        name: &str,
        value: V,
    ) -> FilResult<Self> {
        self.insert(name, value)?;
        Ok(self)
    }

    /// Устанавливает смещение начала данных (заполняется декодером).
    pub fn with_header_size(
        mut self,
        header_size: usize,
    ) -> Self {
        self.header_size = header_size;
        self
    }

    /// Смещение первого байта данных; 0 для заголовка, собранного в памяти.
    pub fn header_size(&self) -> usize {
        self.header_size
    }

    pub fn get(
        &self,
        name: &str,
    ) -> FilResult<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| FilError::unknown_field(name))
    }

    pub fn get_int(
        &self,
        name: &str,
    ) -> FilResult<i64> {
        let value = self.get(name)?;
        value
            .as_int()
            .ok_or_else(|| mismatch(name, FieldKind::Int, value))
    }

    pub fn get_double(
        &self,
        name: &str,
    ) -> FilResult<f64> {
        let value = self.get(name)?;
        value
            .as_double()
            .ok_or_else(|| mismatch(name, FieldKind::Double, value))
    }

    pub fn get_str(
        &self,
        name: &str,
    ) -> FilResult<&str> {
        let value = self.get(name)?;
        value
            .as_str()
            .ok_or_else(|| mismatch(name, FieldKind::Str, value))
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Поля в порядке вставки.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Поля, отсортированные по имени (служебные записи не хранятся).
    pub fn sorted_fields(&self) -> Vec<(&str, &FieldValue)> {
        let mut fields: Vec<_> = self.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        fields
    }
}

/// Сравнивает только поля: `header_size` описывает положение в файле, а не
/// содержимое заголовка.
impl PartialEq for FilHeader {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.fields == other.fields
    }
}

/// Одна строка `name: value` на поле, по алфавиту.
impl fmt::Display for FilHeader {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        for (name, value) in self.sorted_fields() {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

fn mismatch(
    name: &str,
    expected: FieldKind,
    found: &FieldValue,
) -> FilError {
    FilError::type_mismatch(format!(
        "field '{name}' holds {}, requested {expected}",
        found.kind()
    ))
}
