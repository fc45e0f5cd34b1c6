use log::Level;

/// Режим открытия filterbank файла.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Только чтение (разделяемое отображение)
    #[default]
    ReadOnly,
    /// Чтение и запись области данных; изменения сбрасываются при закрытии
    ReadWrite,
}

/// Параметры декодирования заголовка.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Уровень трассировки каждой записи заголовка (None = молча)
    pub trace_level: Option<Level>,
}

/// Конфигурация открытия файла.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenConfig {
    pub mode: AccessMode,
    /// Уровень трассировки разбора заголовка и обращений к полям
    pub trace_level: Option<Level>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl AccessMode {
    pub fn is_writable(&self) -> bool {
        matches!(self, AccessMode::ReadWrite)
    }
}

impl DecodeOptions {
    pub fn with_trace(level: Level) -> Self {
        Self {
            trace_level: Some(level),
        }
    }
}

impl OpenConfig {
    pub fn read_only() -> Self {
        Self::default()
    }

    pub fn read_write() -> Self {
        Self {
            mode: AccessMode::ReadWrite,
            ..Self::default()
        }
    }

    pub fn mode(
        mut self,
        mode: AccessMode,
    ) -> Self {
        self.mode = mode;
        self
    }

    pub fn trace_level(
        mut self,
        level: Level,
    ) -> Self {
        self.trace_level = Some(level);
        self
    }

    /// Параметры декодера, соответствующие этой конфигурации.
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            trace_level: self.trace_level,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для AccessMode
////////////////////////////////////////////////////////////////////////////////

impl std::fmt::Display for AccessMode {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            AccessMode::ReadOnly => write!(f, "r"),
            AccessMode::ReadWrite => write!(f, "r+"),
        }
    }
}

impl std::str::FromStr for AccessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "r" | "ro" | "read" => Ok(AccessMode::ReadOnly),
            "r+" | "rw" | "write" => Ok(AccessMode::ReadWrite),
            _ => Err(format!("Unknown access mode: '{s}'. Use: r, r+")),
        }
    }
}
