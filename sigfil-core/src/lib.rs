//! Библиотека чтения и записи sigproc filterbank файлов
//!
//! Кодек заголовка из помеченных записей и окна без копирования над
//! отображённой в память областью спектров.
//!
//! # Быстрый старт
//!
//! ```no_run
//! use sigfil_core::{create, FilHeader, FilterbankFile};
//!
//! let header = FilHeader::new()
//!     .with("source_name", "B0329+54")?
//!     .with("fch1", 1400.0)?
//!     .with("foff", -1.0)?
//!     .with("nchans", 4)?
//!     .with("nbits", 8)?
//!     .with("tsamp", 0.001)?;
//!
//! create("pulsar.fil", &header, Some(&[1u8, 2, 3, 4, 5, 6, 7, 8][..]))?;
//!
//! let fil = FilterbankFile::open_read_only("pulsar.fil")?;
//! let window = fil.time_range(0.0, 0.002)?;
//! assert_eq!(window.len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod binary;
pub mod config;
pub mod file;
pub mod format;
pub mod geometry;
pub mod sample;
pub mod serialization;
pub mod view;

pub use binary::*;
pub use config::*;
pub use file::*;
pub use format::*;
pub use geometry::*;
pub use sample::*;
pub use serialization::*;
pub use sigfil_types::{
    FieldKind, FieldValue, FilError, FilHeader, FilResult, SampleFormat, FIELD_TABLE, HEADER_END,
    HEADER_START,
};
pub use view::*;

/// Версия библиотеки.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
