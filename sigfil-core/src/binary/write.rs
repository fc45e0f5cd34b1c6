use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use sigfil_types::{FilError, FilResult};

pub fn write_i32_local<W: Write>(
    w: &mut W,
    val: i32,
) -> FilResult<()> {
    w.write_i32::<LittleEndian>(val)?;
    Ok(())
}

pub fn write_f64_local<W: Write>(
    w: &mut W,
    val: f64,
) -> FilResult<()> {
    w.write_f64::<LittleEndian>(val)?;
    Ok(())
}

/// Пишет строку с префиксом длины i32.
pub fn write_string_local<W: Write>(
    w: &mut W,
    val: &str,
) -> FilResult<()> {
    let len = i32::try_from(val.len())
        .map_err(|_| FilError::malformed(format!("string of {} bytes is too long", val.len())))?;

    write_i32_local(w, len)?;
    w.write_all(val.as_bytes())?;
    Ok(())
}

/// Размер строки на диске: префикс длины + байты.
pub fn string_encoded_len(val: &str) -> usize {
    4 + val.len()
}
