use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};
use sigfil_types::{FilError, FilResult};

/// Читает i32 и сдвигает счётчик прочитанных байт.
pub fn read_i32_local<R: Read>(
    r: &mut R,
    off: &mut usize,
) -> FilResult<i32> {
    let v = r.read_i32::<LittleEndian>()?;
    *off += 4;
    Ok(v)
}

pub fn read_f64_local<R: Read>(
    r: &mut R,
    off: &mut usize,
) -> FilResult<f64> {
    let v = r.read_f64::<LittleEndian>()?;
    *off += 8;
    Ok(v)
}

/// Читает строку с префиксом длины i32.
///
/// Длина должна лежать в `min_len..=max_len`, иначе поток считается
/// повреждённым и чтение не выполняется.
pub fn read_string_local<R: Read>(
    r: &mut R,
    off: &mut usize,
    min_len: usize,
    max_len: usize,
) -> FilResult<String> {
    let len = read_i32_local(r, off)?;

    let len = usize::try_from(len)
        .ok()
        .filter(|l| (min_len..=max_len).contains(l))
        .ok_or_else(|| {
            FilError::malformed(format!(
                "string length {len} outside {min_len}..={max_len}"
            ))
        })?;

    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    *off += len;

    String::from_utf8(buf)
        .map_err(|e| FilError::malformed(format!("string is not valid UTF-8: {e}")))
}
