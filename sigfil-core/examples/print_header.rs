//! Пример: печать заголовка и геометрии filterbank файла
//!
//! ```text
//! cargo run -p sigfil-core --example print_header -- observation.fil
//! RUST_LOG=trace cargo run -p sigfil-core --example print_header -- observation.fil
//! ```

use std::io::stdout;

use log::Level;
use sigfil_core::{FilterbankFile, OpenConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .format_timestamp_secs()
        .init();

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: print_header <file.fil>")?;

    let fil = FilterbankFile::open(&path, OpenConfig::read_only().trace_level(Level::Trace))?;

    fil.print_header(&mut stdout())?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Header size   : {} B", fil.header_size());
    println!("  Sample format : {} ({} B/sample)", fil.sample_format(), fil.sample_width_bytes());
    println!("  Channels      : {}", fil.nchans());
    println!(
        "  Frequencies   : {:.3} .. {:.3} MHz ({})",
        fil.channel_frequencies().first().copied().unwrap_or_default(),
        fil.channel_frequencies().last().copied().unwrap_or_default(),
        if fil.is_descending_frequency() { "descending" } else { "ascending" }
    );
    println!("  Spectra       : {}", fil.spectra_count());
    if let Some(duration) = fil.duration_secs() {
        println!("  Duration      : {duration:.3} s");
    }
    if fil.has_partial_spectrum() {
        println!("  Warning       : trailing partial spectrum ignored");
    }

    // --- Первый спектр ---
    if let Some(first) = fil.spectra().spectrum(0) {
        let values: Vec<String> = (0..first.nchans().min(8))
            .filter_map(|c| first.get(c))
            .map(|v| format!("{:.1}", v.as_f64()))
            .collect();
        println!("  Spectrum[0]   : [{}{}]", values.join(", "), if first.nchans() > 8 { ", …" } else { "" });
    }

    Ok(())
}
