pub mod prompt;

/// Format a byte count as a human-readable string (B, KB, MB, GB)
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * 1024 * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Decode captured console output from a Windows system utility.
/// wsl.exe and friends write UTF-16LE while diskpart and PowerShell emit the
/// console codepage, so the encoding is sniffed per capture. The UTF-16 path
/// keeps localized error text intact instead of mangling every non-ASCII
/// character.
pub fn decode_console_output(bytes: &[u8]) -> String {
    if looks_utf16le(bytes) {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
            .trim_start_matches('\u{feff}')
            .to_string()
    } else {
        String::from_utf8_lossy(bytes).replace('\0', "")
    }
}

fn looks_utf16le(bytes: &[u8]) -> bool {
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return true;
    }
    if bytes.len() < 2 || bytes.len() % 2 != 0 {
        return false;
    }
    // ASCII-range UTF-16LE has a NUL high byte in every code unit; console
    // text is majority-ASCII even when localized.
    let units = bytes.len() / 2;
    let nul_high_bytes = bytes.iter().skip(1).step_by(2).filter(|&&b| b == 0).count();
    nul_high_bytes * 2 >= units
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.00 GB");
        assert_eq!(format_size(32 * 1024 * 1024 * 1024), "32.00 GB");
    }

    #[test]
    fn test_decode_console_output_strips_utf16_nulls() {
        // "Ubuntu" as wsl.exe would emit it.
        let raw: Vec<u8> = "Ubuntu"
            .bytes()
            .flat_map(|b| [b, 0u8])
            .collect();
        assert_eq!(decode_console_output(&raw), "Ubuntu");
        assert_eq!(decode_console_output(b"plain ascii"), "plain ascii");
    }

    #[test]
    fn test_decode_console_output_keeps_localized_utf16_text() {
        let text = "Versión no válida";
        let raw: Vec<u8> = text
            .encode_utf16()
            .flat_map(|unit| unit.to_le_bytes())
            .collect();
        assert_eq!(decode_console_output(&raw), text);
    }

    #[test]
    fn test_decode_console_output_strips_utf16_bom() {
        let raw: Vec<u8> = std::iter::once(0xFEFFu16)
            .chain("Fehler".encode_utf16())
            .flat_map(|unit| unit.to_le_bytes())
            .collect();
        assert_eq!(decode_console_output(&raw), "Fehler");
    }
}
