use std::io::{self, Write};

pub fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}

/// Consent gate for the compaction run. Anything other than an explicit yes
/// counts as a decline, including a prompt I/O error.
pub fn request_consent() -> bool {
    prompt_confirm(
        "This will shut down ALL running WSL instances before compacting. Continue?",
        Some(false),
    )
    .unwrap_or(false)
}
