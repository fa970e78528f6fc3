use anyhow::Result;

fn parse_device_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(feature = "mic")]
fn detect_input_devices() -> Vec<String> {
    nossat::audio::list_input_devices().unwrap_or_else(|err| {
        eprintln!("Failed to list audio input devices: {err:#}");
        Vec::new()
    })
}

#[cfg(not(feature = "mic"))]
fn detect_input_devices() -> Vec<String> {
    eprintln!("Failed to list audio input devices: built without the `mic` feature");
    Vec::new()
}

pub(crate) fn list_input_devices() -> Result<()> {
    // NOSSAT_TEST_DEVICES stands in for the host audio stack in tests.
    let devices = match std::env::var("NOSSAT_TEST_DEVICES") {
        Ok(raw) => parse_device_list(&raw),
        Err(_) => detect_input_devices(),
    };

    if devices.is_empty() {
        println!("No audio input devices detected.");
    } else {
        println!("Available audio input devices:");
        for name in devices {
            println!("  - {name}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_list_skips_blank_entries() {
        assert_eq!(parse_device_list(" USB Mic , ,Array "), ["USB Mic", "Array"]);
        assert!(parse_device_list("  ").is_empty());
    }
}
