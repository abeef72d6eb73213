//! Config command.

use crate::config::FragmindConfig;
use anyhow::Result;
use std::io::Write;

/// Placeholder printed instead of a configured token.
const REDACTED: &str = "********";

/// Writes the resolved configuration as TOML, with the token redacted.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_config<W: Write>(writer: &mut W, config: &FragmindConfig) -> Result<()> {
    let mut shown = config.clone();
    if shown.endpoint.token.is_some() {
        shown.endpoint.token = Some(REDACTED.to_string());
    }
    let toml = toml::to_string_pretty(&shown)?;
    write!(writer, "{toml}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_output_redacts_token() {
        let mut config = FragmindConfig::default();
        config.endpoint.token = Some("secret-token".to_string());
        let mut out = Vec::new();
        write_config(&mut out, &config).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[endpoint]"));
        assert!(text.contains(REDACTED));
        assert!(!text.contains("secret-token"));
    }
}
