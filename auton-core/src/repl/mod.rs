//! REPL tooling for the host emulator.
//!
//! The grammar lives in [`grammar`] and is implemented with a token/parse
//! pipeline that stays compatible with `no_std`. Command names and help text
//! come from [`catalog`]; `status` output is rendered by [`status`].

pub mod catalog;
pub mod grammar;
pub mod status;

use core::fmt;

/// Renders `help` output, one command per line.
///
/// An unknown topic falls back to the full listing after a notice line.
pub fn write_help<W: fmt::Write>(writer: &mut W, topic: Option<&str>) -> fmt::Result {
    if let Some(topic) = topic {
        if let Some(spec) = catalog::find(topic) {
            return writeln!(writer, "{:<28}{}", spec.usage, spec.summary);
        }
        writeln!(writer, "no help for `{topic}`")?;
    }
    for spec in &catalog::COMMANDS {
        writeln!(writer, "{:<28}{}", spec.usage, spec.summary)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use heapless::String;

    use super::*;

    #[test]
    fn help_for_single_command() {
        let mut out: String<256> = String::new();
        write_help(&mut out, Some("TICK")).expect("fits");
        assert!(out.starts_with("tick [count]"));
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn unknown_topic_lists_everything() {
        let mut out: String<1024> = String::new();
        write_help(&mut out, Some("reboot")).expect("fits");
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("no help for `reboot`"));
        assert_eq!(lines.count(), catalog::COMMANDS.len());
    }
}
