// Linux-specific helpers: /etc/os-release.

/// Read the distro name from /etc/os-release (Linux) for `os.description`.
pub(super) fn read_os_pretty_name() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/etc/os-release").ok()?;
        parse_os_release_name(&content)
    }
    #[cfg(not(target_os = "linux"))]
    None
}

/// PRETTY_NAME, falling back to NAME.
fn parse_os_release_name(content: &str) -> Option<String> {
    let value_of = |key: &str| {
        content
            .lines()
            .find_map(|line| line.strip_prefix(key))
            .map(|v| v.trim().trim_matches('"').to_string())
            .filter(|v| !v.is_empty())
    };
    value_of("PRETTY_NAME=").or_else(|| value_of("NAME="))
}

#[cfg(test)]
mod tests {
    use super::parse_os_release_name;

    #[test]
    fn prefers_pretty_name() {
        let content = "NAME=\"Debian GNU/Linux\"\nPRETTY_NAME=\"Debian GNU/Linux 12 (bookworm)\"\n";
        assert_eq!(
            parse_os_release_name(content).as_deref(),
            Some("Debian GNU/Linux 12 (bookworm)")
        );
    }

    #[test]
    fn falls_back_to_name_when_pretty_name_empty() {
        let content = "PRETTY_NAME=\"\"\nNAME=Alpine Linux\n";
        assert_eq!(parse_os_release_name(content).as_deref(), Some("Alpine Linux"));
    }

    #[test]
    fn none_when_no_name_keys() {
        assert_eq!(parse_os_release_name("ID=arch\n"), None);
    }
}
