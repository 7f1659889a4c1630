fn sanitize_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_sep = false;
    for ch in value.chars() {
        if ch.is_ascii_whitespace() {
            if !out.is_empty() && !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else if ch.is_ascii_graphic() {
            out.push(ch);
            prev_sep = false;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "na".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Non-fatal event (orphan reply, media failure). One line on stderr,
/// grep-friendly key=value fields.
pub fn warn(code: &str, status: &str, detail: &str, err: &str) {
    eprintln!(
        "ARCHIVE_WARN code={} status={} detail={} err={}",
        sanitize_value(code),
        sanitize_value(status),
        sanitize_value(detail),
        sanitize_value(err),
    );
}

pub fn info(message: &str) {
    eprintln!("masto-archive: {message}");
}

#[cfg(test)]
mod tests {
    use super::sanitize_value;

    #[test]
    fn sanitize_value_rewrites_whitespace() {
        assert_eq!(sanitize_value("a b\tc"), "a_b_c");
    }

    #[test]
    fn sanitize_value_falls_back_for_empty() {
        assert_eq!(sanitize_value("   "), "na");
    }
}
