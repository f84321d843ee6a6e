use crate::error::TopicError;

/// Check a scoped type id such as `::Demo::Clock`.
///
/// The id is one or more `::`-introduced segments; each segment starts with
/// an ASCII letter and continues with ASCII alphanumerics.
pub fn validate_type_id(type_id: &str) -> Result<(), TopicError> {
    if is_scoped_type_id(type_id) {
        Ok(())
    } else {
        Err(TopicError::InvalidType { type_id: type_id.to_string() })
    }
}

fn is_scoped_type_id(type_id: &str) -> bool {
    let Some(rest) = type_id.strip_prefix("::") else {
        return false;
    };
    rest.split("::").all(|segment| {
        let mut chars = segment.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {
                chars.all(|c| c.is_ascii_alphanumeric())
            }
            _ => false,
        }
    })
}

/// Name of the backing store for a topic. Bytes outside `[A-Za-z0-9._-]`
/// are written as `%` and their lowercase hex value.
pub fn database_name(topic: &str) -> String {
    let mut escaped = String::with_capacity(topic.len() + 6);
    escaped.push_str("topic-");
    for byte in topic.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-' | b'_') {
            escaped.push(char::from(byte));
        } else {
            escaped.push_str(&format!("%{byte:x}"));
        }
    }
    escaped
}
