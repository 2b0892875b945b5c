//! Name tags that carry numeric identities through tools which only keep
//! node names, e.g. `Head_ID=1234_`.

use std::fmt::Display;

const DELIMITER: char = '_';
const SEPARATOR: char = '=';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// Formats a single tag, `_<key>=<value>_`.
pub fn create(key: &str, value: impl Display) -> String {
    format!("{DELIMITER}{key}{SEPARATOR}{value}{DELIMITER}")
}

/// Appends a tag to `name`.
pub fn append(name: &str, key: &str, value: impl Display) -> String {
    format!("{name}{}", create(key, value))
}

/// Splits the trailing tags off `name`, returning the untagged name and the
/// tags in the order they were appended.
pub fn parse(name: &str) -> (&str, Vec<Tag>) {
    let mut rest = name;
    let mut tags = Vec::new();

    while let Some((head, tag)) = split_last_tag(rest) {
        tags.push(tag);
        rest = head;
    }

    tags.reverse();
    (rest, tags)
}

/// The name without any trailing tags.
pub fn strip(name: &str) -> &str {
    parse(name).0
}

fn split_last_tag(name: &str) -> Option<(&str, Tag)> {
    let body = name.strip_suffix(DELIMITER)?;
    let separator = body.rfind(SEPARATOR)?;
    let value = &body[separator + 1..];
    if value.is_empty() || value.contains(DELIMITER) {
        return None;
    }

    let key_start = body[..separator].rfind(DELIMITER)?;
    let key = &body[key_start + 1..separator];
    if key.is_empty() {
        return None;
    }

    Some((
        &name[..key_start],
        Tag {
            key: key.to_string(),
            value: value.to_string(),
        },
    ))
}
