//! Line-oriented transforms over in-memory content.
//!
//! Lines keep their own terminators (`\n`, `\r\n`, or none on an
//! unterminated final line), so untouched lines are copied byte for byte.

use crate::plan::Transform;

/// Split a line into its body and its terminator.
pub fn split_line(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Replace everything after the first `separator` on each line containing `marker`.
///
/// A matching line without a separator gets `separator` and `value` appended.
pub fn replace_value(content: &str, marker: &str, separator: &str, value: &str) -> Transform {
    let mut out = String::with_capacity(content.len() + value.len());
    let mut matches = 0;

    for line in content.split_inclusive('\n') {
        let (body, ending) = split_line(line);
        if !body.contains(marker) {
            out.push_str(line);
            continue;
        }

        matches += 1;
        let key = body.split_once(separator).map_or(body, |(key, _)| key);
        out.push_str(key);
        out.push_str(separator);
        out.push_str(value);
        out.push_str(ending);
    }

    Transform::from_scan(content, out, matches)
}

/// Replace every occurrence of `placeholder` in the whole content.
///
/// A file without the placeholder is left alone and reported as unmatched,
/// whether or not it was substituted before.
pub fn replace_all(content: &str, placeholder: &str, value: &str) -> Transform {
    let matches = content.matches(placeholder).count();
    Transform::from_scan(content, content.replace(placeholder, value), matches)
}

/// Drop every line whose body equals `target` exactly.
///
/// Nothing to drop means the file is already in the desired state.
pub fn remove_line(content: &str, target: &str) -> Transform {
    let mut out = String::with_capacity(content.len());
    let mut removed = 0;

    for line in content.split_inclusive('\n') {
        if split_line(line).0 == target {
            removed += 1;
        } else {
            out.push_str(line);
        }
    }

    if removed == 0 {
        Transform::Unchanged
    } else {
        Transform::Changed(out)
    }
}

/// Replace the token following `marker` + `delimiter` on each matching line.
///
/// The token runs up to the next whitespace or the end of the line; the rest
/// of the line is kept.
pub fn replace_tag(content: &str, marker: &str, delimiter: &str, value: &str) -> Transform {
    let needle = format!("{marker}{delimiter}");
    let mut out = String::with_capacity(content.len() + value.len());
    let mut matches = 0;

    for line in content.split_inclusive('\n') {
        let (body, ending) = split_line(line);
        let Some(found) = body.find(&needle) else {
            out.push_str(line);
            continue;
        };

        matches += 1;
        let start = found + needle.len();
        let end = body[start..]
            .find(char::is_whitespace)
            .map_or(body.len(), |offset| start + offset);
        out.push_str(&body[..start]);
        out.push_str(value);
        out.push_str(&body[end..]);
        out.push_str(ending);
    }

    Transform::from_scan(content, out, matches)
}
