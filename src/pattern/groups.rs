/// Indexes of the top-level capturing groups of `source`, in textual order.
///
/// Groups nested inside another capturing group are counted (so indexes
/// line up with the runtime captures) but not returned: their text is
/// already covered by the enclosing group.
pub fn capture_group_indexes(source: &str) -> Vec<usize> {
    let bytes = source.as_bytes();
    let mut groups = Vec::new();
    // One entry per open parenthesis: whether it opened a capturing group.
    let mut stack: Vec<bool> = Vec::new();
    let mut index = 0usize;
    let mut class_depth = 0usize;
    let mut escaped = false;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        if escaped {
            escaped = false;
            i += 1;
            continue;
        }
        match b {
            b'\\' => escaped = true,
            b'[' => {
                class_depth += 1;
                // A `]` right after the opener (or after `^`) is a literal.
                if bytes.get(i + 1) == Some(&b'^') {
                    i += 1;
                }
                if bytes.get(i + 1) == Some(&b']') {
                    i += 1;
                }
            }
            b']' if class_depth > 0 => class_depth -= 1,
            b'(' if class_depth == 0 => {
                let capturing = is_capturing(&source[i + 1..]);
                if capturing {
                    index += 1;
                    if !stack.iter().any(|open| *open) {
                        groups.push(index);
                    }
                }
                stack.push(capturing);
            }
            b')' if class_depth == 0 => {
                stack.pop();
            }
            _ => {}
        }
        i += 1;
    }

    groups
}

fn is_capturing(rest: &str) -> bool {
    if !rest.starts_with('?') {
        return true;
    }
    rest.starts_with("?P<")
        || (rest.starts_with("?<") && !rest.starts_with("?<=") && !rest.starts_with("?<!"))
}
