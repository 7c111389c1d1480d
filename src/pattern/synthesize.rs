// ABOUTME: Builds a literal string from a pattern when nothing matches yet
// ABOUTME: Substitutes the first capturing group and drops all other capturing groups

/// Build a literal from `pattern`: the first capturing group becomes
/// `replacement`, every other capturing group disappears, and `(?...)`
/// groups stay as written. Punctuation escapes are unescaped, character
/// classes are skipped over when looking for groups, and a leading `^` or
/// trailing `$` anchor is dropped.
pub fn synthesize_from_pattern(pattern: &str, replacement: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + replacement.len());
    let mut seen_capture = false;
    let mut i = 0;

    let end = if chars.last() == Some(&'$') && !is_escaped(&chars, chars.len() - 1) {
        chars.len() - 1
    } else {
        chars.len()
    };
    if chars.first() == Some(&'^') {
        i = 1;
    }

    while i < end {
        match chars[i] {
            '\\' if i + 1 < end => {
                let next = chars[i + 1];
                if next.is_ascii_alphanumeric() {
                    out.push('\\');
                }
                out.push(next);
                i += 2;
            }
            '[' => {
                let close = skip_class(&chars, i);
                out.extend(&chars[i..close.min(end)]);
                i = close;
            }
            '(' if is_capturing(&chars, i) => {
                if !seen_capture {
                    out.push_str(replacement);
                    seen_capture = true;
                }
                i = skip_group(&chars, i);
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

/// `(` opens a capturing group unless it is a `(?...)` construct, with the
/// exception of named groups `(?<name>` / `(?P<name>`.
fn is_capturing(chars: &[char], open: usize) -> bool {
    if chars.get(open + 1) != Some(&'?') {
        return true;
    }
    match chars.get(open + 2) {
        Some('P') => chars.get(open + 3) == Some(&'<'),
        Some('<') => !matches!(chars.get(open + 3), Some('=') | Some('!')),
        _ => false,
    }
}

fn is_escaped(chars: &[char], index: usize) -> bool {
    let mut backslashes = 0;
    let mut j = index;
    while j > 0 && chars[j - 1] == '\\' {
        backslashes += 1;
        j -= 1;
    }
    backslashes % 2 == 1
}

/// Index just past the `]` closing the class that opens at `open`
fn skip_class(chars: &[char], open: usize) -> usize {
    let mut i = open + 1;
    // A leading `]` (or `^]`) is literal
    if chars.get(i) == Some(&'^') {
        i += 1;
    }
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            ']' => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

/// Index just past the `)` closing the group that opens at `open`
fn skip_group(chars: &[char], open: usize) -> usize {
    let mut depth = 0usize;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                i += 2;
                continue;
            }
            '[' => {
                i = skip_class(chars, i);
                continue;
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    chars.len()
}
