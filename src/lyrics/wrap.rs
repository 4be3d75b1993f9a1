//! Caption line wrapping.

/// Split `text` into at most two lines of roughly equal length.
///
/// Text that fits in `max_chars` is returned as is. Otherwise the split
/// goes at the word boundary where the running length first reaches the
/// midpoint; if the second half is still too long the split moves one word
/// earlier. Words are never broken, so a single overlong word stays whole.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let len = text.chars().count();
    if len <= max_chars {
        return vec![text.to_string()];
    }

    let words = text.split_whitespace().collect::<Vec<_>>();
    if words.len() <= 1 {
        return vec![text.trim().to_string()];
    }

    let midpoint = len / 2;
    let mut split = words.len() / 2;
    let mut running = 0;
    for (i, word) in words.iter().enumerate() {
        running += word.chars().count() + usize::from(i > 0);
        if running >= midpoint {
            split = i;
            break;
        }
    }
    // Keep at least one word on the first line.
    let mut split = split.max(1);

    if words[split..].join(" ").chars().count() > max_chars && split > 1 {
        split -= 1;
    }

    vec![words[..split].join(" "), words[split..].join(" ")]
}
