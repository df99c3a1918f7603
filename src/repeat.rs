//! Shared bounded-repetition builder.

/// Render `item` repeated between `min` and `max` times (unbounded when
/// `max` is `None`), optionally joined by `separator`.
///
/// Without a separator this maps straight onto the grammar quantifiers
/// (`?`, `*`, `+`, `{m,n}`). With one, the first occurrence is emitted bare
/// and the remainder as a repetition of `(separator item)`.
pub fn build_repetition(
    item: &str,
    min: u64,
    max: Option<u64>,
    separator: Option<&str>,
) -> String {
    if min == 0 && max == Some(1) {
        return format!("{item}?");
    }
    match separator {
        None => match (min, max) {
            (1, None) => format!("{item}+"),
            (0, None) => format!("{item}*"),
            (m, None) => format!("{item}{{{m},}}"),
            (m, Some(n)) => format!("{item}{{{m},{n}}}"),
        },
        Some(sep) => {
            let rest = build_repetition(
                &format!("({sep} {item})"),
                min.saturating_sub(1),
                max.map(|n| n.saturating_sub(1)),
                None,
            );
            let result = format!("{item} {rest}");
            if min == 0 {
                format!("({result})?")
            } else {
                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_quantifiers() {
        assert_eq!(build_repetition("x", 0, Some(1), None), "x?");
        assert_eq!(build_repetition("x", 0, None, None), "x*");
        assert_eq!(build_repetition("x", 1, None, None), "x+");
        assert_eq!(build_repetition("x", 2, None, None), "x{2,}");
        assert_eq!(build_repetition("x", 2, Some(4), None), "x{2,4}");
        assert_eq!(build_repetition("x", 3, Some(3), None), "x{3,3}");
    }

    #[test]
    fn separated_repetition() {
        let sep = Some("\",\" space");
        assert_eq!(
            build_repetition("item", 0, None, sep),
            "(item (\",\" space item)*)?"
        );
        assert_eq!(
            build_repetition("item", 1, Some(2), sep),
            "item (\",\" space item)?"
        );
        assert_eq!(
            build_repetition("item", 2, Some(4), sep),
            "item (\",\" space item){1,3}"
        );
    }
}
