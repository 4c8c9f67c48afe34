use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const DEFAULT_COLOR: &str = "#FF0000";

static COLOR_CATALOG: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("NARANJA", "#FFA500"),
        ("ROJO", "#FF0000"),
    ])
});

/// Maps a color name from the input row to its hex value, falling back to the
/// default for unknown or empty names.
pub fn color_by_name(name: &str) -> &'static str {
    let normalized = name.trim().to_uppercase();
    COLOR_CATALOG
        .get(normalized.as_str())
        .copied()
        .unwrap_or(DEFAULT_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_colors_resolve_case_insensitively() {
        assert_eq!(color_by_name("naranja"), "#FFA500");
        assert_eq!(color_by_name("  ROJO "), "#FF0000");
    }

    #[test]
    fn unknown_names_use_the_default() {
        assert_eq!(color_by_name("FUCSIA"), DEFAULT_COLOR);
        assert_eq!(color_by_name(""), DEFAULT_COLOR);
    }
}
