//! Font fallback chain configuration.

/// Monospace families tried in order when no primary family is configured,
/// or the configured one is missing.
pub const PRIMARY_CANDIDATES: &[&str] = &[
    "JetBrains Mono",
    "DejaVu Sans Mono",
    "Fira Code",
    "Menlo",
    "Consolas",
    "Liberation Mono",
    "Noto Sans Mono",
    "Courier New",
];

/// Fallback font families in priority order.
///
/// Searched in order when the styled font lacks a glyph:
/// 1. Nerd Font icon support
/// 2. CJK
/// 3. Monochrome symbols
/// 4. Color emoji
/// 5. General Unicode coverage
pub const FALLBACK_FAMILIES: &[&str] = &[
    // Nerd Fonts
    "Symbols Nerd Font",
    "JetBrainsMono Nerd Font",
    "FiraCode Nerd Font",
    // CJK fonts
    "Noto Sans CJK JP",
    "Noto Sans CJK SC",
    "Noto Sans CJK KR",
    "Microsoft YaHei",
    "MS Gothic",
    // Monochrome symbol fonts (before emoji to prefer outline rendering for dingbats)
    "Apple Symbols",
    "Segoe UI Symbol",
    "Noto Sans Symbols",
    "Noto Sans Symbols 2",
    "DejaVu Sans",
    "Symbola",
    // Color emoji fonts
    "Noto Color Emoji",
    "Apple Color Emoji",
    "Segoe UI Emoji",
    // General fallbacks
    "Arial Unicode MS",
    "Liberation Sans",
];
