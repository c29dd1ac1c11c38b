//! UI Theme - colors and column widths shared by every command

use crossterm::style::Color;

/// Default theme for depot output
#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub colors: ColorScheme,
    pub layout: Layout,
}

#[derive(Debug, Clone)]
pub struct ColorScheme {
    /// Application and release names
    pub name: Color,
    /// Version labels
    pub version: Color,
    /// Sizes, dates and other secondary info
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            name: Color::White,
            version: Color::Cyan,
            secondary: Color::DarkGrey,
            success: Color::Green,
            warning: Color::Yellow,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Layout {
    /// Label column in key/value blocks
    pub label_width: usize,
    pub id_width: usize,
    pub name_width: usize,
    pub version_width: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            label_width: 12,
            id_width: 5,
            name_width: 24,
            version_width: 12,
        }
    }
}

/// Human readable byte count
pub fn format_size(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    let mb = kb / 1024.0;
    if mb >= 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else if kb >= 1024.0 {
        format!("{mb:.1} MB")
    } else if kb >= 1.0 {
        format!("{kb:.1} KB")
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
