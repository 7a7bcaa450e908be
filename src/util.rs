/// 24-bit Red-Green-Blue color
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    /// Build a color from a `0xrrggbb` literal
    pub const fn hex(value: u32) -> Self {
        // Casting will truncate the more significant bits
        Self {
            red: (value >> 16) as u8,
            green: (value >> 8) as u8,
            blue: value as u8,
        }
    }

    /// Wrap text in the ANSI escape codes to render it in this color on a
    /// truecolor terminal
    pub fn paint(self, text: &str) -> String {
        format!(
            "\x1b[38;2;{};{};{}m{text}\x1b[0m",
            self.red, self.green, self.blue
        )
    }
}

/// Capitalize the first letter of every word and lowercase the rest. A word
/// is any run of alphabetic characters, so "light rain/snow" becomes
/// "Light Rain/Snow".
pub fn title_case(s: &str) -> String {
    let mut output = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                output.extend(c.to_lowercase());
            } else {
                output.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            output.push(c);
            in_word = false;
        }
    }
    output
}
