use std::fmt;

/// The 16 tile colors. Every color is addressed two ways: by palette index
/// 0-15 on the wire, and by a single hex digit in console commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileColor {
    Black,
    Gray,
    Silver,
    White,
    Maroon,
    Red,
    Olive,
    Yellow,
    Green,
    Lime,
    Teal,
    Aqua,
    Navy,
    Blue,
    Purple,
    Fuchsia,
}

impl TileColor {
    pub const ALL: [TileColor; 16] = [
        TileColor::Black,
        TileColor::Gray,
        TileColor::Silver,
        TileColor::White,
        TileColor::Maroon,
        TileColor::Red,
        TileColor::Olive,
        TileColor::Yellow,
        TileColor::Green,
        TileColor::Lime,
        TileColor::Teal,
        TileColor::Aqua,
        TileColor::Navy,
        TileColor::Blue,
        TileColor::Purple,
        TileColor::Fuchsia,
    ];

    pub fn from_index(index: u32) -> Option<TileColor> {
        match index {
            0 => Some(TileColor::Black),
            1 => Some(TileColor::Gray),
            2 => Some(TileColor::Silver),
            3 => Some(TileColor::White),
            4 => Some(TileColor::Maroon),
            5 => Some(TileColor::Red),
            6 => Some(TileColor::Olive),
            7 => Some(TileColor::Yellow),
            8 => Some(TileColor::Green),
            9 => Some(TileColor::Lime),
            10 => Some(TileColor::Teal),
            11 => Some(TileColor::Aqua),
            12 => Some(TileColor::Navy),
            13 => Some(TileColor::Blue),
            14 => Some(TileColor::Purple),
            15 => Some(TileColor::Fuchsia),
            _ => None,
        }
    }

    pub fn index(self) -> u32 {
        self as u32
    }

    /// Accepts either case, `'0'`-`'9'` and `'a'`/`'A'`-`'f'`/`'F'`.
    pub fn from_code(code: char) -> Option<TileColor> {
        code.to_digit(16).and_then(TileColor::from_index)
    }

    pub fn code(self) -> char {
        char::from_digit(self as u32, 16).unwrap().to_ascii_uppercase()
    }

    pub fn name(self) -> &'static str {
        match self {
            TileColor::Black => "black",
            TileColor::Gray => "gray",
            TileColor::Silver => "silver",
            TileColor::White => "white",
            TileColor::Maroon => "maroon",
            TileColor::Red => "red",
            TileColor::Olive => "olive",
            TileColor::Yellow => "yellow",
            TileColor::Green => "green",
            TileColor::Lime => "lime",
            TileColor::Teal => "teal",
            TileColor::Aqua => "aqua",
            TileColor::Navy => "navy",
            TileColor::Blue => "blue",
            TileColor::Purple => "purple",
            TileColor::Fuchsia => "fuchsia",
        }
    }
}

impl fmt::Display for TileColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
