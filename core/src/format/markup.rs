//! Legacy `&` color markup parser.

use std::fmt;

const MARKER: char = '&';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedColor {
    Black,
    DarkBlue,
    DarkGreen,
    DarkAqua,
    DarkRed,
    DarkPurple,
    Gold,
    Gray,
    DarkGray,
    Blue,
    Green,
    Aqua,
    Red,
    LightPurple,
    Yellow,
    White,
}

impl NamedColor {
    /// Color for a markup code (`0`-`9`, `a`-`f`, case-insensitive).
    pub fn from_code(code: char) -> Option<Self> {
        let color = match code.to_ascii_lowercase() {
            '0' => Self::Black,
            '1' => Self::DarkBlue,
            '2' => Self::DarkGreen,
            '3' => Self::DarkAqua,
            '4' => Self::DarkRed,
            '5' => Self::DarkPurple,
            '6' => Self::Gold,
            '7' => Self::Gray,
            '8' => Self::DarkGray,
            '9' => Self::Blue,
            'a' => Self::Green,
            'b' => Self::Aqua,
            'c' => Self::Red,
            'd' => Self::LightPurple,
            'e' => Self::Yellow,
            'f' => Self::White,
            _ => return None,
        };
        Some(color)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::DarkBlue => "dark_blue",
            Self::DarkGreen => "dark_green",
            Self::DarkAqua => "dark_aqua",
            Self::DarkRed => "dark_red",
            Self::DarkPurple => "dark_purple",
            Self::Gold => "gold",
            Self::Gray => "gray",
            Self::DarkGray => "dark_gray",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Aqua => "aqua",
            Self::Red => "red",
            Self::LightPurple => "light_purple",
            Self::Yellow => "yellow",
            Self::White => "white",
        }
    }
}

/// A span of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub color: NamedColor,
    pub bold: bool,
}

impl TextRun {
    pub fn new(text: impl Into<String>, color: NamedColor, bold: bool) -> Self {
        Self {
            text: text.into(),
            color,
            bold,
        }
    }
}

/// Styled text as a sequence of runs, ready to be handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledText {
    pub runs: Vec<TextRun>,
}

impl StyledText {
    /// Single run of plain, non-bold text.
    pub fn colored(text: impl Into<String>, color: NamedColor) -> Self {
        Self {
            runs: vec![TextRun::new(text, color, false)],
        }
    }

    /// Text content with all styling removed.
    pub fn plain(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

impl fmt::Display for StyledText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for run in &self.runs {
            if run.bold {
                write!(f, "[{} bold]{}", run.color.name(), run.text)?;
            } else {
                write!(f, "[{}]{}", run.color.name(), run.text)?;
            }
        }
        Ok(())
    }
}

struct RunBuilder {
    runs: Vec<TextRun>,
    pending: String,
    color: NamedColor,
    bold: bool,
}

impl RunBuilder {
    fn flush(&mut self) {
        if !self.pending.is_empty() {
            let text = std::mem::take(&mut self.pending);
            self.runs.push(TextRun::new(text, self.color, self.bold));
        }
    }
}

/// Parse `&` markup into styled runs. Text starts white and not bold; bold
/// stays on across later color changes. Never fails.
pub fn parse_markup(input: &str) -> StyledText {
    let mut builder = RunBuilder {
        runs: Vec::new(),
        pending: String::new(),
        color: NamedColor::White,
        bold: false,
    };

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != MARKER {
            builder.pending.push(c);
            continue;
        }

        let Some(&code) = chars.peek() else {
            builder.pending.push(c);
            break;
        };

        if let Some(color) = NamedColor::from_code(code) {
            builder.flush();
            builder.color = color;
            chars.next();
        } else if code.eq_ignore_ascii_case(&'l') {
            builder.flush();
            builder.bold = true;
            chars.next();
        } else {
            // Unknown code: the marker is literal, the next char is read normally
            builder.pending.push(c);
        }
    }

    builder.flush();
    StyledText { runs: builder.runs }
}
