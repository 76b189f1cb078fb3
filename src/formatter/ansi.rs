//! ANSI select-graphic-rendition (SGR) codes.

pub const ESC_START: &str = "\x1b[";
pub const ESC_END: &str = "m";

pub const RESET: &str = "0";

pub const BOLD_ON: &str = "1";
pub const ITALICS_ON: &str = "3";
pub const UNDERLINE_ON: &str = "4";
pub const INVERSE_ON: &str = "7";
pub const STRIKETHROUGH_ON: &str = "9";

pub const BOLD_OFF: &str = "22";
pub const ITALICS_OFF: &str = "23";
pub const UNDERLINE_OFF: &str = "24";
pub const INVERSE_OFF: &str = "27";
pub const STRIKETHROUGH_OFF: &str = "29";

pub const BLACK_FG: &str = "30";
pub const RED_FG: &str = "31";
pub const GREEN_FG: &str = "32";
pub const YELLOW_FG: &str = "33";
pub const BLUE_FG: &str = "34";
pub const MAGENTA_FG: &str = "35";
pub const CYAN_FG: &str = "36";
pub const WHITE_FG: &str = "37";
pub const DEFAULT_FG: &str = "39";

pub const BLACK_BG: &str = "40";
pub const RED_BG: &str = "41";
pub const GREEN_BG: &str = "42";
pub const YELLOW_BG: &str = "43";
pub const BLUE_BG: &str = "44";
pub const MAGENTA_BG: &str = "45";
pub const CYAN_BG: &str = "46";
pub const WHITE_BG: &str = "47";
pub const DEFAULT_BG: &str = "49";

/// Render each code as its own escape sequence, in order.
pub fn sgr<S: AsRef<str>>(codes: &[S]) -> String {
    let mut out = String::with_capacity(codes.len() * 5);
    for code in codes {
        out.push_str(ESC_START);
        out.push_str(code.as_ref());
        out.push_str(ESC_END);
    }
    out
}
