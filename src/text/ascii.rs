// ASCII control and delimiter bytes used by the scanners and grammars.

pub const HT: u8 = 0x09; // horizontal tab
pub const LF: u8 = 0x0A; // line feed
pub const CR: u8 = 0x0D; // carriage return
pub const SP: u8 = 0x20; // space

pub const DQUOTE: u8 = 0x22; // "
pub const NUM: u8 = 0x23; // #
pub const DOLLAR: u8 = 0x24; // $
pub const PERCENT: u8 = 0x25; // %
pub const AMPERSAND: u8 = 0x26; // &
pub const SQUOTE: u8 = 0x27; // '
pub const LEFT_PAR: u8 = 0x28; // (
pub const ASTERISK: u8 = 0x2A; // *
pub const PLUS: u8 = 0x2B; // +
pub const MINUS: u8 = 0x2D; // -
pub const PERIOD: u8 = 0x2E; // .
pub const COL: u8 = 0x3A; // :
pub const SEM_COL: u8 = 0x3B; // ;
pub const LEFT_BRACKET: u8 = 0x5B; // [
pub const BACKSLASH: u8 = 0x5C; // \
pub const RIGHT_BRACKET: u8 = 0x5D; // ]
pub const CARRET: u8 = 0x5E; // ^
pub const UNDERSCORE: u8 = 0x5F; // _
pub const GRAVE: u8 = 0x60; // `
pub const LEFT_CURLY: u8 = 0x7B; // {
pub const PIPE: u8 = 0x7C; // |
pub const RIGHT_CURLY: u8 = 0x7D; // }
pub const EXCLAMATION: u8 = 0x21; // !
pub const TILDE: u8 = 0x7E; // ~
pub const DEL: u8 = 0x7F;

pub const CRLF: &[u8] = &[CR, LF];

/// Byte-order mark of a UTF-8 stream.
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Leading bytes of an mbox separator line.
pub const MBOX_FROM: &[u8] = b"From ";

pub fn is_wsp(c: u8) -> bool {
    c == SP || c == HT
}
