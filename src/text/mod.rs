pub mod ascii;
pub mod boundary;
pub mod quoted;
pub mod whitespace;
pub mod words;
