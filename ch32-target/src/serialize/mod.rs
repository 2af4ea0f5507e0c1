pub(crate) mod long_literal;
pub(crate) mod upper_hex_u16;
