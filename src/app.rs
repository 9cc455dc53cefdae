pub mod approot;
pub mod outfmt;

// Version is of the format 0.YY.MM[.i], or 0.year.month.optional_minor_increment,
// giving an immediate reference for when the tax parameters were last reviewed.
pub const APP_VERSION: &str = "0.25.10";
