use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;

/// Named category of code points usable in a [`CharClass`](super::CharClass)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnicodeClass {
    Alphabetic,
    Alphanumeric,
    Control,
    Lowercase,
    Numeric,
    Uppercase,
    Whitespace,
    DecimalDigit,
    SpaceSeparator,
    Ascii,
    AsciiAlphabetic,
    AsciiAlphanumeric,
    AsciiControl,
    AsciiDigit,
    AsciiGraphic,
    AsciiHexDigit,
    AsciiLowercase,
    AsciiPunctuation,
    AsciiUppercase,
    AsciiWhitespace,
}

lazy_static! {
    /// Lookup table for [`UnicodeClass::from_name`], including the usual short category aliases
    static ref CLASS_NAMES: HashMap<&'static str, UnicodeClass> = {
        use UnicodeClass::*;

        let mut names = HashMap::new();

        for class in UnicodeClass::ALL {
            names.insert(class.name(), *class);
        }

        names.insert("L", Alphabetic);
        names.insert("Ll", Lowercase);
        names.insert("Lu", Uppercase);
        names.insert("N", Numeric);
        names.insert("Nd", DecimalDigit);
        names.insert("Cc", Control);
        names.insert("Zs", SpaceSeparator);

        names
    };
}

impl UnicodeClass {
    /// Every class, in declaration order
    pub const ALL: &'static [UnicodeClass] = &[
        Self::Alphabetic,
        Self::Alphanumeric,
        Self::Control,
        Self::Lowercase,
        Self::Numeric,
        Self::Uppercase,
        Self::Whitespace,
        Self::DecimalDigit,
        Self::SpaceSeparator,
        Self::Ascii,
        Self::AsciiAlphabetic,
        Self::AsciiAlphanumeric,
        Self::AsciiControl,
        Self::AsciiDigit,
        Self::AsciiGraphic,
        Self::AsciiHexDigit,
        Self::AsciiLowercase,
        Self::AsciiPunctuation,
        Self::AsciiUppercase,
        Self::AsciiWhitespace,
    ];

    /// Find a class from its name (`Alphabetic`) or its Unicode category alias (`L`)
    pub fn from_name(name: &str) -> Option<Self> {
        CLASS_NAMES.get(name).copied()
    }

    /// Get the class's name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Alphabetic => "Alphabetic",
            Self::Alphanumeric => "Alphanumeric",
            Self::Control => "Control",
            Self::Lowercase => "Lowercase",
            Self::Numeric => "Numeric",
            Self::Uppercase => "Uppercase",
            Self::Whitespace => "Whitespace",
            Self::DecimalDigit => "DecimalDigit",
            Self::SpaceSeparator => "SpaceSeparator",
            Self::Ascii => "Ascii",
            Self::AsciiAlphabetic => "AsciiAlphabetic",
            Self::AsciiAlphanumeric => "AsciiAlphanumeric",
            Self::AsciiControl => "AsciiControl",
            Self::AsciiDigit => "AsciiDigit",
            Self::AsciiGraphic => "AsciiGraphic",
            Self::AsciiHexDigit => "AsciiHexDigit",
            Self::AsciiLowercase => "AsciiLowercase",
            Self::AsciiPunctuation => "AsciiPunctuation",
            Self::AsciiUppercase => "AsciiUppercase",
            Self::AsciiWhitespace => "AsciiWhitespace",
        }
    }

    /// Check if a code point belongs to the class
    pub fn contains(&self, c: char) -> bool {
        match self {
            Self::Alphabetic => c.is_alphabetic(),
            Self::Alphanumeric => c.is_alphanumeric(),
            Self::Control => c.is_control(),
            Self::Lowercase => c.is_lowercase(),
            Self::Numeric => c.is_numeric(),
            Self::Uppercase => c.is_uppercase(),
            Self::Whitespace => c.is_whitespace(),
            Self::DecimalDigit => c.is_numeric() && is_decimal_digit(c),
            Self::SpaceSeparator => matches!(
                c,
                ' ' | '\u{a0}' | '\u{1680}' | '\u{2000}'..='\u{200a}' | '\u{202f}' | '\u{205f}' | '\u{3000}'
            ),
            Self::Ascii => c.is_ascii(),
            Self::AsciiAlphabetic => c.is_ascii_alphabetic(),
            Self::AsciiAlphanumeric => c.is_ascii_alphanumeric(),
            Self::AsciiControl => c.is_ascii_control(),
            Self::AsciiDigit => c.is_ascii_digit(),
            Self::AsciiGraphic => c.is_ascii_graphic(),
            Self::AsciiHexDigit => c.is_ascii_hexdigit(),
            Self::AsciiLowercase => c.is_ascii_lowercase(),
            Self::AsciiPunctuation => c.is_ascii_punctuation(),
            Self::AsciiUppercase => c.is_ascii_uppercase(),
            Self::AsciiWhitespace => c.is_ascii_whitespace(),
        }
    }
}

/// First code point (the zero) of every run of ten decimal digits (`Nd`)
const DECIMAL_ZEROS: &[u32] = &[
    0x30, 0x660, 0x6F0, 0x7C0, 0x966, 0x9E6, 0xA66, 0xAE6, 0xB66, 0xBE6, 0xC66, 0xCE6, 0xD66, 0xDE6, 0xE50,
    0xED0, 0xF20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946, 0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40,
    0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0, 0xA9F0, 0xAA50, 0xABF0, 0xFF10, 0x104A0, 0x10D30, 0x11066,
    0x110F0, 0x11136, 0x111D0, 0x112F0, 0x11450, 0x114D0, 0x11650, 0x116C0, 0x11730, 0x118E0, 0x11950,
    0x11C50, 0x11D50, 0x11DA0, 0x11F50, 0x16A60, 0x16AC0, 0x16B50, 0x1D7CE, 0x1D7D8, 0x1D7E2, 0x1D7EC,
    0x1D7F6, 0x1E140, 0x1E2F0, 0x1E4F0, 0x1E950, 0x1FBF0,
];

fn is_decimal_digit(c: char) -> bool {
    let c = c as u32;

    // The table is sorted, so only the closest zero below can start the run
    match DECIMAL_ZEROS.binary_search(&c) {
        Ok(_) => true,
        Err(0) => false,
        Err(i) => c - DECIMAL_ZEROS[i - 1] <= 9,
    }
}

impl fmt::Display for UnicodeClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\\p{{{}}}", self.name())
    }
}
