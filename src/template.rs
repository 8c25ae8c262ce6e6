//! Password templates and the renderer that maps a seed onto them
//!
//! Every template category holds a few candidate patterns. A pattern is a
//! string of character-class tags; rendering picks one pattern per category
//! with `seed[0]` and then one character per tag with `seed[1 + i]`.

use std::io::Write;

use crate::crypto::{ScratchBuffer, SiteSeed, SEED_LEN};
use crate::error::{Result, SlpmError};

/// Longest pattern the seed can drive (byte 0 selects the pattern)
pub const MAX_PATTERN_LEN: usize = SEED_LEN - 1;

/// Character class named by one pattern tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// `V`
    CapitalVowel,
    /// `C`
    CapitalConsonant,
    /// `v`
    Vowel,
    /// `c`
    Consonant,
    /// `A`
    AnyLetter,
    /// `a`
    MixedLetter,
    /// `n`
    Digit,
    /// `o`
    Symbol,
    /// `x`
    AnyCharacter,
}

impl CharClass {
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'V' => Some(Self::CapitalVowel),
            b'C' => Some(Self::CapitalConsonant),
            b'v' => Some(Self::Vowel),
            b'c' => Some(Self::Consonant),
            b'A' => Some(Self::AnyLetter),
            b'a' => Some(Self::MixedLetter),
            b'n' => Some(Self::Digit),
            b'o' => Some(Self::Symbol),
            b'x' => Some(Self::AnyCharacter),
            _ => None,
        }
    }

    pub const fn chars(self) -> &'static [u8] {
        match self {
            Self::CapitalVowel => b"AEIOU",
            Self::CapitalConsonant => b"BCDFGHJKLMNPQRSTVWXYZ",
            Self::Vowel => b"aeiou",
            Self::Consonant => b"bcdfghjklmnpqrstvwxyz",
            Self::AnyLetter => b"AEIOUBCDFGHJKLMNPQRSTVWXYZ",
            Self::MixedLetter => b"AEIOUaeiouBCDFGHJKLMNPQRSTVWXYZbcdfghjklmnpqrstvwxyz",
            Self::Digit => b"0123456789",
            Self::Symbol => b"@&%?,=[]_:-+*$#!'^~;()/.",
            Self::AnyCharacter => {
                b"AEIOUaeiouBCDFGHJKLMNPQRSTVWXYZbcdfghjklmnpqrstvwxyz0123456789!@#$%^&*()"
            }
        }
    }
}

/// A named password-shape rule set
#[derive(Debug)]
pub struct Template {
    pub name: &'static str,
    pub patterns: &'static [&'static str],
}

impl Template {
    /// Pattern chosen by `seed[0]`
    pub fn select(&self, seed: &SiteSeed) -> &'static str {
        self.patterns[seed.as_bytes()[0] as usize % self.patterns.len()]
    }

    /// Check every pattern against the tag alphabet and the seed length
    pub fn validate(&self) -> Result<()> {
        if self.patterns.is_empty() {
            return Err(SlpmError::InvalidTemplate {
                template: self.name,
                pattern: "",
                reason: "template has no patterns",
            });
        }
        for &pattern in self.patterns {
            if let Some(reason) = pattern_problem(pattern) {
                return Err(SlpmError::InvalidTemplate {
                    template: self.name,
                    pattern,
                    reason,
                });
            }
        }
        Ok(())
    }
}

const fn pattern_problem(pattern: &str) -> Option<&'static str> {
    let bytes = pattern.as_bytes();
    if bytes.len() > MAX_PATTERN_LEN {
        return Some("pattern is longer than the seed allows");
    }
    let mut i = 0;
    while i < bytes.len() {
        if CharClass::from_tag(bytes[i]).is_none() {
            return Some("unknown character class tag");
        }
        i += 1;
    }
    None
}

const fn catalog_is_valid(catalog: &[Template]) -> bool {
    let mut t = 0;
    while t < catalog.len() {
        let patterns = catalog[t].patterns;
        if patterns.is_empty() {
            return false;
        }
        let mut p = 0;
        while p < patterns.len() {
            if pattern_problem(patterns[p]).is_some() {
                return false;
            }
            p += 1;
        }
        t += 1;
    }
    true
}

const MAXIMUM_SECURITY: &[&str] = &["anoxxxxxxxxxxxxxxxxx", "axxxxxxxxxxxxxxxxxno"];

const LONG: &[&str] = &[
    "CvcvnoCvcvCvcv",
    "CvcvCvcvnoCvcv",
    "CvcvCvcvCvcvno",
    "CvccnoCvcvCvcv",
    "CvccCvcvnoCvcv",
    "CvccCvcvCvcvno",
    "CvcvnoCvccCvcv",
    "CvcvCvccnoCvcv",
    "CvcvCvccCvcvno",
    "CvcvnoCvcvCvcc",
    "CvcvCvcvnoCvcc",
    "CvcvCvcvCvccno",
    "CvccnoCvccCvcv",
    "CvccCvccnoCvcv",
    "CvccCvccCvcvno",
    "CvcvnoCvccCvcc",
    "CvcvCvccnoCvcc",
    "CvcvCvccCvccno",
    "CvccnoCvcvCvcc",
    "CvccCvcvnoCvcc",
    "CvccCvcvCvccno",
];

const MEDIUM: &[&str] = &["CvcnoCvc", "CvcCvcno"];

const SHORT: &[&str] = &["Cvcn"];

const BASIC: &[&str] = &["aaanaaan", "aannaaan", "aaannaaa"];

const PIN: &[&str] = &["nnnn"];

const TEMPLATES: [Template; 6] = [
    Template { name: "Maximum Security Password", patterns: MAXIMUM_SECURITY },
    Template { name: "Long Password", patterns: LONG },
    Template { name: "Medium Password", patterns: MEDIUM },
    Template { name: "Short Password", patterns: SHORT },
    Template { name: "Basic Password", patterns: BASIC },
    Template { name: "PIN", patterns: PIN },
];

const _: () = assert!(catalog_is_valid(&TEMPLATES), "template catalog is invalid");

/// The fixed, ordered template catalog
pub static CATALOG: &[Template] = &TEMPLATES;

/// Render one pattern into `out`
pub fn render_pattern<const N: usize>(
    pattern: &str,
    seed: &SiteSeed,
    out: &mut ScratchBuffer<N>,
) -> Result<()> {
    if let Some(reason) = pattern_problem(pattern) {
        return Err(SlpmError::InvalidPattern(reason));
    }

    let seed = seed.as_bytes();
    for (i, tag) in pattern.bytes().enumerate() {
        let Some(class) = CharClass::from_tag(tag) else {
            return Err(SlpmError::InvalidPattern("unknown character class tag"));
        };
        let chars = class.chars();
        out.push(chars[seed[1 + i] as usize % chars.len()]);
    }
    Ok(())
}

/// Render every catalog category as `<name>: <password>\n`
pub fn render_passwords(seed: &SiteSeed) -> Result<ScratchBuffer<4096>> {
    let mut out = ScratchBuffer::new();
    for template in CATALOG {
        out.extend_from_slice(template.name.as_bytes())
            .extend_from_slice(b": ");
        render_pattern(template.select(seed), seed, &mut out)?;
        out.push(b'\n');
    }
    Ok(out)
}

/// Render all passwords and send them to `out` in a single write
pub fn write_passwords<W: Write + ?Sized>(seed: &SiteSeed, out: &mut W) -> Result<()> {
    let rendered = render_passwords(seed)?;
    rendered.write_to(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_seed() -> SiteSeed {
        let mut bytes = [0u8; SEED_LEN];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        SiteSeed::from_bytes(bytes)
    }

    fn render_to_string(seed: &SiteSeed) -> String {
        let mut out = Vec::new();
        write_passwords(seed, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_catalog_validates() {
        for template in CATALOG {
            template.validate().unwrap();
        }
    }

    #[test]
    fn test_render_known_seed() {
        assert_eq!(
            render_to_string(&counting_seed()),
            "Maximum Security Password: E2?UaeiouBCDFGHJKLMN\n\
             Long Password: Cifu5[KomaPiru\n\
             Medium Password: Cif4=Jil\n\
             Short Password: Cif4\n\
             Basic Password: EIO4aei8\n\
             PIN: 1234\n"
        );
    }

    #[test]
    fn test_render_is_stable() {
        let seed = SiteSeed::from_bytes([0x5A; SEED_LEN]);
        assert_eq!(render_to_string(&seed), render_to_string(&seed));
    }

    #[test]
    fn test_select_uses_first_seed_byte() {
        let mut bytes = [0u8; SEED_LEN];
        bytes[0] = 22;
        let seed = SiteSeed::from_bytes(bytes);

        // 22 % 21 == 1
        assert_eq!(CATALOG[1].select(&seed), "CvcvCvcvnoCvcv");
        // 22 % 2 == 0
        assert_eq!(CATALOG[0].select(&seed), "anoxxxxxxxxxxxxxxxxx");
    }

    #[test]
    fn test_character_index_wraps() {
        let seed = SiteSeed::from_bytes([255; SEED_LEN]);
        let mut out = ScratchBuffer::<8>::new();
        render_pattern("nV", &seed, &mut out).unwrap();

        // 255 % 10 == 5, 255 % 5 == 0
        assert_eq!(out.as_bytes(), b"5A");
    }

    #[test]
    fn test_overlong_pattern_rejected() {
        let seed = counting_seed();
        let mut out = ScratchBuffer::<64>::new();
        let pattern = "n".repeat(MAX_PATTERN_LEN + 1);

        assert!(render_pattern(&pattern, &seed, &mut out).is_err());
        assert!(render_pattern(&pattern[1..], &seed, &mut out).is_ok());
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let template = Template { name: "Broken", patterns: &["Cvq"] };
        assert!(matches!(
            template.validate(),
            Err(SlpmError::InvalidTemplate { template: "Broken", .. })
        ));
    }

    #[test]
    fn test_one_line_per_category() {
        let rendered = render_to_string(&SiteSeed::from_bytes([0x11; SEED_LEN]));
        let names: Vec<&str> = rendered
            .lines()
            .map(|line| line.split(": ").next().unwrap())
            .collect();

        assert_eq!(
            names,
            CATALOG.iter().map(|t| t.name).collect::<Vec<_>>()
        );
    }
}
