//! Lecture Notes in Informatics volume numbers of the DeLFI proceedings.

/// `(folder name, publication year)` for every DeLFI volume in the corpus.
pub const LNI_VOLUME_YEARS: &[(&str, u16)] = &[
    ("lni37", 2003),
    ("lni52", 2004),
    ("lni66", 2005),
    ("lni87", 2006),
    ("lni111", 2007),
    ("lni132", 2008),
    ("lni153", 2009),
    ("lni169", 2010),
    ("lni188", 2011),
    ("lni207", 2012),
    ("lni218", 2013),
    ("lni233", 2014),
    ("lni247", 2015),
    ("lni262", 2016),
    ("lni273", 2017),
    ("lni284", 2018),
    ("lni297", 2019),
    ("lni308", 2020),
    ("lni316", 2021),
    ("lni322", 2022),
    ("lni338", 2023),
    ("lni356", 2024),
    ("lni369", 2025),
];

/// Publication year for a proceedings folder name such as `lni153` or
/// `LNI-153`. Returns `None` for folders outside the known volumes.
pub fn volume_year(folder_name: &str) -> Option<u16> {
    let digits: String = folder_name
        .trim()
        .to_ascii_lowercase()
        .strip_prefix("lni")?
        .trim_start_matches(['-', '_', ' '])
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    let key = format!("lni{}", digits);
    LNI_VOLUME_YEARS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, year)| *year)
}
