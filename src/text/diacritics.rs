//! Diacritic families for accent-insensitive matching.
//!
//! Each family lists a base letter followed by its accented variants, in
//! lower and upper case. A letter of a term that belongs to a family is
//! compiled into a character class holding the whole family, so canonical
//! and accented text match interchangeably.

use lazy_static::lazy_static;
use std::collections::HashMap;

const FAMILIES: &[(&str, &str)] = &[
    ("aàáảãạăằắẳẵặâầấẩẫậäåāą", "AÀÁẢÃẠĂẰẮẲẴẶÂẦẤẨẪẬÄÅĀĄ"),
    ("cçćč", "CÇĆČ"),
    ("dđď", "DĐĎ"),
    ("eèéẻẽẹêềếểễệëěēę", "EÈÉẺẼẸÊỀẾỂỄỆËĚĒĘ"),
    ("iìíỉĩịîïī", "IÌÍỈĨỊÎÏĪ"),
    ("lł", "LŁ"),
    ("nñňń", "NÑŇŃ"),
    ("oòóỏõọôồốổỗộơởỡớờợöøō", "OÒÓỎÕỌÔỒỐỔỖỘƠỞỠỚỜỢÖØŌ"),
    ("rř", "RŘ"),
    ("sšśșş", "SŠŚȘŞ"),
    ("tťțţ", "TŤȚŢ"),
    ("uùúủũụưừứửữựûüůū", "UÙÚỦŨỤƯỪỨỬỮỰÛÜŮŪ"),
    ("yýỳỷỹỵÿ", "YÝỲỶỸỴŸ"),
    ("zžżź", "ZŽŻŹ"),
];

lazy_static! {
    /// char -> (family index, is upper case)
    static ref FAMILY_INDEX: HashMap<char, (usize, bool)> = {
        let mut map = HashMap::new();
        for (idx, (lower, upper)) in FAMILIES.iter().enumerate() {
            for c in lower.chars() {
                map.insert(c, (idx, false));
            }
            for c in upper.chars() {
                map.insert(c, (idx, true));
            }
        }
        map
    };
}

/// Character class (`[...]`) matching every variant of `c`, if `c` has a family.
///
/// Case-sensitive classes keep only the variants sharing the case of `c`.
pub fn diacritic_class(c: char, case_sensitive: bool) -> Option<String> {
    let &(idx, upper) = FAMILY_INDEX.get(&c)?;
    let (lower_set, upper_set) = FAMILIES[idx];
    let mut class = String::from("[");
    if case_sensitive {
        class.push_str(if upper { upper_set } else { lower_set });
    } else {
        class.push_str(lower_set);
        class.push_str(upper_set);
    }
    class.push(']');
    Some(class)
}
