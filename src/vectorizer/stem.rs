//! Porter stemming for English terms.
//!
//! The five rewrite steps of the classic algorithm, applied to lowercase
//! ASCII words. Anything else (digits, non-ASCII letters) is returned
//! unchanged.

/// Porter stemmer
///
/// ```
/// use taxonomy_classifier::vectorizer::stem::PorterStemmer;
/// let stemmer = PorterStemmer::new();
/// assert_eq!(stemmer.stem("games"), "game");
/// assert_eq!(stemmer.stem("running"), "run");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PorterStemmer;

const STEP2: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("bli", "ble"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("ator", "ate"),
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("biliti", "ble"),
    ("logi", "log"),
];

const STEP3: &[(&str, &str)] = &[
    ("icate", "ic"),
    ("ative", ""),
    ("alize", "al"),
    ("iciti", "ic"),
    ("ical", "ic"),
    ("ful", ""),
    ("ness", ""),
];

// 長い suffix を先に
const STEP4: &[&str] = &[
    "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion", "ou",
    "ism", "ate", "iti", "ous", "ive", "ize",
];

#[inline]
fn is_consonant(w: &[u8], i: usize) -> bool {
    match w[i] {
        b'a' | b'e' | b'i' | b'o' | b'u' => false,
        b'y' => i == 0 || !is_consonant(w, i - 1),
        _ => true,
    }
}

/// number of VC sequences in `w`
fn measure(w: &[u8]) -> usize {
    let n = w.len();
    let mut i = 0;
    while i < n && is_consonant(w, i) {
        i += 1;
    }
    let mut m = 0;
    while i < n {
        while i < n && !is_consonant(w, i) {
            i += 1;
        }
        if i >= n {
            break;
        }
        m += 1;
        while i < n && is_consonant(w, i) {
            i += 1;
        }
    }
    m
}

fn has_vowel(w: &[u8]) -> bool {
    (0..w.len()).any(|i| !is_consonant(w, i))
}

fn ends_double_consonant(w: &[u8]) -> bool {
    let n = w.len();
    n >= 2 && w[n - 1] == w[n - 2] && is_consonant(w, n - 1)
}

/// consonant-vowel-consonant ending, last not w, x or y
fn ends_cvc(w: &[u8]) -> bool {
    let n = w.len();
    n >= 3
        && is_consonant(w, n - 3)
        && !is_consonant(w, n - 2)
        && is_consonant(w, n - 1)
        && !matches!(w[n - 1], b'w' | b'x' | b'y')
}

fn stem_of<'a>(w: &'a [u8], suffix: &str) -> Option<&'a [u8]> {
    w.strip_suffix(suffix.as_bytes())
}

/// First matching rule wins; it is applied only when the stem's measure
/// exceeds `min_measure`.
fn replace_first(w: &mut Vec<u8>, rules: &[(&str, &str)], min_measure: usize) {
    for (suffix, replacement) in rules {
        if let Some(stem) = stem_of(w, suffix) {
            if measure(stem) > min_measure {
                let keep = stem.len();
                w.truncate(keep);
                w.extend_from_slice(replacement.as_bytes());
            }
            return;
        }
    }
}

impl PorterStemmer {
    pub fn new() -> Self {
        PorterStemmer
    }

    pub fn stem(&self, word: &str) -> String {
        if word.len() <= 2 || !word.bytes().all(|b| b.is_ascii_lowercase()) {
            return word.to_string();
        }
        let mut w = word.as_bytes().to_vec();
        step1a(&mut w);
        step1b(&mut w);
        step1c(&mut w);
        replace_first(&mut w, STEP2, 0);
        replace_first(&mut w, STEP3, 0);
        step4(&mut w);
        step5(&mut w);
        // ASCII のみなので常に成功する
        String::from_utf8(w).unwrap_or_else(|_| word.to_string())
    }
}

fn step1a(w: &mut Vec<u8>) {
    if w.ends_with(b"sses") || w.ends_with(b"ies") {
        w.truncate(w.len() - 2);
    } else if !w.ends_with(b"ss") && w.ends_with(b"s") {
        w.truncate(w.len() - 1);
    }
}

fn step1b(w: &mut Vec<u8>) {
    if let Some(stem) = stem_of(w, "eed") {
        if measure(stem) > 0 {
            w.truncate(w.len() - 1);
        }
        return;
    }
    let cut = match (stem_of(w, "ed"), stem_of(w, "ing")) {
        (Some(stem), _) if has_vowel(stem) => 2,
        (_, Some(stem)) if has_vowel(stem) => 3,
        _ => return,
    };
    w.truncate(w.len() - cut);
    if w.ends_with(b"at") || w.ends_with(b"bl") || w.ends_with(b"iz") {
        w.push(b'e');
    } else if ends_double_consonant(w) && !matches!(w[w.len() - 1], b'l' | b's' | b'z') {
        w.truncate(w.len() - 1);
    } else if measure(w) == 1 && ends_cvc(w) {
        w.push(b'e');
    }
}

fn step1c(w: &mut Vec<u8>) {
    if let Some(stem) = stem_of(w, "y") {
        if has_vowel(stem) {
            let n = w.len();
            w[n - 1] = b'i';
        }
    }
}

fn step4(w: &mut Vec<u8>) {
    for suffix in STEP4 {
        let Some(stem) = stem_of(w, suffix) else { continue };
        if *suffix == "ion" && !(stem.ends_with(b"s") || stem.ends_with(b"t")) {
            continue;
        }
        if measure(stem) > 1 {
            let keep = stem.len();
            w.truncate(keep);
        }
        return;
    }
}

fn step5(w: &mut Vec<u8>) {
    if let Some(stem) = stem_of(w, "e") {
        let m = measure(stem);
        if m > 1 || (m == 1 && !ends_cvc(stem)) {
            w.truncate(w.len() - 1);
        }
    }
    if measure(w) > 1 && ends_double_consonant(w) && w.ends_with(b"l") {
        w.truncate(w.len() - 1);
    }
}
