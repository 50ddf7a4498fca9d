//! Phonetic reading helpers.
//!
//! Readings for Japanese lines arrive in bracket-annotation form, where each
//! kanji run is followed by its kana in square brackets: `今日[きょう]は`,
//! `食[た]べる`. Providers need the spoken form; the duration estimate needs
//! the annotation removed.

use once_cell::sync::Lazy;
use regex::Regex;

static ANNOTATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("annotation pattern is valid"));

pub fn is_kanji(c: char) -> bool {
    matches!(
        c as u32,
        0x4E00..=0x9FFF
            | 0x3400..=0x4DBF
            | 0x20000..=0x2A6DF
            | 0x2A700..=0x2B73F
            | 0x2B740..=0x2B81F
            | 0x2B820..=0x2CEAF
            | 0xF900..=0xFAFF
            | 0x2F800..=0x2FA1F
    )
}

pub fn is_hiragana(c: char) -> bool {
    matches!(c as u32, 0x3040..=0x309F)
}

pub fn is_katakana(c: char) -> bool {
    matches!(c as u32, 0x30A0..=0x30FF)
}

pub fn is_kana(c: char) -> bool {
    is_hiragana(c) || is_katakana(c)
}

/// Convert katakana to hiragana, leaving every other character untouched.
pub fn to_hiragana(text: &str) -> String {
    text.chars()
        .map(|c| {
            if is_katakana(c) {
                char::from_u32(c as u32 - 0x60).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Remove every `[...]` annotation group.
pub fn strip_annotations(text: &str) -> String {
    ANNOTATION_PATTERN.replace_all(text, "").into_owned()
}

/// Replace each annotated base run with the text inside its brackets.
///
/// `今日[きょう]は良[よ]い` becomes `きょうはよい`. Text without annotations is
/// returned unchanged; an unterminated bracket is kept literally.
pub fn to_spoken(text: &str) -> String {
    if !text.contains('[') {
        return text.to_string();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut out: Vec<char> = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '[' {
            out.push(c);
            i += 1;
            continue;
        }

        let Some(close) = chars[i + 1..].iter().position(|&ch| ch == ']') else {
            out.extend_from_slice(&chars[i..]);
            break;
        };

        while out.last().is_some_and(|&prev| is_annotated_base(prev)) {
            out.pop();
        }
        out.extend_from_slice(&chars[i + 1..i + 1 + close]);
        i += close + 2;
    }

    out.into_iter().collect()
}

/// Only kanji runs carry bracket readings.
fn is_annotated_base(c: char) -> bool {
    is_kanji(c) || c == '々'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunKind {
    Kanji,
    Kana,
    Other,
}

fn run_kind(c: char) -> RunKind {
    if is_kanji(c) {
        RunKind::Kanji
    } else if is_kana(c) {
        RunKind::Kana
    } else {
        RunKind::Other
    }
}

fn segment_surface(surface: &str) -> Vec<(String, RunKind)> {
    let mut runs: Vec<(String, RunKind)> = Vec::new();
    for c in surface.chars() {
        let kind = run_kind(c);
        match runs.last_mut() {
            Some((text, last)) if *last == kind => text.push(c),
            _ => runs.push((c.to_string(), kind)),
        }
    }
    runs
}

fn find_from(haystack: &[char], needle: &[char], start: usize) -> Option<usize> {
    if needle.is_empty() || start > haystack.len() {
        return None;
    }
    haystack[start..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| start + offset)
}

/// Produce bracket annotation for `surface` given its full `reading`.
///
/// Kanji runs followed by kana (okurigana) take the part of the reading up to
/// where that kana appears; a surface that is one kanji run is bracketed
/// whole.
pub fn align_furigana(surface: &str, reading: &str) -> String {
    if surface.is_empty() || reading.is_empty() {
        return surface.to_string();
    }

    let runs = segment_surface(surface);
    if !runs.iter().any(|(_, kind)| *kind == RunKind::Kanji) {
        return surface.to_string();
    }

    let reading: Vec<char> = to_hiragana(reading).chars().collect();
    if runs.len() == 1 {
        return format!("{}[{}]", surface, reading.iter().collect::<String>());
    }

    let mut out = String::with_capacity(surface.len() + reading.len() * 3);
    let mut pos = 0;

    for (index, (text, kind)) in runs.iter().enumerate() {
        match kind {
            RunKind::Kanji => {
                let next_kana = runs
                    .get(index + 1)
                    .filter(|(_, next)| *next == RunKind::Kana)
                    .map(|(next_text, _)| to_hiragana(next_text).chars().collect::<Vec<_>>());

                let end = next_kana
                    .and_then(|kana| find_from(&reading, &kana, (pos + 1).min(reading.len())))
                    .unwrap_or(reading.len());

                let kanji_reading: String = reading[pos..end].iter().collect();
                pos = end;

                out.push_str(text);
                if !kanji_reading.is_empty() {
                    out.push('[');
                    out.push_str(&kanji_reading);
                    out.push(']');
                }
            }
            RunKind::Kana => {
                let kana: Vec<char> = to_hiragana(text).chars().collect();
                if reading[pos..].starts_with(&kana) {
                    pos += kana.len();
                }
                out.push_str(text);
            }
            RunKind::Other => out.push_str(text),
        }
    }

    out
}

/// Bring a reading into bracket-annotated form for `surface`.
///
/// Readings that already carry annotations are kept as they are; a plain
/// kana reading is aligned against the surface.
pub fn annotate_reading(surface: &str, reading: &str) -> String {
    if reading.contains('[') {
        reading.to_string()
    } else {
        align_furigana(surface, reading)
    }
}
