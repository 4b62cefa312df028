//! English pluralization of defined terms.
//!
//! Only the last word of a phrase is inflected, so "misplaced catch" becomes
//! "misplaced catches".

use std::collections::{HashMap, HashSet};

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("goose", "geese"),
    ("mouse", "mice"),
    ("ox", "oxen"),
    ("criterion", "criteria"),
    ("phenomenon", "phenomena"),
    ("datum", "data"),
    ("medium", "media"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
    ("appendix", "appendices"),
    ("cactus", "cacti"),
    ("stimulus", "stimuli"),
];

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "software",
    "hardware",
    "firmware",
    "data",
    "feedback",
    "knowledge",
    "research",
    "series",
    "species",
    "sheep",
    "fish",
    "deer",
    "news",
    "furniture",
    "rice",
    "money",
];

/// Words ending in `f` or `fe` whose plural ends in `ves`.
const F_TO_VES: &[&str] = &[
    "calf", "half", "knife", "leaf", "life", "loaf", "self", "sheaf", "shelf", "thief", "wife",
    "wolf",
];

/// Words ending in `o` whose plural takes `es`.
const O_TO_OES: &[&str] = &["echo", "hero", "potato", "tomato", "torpedo", "veto"];

/// Pluralizes noun phrases.
#[derive(Debug, Clone)]
pub struct Pluralizer {
    irregular: HashMap<&'static str, &'static str>,
    uncountable: HashSet<&'static str>,
}

impl Default for Pluralizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Pluralizer {
    pub fn new() -> Self {
        Self {
            irregular: IRREGULAR.iter().copied().collect(),
            uncountable: UNCOUNTABLE.iter().copied().collect(),
        }
    }

    /// Plural of `phrase`, inflecting its last word.
    pub fn plural(&self, phrase: &str) -> String {
        let split = phrase
            .char_indices()
            .rev()
            .find(|(_, c)| !c.is_alphanumeric() && *c != '\'')
            .map_or(0, |(i, c)| i + c.len_utf8());
        let (head, word) = phrase.split_at(split);
        if word.is_empty() {
            return phrase.to_string();
        }
        format!("{head}{}", self.plural_word(word))
    }

    fn plural_word(&self, word: &str) -> String {
        let lower = word.to_lowercase();
        if self.uncountable.contains(lower.as_str()) {
            return word.to_string();
        }

        let plural = match self.irregular.get(lower.as_str()) {
            Some(plural) => (*plural).to_string(),
            None => regular_plural(&lower),
        };
        match_case(word, plural)
    }
}

fn regular_plural(word: &str) -> String {
    let stem = |n: usize| &word[..word.len() - n];

    if F_TO_VES.contains(&word) {
        let cut = if word.ends_with("fe") { 2 } else { 1 };
        return format!("{}ves", stem(cut));
    }
    if O_TO_OES.contains(&word) {
        return format!("{word}es");
    }
    if word.len() > 2 && word.ends_with("is") {
        return format!("{}es", stem(2));
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|end| word.ends_with(end)) {
        return format!("{word}es");
    }
    if let Some(before) = word.strip_suffix('y') {
        if before.chars().last().is_some_and(|c| !"aeiou".contains(c)) {
            return format!("{before}ies");
        }
    }
    format!("{word}s")
}

/// Carry the capitalization of `original` over to `plural`.
fn match_case(original: &str, plural: String) -> String {
    let has_letters = original.chars().any(char::is_alphabetic);
    if has_letters && original.chars().all(|c| !c.is_lowercase()) && original.chars().count() > 1 {
        return plural.to_uppercase();
    }
    match original.chars().next() {
        Some(first) if first.is_uppercase() => {
            let mut chars = plural.chars();
            match chars.next() {
                Some(head) => head.to_uppercase().chain(chars).collect(),
                None => plural,
            }
        }
        _ => plural,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_words() {
        let p = Pluralizer::new();
        assert_eq!(p.plural("pump"), "pumps");
        assert_eq!(p.plural("catch"), "catches");
        assert_eq!(p.plural("box"), "boxes");
        assert_eq!(p.plural("bus"), "buses");
        assert_eq!(p.plural("property"), "properties");
        assert_eq!(p.plural("day"), "days");
        assert_eq!(p.plural("analysis"), "analyses");
        assert_eq!(p.plural("shelf"), "shelves");
        assert_eq!(p.plural("life"), "lives");
        assert_eq!(p.plural("hero"), "heroes");
        assert_eq!(p.plural("photo"), "photos");
    }

    #[test]
    fn irregular_and_uncountable() {
        let p = Pluralizer::new();
        assert_eq!(p.plural("person"), "people");
        assert_eq!(p.plural("criterion"), "criteria");
        assert_eq!(p.plural("equipment"), "equipment");
        assert_eq!(p.plural("sheep"), "sheep");
    }

    #[test]
    fn only_the_last_word_is_inflected() {
        let p = Pluralizer::new();
        assert_eq!(p.plural("misplaced catch"), "misplaced catches");
        assert_eq!(p.plural("heat pump"), "heat pumps");
        assert_eq!(p.plural("load-bearing wall"), "load-bearing walls");
    }

    #[test]
    fn capitalization_is_kept() {
        let p = Pluralizer::new();
        assert_eq!(p.plural("Pump"), "Pumps");
        assert_eq!(p.plural("Person"), "People");
        assert_eq!(p.plural("BIM model"), "BIM models");
        assert_eq!(p.plural("HVAC"), "HVACS");
    }

    #[test]
    fn nothing_to_inflect() {
        let p = Pluralizer::new();
        assert_eq!(p.plural(""), "");
        assert_eq!(p.plural("pump "), "pump ");
    }
}
