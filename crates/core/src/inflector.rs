//! Name inflection: pluralization and casing conventions.
//!
//! All derived names in the model (`className`, `instanceNamePlural`,
//! `kebabCase`, CRUD method names, resource paths) come from these
//! functions. They are pure and only depend on the input and the rule
//! tables below.

/// Words whose plural is the word itself.
const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "deer",
    "news",
    "metadata",
];

/// Irregular singular -> plural pairs, matched on the whole last word.
const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("ox", "oxen"),
    ("move", "moves"),
    ("sex", "sexes"),
];

/// Suffix rewrites, first match wins. Each entry replaces the suffix.
const SUFFIX_RULES: &[(&str, &str)] = &[
    ("quiz", "quizzes"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
    ("index", "indices"),
    ("octopus", "octopi"),
    ("alias", "aliases"),
    ("status", "statuses"),
    ("bus", "buses"),
    ("buffalo", "buffaloes"),
    ("tomato", "tomatoes"),
    ("potato", "potatoes"),
    ("hive", "hives"),
    ("sis", "ses"),
    ("ife", "ives"),
    ("lf", "lves"),
    ("rf", "rves"),
    ("tum", "ta"),
    ("ium", "ia"),
    ("ch", "ches"),
    ("sh", "shes"),
    ("ss", "sses"),
    ("x", "xes"),
];

/// Plural form of the last word of `name`, preserving everything before it.
///
/// `OrderItem` -> `OrderItems`, `order-item` -> `order-items`,
/// `Category` -> `Categories`, `Person` -> `People`.
pub fn pluralize(name: &str) -> String {
    let Some(&(start, end)) = word_spans(name).last() else {
        return name.to_owned();
    };
    let word = &name[start..end];
    format!("{}{}{}", &name[..start], pluralize_word(word), &name[end..])
}

fn pluralize_word(word: &str) -> String {
    let lower = word.to_lowercase();
    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_owned();
    }
    let plural = IRREGULAR
        .iter()
        .find(|(singular, _)| *singular == lower)
        .map(|(_, plural)| (*plural).to_owned())
        .or_else(|| {
            SUFFIX_RULES
                .iter()
                .find(|(suffix, _)| lower.ends_with(suffix))
                .map(|(suffix, replacement)| {
                    format!("{}{}", &lower[..lower.len() - suffix.len()], replacement)
                })
        })
        .unwrap_or_else(|| regular_plural(&lower));
    restore_case(word, &plural)
}

fn regular_plural(lower: &str) -> String {
    if let Some(stem) = lower.strip_suffix('y') {
        let consonant_before = stem
            .chars()
            .last()
            .map_or(false, |c| !"aeiou".contains(c));
        if consonant_before || stem.ends_with("qu") {
            return format!("{}ies", stem);
        }
    }
    if lower.ends_with('s') {
        return lower.to_owned();
    }
    format!("{}s", lower)
}

/// Re-apply the capitalization pattern of `original` to `lower`.
fn restore_case(original: &str, lower: &str) -> String {
    let has_lower = original.chars().any(char::is_lowercase);
    if !has_lower && original.chars().any(char::is_uppercase) {
        return lower.to_uppercase();
    }
    if original.chars().next().map_or(false, char::is_uppercase) {
        return capitalize(lower);
    }
    lower.to_owned()
}

/// `order_item`, `order-item`, `orderItem` -> `OrderItem`.
pub fn upper_camel_case(name: &str) -> String {
    words(name).iter().map(|w| capitalize(w)).collect()
}

/// `OrderItem` -> `orderItem`.
pub fn lower_camel_case(name: &str) -> String {
    let upper = upper_camel_case(name);
    let mut chars = upper.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `OrderItem` -> `order-item`.
pub fn kebab_case(name: &str) -> String {
    join_lower(name, "-")
}

/// `OrderItem` -> `order_item`.
pub fn snake_case(name: &str) -> String {
    join_lower(name, "_")
}

fn join_lower(name: &str, separator: &str) -> String {
    words(name)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(separator)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn words(name: &str) -> Vec<&str> {
    word_spans(name)
        .into_iter()
        .map(|(start, end)| &name[start..end])
        .collect()
}

/// Byte ranges of the words in `name`. Words are separated by any
/// non-alphanumeric character, by a lower-to-upper transition
/// (`orderItem`) and by the end of an acronym (`HTTPServer`).
fn word_spans(name: &str) -> Vec<(usize, usize)> {
    let chars: Vec<(usize, char)> = name.char_indices().collect();
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &(offset, c)) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if let Some(s) = start.take() {
                spans.push((s, offset));
            }
            continue;
        }
        if let Some(s) = start {
            let prev = chars[i - 1].1;
            let next = chars.get(i + 1).map(|&(_, n)| n);
            let camel_hump = c.is_uppercase() && (prev.is_lowercase() || prev.is_ascii_digit());
            let acronym_end = c.is_uppercase()
                && prev.is_uppercase()
                && next.map_or(false, char::is_lowercase);
            if camel_hump || acronym_end {
                spans.push((s, offset));
                start = Some(offset);
            }
        } else {
            start = Some(offset);
        }
    }
    if let Some(s) = start {
        spans.push((s, name.len()));
    }
    spans
}
