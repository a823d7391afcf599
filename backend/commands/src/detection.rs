/// Command detection: recognise a prefixed command word in message text.
use chatcmd_config::PrefixMode;

/// Extract the bare command name from `text`.
///
/// Returns `None` when the text does not start with any of `prefixes` (a
/// normal message) or when nothing is left after removing the prefix.
///
/// In [`PrefixMode::Leading`] the first configured prefix that the command
/// word starts with is removed from its start. In
/// [`PrefixMode::FirstOccurrence`] the first configured prefix found anywhere
/// in the command word is removed at that position, so with prefixes
/// `["!", "/"]` the word `/a!b` becomes `/ab`.
pub fn detect_command(text: &str, prefixes: &[String], mode: PrefixMode) -> Option<String> {
    if !prefixes
        .iter()
        .any(|p| !p.is_empty() && text.starts_with(p.as_str()))
    {
        return None;
    }

    let word = text.split(' ').next().unwrap_or_default();
    let name = match mode {
        PrefixMode::Leading => prefixes
            .iter()
            .filter(|p| !p.is_empty())
            .find_map(|p| word.strip_prefix(p.as_str()))
            .map(str::to_string)?,
        PrefixMode::FirstOccurrence => remove_first_occurrence(word, prefixes),
    };

    if name.is_empty() { None } else { Some(name) }
}

fn remove_first_occurrence(word: &str, prefixes: &[String]) -> String {
    for prefix in prefixes.iter().filter(|p| !p.is_empty()) {
        if let Some(index) = word.find(prefix.as_str()) {
            let mut name = String::with_capacity(word.len() - prefix.len());
            name.push_str(&word[..index]);
            name.push_str(&word[index + prefix.len()..]);
            return name;
        }
    }
    word.to_string()
}
