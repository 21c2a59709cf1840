use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::config::NormalizerConfig;
use crate::lemmas::builtin_lemmas;

lazy_static! {
    // Everything that is not a word character, plus connector punctuation such as `_`.
    static ref NON_WORD_RE: Regex = Regex::new(r"[^\w\s]|\p{Pc}").expect("valid regex");
    static ref WORD_RE: Regex = Regex::new(r"\b\w+\b").expect("valid regex");
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","ain","all","am","an","and","any","are","aren","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","couldn","couldn't",
            "d","did","didn","didn't","do","does","doesn","doesn't","doing","don","don't","down","during",
            "each","few","for","from","further",
            "had","hadn","hadn't","has","hasn","hasn't","have","haven","haven't","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","isn","isn't","it","it's","its","itself",
            "just","ll","m","ma","me","mightn","mightn't","more","most","mustn","mustn't","my","myself",
            "needn","needn't","no","nor","not","now",
            "o","of","off","on","once","only","or","other","our","ours","ourselves","out","over","own",
            "re","s","same","shan","shan't","she","she's","should","should've","shouldn","shouldn't","so","some","such",
            "t","than","that","that'll","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","ve","very",
            "was","wasn","wasn't","we","were","weren","weren't","what","when","where","which","while","who","whom","why","will","with","won","won't","wouldn","wouldn't",
            "y","you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
    static ref FALLBACK_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","an","and","are","as","at","be","by","for","from","has",
            "he","in","is","it","its","of","on","or","that","the","to",
            "was","will","with","this","but","they","have","had",
            "what","when","where","who","why","how","all","each","every",
            "both","few","more","most","other","some","such","no","nor",
            "not","only","same","so","than","too","very","can","just",
            "should","now"
        ];
        words.iter().copied().collect()
    };
}

/// Turns raw text into canonical index tokens.
///
/// Pipeline, in order: lowercase, replace everything but letters, digits and
/// whitespace with a space, collapse whitespace, split into words, drop
/// stopwords and words of two characters or fewer, stem, lemmatize.
/// Stemming runs before lemmatization, so the lemma table mostly sees stems.
///
/// Construction never fails: unreadable resources degrade to built-in lists.
pub struct Normalizer {
    stemmer: Option<Stemmer>,
    lemmas: Option<HashMap<String, String>>,
    stopwords: HashSet<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&NormalizerConfig::default())
    }
}

impl Normalizer {
    pub fn new(config: &NormalizerConfig) -> Self {
        let stopwords = match &config.stopwords_path {
            Some(path) => load_stopwords(path),
            None => ENGLISH_STOPWORDS.iter().map(|w| w.to_string()).collect(),
        };
        let lemmas = config.lemmatization.then(|| {
            let mut table = builtin_lemmas();
            if let Some(path) = &config.lemmas_path {
                table.extend(load_lemmas(path));
            }
            table
        });
        tracing::debug!(
            stemming = config.stemming,
            lemmatization = config.lemmatization,
            stopwords = stopwords.len(),
            "normalizer initialized"
        );
        Self {
            stemmer: config.stemming.then(|| Stemmer::create(Algorithm::English)),
            lemmas,
            stopwords,
        }
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    pub fn normalize(&self, text: &str) -> Vec<String> {
        let cleaned = clean(text);
        split_words(&cleaned)
            .into_iter()
            .filter(|t| t.chars().count() > 2 && !self.is_stopword(t))
            .map(|t| self.stem(t))
            .map(|t| self.lemmatize(t))
            .collect()
    }

    fn stem(&self, token: &str) -> String {
        match &self.stemmer {
            Some(stemmer) => stemmer.stem(token).into_owned(),
            None => token.to_string(),
        }
    }

    fn lemmatize(&self, token: String) -> String {
        match self.lemmas.as_ref().and_then(|t| t.get(&token)) {
            Some(lemma) => lemma.clone(),
            None => token,
        }
    }
}

/// Lowercase, blank out everything but word characters and collapse whitespace.
/// What survives is exactly what the word splitter matches, so splitting the
/// result on word boundaries and on whitespace agree.
fn clean(text: &str) -> String {
    let lowered = text.to_lowercase();
    let blanked = NON_WORD_RE.replace_all(&lowered, " ");
    blanked.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn split_words(text: &str) -> Vec<&str> {
    WORD_RE.find_iter(text).map(|m| m.as_str()).collect()
}

fn load_stopwords(path: &Path) -> HashSet<String> {
    match fs::read_to_string(path) {
        Ok(text) => text
            .lines()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect(),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "stopword list unreadable, using fallback list");
            FALLBACK_STOPWORDS.iter().map(|w| w.to_string()).collect()
        }
    }
}

fn load_lemmas(path: &Path) -> HashMap<String, String> {
    match fs::read_to_string(path) {
        Ok(text) => text
            .lines()
            .filter_map(|line| {
                let (form, lemma) = line.split_once('\t')?;
                let (form, lemma) = (form.trim(), lemma.trim());
                (!form.is_empty() && !lemma.is_empty()).then(|| (form.to_lowercase(), lemma.to_lowercase()))
            })
            .collect(),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "lemma table unreadable, using built-in table");
            HashMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> Normalizer {
        Normalizer::new(&NormalizerConfig { stemming: false, lemmatization: false, ..Default::default() })
    }

    #[test]
    fn cleans_punctuation_and_whitespace() {
        assert_eq!(clean("  Deep-Learning,\tfor   MATHS! "), "deep learning for maths");
        assert_eq!(clean("snake_case"), "snake case");
    }

    #[test]
    fn word_split_matches_whitespace_split() {
        for raw in [
            "Graph neural networks (GNNs) in 2023",
            "E = mc\u{b2}, \u{bd} of na\u{ef}ve nai\u{308}ve caf\u{e9}s",
            "\u{2160}\u{2161} sections \u{2014} \u{3b1}-helices\u{203f}x",
        ] {
            let text = clean(raw);
            assert_eq!(split_words(&text), text.split_whitespace().collect::<Vec<_>>(), "{raw}");
        }
    }

    #[test]
    fn superscripts_and_fractions_are_separators() {
        assert_eq!(clean("mc\u{b2} \u{bd}cup"), "mc cup");
        // combining marks stay attached to their letter
        assert_eq!(clean("Nai\u{308}ve"), "nai\u{308}ve");
    }

    #[test]
    fn drops_stopwords_and_short_tokens() {
        let toks = plain().normalize("The AI of a graph is on top");
        assert_eq!(toks, vec!["graph", "top"]);
    }

    #[test]
    fn stems_then_lemmatizes() {
        let n = Normalizer::default();
        assert_eq!(n.normalize("running"), vec!["run"]);
        assert_eq!(n.normalize("mathematics"), vec!["mathemat"]);
        // unchanged by the stemmer, then found in the lemma table
        assert_eq!(n.normalize("children"), vec!["child"]);
    }

    #[test]
    fn lemmatizes_without_stemming() {
        let n = Normalizer::new(&NormalizerConfig { stemming: false, ..Default::default() });
        assert_eq!(n.normalize("matrices criteria"), vec!["matrix", "criterion"]);
    }

    #[test]
    fn unreadable_stopword_file_uses_fallback_list() {
        let n = Normalizer::new(&NormalizerConfig {
            stemming: false,
            lemmatization: false,
            stopwords_path: Some("/nonexistent/stopwords.txt".into()),
            lemmas_path: None,
        });
        assert!(n.is_stopword("every"));
        // "about" is only in the full English list
        assert_eq!(n.normalize("about every thing"), vec!["about", "thing"]);
    }

    #[test]
    fn custom_lemma_file_extends_builtin_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lemmas.tsv");
        fs::write(&path, "algorithms\talgorithm\nbroken line\n").unwrap();
        let n = Normalizer::new(&NormalizerConfig {
            stemming: false,
            lemmatization: true,
            stopwords_path: None,
            lemmas_path: Some(path),
        });
        assert_eq!(n.normalize("algorithms children"), vec!["algorithm", "child"]);
    }
}
