use include_dir::{include_dir, Dir};
use rand::Rng;
use serde::Deserialize;
use serde_json::from_str;
use std::collections::HashMap;
use std::error::Error;

static SENTENCE_DIR: Dir = include_dir!("src/sentences");

/// Difficulty level, mapping to a sentence catalog and a session time limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Level {
    Easy,
    Medium,
    Hard,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Easy, Level::Medium, Level::Hard];

    /// Numeric level as shown to the player (1..=3).
    pub fn number(self) -> u8 {
        match self {
            Level::Easy => 1,
            Level::Medium => 2,
            Level::Hard => 3,
        }
    }

    /// Clamped defensive default: anything outside 1..=3 is level 1.
    pub fn from_number(n: u8) -> Self {
        match n {
            2 => Level::Medium,
            3 => Level::Hard,
            _ => Level::Easy,
        }
    }

    /// Session time limit in seconds for this level.
    pub fn time_limit_secs(self) -> u64 {
        match self {
            Level::Easy => 180,
            Level::Medium => 150,
            Level::Hard => 120,
        }
    }

    fn catalog_file(self) -> &'static str {
        match self {
            Level::Easy => "level1.json",
            Level::Medium => "level2.json",
            Level::Hard => "level3.json",
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
struct Catalog {
    #[allow(dead_code)]
    level: u8,
    sentences: Vec<String>,
}

/// Fixed sentence corpus, one catalog per level, embedded at compile time.
///
/// Remembers the most recently loaded `(level, index)` pair so the host can
/// show the full sentence the current round was built from.
#[derive(Debug, Clone)]
pub struct Dictionary {
    catalogs: HashMap<Level, Catalog>,
    current_level: Level,
    current_index: usize,
    current_words: Vec<String>,
}

impl Dictionary {
    pub fn new() -> Self {
        let mut catalogs = HashMap::new();
        for level in Level::ALL {
            let catalog = read_catalog_from_file(level.catalog_file())
                .expect("embedded sentence catalog must parse");
            catalogs.insert(level, catalog);
        }
        Self {
            catalogs,
            current_level: Level::Easy,
            current_index: 0,
            current_words: Vec::new(),
        }
    }

    pub fn sentence_count(&self, level: Level) -> usize {
        self.catalogs.get(&level).map_or(0, |c| c.sentences.len())
    }

    /// Words of one sentence, remembered as the current selection.
    /// An out-of-range index silently falls back to index 0.
    pub fn words_for_level(&mut self, level: Level, index: usize) -> Vec<String> {
        let index = if index < self.sentence_count(level) {
            index
        } else {
            0
        };

        self.current_level = level;
        self.current_index = index;
        self.current_words = split_into_words(&self.full_sentence(level, index));
        self.current_words.clone()
    }

    /// The literal sentence text. Out-of-range indices fall back to index 0.
    pub fn full_sentence(&self, level: Level, index: usize) -> String {
        let sentences = &self.catalogs[&level].sentences;
        sentences
            .get(index)
            .or_else(|| sentences.first())
            .cloned()
            .unwrap_or_default()
    }

    /// Picks a uniformly random sentence for the level and loads its words.
    pub fn random_sentence_words(&mut self, level: Level, rng: &mut impl Rng) -> Vec<String> {
        let count = self.sentence_count(level);
        if count == 0 {
            return Vec::new();
        }
        let index = rng.gen_range(0..count);
        self.words_for_level(level, index)
    }

    pub fn current_level(&self) -> Level {
        self.current_level
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_words(&self) -> &[String] {
        &self.current_words
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

fn read_catalog_from_file(file_name: &str) -> Result<Catalog, Box<dyn Error>> {
    let file = SENTENCE_DIR
        .get_file(file_name)
        .expect("sentence catalog not found");

    let file_as_str = file
        .contents_utf8()
        .expect("unable to interpret catalog as a string");

    let catalog = from_str(file_as_str)?;

    Ok(catalog)
}

/// Whitespace split with `.`, `,`, `!`, `?` removed; empty tokens dropped.
fn split_into_words(sentence: &str) -> Vec<String> {
    sentence
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| !matches!(c, '.' | ',' | '!' | '?'))
                .collect::<String>()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_level_from_number_clamps() {
        assert_eq!(Level::from_number(1), Level::Easy);
        assert_eq!(Level::from_number(2), Level::Medium);
        assert_eq!(Level::from_number(3), Level::Hard);
        assert_eq!(Level::from_number(0), Level::Easy);
        assert_eq!(Level::from_number(99), Level::Easy);
    }

    #[test]
    fn test_level_time_limits() {
        assert_eq!(Level::Easy.time_limit_secs(), 180);
        assert_eq!(Level::Medium.time_limit_secs(), 150);
        assert_eq!(Level::Hard.time_limit_secs(), 120);
    }

    #[test]
    fn test_catalogs_are_non_empty() {
        let dict = Dictionary::new();
        for level in Level::ALL {
            assert!(dict.sentence_count(level) > 0);
        }
    }

    #[test]
    fn test_word_count_matches_full_sentence() {
        let mut dict = Dictionary::new();
        for level in Level::ALL {
            for i in 0..dict.sentence_count(level) {
                let words = dict.words_for_level(level, i);
                let full = dict.full_sentence(level, i);
                assert_eq!(words.len(), split_into_words(&full).len());
            }
        }
    }

    #[test]
    fn test_every_sentence_has_eight_words() {
        // The shipped corpus is uniform; the engine itself treats the count
        // as data, but the input slots assume it.
        let mut dict = Dictionary::new();
        for level in Level::ALL {
            for i in 0..dict.sentence_count(level) {
                assert_eq!(dict.words_for_level(level, i).len(), 8, "{level} #{i}");
            }
        }
    }

    #[test]
    fn test_out_of_range_index_falls_back_to_first() {
        let mut dict = Dictionary::new();
        let fallback = dict.words_for_level(Level::Easy, 0);
        let clamped = dict.words_for_level(Level::Easy, 999);
        assert_eq!(fallback, clamped);
        assert_eq!(dict.current_index(), 0);
    }

    #[test]
    fn test_random_selection_is_in_range() {
        let mut dict = Dictionary::new();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let words = dict.random_sentence_words(Level::Medium, &mut rng);
            assert!(!words.is_empty());
            assert!(dict.current_index() < dict.sentence_count(Level::Medium));
            assert_eq!(dict.current_level(), Level::Medium);
            assert_eq!(dict.current_words(), words.as_slice());
        }
    }

    #[test]
    fn test_random_selection_is_reproducible() {
        let mut a = Dictionary::new();
        let mut b = Dictionary::new();
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        for _ in 0..10 {
            assert_eq!(
                a.random_sentence_words(Level::Hard, &mut rng_a),
                b.random_sentence_words(Level::Hard, &mut rng_b)
            );
        }
    }

    #[test]
    fn test_split_strips_punctuation_and_empties() {
        assert_eq!(
            split_into_words("Hello, world!  How are you?"),
            vec!["Hello", "world", "How", "are", "you"]
        );
        assert_eq!(split_into_words("... , !"), Vec::<String>::new());
    }
}
