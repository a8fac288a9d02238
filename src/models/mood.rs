use std::collections::{HashMap, HashSet};

use serde::Serialize;

/// Year policy applied when scoring a movie for a mood
#[derive(Debug, Clone, PartialEq)]
pub enum YearPreference {
    NotImportant,
    /// Favor releases from the last decade
    RecencyBonus,
    /// Favor specific classic decades (e.g. 1940-1980)
    ClassicEras(Vec<i32>),
}

/// Preferred runtime window in minutes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimePreference {
    pub min: u32,
    pub ideal: u32,
    pub max: u32,
}

/// Per-mood signal weights; fractions sum to 1 (year bias excluded, it is a
/// signed adjustment)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoodWeights {
    pub genre: f64,
    pub rating: f64,
    pub popularity: f64,
    pub tag: f64,
    pub year_bias: f64,
}

/// A static, named mood configuration
///
/// Profiles are built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct MoodProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub primary_genres: Vec<&'static str>,
    pub secondary_genres: Vec<&'static str>,
    pub excluded_genres: Vec<&'static str>,
    pub runtime: RuntimePreference,
    pub year_preference: YearPreference,
    pub sentiment: &'static str,
    pub weights: MoodWeights,
    pub color: &'static str,
    pub emoji: &'static str,
    /// Combined, normalized tag + keyword set used for tag matching
    keywords: HashSet<String>,
}

impl MoodProfile {
    pub fn keyword_set(&self) -> &HashSet<String> {
        &self.keywords
    }

    pub fn is_primary(&self, genre: &str) -> bool {
        self.primary_genres.contains(&genre)
    }
}

/// Summary shape for the mood listing endpoint
#[derive(Debug, Clone, Serialize)]
pub struct MoodSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub primary_genres: Vec<String>,
    pub color: String,
    pub emoji: String,
}

/// The fixed set of mood profiles
#[derive(Debug, Clone)]
pub struct MoodCatalog {
    profiles: HashMap<&'static str, MoodProfile>,
    order: Vec<&'static str>,
}

impl MoodCatalog {
    pub fn get(&self, name: &str) -> Option<&MoodProfile> {
        self.profiles.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MoodProfile> {
        self.order.iter().map(|name| &self.profiles[name])
    }

    pub fn summaries(&self) -> Vec<MoodSummary> {
        self.iter()
            .map(|p| MoodSummary {
                id: p.name.to_string(),
                name: p.name.to_string(),
                description: p.description.to_string(),
                primary_genres: p.primary_genres.iter().map(|g| g.to_string()).collect(),
                color: p.color.to_string(),
                emoji: p.emoji.to_string(),
            })
            .collect()
    }

    /// Build the ten built-in moods
    pub fn builtin() -> Self {
        let profiles = vec![
            profile(
                "euphoria_wave",
                "Pure happiness: big laughs, catchy tunes, and feel-good adventures.",
                &["Comedy", "Animation", "Musical"],
                &["Adventure", "Family"],
                &["Horror", "Crime", "Thriller", "War", "Drama", "Mystery"],
                &["funny", "hilarious", "feel-good", "uplifting", "silly", "lighthearted", "energetic", "fun"],
                &["comedy", "humor", "friendship", "happy ending", "singing", "dancing", "laughter"],
                RuntimePreference { min: 80, ideal: 100, max: 130 },
                YearPreference::NotImportant,
                "positive",
                MoodWeights { genre: 0.5, rating: 0.15, popularity: 0.2, tag: 0.15, year_bias: 0.05 },
                "#FFEB3B",
                "\u{1F604}",
            ),
            profile(
                "victory_high",
                "Get pumped with stories of big wins and epic comebacks.",
                &["Action", "Sport", "Biography"],
                &["War", "Documentary"],
                &["Horror", "Film-Noir", "Romance", "Comedy", "Mystery"],
                &["inspiring", "sports", "victory", "triumph", "motivational", "comeback", "heroic", "achievement", "underdog", "competition"],
                &["triumph", "underdog", "sports", "victory", "competition", "achievement", "heroism", "biography", "true story"],
                RuntimePreference { min: 90, ideal: 120, max: 150 },
                YearPreference::RecencyBonus,
                "positive",
                MoodWeights { genre: 0.4, rating: 0.3, popularity: 0.15, tag: 0.15, year_bias: 0.1 },
                "#FF9800",
                "\u{1F3C6}",
            ),
            profile(
                "fury_awakened",
                "Channel your fire with films about standing up and fighting back.",
                &["Crime", "Western", "Action"],
                &["Film-Noir"],
                &["Comedy", "Children", "Animation", "Romance", "Horror", "Musical", "Fantasy"],
                &["revenge", "justice", "intense", "powerful", "gritty", "violent", "dark", "conspiracy", "vigilante", "corruption"],
                &["revenge", "justice", "rebellion", "vigilante", "fighting", "corruption", "uprising", "crime boss", "mafia", "heist"],
                RuntimePreference { min: 100, ideal: 130, max: 160 },
                YearPreference::NotImportant,
                "negative_but_cathartic",
                MoodWeights { genre: 0.6, rating: 0.15, popularity: 0.05, tag: 0.2, year_bias: 0.0 },
                "#D32F2F",
                "\u{1F4AA}",
            ),
            profile(
                "phantom_fear",
                "Heart-racing scares that'll have you double-checking the locks.",
                &["Horror", "Thriller"],
                &["Sci-Fi"],
                &["Comedy", "Children", "Musical", "Romance", "Animation", "Documentary", "Sport"],
                &["scary", "horror", "tense", "suspense", "terrifying", "creepy", "haunting", "disturbing", "supernatural", "monster"],
                &["fear", "suspense", "supernatural", "monster", "ghost", "killer", "paranormal", "danger", "zombie", "vampire"],
                RuntimePreference { min: 85, ideal: 105, max: 130 },
                YearPreference::NotImportant,
                "fearful",
                MoodWeights { genre: 0.7, rating: 0.05, popularity: 0.05, tag: 0.2, year_bias: 0.0 },
                "#512DA8",
                "\u{1F47B}",
            ),
            profile(
                "tranquil_haven",
                "Relax and unwind with soothing, gentle movies; a cozy escape.",
                &["Documentary", "Fantasy"],
                &["Animation"],
                &["Horror", "Action", "Thriller", "Crime", "War", "Mystery"],
                &["peaceful", "beautiful", "calm", "relaxing", "visually stunning", "soothing", "meditative", "nature", "serene", "gentle"],
                &["nature", "journey", "beautiful scenery", "meditation", "peaceful", "landscapes", "animals", "zen", "mindfulness"],
                RuntimePreference { min: 80, ideal: 100, max: 120 },
                YearPreference::NotImportant,
                "peaceful",
                MoodWeights { genre: 0.3, rating: 0.4, popularity: 0.15, tag: 0.15, year_bias: 0.0 },
                "#4CAF50",
                "\u{1F33F}",
            ),
            profile(
                "heartfelt_harmony",
                "Celebrate love, friendship, and all the warm, fuzzy moments of life.",
                &["Romance", "Comedy"],
                &["Musical"],
                &["Horror", "Thriller", "War", "Crime", "Action", "Sci-Fi"],
                &["romantic", "touching", "emotional", "heartwarming", "love", "sweet", "moving", "poignant", "relationship", "dating"],
                &["love", "romance", "relationship", "family", "friendship", "emotional", "wedding", "dating", "marriage"],
                RuntimePreference { min: 90, ideal: 110, max: 130 },
                YearPreference::RecencyBonus,
                "warm",
                MoodWeights { genre: 0.4, rating: 0.25, popularity: 0.15, tag: 0.2, year_bias: 0.1 },
                "#FF8A80",
                "\u{2764}\u{FE0F}",
            ),
            profile(
                "somber_ruminations",
                "Thoughtful dramas for when you want to slow down and reflect.",
                &["Drama", "Film-Noir"],
                &["Documentary"],
                &["Comedy", "Children", "Action", "Musical", "Horror", "Romance"],
                &["depressing", "sad", "melancholy", "thoughtful", "profound", "philosophical", "dark", "intelligent", "introspective", "psychological"],
                &["tragedy", "loss", "reflection", "grief", "depression", "solitude", "suicide", "failure", "psychology", "mental health"],
                RuntimePreference { min: 100, ideal: 130, max: 180 },
                YearPreference::NotImportant,
                "sad",
                MoodWeights { genre: 0.3, rating: 0.4, popularity: 0.05, tag: 0.25, year_bias: 0.0 },
                "#90A4AE",
                "\u{1F914}",
            ),
            profile(
                "cosmic_emptiness",
                "Explore life's big questions and existential mysteries; you're not alone.",
                &["Sci-Fi", "Drama"],
                &["Fantasy"],
                &["Comedy", "Children", "Musical", "Western", "Horror", "Romance"],
                &["existential", "philosophical", "surreal", "abstract", "experimental", "weird", "cerebral", "mind-bending", "metaphysical", "cosmic"],
                &["existential", "surreal", "dream", "reality", "consciousness", "universe", "perception", "space", "time", "philosophy"],
                RuntimePreference { min: 100, ideal: 130, max: 180 },
                YearPreference::NotImportant,
                "contemplative",
                MoodWeights { genre: 0.5, rating: 0.2, popularity: 0.05, tag: 0.25, year_bias: 0.0 },
                "#5C6BC0",
                "\u{1F30C}",
            ),
            profile(
                "timeworn_echoes",
                "Nostalgic journeys that bring back memories and bittersweet smiles.",
                &["Drama", "Romance"],
                &["Fantasy", "Musical"],
                &["Horror", "Thriller", "War", "Action", "Sci-Fi"],
                &["nostalgic", "classic", "retro", "historical", "period", "memory", "childhood", "bittersweet", "vintage", "timeless"],
                &["nostalgia", "memory", "childhood", "coming of age", "flashback", "reminiscence", "history", "period piece", "vintage"],
                RuntimePreference { min: 100, ideal: 120, max: 160 },
                YearPreference::ClassicEras(vec![1940, 1950, 1960, 1970, 1980]),
                "bittersweet",
                MoodWeights { genre: 0.3, rating: 0.3, popularity: 0.15, tag: 0.25, year_bias: -0.15 },
                "#FFD54F",
                "\u{23F3}",
            ),
            profile(
                "wonder_hunt",
                "Feed your curiosity with discoveries, mysteries, and mind-bending revelations.",
                &["Mystery", "Documentary", "Thriller"],
                &["Adventure"],
                &["Horror", "Comedy", "Romance", "Musical", "War"],
                &["fascinating", "thought-provoking", "educational", "intriguing", "mystery", "intelligent", "twist", "discovery", "investigation"],
                &["discovery", "investigation", "science", "mystery", "truth", "revelation", "journey", "detective", "puzzle", "conspiracy"],
                RuntimePreference { min: 90, ideal: 120, max: 150 },
                YearPreference::NotImportant,
                "curious",
                MoodWeights { genre: 0.4, rating: 0.3, popularity: 0.05, tag: 0.25, year_bias: 0.05 },
                "#2196F3",
                "\u{1F50D}",
            ),
        ];

        let order: Vec<&'static str> = profiles.iter().map(|p| p.name).collect();
        let profiles = profiles.into_iter().map(|p| (p.name, p)).collect();
        Self { profiles, order }
    }
}

#[allow(clippy::too_many_arguments)]
fn profile(
    name: &'static str,
    description: &'static str,
    primary: &[&'static str],
    secondary: &[&'static str],
    excluded: &[&'static str],
    tags: &[&'static str],
    external_keywords: &[&'static str],
    runtime: RuntimePreference,
    year_preference: YearPreference,
    sentiment: &'static str,
    weights: MoodWeights,
    color: &'static str,
    emoji: &'static str,
) -> MoodProfile {
    let keywords = tags
        .iter()
        .chain(external_keywords.iter())
        .map(|k| k.trim().to_lowercase())
        .collect();
    MoodProfile {
        name,
        description,
        primary_genres: primary.to_vec(),
        secondary_genres: secondary.to_vec(),
        excluded_genres: excluded.to_vec(),
        runtime,
        year_preference,
        sentiment,
        weights,
        color,
        emoji,
        keywords,
    }
}
