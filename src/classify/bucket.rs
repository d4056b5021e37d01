// src/classify/bucket.rs
//
// Closed bucket taxonomy, categories, and per-bucket score maps.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Top-level destination folder a bucket belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Samples,
    Loops,
    #[serde(rename = "MIDI")]
    Midi,
    #[serde(rename = "UNSORTED")]
    Unsorted,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Category::Samples => "Samples",
            Category::Loops => "Loops",
            Category::Midi => "MIDI",
            Category::Unsorted => "UNSORTED",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Samples" => Some(Category::Samples),
            "Loops" => Some(Category::Loops),
            "MIDI" => Some(Category::Midi),
            "UNSORTED" => Some(Category::Unsorted),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Production bucket, declared in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bucket {
    #[serde(rename = "808s")]
    EightOhEight,
    Kicks,
    Snares,
    Claps,
    HiHats,
    Percs,
    Cymbals,
    Bass,
    Leads,
    Vox,
    #[serde(rename = "FX")]
    Fx,
    DrumLoop,
    MelodyLoop,
    #[serde(rename = "MIDI")]
    Midi,
}

impl Bucket {
    pub const COUNT: usize = 14;

    pub const ALL: [Bucket; Bucket::COUNT] = [
        Bucket::EightOhEight,
        Bucket::Kicks,
        Bucket::Snares,
        Bucket::Claps,
        Bucket::HiHats,
        Bucket::Percs,
        Bucket::Cymbals,
        Bucket::Bass,
        Bucket::Leads,
        Bucket::Vox,
        Bucket::Fx,
        Bucket::DrumLoop,
        Bucket::MelodyLoop,
        Bucket::Midi,
    ];

    /// Internal identifier, stable across display-name remapping
    pub fn id(&self) -> &'static str {
        match self {
            Bucket::EightOhEight => "808s",
            Bucket::Kicks => "Kicks",
            Bucket::Snares => "Snares",
            Bucket::Claps => "Claps",
            Bucket::HiHats => "HiHats",
            Bucket::Percs => "Percs",
            Bucket::Cymbals => "Cymbals",
            Bucket::Bass => "Bass",
            Bucket::Leads => "Leads",
            Bucket::Vox => "Vox",
            Bucket::Fx => "FX",
            Bucket::DrumLoop => "DrumLoop",
            Bucket::MelodyLoop => "MelodyLoop",
            Bucket::Midi => "MIDI",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.id() == id)
    }

    /// Position in canonical order
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn category(&self) -> Category {
        match self {
            Bucket::DrumLoop | Bucket::MelodyLoop => Category::Loops,
            Bucket::Midi => Category::Midi,
            _ => Category::Samples,
        }
    }

    /// Built-in lexical rules
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Bucket::EightOhEight => &["808", "808s"],
            Bucket::Kicks => &["kick", "kicks"],
            Bucket::Snares => &["snare", "snares"],
            Bucket::Claps => &["clap", "claps"],
            Bucket::HiHats => &["hihat", "hi-hat", "hat", "hats"],
            Bucket::Percs => &["perc", "percs", "percussion"],
            Bucket::Cymbals => &["cymbal", "cymbals", "crash", "ride", "bell"],
            Bucket::Bass => &["bass"],
            Bucket::Leads => &["lead", "leads"],
            Bucket::Vox => &["vox", "vocal", "vocals", "acapella"],
            Bucket::Fx => &[
                "fx", "effect", "effects", "sweep", "sweeps", "riser", "risers", "impact",
                "impacts",
            ],
            Bucket::DrumLoop => &[
                "drumloop",
                "drum_loop",
                "drum loop",
                "drum-loop",
                "loop drum",
                "loop_drums",
            ],
            Bucket::MelodyLoop => &[
                "melodic loop",
                "melodyloop",
                "melody_loop",
                "melody loop",
                "loop melody",
                "melod",
                "chord",
                "chords",
                "guitar loop",
                "piano loop",
            ],
            Bucket::Midi => &[".mid", "mid file"],
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Dense score table indexed by bucket
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreMap([f64; Bucket::COUNT]);

impl ScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bucket: Bucket, amount: f64) {
        self.0[bucket.index()] += amount;
    }

    pub fn get(&self, bucket: Bucket) -> f64 {
        self.0[bucket.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Bucket, f64)> + '_ {
        Bucket::ALL.iter().map(move |&b| (b, self.0[b.index()]))
    }

    /// Element-wise sum of several maps
    pub fn sum_of(maps: &[&ScoreMap]) -> ScoreMap {
        let mut total = ScoreMap::new();
        for map in maps {
            for (bucket, score) in map.iter() {
                total.add(bucket, score);
            }
        }
        total
    }

    /// Buckets sorted by score descending; ties keep canonical order
    pub fn ranked(&self) -> Vec<(Bucket, f64)> {
        let mut ranked: Vec<(Bucket, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

impl Index<Bucket> for ScoreMap {
    type Output = f64;

    fn index(&self, bucket: Bucket) -> &f64 {
        &self.0[bucket.index()]
    }
}

impl IndexMut<Bucket> for ScoreMap {
    fn index_mut(&mut self, bucket: Bucket) -> &mut f64 {
        &mut self.0[bucket.index()]
    }
}

impl Serialize for ScoreMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Bucket::COUNT))?;
        for (bucket, score) in self.iter() {
            map.serialize_entry(bucket.id(), &score)?;
        }
        map.end()
    }
}
