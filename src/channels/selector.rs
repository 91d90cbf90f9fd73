// Channel selection
// Resolves laterality mode and sensor modalities into concrete column lists

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::channels::descriptor::{ChannelDescriptor, ChannelKind};
use crate::events::Laterality;

/// Which side's channels to keep relative to the event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LateralityMode {
    /// Both sides
    #[default]
    Bilateral,

    /// Same side as the event
    Ipsilateral,

    /// Side opposite the event
    Contralateral,
}

impl LateralityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LateralityMode::Bilateral => "bilateral",
            LateralityMode::Ipsilateral => "ipsilateral",
            LateralityMode::Contralateral => "contralateral",
        }
    }
}

impl fmt::Display for LateralityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LateralityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bilateral" => Ok(LateralityMode::Bilateral),
            "ipsilateral" => Ok(LateralityMode::Ipsilateral),
            "contralateral" => Ok(LateralityMode::Contralateral),
            other => Err(format!("unknown laterality mode: {}", other)),
        }
    }
}

/// Sensor modality families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Accelerometer axes
    Imu,
    /// Electromyography muscle channels
    Emg,
    /// Gyroscope axes
    #[serde(alias = "gon", alias = "gonio")]
    Goin,
}

impl Modality {
    pub const ALL: [Modality; 3] = [Modality::Imu, Modality::Emg, Modality::Goin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Imu => "imu",
            Modality::Emg => "emg",
            Modality::Goin => "goin",
        }
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "imu" => Ok(Modality::Imu),
            "emg" => Ok(Modality::Emg),
            "goin" | "gon" | "gonio" => Ok(Modality::Goin),
            other => Err(format!("unknown sensor modality: {}", other)),
        }
    }
}

/// Ordered, duplicate-free set of requested modalities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModalitySet {
    modalities: Vec<Modality>,
}

impl ModalitySet {
    /// Keeps first-seen order, drops duplicates
    pub fn new(modalities: impl IntoIterator<Item = Modality>) -> Self {
        let mut unique = Vec::new();
        for m in modalities {
            if !unique.contains(&m) {
                unique.push(m);
            }
        }
        ModalitySet { modalities: unique }
    }

    pub fn all() -> Self {
        Self::new(Modality::ALL)
    }

    pub fn contains(&self, modality: Modality) -> bool {
        self.modalities.contains(&modality)
    }

    pub fn as_slice(&self) -> &[Modality] {
        &self.modalities
    }

    pub fn len(&self) -> usize {
        self.modalities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modalities.is_empty()
    }

    /// Underscore-joined names, e.g. "imu_emg"
    pub fn label(&self) -> String {
        self.modalities
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Every subset of this set with at least `min_size` members,
    /// smallest subsets first, each in this set's order
    pub fn combinations(&self, min_size: usize) -> Vec<ModalitySet> {
        let n = self.modalities.len();
        let mut subsets = Vec::new();

        for size in min_size.max(1)..=n {
            let mut picked = Vec::with_capacity(size);
            push_combinations(&self.modalities, size, 0, &mut picked, &mut subsets);
        }

        subsets
    }
}

impl Default for ModalitySet {
    fn default() -> Self {
        Self::all()
    }
}

fn push_combinations(
    items: &[Modality],
    size: usize,
    start: usize,
    picked: &mut Vec<Modality>,
    out: &mut Vec<ModalitySet>,
) {
    if picked.len() == size {
        out.push(ModalitySet::new(picked.iter().copied()));
        return;
    }

    for i in start..items.len() {
        picked.push(items[i]);
        push_combinations(items, size, i + 1, picked, out);
        picked.pop();
    }
}

/// Column selection resolved once per trial header
///
/// Both per-side lists are computed up front so each window only
/// looks up indices. Lists follow table column order.
#[derive(Debug, Clone)]
pub struct ChannelSelector {
    descriptors: Vec<ChannelDescriptor>,
    left: Vec<usize>,
    right: Vec<usize>,
}

impl ChannelSelector {
    pub fn new(headers: &[String], mode: LateralityMode, modalities: &ModalitySet) -> Self {
        let descriptors: Vec<ChannelDescriptor> =
            headers.iter().map(|h| ChannelDescriptor::parse(h)).collect();

        let resolve = |event_side: Laterality| -> Vec<usize> {
            descriptors
                .iter()
                .enumerate()
                .filter(|(_, d)| keeps_for_laterality(d, mode, event_side))
                .filter(|(_, d)| keeps_for_modality(d, modalities))
                .map(|(idx, _)| idx)
                .collect()
        };

        let left = resolve(Laterality::Left);
        let right = resolve(Laterality::Right);

        ChannelSelector {
            descriptors,
            left,
            right,
        }
    }

    /// Column indices to keep for an event on the given side
    pub fn select(&self, laterality: Laterality) -> &[usize] {
        match laterality {
            Laterality::Left => &self.left,
            Laterality::Right => &self.right,
        }
    }

    pub fn channel_names(&self, laterality: Laterality) -> Vec<String> {
        self.select(laterality)
            .iter()
            .map(|&idx| self.descriptors[idx].name.clone())
            .collect()
    }

    pub fn descriptors(&self) -> &[ChannelDescriptor] {
        &self.descriptors
    }
}

fn keeps_for_laterality(
    descriptor: &ChannelDescriptor,
    mode: LateralityMode,
    event_side: Laterality,
) -> bool {
    if descriptor.is_gait_marker() {
        return false;
    }

    match mode {
        LateralityMode::Bilateral => true,
        LateralityMode::Ipsilateral => {
            descriptor.side == Some(event_side) || descriptor.is_shared()
        }
        LateralityMode::Contralateral => {
            descriptor.side == Some(event_side.opposite()) || descriptor.is_shared()
        }
    }
}

fn keeps_for_modality(descriptor: &ChannelDescriptor, modalities: &ModalitySet) -> bool {
    match descriptor.kind {
        ChannelKind::Mode | ChannelKind::Joint => true,
        ChannelKind::Accelerometer(_) => modalities.contains(Modality::Imu),
        ChannelKind::Gyroscope(_) => modalities.contains(Modality::Goin),
        ChannelKind::Emg(_) => modalities.contains(Modality::Emg),
        ChannelKind::GaitMarker | ChannelKind::Other => false,
    }
}
