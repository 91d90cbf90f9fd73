// Channel descriptors
// Structured description of a trial column derived from its header tokens

use serde::{Deserialize, Serialize};

use crate::events::Laterality;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'x' => Some(Axis::X),
            'y' => Some(Axis::Y),
            'z' => Some(Axis::Z),
            _ => None,
        }
    }
}

/// Electromyography recording sites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Muscle {
    TibialisAnterior,
    MedialGastrocnemius,
    Soleus,
    BicepsFemoris,
    Semitendinosus,
    VastusLateralis,
    RectusFemoris,
}

impl Muscle {
    /// Header token abbreviation (e.g. "TA", "SOL")
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "TA" => Some(Muscle::TibialisAnterior),
            "MG" => Some(Muscle::MedialGastrocnemius),
            "SOL" => Some(Muscle::Soleus),
            "BF" => Some(Muscle::BicepsFemoris),
            "ST" => Some(Muscle::Semitendinosus),
            "VL" => Some(Muscle::VastusLateralis),
            "RF" => Some(Muscle::RectusFemoris),
            _ => None,
        }
    }
}

/// Anatomical site a sensor is mounted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Site {
    Waist,
    Thigh,
    Shank,
    Foot,
    Knee,
    Ankle,
    Unspecified,
}

impl Site {
    fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "waist" | "trunk" => Some(Site::Waist),
            "thigh" => Some(Site::Thigh),
            "shank" => Some(Site::Shank),
            "foot" => Some(Site::Foot),
            "knee" => Some(Site::Knee),
            "ankle" => Some(Site::Ankle),
            _ => None,
        }
    }
}

/// What a column measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    Accelerometer(Axis),
    Gyroscope(Axis),
    Emg(Muscle),
    /// Knee/ankle goniometer angle or velocity
    Joint,
    /// Locomotion mode annotation
    Mode,
    /// Heel-contact / toe-off markers and their triggers
    GaitMarker,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    pub name: String,
    pub side: Option<Laterality>,
    pub site: Site,
    pub kind: ChannelKind,
}

impl ChannelDescriptor {
    /// Describe a column from its `_`-separated header tokens
    /// e.g. `Right_Shank_Ax`, `Left_TA`, `Waist_Gy`, `Right_Knee_Velocity`
    pub fn parse(name: &str) -> Self {
        let tokens: Vec<&str> = name
            .split(|c: char| c == '_' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();

        let side = tokens.iter().find_map(|t| match t.to_ascii_lowercase().as_str() {
            "right" => Some(Laterality::Right),
            "left" => Some(Laterality::Left),
            _ => None,
        });

        let site = tokens
            .iter()
            .find_map(|t| Site::from_token(t))
            .unwrap_or(Site::Unspecified);

        ChannelDescriptor {
            name: name.to_string(),
            side,
            site,
            kind: classify_tokens(&tokens),
        }
    }

    pub fn is_gait_marker(&self) -> bool {
        self.kind == ChannelKind::GaitMarker
    }

    /// Side-less trunk channels (waist IMU) and the mode column
    pub fn is_shared(&self) -> bool {
        self.kind == ChannelKind::Mode || (self.side.is_none() && self.site == Site::Waist)
    }
}

fn classify_tokens(tokens: &[&str]) -> ChannelKind {
    let has = |word: &str| tokens.iter().any(|t| t.eq_ignore_ascii_case(word));

    if has("heel") || has("toe") {
        return ChannelKind::GaitMarker;
    }
    if has("mode") {
        return ChannelKind::Mode;
    }
    if let Some(axis) = tokens.iter().find_map(|t| sensor_axis(t, 'A')) {
        return ChannelKind::Accelerometer(axis);
    }
    if let Some(axis) = tokens.iter().find_map(|t| sensor_axis(t, 'G')) {
        return ChannelKind::Gyroscope(axis);
    }
    if let Some(muscle) = tokens.iter().find_map(|t| Muscle::from_token(t)) {
        return ChannelKind::Emg(muscle);
    }
    if has("knee") || has("ankle") {
        return ChannelKind::Joint;
    }

    ChannelKind::Other
}

/// Two-character axis token such as `Ax` or `Gz`
fn sensor_axis(token: &str, prefix: char) -> Option<Axis> {
    let mut chars = token.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(p), Some(axis), None) if p == prefix => Axis::from_char(axis),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_emg_channel() {
        let d = ChannelDescriptor::parse("Right_TA");
        assert_eq!(d.side, Some(Laterality::Right));
        assert_eq!(d.kind, ChannelKind::Emg(Muscle::TibialisAnterior));
    }

    #[test]
    fn test_parse_waist_imu_is_shared() {
        let d = ChannelDescriptor::parse("Waist_Ax");
        assert_eq!(d.side, None);
        assert_eq!(d.site, Site::Waist);
        assert_eq!(d.kind, ChannelKind::Accelerometer(Axis::X));
        assert!(d.is_shared());
    }

    #[test]
    fn test_parse_gyro_and_joint() {
        let gyro = ChannelDescriptor::parse("Left_Shank_Gz");
        assert_eq!(gyro.kind, ChannelKind::Gyroscope(Axis::Z));
        assert_eq!(gyro.site, Site::Shank);

        let knee = ChannelDescriptor::parse("Left_Knee_Velocity");
        assert_eq!(knee.kind, ChannelKind::Joint);
        assert_eq!(knee.side, Some(Laterality::Left));
    }

    #[test]
    fn test_parse_gait_markers() {
        assert!(ChannelDescriptor::parse("Left_Heel_Contact").is_gait_marker());
        assert!(ChannelDescriptor::parse("Right_Toe_Off_Trigger").is_gait_marker());
    }

    #[test]
    fn test_parse_mode_and_other() {
        let mode = ChannelDescriptor::parse("Mode");
        assert_eq!(mode.kind, ChannelKind::Mode);
        assert!(mode.is_shared());

        assert_eq!(ChannelDescriptor::parse("Time").kind, ChannelKind::Other);
        // Lowercase axis tokens are not sensor axes
        assert_eq!(ChannelDescriptor::parse("Right_ax").kind, ChannelKind::Other);
    }
}
