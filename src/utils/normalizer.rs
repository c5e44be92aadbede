use serde::{Deserialize, Serialize};

/// Row normalization applied after tf * idf weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    /// divide by the sum of absolute values
    L1,
    /// divide by the euclidean length
    #[default]
    L2,
    /// keep raw tf * idf values
    None,
}

impl Norm {
    /// Normalize `values` in place.
    /// An all-zero row is left untouched.
    #[inline]
    pub fn apply(self, values: &mut [f32]) {
        let denom = match self {
            Norm::None => return,
            Norm::L1 => values.iter().map(|v| f64::from(v.abs())).sum::<f64>(),
            Norm::L2 => values
                .iter()
                .map(|v| f64::from(*v) * f64::from(*v))
                .sum::<f64>()
                .sqrt(),
        };
        if denom == 0.0 {
            return;
        }
        for v in values.iter_mut() {
            *v = (f64::from(*v) / denom) as f32;
        }
    }
}

impl std::str::FromStr for Norm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "l1" => Ok(Norm::L1),
            "l2" => Ok(Norm::L2),
            "none" => Ok(Norm::None),
            other => Err(format!("unknown norm `{other}`, expected l1, l2 or none")),
        }
    }
}
