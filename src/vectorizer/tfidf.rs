/// TF-IDF weighting strategy.
///
/// Plugged into `TFIDFVectorizer<E>` as a type parameter so the weighting can
/// be swapped without touching vocabulary handling.
pub trait TFIDFEngine {
    /// IDF weight of a term
    /// # Arguments
    /// * `doc_num` - documents seen at fit time
    /// * `doc_freq` - documents containing the term
    /// * `smooth` - add one to both counts, as if an extra document held every term
    fn idf(doc_num: u64, doc_freq: u64, smooth: bool) -> f32;

    /// TF weight of a term occurring `count` times in one document
    fn tf(count: u32, sublinear: bool) -> f32;
}

/// Default TF-IDF engine
/// - idf: `ln((1 + n) / (1 + df)) + 1` smoothed, `ln(n / df) + 1` otherwise
/// - tf: raw count, or `1 + ln(count)` when sublinear
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTFIDFEngine;

impl TFIDFEngine for DefaultTFIDFEngine {
    #[inline]
    fn idf(doc_num: u64, doc_freq: u64, smooth: bool) -> f32 {
        let (n, df) = if smooth {
            (doc_num as f64 + 1.0, doc_freq as f64 + 1.0)
        } else {
            (doc_num as f64, doc_freq as f64)
        };
        if df == 0.0 {
            // unseen term without smoothing; keep the weight finite
            return 1.0;
        }
        ((n / df).ln() + 1.0) as f32
    }

    #[inline]
    fn tf(count: u32, sublinear: bool) -> f32 {
        if count == 0 {
            return 0.0;
        }
        if sublinear {
            (1.0 + f64::from(count).ln()) as f32
        } else {
            count as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothed_idf_matches_formula() {
        // n = 3, df = 1 -> ln(4 / 2) + 1
        let idf = DefaultTFIDFEngine::idf(3, 1, true);
        assert!((idf - (2.0f32.ln() + 1.0)).abs() < 1e-6);
        // term in every document still has weight 1
        assert!((DefaultTFIDFEngine::idf(3, 3, true) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn raw_idf_matches_formula() {
        let idf = DefaultTFIDFEngine::idf(4, 1, false);
        assert!((idf - (4.0f32.ln() + 1.0)).abs() < 1e-6);
        assert_eq!(DefaultTFIDFEngine::idf(4, 0, false), 1.0);
    }

    #[test]
    fn tf_variants() {
        assert_eq!(DefaultTFIDFEngine::tf(0, false), 0.0);
        assert_eq!(DefaultTFIDFEngine::tf(3, false), 3.0);
        assert_eq!(DefaultTFIDFEngine::tf(1, true), 1.0);
        assert!((DefaultTFIDFEngine::tf(3, true) - (1.0 + 3.0f32.ln())).abs() < 1e-6);
    }
}
