//! Alignment fidelity of coherence pairs

use super::{Measurement, Scorer};
use crate::coherence::{with_correspondence, Pair};
use crate::text::similarity;

/// Mean text similarity of the pair's aligned elements
#[must_use]
pub fn fidelity_scorer(pair: Pair) -> Scorer {
    Scorer::new(pair.fidelity_scorer_id(), "text similarity of aligned elements", move |ctx| {
        with_correspondence(ctx, pair, |c| {
            let similarities: Vec<f64> = c.aligned_texts().map(|(a, b)| similarity(a, b)).collect();
            if similarities.is_empty() {
                return None;
            }
            #[allow(clippy::cast_precision_loss)]
            let mean = similarities.iter().sum::<f64>() / similarities.len() as f64;
            Some(Measurement::new(mean).detail("aligned_pairs", similarities.len()))
        })
        .flatten()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use argcheck_extract::Role;
    use pretty_assertions::assert_eq;

    const MAP: &str = "[Tax]: We should tax the rich.\n    <+ <Fair>: It is fair.\n";

    #[test]
    fn identical_texts_score_one() {
        let anno = r#"<proposition id="1">We should tax the rich.</proposition> <proposition id="2" supports="1">It is fair.</proposition>"#;
        let h = Harness::new().block(Role::Arganno, anno).block(Role::Argmap, MAP);
        let result = h.score(&fidelity_scorer(Pair::ArgannoArgmap)).unwrap();
        assert_eq!(result.scorer_id, "arganno_argmap_alignment_fidelity");
        assert_eq!(result.score, 1.0);
        assert_eq!(result.details["aligned_pairs"], serde_json::json!(2));
    }

    #[test]
    fn structural_links_with_loose_texts_lower_the_score() {
        let anno = r#"<proposition id="1" ref_reco_label="Tax">the rich must be taxed</proposition>"#;
        let h = Harness::new().block(Role::Arganno, anno).block(Role::Argmap, MAP);
        let result = h.score(&fidelity_scorer(Pair::ArgannoArgmap)).unwrap();
        assert!(result.score < 0.8);
    }

    #[test]
    fn nothing_aligned_gives_no_score() {
        let anno = r#"<proposition id="1">Unrelated.</proposition>"#;
        let h = Harness::new().block(Role::Arganno, anno).block(Role::Argmap, MAP);
        assert_eq!(h.score(&fidelity_scorer(Pair::ArgannoArgmap)), None);
        assert_eq!(Harness::new().score(&fidelity_scorer(Pair::ArgmapInfreco)), None);
    }
}
