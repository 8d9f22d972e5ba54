use super::fuzzy::partial_ratio;
use crate::config::schema::ScoringConfig;
use lodestar_common::protocol::{
    Attribute, ElementDescriptor, IntentCategory, OcrToken, Point,
};
use serde::Serialize;
use tracing::debug;

/// Per-signal contributions behind a composite score.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub attribute: f64,
    /// Raw cosine similarity between intent and element identity.
    pub similarity: f64,
    /// Similarity after the category penalty.
    pub adjusted_similarity: f64,
    pub proximity: f64,
    pub visual_fallback: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    /// Position in the extraction snapshot.
    pub index: usize,
    pub element: ElementDescriptor,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Whether a value looks machine-generated: long enough and dense in digits.
pub fn is_unstable(value: &str, config: &ScoringConfig) -> bool {
    let len = value.chars().count();
    if len < config.unstable_min_length {
        return false;
    }
    let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
    digits as f64 / len as f64 > config.unstable_digit_ratio
}

/// Text describing what an element is, used for semantic similarity.
pub fn identity_text(element: &ElementDescriptor, config: &ScoringConfig) -> String {
    let stable_id = element
        .id
        .as_deref()
        .filter(|id| !is_unstable(id, config));
    let parts = [
        Some(element.tag.as_str()),
        stable_id,
        element.name.as_deref(),
        element.aria_label.as_deref(),
        element.alt.as_deref(),
        element.placeholder.as_deref(),
        element.text.as_deref(),
        element.label_text.as_deref(),
    ];
    parts
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub struct Scorer<'a> {
    config: &'a ScoringConfig,
}

impl<'a> Scorer<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self { config }
    }

    pub fn weight(&self, attr: Attribute, value: &str) -> f64 {
        if attr.may_be_generated() && is_unstable(value, self.config) {
            self.config.unstable_weight
        } else {
            self.config.weights.weight(attr)
        }
    }

    /// Weighted sum of fuzzy matches over the attributes present.
    pub fn attribute_score(&self, intent: &str, element: &ElementDescriptor) -> f64 {
        let intent = intent.to_lowercase();
        Attribute::ALL
            .iter()
            .filter_map(|attr| element.attribute(*attr).map(|v| (*attr, v)))
            .map(|(attr, value)| {
                partial_ratio(&intent, &value.to_lowercase()) as f64 * self.weight(attr, value)
            })
            .sum()
    }

    /// Best OCR token whose text clears the anchor threshold.
    pub fn find_anchor<'t>(&self, intent: &str, tokens: &'t [OcrToken]) -> Option<&'t OcrToken> {
        let intent = intent.to_lowercase();
        let mut best: Option<(&OcrToken, u8)> = None;
        for token in tokens {
            let ratio = partial_ratio(&intent, &token.text.to_lowercase());
            if (ratio as f64) <= self.config.anchor_threshold {
                continue;
            }
            if best.is_none_or(|(_, b)| ratio > b) {
                best = Some((token, ratio));
            }
        }
        best.map(|(token, _)| token)
    }

    /// Linear decay from the maximum bonus at the anchor to zero at the radius.
    pub fn proximity_bonus(&self, anchor: Point, target: Point) -> f64 {
        let distance = anchor.distance(&target);
        (self.config.proximity_max_bonus * (1.0 - distance / self.config.proximity_radius_px))
            .max(0.0)
    }

    /// Score one element. `similarity` is the cosine similarity between the
    /// intent and the element's identity text.
    pub fn score_element(
        &self,
        intent: &str,
        element: &ElementDescriptor,
        similarity: f64,
        anchor: Option<&OcrToken>,
        category: IntentCategory,
    ) -> (f64, ScoreBreakdown) {
        let attribute = self.attribute_score(intent, element);
        let adjusted_similarity = if category.expects(element) {
            similarity
        } else {
            similarity * self.config.category_penalty
        };
        let proximity = anchor
            .map(|a| self.proximity_bonus(a.center(), element.center()))
            .unwrap_or(0.0);

        let visual_fallback =
            anchor.is_none() && category == IntentCategory::Visual && element.is_image_like();
        let score = if visual_fallback {
            attribute + similarity * self.config.visual_fallback_multiplier
        } else {
            attribute * adjusted_similarity + proximity
        };

        (
            score,
            ScoreBreakdown {
                attribute,
                similarity,
                adjusted_similarity,
                proximity,
                visual_fallback,
            },
        )
    }

    /// Rank elements by composite score, highest first. Elements at or
    /// below the confidence floor are dropped; equal scores keep extraction
    /// order.
    pub fn score(
        &self,
        intent: &str,
        elements: &[ElementDescriptor],
        similarities: &[f64],
        tokens: &[OcrToken],
        category: IntentCategory,
    ) -> Vec<Candidate> {
        let anchor = self.find_anchor(intent, tokens);
        if let Some(a) = anchor {
            debug!("Anchor for '{}': '{}'", intent, a.text);
        }

        let mut candidates: Vec<Candidate> = elements
            .iter()
            .enumerate()
            .filter_map(|(index, element)| {
                let similarity = similarities.get(index).copied().unwrap_or(0.0);
                let (score, breakdown) =
                    self.score_element(intent, element, similarity, anchor, category);
                debug!(
                    "Candidate #{} <{}> score {:.2} (attr {:.1}, sim {:.3}, prox {:.1})",
                    index,
                    element.tag,
                    score,
                    breakdown.attribute,
                    breakdown.adjusted_similarity,
                    breakdown.proximity
                );
                (score > self.config.confidence_floor).then(|| Candidate {
                    index,
                    element: element.clone(),
                    score,
                    breakdown,
                })
            })
            .collect();

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestar_common::protocol::Rect;

    fn at(mut element: ElementDescriptor, x: f64, y: f64) -> ElementDescriptor {
        element.rect = Rect {
            x,
            y,
            width: 0.0,
            height: 0.0,
        };
        element
    }

    #[test]
    fn test_instability_rule() {
        let config = ScoringConfig::default();
        assert!(is_unstable("id8372619", &config));
        assert!(is_unstable("ab1234", &config));
        assert!(!is_unstable("a12", &config));
        assert!(!is_unstable("submit-button-2", &config));
        assert!(!is_unstable("abcd12", &config));
    }

    #[test]
    fn test_unstable_id_weight_is_discounted() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config);
        assert_eq!(scorer.weight(Attribute::Id, "field_827361"), 0.05);
        assert_eq!(scorer.weight(Attribute::Id, "username"), 1.0);
        // Only generated-looking attributes are discounted.
        assert_eq!(scorer.weight(Attribute::Text, "827361"), 0.7);

        let mut element = ElementDescriptor::new("input");
        element.id = Some("827361".into());
        element.placeholder = Some("827361".into());
        let score = scorer.attribute_score("827361", &element);
        assert!((score - (100.0 * 0.05 + 100.0 * 0.8)).abs() < 1e-9);
    }

    #[test]
    fn test_proximity_monotonic_and_zero_at_radius() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config);
        let origin = Point::new(0.0, 0.0);
        let mut last = f64::INFINITY;
        for d in (0..=700).step_by(25) {
            let bonus = scorer.proximity_bonus(origin, Point::new(d as f64, 0.0));
            assert!(bonus <= last);
            last = bonus;
        }
        assert_eq!(scorer.proximity_bonus(origin, origin), 100.0);
        assert_eq!(scorer.proximity_bonus(origin, Point::new(500.0, 0.0)), 0.0);
        assert_eq!(scorer.proximity_bonus(origin, Point::new(300.0, 400.0)), 0.0);
        assert!((scorer.proximity_bonus(origin, Point::new(250.0, 0.0)) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_anchor_requires_threshold() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config);
        let rect = Rect::default();
        let tokens = vec![
            OcrToken::from_box("Sign up", rect, 0.9),
            OcrToken::from_box("Username", rect, 0.9),
        ];
        let anchor = scorer.find_anchor("enter username", &tokens).unwrap();
        assert_eq!(anchor.text, "Username");
        assert!(scorer.find_anchor("company logo", &tokens).is_none());
    }

    #[test]
    fn test_category_penalty_applies_outside_family() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config);
        let mut image = ElementDescriptor::new("img");
        image.alt = Some("password".into());

        let (score, breakdown) =
            scorer.score_element("password", &image, 0.5, None, IntentCategory::Input);
        assert!((breakdown.adjusted_similarity - 0.1).abs() < 1e-9);
        assert!((score - 80.0 * 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_visual_fallback_without_anchor() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config);
        let image = ElementDescriptor::new("img");

        let (score, breakdown) =
            scorer.score_element("company logo", &image, 0.6, None, IntentCategory::Visual);
        assert!(breakdown.visual_fallback);
        assert!((score - 90.0).abs() < 1e-9);

        let anchor = OcrToken::from_box("Company Logo", Rect::default(), 1.0);
        let (_, breakdown) = scorer.score_element(
            "company logo",
            &image,
            0.6,
            Some(&anchor),
            IntentCategory::Visual,
        );
        assert!(!breakdown.visual_fallback);
    }

    #[test]
    fn test_floor_excludes_at_or_below() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config);
        let mut button = ElementDescriptor::new("button");
        button.text = Some("login".into());

        // 100 * 0.7 attribute score; 0.57 similarity lands at 39.9.
        let ranked = scorer.score(
            "login",
            &[button.clone()],
            &[0.57],
            &[],
            IntentCategory::Action,
        );
        assert!(ranked.is_empty());

        let ranked = scorer.score("login", &[button], &[0.58], &[], IntentCategory::Action);
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_ranking_order_and_ties() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config);
        let mut first = ElementDescriptor::new("button");
        first.text = Some("Login".into());
        let second = first.clone();
        let mut best = ElementDescriptor::new("button");
        best.id = Some("login".into());
        best.text = Some("Login".into());

        let ranked = scorer.score(
            "login",
            &[first, second, best],
            &[1.0, 1.0, 1.0],
            &[],
            IntentCategory::Action,
        );
        let order: Vec<usize> = ranked.iter().map(|c| c.index).collect();
        assert_eq!(order, vec![2, 0, 1]);
    }

    #[test]
    fn test_proximity_breaks_text_ties() {
        let config = ScoringConfig::default();
        let scorer = Scorer::new(&config);
        let mut far = at(ElementDescriptor::new("input"), 900.0, 600.0);
        far.name = Some("email".into());
        let mut near = at(ElementDescriptor::new("input"), 110.0, 60.0);
        near.name = Some("email".into());
        let tokens = vec![OcrToken::from_box(
            "Email",
            Rect {
                x: 100.0,
                y: 40.0,
                width: 20.0,
                height: 10.0,
            },
            0.9,
        )];

        let ranked = scorer.score(
            "enter email",
            &[far, near],
            &[0.8, 0.8],
            &tokens,
            IntentCategory::Input,
        );
        assert_eq!(ranked[0].index, 1);
        assert!(ranked[0].breakdown.proximity > 90.0);
        assert_eq!(ranked[1].breakdown.proximity, 0.0);
    }

    #[test]
    fn test_identity_text_skips_unstable_id() {
        let config = ScoringConfig::default();
        let mut element = ElementDescriptor::new("input");
        element.id = Some("x9281734".into());
        element.name = Some("Email".into());
        element.placeholder = Some("you@example.com".into());
        assert_eq!(
            identity_text(&element, &config),
            "input email you@example.com"
        );
    }
}
