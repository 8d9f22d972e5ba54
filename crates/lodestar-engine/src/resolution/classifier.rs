use crate::models::embedding::cosine_similarity;
use crate::models::{ModelError, ModelService};
use lodestar_common::protocol::IntentCategory;

/// Pick the category whose prototype is closest to the intent.
pub async fn classify(models: &ModelService, intent: &str) -> Result<IntentCategory, ModelError> {
    let vector = models.embedder().embed(&intent.to_lowercase()).await?;
    Ok(category_for(models, &vector))
}

/// Classify an already-embedded intent. Ties go to the category declared
/// first.
pub fn category_for(models: &ModelService, intent_vector: &[f32]) -> IntentCategory {
    let mut best = IntentCategory::ALL[0];
    let mut best_score = f64::NEG_INFINITY;
    for category in IntentCategory::ALL {
        let score = cosine_similarity(intent_vector, models.prototype(category));
        if score > best_score {
            best = category;
            best_score = score;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::PrototypeConfig;
    use crate::models::embedding::WordVectors;

    async fn service() -> ModelService {
        let vectors = WordVectors::from_entries(vec![
            ("logo".to_string(), vec![1.0, 0.0, 0.0]),
            ("company".to_string(), vec![0.9, 0.1, 0.0]),
            ("username".to_string(), vec![0.0, 1.0, 0.0]),
            ("enter".to_string(), vec![0.1, 0.9, 0.0]),
            ("login".to_string(), vec![0.0, 0.0, 1.0]),
            ("click".to_string(), vec![0.0, 0.1, 0.9]),
        ]);
        ModelService::with_providers(Box::new(vectors), None, &PrototypeConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_classify_categories() {
        let models = service().await;
        assert_eq!(
            classify(&models, "Company Logo").await.unwrap(),
            IntentCategory::Visual
        );
        assert_eq!(
            classify(&models, "enter username").await.unwrap(),
            IntentCategory::Input
        );
        assert_eq!(
            classify(&models, "click login").await.unwrap(),
            IntentCategory::Action
        );
    }

    #[tokio::test]
    async fn test_unknown_words_tie_to_first_category() {
        let models = service().await;
        assert_eq!(
            classify(&models, "qwerty zxcv").await.unwrap(),
            IntentCategory::Visual
        );
    }
}
