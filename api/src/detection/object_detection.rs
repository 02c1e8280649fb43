use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;

use super::{Detection, IngredientDetector, IngredientRecord, merge_detections};
use crate::error::{DetectionError, ProviderError};
use crate::frames::Frame;
use crate::services::roboflow::ObjectDetector;

/// Runs an object-detection model on every frame and keeps the best
/// confidence per label.
pub struct ObjectDetectionStrategy {
    detector: Arc<dyn ObjectDetector>,
    concurrency: usize,
    normalize: bool,
}

impl ObjectDetectionStrategy {
    pub fn new(detector: Arc<dyn ObjectDetector>, concurrency: usize, normalize: bool) -> Self {
        Self {
            detector,
            concurrency: concurrency.max(1),
            normalize,
        }
    }
}

#[async_trait]
impl IngredientDetector for ObjectDetectionStrategy {
    async fn detect(&self, frames: &[Frame]) -> Result<Vec<IngredientRecord>, DetectionError> {
        // buffered() yields in frame order, so merging below stays first-seen ordered
        let per_frame: Vec<Vec<Detection>> =
            stream::iter(frames.iter().map(|f| (f.index, f.data.clone())).collect::<Vec<_>>())
                .map(|(index, data)| {
                    let detector = Arc::clone(&self.detector);
                    async move {
                        let detections = detector.predict(&data).await?;
                        tracing::debug!("Frame {}: {} detections", index, detections.len());
                        Ok::<_, ProviderError>(detections)
                    }
                })
                .buffered(self.concurrency)
                .try_collect()
                .await
                .map_err(|e| {
                    tracing::error!("Object detection failed: {}", e);
                    DetectionError(e)
                })?;

        let records = merge_detections(per_frame, self.normalize);

        tracing::info!(
            "Object detection found {} ingredients across {} frames",
            records.len(),
            frames.len()
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::tests::{det, frame};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Canned predictions keyed by frame bytes
    struct ScriptedDetector {
        by_frame: HashMap<Vec<u8>, Vec<Detection>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ObjectDetector for ScriptedDetector {
        async fn predict(&self, image: &[u8]) -> Result<Vec<Detection>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.by_frame.get(image).cloned().unwrap_or_default())
        }
    }

    struct DownDetector;

    #[async_trait]
    impl ObjectDetector for DownDetector {
        async fn predict(&self, _image: &[u8]) -> Result<Vec<Detection>, ProviderError> {
            Err(ProviderError::Api {
                status: 503,
                body: "unavailable".into(),
            })
        }
    }

    fn scripted(entries: Vec<(usize, Vec<Detection>)>) -> Arc<ScriptedDetector> {
        Arc::new(ScriptedDetector {
            by_frame: entries
                .into_iter()
                .map(|(i, d)| (frame(i).data, d))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_three_frame_scenario() {
        let detector = scripted(vec![
            (1, vec![det("tomato", 0.5)]),
            (2, vec![det("tomato", 0.9), det("onion", 0.6)]),
            (3, vec![]),
        ]);
        let strategy = ObjectDetectionStrategy::new(detector.clone(), 3, false);

        let records = strategy
            .detect(&[frame(1), frame(2), frame(3)])
            .await
            .unwrap();

        assert_eq!(
            records,
            vec![
                IngredientRecord { label: "tomato".into(), confidence: 0.9 },
                IngredientRecord { label: "onion".into(), confidence: 0.6 },
            ]
        );
        assert_eq!(detector.calls.load(Ordering::SeqCst), 3);
    }

    /// Earlier frames answer last, so completions arrive out of frame order
    struct SlowFirstDetector {
        inner: Arc<ScriptedDetector>,
        frames: u64,
    }

    #[async_trait]
    impl ObjectDetector for SlowFirstDetector {
        async fn predict(&self, image: &[u8]) -> Result<Vec<Detection>, ProviderError> {
            let index: u64 = String::from_utf8_lossy(image)
                .trim_start_matches("png-")
                .parse()
                .unwrap();
            let delay = (self.frames + 1 - index) * 20;
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            self.inner.predict(image).await
        }
    }

    #[tokio::test]
    async fn test_out_of_order_completions_keep_first_seen_order() {
        let detector = Arc::new(SlowFirstDetector {
            inner: scripted(vec![
                (1, vec![det("tomato", 0.5)]),
                (2, vec![det("onion", 0.6), det("tomato", 0.9)]),
                (3, vec![det("onion", 0.4), det("garlic", 0.3)]),
            ]),
            frames: 3,
        });
        let strategy = ObjectDetectionStrategy::new(detector, 3, false);

        let records = strategy
            .detect(&[frame(1), frame(2), frame(3)])
            .await
            .unwrap();

        assert_eq!(
            records,
            vec![
                IngredientRecord { label: "tomato".into(), confidence: 0.9 },
                IngredientRecord { label: "onion".into(), confidence: 0.6 },
                IngredientRecord { label: "garlic".into(), confidence: 0.3 },
            ]
        );
    }

    #[tokio::test]
    async fn test_no_frames_no_records() {
        let strategy = ObjectDetectionStrategy::new(scripted(vec![]), 4, false);
        assert!(strategy.detect(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_is_detection_error() {
        let strategy = ObjectDetectionStrategy::new(Arc::new(DownDetector), 2, false);
        let err = strategy.detect(&[frame(1), frame(2)]).await.unwrap_err();
        assert!(matches!(err.0, ProviderError::Api { status: 503, .. }));
    }
}
