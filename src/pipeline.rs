//! Incremental outline generation.
//!
//! A run asks the [`Composer`] for drafts once, then hands items out one at a
//! time with a pause after each, so clients can render them progressively.
//! The stream is lazy: nothing is drafted until it is first polled. Dropping
//! it (client disconnect) or cancelling the shutdown token ends it at the
//! current pause.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, BoxStream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::composer::Composer;
use crate::model::{Draft, ItemKind};
use crate::record::StreamRecord;

/// Pauses inserted after each emitted item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub after_goal: Duration,
    pub after_task: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            after_goal: Duration::from_millis(400),
            after_task: Duration::from_millis(350),
        }
    }
}

impl Pacing {
    /// No pauses at all.
    pub fn none() -> Self {
        Self {
            after_goal: Duration::ZERO,
            after_task: Duration::ZERO,
        }
    }

    pub fn after(&self, kind: ItemKind) -> Duration {
        match kind {
            ItemKind::Goal => self.after_goal,
            ItemKind::Task => self.after_task,
        }
    }
}

enum RunState {
    Start {
        topic: String,
    },
    Emitting {
        drafts: std::vec::IntoIter<Draft>,
        pause: Duration,
    },
    Done,
}

/// Produces paced outline streams. Cheap to clone; runs share nothing but
/// the composer and the shutdown token.
#[derive(Clone)]
pub struct Pipeline {
    composer: Arc<dyn Composer>,
    pacing: Pacing,
    shutdown: CancellationToken,
}

impl Pipeline {
    pub fn new(composer: Arc<dyn Composer>, pacing: Pacing) -> Self {
        Self {
            composer,
            pacing,
            shutdown: CancellationToken::new(),
        }
    }

    /// Stop every run derived from this pipeline when `token` is cancelled.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Start a run for an already validated topic.
    pub fn run(&self, topic: String) -> BoxStream<'static, StreamRecord> {
        let composer = self.composer.clone();
        let pacing = self.pacing;
        let shutdown = self.shutdown.clone();
        tracing::debug!("outline run started for topic of {} chars", topic.chars().count());

        stream::unfold(RunState::Start { topic }, move |state| {
            let composer = composer.clone();
            let shutdown = shutdown.clone();
            async move {
                match state {
                    RunState::Start { topic } => {
                        if shutdown.is_cancelled() {
                            return None;
                        }
                        match composer.draft(&topic).await {
                            Ok(drafts) => {
                                next_record(drafts.into_iter(), Duration::ZERO, pacing, &shutdown)
                                    .await
                            }
                            Err(e) => {
                                tracing::warn!("outline drafting failed: {}", e);
                                Some((
                                    StreamRecord::Error {
                                        message: e.to_string(),
                                    },
                                    RunState::Done,
                                ))
                            }
                        }
                    }
                    RunState::Emitting { drafts, pause } => {
                        next_record(drafts, pause, pacing, &shutdown).await
                    }
                    RunState::Done => None,
                }
            }
        })
        .boxed()
    }
}

async fn next_record(
    mut drafts: std::vec::IntoIter<Draft>,
    pause: Duration,
    pacing: Pacing,
    shutdown: &CancellationToken,
) -> Option<(StreamRecord, RunState)> {
    let Some(draft) = drafts.next() else {
        tracing::debug!("outline run finished");
        return None;
    };

    if !pause.is_zero() {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::debug!("outline run cancelled by shutdown");
                return None;
            }
            _ = tokio::time::sleep(pause) => {}
        }
    } else if shutdown.is_cancelled() {
        return None;
    }

    let item = draft.into_item();
    let pause = pacing.after(item.kind);
    Some((item.into(), RunState::Emitting { drafts, pause }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::TemplateComposer;
    use crate::error::{DiplomError, Result};
    use async_trait::async_trait;
    use tokio::time::Instant;

    struct FailingComposer;

    #[async_trait]
    impl Composer for FailingComposer {
        async fn draft(&self, _topic: &str) -> Result<Vec<Draft>> {
            Err(DiplomError::Composer {
                message: "provider unavailable".into(),
            })
        }

        async fn rephrase(&self, _id: &str, _kind: ItemKind) -> Result<String> {
            unreachable!()
        }

        async fn replace(&self, _id: &str, _kind: ItemKind) -> Result<String> {
            unreachable!()
        }
    }

    fn template_pipeline(pacing: Pacing) -> Pipeline {
        Pipeline::new(Arc::new(TemplateComposer), pacing)
    }

    #[tokio::test]
    async fn test_run_yields_goals_then_tasks() {
        let records: Vec<StreamRecord> = template_pipeline(Pacing::none())
            .run("тема".into())
            .collect()
            .await;
        let kinds: Vec<_> = records.iter().filter_map(StreamRecord::kind).collect();
        assert_eq!(kinds.len(), 8);
        assert!(kinds[..3].iter().all(|k| *k == ItemKind::Goal));
        assert!(kinds[3..].iter().all(|k| *k == ItemKind::Task));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pauses_follow_item_kind() {
        let mut run = template_pipeline(Pacing::default()).run("тема".into());
        let start = Instant::now();

        run.next().await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);

        run.next().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(400));

        while run.next().await.is_some() {}
        // 3 pauses after goals, 4 between tasks, none after the last task
        assert_eq!(start.elapsed(), Duration::from_millis(3 * 400 + 4 * 350));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_run_during_pause() {
        let token = CancellationToken::new();
        let pipeline = template_pipeline(Pacing::default()).with_shutdown(token.clone());
        let mut run = pipeline.run("тема".into());

        assert!(run.next().await.is_some());
        token.cancel();
        assert!(run.next().await.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_before_start_yields_nothing() {
        let token = CancellationToken::new();
        token.cancel();
        let pipeline = template_pipeline(Pacing::none()).with_shutdown(token);
        let records: Vec<_> = pipeline.run("тема".into()).collect().await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_composer_failure_is_single_terminal_record() {
        let pipeline = Pipeline::new(Arc::new(FailingComposer), Pacing::none());
        let records: Vec<_> = pipeline.run("тема".into()).collect().await;
        assert_eq!(records.len(), 1);
        match &records[0] {
            StreamRecord::Error { message } => assert!(message.contains("provider unavailable")),
            other => panic!("expected error record, got {:?}", other),
        }
    }
}
