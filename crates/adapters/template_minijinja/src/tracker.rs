//! Re-evaluates one template whenever an entity it reads changes state.

use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::Instrument;

use stateswitch_domain::event::Event;
use stateswitch_domain::template::TemplateResult;

use crate::engine::TemplateEngine;

static ENTITY_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"['"]([a-z_][a-z0-9_]*\.[a-z0-9_]+)['"]"#).expect("entity reference pattern")
});

/// Entity ids quoted inside `template`.
///
/// An empty set means the template reads nothing specific and is
/// re-evaluated on every state change.
pub(crate) fn referenced_entities(template: &str) -> BTreeSet<String> {
    ENTITY_REFERENCE
        .captures_iter(template)
        .map(|captures| captures[1].to_string())
        .collect()
}

pub(crate) struct TemplateTracker {
    engine: Arc<TemplateEngine>,
    owner: String,
    template: String,
    watched: BTreeSet<String>,
    events: broadcast::Receiver<Event>,
    results: mpsc::Sender<TemplateResult>,
    last: Option<TemplateResult>,
}

impl TemplateTracker {
    pub(crate) fn new(
        engine: Arc<TemplateEngine>,
        owner: &str,
        template: &str,
        events: broadcast::Receiver<Event>,
        results: mpsc::Sender<TemplateResult>,
    ) -> Self {
        Self {
            engine,
            owner: owner.to_string(),
            template: template.to_string(),
            watched: referenced_entities(template),
            events,
            results,
            last: None,
        }
    }

    /// Spawn the tracking loop. It ends once the receiving switch is gone.
    pub(crate) fn start(self) -> JoinHandle<()> {
        let span = tracing::info_span!("template", owner = %self.owner);
        tokio::spawn(self.run().instrument(span))
    }

    async fn run(mut self) {
        tracing::debug!(watched = ?self.watched, "tracking template");
        if !self.refresh().await {
            return;
        }

        loop {
            let received = tokio::select! {
                () = self.results.closed() => break,
                received = self.events.recv() => received,
            };
            match received {
                Ok(event) => {
                    if self.is_relevant(&event) && !self.refresh().await {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "state events lagged, re-evaluating");
                    if !self.refresh().await {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("template tracking stopped");
    }

    fn is_relevant(&self, event: &Event) -> bool {
        let Some(entity_id) = event.entity_id() else {
            return false;
        };
        entity_id != self.owner && (self.watched.is_empty() || self.watched.contains(entity_id))
    }

    /// Evaluate and forward the result if it changed.
    ///
    /// Returns `false` once the receiver is dropped.
    async fn refresh(&mut self) -> bool {
        let result = self.engine.evaluate(&self.template);
        if self.last.as_ref() == Some(&result) {
            return true;
        }
        tracing::debug!(%result, "template result changed");
        self.last = Some(result.clone());
        self.results.send(result).await.is_ok()
    }
}
