//! The ingest pipeline: webhook call → envelope parsing → persistence.
//!
//! Both the HTTP handlers and fired schedule triggers go through
//! [`Ingestor::run`], so a manual run and a scheduled run store identical
//! rows apart from their `source` tag.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use db::models::NewNews;
use db::{DbPool, NewsRow, NewsSource};
use webhook::{AssetRequest, WebhookClient, WebhookResponse};

use crate::{envelope::parse_payload, EngineError};

/// Outcome of one successful webhook round-trip.
#[derive(Debug)]
pub struct IngestReport {
    /// The webhook's answer, untouched.
    pub response: WebhookResponse,
    /// Rows written for this run; empty for a text answer.
    pub stored: Vec<NewsRow>,
}

/// Runs the webhook → parse → store sequence.
#[derive(Clone)]
pub struct Ingestor {
    pool: DbPool,
    client: Arc<dyn WebhookClient>,
}

impl Ingestor {
    pub fn new(pool: DbPool, client: Arc<dyn WebhookClient>) -> Self {
        Self { pool, client }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Post `request` to the webhook and store whatever news the answer
    /// contains, tagged with `source`.
    ///
    /// # Errors
    /// [`EngineError::Webhook`] on a transport failure (nothing is stored),
    /// [`EngineError::Database`] if an insert fails.
    #[instrument(
        skip(self, request, source),
        fields(asset = %request.asset, language = %request.language, source = %source)
    )]
    pub async fn run(
        &self,
        request: &AssetRequest,
        source: NewsSource,
    ) -> Result<IngestReport, EngineError> {
        let response = self.client.invoke(request).await?;

        let stored = match &response {
            WebhookResponse::Structured(payload) => {
                let drafts = parse_payload(payload, &request.language);
                let mut stored = Vec::with_capacity(drafts.len());
                for draft in &drafts {
                    let assets = draft.assets_json();
                    let row = db::repository::news::insert_news(
                        &self.pool,
                        NewNews {
                            title: &draft.title,
                            description: &draft.description,
                            assets: &assets,
                            language: &draft.language,
                            source,
                        },
                    )
                    .await?;
                    stored.push(row);
                }
                info!("stored {} news item(s)", stored.len());
                stored
            }
            WebhookResponse::Text(body) => {
                warn!(bytes = body.len(), "webhook answered with non-JSON text; nothing stored");
                Vec::new()
            }
        };

        Ok(IngestReport { response, stored })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use db::models::NewsFilter;
    use db::pool::create_memory_pool;
    use serde_json::json;
    use webhook::mock::MockWebhook;

    async fn ingestor(mock: &MockWebhook) -> Ingestor {
        let pool = create_memory_pool().await.unwrap();
        Ingestor::new(pool, Arc::new(mock.clone()))
    }

    #[tokio::test]
    async fn structured_answer_is_stored_with_source() {
        let mock = MockWebhook::structured(json!([
            { "result": r#"={"title":"BTC up","description":"a\nb","assets":["BTC"]}"# },
            { "result": "not json" },
            { "result": r#"={"title":"ETH flat","assets":["ETH"],"language":"de"}"# },
        ]));
        let ingestor = ingestor(&mock).await;

        let report = ingestor
            .run(&AssetRequest::new("BTC", "en"), NewsSource::Scheduled)
            .await
            .unwrap();

        assert_eq!(report.stored.len(), 2);
        assert!(matches!(report.response, WebhookResponse::Structured(_)));
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.calls()[0].asset, "BTC");

        let rows = db::repository::news::list_news(ingestor.pool(), &NewsFilter::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.source == NewsSource::Scheduled));
        let btc = rows.iter().find(|r| r.title == "BTC up").unwrap();
        assert_eq!(btc.description, "a\nb");
        assert_eq!(btc.assets, r#"["BTC"]"#);
        assert_eq!(btc.language, "en");
        let eth = rows.iter().find(|r| r.title == "ETH flat").unwrap();
        assert_eq!(eth.language, "de");
    }

    #[tokio::test]
    async fn text_answer_stores_nothing() {
        let mock = MockWebhook::text("Workflow was started");
        let ingestor = ingestor(&mock).await;

        let report = ingestor
            .run(&AssetRequest::new("BTC", "en"), NewsSource::Manual)
            .await
            .unwrap();

        assert!(report.stored.is_empty());
        assert_eq!(report.response, WebhookResponse::Text("Workflow was started".into()));
    }

    #[tokio::test]
    async fn transport_failure_is_an_error() {
        let mock = MockWebhook::failing("connection refused");
        let ingestor = ingestor(&mock).await;

        let err = ingestor
            .run(&AssetRequest::new("BTC", "en"), NewsSource::Manual)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Webhook(_)));

        let rows = db::repository::news::list_news(ingestor.pool(), &NewsFilter::default())
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
